//! Status server views
//!
//! Turns a parsed request plus the current [`StatusBoard`] into a
//! response. Never mutates the board.
//!
//! | Path           | Body                                   |
//! |----------------|----------------------------------------|
//! | `/`            | HTML page, refreshes itself            |
//! | `/temperature` | `25.0°C`                               |
//! | `/humidity`    | `60.0%` (registered only with humidity)|
//! | `/json`        | structured record                      |
//! | other          | 404 echoing method, URI and arguments  |
//!
//! `OPTIONS` on any path is a bodiless 204 (CORS preflight).

use core::fmt::Write;

use heapless::String;
use hygrochron_protocol::{ContentType, Method, Request, Response, StatusCode, MAX_BODY_SIZE};
use log::{debug, warn};
use serde::Serialize;

use crate::config::HttpPolicy;
use crate::status::{Freshness, Route, Router, SharedStatus, StatusBoard};
use crate::Millis;

type Body = String<MAX_BODY_SIZE>;

/// Longest encoded `/json` record
const MAX_JSON_LEN: usize = 160;

/// Wire form of `/json`; field order is the output order
#[derive(Debug, Serialize)]
struct StatusRecord<'a> {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    humidity: Option<f32>,
    time: &'a str,
    date: &'a str,
    status: &'static str,
}

/// Read-only views over the shared status
#[derive(Debug, Clone)]
pub struct StatusServer {
    router: Router,
    refresh_secs: u8,
    stale_after_ms: u32,
}

impl StatusServer {
    pub fn new(router: Router, policy: &HttpPolicy, stale_after_ms: u32) -> Self {
        Self {
            router,
            refresh_secs: policy.refresh_secs,
            stale_after_ms,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Answer one request
    pub fn respond(&self, request: &Request<'_>, board: &StatusBoard, now: Millis) -> Response {
        debug!("{} {}", request.method, request.path);

        if request.method == Method::Options {
            return Response::no_content();
        }

        let status = board.snapshot();
        let freshness = board.freshness(now, self.stale_after_ms);

        let built = match self.router.resolve(request.path) {
            Some(Route::Page) => self.page(status, freshness).map(|body| (ContentType::Html, body)),
            Some(Route::Temperature) => {
                one_decimal_text(status.reading.temperature, "°C").map(|b| (ContentType::PlainText, b))
            }
            Some(Route::Humidity) => {
                let humidity = status.reading.humidity.unwrap_or(0.0);
                one_decimal_text(humidity, "%").map(|b| (ContentType::PlainText, b))
            }
            Some(Route::Json) => json_record(status, freshness).map(|b| (ContentType::Json, b)),
            None => return not_found(request),
        };

        match built {
            Ok((content_type, body)) => Response {
                status: StatusCode::Ok,
                content_type,
                body,
            },
            Err(_) => {
                warn!("Response body overflow on {}", request.path);
                internal_error()
            }
        }
    }

    fn page(&self, status: &SharedStatus, freshness: Freshness) -> Result<Body, core::fmt::Error> {
        let mut html = Body::new();
        html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"UTF-8\">")
            .map_err(|_| core::fmt::Error)?;
        write!(
            html,
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\
             <meta http-equiv=\"refresh\" content=\"{}\">\
             <title>Hygrochron</title>\
             <style>body{{font-family:Arial,sans-serif;text-align:center;margin:20px}}\
             .v{{font-size:48px;font-weight:bold;margin:10px 0}}.l{{color:#888}}\
             .u{{font-size:24px}}</style></head><body>\n",
            self.refresh_secs
        )?;

        if freshness == Freshness::NotReady {
            html.push_str("<p class=\"l\">Waiting for first reading...</p>\n</body></html>\n")
                .map_err(|_| core::fmt::Error)?;
            return Ok(html);
        }

        let (r, g, b) = temperature_color(status.reading.temperature);
        write!(
            html,
            "<div class=\"l\">{}</div><div>{}</div>\n\
             <div class=\"v\" style=\"color:rgb({},{},{})\">{:.1}<span class=\"u\">°C</span></div>\
             <div class=\"l\">Temperature</div>\n",
            status.date, status.time_of_day, r, g, b, status.reading.temperature
        )?;
        if let Some(humidity) = status.reading.humidity {
            write!(
                html,
                "<div class=\"v\" style=\"color:#3498db\">{:.1}<span class=\"u\">%</span></div>\
                 <div class=\"l\">Humidity</div>\n",
                humidity
            )?;
        }
        if let Freshness::Stale { age_ms } = freshness {
            writeln!(html, "<p class=\"l\">Stale: updated {}s ago</p>", age_ms / 1000)?;
        }
        html.push_str("</body></html>\n")
            .map_err(|_| core::fmt::Error)?;
        Ok(html)
    }
}

/// `"<value, 1 decimal><unit>"`
fn one_decimal_text(value: f32, unit: &str) -> Result<Body, core::fmt::Error> {
    let mut body = Body::new();
    write!(body, "{:.1}{}", value, unit)?;
    Ok(body)
}

fn json_record(status: &SharedStatus, freshness: Freshness) -> Result<Body, core::fmt::Error> {
    let record = StatusRecord {
        temperature: round_tenths(status.reading.temperature),
        humidity: status.reading.humidity.map(round_tenths),
        time: &status.time_of_day,
        date: &status.date,
        status: freshness.as_str(),
    };
    let encoded: String<MAX_JSON_LEN> =
        serde_json_core::to_string(&record).map_err(|_| core::fmt::Error)?;
    let mut body = Body::new();
    body.push_str(&encoded).map_err(|_| core::fmt::Error)?;
    Ok(body)
}

/// 404 echoing method, URI and every argument
fn not_found(request: &Request<'_>) -> Response {
    let mut body = Body::new();
    if write_not_found(&mut body, request).is_err() {
        warn!("404 body truncated for {}", request.path);
    }
    Response {
        status: StatusCode::NotFound,
        content_type: ContentType::PlainText,
        body,
    }
}

fn write_not_found(body: &mut Body, request: &Request<'_>) -> core::fmt::Result {
    write!(
        body,
        "404 Not Found\n\nURI: {}\nMethod: {}\nArguments: {}\n",
        request.path,
        request.method_token,
        request.arg_count()
    )?;
    for (name, value) in request.args() {
        writeln!(body, " {}: {}", name, value)?;
    }
    Ok(())
}

fn internal_error() -> Response {
    Response::text(StatusCode::InternalServerError, "Internal Server Error")
        .unwrap_or_else(|_| Response::new(StatusCode::InternalServerError, ContentType::PlainText))
}

/// Round half away from zero to one decimal
fn round_tenths(value: f32) -> f32 {
    let scaled = value * 10.0;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5) as i32
    } else {
        (scaled - 0.5) as i32
    };
    rounded as f32 / 10.0
}

/// Page accent color: blue below 20 °C, yellow to orange up to 30 °C, red above
fn temperature_color(temperature: f32) -> (u8, u8, u8) {
    if temperature < 20.0 {
        (0x34, 0x98, 0xdb)
    } else if temperature < 30.0 {
        let ratio = (temperature - 20.0) / 10.0;
        let lerp = |from: f32, to: f32| (from + ratio * (to - from) + 0.5) as u8;
        (lerp(241.0, 230.0), lerp(196.0, 126.0), lerp(15.0, 34.0))
    } else {
        (0xe7, 0x4c, 0x3c)
    }
}
