//! Response construction and encoding
//!
//! Response format:
//! - Status line: `HTTP/1.1 <code> <reason>`
//! - `Content-Type`, `Content-Length`
//! - Cross-origin headers ([`CORS_HEADERS`]), always present
//! - `Connection: close` (one request per connection)
//! - Blank line, then the body

use core::fmt::{self, Write};

use heapless::String;

/// Maximum response body size in bytes
pub const MAX_BODY_SIZE: usize = 2048;

/// Maximum encoded response size (status line + headers + body)
pub const MAX_RESPONSE_SIZE: usize = MAX_BODY_SIZE + 512;

/// Cross-origin headers sent with every response
///
/// The device is embedded in dashboards served from other origins.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

/// Errors that can occur while building or encoding a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Body exceeds [`MAX_BODY_SIZE`]
    BodyTooLarge,
    /// Output buffer too small for the encoded response
    BufferTooSmall,
}

/// Response status codes used by the status server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusCode {
    Ok,
    NoContent,
    BadRequest,
    NotFound,
    InternalServerError,
}

impl StatusCode {
    /// Numeric status code
    pub fn code(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NoContent => 204,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Reason phrase
    pub fn reason(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Body content type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ContentType {
    Html,
    PlainText,
    Json,
}

impl ContentType {
    /// Header value
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Html => "text/html; charset=utf-8",
            ContentType::PlainText => "text/plain; charset=utf-8",
            ContentType::Json => "application/json",
        }
    }
}

/// A complete response ready for encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: StatusCode,
    /// Body content type
    pub content_type: ContentType,
    /// Response body
    pub body: String<MAX_BODY_SIZE>,
}

impl Response {
    /// Create a response with an empty body
    pub fn new(status: StatusCode, content_type: ContentType) -> Self {
        Self {
            status,
            content_type,
            body: String::new(),
        }
    }

    /// Create a response with the given body
    pub fn with_body(
        status: StatusCode,
        content_type: ContentType,
        body: &str,
    ) -> Result<Self, EncodeError> {
        let mut response = Self::new(status, content_type);
        response
            .body
            .push_str(body)
            .map_err(|_| EncodeError::BodyTooLarge)?;
        Ok(response)
    }

    /// Plain-text response
    pub fn text(status: StatusCode, body: &str) -> Result<Self, EncodeError> {
        Self::with_body(status, ContentType::PlainText, body)
    }

    /// Response with no body (e.g. a CORS preflight answer)
    pub fn no_content() -> Self {
        Self::new(StatusCode::NoContent, ContentType::PlainText)
    }

    /// Encode this response into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let mut cursor = Cursor { buf: buffer, pos: 0 };
        self.write_head(&mut cursor)
            .map_err(|_| EncodeError::BufferTooSmall)?;
        cursor
            .write_str(&self.body)
            .map_err(|_| EncodeError::BufferTooSmall)?;
        Ok(cursor.pos)
    }

    /// Encode this response into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<heapless::Vec<u8, MAX_RESPONSE_SIZE>, EncodeError> {
        let mut buffer = [0u8; MAX_RESPONSE_SIZE];
        let len = self.encode(&mut buffer)?;
        let mut vec = heapless::Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| EncodeError::BufferTooSmall)?;
        Ok(vec)
    }

    fn write_head(&self, out: &mut impl Write) -> fmt::Result {
        write!(
            out,
            "HTTP/1.1 {} {}\r\n",
            self.status.code(),
            self.status.reason()
        )?;
        write!(out, "Content-Type: {}\r\n", self.content_type.as_str())?;
        write!(out, "Content-Length: {}\r\n", self.body.len())?;
        for (name, value) in CORS_HEADERS {
            write!(out, "{}: {}\r\n", name, value)?;
        }
        out.write_str("Connection: close\r\n\r\n")
    }
}

/// `fmt::Write` adapter over a fixed byte slice
struct Cursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl Write for Cursor<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let end = self.pos.checked_add(bytes.len()).ok_or(fmt::Error)?;
        if end > self.buf.len() {
            return Err(fmt::Error);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}
