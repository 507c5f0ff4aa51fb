//! Request-line parsing
//!
//! Only the request line is interpreted. Headers are required to be
//! terminated (so a half-received request is reported as incomplete) but
//! their contents are ignored; the status endpoints take no body.

use core::fmt;

/// Largest request the server is expected to buffer
pub const MAX_REQUEST_SIZE: usize = 1024;

/// Errors that can occur while parsing a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestError {
    /// Header block not terminated yet (need more bytes)
    Incomplete,
    /// Request line is not `METHOD TARGET VERSION`
    MalformedRequestLine,
    /// Version is not HTTP/1.x
    UnsupportedVersion,
    /// Request is not valid UTF-8
    InvalidEncoding,
    /// Request exceeds [`MAX_REQUEST_SIZE`]
    TooLarge,
}

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
    /// Any other token
    Other,
}

impl Method {
    /// Parse a method token (case-sensitive, as HTTP requires)
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            _ => Method::Other,
        }
    }

    /// Canonical token for this method
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Other => "OTHER",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed request borrowing from the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    /// Request method
    pub method: Method,
    /// Method token as received
    pub method_token: &'a str,
    /// Path component of the target (always starts with `/`)
    pub path: &'a str,
    /// Raw query string without the leading `?`, if any
    pub query: Option<&'a str>,
}

impl<'a> Request<'a> {
    /// Build a request directly (used by servers that parse elsewhere and by tests)
    pub fn new(method: Method, path: &'a str, query: Option<&'a str>) -> Self {
        Self {
            method,
            method_token: method.as_str(),
            path,
            query,
        }
    }

    /// Parse a request from the bytes received so far
    pub fn parse(buf: &'a [u8]) -> Result<Self, RequestError> {
        if buf.len() > MAX_REQUEST_SIZE {
            return Err(RequestError::TooLarge);
        }

        let text = core::str::from_utf8(buf).map_err(|_| RequestError::InvalidEncoding)?;

        // The header block must be complete before we act on the request
        if !text.contains("\r\n\r\n") {
            return Err(RequestError::Incomplete);
        }

        let line = text
            .split("\r\n")
            .next()
            .ok_or(RequestError::MalformedRequestLine)?;

        let mut parts = line.split(' ');
        let method = parts.next().ok_or(RequestError::MalformedRequestLine)?;
        let target = parts.next().ok_or(RequestError::MalformedRequestLine)?;
        let version = parts.next().ok_or(RequestError::MalformedRequestLine)?;
        if parts.next().is_some() || method.is_empty() || !target.starts_with('/') {
            return Err(RequestError::MalformedRequestLine);
        }
        if !version.starts_with("HTTP/1.") {
            return Err(RequestError::UnsupportedVersion);
        }

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        Ok(Self {
            method: Method::from_token(method),
            method_token: method,
            path,
            query,
        })
    }

    /// Iterate over `name=value` query arguments
    pub fn args(&self) -> Args<'a> {
        Args {
            rest: self.query.unwrap_or(""),
        }
    }

    /// Number of query arguments
    pub fn arg_count(&self) -> usize {
        self.args().count()
    }

    /// Look up the first argument with the given name
    pub fn arg(&self, name: &str) -> Option<&'a str> {
        self.args().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

/// Iterator over query arguments
///
/// Empty segments (`a=1&&b=2`) are skipped and a name without `=` yields an
/// empty value. Values are not percent-decoded.
#[derive(Debug, Clone)]
pub struct Args<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Args<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest.is_empty() {
                return None;
            }
            let (segment, rest) = match self.rest.split_once('&') {
                Some((segment, rest)) => (segment, rest),
                None => (self.rest, ""),
            };
            self.rest = rest;
            if segment.is_empty() {
                continue;
            }
            return Some(segment.split_once('=').unwrap_or((segment, "")));
        }
    }
}
