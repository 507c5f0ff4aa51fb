//! HTTP server trait

use hygrochron_protocol::{Request, Response};

/// Errors that can occur in the HTTP transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HttpError {
    /// Accepting or reading the connection failed
    Io,
    /// Connection closed before a full request arrived
    Truncated,
}

/// Trait for the HTTP transport
///
/// The transport owns sockets and bytes; routing and response content stay
/// in the core. Unparseable requests are answered by the transport itself.
pub trait HttpServer {
    /// Answer at most one pending request with `handler`
    ///
    /// Returns `Ok(true)` if a request was served, `Ok(false)` if none was
    /// waiting. Must not block waiting for new connections.
    fn serve_one_pending(
        &mut self,
        handler: &mut dyn FnMut(&Request<'_>) -> Response,
    ) -> Result<bool, HttpError>;
}
