//! Status server wire protocol
//!
//! A deliberately small HTTP/1.x codec for the device's status endpoints.
//! Only what a single-request-per-connection server needs is covered:
//!
//! ```text
//! GET /json?unit=c HTTP/1.1\r\n      <- request line (parsed)
//! Host: 192.168.1.200\r\n            <- headers (skipped)
//! \r\n
//!
//! HTTP/1.1 200 OK\r\n                <- status line (encoded)
//! Content-Type: application/json\r\n
//! Content-Length: 77\r\n
//! Access-Control-Allow-Origin: *\r\n
//! ...
//! ```
//!
//! Everything works on borrowed slices and fixed-capacity buffers, so the
//! codec runs on the device without an allocator.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod request;
pub mod response;

pub use request::{Args, Method, Request, RequestError, MAX_REQUEST_SIZE};
pub use response::{
    ContentType, EncodeError, Response, StatusCode, CORS_HEADERS, MAX_BODY_SIZE,
    MAX_RESPONSE_SIZE,
};
