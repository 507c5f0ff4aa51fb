//! Status server transport over a host TCP socket

use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use hygrochron_core::traits::{HttpError, HttpServer};
use hygrochron_protocol::{Request, RequestError, Response, StatusCode, MAX_REQUEST_SIZE};
use log::{debug, info, warn};

/// How long a connected client may take to send its request
const READ_TIMEOUT: Duration = Duration::from_millis(500);

pub struct TcpHttp {
    listener: TcpListener,
}

impl TcpHttp {
    /// Bind a non-blocking listener
    pub fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        info!("Status server listening on http://{}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Read until the header block is complete, the buffer fills or the peer stops
fn read_request(stream: &mut TcpStream, buf: &mut [u8]) -> Result<usize, HttpError> {
    let mut len = 0;
    while len < buf.len() {
        match stream.read(&mut buf[len..]) {
            Ok(0) => break,
            Ok(n) => {
                len += n;
                if buf[..len].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
            Err(e) => {
                debug!("Read failed: {}", e);
                return Err(HttpError::Io);
            }
        }
    }
    Ok(len)
}

impl HttpServer for TcpHttp {
    fn serve_one_pending(
        &mut self,
        handler: &mut dyn FnMut(&Request<'_>) -> Response,
    ) -> Result<bool, HttpError> {
        let (mut stream, peer) = match self.listener.accept() {
            Ok(conn) => conn,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(false),
            Err(e) => {
                warn!("Accept failed: {}", e);
                return Err(HttpError::Io);
            }
        };

        stream.set_nonblocking(false).map_err(|_| HttpError::Io)?;
        stream
            .set_read_timeout(Some(READ_TIMEOUT))
            .map_err(|_| HttpError::Io)?;

        let mut buf = [0u8; MAX_REQUEST_SIZE];
        let len = read_request(&mut stream, &mut buf)?;
        if len == 0 {
            debug!("{} closed without a request", peer);
            return Err(HttpError::Truncated);
        }

        let response = match Request::parse(&buf[..len]) {
            Ok(request) => {
                debug!("{} {} {}", peer, request.method_token, request.path);
                handler(&request)
            }
            Err(RequestError::Incomplete) if len < buf.len() => {
                debug!("{} sent a truncated request", peer);
                return Err(HttpError::Truncated);
            }
            Err(e) => {
                debug!("Bad request from {}: {:?}", peer, e);
                Response::text(StatusCode::BadRequest, "Bad Request").map_err(|_| HttpError::Io)?
            }
        };

        let bytes = response.encode_to_vec().map_err(|_| HttpError::Io)?;
        stream.write_all(&bytes).map_err(|_| HttpError::Io)?;
        Ok(true)
    }
}
