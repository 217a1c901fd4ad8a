//! Error responses.
//!
//! # Responsibilities
//! - Map internal failures to a fixed set of HTTP error responses
//! - Build complete HTTP/1.1 responses (date, length, `Connection: close`)
//! - Write them to the client, best effort

use std::fmt;
use std::io::Write;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Kinds of error the proxy answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    NotImplemented,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::NotImplemented => 501,
            ErrorKind::Forbidden => 403,
            ErrorKind::Internal => 500,
        }
    }

    /// Status line text after the protocol version.
    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "400 Bad Request",
            ErrorKind::NotFound => "404 Not Found",
            ErrorKind::NotImplemented => "501 Not supported",
            ErrorKind::Forbidden => "403 Forbidden",
            ErrorKind::Internal => "500 Internal Server Error",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request.",
            ErrorKind::NotFound => "File not found.",
            ErrorKind::NotImplemented => "Method is not supported.",
            ErrorKind::Forbidden => "Access denied.",
            ErrorKind::Internal => "Some server side error.",
        }
    }

    /// Label used for the `status` metric.
    pub fn metric_label(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "400",
            ErrorKind::NotFound => "404",
            ErrorKind::NotImplemented => "501",
            ErrorKind::Forbidden => "403",
            ErrorKind::Internal => "500",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// RFC 1123 formatted date.
struct HttpDate(SystemTime);

impl fmt::Display for HttpDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let datetime = DateTime::<Utc>::from(self.0);
        write!(f, "{}", datetime.format("%a, %d %b %Y %H:%M:%S GMT"))
    }
}

/// Build the full response for `kind`, dated `now`.
pub fn error_response(kind: ErrorKind, now: SystemTime) -> Vec<u8> {
    let title = kind.title();
    let body = format!(
        "<HTML><HEAD><TITLE>{title}</TITLE></HEAD>\r\n<BODY><H4>{title}</H4>\r\n{}\r\n</BODY></HTML>",
        kind.description()
    );

    format!(
        "HTTP/1.1 {title}\r\nServer: {SERVER_NAME}\r\nDate: {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        HttpDate(now),
        body.len()
    )
    .into_bytes()
}

/// Send the error response for `kind`. Write failures are logged, not returned:
/// the connection is torn down either way.
pub fn send_error<W: Write>(client: &mut W, kind: ErrorKind) {
    let response = error_response(kind, SystemTime::now());
    if let Err(e) = client.write_all(&response).and_then(|()| client.flush()) {
        tracing::debug!(status = kind.status_code(), error = %e, "Failed to send error response");
    }
}
