//! Request head tokenizer.
//!
//! # Responsibilities
//! - Split the raw request at the header terminator
//! - Tokenize the request line and the ordered header lines
//! - Rewrite the `Connection` header and re-serialize the request
//!
//! # Design Decisions
//! - Header lines are kept as raw bytes, so untouched headers are forwarded
//!   byte-for-byte (casing, spacing, order and non-ASCII octets preserved)
//! - Lines without a `:` (folded continuations, junk) pass through and are
//!   invisible to name lookup
//! - Only the request line has to be text
//! - Header name lookup is ASCII case-insensitive
//! - Bytes after the terminator are carried as-is and re-emitted last

use std::fmt;

/// End of the request head.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

const CRLF: &[u8] = b"\r\n";
const CONNECTION_CLOSE: &[u8] = b"Connection: close";

/// Error type for request head parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("request head is not terminated by an empty line")]
    Incomplete,

    #[error("request line is not valid UTF-8")]
    InvalidRequestLine,
}

/// Position of the first `\r\n\r\n` in `bytes`, if any.
pub fn find_terminator(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// Split on `\r\n`. A bare `\n` stays inside its line.
fn split_lines(mut bytes: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    while let Some(pos) = bytes.windows(CRLF.len()).position(|w| w == CRLF) {
        lines.push(&bytes[..pos]);
        bytes = &bytes[pos + CRLF.len()..];
    }
    lines.push(bytes);
    lines
}

fn trim_ows(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = bytes {
        bytes = rest;
    }
    bytes
}

/// A single header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    raw: Vec<u8>,
    colon: Option<usize>,
}

impl Header {
    fn parse(line: &[u8]) -> Self {
        Self {
            raw: line.to_vec(),
            colon: line.iter().position(|&b| b == b':'),
        }
    }

    fn connection_close() -> Self {
        Self::parse(CONNECTION_CLOSE)
    }

    /// Bytes before the first `:`; `None` for lines without one.
    pub fn name(&self) -> Option<&[u8]> {
        self.colon.map(|colon| &self.raw[..colon])
    }

    /// Value with surrounding spaces and tabs removed.
    pub fn value(&self) -> Option<&[u8]> {
        self.colon.map(|colon| trim_ows(&self.raw[colon + 1..]))
    }

    /// The line exactly as received.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name()
            .is_some_and(|n| n.eq_ignore_ascii_case(name.as_bytes()))
    }
}

/// The three tokens of a request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: &'a str,
    pub target: &'a str,
    pub version: &'a str,
}

/// Parsed request head: request line, ordered headers and any bytes past the terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    request_line: String,
    headers: Vec<Header>,
    trailing: Vec<u8>,
}

impl RequestHead {
    /// Tokenize a raw request. The buffer must contain the header terminator.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let end = find_terminator(bytes).ok_or(ParseError::Incomplete)?;
        let lines = split_lines(&bytes[..end]);

        let (first, rest) = lines.split_first().ok_or(ParseError::Incomplete)?;
        let request_line = std::str::from_utf8(first)
            .map_err(|_| ParseError::InvalidRequestLine)?
            .to_string();

        Ok(Self {
            request_line,
            headers: rest.iter().map(|line| Header::parse(line)).collect(),
            trailing: bytes[end + HEADER_TERMINATOR.len()..].to_vec(),
        })
    }

    /// The request line as received, which is also the start of the request.
    pub fn request_line(&self) -> &str {
        &self.request_line
    }

    /// Split the request line into exactly three whitespace-separated tokens.
    pub fn request_line_parts(&self) -> Option<RequestLine<'_>> {
        let mut tokens = self.request_line.split_ascii_whitespace();
        let parts = RequestLine {
            method: tokens.next()?,
            target: tokens.next()?,
            version: tokens.next()?,
        };
        match tokens.next() {
            Some(_) => None,
            None => Some(parts),
        }
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Value of the first header with this name.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|h| h.is_named(name))
            .and_then(Header::value)
    }

    /// Host header value. A Host value that is not UTF-8 counts as absent.
    pub fn host(&self) -> Option<&str> {
        self.header("host")
            .and_then(|value| std::str::from_utf8(value).ok())
    }

    /// Bytes received after the header terminator.
    pub fn trailing(&self) -> &[u8] {
        &self.trailing
    }

    /// Leave exactly one `Connection: close` header.
    ///
    /// The first existing `Connection` header is replaced in place and any
    /// further ones are dropped; without one, the header is appended last.
    pub fn force_connection_close(&mut self) {
        let mut seen = false;
        self.headers.retain(|header| {
            if !header.is_named("connection") {
                return true;
            }
            !std::mem::replace(&mut seen, true)
        });

        match self.headers.iter_mut().find(|h| h.is_named("connection")) {
            Some(header) => *header = Header::connection_close(),
            None => self.headers.push(Header::connection_close()),
        }
    }

    /// Serialize back into wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.request_line.len()
                + self.headers.iter().map(|h| h.raw.len() + CRLF.len()).sum::<usize>()
                + HEADER_TERMINATOR.len()
                + self.trailing.len(),
        );

        out.extend_from_slice(self.request_line.as_bytes());
        for header in &self.headers {
            out.extend_from_slice(CRLF);
            out.extend_from_slice(&header.raw);
        }
        out.extend_from_slice(HEADER_TERMINATOR);
        out.extend_from_slice(&self.trailing);
        out
    }
}

impl fmt::Display for RequestHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.request_line)
    }
}
