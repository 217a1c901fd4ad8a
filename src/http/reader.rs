//! Request head reader.
//!
//! # Responsibilities
//! - Read from the client until the header terminator arrives
//! - Grow the buffer by doubling whenever it fills up
//! - Distinguish timeout, early close and I/O failure
//!
//! # Design Decisions
//! - The receive timeout is set on the socket by the caller; a read that
//!   blocks past it surfaces as `WouldBlock`/`TimedOut` and is reported as
//!   `ReadError::Timeout`
//! - Only the newly read bytes (plus three bytes of overlap) are scanned
//!   for the terminator, so many tiny reads stay linear

use std::io::{self, Read};

use crate::http::request::{find_terminator, HEADER_TERMINATOR};

/// Error type for reading a request head.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("timed out waiting for request headers")]
    Timeout,

    #[error("client closed the connection after {received} bytes, before the end of headers")]
    ClosedEarly { received: usize },

    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

/// Read until `\r\n\r\n` has been received.
///
/// Returns every byte read so far, which may include data past the terminator.
pub fn read_headers<R: Read>(reader: &mut R, initial_capacity: usize) -> Result<Vec<u8>, ReadError> {
    let mut buf = vec![0u8; initial_capacity.max(HEADER_TERMINATOR.len())];
    let mut filled = 0;

    loop {
        if filled == buf.len() {
            let doubled = buf.len() * 2;
            buf.resize(doubled, 0);
        }

        let n = match reader.read(&mut buf[filled..]) {
            Ok(0) => return Err(ReadError::ClosedEarly { received: filled }),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Err(ReadError::Timeout)
            }
            Err(e) => return Err(ReadError::Io(e)),
        };

        let scan_from = filled.saturating_sub(HEADER_TERMINATOR.len() - 1);
        filled += n;

        if find_terminator(&buf[scan_from..filled]).is_some() {
            buf.truncate(filled);
            return Ok(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out at most `step` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(self.data.len()).min(out.len());
            out[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Failing(io::ErrorKind);

    impl Read for Failing {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(self.0))
        }
    }

    const REQUEST: &[u8] = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

    #[test]
    fn single_read() {
        let got = read_headers(&mut Cursor::new(REQUEST), 4096).unwrap();
        assert_eq!(got, REQUEST);
    }

    #[test]
    fn byte_at_a_time_with_tiny_buffer() {
        let mut reader = Trickle { data: REQUEST, step: 1 };
        let got = read_headers(&mut reader, 4).unwrap();
        assert_eq!(got, REQUEST);
    }

    #[test]
    fn terminator_split_across_reads() {
        let mut reader = Trickle { data: REQUEST, step: 7 };
        assert_eq!(read_headers(&mut reader, 8).unwrap(), REQUEST);
    }

    #[test]
    fn keeps_bytes_past_terminator() {
        let data = b"GET / HTTP/1.1\r\nHost: a\r\n\r\nextra-bytes";
        let got = read_headers(&mut Cursor::new(&data[..]), 4096).unwrap();
        assert_eq!(got, data);
    }

    #[test]
    fn large_head_grows_buffer() {
        let mut data = b"GET / HTTP/1.1\r\nHost: a\r\nX-Pad: ".to_vec();
        data.extend(std::iter::repeat(b'x').take(20_000));
        data.extend_from_slice(b"\r\n\r\n");

        let got = read_headers(&mut Cursor::new(&data), 16).unwrap();
        assert_eq!(got, data);
    }

    #[test]
    fn eof_before_terminator() {
        let err = read_headers(&mut Cursor::new(&b"GET / HTTP/1.1\r\n"[..]), 64).unwrap_err();
        assert!(matches!(err, ReadError::ClosedEarly { received: 16 }));
    }

    #[test]
    fn would_block_is_timeout() {
        let err = read_headers(&mut Failing(io::ErrorKind::WouldBlock), 64).unwrap_err();
        assert!(matches!(err, ReadError::Timeout));
    }

    #[test]
    fn other_errors_are_io() {
        let err = read_headers(&mut Failing(io::ErrorKind::ConnectionReset), 64).unwrap_err();
        assert!(matches!(err, ReadError::Io(_)));
    }
}
