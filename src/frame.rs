// https://redis.io/docs/reference/protocol-spec

use bytes::Bytes;
use std::io::Cursor;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("expected array")]
    ExpectedArray,
    #[error("expected bulk string")]
    ExpectedBulkString,
    #[error("invalid element count")]
    InvalidElementCount,
    #[error("invalid bulk length")]
    InvalidBulkLength,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Bulk(Bytes),
    Array(Vec<Frame>),
}

impl Frame {
    /// Parses one client request from `src`: an array header `*<n>` followed
    /// by `n` bulk strings `$<len>\r\n<bytes>\r\n`. Requests use no other
    /// framing type. Returns `Error::Incomplete` when the buffer does not yet
    /// hold the entire request.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let header = get_line(src)?;

        let count = match header.strip_prefix(b"*") {
            Some(count) => parse_decimal(count).ok_or(Error::InvalidElementCount)?,
            None => return Err(Error::ExpectedArray),
        };

        // The count is attacker controlled, cap the pre-allocation.
        let mut elements = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            elements.push(parse_bulk(src)?);
        }

        Ok(Frame::Array(elements))
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(b'+');
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(b'-');
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(data) => {
                let length_str = data.len().to_string();
                let mut bytes = Vec::with_capacity(
                    1 + length_str.len() + CRLF.len() + data.len() + CRLF.len(),
                );
                bytes.push(b'$');
                bytes.extend_from_slice(length_str.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes.extend_from_slice(data);
                bytes.extend_from_slice(CRLF);
                bytes
            }
            // The server never replies with an array; this arm exists so
            // clients (and tests) can build request bytes from frames.
            Frame::Array(arr) => {
                let length_str = arr.len().to_string();
                let mut bytes = Vec::with_capacity(1 + length_str.len() + CRLF.len());
                bytes.push(b'*');
                bytes.extend_from_slice(length_str.as_bytes());
                bytes.extend_from_slice(CRLF);
                for frame in arr {
                    bytes.extend(frame.serialize());
                }
                bytes
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

// $<length>\r\n<data>\r\n
fn parse_bulk(src: &mut Cursor<&[u8]>) -> Result<Frame, Error> {
    let header = get_line(src)?;

    let length = match header.strip_prefix(b"$") {
        Some(length) => parse_decimal(length).ok_or(Error::InvalidBulkLength)?,
        None => return Err(Error::ExpectedBulkString),
    };

    // The body is length-delimited, so it may contain any bytes, CRLF
    // included. The two terminator bytes are discarded without validation.
    let body = get_exact(src, length + CRLF.len())?;

    Ok(Frame::Bulk(Bytes::copy_from_slice(&body[..length])))
}

/// Returns the next `\n`-terminated line, with the terminator consumed and
/// the preceding `\r` (plus any surrounding whitespace) trimmed off.
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf = *src.get_ref();

    let line_end = buf[start..]
        .iter()
        .position(|&byte| byte == b'\n')
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((line_end + 1) as u64);

    Ok(buf[start..line_end].trim_ascii())
}

fn get_exact<'a>(src: &mut Cursor<&'a [u8]>, n: usize) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf = *src.get_ref();

    if buf.len() - start < n {
        return Err(Error::Incomplete);
    }

    src.set_position((start + n) as u64);

    Ok(&buf[start..start + n])
}

fn parse_decimal(bytes: &[u8]) -> Option<usize> {
    std::str::from_utf8(bytes).ok()?.parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ping_request() {
        let data = b"*1\r\n$4\r\nPING\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(
            frame,
            Ok(Frame::Array(ref a)) if a == &vec![Frame::Bulk(Bytes::from("PING"))]
        ));
    }

    #[test]
    fn parse_echo_request() {
        let data = b"*2\r\n$4\r\nECHO\r\n$3\r\nhey\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(
            frame,
            Ok(Frame::Array(ref a)) if a == &vec![
                Frame::Bulk(Bytes::from("ECHO")),
                Frame::Bulk(Bytes::from("hey")),
            ]
        ));
    }

    #[test]
    fn parse_empty_array_request() {
        let data = b"*0\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(frame, Ok(Frame::Array(ref a)) if a.is_empty()));
    }

    #[test]
    fn parse_empty_bulk_string() {
        let data = b"*2\r\n$4\r\nECHO\r\n$0\r\n\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(
            frame,
            Ok(Frame::Array(ref a)) if a[1] == Frame::Bulk(Bytes::new())
        ));
    }

    #[test]
    fn parse_bulk_string_with_embedded_crlf() {
        // The body length is explicit, so CRLF bytes inside it are legal.
        let data = b"*2\r\n$4\r\nECHO\r\n$4\r\na\r\nb\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(
            frame,
            Ok(Frame::Array(ref a)) if a[1] == Frame::Bulk(Bytes::from(&b"a\r\nb"[..]))
        ));
    }

    #[test]
    fn parse_accepts_bare_newline_terminators() {
        let data = b"*1\n$4\nPING\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let frame = Frame::parse(&mut cursor);

        assert!(matches!(
            frame,
            Ok(Frame::Array(ref a)) if a == &vec![Frame::Bulk(Bytes::from("PING"))]
        ));
    }

    #[test]
    fn parse_leaves_trailing_bytes_for_the_next_frame() {
        let data = b"*1\r\n$4\r\nPING\r\n*0\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let first = Frame::parse(&mut cursor);
        let second = Frame::parse(&mut cursor);

        assert!(matches!(first, Ok(Frame::Array(ref a)) if a.len() == 1));
        assert!(matches!(second, Ok(Frame::Array(ref a)) if a.is_empty()));
        assert_eq!(cursor.position(), data.len() as u64);
    }

    #[test]
    fn parse_rejects_missing_array_header() {
        let data = b"PING\r\n";
        let mut cursor = Cursor::new(&data[..]);

        assert_eq!(Frame::parse(&mut cursor), Err(Error::ExpectedArray));
    }

    #[test]
    fn parse_rejects_invalid_element_count() {
        for data in [&b"*abc\r\n"[..], &b"*-1\r\n"[..], &b"*\r\n"[..]] {
            let mut cursor = Cursor::new(data);
            assert_eq!(Frame::parse(&mut cursor), Err(Error::InvalidElementCount));
        }
    }

    #[test]
    fn parse_rejects_missing_bulk_header() {
        let data = b"*1\r\n+PING\r\n";
        let mut cursor = Cursor::new(&data[..]);

        assert_eq!(Frame::parse(&mut cursor), Err(Error::ExpectedBulkString));
    }

    #[test]
    fn parse_rejects_invalid_bulk_length() {
        for data in [&b"*1\r\n$abc\r\n"[..], &b"*1\r\n$-1\r\n"[..]] {
            let mut cursor = Cursor::new(data);
            assert_eq!(Frame::parse(&mut cursor), Err(Error::InvalidBulkLength));
        }
    }

    #[test]
    fn parse_incomplete_header() {
        let data = b"*1\r\n$4\r\nPI";
        let mut cursor = Cursor::new(&data[..]);

        assert_eq!(Frame::parse(&mut cursor), Err(Error::Incomplete));
    }

    #[test]
    fn parse_incomplete_body() {
        // The header promises more body bytes than are buffered. A short body
        // must never be accepted as a complete frame.
        let data = b"*1\r\n$10\r\nPING\r\n";
        let mut cursor = Cursor::new(&data[..]);

        assert_eq!(Frame::parse(&mut cursor), Err(Error::Incomplete));
    }

    #[test]
    fn serialize_simple() {
        let frame = Frame::Simple(String::from("PONG"));

        assert_eq!(frame.serialize(), b"+PONG\r\n");
    }

    #[test]
    fn serialize_error() {
        let frame = Frame::Error(String::from("ERR unknown command"));

        assert_eq!(frame.serialize(), b"-ERR unknown command\r\n");
    }

    #[test]
    fn serialize_bulk() {
        let frame = Frame::Bulk(Bytes::from("hey"));

        assert_eq!(frame.serialize(), b"$3\r\nhey\r\n");
    }

    #[test]
    fn serialize_empty_bulk() {
        let frame = Frame::Bulk(Bytes::new());

        assert_eq!(frame.serialize(), b"$0\r\n\r\n");
    }

    #[test]
    fn serialize_array_round_trips_through_parse() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("ECHO")),
            Frame::Bulk(Bytes::from("hello")),
        ]);

        let bytes = frame.serialize();
        let mut cursor = Cursor::new(&bytes[..]);

        assert_eq!(Frame::parse(&mut cursor), Ok(frame));
    }
}
