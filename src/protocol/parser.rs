//! RESP reply parser.
//!
//! This parser is designed for:
//! - Streaming input (replies may arrive split across reads)
//! - Atomic consumption (a partial frame leaves the buffer untouched)
//! - Security (bounded allocations, bounded nesting)

use super::frame::Frame;
use super::markers;
use crate::error::ProtocolError;
use crate::{MAX_ARRAY_LEN, MAX_BULK_SIZE, MAX_NESTING};
use bytes::{Buf, Bytes, BytesMut};
use memchr::memchr;

/// Bounds applied while decoding replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    /// Largest accepted bulk string, in bytes
    pub max_bulk_len: usize,
    /// Largest accepted array length
    pub max_array_len: usize,
    /// Deepest accepted array nesting
    pub max_depth: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_bulk_len: MAX_BULK_SIZE,
            max_array_len: MAX_ARRAY_LEN,
            max_depth: MAX_NESTING,
        }
    }
}

/// RESP protocol parser with streaming support.
///
/// # Usage
///
/// ```
/// use viator_modules::protocol::{Frame, RespParser};
///
/// let mut parser = RespParser::new();
/// parser.extend(b"*2\r\n:1548149180000\r\n$2\r\n26");
/// assert!(parser.parse().unwrap().is_none());
///
/// parser.extend(b"\r\n");
/// let frame = parser.parse().unwrap().unwrap();
/// assert_eq!(frame.as_array().map(<[Frame]>::len), Some(2));
/// ```
#[derive(Debug, Default)]
pub struct RespParser {
    buffer: BytesMut,
    limits: ParserLimits,
}

impl RespParser {
    /// Create a new parser with default limits.
    pub fn new() -> Self {
        Self::with_limits(ParserLimits::default())
    }

    /// Create a parser with explicit limits.
    pub fn with_limits(limits: ParserLimits) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            limits,
        }
    }

    /// Add data to the parser buffer.
    #[inline]
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Returns true if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the number of buffered bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the parser buffer.
    #[inline]
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Try to parse a complete frame from the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was parsed and consumed
    /// - `Ok(None)` if more data is needed (nothing is consumed)
    /// - `Err(e)` if the data is malformed
    pub fn parse(&mut self) -> Result<Option<Frame>, ProtocolError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let mut cursor = Cursor {
            buf: &self.buffer,
            pos: 0,
            limits: self.limits,
        };
        match cursor.frame(0) {
            Ok(frame) => {
                let consumed = cursor.pos;
                self.buffer.advance(consumed);
                Ok(Some(frame))
            }
            Err(ProtocolError::Incomplete) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Read position over a borrowed buffer.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    limits: ParserLimits,
}

impl Cursor<'_> {
    fn frame(&mut self, depth: usize) -> Result<Frame, ProtocolError> {
        let marker = *self.buf.get(self.pos).ok_or(ProtocolError::Incomplete)?;
        self.pos += 1;

        match marker {
            markers::SIMPLE_STRING => Ok(Frame::Simple(self.line_str()?.to_string())),
            markers::ERROR => Ok(Frame::Error(self.line_str()?.to_string())),
            markers::INTEGER => Ok(Frame::Integer(self.line_str()?.parse()?)),
            markers::DOUBLE => {
                let line = self.line_str()?;
                let value = match line {
                    "inf" => f64::INFINITY,
                    "-inf" => f64::NEG_INFINITY,
                    other => other.parse()?,
                };
                Ok(Frame::Double(value))
            }
            markers::BULK_STRING => self.bulk_string(),
            markers::ARRAY => self.array(depth),
            markers::NULL => {
                self.line()?;
                Ok(Frame::Null)
            }
            _ => Err(ProtocolError::InvalidTypeMarker(marker)),
        }
    }

    fn bulk_string(&mut self) -> Result<Frame, ProtocolError> {
        let len: i64 = self.line_str()?.parse()?;
        if len < 0 {
            return Ok(Frame::Null);
        }

        let len = len as usize;
        if len > self.limits.max_bulk_len {
            return Err(ProtocolError::BulkTooLarge {
                len,
                max: self.limits.max_bulk_len,
            });
        }

        let end = self.pos + len;
        if self.buf.len() < end + 2 {
            return Err(ProtocolError::Incomplete);
        }
        if &self.buf[end..end + 2] != b"\r\n" {
            return Err(ProtocolError::MissingCrlf);
        }

        let data = Bytes::copy_from_slice(&self.buf[self.pos..end]);
        self.pos = end + 2;
        Ok(Frame::Bulk(data))
    }

    fn array(&mut self, depth: usize) -> Result<Frame, ProtocolError> {
        let len: i64 = self.line_str()?.parse()?;
        if len < 0 {
            return Ok(Frame::Null);
        }

        let len = len as usize;
        if len > self.limits.max_array_len {
            return Err(ProtocolError::TooManyElements {
                count: len,
                max: self.limits.max_array_len,
            });
        }
        if depth >= self.limits.max_depth {
            return Err(ProtocolError::TooDeep(self.limits.max_depth));
        }

        let mut frames = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            frames.push(self.frame(depth + 1)?);
        }
        Ok(Frame::Array(frames))
    }

    fn line(&mut self) -> Result<&[u8], ProtocolError> {
        let rest = &self.buf[self.pos..];
        let end = find_crlf(rest).ok_or(ProtocolError::Incomplete)?;
        self.pos += end + 2;
        Ok(&rest[..end])
    }

    fn line_str(&mut self) -> Result<&str, ProtocolError> {
        let line = self.line()?;
        std::str::from_utf8(line).map_err(|_| ProtocolError::InvalidUtf8)
    }
}

/// Find CRLF in a byte slice.
///
/// Uses SIMD-optimized memchr for the `\r` search, then verifies `\n` follows.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    let mut offset = 0;
    while offset < buf.len().saturating_sub(1) {
        match memchr(b'\r', &buf[offset..]) {
            Some(pos) => {
                let abs_pos = offset + pos;
                if abs_pos + 1 < buf.len() && buf[abs_pos + 1] == b'\n' {
                    return Some(abs_pos);
                }
                offset = abs_pos + 1;
            }
            None => return None,
        }
    }
    None
}

/// Parse a single frame from a byte slice (for testing and one-shot parsing).
pub fn parse_frame(data: &[u8]) -> Result<Frame, ProtocolError> {
    let mut parser = RespParser::new();
    parser.extend(data);
    parser.parse()?.ok_or(ProtocolError::Incomplete)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_string() {
        let mut parser = RespParser::new();
        parser.extend(b"+OK\r\n+OK\r\n");

        assert_eq!(parser.parse().unwrap(), Some(Frame::simple("OK")));
        assert_eq!(parser.parse().unwrap(), Some(Frame::simple("OK")));
        assert!(parser.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let frame = parse_frame(b"-ERR TSDB: the key does not exist\r\n").unwrap();
        assert_eq!(frame, Frame::error("ERR TSDB: the key does not exist"));
    }

    #[test]
    fn test_parse_integer_and_double() {
        assert_eq!(parse_frame(b":-1\r\n").unwrap(), Frame::Integer(-1));
        assert_eq!(parse_frame(b",3.25\r\n").unwrap(), Frame::Double(3.25));
        assert_eq!(parse_frame(b",-inf\r\n").unwrap(), Frame::Double(f64::NEG_INFINITY));
    }

    #[test]
    fn test_parse_nulls() {
        assert_eq!(parse_frame(b"$-1\r\n").unwrap(), Frame::Null);
        assert_eq!(parse_frame(b"*-1\r\n").unwrap(), Frame::Null);
        assert_eq!(parse_frame(b"_\r\n").unwrap(), Frame::Null);
    }

    #[test]
    fn test_parse_sample_reply() {
        let frame = parse_frame(b"*2\r\n:1548149180000\r\n$2\r\n26\r\n").unwrap();
        assert_eq!(
            frame,
            Frame::array(vec![Frame::Integer(1548149180000), Frame::bulk("26")])
        );
    }

    #[test]
    fn test_incomplete_nested_frame_consumes_nothing() {
        let mut parser = RespParser::new();
        parser.extend(b"*2\r\n*2\r\n:1\r\n$1\r\n");
        let before = parser.len();

        assert!(parser.parse().unwrap().is_none());
        assert_eq!(parser.len(), before);

        parser.extend(b"5\r\n*0\r\n");
        let frame = parser.parse().unwrap().unwrap();
        assert_eq!(
            frame,
            Frame::array(vec![
                Frame::array(vec![Frame::Integer(1), Frame::bulk("5")]),
                Frame::array(vec![]),
            ])
        );
        assert!(parser.is_empty());
    }

    #[test]
    fn test_bulk_too_large() {
        let mut parser = RespParser::with_limits(ParserLimits {
            max_bulk_len: 4,
            ..ParserLimits::default()
        });
        parser.extend(b"$5\r\nhello\r\n");
        assert_eq!(
            parser.parse(),
            Err(ProtocolError::BulkTooLarge { len: 5, max: 4 })
        );
    }

    #[test]
    fn test_nesting_limit() {
        let mut parser = RespParser::with_limits(ParserLimits {
            max_depth: 2,
            ..ParserLimits::default()
        });
        parser.extend(b"*1\r\n*1\r\n*1\r\n:1\r\n");
        assert_eq!(parser.parse(), Err(ProtocolError::TooDeep(2)));
    }

    #[test]
    fn test_missing_crlf_after_bulk() {
        assert_eq!(parse_frame(b"$2\r\nokXX"), Err(ProtocolError::MissingCrlf));
    }

    #[test]
    fn test_invalid_marker() {
        assert_eq!(
            parse_frame(b"?what\r\n"),
            Err(ProtocolError::InvalidTypeMarker(b'?'))
        );
    }

    #[test]
    fn test_find_crlf_edge_cases() {
        assert_eq!(find_crlf(b""), None);
        assert_eq!(find_crlf(b"\r"), None);
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"ab\rc\r\n"), Some(4));
    }
}

/// Property-based tests using proptest.
#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Parser should never panic on arbitrary input.
        #[test]
        fn parser_never_panics(data: Vec<u8>) {
            let mut parser = RespParser::new();
            parser.extend(&data);
            let _ = parser.parse();
        }

        /// Serialized frames decode back to themselves.
        #[test]
        fn bulk_array_roundtrip(items in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..16)) {
            let frame = Frame::array(items.into_iter().map(|b| Frame::Bulk(Bytes::from(b))).collect());
            let decoded = parse_frame(&frame.to_vec()).unwrap();
            prop_assert_eq!(decoded, frame);
        }

        /// Every strict prefix of a frame is reported as incomplete.
        #[test]
        fn prefixes_are_incomplete(n in i64::MIN..i64::MAX, text in "[a-z0-9]{0,20}") {
            let frame = Frame::array(vec![Frame::Integer(n), Frame::bulk(text)]);
            let bytes = frame.to_vec();
            for cut in 0..bytes.len() {
                let mut parser = RespParser::new();
                parser.extend(&bytes[..cut]);
                prop_assert_eq!(parser.parse(), Ok(None));
                prop_assert_eq!(parser.len(), cut);
            }
        }
    }
}
