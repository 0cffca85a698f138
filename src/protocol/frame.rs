//! RESP frame types.
//!
//! A Frame is either an outgoing request (an array of bulk strings built from
//! a [`Command`](crate::commands::Command)) or an incoming reply decoded by
//! [`RespParser`](super::RespParser).

use super::markers;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// A RESP frame representing a complete protocol message.
///
/// # Design
///
/// Frames are cheap to clone (using `Bytes` for data) and serialize with
/// direct writes into a caller-provided buffer.
#[derive(Clone, PartialEq)]
pub enum Frame {
    /// Simple string (no newlines allowed)
    Simple(String),

    /// Error message
    Error(String),

    /// 64-bit signed integer
    Integer(i64),

    /// RESP3 double
    Double(f64),

    /// Bulk string (binary-safe)
    Bulk(Bytes),

    /// Null bulk string, null array or RESP3 null
    Null,

    /// Array of frames
    Array(Vec<Frame>),
}

impl Frame {
    /// Create a simple string frame.
    #[inline]
    pub fn simple(s: impl Into<String>) -> Self {
        Self::Simple(s.into())
    }

    /// Create an error frame.
    #[inline]
    pub fn error(s: impl Into<String>) -> Self {
        Self::Error(s.into())
    }

    /// Create a bulk string frame.
    #[inline]
    pub fn bulk(data: impl Into<Bytes>) -> Self {
        Self::Bulk(data.into())
    }

    /// Create an array frame.
    #[inline]
    pub fn array(frames: Vec<Frame>) -> Self {
        Self::Array(frames)
    }

    /// Check if this is a null frame.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is an error frame.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Short name of the frame kind, used in reply errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Simple(_) => "simple string",
            Self::Error(_) => "error",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Bulk(_) => "bulk string",
            Self::Null => "null",
            Self::Array(_) => "array",
        }
    }

    /// Try to get the frame as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Simple(s) | Self::Error(s) => Some(s),
            Self::Bulk(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Try to get the frame as bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Simple(s) => Some(s.as_bytes()),
            Self::Bulk(b) => Some(b),
            _ => None,
        }
    }

    /// Try to get the frame as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Bulk(b) => std::str::from_utf8(b).ok()?.parse().ok(),
            Self::Simple(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to get the frame as a double.
    ///
    /// Integers widen, and textual values accept the `inf`/`-inf` spellings
    /// the server uses.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Integer(n) => Some(*n as f64),
            Self::Bulk(b) => parse_double(std::str::from_utf8(b).ok()?),
            Self::Simple(s) => parse_double(s),
            _ => None,
        }
    }

    /// Try to get the frame as an array.
    pub fn as_array(&self) -> Option<&[Frame]> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Take the elements out of an array frame.
    pub fn into_array(self) -> std::result::Result<Vec<Frame>, Frame> {
        match self {
            Self::Array(arr) => Ok(arr),
            other => Err(other),
        }
    }

    /// Convert frame to owned Bytes.
    pub fn to_bytes(&self) -> Option<Bytes> {
        match self {
            Self::Bulk(b) => Some(b.clone()),
            Self::Simple(s) => Some(Bytes::copy_from_slice(s.as_bytes())),
            _ => None,
        }
    }

    /// Serialize the frame to a buffer.
    pub fn serialize(&self, buf: &mut BytesMut) {
        match self {
            Self::Simple(s) => {
                buf.put_u8(markers::SIMPLE_STRING);
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            Self::Error(s) => {
                buf.put_u8(markers::ERROR);
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            Self::Integer(n) => {
                buf.put_u8(markers::INTEGER);
                let mut temp = itoa::Buffer::new();
                buf.put_slice(temp.format(*n).as_bytes());
                buf.put_slice(b"\r\n");
            }
            Self::Double(d) => {
                buf.put_u8(markers::DOUBLE);
                buf.put_slice(format_double(*d).as_bytes());
                buf.put_slice(b"\r\n");
            }
            Self::Bulk(data) => {
                buf.put_u8(markers::BULK_STRING);
                let mut temp = itoa::Buffer::new();
                buf.put_slice(temp.format(data.len() as i64).as_bytes());
                buf.put_slice(b"\r\n");
                buf.put_slice(data);
                buf.put_slice(b"\r\n");
            }
            Self::Null => {
                buf.put_slice(b"$-1\r\n");
            }
            Self::Array(frames) => {
                buf.put_u8(markers::ARRAY);
                let mut temp = itoa::Buffer::new();
                buf.put_slice(temp.format(frames.len() as i64).as_bytes());
                buf.put_slice(b"\r\n");
                for frame in frames {
                    frame.serialize(buf);
                }
            }
        }
    }

    /// Calculate the serialized size of this frame.
    pub fn serialized_size(&self) -> usize {
        match self {
            Self::Simple(s) | Self::Error(s) => 1 + s.len() + 2,
            Self::Integer(n) => 1 + decimal_len(*n) + 2,
            Self::Double(d) => 1 + format_double(*d).len() + 2,
            Self::Bulk(data) => 1 + decimal_len(data.len() as i64) + 2 + data.len() + 2,
            Self::Null => 5, // $-1\r\n
            Self::Array(frames) => {
                let content_size: usize = frames.iter().map(Frame::serialized_size).sum();
                1 + decimal_len(frames.len() as i64) + 2 + content_size
            }
        }
    }

    /// Convert to a `Vec<u8>` for convenience.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.serialized_size());
        self.serialize(&mut buf);
        buf.to_vec()
    }
}

/// Render a double the way the server spells it.
pub(crate) fn format_double(d: f64) -> String {
    if d.is_infinite() {
        if d.is_sign_positive() {
            "+inf".to_string()
        } else {
            "-inf".to_string()
        }
    } else {
        format!("{d}")
    }
}

fn parse_double(s: &str) -> Option<f64> {
    match s {
        "inf" | "+inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => s.parse().ok(),
    }
}

fn decimal_len(n: i64) -> usize {
    let mut temp = itoa::Buffer::new();
    temp.format(n).len()
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(s) => write!(f, "Simple({s:?})"),
            Self::Error(s) => write!(f, "Error({s:?})"),
            Self::Integer(n) => write!(f, "Integer({n})"),
            Self::Double(d) => write!(f, "Double({d})"),
            Self::Bulk(b) => {
                if let Ok(s) = std::str::from_utf8(b) {
                    write!(f, "Bulk({s:?})")
                } else {
                    write!(f, "Bulk({b:?})")
                }
            }
            Self::Null => write!(f, "Null"),
            Self::Array(arr) => f.debug_list().entries(arr).finish(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(s) => write!(f, "{s}"),
            Self::Error(s) => write!(f, "(error) {s}"),
            Self::Integer(n) => write!(f, "(integer) {n}"),
            Self::Double(d) => write!(f, "(double) {}", format_double(*d)),
            Self::Bulk(b) => {
                if let Ok(s) = std::str::from_utf8(b) {
                    write!(f, "\"{s}\"")
                } else {
                    write!(f, "<{} bytes>", b.len())
                }
            }
            Self::Null => write!(f, "(nil)"),
            Self::Array(arr) => {
                if arr.is_empty() {
                    return write!(f, "(empty array)");
                }
                for (i, frame) in arr.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {frame}", i + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Frame {
    fn from(s: &str) -> Self {
        Self::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Frame {
    fn from(s: String) -> Self {
        Self::Bulk(Bytes::from(s))
    }
}

impl From<Bytes> for Frame {
    fn from(b: Bytes) -> Self {
        Self::Bulk(b)
    }
}

impl From<i64> for Frame {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<Vec<Frame>> for Frame {
    fn from(frames: Vec<Frame>) -> Self {
        Self::Array(frames)
    }
}

impl<T: Into<Frame>> FromIterator<T> for Frame {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::Array(iter.into_iter().map(Into::into).collect())
    }
}

/// Fast integer to string conversion.
pub(crate) mod itoa {
    pub struct Buffer {
        bytes: [u8; 20],
    }

    impl Buffer {
        pub fn new() -> Self {
            Self { bytes: [0; 20] }
        }

        pub fn format(&mut self, n: i64) -> &str {
            let negative = n < 0;
            // unsigned_abs keeps i64::MIN representable
            let mut n = n.unsigned_abs();

            let mut i = self.bytes.len();
            loop {
                i -= 1;
                self.bytes[i] = b'0' + (n % 10) as u8;
                n /= 10;
                if n == 0 {
                    break;
                }
            }

            if negative {
                i -= 1;
                self.bytes[i] = b'-';
            }

            // Only ASCII digits and '-' are written
            std::str::from_utf8(&self.bytes[i..]).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_string_serialize() {
        let frame = Frame::simple("OK");
        assert_eq!(frame.to_vec(), b"+OK\r\n");
    }

    #[test]
    fn test_integer_serialize() {
        assert_eq!(Frame::Integer(42).to_vec(), b":42\r\n");
        assert_eq!(Frame::Integer(-1).to_vec(), b":-1\r\n");
        assert_eq!(Frame::Integer(0).to_vec(), b":0\r\n");
        assert_eq!(
            Frame::Integer(i64::MIN).to_vec(),
            b":-9223372036854775808\r\n"
        );
    }

    #[test]
    fn test_bulk_string_serialize() {
        assert_eq!(Frame::bulk("hello").to_vec(), b"$5\r\nhello\r\n");
        assert_eq!(Frame::bulk("").to_vec(), b"$0\r\n\r\n");
    }

    #[test]
    fn test_request_array_serialize() {
        let frame = Frame::array(vec![
            Frame::bulk("TS.GET"),
            Frame::bulk("temp:1"),
            Frame::bulk("LATEST"),
        ]);
        assert_eq!(
            frame.to_vec(),
            b"*3\r\n$6\r\nTS.GET\r\n$6\r\ntemp:1\r\n$6\r\nLATEST\r\n"
        );
    }

    #[test]
    fn test_serialized_size_matches_output() {
        let frame = Frame::array(vec![
            Frame::Integer(-120),
            Frame::bulk("0123456789"),
            Frame::Double(1.5),
            Frame::Null,
            Frame::array(vec![Frame::simple("OK")]),
        ]);
        assert_eq!(frame.serialized_size(), frame.to_vec().len());
    }

    #[test]
    fn test_as_double_accepts_server_spellings() {
        assert_eq!(Frame::bulk("21.5").as_double(), Some(21.5));
        assert_eq!(Frame::bulk("inf").as_double(), Some(f64::INFINITY));
        assert_eq!(Frame::bulk("-inf").as_double(), Some(f64::NEG_INFINITY));
        assert_eq!(Frame::Integer(3).as_double(), Some(3.0));
        assert_eq!(Frame::Double(0.25).as_double(), Some(0.25));
        assert_eq!(Frame::Null.as_double(), None);
    }

    #[test]
    fn test_format_double() {
        assert_eq!(format_double(1.0), "1");
        assert_eq!(format_double(0.5), "0.5");
        assert_eq!(format_double(f64::INFINITY), "+inf");
        assert_eq!(format_double(f64::NEG_INFINITY), "-inf");
    }
}
