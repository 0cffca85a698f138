//! Reply shapers.
//!
//! Turn raw module replies into typed records. Multi-series replies keep the
//! server's order, and fields the server leaves out (null values, empty
//! samples) stay absent rather than defaulted.

pub mod search;
pub mod timeseries;

use crate::error::{Error, ReplyError, Result};
use crate::protocol::Frame;
use crate::protocol::frame::{format_double, itoa};
use std::borrow::Cow;

/// Turn a top-level error frame into [`Error::Server`].
pub(crate) fn check(frame: Frame) -> Result<Frame> {
    match frame {
        Frame::Error(msg) => Err(Error::Server(msg)),
        other => Ok(other),
    }
}

pub(crate) fn unexpected(expected: &'static str, frame: &Frame) -> Error {
    ReplyError::UnexpectedType {
        expected,
        actual: frame.kind().to_string(),
    }
    .into()
}

pub(crate) fn array(frame: Frame, expected: &'static str) -> Result<Vec<Frame>> {
    check(frame)?.into_array().map_err(|other| unexpected(expected, &other))
}

pub(crate) fn fixed<const N: usize>(frame: Frame, context: &'static str) -> Result<[Frame; N]> {
    let items = array(frame, context)?;
    <[Frame; N]>::try_from(items).map_err(|items| {
        ReplyError::UnexpectedLength {
            context,
            expected: N,
            actual: items.len(),
        }
        .into()
    })
}

/// Raw bytes of a scalar frame. Numbers are rendered back to text.
pub(crate) fn scalar(frame: &Frame) -> Option<Cow<'_, [u8]>> {
    match frame {
        Frame::Bulk(b) => Some(Cow::Borrowed(b)),
        Frame::Simple(s) => Some(Cow::Borrowed(s.as_bytes())),
        Frame::Integer(n) => {
            let mut buf = itoa::Buffer::new();
            Some(Cow::Owned(buf.format(*n).as_bytes().to_vec()))
        }
        Frame::Double(d) => Some(Cow::Owned(format_double(*d).into_bytes())),
        _ => None,
    }
}

pub(crate) fn integer(frame: &Frame, context: &'static str) -> Result<i64> {
    match frame {
        Frame::Error(msg) => Err(Error::Server(msg.clone())),
        Frame::Integer(n) => Ok(*n),
        Frame::Bulk(_) | Frame::Simple(_) => frame.as_integer().ok_or_else(|| {
            ReplyError::InvalidNumber {
                context,
                value: frame.as_str().unwrap_or_default().to_string(),
            }
            .into()
        }),
        other => Err(unexpected("integer", other)),
    }
}

pub(crate) fn unsigned(frame: &Frame, context: &'static str) -> Result<u64> {
    let n = integer(frame, context)?;
    u64::try_from(n).map_err(|_| {
        ReplyError::InvalidNumber {
            context,
            value: n.to_string(),
        }
        .into()
    })
}

pub(crate) fn double(frame: &Frame, context: &'static str) -> Result<f64> {
    match frame {
        Frame::Error(msg) => Err(Error::Server(msg.clone())),
        Frame::Double(_) | Frame::Integer(_) | Frame::Bulk(_) | Frame::Simple(_) => {
            frame.as_double().ok_or_else(|| {
                ReplyError::InvalidNumber {
                    context,
                    value: frame.as_str().unwrap_or_default().to_string(),
                }
                .into()
            })
        }
        other => Err(unexpected("double", other)),
    }
}

/// Status reply of TS.CREATE, TS.ALTER, TS.CREATERULE and friends.
pub fn ok(frame: Frame) -> Result<String> {
    match check(frame)? {
        Frame::Simple(s) => Ok(s),
        Frame::Bulk(b) => String::from_utf8(b.to_vec()).map_err(|_| {
            crate::error::ProtocolError::InvalidUtf8.into()
        }),
        other => Err(unexpected("status", &other)),
    }
}

/// Integer reply, e.g. the number of samples TS.DEL removed.
pub fn count(frame: Frame) -> Result<u64> {
    unsigned(&check(frame)?, "count")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_error_frame_becomes_server_error() {
        let err = ok(Frame::error("ERR TSDB: key already exists")).unwrap_err();
        assert!(matches!(err, Error::Server(msg) if msg == "ERR TSDB: key already exists"));
    }

    #[test]
    fn test_ok_and_count() {
        assert_eq!(ok(Frame::simple("OK")).unwrap(), "OK");
        assert_eq!(count(Frame::Integer(3)).unwrap(), 3);
        assert!(count(Frame::Integer(-1)).is_err());
        assert!(matches!(
            count(Frame::Null).unwrap_err(),
            Error::Reply(ReplyError::UnexpectedType { expected: "integer", .. })
        ));
    }

    #[test]
    fn test_numbers_from_text() {
        assert_eq!(integer(&Frame::Bulk(Bytes::from("42")), "t").unwrap(), 42);
        assert_eq!(double(&Frame::Bulk(Bytes::from("-inf")), "t").unwrap(), f64::NEG_INFINITY);
        assert!(matches!(
            double(&Frame::Bulk(Bytes::from("abc")), "t").unwrap_err(),
            Error::Reply(ReplyError::InvalidNumber { context: "t", .. })
        ));
    }

    #[test]
    fn test_scalar_renders_numbers() {
        assert_eq!(scalar(&Frame::Integer(-5)).unwrap().as_ref(), b"-5");
        assert_eq!(scalar(&Frame::Double(1.5)).unwrap().as_ref(), b"1.5");
        assert!(scalar(&Frame::Null).is_none());
    }
}
