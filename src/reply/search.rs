//! FT.AGGREGATE and FT.CURSOR reply shapers.

use super::{array, check, fixed, scalar, unexpected, unsigned};
use crate::codec::RedisCodec;
use crate::error::{ReplyError, Result};
use crate::protocol::Frame;

/// A field value in an aggregate row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateValue<V> {
    /// Scalar value
    Value(V),
    /// Multi-valued result, e.g. from `TOLIST`
    List(Vec<V>),
}

impl<V> AggregateValue<V> {
    /// Scalar value, if this is not a list.
    pub fn as_value(&self) -> Option<&V> {
        match self {
            Self::Value(v) => Some(v),
            Self::List(_) => None,
        }
    }
}

/// One aggregate row: field/value pairs in reply order.
pub type AggregateRow<K, V> = Vec<(K, AggregateValue<V>)>;

/// FT.AGGREGATE reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResults<K, V> {
    /// Total reported by the server
    pub total: u64,
    /// Rows in reply order
    pub rows: Vec<AggregateRow<K, V>>,
}

/// FT.AGGREGATE WITHCURSOR and FT.CURSOR READ reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateWithCursorResults<K, V> {
    /// Rows of this batch
    pub results: AggregateResults<K, V>,
    /// Cursor to continue with; `0` once exhausted
    pub cursor: u64,
}

fn value<K, V>(codec: &dyn RedisCodec<K, V>, frame: &Frame) -> Result<V> {
    match scalar(frame) {
        Some(bytes) => codec.decode_value(&bytes),
        None => Err(unexpected("field value", frame)),
    }
}

fn row<K, V>(codec: &dyn RedisCodec<K, V>, frame: Frame) -> Result<AggregateRow<K, V>> {
    let items = array(frame, "row")?;
    if items.len() % 2 != 0 {
        return Err(ReplyError::UnexpectedLength {
            context: "row",
            expected: items.len() + 1,
            actual: items.len(),
        }
        .into());
    }

    let mut fields = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(name), Some(field)) = (iter.next(), iter.next()) {
        let name = match scalar(&name) {
            Some(bytes) => codec.decode_key(&bytes)?,
            None => return Err(unexpected("field name", &name)),
        };
        let field = match field {
            Frame::Null => continue,
            Frame::Array(items) => AggregateValue::List(
                items
                    .iter()
                    .filter(|f| !f.is_null())
                    .map(|f| value(codec, f))
                    .collect::<Result<_>>()?,
            ),
            other => AggregateValue::Value(value(codec, &other)?),
        };
        fields.push((name, field));
    }
    Ok(fields)
}

/// FT.AGGREGATE: `[total, row, row, ...]`.
pub fn aggregate_results<K, V>(
    codec: &dyn RedisCodec<K, V>,
    frame: Frame,
) -> Result<AggregateResults<K, V>> {
    let mut items = array(frame, "aggregate reply")?.into_iter();
    let total = match items.next() {
        Some(total) => unsigned(&total, "aggregate total")?,
        None => {
            return Err(ReplyError::UnexpectedLength {
                context: "aggregate reply",
                expected: 1,
                actual: 0,
            }
            .into());
        }
    };
    let rows = items.map(|r| row(codec, r)).collect::<Result<_>>()?;
    Ok(AggregateResults { total, rows })
}

/// FT.AGGREGATE WITHCURSOR / FT.CURSOR READ: `[[total, rows...], cursor]`.
pub fn aggregate_with_cursor_results<K, V>(
    codec: &dyn RedisCodec<K, V>,
    frame: Frame,
) -> Result<AggregateWithCursorResults<K, V>> {
    let [results, cursor] = fixed::<2>(check(frame)?, "cursor reply")?;
    Ok(AggregateWithCursorResults {
        results: aggregate_results(codec, results)?,
        cursor: unsigned(&cursor, "cursor id")?,
    })
}
