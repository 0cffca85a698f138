//! Time-series reply shapers.

use super::{array, check, double, fixed, scalar, unexpected, unsigned};
use crate::codec::RedisCodec;
use crate::error::{Error, ReplyError, Result};
use crate::protocol::Frame;
use crate::timeseries::{GetResult, RangeResult, Sample};

fn parse_sample(frame: Frame) -> Result<Option<Sample>> {
    let items = match check(frame)? {
        Frame::Null => return Ok(None),
        Frame::Array(items) if items.is_empty() => return Ok(None),
        Frame::Array(items) => items,
        other => return Err(unexpected("sample", &other)),
    };
    if items.len() != 2 {
        return Err(ReplyError::UnexpectedLength {
            context: "sample",
            expected: 2,
            actual: items.len(),
        }
        .into());
    }
    Ok(Some(Sample {
        timestamp: unsigned(&items[0], "sample timestamp")?,
        value: double(&items[1], "sample value")?,
    }))
}

/// TS.GET: `[ts, value]`, or an empty array for a series without samples.
pub fn sample(frame: Frame) -> Result<Option<Sample>> {
    parse_sample(frame)
}

/// TS.RANGE / TS.REVRANGE: `[[ts, value], ...]`.
pub fn samples(frame: Frame) -> Result<Vec<Sample>> {
    array(frame, "sample list")?
        .into_iter()
        .map(|item| {
            let s = parse_sample(item)?;
            s.ok_or_else(|| unexpected("sample", &Frame::Null))
        })
        .collect()
}

fn key<K, V>(codec: &dyn RedisCodec<K, V>, frame: &Frame) -> Result<K> {
    match scalar(frame) {
        Some(bytes) => codec.decode_key(&bytes),
        None => Err(unexpected("key", frame)),
    }
}

/// `[[name, value], ...]`. Labels with a null value are left out.
fn labels<K, V>(codec: &dyn RedisCodec<K, V>, frame: Frame) -> Result<Vec<(K, V)>> {
    let mut out = Vec::new();
    for pair in array(frame, "label list")? {
        let [name, value] = fixed::<2>(pair, "label")?;
        let name = key(codec, &name)?;
        if value.is_null() {
            continue;
        }
        let value = match scalar(&value) {
            Some(bytes) => codec.decode_value(&bytes)?,
            None => return Err(unexpected("label value", &value)),
        };
        out.push((name, value));
    }
    Ok(out)
}

/// TS.MRANGE / TS.MREVRANGE: `[[key, labels, samples], ...]`.
pub fn range_results<K, V>(
    codec: &dyn RedisCodec<K, V>,
    frame: Frame,
) -> Result<Vec<RangeResult<K, V>>> {
    array(frame, "series list")?
        .into_iter()
        .map(|series| {
            let [k, l, s] = fixed::<3>(series, "series")?;
            Ok(RangeResult {
                key: key(codec, &k)?,
                labels: labels(codec, l)?,
                samples: samples(s)?,
            })
        })
        .collect()
}

/// TS.MGET: `[[key, labels, [ts, value] | []], ...]`.
pub fn get_results<K, V>(
    codec: &dyn RedisCodec<K, V>,
    frame: Frame,
) -> Result<Vec<GetResult<K, V>>> {
    array(frame, "series list")?
        .into_iter()
        .map(|series| {
            let [k, l, s] = fixed::<3>(series, "series")?;
            Ok(GetResult {
                key: key(codec, &k)?,
                labels: labels(codec, l)?,
                sample: parse_sample(s)?,
            })
        })
        .collect()
}

/// TS.ADD, TS.INCRBY, TS.DECRBY: the sample timestamp.
pub fn timestamp(frame: Frame) -> Result<u64> {
    unsigned(&check(frame)?, "timestamp")
}

/// TS.MADD: one timestamp or error per sample, in request order.
pub fn timestamps(frame: Frame) -> Result<Vec<Result<u64>>> {
    Ok(array(frame, "timestamp list")?
        .into_iter()
        .map(|item| match item {
            Frame::Error(msg) => Err(Error::Server(msg)),
            other => unsigned(&other, "timestamp"),
        })
        .collect())
}

/// TS.INFO: field/value pairs in reply order.
pub fn info(frame: Frame) -> Result<Vec<(String, Frame)>> {
    let items = array(frame, "info")?;
    if items.len() % 2 != 0 {
        return Err(ReplyError::UnexpectedLength {
            context: "info",
            expected: items.len() + 1,
            actual: items.len(),
        }
        .into());
    }
    let mut fields = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(name), Some(value)) = (iter.next(), iter.next()) {
        let name = match name.as_str() {
            Some(s) => s.to_string(),
            None => return Err(unexpected("field name", &name)),
        };
        fields.push((name, value));
    }
    Ok(fields)
}

/// TS.QUERYINDEX: matching keys.
pub fn keys<K, V>(codec: &dyn RedisCodec<K, V>, frame: Frame) -> Result<Vec<K>> {
    array(frame, "key list")?
        .iter()
        .map(|k| key(codec, k))
        .collect()
}
