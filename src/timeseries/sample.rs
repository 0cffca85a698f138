//! Samples and the typed records replies are shaped into.

use crate::commands::CommandArgument;
use crate::protocol::CommandArgs;

/// A sample in the time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Timestamp in milliseconds
    pub timestamp: u64,
    /// Value
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: u64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Timestamp argument of TS.ADD and TS.MADD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timestamp {
    /// Server clock (`*`)
    #[default]
    Auto,
    /// Explicit milliseconds
    At(u64),
}

impl From<u64> for Timestamp {
    fn from(ts: u64) -> Self {
        Self::At(ts)
    }
}

impl<K, V> CommandArgument<K, V> for Timestamp {
    fn arity(&self) -> usize {
        1
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        match *self {
            Self::Auto => args.add_str("*"),
            Self::At(ts) => args.add_uint(ts),
        };
    }
}

/// One `key timestamp value` triple of TS.MADD.
#[derive(Debug, Clone, PartialEq)]
pub struct KeySample<K> {
    pub key: K,
    pub timestamp: Timestamp,
    pub value: f64,
}

impl<K> KeySample<K> {
    pub fn new(key: K, timestamp: impl Into<Timestamp>, value: f64) -> Self {
        Self {
            key,
            timestamp: timestamp.into(),
            value,
        }
    }
}

impl<K, V> CommandArgument<K, V> for KeySample<K> {
    fn arity(&self) -> usize {
        3
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        args.add_key(&self.key);
        CommandArgument::<K, V>::build(&self.timestamp, args);
        args.add_double(self.value);
    }
}

/// One series of a TS.MRANGE / TS.MREVRANGE reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeResult<K, V> {
    pub key: K,
    /// Requested labels in reply order. Labels the series lacks are omitted.
    pub labels: Vec<(K, V)>,
    pub samples: Vec<Sample>,
}

/// One series of a TS.MGET reply.
#[derive(Debug, Clone, PartialEq)]
pub struct GetResult<K, V> {
    pub key: K,
    pub labels: Vec<(K, V)>,
    /// `None` when the series has no samples yet.
    pub sample: Option<Sample>,
}
