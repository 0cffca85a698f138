//! Bucket aggregation for range queries and compaction rules.

use crate::commands::CommandArgument;
use crate::error::{Result, UsageError};
use crate::protocol::{CommandArgs, Keyword};
use std::fmt;
use std::time::Duration;

/// Aggregation function applied per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregator {
    /// Average of values
    Avg,
    /// Sum of values
    Sum,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Range (max - min)
    Range,
    /// Count of samples
    Count,
    /// First value
    First,
    /// Last value
    Last,
    /// Standard deviation (population)
    StdP,
    /// Standard deviation (sample)
    StdS,
    /// Variance (population)
    VarP,
    /// Variance (sample)
    VarS,
    /// Time-weighted average
    Twa,
}

impl Aggregator {
    /// Wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avg => "AVG",
            Self::Sum => "SUM",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Range => "RANGE",
            Self::Count => "COUNT",
            Self::First => "FIRST",
            Self::Last => "LAST",
            Self::StdP => "STD.P",
            Self::StdS => "STD.S",
            Self::VarP => "VAR.P",
            Self::VarS => "VAR.S",
            Self::Twa => "TWA",
        }
    }

    /// Returns true if the server accepts this function as a GROUPBY reducer.
    pub const fn is_group_reducer(self) -> bool {
        !matches!(self, Self::First | Self::Last | Self::Twa)
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket alignment reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Query start (`-`)
    Start,
    /// Query end (`+`)
    End,
    /// Explicit timestamp
    At(u64),
}

impl Align {
    fn build<K, V>(self, args: &mut CommandArgs<'_, K, V>) {
        match self {
            Self::Start => args.add_str("-"),
            Self::End => args.add_str("+"),
            Self::At(ts) => args.add_uint(ts),
        };
    }
}

/// Timestamp reported for each bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketTimestamp {
    /// Bucket start (`-`)
    Start,
    /// Bucket end (`+`)
    End,
    /// Bucket middle (`~`)
    Mid,
}

impl BucketTimestamp {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "-",
            Self::End => "+",
            Self::Mid => "~",
        }
    }
}

pub(crate) fn bucket_millis(clause: &'static str, bucket: Duration) -> Result<u64> {
    let ms = u64::try_from(bucket.as_millis()).unwrap_or(u64::MAX);
    if ms == 0 {
        return Err(UsageError::argument(clause, "bucket_duration", "must be at least 1ms").into());
    }
    Ok(ms)
}

/// `[ALIGN a] AGGREGATION agg bucket [BUCKETTIMESTAMP bt] [EMPTY]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregation {
    aggregator: Aggregator,
    bucket_ms: u64,
    align: Option<Align>,
    bucket_timestamp: Option<BucketTimestamp>,
    empty: bool,
}

impl Aggregation {
    /// Start building an aggregation over buckets of `bucket`.
    pub fn builder(aggregator: Aggregator, bucket: Duration) -> AggregationBuilder {
        AggregationBuilder {
            aggregator,
            bucket,
            align: None,
            bucket_timestamp: None,
            empty: false,
        }
    }

    /// Aggregation with default alignment and reporting.
    pub fn new(aggregator: Aggregator, bucket: Duration) -> Result<Self> {
        Self::builder(aggregator, bucket).build()
    }

    /// Aggregation function.
    pub fn aggregator(&self) -> Aggregator {
        self.aggregator
    }

    /// Bucket width in milliseconds.
    pub fn bucket_millis(&self) -> u64 {
        self.bucket_ms
    }
}

impl<K, V> CommandArgument<K, V> for Aggregation {
    fn arity(&self) -> usize {
        3 + if self.align.is_some() { 2 } else { 0 }
            + if self.bucket_timestamp.is_some() { 2 } else { 0 }
            + usize::from(self.empty)
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        if let Some(align) = self.align {
            args.add_keyword(Keyword::Align);
            align.build(args);
        }
        args.add_keyword(Keyword::Aggregation)
            .add_str(self.aggregator.as_str())
            .add_uint(self.bucket_ms);
        if let Some(bt) = self.bucket_timestamp {
            args.add_keyword(Keyword::BucketTimestamp).add_str(bt.as_str());
        }
        if self.empty {
            args.add_keyword(Keyword::Empty);
        }
    }
}

/// Builder for [`Aggregation`].
#[derive(Debug, Clone, Copy)]
pub struct AggregationBuilder {
    aggregator: Aggregator,
    bucket: Duration,
    align: Option<Align>,
    bucket_timestamp: Option<BucketTimestamp>,
    empty: bool,
}

impl AggregationBuilder {
    /// Align buckets to `align`.
    pub fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    /// Report buckets by their start, end or middle.
    pub fn bucket_timestamp(mut self, bt: BucketTimestamp) -> Self {
        self.bucket_timestamp = Some(bt);
        self
    }

    /// Report empty buckets too.
    pub fn empty(mut self, empty: bool) -> Self {
        self.empty = empty;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Aggregation> {
        Ok(Aggregation {
            aggregator: self.aggregator,
            bucket_ms: bucket_millis("AGGREGATION", self.bucket)?,
            align: self.align,
            bucket_timestamp: self.bucket_timestamp,
            empty: self.empty,
        })
    }
}

/// Compaction rule body for TS.CREATERULE:
/// `AGGREGATION agg bucket [alignTimestamp]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compaction {
    aggregator: Aggregator,
    bucket_ms: u64,
    align_timestamp: Option<u64>,
}

impl Compaction {
    /// Compact into buckets of `bucket` using `aggregator`.
    pub fn new(aggregator: Aggregator, bucket: Duration) -> Result<Self> {
        Ok(Self {
            aggregator,
            bucket_ms: bucket_millis("AGGREGATION", bucket)?,
            align_timestamp: None,
        })
    }

    /// Align buckets to `timestamp` instead of the epoch.
    pub fn align_timestamp(mut self, timestamp: u64) -> Self {
        self.align_timestamp = Some(timestamp);
        self
    }
}

impl<K, V> CommandArgument<K, V> for Compaction {
    fn arity(&self) -> usize {
        3 + usize::from(self.align_timestamp.is_some())
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        args.add_keyword(Keyword::Aggregation)
            .add_str(self.aggregator.as_str())
            .add_uint(self.bucket_ms);
        if let Some(ts) = self.align_timestamp {
            args.add_uint(ts);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use crate::commands::build_checked;
    use crate::protocol::Token;

    fn render<A: CommandArgument<String, String>>(node: &A) -> Vec<String> {
        let codec = StringCodec;
        let mut args: CommandArgs<'_, String, String> = CommandArgs::new(&codec);
        build_checked("AGGREGATION", node, &mut args).unwrap();
        args.tokens().iter().map(Token::to_string).collect()
    }

    #[test]
    fn test_plain_aggregation() {
        let agg = Aggregation::new(Aggregator::Avg, Duration::from_secs(60)).unwrap();
        assert_eq!(render(&agg), ["AGGREGATION", "AVG", "60000"]);
    }

    #[test]
    fn test_full_aggregation() {
        let agg = Aggregation::builder(Aggregator::StdP, Duration::from_millis(500))
            .align(Align::End)
            .bucket_timestamp(BucketTimestamp::Mid)
            .empty(true)
            .build()
            .unwrap();
        assert_eq!(
            render(&agg),
            ["ALIGN", "+", "AGGREGATION", "STD.P", "500", "BUCKETTIMESTAMP", "~", "EMPTY"]
        );
    }

    #[test]
    fn test_align_to_timestamp() {
        let agg = Aggregation::builder(Aggregator::Max, Duration::from_millis(10))
            .align(Align::At(1_000))
            .build()
            .unwrap();
        assert_eq!(render(&agg), ["ALIGN", "1000", "AGGREGATION", "MAX", "10"]);
    }

    #[test]
    fn test_zero_bucket_rejected() {
        assert!(Aggregation::new(Aggregator::Sum, Duration::ZERO).is_err());
        assert!(Compaction::new(Aggregator::Sum, Duration::from_micros(10)).is_err());
    }

    #[test]
    fn test_compaction() {
        let rule = Compaction::new(Aggregator::Last, Duration::from_secs(3600))
            .unwrap()
            .align_timestamp(0);
        assert_eq!(render(&rule), ["AGGREGATION", "LAST", "3600000", "0"]);
    }

    #[test]
    fn test_group_reducers() {
        assert!(Aggregator::VarS.is_group_reducer());
        assert!(Aggregator::Range.is_group_reducer());
        assert!(!Aggregator::Twa.is_group_reducer());
        assert!(!Aggregator::First.is_group_reducer());
    }
}
