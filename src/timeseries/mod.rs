//! Time-series module options.

mod aggregation;
mod create;
mod filter;
mod range;
mod sample;

pub use aggregation::{Aggregation, AggregationBuilder, Aggregator, Align, BucketTimestamp, Compaction};
pub use create::{
    CreateArgs, CreateMode, CreateOptions, CreateOptionsBuilder, DuplicatePolicy, Encoding, Label,
    MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
};
pub use filter::LabelFilter;
pub use range::{
    GroupBy, LabelSelection, MAX_TS_VALUES_FILTER, MGetOptions, MGetOptionsBuilder, MRangeOptions,
    MRangeOptionsBuilder, RangeBound, RangeOptions, RangeOptionsBuilder,
};
pub use sample::{GetResult, KeySample, RangeResult, Sample, Timestamp};
