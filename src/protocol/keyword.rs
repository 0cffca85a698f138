//! Wire vocabulary for the search and time-series modules.
//!
//! Spellings must match the server grammar verbatim.

use std::fmt;

/// Keywords that introduce or qualify a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Search
    Verbatim,
    Load,
    Params,
    Timeout,
    As,
    GroupBy,
    Reduce,
    SortBy,
    Asc,
    Desc,
    Max,
    Apply,
    Filter,
    Limit,
    WithCursor,
    Count,
    MaxIdle,
    Read,
    Del,
    By,

    // Time series
    Retention,
    Encoding,
    Compressed,
    Uncompressed,
    ChunkSize,
    DuplicatePolicy,
    OnDuplicate,
    Labels,
    Timestamp,
    Aggregation,
    Align,
    BucketTimestamp,
    Empty,
    Latest,
    FilterByTs,
    FilterByValue,
    WithLabels,
    SelectedLabels,
    Debug,
}

impl Keyword {
    /// Wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verbatim => "VERBATIM",
            Self::Load => "LOAD",
            Self::Params => "PARAMS",
            Self::Timeout => "TIMEOUT",
            Self::As => "AS",
            Self::GroupBy => "GROUPBY",
            Self::Reduce => "REDUCE",
            Self::SortBy => "SORTBY",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::Max => "MAX",
            Self::Apply => "APPLY",
            Self::Filter => "FILTER",
            Self::Limit => "LIMIT",
            Self::WithCursor => "WITHCURSOR",
            Self::Count => "COUNT",
            Self::MaxIdle => "MAXIDLE",
            Self::Read => "READ",
            Self::Del => "DEL",
            Self::By => "BY",
            Self::Retention => "RETENTION",
            Self::Encoding => "ENCODING",
            Self::Compressed => "COMPRESSED",
            Self::Uncompressed => "UNCOMPRESSED",
            Self::ChunkSize => "CHUNK_SIZE",
            Self::DuplicatePolicy => "DUPLICATE_POLICY",
            Self::OnDuplicate => "ON_DUPLICATE",
            Self::Labels => "LABELS",
            Self::Timestamp => "TIMESTAMP",
            Self::Aggregation => "AGGREGATION",
            Self::Align => "ALIGN",
            Self::BucketTimestamp => "BUCKETTIMESTAMP",
            Self::Empty => "EMPTY",
            Self::Latest => "LATEST",
            Self::FilterByTs => "FILTER_BY_TS",
            Self::FilterByValue => "FILTER_BY_VALUE",
            Self::WithLabels => "WITHLABELS",
            Self::SelectedLabels => "SELECTED_LABELS",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Module commands this crate assembles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    FtAggregate,
    FtCursor,
    TsCreate,
    TsAlter,
    TsAdd,
    TsMadd,
    TsIncrBy,
    TsDecrBy,
    TsCreateRule,
    TsDeleteRule,
    TsRange,
    TsRevRange,
    TsMrange,
    TsMrevRange,
    TsGet,
    TsMget,
    TsInfo,
    TsDel,
    TsQueryIndex,
}

impl CommandType {
    /// Command name as sent on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FtAggregate => "FT.AGGREGATE",
            Self::FtCursor => "FT.CURSOR",
            Self::TsCreate => "TS.CREATE",
            Self::TsAlter => "TS.ALTER",
            Self::TsAdd => "TS.ADD",
            Self::TsMadd => "TS.MADD",
            Self::TsIncrBy => "TS.INCRBY",
            Self::TsDecrBy => "TS.DECRBY",
            Self::TsCreateRule => "TS.CREATERULE",
            Self::TsDeleteRule => "TS.DELETERULE",
            Self::TsRange => "TS.RANGE",
            Self::TsRevRange => "TS.REVRANGE",
            Self::TsMrange => "TS.MRANGE",
            Self::TsMrevRange => "TS.MREVRANGE",
            Self::TsGet => "TS.GET",
            Self::TsMget => "TS.MGET",
            Self::TsInfo => "TS.INFO",
            Self::TsDel => "TS.DEL",
            Self::TsQueryIndex => "TS.QUERYINDEX",
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_spelling() {
        assert_eq!(Keyword::FilterByTs.as_str(), "FILTER_BY_TS");
        assert_eq!(Keyword::BucketTimestamp.to_string(), "BUCKETTIMESTAMP");
        assert_eq!(Keyword::WithCursor.as_str(), "WITHCURSOR");
    }

    #[test]
    fn test_command_names() {
        assert_eq!(CommandType::FtAggregate.as_str(), "FT.AGGREGATE");
        assert_eq!(CommandType::TsMrevRange.to_string(), "TS.MREVRANGE");
    }
}
