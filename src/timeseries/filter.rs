//! Label filter expressions for TS.MRANGE, TS.MGET and TS.QUERYINDEX.

use std::fmt;

/// A typed `FILTER` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelFilter {
    /// `label=value`
    Equals { label: String, value: String },
    /// `label!=value`
    NotEquals { label: String, value: String },
    /// `label!=`: series has the label
    Present(String),
    /// `label=`: series lacks the label
    Absent(String),
    /// `label=(a,b,...)`
    AnyOf { label: String, values: Vec<String> },
    /// `label!=(a,b,...)`
    NoneOf { label: String, values: Vec<String> },
}

impl LabelFilter {
    /// `label=value`: series whose label has this value.
    pub fn equals(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            label: label.into(),
            value: value.into(),
        }
    }

    /// `label!=value`: series whose label is missing or has another value.
    pub fn not_equals(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NotEquals {
            label: label.into(),
            value: value.into(),
        }
    }

    /// `label!=`: series that carry the label.
    pub fn present(label: impl Into<String>) -> Self {
        Self::Present(label.into())
    }

    /// `label=`: series without the label.
    pub fn absent(label: impl Into<String>) -> Self {
        Self::Absent(label.into())
    }

    /// `label=(a,b,...)`: series whose label has one of `values`.
    pub fn any_of<I, S>(label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AnyOf {
            label: label.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `label!=(a,b,...)`: series whose label has none of `values`.
    pub fn none_of<I, S>(label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NoneOf {
            label: label.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true for `label=value` and `label=(..)`.
    ///
    /// The server rejects a filter list without at least one of these.
    pub fn is_matcher(&self) -> bool {
        matches!(self, Self::Equals { .. } | Self::AnyOf { .. })
    }
}

impl fmt::Display for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { label, value } => write!(f, "{label}={value}"),
            Self::NotEquals { label, value } => write!(f, "{label}!={value}"),
            Self::Present(label) => write!(f, "{label}!="),
            Self::Absent(label) => write!(f, "{label}="),
            Self::AnyOf { label, values } => write!(f, "{label}=({})", values.join(",")),
            Self::NoneOf { label, values } => write!(f, "{label}!=({})", values.join(",")),
        }
    }
}

impl From<LabelFilter> for String {
    fn from(filter: LabelFilter) -> Self {
        filter.to_string()
    }
}
