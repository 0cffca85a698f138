//! Range query options for TS.RANGE, TS.MRANGE and TS.MGET.
//!
//! ```text
//! TS.RANGE  key from to [LATEST] [FILTER_BY_TS ts...] [FILTER_BY_VALUE min max]
//!           [COUNT n] [[ALIGN a] AGGREGATION agg bucket [BUCKETTIMESTAMP bt] [EMPTY]]
//! TS.MRANGE from to [LATEST] [FILTER_BY_TS ts...] [FILTER_BY_VALUE min max]
//!           [WITHLABELS | SELECTED_LABELS l...] [COUNT n] [aggregation]
//!           FILTER f... [GROUPBY label REDUCE r]
//! TS.MGET   [LATEST] [WITHLABELS | SELECTED_LABELS l...] FILTER f...
//! ```

use super::aggregation::{Aggregation, Aggregator};
use super::filter::LabelFilter;
use crate::commands::{CommandArgument, Flag, Sections};
use crate::error::{Result, UsageError};
use crate::protocol::{CommandArgs, Keyword};

/// Maximum number of timestamps accepted by `FILTER_BY_TS`.
pub const MAX_TS_VALUES_FILTER: usize = 128;

/// One end of a time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    /// Earliest sample (`-`)
    Min,
    /// Latest sample (`+`)
    Max,
    /// Explicit milliseconds
    At(u64),
}

impl RangeBound {
    fn build<K, V>(self, args: &mut CommandArgs<'_, K, V>) {
        match self {
            Self::Min => args.add_str("-"),
            Self::Max => args.add_str("+"),
            Self::At(ts) => args.add_uint(ts),
        };
    }
}

impl From<u64> for RangeBound {
    fn from(ts: u64) -> Self {
        Self::At(ts)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections shared by the range commands
// ─────────────────────────────────────────────────────────────────────────────

/// `from to`
struct Bounds(RangeBound, RangeBound);

impl<K, V> CommandArgument<K, V> for Bounds {
    fn arity(&self) -> usize {
        2
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        self.0.build(args);
        self.1.build(args);
    }
}

/// `[LATEST] [FILTER_BY_TS ts...] [FILTER_BY_VALUE min max]`
struct SampleFilters<'a>(&'a RangeOptions);

impl<K, V> CommandArgument<K, V> for SampleFilters<'_> {
    fn arity(&self) -> usize {
        let o = self.0;
        let mut n = usize::from(o.latest);
        if !o.filter_by_ts.is_empty() {
            n += 1 + o.filter_by_ts.len();
        }
        if o.filter_by_value.is_some() {
            n += 3;
        }
        n
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        let o = self.0;
        if o.latest {
            args.add_keyword(Keyword::Latest);
        }
        if !o.filter_by_ts.is_empty() {
            args.add_keyword(Keyword::FilterByTs);
            for &ts in &o.filter_by_ts {
                args.add_uint(ts);
            }
        }
        if let Some((min, max)) = o.filter_by_value {
            args.add_keyword(Keyword::FilterByValue)
                .add_double(min)
                .add_double(max);
        }
    }
}

/// `[COUNT n] [aggregation]`
struct Reduction<'a>(&'a RangeOptions);

impl<K, V> CommandArgument<K, V> for Reduction<'_> {
    fn arity(&self) -> usize {
        let o = self.0;
        (if o.count.is_some() { 2 } else { 0 })
            + o.aggregation
                .as_ref()
                .map_or(0, CommandArgument::<K, V>::arity)
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        let o = self.0;
        if let Some(count) = o.count {
            args.add_keyword(Keyword::Count).add_uint(count);
        }
        if let Some(aggregation) = &o.aggregation {
            CommandArgument::<K, V>::build(aggregation, args);
        }
    }
}

/// Which labels multi-series replies carry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LabelSelection<K> {
    /// No labels
    #[default]
    None,
    /// `WITHLABELS`
    All,
    /// `SELECTED_LABELS l...`
    Selected(Vec<K>),
}

impl<K, V> CommandArgument<K, V> for LabelSelection<K> {
    fn arity(&self) -> usize {
        match self {
            Self::None => 0,
            Self::All => 1,
            Self::Selected(labels) => 1 + labels.len(),
        }
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        match self {
            Self::None => {}
            Self::All => {
                args.add_keyword(Keyword::WithLabels);
            }
            Self::Selected(labels) => {
                args.add_keyword(Keyword::SelectedLabels);
                for label in labels {
                    args.add_key(label);
                }
            }
        }
    }
}

fn selected_labels<K, I>(labels: I) -> Result<LabelSelection<K>>
where
    I: IntoIterator<Item = K>,
{
    let labels: Vec<K> = labels.into_iter().collect();
    if labels.is_empty() {
        return Err(
            UsageError::argument("SELECTED_LABELS", "labels", "at least one label is required")
                .into(),
        );
    }
    Ok(LabelSelection::Selected(labels))
}

/// `FILTER f...`
struct Filters<'a, V>(&'a [V]);

impl<K, V> CommandArgument<K, V> for Filters<'_, V> {
    fn arity(&self) -> usize {
        1 + self.0.len()
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        args.add_keyword(Keyword::Filter);
        for filter in self.0 {
            args.add_value(filter);
        }
    }
}

/// Filter expressions collected by a builder.
///
/// Raw expressions cannot be inspected, so any raw filter counts as a
/// matcher; typed filters count only when [`LabelFilter::is_matcher`] holds.
#[derive(Debug, Clone)]
struct FilterList<V> {
    filters: Vec<V>,
    has_matcher: bool,
}

impl<V> FilterList<V> {
    fn new() -> Self {
        Self {
            filters: Vec::new(),
            has_matcher: false,
        }
    }

    fn push_raw(&mut self, filter: V) {
        self.filters.push(filter);
        self.has_matcher = true;
    }

    fn extend_typed<I>(&mut self, filters: I)
    where
        V: From<String>,
        I: IntoIterator<Item = LabelFilter>,
    {
        for filter in filters {
            self.has_matcher |= filter.is_matcher();
            self.filters.push(V::from(filter.to_string()));
        }
    }

    /// Check the combined list and hand it over.
    fn finish(self, clause: &'static str) -> Result<Vec<V>> {
        if self.filters.is_empty() {
            return Err(
                UsageError::argument(clause, "filters", "at least one filter is required").into(),
            );
        }
        if !self.has_matcher {
            return Err(UsageError::argument(
                clause,
                "filters",
                "at least one label=value or label=(..) filter is required",
            )
            .into());
        }
        Ok(self.filters)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TS.RANGE / TS.REVRANGE
// ─────────────────────────────────────────────────────────────────────────────

/// Options for TS.RANGE and TS.REVRANGE, including the time bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeOptions {
    from: RangeBound,
    to: RangeBound,
    latest: bool,
    filter_by_ts: Vec<u64>,
    filter_by_value: Option<(f64, f64)>,
    count: Option<u64>,
    aggregation: Option<Aggregation>,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            from: RangeBound::Min,
            to: RangeBound::Max,
            latest: false,
            filter_by_ts: Vec::new(),
            filter_by_value: None,
            count: None,
            aggregation: None,
        }
    }
}

impl RangeOptions {
    /// Start a builder covering the whole series.
    pub fn builder() -> RangeOptionsBuilder {
        RangeOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Start of the range.
    pub fn start(&self) -> RangeBound {
        self.from
    }

    /// End of the range.
    pub fn end(&self) -> RangeBound {
        self.to
    }

    /// Bucket aggregation, if any.
    pub fn aggregation(&self) -> Option<&Aggregation> {
        self.aggregation.as_ref()
    }

}

impl<K, V> Sections<K, V> for RangeOptions {
    fn each_section(&self, visit: &mut dyn FnMut(&'static str, &dyn CommandArgument<K, V>)) {
        visit("RANGE", &Bounds(self.from, self.to));
        visit("FILTER_BY", &SampleFilters(self));
        visit("AGGREGATION", &Reduction(self));
    }
}

impl<K, V> CommandArgument<K, V> for RangeOptions {
    fn arity(&self) -> usize {
        Sections::<K, V>::sections_arity(self)
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        self.emit_sections(args);
    }
}

/// Builder for [`RangeOptions`].
#[derive(Debug, Clone)]
pub struct RangeOptionsBuilder {
    options: RangeOptions,
}

impl RangeOptionsBuilder {
    /// Start of the range.
    pub fn from(mut self, from: impl Into<RangeBound>) -> Self {
        self.options.from = from.into();
        self
    }

    /// End of the range.
    pub fn to(mut self, to: impl Into<RangeBound>) -> Self {
        self.options.to = to.into();
        self
    }

    /// Include the latest, possibly partial, compacted bucket.
    pub fn latest(mut self, latest: bool) -> Self {
        self.options.latest = latest;
        self
    }

    /// Keep only samples at these timestamps.
    pub fn filter_by_ts<I>(mut self, timestamps: I) -> Result<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let timestamps: Vec<u64> = timestamps.into_iter().collect();
        if timestamps.len() > MAX_TS_VALUES_FILTER {
            return Err(UsageError::argument(
                "FILTER_BY_TS",
                "timestamps",
                format!(
                    "{} timestamps given, at most {MAX_TS_VALUES_FILTER} allowed",
                    timestamps.len()
                ),
            )
            .into());
        }
        self.options.filter_by_ts = timestamps;
        Ok(self)
    }

    /// Keep only samples with `min <= value <= max`.
    pub fn filter_by_value(mut self, min: f64, max: f64) -> Result<Self> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(UsageError::argument(
                "FILTER_BY_VALUE",
                "min",
                format!("{min} is not <= {max}"),
            )
            .into());
        }
        self.options.filter_by_value = Some((min, max));
        Ok(self)
    }

    /// Return at most `count` samples (or buckets).
    pub fn count(mut self, count: u64) -> Self {
        self.options.count = Some(count);
        self
    }

    /// Aggregate samples into buckets.
    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.options.aggregation = Some(aggregation);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<RangeOptions> {
        match (self.options.from, self.options.to) {
            (RangeBound::At(from), RangeBound::At(to)) if from > to => Err(UsageError::argument(
                "RANGE",
                "from",
                format!("start {from} is after end {to}"),
            )
            .into()),
            _ => Ok(self.options),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TS.MRANGE / TS.MREVRANGE
// ─────────────────────────────────────────────────────────────────────────────

/// `GROUPBY label REDUCE reducer`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupBy<K> {
    label: K,
    reducer: Aggregator,
}

impl<K> GroupBy<K> {
    /// Group series sharing `label` and combine them with `reducer`.
    pub fn new(label: K, reducer: Aggregator) -> Result<Self> {
        if !reducer.is_group_reducer() {
            return Err(UsageError::argument(
                "GROUPBY",
                "reducer",
                format!("{reducer} cannot reduce groups"),
            )
            .into());
        }
        Ok(Self { label, reducer })
    }
}

impl<K, V> CommandArgument<K, V> for GroupBy<K> {
    fn arity(&self) -> usize {
        4
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        args.add_keyword(Keyword::GroupBy)
            .add_key(&self.label)
            .add_keyword(Keyword::Reduce)
            .add_str(self.reducer.as_str());
    }
}

/// Options for TS.MRANGE and TS.MREVRANGE.
#[derive(Debug, Clone, PartialEq)]
pub struct MRangeOptions<K, V> {
    range: RangeOptions,
    labels: LabelSelection<K>,
    filters: Vec<V>,
    group_by: Option<GroupBy<K>>,
}

impl<K, V> MRangeOptions<K, V> {
    /// Start a builder over the whole time range.
    pub fn builder() -> MRangeOptionsBuilder<K, V> {
        MRangeOptionsBuilder {
            range: RangeOptions::default(),
            labels: LabelSelection::None,
            filters: FilterList::new(),
            group_by: None,
        }
    }

    /// Time bounds and per-series options.
    pub fn range(&self) -> &RangeOptions {
        &self.range
    }

    /// Requested labels.
    pub fn labels(&self) -> &LabelSelection<K> {
        &self.labels
    }

}

impl<K, V> Sections<K, V> for MRangeOptions<K, V> {
    fn each_section(&self, visit: &mut dyn FnMut(&'static str, &dyn CommandArgument<K, V>)) {
        visit("RANGE", &Bounds(self.range.from, self.range.to));
        visit("FILTER_BY", &SampleFilters(&self.range));
        visit("WITHLABELS", &self.labels);
        visit("AGGREGATION", &Reduction(&self.range));
        visit("FILTER", &Filters(&self.filters));
        visit("GROUPBY", &self.group_by);
    }
}

impl<K, V> CommandArgument<K, V> for MRangeOptions<K, V> {
    fn arity(&self) -> usize {
        self.sections_arity()
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        self.emit_sections(args);
    }
}

/// Builder for [`MRangeOptions`].
#[derive(Debug, Clone)]
pub struct MRangeOptionsBuilder<K, V> {
    range: RangeOptions,
    labels: LabelSelection<K>,
    filters: FilterList<V>,
    group_by: Option<GroupBy<K>>,
}

impl<K, V> MRangeOptionsBuilder<K, V> {
    /// Time bounds and per-series options.
    pub fn range(mut self, range: RangeOptions) -> Self {
        self.range = range;
        self
    }

    /// Return every label of each series.
    pub fn with_labels(mut self) -> Self {
        self.labels = LabelSelection::All;
        self
    }

    /// Return only these labels.
    pub fn selected_labels<I>(mut self, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
    {
        self.labels = selected_labels(labels)?;
        Ok(self)
    }

    /// Append a raw filter expression.
    pub fn filter(mut self, filter: V) -> Self {
        self.filters.push_raw(filter);
        self
    }

    /// Append typed filters. Across all filters added, at least one must be
    /// a matcher by the time the options are built.
    pub fn label_filters<I>(mut self, filters: I) -> Self
    where
        V: From<String>,
        I: IntoIterator<Item = LabelFilter>,
    {
        self.filters.extend_typed(filters);
        self
    }

    /// Group and reduce matching series.
    pub fn group_by(mut self, group_by: GroupBy<K>) -> Self {
        self.group_by = Some(group_by);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<MRangeOptions<K, V>> {
        Ok(MRangeOptions {
            filters: self.filters.finish("MRANGE")?,
            range: self.range,
            labels: self.labels,
            group_by: self.group_by,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TS.MGET
// ─────────────────────────────────────────────────────────────────────────────

/// Options for TS.MGET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MGetOptions<K, V> {
    latest: bool,
    labels: LabelSelection<K>,
    filters: Vec<V>,
}

impl<K, V> MGetOptions<K, V> {
    /// Start an empty builder.
    pub fn builder() -> MGetOptionsBuilder<K, V> {
        MGetOptionsBuilder {
            latest: false,
            labels: LabelSelection::None,
            filters: FilterList::new(),
        }
    }

    /// Requested labels.
    pub fn labels(&self) -> &LabelSelection<K> {
        &self.labels
    }

}

impl<K, V> Sections<K, V> for MGetOptions<K, V> {
    fn each_section(&self, visit: &mut dyn FnMut(&'static str, &dyn CommandArgument<K, V>)) {
        visit("LATEST", &Flag(Keyword::Latest, self.latest));
        visit("WITHLABELS", &self.labels);
        visit("FILTER", &Filters(&self.filters));
    }
}

impl<K, V> CommandArgument<K, V> for MGetOptions<K, V> {
    fn arity(&self) -> usize {
        self.sections_arity()
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        self.emit_sections(args);
    }
}

/// Builder for [`MGetOptions`].
#[derive(Debug, Clone)]
pub struct MGetOptionsBuilder<K, V> {
    latest: bool,
    labels: LabelSelection<K>,
    filters: FilterList<V>,
}

impl<K, V> MGetOptionsBuilder<K, V> {
    /// Report the latest, possibly partial, compacted bucket.
    pub fn latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    /// Return every label of each series.
    pub fn with_labels(mut self) -> Self {
        self.labels = LabelSelection::All;
        self
    }

    /// Return only these labels.
    pub fn selected_labels<I>(mut self, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
    {
        self.labels = selected_labels(labels)?;
        Ok(self)
    }

    /// Append a raw filter expression.
    pub fn filter(mut self, filter: V) -> Self {
        self.filters.push_raw(filter);
        self
    }

    /// Append typed filters. Across all filters added, at least one must be
    /// a matcher by the time the options are built.
    pub fn label_filters<I>(mut self, filters: I) -> Self
    where
        V: From<String>,
        I: IntoIterator<Item = LabelFilter>,
    {
        self.filters.extend_typed(filters);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<MGetOptions<K, V>> {
        Ok(MGetOptions {
            filters: self.filters.finish("MGET")?,
            latest: self.latest,
            labels: self.labels,
        })
    }
}
