//! Aggregation pipeline steps.
//!
//! Steps are emitted in the order they were added; the server applies them
//! in that order, so a `FILTER` before a `GROUPBY` filters rows while one
//! after it filters groups.

use crate::commands::CommandArgument;
use crate::error::{Result, UsageError};
use crate::protocol::{CommandArgs, Keyword};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl Order {
    const fn keyword(self) -> Keyword {
        match self {
            Self::Asc => Keyword::Asc,
            Self::Desc => Keyword::Desc,
        }
    }
}

/// Reject names that would reach the wire as `@` or an empty string.
fn check_name(clause: &'static str, field: &'static str, name: &str) -> Result<()> {
    if name.is_empty() || name == "@" {
        return Err(UsageError::argument(clause, field, "must not be empty").into());
    }
    Ok(())
}

/// Reducer functions available inside `GROUPBY`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReduceFunction {
    /// Rows per group
    Count,
    /// Distinct values of a property
    CountDistinct(String),
    /// Approximate distinct values of a property
    CountDistinctish(String),
    /// Sum of a property
    Sum(String),
    /// Minimum of a property
    Min(String),
    /// Maximum of a property
    Max(String),
    /// Mean of a property
    Avg(String),
    /// Standard deviation of a property
    StdDev(String),
    /// Quantile of a property, in `[0, 1]`
    Quantile {
        /// Property reduced
        property: String,
        /// Requested quantile
        quantile: f64,
    },
    /// All distinct values of a property
    ToList(String),
    /// First value of a property, optionally ordered by another
    FirstValue {
        /// Property returned
        property: String,
        /// Ordering property and direction
        by: Option<(String, Order)>,
    },
    /// Random sample of a property
    RandomSample {
        /// Property sampled
        property: String,
        /// Sample size
        size: u64,
    },
}

impl ReduceFunction {
    /// Function name as sent on the wire.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::CountDistinct(_) => "COUNT_DISTINCT",
            Self::CountDistinctish(_) => "COUNT_DISTINCTISH",
            Self::Sum(_) => "SUM",
            Self::Min(_) => "MIN",
            Self::Max(_) => "MAX",
            Self::Avg(_) => "AVG",
            Self::StdDev(_) => "STDDEV",
            Self::Quantile { .. } => "QUANTILE",
            Self::ToList(_) => "TOLIST",
            Self::FirstValue { .. } => "FIRST_VALUE",
            Self::RandomSample { .. } => "RANDOM_SAMPLE",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Count => Ok(()),
            Self::CountDistinct(p)
            | Self::CountDistinctish(p)
            | Self::Sum(p)
            | Self::Min(p)
            | Self::Max(p)
            | Self::Avg(p)
            | Self::StdDev(p)
            | Self::ToList(p)
            | Self::RandomSample { property: p, .. } => check_name("REDUCE", "property", p),
            Self::Quantile { property, quantile } => {
                check_name("REDUCE", "property", property)?;
                if !(0.0..=1.0).contains(quantile) {
                    return Err(UsageError::argument(
                        "REDUCE",
                        "quantile",
                        format!("{quantile} is outside [0, 1]"),
                    )
                    .into());
                }
                Ok(())
            }
            Self::FirstValue { property, by } => {
                check_name("REDUCE", "property", property)?;
                match by {
                    Some((by, _)) => check_name("REDUCE", "by", by),
                    None => Ok(()),
                }
            }
        }
    }

    fn nargs(&self) -> usize {
        match self {
            Self::Count => 0,
            Self::Quantile { .. } | Self::RandomSample { .. } => 2,
            Self::FirstValue { by: Some(_), .. } => 4,
            _ => 1,
        }
    }

    fn build_args<K, V>(&self, args: &mut CommandArgs<'_, K, V>) {
        match self {
            Self::Count => {}
            Self::CountDistinct(p)
            | Self::CountDistinctish(p)
            | Self::Sum(p)
            | Self::Min(p)
            | Self::Max(p)
            | Self::Avg(p)
            | Self::StdDev(p)
            | Self::ToList(p) => {
                args.add_property(p);
            }
            Self::Quantile { property, quantile } => {
                args.add_property(property).add_double(*quantile);
            }
            Self::FirstValue { property, by } => {
                args.add_property(property);
                if let Some((by, order)) = by {
                    args.add_keyword(Keyword::By)
                        .add_property(by)
                        .add_keyword(order.keyword());
                }
            }
            Self::RandomSample { property, size } => {
                args.add_property(property).add_uint(*size);
            }
        }
    }
}

/// A `REDUCE` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Reducer {
    function: ReduceFunction,
    alias: Option<String>,
}

impl Reducer {
    /// Wrap a reduce function, rejecting empty property names.
    pub fn new(function: ReduceFunction) -> Result<Self> {
        function.validate()?;
        Ok(Self {
            function,
            alias: None,
        })
    }

    /// `COUNT`
    pub fn count() -> Self {
        Self {
            function: ReduceFunction::Count,
            alias: None,
        }
    }

    /// `COUNT_DISTINCT property`
    pub fn count_distinct(property: impl Into<String>) -> Result<Self> {
        Self::new(ReduceFunction::CountDistinct(property.into()))
    }

    /// `SUM property`
    pub fn sum(property: impl Into<String>) -> Result<Self> {
        Self::new(ReduceFunction::Sum(property.into()))
    }

    /// `MIN property`
    pub fn min(property: impl Into<String>) -> Result<Self> {
        Self::new(ReduceFunction::Min(property.into()))
    }

    /// `MAX property`
    pub fn max(property: impl Into<String>) -> Result<Self> {
        Self::new(ReduceFunction::Max(property.into()))
    }

    /// `AVG property`
    pub fn avg(property: impl Into<String>) -> Result<Self> {
        Self::new(ReduceFunction::Avg(property.into()))
    }

    /// `TOLIST property`
    pub fn to_list(property: impl Into<String>) -> Result<Self> {
        Self::new(ReduceFunction::ToList(property.into()))
    }

    /// `QUANTILE property q`, rejecting `q` outside `[0, 1]`.
    pub fn quantile(property: impl Into<String>, quantile: f64) -> Result<Self> {
        Self::new(ReduceFunction::Quantile {
            property: property.into(),
            quantile,
        })
    }

    /// Name the reduced value is returned under.
    pub fn alias(mut self, alias: impl Into<String>) -> Result<Self> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(UsageError::argument("REDUCE", "alias", "must not be empty").into());
        }
        self.alias = Some(alias);
        Ok(self)
    }

    /// Reduce function.
    pub fn function(&self) -> &ReduceFunction {
        &self.function
    }

    fn token_count(&self) -> usize {
        3 + self.function.nargs() + if self.alias.is_some() { 2 } else { 0 }
    }
}

impl<K, V> CommandArgument<K, V> for Reducer {
    fn arity(&self) -> usize {
        self.token_count()
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        args.add_keyword(Keyword::Reduce)
            .add_str(self.function.name())
            .add_count(self.function.nargs());
        self.function.build_args(args);
        if let Some(alias) = &self.alias {
            args.add_keyword(Keyword::As).add_str(alias.as_str());
        }
    }
}

/// `GROUPBY n @p... REDUCE ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    properties: Vec<String>,
    reducers: Vec<Reducer>,
}

impl Group {
    /// Group rows by `properties`. An empty list groups every row together,
    /// but every listed name must be non-empty.
    pub fn by<I, S>(properties: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let properties: Vec<String> = properties.into_iter().map(Into::into).collect();
        for property in &properties {
            check_name("GROUPBY", "property", property)?;
        }
        Ok(Self {
            properties,
            reducers: Vec::new(),
        })
    }

    /// Append a reducer.
    pub fn reduce(mut self, reducer: Reducer) -> Self {
        self.reducers.push(reducer);
        self
    }

    /// Grouping properties.
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Reducers in order.
    pub fn reducers(&self) -> &[Reducer] {
        &self.reducers
    }

    fn token_count(&self) -> usize {
        2 + self.properties.len() + self.reducers.iter().map(Reducer::token_count).sum::<usize>()
    }

    fn build_into<K, V>(&self, args: &mut CommandArgs<'_, K, V>) {
        args.add_keyword(Keyword::GroupBy)
            .add_count(self.properties.len());
        for property in &self.properties {
            args.add_property(property);
        }
        for reducer in &self.reducers {
            reducer.build(args);
        }
    }
}

/// `SORTBY n @p ASC|DESC ... [MAX m]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortBy {
    properties: Vec<(String, Order)>,
    max: Option<u64>,
}

impl SortBy {
    /// Sort by `property` in `order`.
    pub fn by(property: impl Into<String>, order: Order) -> Result<Self> {
        let property = property.into();
        check_name("SORTBY", "property", &property)?;
        Ok(Self {
            properties: vec![(property, order)],
            max: None,
        })
    }

    /// Sort by `property` in ascending order.
    pub fn asc(property: impl Into<String>) -> Result<Self> {
        Self::by(property, Order::Asc)
    }

    /// Sort by `property` in descending order.
    pub fn desc(property: impl Into<String>) -> Result<Self> {
        Self::by(property, Order::Desc)
    }

    /// Add a tie-breaking property.
    pub fn then(mut self, property: impl Into<String>, order: Order) -> Result<Self> {
        let property = property.into();
        check_name("SORTBY", "property", &property)?;
        self.properties.push((property, order));
        Ok(self)
    }

    /// Keep only the first `max` rows.
    pub fn max(mut self, max: u64) -> Self {
        self.max = Some(max);
        self
    }

    fn token_count(&self) -> usize {
        2 + 2 * self.properties.len() + if self.max.is_some() { 2 } else { 0 }
    }

    fn build_into<K, V>(&self, args: &mut CommandArgs<'_, K, V>) {
        args.add_keyword(Keyword::SortBy)
            .add_count(2 * self.properties.len());
        for (property, order) in &self.properties {
            args.add_property(property).add_keyword(order.keyword());
        }
        if let Some(max) = self.max {
            args.add_keyword(Keyword::Max).add_uint(max);
        }
    }
}

/// `APPLY expr AS name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apply {
    expression: String,
    alias: String,
}

impl Apply {
    /// Compute `expression` into a new property `alias`.
    pub fn new(expression: impl Into<String>, alias: impl Into<String>) -> Result<Self> {
        let expression = expression.into();
        let alias = alias.into();
        if expression.is_empty() {
            return Err(UsageError::argument("APPLY", "expression", "must not be empty").into());
        }
        if alias.is_empty() {
            return Err(UsageError::argument("APPLY", "alias", "must not be empty").into());
        }
        Ok(Self { expression, alias })
    }
}

/// `FILTER expr`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    expression: String,
}

impl Filter {
    /// Keep rows for which `expression` holds.
    pub fn new(expression: impl Into<String>) -> Result<Self> {
        let expression = expression.into();
        if expression.is_empty() {
            return Err(UsageError::argument("FILTER", "expression", "must not be empty").into());
        }
        Ok(Self { expression })
    }
}

/// `LIMIT offset num`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    offset: u64,
    num: u64,
}

impl Limit {
    /// Skip `offset` rows and return at most `num`.
    pub fn new(offset: u64, num: u64) -> Self {
        Self { offset, num }
    }
}

/// One step of the aggregation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateOperation {
    Group(Group),
    SortBy(SortBy),
    Apply(Apply),
    Filter(Filter),
    Limit(Limit),
}

impl AggregateOperation {
    /// Clause keyword, for diagnostics.
    pub const fn clause(&self) -> &'static str {
        match self {
            Self::Group(_) => "GROUPBY",
            Self::SortBy(_) => "SORTBY",
            Self::Apply(_) => "APPLY",
            Self::Filter(_) => "FILTER",
            Self::Limit(_) => "LIMIT",
        }
    }

    pub(crate) fn token_count(&self) -> usize {
        match self {
            Self::Group(g) => g.token_count(),
            Self::SortBy(s) => s.token_count(),
            Self::Apply(_) => 4,
            Self::Filter(_) => 2,
            Self::Limit(_) => 3,
        }
    }
}

impl<K, V> CommandArgument<K, V> for AggregateOperation {
    fn arity(&self) -> usize {
        self.token_count()
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        match self {
            Self::Group(g) => g.build_into(args),
            Self::SortBy(s) => s.build_into(args),
            Self::Apply(a) => {
                args.add_keyword(Keyword::Apply)
                    .add_str(a.expression.as_str())
                    .add_keyword(Keyword::As)
                    .add_str(a.alias.as_str());
            }
            Self::Filter(f) => {
                args.add_keyword(Keyword::Filter)
                    .add_str(f.expression.as_str());
            }
            Self::Limit(l) => {
                args.add_keyword(Keyword::Limit)
                    .add_uint(l.offset)
                    .add_uint(l.num);
            }
        }
    }
}

impl From<Group> for AggregateOperation {
    fn from(g: Group) -> Self {
        Self::Group(g)
    }
}

impl From<SortBy> for AggregateOperation {
    fn from(s: SortBy) -> Self {
        Self::SortBy(s)
    }
}

impl From<Apply> for AggregateOperation {
    fn from(a: Apply) -> Self {
        Self::Apply(a)
    }
}

impl From<Filter> for AggregateOperation {
    fn from(f: Filter) -> Self {
        Self::Filter(f)
    }
}

impl From<Limit> for AggregateOperation {
    fn from(l: Limit) -> Self {
        Self::Limit(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use crate::commands::build_checked;
    use crate::protocol::Token;

    fn render(op: impl Into<AggregateOperation>) -> Vec<String> {
        let op = op.into();
        let codec = StringCodec;
        let mut args: CommandArgs<'_, String, String> = CommandArgs::new(&codec);
        build_checked(op.clause(), &op, &mut args).unwrap();
        args.tokens().iter().map(Token::to_string).collect()
    }

    #[test]
    fn test_group_with_reducers() {
        let group = Group::by(["brand"])
            .unwrap()
            .reduce(Reducer::count().alias("n").unwrap())
            .reduce(Reducer::avg("price").unwrap());
        assert_eq!(
            render(group),
            [
                "GROUPBY", "1", "@brand", "REDUCE", "COUNT", "0", "AS", "n", "REDUCE", "AVG", "1",
                "@price"
            ]
        );
    }

    #[test]
    fn test_group_without_properties() {
        let group = Group::by(Vec::<String>::new())
            .unwrap()
            .reduce(Reducer::sum("@qty").unwrap());
        assert_eq!(render(group), ["GROUPBY", "0", "REDUCE", "SUM", "1", "@qty"]);
    }

    #[test]
    fn test_reducer_argument_counts() {
        let quantile = Reducer::quantile("latency", 0.99)
            .unwrap()
            .alias("p99")
            .unwrap();
        assert_eq!(
            render(Group::by(["host"]).unwrap().reduce(quantile)),
            ["GROUPBY", "1", "@host", "REDUCE", "QUANTILE", "2", "@latency", "0.99", "AS", "p99"]
        );

        let first = Reducer::new(ReduceFunction::FirstValue {
            property: "title".into(),
            by: Some(("year".into(), Order::Desc)),
        })
        .unwrap();
        assert_eq!(
            render(Group::by(["genre"]).unwrap().reduce(first)),
            [
                "GROUPBY", "1", "@genre", "REDUCE", "FIRST_VALUE", "4", "@title", "BY", "@year",
                "DESC"
            ]
        );
    }

    #[test]
    fn test_quantile_out_of_range() {
        let err = Reducer::quantile("latency", 1.5).unwrap_err();
        assert!(err.is_usage_error());
        assert!(
            Reducer::new(ReduceFunction::Quantile {
                property: "latency".into(),
                quantile: -0.1,
            })
            .is_err()
        );
    }

    #[test]
    fn test_sortby_counts_property_and_order() {
        let sort = SortBy::desc("count")
            .unwrap()
            .then("brand", Order::Asc)
            .unwrap()
            .max(10);
        assert_eq!(
            render(sort),
            ["SORTBY", "4", "@count", "DESC", "@brand", "ASC", "MAX", "10"]
        );
    }

    #[test]
    fn test_apply_filter_limit() {
        assert_eq!(
            render(Apply::new("@price * 2", "double").unwrap()),
            ["APPLY", "@price * 2", "AS", "double"]
        );
        assert_eq!(render(Filter::new("@n > 1").unwrap()), ["FILTER", "@n > 1"]);
        assert_eq!(render(Limit::new(0, 10)), ["LIMIT", "0", "10"]);
    }

    #[test]
    fn test_empty_expressions_rejected() {
        assert!(Apply::new("", "x").is_err());
        assert!(Apply::new("1", "").is_err());
        assert!(Filter::new("").is_err());
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(Group::by([""]).is_err());
        assert!(Group::by(["brand", "@"]).is_err());
        assert!(Reducer::sum("").is_err());
        assert!(Reducer::count().alias("").is_err());
        assert!(
            Reducer::new(ReduceFunction::FirstValue {
                property: "title".into(),
                by: Some((String::new(), Order::Asc)),
            })
            .is_err()
        );
        assert!(SortBy::asc("").is_err());
        assert!(SortBy::desc("n").unwrap().then("", Order::Desc).is_err());

        let err = Group::by([""]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Usage(UsageError::InvalidArgument {
                clause: "GROUPBY",
                field: "property",
                ..
            })
        ));
    }
}
