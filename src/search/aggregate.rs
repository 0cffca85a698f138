//! FT.AGGREGATE options.
//!
//! Emission order is fixed by the server grammar and independent of the
//! order builder setters were called in:
//!
//! ```text
//! [VERBATIM] [LOAD ...] operation... [PARAMS ...] [TIMEOUT ms]
//! ```

use super::load::{Load, Loads};
use super::operation::AggregateOperation;
use super::param::{Parameter, Params};
use crate::commands::{CommandArgument, Flag, Millis, Sections};
use crate::error::{Result, UsageError};
use crate::protocol::{CommandArgs, Keyword};
use std::time::Duration;

/// Immutable options for FT.AGGREGATE.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions<K, V> {
    verbatim: bool,
    loads: Loads,
    operations: Vec<AggregateOperation>,
    params: Params<K, V>,
    timeout: Option<Duration>,
}

impl<K, V> AggregateOptions<K, V> {
    /// Start an empty builder.
    pub fn builder() -> AggregateOptionsBuilder<K, V> {
        AggregateOptionsBuilder::default()
    }

    /// Options with a single pipeline step.
    pub fn operation(operation: impl Into<AggregateOperation>) -> Self {
        Self::builder().operation(operation).build()
    }

    /// Returns true if stemming is disabled.
    pub fn is_verbatim(&self) -> bool {
        self.verbatim
    }

    /// LOAD block.
    pub fn loads(&self) -> &Loads {
        &self.loads
    }

    /// Pipeline steps in order.
    pub fn operations(&self) -> &[AggregateOperation] {
        &self.operations
    }

    /// Query parameters.
    pub fn params(&self) -> &Params<K, V> {
        &self.params
    }

    /// Query timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl<K, V> Sections<K, V> for AggregateOptions<K, V> {
    fn each_section(&self, visit: &mut dyn FnMut(&'static str, &dyn CommandArgument<K, V>)) {
        visit("VERBATIM", &Flag(Keyword::Verbatim, self.verbatim));
        visit("LOAD", &self.loads);
        for operation in &self.operations {
            visit(operation.clause(), operation);
        }
        visit("PARAMS", &self.params);
        visit("TIMEOUT", &Millis(Keyword::Timeout, self.timeout));
    }
}

impl<K, V> Default for AggregateOptions<K, V> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<K, V> CommandArgument<K, V> for AggregateOptions<K, V> {
    fn arity(&self) -> usize {
        self.sections_arity()
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        self.emit_sections(args);
    }
}

/// Builder for [`AggregateOptions`].
///
/// Setters that can introduce an invalid combination return `Result`, so the
/// error surfaces at the call that caused it.
#[derive(Debug, Clone)]
pub struct AggregateOptionsBuilder<K, V> {
    verbatim: bool,
    load_all: bool,
    loads: Vec<Load>,
    operations: Vec<AggregateOperation>,
    params: Params<K, V>,
    timeout: Option<Duration>,
}

impl<K, V> Default for AggregateOptionsBuilder<K, V> {
    fn default() -> Self {
        Self {
            verbatim: false,
            load_all: false,
            loads: Vec::new(),
            operations: Vec::new(),
            params: Params::new(),
            timeout: None,
        }
    }
}

impl<K, V> AggregateOptionsBuilder<K, V> {
    /// Disable stemming.
    pub fn verbatim(mut self, verbatim: bool) -> Self {
        self.verbatim = verbatim;
        self
    }

    /// Append a pipeline step.
    pub fn operation(mut self, operation: impl Into<AggregateOperation>) -> Self {
        self.operations.push(operation.into());
        self
    }

    /// Append several pipeline steps.
    pub fn operations<I>(mut self, operations: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<AggregateOperation>,
    {
        self.operations.extend(operations.into_iter().map(Into::into));
        self
    }

    /// Load every attribute (`LOAD *`).
    pub fn load_all(mut self) -> Result<Self> {
        if !self.loads.is_empty() {
            return Err(UsageError::configuration(
                "LOAD",
                "load-all cannot be combined with explicit identifiers",
            )
            .into());
        }
        self.load_all = true;
        Ok(self)
    }

    /// Load one attribute by name.
    pub fn load(self, identifier: impl Into<String>) -> Result<Self> {
        let load = Load::of(identifier)?;
        self.load_clause(load)
    }

    /// Load several attributes by name.
    pub fn loads<I, S>(self, identifiers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        identifiers
            .into_iter()
            .try_fold(self, |builder, identifier| builder.load(identifier))
    }

    /// Append a load clause. A bare `*` clause selects load-all.
    pub fn load_clause(mut self, load: Load) -> Result<Self> {
        if load.is_load_all() {
            return self.load_all();
        }
        if self.load_all {
            return Err(UsageError::configuration(
                "LOAD",
                format!(
                    "cannot load '{}' after load-all was selected",
                    load.name()
                ),
            )
            .into());
        }
        self.loads.push(load);
        Ok(self)
    }

    /// Bind a query parameter.
    pub fn param(mut self, name: K, value: V) -> Self {
        self.params.push(Parameter::new(name, value));
        self
    }

    /// Abort the query after `timeout`. Sub-millisecond parts round up.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Snapshot the options.
    pub fn build(self) -> AggregateOptions<K, V> {
        let loads = if self.load_all {
            Loads::All
        } else {
            Loads::Fields(self.loads)
        };
        AggregateOptions {
            verbatim: self.verbatim,
            loads,
            operations: self.operations,
            params: self.params,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use crate::error::Error;
    use crate::protocol::Token;
    use crate::search::{Filter, Group, Limit, Reducer, SortBy};

    type Options = AggregateOptions<String, String>;

    fn render(options: &Options) -> Vec<String> {
        let codec = StringCodec;
        let mut args: CommandArgs<'_, String, String> = CommandArgs::new(&codec);
        options.build_sections(&mut args).unwrap();
        assert_eq!(args.len(), options.arity());
        args.tokens().iter().map(Token::to_string).collect()
    }

    #[test]
    fn test_empty_options_emit_nothing() {
        assert!(render(&Options::default()).is_empty());
    }

    #[test]
    fn test_load_with_alias() {
        let options = Options::builder()
            .load("a")
            .unwrap()
            .load_clause(Load::identifier("b").alias("bb").build().unwrap())
            .unwrap()
            .build();
        assert_eq!(render(&options), ["LOAD", "4", "a", "b", "AS", "bb"]);
    }

    #[test]
    fn test_verbatim_operations_then_params() {
        let options = Options::builder()
            .param("n1".into(), "v1".into())
            .operation(Group::by(["brand"]).unwrap().reduce(Reducer::count()))
            .param("n2".into(), "v2".into())
            .verbatim(true)
            .build();
        assert_eq!(
            render(&options),
            [
                "VERBATIM", "GROUPBY", "1", "@brand", "REDUCE", "COUNT", "0", "PARAMS", "2", "n1",
                "v1", "n2", "v2"
            ]
        );
    }

    #[test]
    fn test_every_section_in_fixed_order() {
        let options = Options::builder()
            .timeout(Duration::from_millis(250))
            .operation(Limit::new(0, 5))
            .param("q".into(), "x".into())
            .operation(SortBy::desc("n").unwrap())
            .load_all()
            .unwrap()
            .operation(Filter::new("@n > 0").unwrap())
            .verbatim(true)
            .build();
        assert_eq!(
            render(&options),
            [
                "VERBATIM", "LOAD", "*", "LIMIT", "0", "5", "SORTBY", "2", "@n", "DESC", "FILTER",
                "@n > 0", "PARAMS", "1", "q", "x", "TIMEOUT", "250"
            ]
        );
    }

    #[test]
    fn test_load_all_then_explicit_is_rejected() {
        let err = Options::builder()
            .load_all()
            .unwrap()
            .load("title")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Usage(UsageError::InvalidConfiguration { clause: "LOAD", .. })
        ));
    }

    #[test]
    fn test_explicit_then_load_all_is_rejected() {
        let err = Options::builder()
            .load("title")
            .unwrap()
            .load_all()
            .unwrap_err();
        assert!(err.is_usage_error());

        // A structurally identical "*" clause is still recognised as load-all.
        let err = Options::builder()
            .load("title")
            .unwrap()
            .load("*")
            .unwrap_err();
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_wildcard_clause_selects_load_all() {
        let options = Options::builder().load("*").unwrap().build();
        assert_eq!(options.loads(), &Loads::All);
        assert_eq!(render(&options), ["LOAD", "*"]);
    }

    #[test]
    fn test_sub_millisecond_timeout_rounds_up() {
        let options = Options::builder()
            .timeout(Duration::from_micros(300))
            .build();
        assert_eq!(render(&options), ["TIMEOUT", "1"]);
    }

    #[test]
    fn test_plain_and_checked_emission_agree() {
        let options = Options::builder()
            .verbatim(true)
            .load("a")
            .unwrap()
            .operation(Limit::new(0, 1))
            .param("k".into(), "v".into())
            .timeout(Duration::from_millis(5))
            .build();
        let codec = StringCodec;
        let mut args: CommandArgs<'_, String, String> = CommandArgs::new(&codec);
        options.build(&mut args);
        let plain: Vec<String> = args.tokens().iter().map(Token::to_string).collect();
        assert_eq!(plain, render(&options));
    }

    #[test]
    fn test_build_is_repeatable() {
        let options = Options::builder()
            .loads(["a", "b"])
            .unwrap()
            .param("k".into(), "v".into())
            .build();
        assert_eq!(render(&options), render(&options));
    }
}
