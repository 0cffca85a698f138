//! LOAD clause of FT.AGGREGATE.

use crate::commands::CommandArgument;
use crate::error::{Result, UsageError};
use crate::protocol::{CommandArgs, Keyword};

/// Identifier that asks the server to load every attribute.
pub const LOAD_ALL_IDENTIFIER: &str = "*";

/// One loaded attribute, optionally renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Load {
    identifier: String,
    alias: Option<String>,
}

impl Load {
    /// Start building a load of `identifier`.
    pub fn identifier(identifier: impl Into<String>) -> LoadBuilder {
        LoadBuilder {
            identifier: identifier.into(),
            alias: None,
        }
    }

    /// Load `identifier` under its own name.
    pub fn of(identifier: impl Into<String>) -> Result<Self> {
        Self::identifier(identifier).build()
    }

    /// Attribute name or JSON path.
    pub fn name(&self) -> &str {
        &self.identifier
    }

    /// Name the attribute is returned under, if renamed.
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    fn token_count(&self) -> usize {
        if self.alias.is_some() { 3 } else { 1 }
    }

    /// Returns true for the bare `*` identifier.
    pub fn is_load_all(&self) -> bool {
        self.alias.is_none() && self.identifier == LOAD_ALL_IDENTIFIER
    }
}

impl<K, V> CommandArgument<K, V> for Load {
    fn arity(&self) -> usize {
        self.token_count()
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        args.add_str(self.identifier.as_str());
        if let Some(alias) = &self.alias {
            args.add_keyword(Keyword::As).add_str(alias.as_str());
        }
    }
}

/// Builder for [`Load`].
#[derive(Debug, Clone)]
pub struct LoadBuilder {
    identifier: String,
    alias: Option<String>,
}

impl LoadBuilder {
    /// Return the attribute under `alias`.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<Load> {
        if self.identifier.is_empty() {
            return Err(UsageError::argument("LOAD", "identifier", "must not be empty").into());
        }
        if matches!(&self.alias, Some(a) if a.is_empty()) {
            return Err(UsageError::argument("LOAD", "alias", "must not be empty").into());
        }
        Ok(Load {
            identifier: self.identifier,
            alias: self.alias,
        })
    }
}

/// The LOAD block: nothing, every attribute, or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loads {
    /// `LOAD *`
    All,
    /// `LOAD n id [AS alias] ...`
    Fields(Vec<Load>),
}

impl Loads {
    /// Returns true if the block emits nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Fields(fields) if fields.is_empty())
    }

    fn fields_arity(fields: &[Load]) -> usize {
        fields.iter().map(Load::token_count).sum()
    }
}

impl<K, V> CommandArgument<K, V> for Loads {
    fn arity(&self) -> usize {
        match self {
            Self::All => 2,
            Self::Fields(fields) if fields.is_empty() => 0,
            Self::Fields(fields) => 2 + Self::fields_arity(fields),
        }
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        match self {
            Self::All => {
                args.add_keyword(Keyword::Load).add_str(LOAD_ALL_IDENTIFIER);
            }
            Self::Fields(fields) if fields.is_empty() => {}
            Self::Fields(fields) => {
                args.add_keyword(Keyword::Load)
                    .add_count(Self::fields_arity(fields));
                for load in fields {
                    load.build(args);
                }
            }
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
        build_checked("LOAD", node, &mut args).unwrap();
        args.tokens().iter().map(Token::to_string).collect()
    }

    #[test]
    fn test_load_without_alias() {
        let load = Load::of("@title").unwrap();
        assert_eq!(CommandArgument::<String, String>::arity(&load), 1);
        assert_eq!(render(&load), ["@title"]);
    }

    #[test]
    fn test_load_with_alias() {
        let load = Load::identifier("$.price").alias("price").build().unwrap();
        assert_eq!(CommandArgument::<String, String>::arity(&load), 3);
        assert_eq!(render(&load), ["$.price", "AS", "price"]);
    }

    #[test]
    fn test_load_rejects_empty_names() {
        assert!(Load::of("").unwrap_err().is_usage_error());
        assert!(
            Load::identifier("title")
                .alias("")
                .build()
                .unwrap_err()
                .is_usage_error()
        );
    }

    #[test]
    fn test_block_counts_alias_tokens() {
        let loads = Loads::Fields(vec![
            Load::of("a").unwrap(),
            Load::identifier("b").alias("c").build().unwrap(),
        ]);
        assert_eq!(render(&loads), ["LOAD", "4", "a", "b", "AS", "c"]);
    }

    #[test]
    fn test_block_load_all_and_empty() {
        assert_eq!(render(&Loads::All), ["LOAD", "*"]);
        assert!(render(&Loads::Fields(Vec::new())).is_empty());
        assert!(Loads::Fields(Vec::new()).is_empty());
    }

    #[test]
    fn test_wildcard_detection() {
        assert!(Load::of("*").unwrap().is_load_all());
        assert!(!Load::identifier("*").alias("x").build().unwrap().is_load_all());
    }
}
