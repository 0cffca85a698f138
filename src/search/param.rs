//! Query parameters (`PARAMS`).

use crate::commands::CommandArgument;
use crate::protocol::{CommandArgs, Keyword};

/// A named query parameter referenced as `$name` in the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter<K, V> {
    name: K,
    value: V,
}

impl<K, V> Parameter<K, V> {
    /// Bind `value` to `name`.
    pub fn new(name: K, value: V) -> Self {
        Self { name, value }
    }

    /// Parameter name.
    pub fn name(&self) -> &K {
        &self.name
    }

    /// Bound value.
    pub fn value(&self) -> &V {
        &self.value
    }
}

impl<K, V> CommandArgument<K, V> for Parameter<K, V> {
    fn arity(&self) -> usize {
        2
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        args.add_key(&self.name).add_value(&self.value);
    }
}

/// The PARAMS block. Emits nothing when empty.
///
/// The count after `PARAMS` is the number of pairs, not the number of
/// tokens that follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params<K, V> {
    params: Vec<Parameter<K, V>>,
}

impl<K, V> Params<K, V> {
    /// Empty block.
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Append a parameter.
    pub fn push(&mut self, param: Parameter<K, V>) {
        self.params.push(param);
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if no parameter is bound.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Bound parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter<K, V>> {
        self.params.iter()
    }
}

impl<K, V> Default for Params<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<Parameter<K, V>> for Params<K, V> {
    fn from_iter<I: IntoIterator<Item = Parameter<K, V>>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

impl<K, V> CommandArgument<K, V> for Params<K, V> {
    fn arity(&self) -> usize {
        if self.params.is_empty() {
            return 0;
        }
        2 + 2 * self.params.len()
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        if self.params.is_empty() {
            return;
        }
        args.add_keyword(Keyword::Params)
            .add_count(self.params.len());
        for param in &self.params {
            param.build(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use crate::commands::build_checked;
    use crate::protocol::Token;

    fn param(name: &str, value: &str) -> Parameter<String, String> {
        Parameter::new(name.to_string(), value.to_string())
    }

    #[test]
    fn test_params_block_counts_pairs() {
        let params: Params<String, String> =
            [param("lat", "40.7"), param("radius", "10")].into_iter().collect();

        let codec = StringCodec;
        let mut args: CommandArgs<'_, String, String> = CommandArgs::new(&codec);
        build_checked("PARAMS", &params, &mut args).unwrap();
        let rendered: Vec<String> = args.tokens().iter().map(Token::to_string).collect();
        assert_eq!(rendered, ["PARAMS", "2", "lat", "40.7", "radius", "10"]);
    }

    #[test]
    fn test_empty_params_emit_nothing() {
        let params: Params<String, String> = Params::new();
        assert_eq!(params.arity(), 0);

        let codec = StringCodec;
        let mut args: CommandArgs<'_, String, String> = CommandArgs::new(&codec);
        build_checked("PARAMS", &params, &mut args).unwrap();
        assert!(args.is_empty());
    }

    #[test]
    fn test_parameter_is_a_name_value_pair() {
        let p = param("n", "1");
        assert_eq!(p.arity(), 2);
        assert_eq!(p.name(), "n");
        assert_eq!(p.value(), "1");
    }
}
