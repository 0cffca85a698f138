//! Command assembly layer.
//!
//! Every option node implements [`CommandArgument`]: it declares how many
//! tokens it contributes and appends exactly that many. Composite nodes rely
//! on the declared count to write length prefixes before their children are
//! built, so the assemblers append every option node through
//! [`build_checked`], which aborts assembly on a mismatch.

mod search;
mod timeseries;

pub use search::{ft_aggregate, ft_aggregate_with_cursor, ft_cursor_del, ft_cursor_read};
pub use timeseries::{
    ts_add, ts_alter, ts_create, ts_createrule, ts_decrby, ts_del, ts_deleterule, ts_get,
    ts_incrby, ts_info, ts_madd, ts_mget, ts_mrange, ts_mrevrange, ts_queryindex, ts_range,
    ts_revrange,
};

use crate::codec::RedisCodec;
use crate::error::{EncodingError, Result};
use crate::protocol::{CommandArgs, CommandType, Frame, Keyword, Token};
use bytes::{Bytes, BytesMut};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};

/// A node of an option tree.
pub trait CommandArgument<K, V> {
    /// Number of tokens [`build`](Self::build) appends.
    fn arity(&self) -> usize;

    /// Append this node's tokens to the sink.
    fn build(&self, args: &mut CommandArgs<'_, K, V>);
}

impl<K, V, T: CommandArgument<K, V> + ?Sized> CommandArgument<K, V> for &T {
    fn arity(&self) -> usize {
        (**self).arity()
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        (**self).build(args);
    }
}

impl<K, V, T: CommandArgument<K, V>> CommandArgument<K, V> for Option<T> {
    fn arity(&self) -> usize {
        self.as_ref().map_or(0, |node| node.arity())
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        if let Some(node) = self {
            node.build(args);
        }
    }
}

/// Append `node` and verify it emitted exactly its declared arity.
pub fn build_checked<K, V, A>(
    clause: &'static str,
    node: &A,
    args: &mut CommandArgs<'_, K, V>,
) -> Result<()>
where
    A: CommandArgument<K, V> + ?Sized,
{
    let declared = node.arity();
    let before = args.len();
    node.build(args);
    let emitted = args.len() - before;

    if emitted != declared {
        error!(clause, declared, emitted, "option node arity mismatch");
        return Err(EncodingError::ArityMismatch {
            clause,
            declared,
            emitted,
        }
        .into());
    }
    Ok(())
}

/// Option trees whose top level is a fixed run of clauses.
///
/// [`each_section`](Self::each_section) is the only place the clause order is
/// written down; arity, plain emission and checked emission all walk it.
pub(crate) trait Sections<K, V> {
    /// Visit every top-level clause in wire order.
    fn each_section(&self, visit: &mut dyn FnMut(&'static str, &dyn CommandArgument<K, V>));

    fn sections_arity(&self) -> usize {
        let mut n = 0;
        self.each_section(&mut |_, node| n += node.arity());
        n
    }

    fn emit_sections(&self, args: &mut CommandArgs<'_, K, V>) {
        self.each_section(&mut |_, node| node.build(args));
    }

    /// Append every clause through [`build_checked`], stopping at the first
    /// clause whose arity does not match its output.
    fn build_sections(&self, args: &mut CommandArgs<'_, K, V>) -> Result<()> {
        let mut result = Ok(());
        self.each_section(&mut |clause, node| {
            if result.is_ok() {
                result = build_checked(clause, node, args);
            }
        });
        result
    }
}

/// A bare keyword, present only when set.
pub(crate) struct Flag(pub(crate) Keyword, pub(crate) bool);

impl<K, V> CommandArgument<K, V> for Flag {
    fn arity(&self) -> usize {
        usize::from(self.1)
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        if self.1 {
            args.add_keyword(self.0);
        }
    }
}

/// `KEYWORD ms`, present only when a duration is set.
pub(crate) struct Millis(pub(crate) Keyword, pub(crate) Option<Duration>);

impl<K, V> CommandArgument<K, V> for Millis {
    fn arity(&self) -> usize {
        if self.1.is_some() { 2 } else { 0 }
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        if let Some(d) = self.1 {
            args.add_keyword(self.0).add_millis(d);
        }
    }
}

/// A fully assembled module command.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    command_type: CommandType,
    tokens: Vec<Token>,
}

impl Command {
    /// Create a command from already assembled tokens.
    pub fn new(command_type: CommandType, tokens: Vec<Token>) -> Self {
        Self {
            command_type,
            tokens,
        }
    }

    /// Command being sent.
    #[inline]
    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    /// Arguments after the command name.
    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of arguments (excluding command name).
    #[inline]
    pub fn arg_count(&self) -> usize {
        self.tokens.len()
    }

    /// Arguments rendered as text, lossy for binary keys and values.
    pub fn arg_strings(&self) -> Vec<String> {
        self.tokens.iter().map(Token::to_string).collect()
    }

    /// Request frame: an array of bulk strings, command name first.
    pub fn to_frame(&self) -> Frame {
        let mut frames = Vec::with_capacity(self.tokens.len() + 1);
        frames.push(Frame::Bulk(Bytes::from_static(
            self.command_type.as_str().as_bytes(),
        )));
        frames.extend(self.tokens.iter().map(Token::to_frame));
        Frame::Array(frames)
    }

    /// Serialize the request into `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        self.to_frame().serialize(buf);
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_type.as_str())?;
        for token in &self.tokens {
            write!(f, " {token}")?;
        }
        Ok(())
    }
}

/// Accumulates one command's arguments in grammar order.
pub(crate) struct Assembler<'c, K, V> {
    command_type: CommandType,
    args: CommandArgs<'c, K, V>,
}

impl<'c, K, V> Assembler<'c, K, V> {
    pub(crate) fn new(command_type: CommandType, codec: &'c dyn RedisCodec<K, V>) -> Self {
        Self {
            command_type,
            args: CommandArgs::new(codec),
        }
    }

    /// Mandatory positional arguments go straight into the sink.
    #[inline]
    pub(crate) fn args(&mut self) -> &mut CommandArgs<'c, K, V> {
        &mut self.args
    }

    /// Append an option node through [`build_checked`].
    pub(crate) fn option<A>(&mut self, clause: &'static str, node: &A) -> Result<&mut Self>
    where
        A: CommandArgument<K, V> + ?Sized,
    {
        build_checked(clause, node, &mut self.args)?;
        Ok(self)
    }

    pub(crate) fn finish(self) -> Command {
        debug!(
            command = self.command_type.as_str(),
            args = self.args.len(),
            "assembled command"
        );
        Command::new(self.command_type, self.args.into_tokens())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use crate::error::Error;

    /// Declares one token more than it emits.
    struct Lying;

    impl CommandArgument<String, String> for Lying {
        fn arity(&self) -> usize {
            2
        }

        fn build(&self, args: &mut CommandArgs<'_, String, String>) {
            args.add_keyword(Keyword::Latest);
        }
    }

    struct Honest;

    impl CommandArgument<String, String> for Honest {
        fn arity(&self) -> usize {
            1
        }

        fn build(&self, args: &mut CommandArgs<'_, String, String>) {
            args.add_keyword(Keyword::Latest);
        }
    }

    #[test]
    fn test_build_checked_rejects_arity_mismatch() {
        let codec = StringCodec;
        let mut assembler = Assembler::new(CommandType::TsGet, &codec);
        let err = assembler.option("LATEST", &Lying).err().unwrap();
        assert!(matches!(
            err,
            Error::Encoding(EncodingError::ArityMismatch {
                clause: "LATEST",
                declared: 2,
                emitted: 1,
            })
        ));
    }

    #[test]
    fn test_optional_node_contributes_nothing_when_absent() {
        let codec = StringCodec;
        let mut assembler = Assembler::new(CommandType::TsGet, &codec);
        assembler.args().add_key(&"temp:1".to_string());
        assembler.option("LATEST", &None::<Honest>).unwrap();
        assembler.option("LATEST", &Some(Honest)).unwrap();
        let command = assembler.finish();
        assert_eq!(command.arg_strings(), ["temp:1", "LATEST"]);
    }

    /// `LATEST`, then a lying clause, then `LATEST` again.
    struct Mixed;

    impl Sections<String, String> for Mixed {
        fn each_section(
            &self,
            visit: &mut dyn FnMut(&'static str, &dyn CommandArgument<String, String>),
        ) {
            visit("LATEST", &Honest);
            visit("WITHLABELS", &Lying);
            visit("LATEST", &Honest);
        }
    }

    #[test]
    fn test_sections_stop_at_first_mismatch() {
        let codec = StringCodec;
        let mut args = CommandArgs::new(&codec);
        let err = Mixed.build_sections(&mut args).unwrap_err();
        assert!(matches!(
            err,
            Error::Encoding(EncodingError::ArityMismatch {
                clause: "WITHLABELS",
                ..
            })
        ));
        assert_eq!(args.len(), 2);
        assert_eq!(Mixed.sections_arity(), 4);
    }

    #[test]
    fn test_flag_and_millis_nodes() {
        let codec = StringCodec;
        let mut args: CommandArgs<'_, String, String> = CommandArgs::new(&codec);
        build_checked("VERBATIM", &Flag(Keyword::Verbatim, false), &mut args).unwrap();
        build_checked("TIMEOUT", &Millis(Keyword::Timeout, None), &mut args).unwrap();
        assert!(args.is_empty());

        build_checked("VERBATIM", &Flag(Keyword::Verbatim, true), &mut args).unwrap();
        build_checked(
            "TIMEOUT",
            &Millis(Keyword::Timeout, Some(Duration::from_micros(10))),
            &mut args,
        )
        .unwrap();
        let rendered: Vec<String> = args.tokens().iter().map(Token::to_string).collect();
        assert_eq!(rendered, ["VERBATIM", "TIMEOUT", "1"]);
    }

    #[test]
    fn test_command_frame_and_display() {
        let command = Command::new(
            CommandType::TsGet,
            vec![Token::Key(Bytes::from("temp:1")), Token::Keyword(Keyword::Latest)],
        );
        assert_eq!(command.to_string(), "TS.GET temp:1 LATEST");
        assert_eq!(
            command.to_frame().to_vec(),
            b"*3\r\n$6\r\nTS.GET\r\n$6\r\ntemp:1\r\n$6\r\nLATEST\r\n"
        );

        let mut buf = BytesMut::new();
        command.encode(&mut buf);
        assert_eq!(&buf[..], &command.to_frame().to_vec()[..]);
    }
}
