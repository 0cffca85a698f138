//! Argument sink for command assembly.
//!
//! `CommandArgs` is the only mutable target the encoders write into. It
//! appends tokens in call order and knows nothing about command semantics;
//! since the module grammars are positional, that ordering is the whole
//! correctness contract.

use super::frame::{Frame, format_double, itoa};
use super::keyword::Keyword;
use crate::codec::RedisCodec;
use bytes::Bytes;
use std::fmt;

/// A single wire argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Protocol keyword
    Keyword(Keyword),
    /// Free-form text (identifiers, expressions, symbolic bounds)
    Text(String),
    /// Signed integer
    Integer(i64),
    /// Floating point number
    Double(f64),
    /// Key encoded by the codec
    Key(Bytes),
    /// Value encoded by the codec
    Value(Bytes),
}

impl Token {
    /// Wire bytes of this token.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Keyword(k) => Bytes::from_static(k.as_str().as_bytes()),
            Self::Text(s) => Bytes::copy_from_slice(s.as_bytes()),
            Self::Integer(n) => {
                let mut temp = itoa::Buffer::new();
                Bytes::copy_from_slice(temp.format(*n).as_bytes())
            }
            Self::Double(d) => Bytes::from(format_double(*d)),
            Self::Key(b) | Self::Value(b) => b.clone(),
        }
    }

    /// Bulk string frame carrying this token.
    #[inline]
    pub fn to_frame(&self) -> Frame {
        Frame::Bulk(self.to_bytes())
    }

    /// Returns true if this token is the given keyword.
    #[inline]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Self::Keyword(k) if *k == keyword)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(k) => f.write_str(k.as_str()),
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Double(d) => f.write_str(&format_double(*d)),
            Self::Key(b) | Self::Value(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

impl From<Keyword> for Token {
    fn from(k: Keyword) -> Self {
        Self::Keyword(k)
    }
}

/// Append-only argument list with a key/value codec.
pub struct CommandArgs<'c, K, V> {
    codec: &'c dyn RedisCodec<K, V>,
    tokens: Vec<Token>,
}

impl<'c, K, V> CommandArgs<'c, K, V> {
    /// Create an empty sink.
    pub fn new(codec: &'c dyn RedisCodec<K, V>) -> Self {
        Self {
            codec,
            tokens: Vec::new(),
        }
    }

    /// Append a keyword.
    #[inline]
    pub fn add_keyword(&mut self, keyword: Keyword) -> &mut Self {
        self.tokens.push(Token::Keyword(keyword));
        self
    }

    /// Append free-form text.
    #[inline]
    pub fn add_str(&mut self, s: impl Into<String>) -> &mut Self {
        self.tokens.push(Token::Text(s.into()));
        self
    }

    /// Append a signed integer.
    #[inline]
    pub fn add_int(&mut self, n: i64) -> &mut Self {
        self.tokens.push(Token::Integer(n));
        self
    }

    /// Append an unsigned integer.
    ///
    /// Counts and timestamps above `i64::MAX` are sent as text so nothing
    /// wraps.
    #[inline]
    pub fn add_uint(&mut self, n: u64) -> &mut Self {
        match i64::try_from(n) {
            Ok(n) => self.tokens.push(Token::Integer(n)),
            Err(_) => self.tokens.push(Token::Text(n.to_string())),
        }
        self
    }

    /// Append a duration in whole milliseconds, rounding any fraction up so
    /// a non-zero duration never reaches the server as `0`.
    #[inline]
    pub fn add_millis(&mut self, d: std::time::Duration) -> &mut Self {
        let mut ms = d.as_millis();
        if d.subsec_nanos() % 1_000_000 != 0 {
            ms += 1;
        }
        self.add_uint(u64::try_from(ms).unwrap_or(u64::MAX))
    }

    /// Append a count derived from a collection length.
    #[inline]
    pub fn add_count(&mut self, n: usize) -> &mut Self {
        self.add_uint(n as u64)
    }

    /// Append a floating point number.
    #[inline]
    pub fn add_double(&mut self, d: f64) -> &mut Self {
        self.tokens.push(Token::Double(d));
        self
    }

    /// Append a property reference (`@name`). Already prefixed names pass
    /// through unchanged.
    #[inline]
    pub fn add_property(&mut self, property: &str) -> &mut Self {
        let token = if property.starts_with('@') {
            property.to_string()
        } else {
            format!("@{property}")
        };
        self.tokens.push(Token::Text(token));
        self
    }

    /// Append a key through the codec.
    #[inline]
    pub fn add_key(&mut self, key: &K) -> &mut Self {
        self.tokens.push(Token::Key(self.codec.encode_key(key)));
        self
    }

    /// Append a value through the codec.
    #[inline]
    pub fn add_value(&mut self, value: &V) -> &mut Self {
        self.tokens.push(Token::Value(self.codec.encode_value(value)));
        self
    }

    /// Number of tokens appended so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if nothing has been appended.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens appended so far.
    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Consume the sink, returning its tokens.
    #[inline]
    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Codec used for keys and values.
    #[inline]
    pub fn codec(&self) -> &'c dyn RedisCodec<K, V> {
        self.codec
    }
}

impl<K, V> fmt::Debug for CommandArgs<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandArgs")
            .field("tokens", &self.tokens)
            .finish()
    }
}
