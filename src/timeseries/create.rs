//! Series creation options shared by TS.CREATE, TS.ALTER, TS.ADD and
//! TS.INCRBY/TS.DECRBY.

use crate::commands::CommandArgument;
use crate::error::{Result, UsageError};
use crate::protocol::{CommandArgs, Keyword};
use std::time::Duration;

/// Smallest accepted chunk size in bytes.
pub const MIN_CHUNK_SIZE: u64 = 48;

/// Largest accepted chunk size in bytes.
pub const MAX_CHUNK_SIZE: u64 = 1_048_576;

/// Duplicate policy for handling duplicate timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Block duplicates (error)
    Block,
    /// Keep first value
    First,
    /// Keep last value
    Last,
    /// Keep minimum value
    Min,
    /// Keep maximum value
    Max,
    /// Sum values
    Sum,
}

impl DuplicatePolicy {
    /// Wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "BLOCK",
            Self::First => "FIRST",
            Self::Last => "LAST",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
        }
    }
}

/// Chunk encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Compressed,
    Uncompressed,
}

impl Encoding {
    const fn keyword(self) -> Keyword {
        match self {
            Self::Compressed => Keyword::Compressed,
            Self::Uncompressed => Keyword::Uncompressed,
        }
    }
}

/// A series label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<K, V> {
    /// Label name
    pub name: K,
    /// Label value
    pub value: V,
}

impl<K, V> Label<K, V> {
    /// Create a label.
    pub fn new(name: K, value: V) -> Self {
        Self { name, value }
    }
}

/// Which command the options are emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateMode {
    /// TS.CREATE
    Create,
    /// TS.ALTER: encoding cannot change
    Alter,
    /// TS.ADD: the policy overrides the series policy for this sample
    Add,
    /// TS.INCRBY / TS.DECRBY
    Increment,
}

impl CreateMode {
    const fn policy_keyword(self) -> Keyword {
        match self {
            Self::Add => Keyword::OnDuplicate,
            _ => Keyword::DuplicatePolicy,
        }
    }

    const fn allows_encoding(self) -> bool {
        !matches!(self, Self::Alter)
    }
}

/// `[RETENTION ms] [ENCODING enc] [CHUNK_SIZE n] [policy] [LABELS l v ...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions<K, V> {
    retention: Option<Duration>,
    encoding: Option<Encoding>,
    chunk_size: Option<u64>,
    policy: Option<DuplicatePolicy>,
    labels: Vec<Label<K, V>>,
}

impl<K, V> Default for CreateOptions<K, V> {
    fn default() -> Self {
        Self {
            retention: None,
            encoding: None,
            chunk_size: None,
            policy: None,
            labels: Vec::new(),
        }
    }
}

impl<K, V> CreateOptions<K, V> {
    /// Start an empty builder.
    pub fn builder() -> CreateOptionsBuilder<K, V> {
        CreateOptionsBuilder {
            options: Self::default(),
        }
    }

    /// Labels in insertion order.
    pub fn labels(&self) -> &[Label<K, V>] {
        &self.labels
    }

    /// Bind the options to the command they are emitted for.
    pub fn for_mode(&self, mode: CreateMode) -> CreateArgs<'_, K, V> {
        CreateArgs {
            options: self,
            mode,
        }
    }

    fn encoding_for(&self, mode: CreateMode) -> Option<Encoding> {
        self.encoding.filter(|_| mode.allows_encoding())
    }
}

/// [`CreateOptions`] rendered for one [`CreateMode`].
#[derive(Debug, Clone, Copy)]
pub struct CreateArgs<'o, K, V> {
    options: &'o CreateOptions<K, V>,
    mode: CreateMode,
}

impl<K, V> CommandArgument<K, V> for CreateArgs<'_, K, V> {
    fn arity(&self) -> usize {
        let o = self.options;
        let mut n = 0;
        if o.retention.is_some() {
            n += 2;
        }
        if o.encoding_for(self.mode).is_some() {
            n += 2;
        }
        if o.chunk_size.is_some() {
            n += 2;
        }
        if o.policy.is_some() {
            n += 2;
        }
        if !o.labels.is_empty() {
            n += 1 + 2 * o.labels.len();
        }
        n
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        let o = self.options;
        if let Some(retention) = o.retention {
            args.add_keyword(Keyword::Retention).add_millis(retention);
        }
        if let Some(encoding) = o.encoding_for(self.mode) {
            args.add_keyword(Keyword::Encoding)
                .add_keyword(encoding.keyword());
        }
        if let Some(size) = o.chunk_size {
            args.add_keyword(Keyword::ChunkSize).add_uint(size);
        }
        if let Some(policy) = o.policy {
            args.add_keyword(self.mode.policy_keyword())
                .add_str(policy.as_str());
        }
        if !o.labels.is_empty() {
            args.add_keyword(Keyword::Labels);
            for label in &o.labels {
                args.add_key(&label.name).add_value(&label.value);
            }
        }
    }
}

/// Builder for [`CreateOptions`].
#[derive(Debug, Clone)]
pub struct CreateOptionsBuilder<K, V> {
    options: CreateOptions<K, V>,
}

impl<K, V> CreateOptionsBuilder<K, V> {
    /// Maximum sample age relative to the newest sample. Zero keeps samples
    /// forever; sub-millisecond parts round up.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.options.retention = Some(retention);
        self
    }

    /// Chunk encoding.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.options.encoding = Some(encoding);
        self
    }

    /// Chunk size in bytes, a multiple of 8 within
    /// [`MIN_CHUNK_SIZE`]..=[`MAX_CHUNK_SIZE`].
    pub fn chunk_size(mut self, size: u64) -> Result<Self> {
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&size) || size % 8 != 0 {
            return Err(UsageError::argument(
                "CHUNK_SIZE",
                "size",
                format!(
                    "{size} is not a multiple of 8 in [{MIN_CHUNK_SIZE}, {MAX_CHUNK_SIZE}]"
                ),
            )
            .into());
        }
        self.options.chunk_size = Some(size);
        Ok(self)
    }

    /// Duplicate sample policy.
    pub fn policy(mut self, policy: DuplicatePolicy) -> Self {
        self.options.policy = Some(policy);
        self
    }

    /// Append a label.
    pub fn label(mut self, name: K, value: V) -> Self {
        self.options.labels.push(Label::new(name, value));
        self
    }

    /// Snapshot the options.
    pub fn build(self) -> CreateOptions<K, V> {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use crate::commands::build_checked;
    use crate::protocol::Token;

    type Options = CreateOptions<String, String>;

    fn render(options: &Options, mode: CreateMode) -> Vec<String> {
        let codec = StringCodec;
        let mut args: CommandArgs<'_, String, String> = CommandArgs::new(&codec);
        build_checked("CREATE", &options.for_mode(mode), &mut args).unwrap();
        args.tokens().iter().map(Token::to_string).collect()
    }

    fn full() -> Options {
        Options::builder()
            .label("sensor".into(), "s1".into())
            .policy(DuplicatePolicy::Last)
            .chunk_size(4096)
            .unwrap()
            .encoding(Encoding::Uncompressed)
            .retention(Duration::from_secs(86_400))
            .label("area".into(), "north".into())
            .build()
    }

    #[test]
    fn test_create_order() {
        assert_eq!(
            render(&full(), CreateMode::Create),
            [
                "RETENTION", "86400000", "ENCODING", "UNCOMPRESSED", "CHUNK_SIZE", "4096",
                "DUPLICATE_POLICY", "LAST", "LABELS", "sensor", "s1", "area", "north"
            ]
        );
    }

    #[test]
    fn test_alter_drops_encoding() {
        let tokens = render(&full(), CreateMode::Alter);
        assert!(!tokens.iter().any(|t| t == "ENCODING"));
        assert_eq!(tokens[2], "CHUNK_SIZE");
    }

    #[test]
    fn test_add_uses_on_duplicate() {
        let options = Options::builder().policy(DuplicatePolicy::Sum).build();
        assert_eq!(render(&options, CreateMode::Add), ["ON_DUPLICATE", "SUM"]);
        assert_eq!(
            render(&options, CreateMode::Increment),
            ["DUPLICATE_POLICY", "SUM"]
        );
    }

    #[test]
    fn test_retention_rounds_up() {
        let options = Options::builder()
            .retention(Duration::from_micros(1_001))
            .build();
        assert_eq!(render(&options, CreateMode::Create), ["RETENTION", "2"]);
    }

    #[test]
    fn test_empty_options_emit_nothing() {
        assert!(render(&Options::default(), CreateMode::Create).is_empty());
    }

    #[test]
    fn test_chunk_size_bounds() {
        assert!(Options::builder().chunk_size(48).is_ok());
        assert!(Options::builder().chunk_size(1_048_576).is_ok());
        assert!(Options::builder().chunk_size(40).is_err());
        assert!(Options::builder().chunk_size(100).is_err());
        assert!(Options::builder().chunk_size(2_000_000).is_err());
    }
}
