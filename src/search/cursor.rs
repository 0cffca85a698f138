//! Cursor-based aggregation (`WITHCURSOR`).

use crate::commands::CommandArgument;
use crate::protocol::{CommandArgs, Keyword};
use std::time::Duration;

/// Cursor settings for FT.AGGREGATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorOptions {
    count: Option<u64>,
    max_idle: Option<Duration>,
}

impl CursorOptions {
    /// Cursor with server defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows per read.
    pub fn count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Idle time after which the server drops the cursor. Sub-millisecond
    /// parts round up.
    pub fn max_idle(mut self, max_idle: Duration) -> Self {
        self.max_idle = Some(max_idle);
        self
    }
}

impl<K, V> CommandArgument<K, V> for CursorOptions {
    fn arity(&self) -> usize {
        1 + if self.count.is_some() { 2 } else { 0 } + if self.max_idle.is_some() { 2 } else { 0 }
    }

    fn build(&self, args: &mut CommandArgs<'_, K, V>) {
        args.add_keyword(Keyword::WithCursor);
        if let Some(count) = self.count {
            args.add_keyword(Keyword::Count).add_uint(count);
        }
        if let Some(idle) = self.max_idle {
            args.add_keyword(Keyword::MaxIdle).add_millis(idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StringCodec;
    use crate::commands::build_checked;
    use crate::protocol::Token;

    fn render(cursor: &CursorOptions) -> Vec<String> {
        let codec = StringCodec;
        let mut args: CommandArgs<'_, String, String> = CommandArgs::new(&codec);
        build_checked("WITHCURSOR", cursor, &mut args).unwrap();
        args.tokens().iter().map(Token::to_string).collect()
    }

    #[test]
    fn test_bare_cursor() {
        assert_eq!(render(&CursorOptions::new()), ["WITHCURSOR"]);
    }

    #[test]
    fn test_cursor_count_and_idle() {
        let cursor = CursorOptions::new()
            .count(500)
            .max_idle(Duration::from_secs(30));
        assert_eq!(
            render(&cursor),
            ["WITHCURSOR", "COUNT", "500", "MAXIDLE", "30000"]
        );
    }

    #[test]
    fn test_sub_millisecond_idle_is_not_zero() {
        let cursor = CursorOptions::new().max_idle(Duration::from_nanos(1));
        assert_eq!(render(&cursor), ["WITHCURSOR", "MAXIDLE", "1"]);
    }
}
