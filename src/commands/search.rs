//! Search command assemblers.

use super::{Assembler, Command, Sections};
use crate::codec::RedisCodec;
use crate::error::Result;
use crate::protocol::{CommandType, Keyword};
use crate::search::{AggregateOptions, CursorOptions};

/// `FT.AGGREGATE index query [options]`
pub fn ft_aggregate<K, V>(
    codec: &dyn RedisCodec<K, V>,
    index: &K,
    query: &V,
    options: &AggregateOptions<K, V>,
) -> Result<Command> {
    let mut asm = Assembler::new(CommandType::FtAggregate, codec);
    asm.args().add_key(index).add_value(query);
    options.build_sections(asm.args())?;
    Ok(asm.finish())
}

/// `FT.AGGREGATE index query [options] WITHCURSOR [COUNT n] [MAXIDLE ms]`
pub fn ft_aggregate_with_cursor<K, V>(
    codec: &dyn RedisCodec<K, V>,
    index: &K,
    query: &V,
    options: &AggregateOptions<K, V>,
    cursor: &CursorOptions,
) -> Result<Command> {
    let mut asm = Assembler::new(CommandType::FtAggregate, codec);
    asm.args().add_key(index).add_value(query);
    options.build_sections(asm.args())?;
    asm.option("WITHCURSOR", cursor)?;
    Ok(asm.finish())
}

/// `FT.CURSOR READ index cursor [COUNT n]`
pub fn ft_cursor_read<K, V>(
    codec: &dyn RedisCodec<K, V>,
    index: &K,
    cursor: u64,
    count: Option<u64>,
) -> Command {
    let mut asm = Assembler::new(CommandType::FtCursor, codec);
    asm.args()
        .add_keyword(Keyword::Read)
        .add_key(index)
        .add_uint(cursor);
    if let Some(count) = count {
        asm.args().add_keyword(Keyword::Count).add_uint(count);
    }
    asm.finish()
}

/// `FT.CURSOR DEL index cursor`
pub fn ft_cursor_del<K, V>(codec: &dyn RedisCodec<K, V>, index: &K, cursor: u64) -> Command {
    let mut asm = Assembler::new(CommandType::FtCursor, codec);
    asm.args()
        .add_keyword(Keyword::Del)
        .add_key(index)
        .add_uint(cursor);
    asm.finish()
}
