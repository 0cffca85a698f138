//! Time-series command assemblers.

use super::{Assembler, Command, Sections};
use crate::codec::RedisCodec;
use crate::error::{Result, UsageError};
use crate::protocol::{CommandType, Keyword};
use crate::timeseries::{
    Compaction, CreateMode, CreateOptions, KeySample, MGetOptions, MRangeOptions, RangeOptions,
    Timestamp,
};

/// `TS.CREATE key [options]`
pub fn ts_create<K, V>(
    codec: &dyn RedisCodec<K, V>,
    key: &K,
    options: &CreateOptions<K, V>,
) -> Result<Command> {
    let mut asm = Assembler::new(CommandType::TsCreate, codec);
    asm.args().add_key(key);
    asm.option("CREATE", &options.for_mode(CreateMode::Create))?;
    Ok(asm.finish())
}

/// `TS.ALTER key [options]`. Encoding is fixed at creation and not sent.
pub fn ts_alter<K, V>(
    codec: &dyn RedisCodec<K, V>,
    key: &K,
    options: &CreateOptions<K, V>,
) -> Result<Command> {
    let mut asm = Assembler::new(CommandType::TsAlter, codec);
    asm.args().add_key(key);
    asm.option("ALTER", &options.for_mode(CreateMode::Alter))?;
    Ok(asm.finish())
}

/// `TS.ADD key timestamp value [options]`
pub fn ts_add<K, V>(
    codec: &dyn RedisCodec<K, V>,
    key: &K,
    timestamp: Timestamp,
    value: f64,
    options: Option<&CreateOptions<K, V>>,
) -> Result<Command> {
    let mut asm = Assembler::new(CommandType::TsAdd, codec);
    asm.args().add_key(key);
    asm.option("TIMESTAMP", &timestamp)?;
    asm.args().add_double(value);
    asm.option("ADD", &options.map(|o| o.for_mode(CreateMode::Add)))?;
    Ok(asm.finish())
}

/// `TS.MADD key timestamp value [key timestamp value ...]`
pub fn ts_madd<K, V>(codec: &dyn RedisCodec<K, V>, samples: &[KeySample<K>]) -> Result<Command> {
    if samples.is_empty() {
        return Err(UsageError::argument("MADD", "samples", "at least one sample is required").into());
    }
    let mut asm = Assembler::new(CommandType::TsMadd, codec);
    for sample in samples {
        asm.option("MADD", sample)?;
    }
    Ok(asm.finish())
}

fn increment<K, V>(
    command_type: CommandType,
    codec: &dyn RedisCodec<K, V>,
    key: &K,
    value: f64,
    timestamp: Option<u64>,
    options: Option<&CreateOptions<K, V>>,
) -> Result<Command> {
    let mut asm = Assembler::new(command_type, codec);
    asm.args().add_key(key).add_double(value);
    if let Some(ts) = timestamp {
        asm.args().add_keyword(Keyword::Timestamp).add_uint(ts);
    }
    asm.option("INCRBY", &options.map(|o| o.for_mode(CreateMode::Increment)))?;
    Ok(asm.finish())
}

/// `TS.INCRBY key value [TIMESTAMP ts] [options]`
pub fn ts_incrby<K, V>(
    codec: &dyn RedisCodec<K, V>,
    key: &K,
    value: f64,
    timestamp: Option<u64>,
    options: Option<&CreateOptions<K, V>>,
) -> Result<Command> {
    increment(CommandType::TsIncrBy, codec, key, value, timestamp, options)
}

/// `TS.DECRBY key value [TIMESTAMP ts] [options]`
pub fn ts_decrby<K, V>(
    codec: &dyn RedisCodec<K, V>,
    key: &K,
    value: f64,
    timestamp: Option<u64>,
    options: Option<&CreateOptions<K, V>>,
) -> Result<Command> {
    increment(CommandType::TsDecrBy, codec, key, value, timestamp, options)
}

/// `TS.CREATERULE source dest AGGREGATION agg bucket [align]`
pub fn ts_createrule<K, V>(
    codec: &dyn RedisCodec<K, V>,
    source: &K,
    dest: &K,
    compaction: &Compaction,
) -> Result<Command> {
    let mut asm = Assembler::new(CommandType::TsCreateRule, codec);
    asm.args().add_key(source).add_key(dest);
    asm.option("AGGREGATION", compaction)?;
    Ok(asm.finish())
}

/// `TS.DELETERULE source dest`
pub fn ts_deleterule<K, V>(codec: &dyn RedisCodec<K, V>, source: &K, dest: &K) -> Command {
    let mut asm = Assembler::new(CommandType::TsDeleteRule, codec);
    asm.args().add_key(source).add_key(dest);
    asm.finish()
}

fn range<K, V>(
    command_type: CommandType,
    codec: &dyn RedisCodec<K, V>,
    key: &K,
    options: &RangeOptions,
) -> Result<Command> {
    let mut asm = Assembler::new(command_type, codec);
    asm.args().add_key(key);
    options.build_sections(asm.args())?;
    Ok(asm.finish())
}

/// `TS.RANGE key from to [options]`
pub fn ts_range<K, V>(
    codec: &dyn RedisCodec<K, V>,
    key: &K,
    options: &RangeOptions,
) -> Result<Command> {
    range(CommandType::TsRange, codec, key, options)
}

/// `TS.REVRANGE key from to [options]`
pub fn ts_revrange<K, V>(
    codec: &dyn RedisCodec<K, V>,
    key: &K,
    options: &RangeOptions,
) -> Result<Command> {
    range(CommandType::TsRevRange, codec, key, options)
}

fn mrange<K, V>(
    command_type: CommandType,
    codec: &dyn RedisCodec<K, V>,
    options: &MRangeOptions<K, V>,
) -> Result<Command> {
    let mut asm = Assembler::new(command_type, codec);
    options.build_sections(asm.args())?;
    Ok(asm.finish())
}

/// `TS.MRANGE from to [options] FILTER f... [GROUPBY label REDUCE r]`
pub fn ts_mrange<K, V>(
    codec: &dyn RedisCodec<K, V>,
    options: &MRangeOptions<K, V>,
) -> Result<Command> {
    mrange(CommandType::TsMrange, codec, options)
}

/// `TS.MREVRANGE from to [options] FILTER f... [GROUPBY label REDUCE r]`
pub fn ts_mrevrange<K, V>(
    codec: &dyn RedisCodec<K, V>,
    options: &MRangeOptions<K, V>,
) -> Result<Command> {
    mrange(CommandType::TsMrevRange, codec, options)
}

/// `TS.GET key [LATEST]`
pub fn ts_get<K, V>(codec: &dyn RedisCodec<K, V>, key: &K, latest: bool) -> Command {
    let mut asm = Assembler::new(CommandType::TsGet, codec);
    asm.args().add_key(key);
    if latest {
        asm.args().add_keyword(Keyword::Latest);
    }
    asm.finish()
}

/// `TS.MGET [LATEST] [WITHLABELS | SELECTED_LABELS l...] FILTER f...`
pub fn ts_mget<K, V>(codec: &dyn RedisCodec<K, V>, options: &MGetOptions<K, V>) -> Result<Command> {
    let mut asm = Assembler::new(CommandType::TsMget, codec);
    options.build_sections(asm.args())?;
    Ok(asm.finish())
}

/// `TS.INFO key [DEBUG]`
pub fn ts_info<K, V>(codec: &dyn RedisCodec<K, V>, key: &K, debug: bool) -> Command {
    let mut asm = Assembler::new(CommandType::TsInfo, codec);
    asm.args().add_key(key);
    if debug {
        asm.args().add_keyword(Keyword::Debug);
    }
    asm.finish()
}

/// `TS.DEL key from to`
pub fn ts_del<K, V>(codec: &dyn RedisCodec<K, V>, key: &K, from: u64, to: u64) -> Result<Command> {
    if from > to {
        return Err(UsageError::argument("DEL", "from", format!("start {from} is after end {to}")).into());
    }
    let mut asm = Assembler::new(CommandType::TsDel, codec);
    asm.args().add_key(key).add_uint(from).add_uint(to);
    Ok(asm.finish())
}

/// `TS.QUERYINDEX f...`
pub fn ts_queryindex<K, V>(codec: &dyn RedisCodec<K, V>, filters: &[V]) -> Result<Command> {
    if filters.is_empty() {
        return Err(
            UsageError::argument("QUERYINDEX", "filters", "at least one filter is required")
                .into(),
        );
    }
    let mut asm = Assembler::new(CommandType::TsQueryIndex, codec);
    for filter in filters {
        asm.args().add_value(filter);
    }
    Ok(asm.finish())
}
