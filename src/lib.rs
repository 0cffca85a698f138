//! # Viator Modules
//!
//! Argument encoders and reply shapers for the search and time-series module
//! commands.
//!
//! Options are described as trees of typed nodes. Each node knows how many
//! wire tokens it contributes and appends exactly that many, so composite
//! clauses (`LOAD n ...`, `PARAMS n ...`, `GROUPBY n ...`) can write their
//! length prefixes before their children. Assembly checks every node against
//! its declared count and refuses to produce a command on a mismatch.
//!
//! - `FT.AGGREGATE` pipelines (LOAD, GROUPBY/REDUCE, SORTBY, APPLY, FILTER,
//!   LIMIT, PARAMS, cursors)
//! - The `TS.*` command surface (create/alter, add/madd/incrby/decrby,
//!   rules, range/mrange, get/mget, info, del, queryindex)
//! - Typed reply shaping for both
//! - A small async connection over tokio
//!
//! ## Example
//!
//! ```
//! use viator_modules::codec::{RedisCodec, StringCodec};
//! use viator_modules::commands::ft_aggregate;
//! use viator_modules::search::{AggregateOptions, Group, Reducer};
//!
//! let codec: &dyn RedisCodec<String, String> = &StringCodec;
//! let options = AggregateOptions::builder()
//!     .load("title")?
//!     .operation(Group::by(["brand"])?.reduce(Reducer::count().alias("n")?))
//!     .build();
//! let command = ft_aggregate(codec, &"idx".to_string(), &"*".to_string(), &options)?;
//! assert_eq!(
//!     command.to_string(),
//!     "FT.AGGREGATE idx * LOAD 1 title GROUPBY 1 @brand REDUCE COUNT 0 AS n"
//! );
//! # Ok::<(), viator_modules::Error>(())
//! ```

#![doc(html_root_url = "https://docs.rs/viator-modules/0.1.0")]
#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_lifetimes,
    unused_qualifications
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::should_implement_trait,     // from_str, as_ref naming
    clippy::inherent_to_string_shadow_display,
    clippy::wrong_self_convention,      // to_* with Copy types
    missing_docs // Public API docs needed - future enhancement
)]

// ─────────────────────────────────────────────────────────────────────────────
// Modules
// ─────────────────────────────────────────────────────────────────────────────

/// Module command client.
pub mod client;
/// Key and value codecs.
pub mod codec;
/// Option node contract and command assemblers.
pub mod commands;
/// Client configuration.
pub mod config;
/// Error types and result aliases.
pub mod error;
/// Argument sink, keyword vocabulary and RESP codec.
pub mod protocol;
/// Reply shapers.
pub mod reply;
/// FT.AGGREGATE option tree.
pub mod search;
/// Time-series option tree.
pub mod timeseries;
/// Request/reply transport.
pub mod transport;

// ─────────────────────────────────────────────────────────────────────────────
// Common Re-exports
// ─────────────────────────────────────────────────────────────────────────────

// Error handling
pub use error::{Error, Result};

// Assembly
pub use codec::{ByteCodec, RedisCodec, StringCodec};
pub use commands::{Command, CommandArgument};
pub use protocol::{CommandArgs, Frame, Keyword, RespParser};

// Connection
pub use client::ModuleClient;
pub use config::ClientConfig;
pub use transport::{Connection, Transport};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Crate version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default server port.
pub const DEFAULT_PORT: u16 = 6379;

/// Maximum bulk string size (512 MiB).
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of elements in a reply array.
pub const MAX_ARRAY_LEN: usize = 16 * 1024 * 1024;

/// Maximum nesting depth of reply arrays.
pub const MAX_NESTING: usize = 32;
