//! Wire protocol layer.
//!
//! The argument sink and keyword vocabulary used while assembling commands,
//! plus the RESP frame type and the reply parser used on the way back.

mod args;
pub(crate) mod frame;
mod keyword;
mod parser;

pub use args::{CommandArgs, Token};
pub use frame::Frame;
pub use keyword::{CommandType, Keyword};
pub use parser::{ParserLimits, RespParser, parse_frame};

/// CRLF terminator bytes.
pub const CRLF: &[u8] = b"\r\n";

/// Type markers for RESP.
pub mod markers {
    /// Simple string: +
    pub const SIMPLE_STRING: u8 = b'+';
    /// Error: -
    pub const ERROR: u8 = b'-';
    /// Integer: :
    pub const INTEGER: u8 = b':';
    /// Bulk string: $
    pub const BULK_STRING: u8 = b'$';
    /// Array: *
    pub const ARRAY: u8 = b'*';
    /// RESP3 null: _
    pub const NULL: u8 = b'_';
    /// RESP3 double: ,
    pub const DOUBLE: u8 = b',';
}
