//! Error types for viator-modules.
//!
//! This module provides the error hierarchy shared by the option builders,
//! the command assemblers, the reply shapers and the connection. Builder
//! usage errors are raised while an option tree is being configured, so a
//! command that reaches the wire is always structurally valid.

use std::io;
use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// Result type alias for viator-modules operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for viator-modules.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid builder configuration
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    /// Internal encoder inconsistency
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Malformed RESP data
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Reply does not have the shape the command produces
    #[error("reply error: {0}")]
    Reply(#[from] ReplyError),

    /// Error reply sent by the server
    #[error("server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Connection errors
    #[error("connection error: {0}")]
    Connection(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No reply within the configured command timeout
    #[error("timed out waiting for reply")]
    Timeout,
}

/// Builder usage errors.
///
/// Raised by the call that introduced the invalid configuration, naming the
/// clause and field so the call can be fixed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// Mutually exclusive options were combined
    #[error("invalid configuration for {clause}: {reason}")]
    InvalidConfiguration {
        /// Clause being configured
        clause: &'static str,
        /// What was wrong
        reason: String,
    },

    /// A scalar field holds an unusable value
    #[error("invalid argument '{field}' for {clause}: {reason}")]
    InvalidArgument {
        /// Clause being configured
        clause: &'static str,
        /// Offending field
        field: &'static str,
        /// What was wrong
        reason: String,
    },
}

impl UsageError {
    /// Shorthand for [`UsageError::InvalidConfiguration`].
    pub fn configuration(clause: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            clause,
            reason: reason.into(),
        }
    }

    /// Shorthand for [`UsageError::InvalidArgument`].
    pub fn argument(clause: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            clause,
            field,
            reason: reason.into(),
        }
    }
}

/// Internal encoder inconsistencies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// A node appended a different number of tokens than it declared
    #[error("{clause} declared {declared} tokens but emitted {emitted}")]
    ArityMismatch {
        /// Clause that misbehaved
        clause: &'static str,
        /// Declared arity
        declared: usize,
        /// Tokens actually appended
        emitted: usize,
    },
}

/// Protocol-level errors during RESP parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Invalid RESP data type marker
    #[error("invalid type marker: {0:?}")]
    InvalidTypeMarker(u8),

    /// Invalid UTF-8 in a string
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,

    /// Invalid integer format
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid float format
    #[error("invalid float: {0}")]
    InvalidFloat(String),

    /// Bulk string too large
    #[error("bulk string too large: {len} bytes (max: {max})")]
    BulkTooLarge {
        /// Announced length in bytes
        len: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Too many array elements
    #[error("too many array elements: {count} (max: {max})")]
    TooManyElements {
        /// Announced element count
        count: usize,
        /// Maximum allowed count
        max: usize,
    },

    /// Nesting deeper than the parser accepts
    #[error("reply nested deeper than {0} levels")]
    TooDeep(usize),

    /// Missing CRLF terminator
    #[error("missing CRLF terminator")]
    MissingCrlf,

    /// Incomplete frame - need more data
    #[error("incomplete frame, need more data")]
    Incomplete,
}

/// Reply shape errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    /// A frame of a different kind was expected
    #[error("expected {expected}, got {actual}")]
    UnexpectedType {
        /// What the shaper needed
        expected: &'static str,
        /// What the reply contained
        actual: String,
    },

    /// An array had the wrong number of elements
    #[error("expected {expected} elements in {context}, got {actual}")]
    UnexpectedLength {
        /// Which record was being read
        context: &'static str,
        /// Required element count
        expected: usize,
        /// Actual element count
        actual: usize,
    },

    /// A numeric field could not be coerced
    #[error("invalid number in {context}: {value}")]
    InvalidNumber {
        /// Which record was being read
        context: &'static str,
        /// Raw text
        value: String,
    },
}

/// Configuration parsing error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O error reading config file
    #[error("config I/O error: {0}")]
    IoError(String),

    /// Parse error in config file
    #[error("config error at line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What was wrong
        message: String,
    },

    /// Option not supported by this client
    #[error("unsupported option: {0}")]
    Unsupported(String),
}

impl Error {
    /// Returns true if resending the same command could succeed.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Connection(_) | Error::Timeout)
    }

    /// Returns true if the caller built an invalid command.
    #[inline]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Error::Usage(_))
    }

    /// Returns true if the failure came from the server or the transport.
    #[inline]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Error::Server(_) | Error::Io(_) | Error::Connection(_) | Error::Timeout
        )
    }
}

impl From<ParseIntError> for ProtocolError {
    fn from(e: ParseIntError) -> Self {
        ProtocolError::InvalidInteger(e.to_string())
    }
}

impl From<ParseFloatError> for ProtocolError {
    fn from(e: ParseFloatError) -> Self {
        ProtocolError::InvalidFloat(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_error_display_names_clause_and_field() {
        let err = Error::from(UsageError::argument("LOAD", "identifier", "must not be empty"));
        assert_eq!(
            err.to_string(),
            "usage error: invalid argument 'identifier' for LOAD: must not be empty"
        );
    }

    #[test]
    fn test_protocol_error_display() {
        let err = ProtocolError::InvalidTypeMarker(b'X');
        assert_eq!(err.to_string(), "invalid type marker: 88");
    }

    #[test]
    fn test_error_classification() {
        let usage = Error::from(UsageError::configuration("LOAD", "conflict"));
        assert!(usage.is_usage_error());
        assert!(!usage.is_transport_error());
        assert!(!usage.is_retryable());

        let server = Error::Server("ERR syntax error".to_string());
        assert!(server.is_transport_error());
        assert!(!server.is_retryable());

        assert!(Error::Timeout.is_retryable());
    }

    #[test]
    fn test_arity_mismatch_display() {
        let err = EncodingError::ArityMismatch {
            clause: "LOAD",
            declared: 3,
            emitted: 2,
        };
        assert_eq!(err.to_string(), "LOAD declared 3 tokens but emitted 2");
    }
}
