//! Client configuration.

use crate::error::ConfigError;
use crate::protocol::ParserLimits;
use crate::{DEFAULT_PORT, MAX_ARRAY_LEN, MAX_BULK_SIZE, MAX_NESTING};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default host.
pub const DEFAULT_HOST: &str = "localhost";

/// Connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    // === Endpoint ===
    /// Host name or address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Use TLS (`rediss://`)
    pub tls: bool,

    // === Session ===
    /// ACL user name; only sent together with a password
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Database index selected after connecting
    pub database: u32,
    /// Name set with CLIENT SETNAME
    pub client_name: Option<String>,

    // === Timeouts ===
    /// Time allowed for the TCP handshake
    pub connect_timeout: Duration,
    /// Time allowed for one reply; `None` waits forever
    pub command_timeout: Option<Duration>,

    // === Reply limits ===
    /// Largest accepted bulk string
    pub max_bulk_len: usize,
    /// Largest accepted array
    pub max_array_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tls: false,
            username: None,
            password: None,
            database: 0,
            client_name: None,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Some(Duration::from_secs(60)),
            max_bulk_len: MAX_BULK_SIZE,
            max_array_len: MAX_ARRAY_LEN,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable TLS.
    pub fn tls(mut self, enabled: bool) -> Self {
        self.tls = enabled;
        self
    }

    /// Set the ACL user name.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the database index.
    pub fn database(mut self, database: u32) -> Self {
        self.database = database;
        self
    }

    /// Set the client name.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the command timeout.
    pub fn command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the largest accepted bulk string.
    pub fn max_bulk_len(mut self, bytes: usize) -> Self {
        self.max_bulk_len = bytes;
        self
    }

    /// Set the largest accepted array.
    pub fn max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }

    /// Password, if one is set and not empty.
    pub(crate) fn credentials(&self) -> Option<(Option<&str>, &str)> {
        let password = self.password.as_deref().filter(|p| !p.is_empty())?;
        Some((self.username.as_deref(), password))
    }

    /// Reply parser limits derived from this configuration.
    pub fn parser_limits(&self) -> ParserLimits {
        ParserLimits {
            max_bulk_len: self.max_bulk_len,
            max_array_len: self.max_array_len,
            max_depth: MAX_NESTING,
        }
    }

    /// Render as a `redis://` or `rediss://` URI.
    ///
    /// Credentials appear only when a password is set, and the user name only
    /// alongside it. The database appears only when it is not 0.
    pub fn to_uri(&self) -> String {
        let mut uri = String::from(if self.tls { "rediss://" } else { "redis://" });
        if let Some((username, password)) = self.credentials() {
            if let Some(username) = username {
                uri.push_str(&escape(username));
            }
            uri.push(':');
            uri.push_str(&escape(password));
            uri.push('@');
        }
        let _ = write!(uri, "{}:{}", self.host, self.port);
        if self.database != 0 {
            let _ = write!(uri, "/{}", self.database);
        }
        uri
    }

    /// Load configuration from a file (redis.conf style).
    ///
    /// # Format
    /// ```text
    /// # Comment
    /// host cache.internal
    /// port 6380
    /// client-name "reporting worker"
    /// ```
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (directive, value) =
                Self::parse_line(line).ok_or_else(|| ConfigError::ParseError {
                    line: line_num + 1,
                    message: "Invalid directive format".to_string(),
                })?;

            config.apply_directive(&directive.to_lowercase(), value, line_num + 1)?;
        }

        Ok(config)
    }

    fn parse_line(line: &str) -> Option<(&str, &str)> {
        let mut parts = line.splitn(2, char::is_whitespace);
        let directive = parts.next()?.trim();
        let value = parts.next().map_or("", str::trim);

        let value = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            &value[1..value.len() - 1]
        } else {
            value
        };

        Some((directive, value))
    }

    fn apply_directive(&mut self, directive: &str, value: &str, line: usize) -> Result<(), ConfigError> {
        match directive {
            "host" => self.host = value.to_string(),
            "port" => self.port = parse_number(value, line)?,
            "tls" => self.tls = parse_bool(value, line)?,
            "user" | "username" => self.username = non_empty(value),
            "password" | "requirepass" => self.password = non_empty(value),
            "database" | "db" => self.database = parse_number(value, line)?,
            "client-name" => self.client_name = non_empty(value),
            "connect-timeout" => {
                self.connect_timeout = Duration::from_millis(parse_number(value, line)?);
            }
            "timeout" => {
                let ms: u64 = parse_number(value, line)?;
                self.command_timeout = (ms > 0).then(|| Duration::from_millis(ms));
            }
            "proto-max-bulk-len" => self.max_bulk_len = parse_memory(value, line)?,
            "max-array-len" => self.max_array_len = parse_number(value, line)?,
            _ => {
                return Err(ConfigError::ParseError {
                    line,
                    message: format!("Unknown directive: {directive}"),
                });
            }
        }
        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Percent-encode everything outside the URI unreserved set.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(char::from(b));
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

// Helper functions for parsing

fn parse_bool(value: &str, line: usize) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        _ => Err(ConfigError::ParseError {
            line,
            message: format!("Invalid boolean: {value}"),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, line: usize) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::ParseError {
        line,
        message: format!("Invalid number: {value}"),
    })
}

fn parse_memory(value: &str, line: usize) -> Result<usize, ConfigError> {
    let value = value.trim().to_lowercase();

    let (num_str, multiplier) = if let Some(n) = value.strip_suffix("gb") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = value.strip_suffix("mb") {
        (n, 1024 * 1024)
    } else if let Some(n) = value.strip_suffix("kb") {
        (n, 1024)
    } else if let Some(n) = value.strip_suffix('g') {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = value.strip_suffix('m') {
        (n, 1024 * 1024)
    } else if let Some(n) = value.strip_suffix('k') {
        (n, 1024)
    } else {
        (value.as_str(), 1)
    };

    let num: usize = num_str.trim().parse().map_err(|_| ConfigError::ParseError {
        line,
        message: format!("Invalid memory value: {value}"),
    })?;

    num.checked_mul(multiplier).ok_or_else(|| ConfigError::ParseError {
        line,
        message: format!("Memory value out of range: {value}"),
    })
}
