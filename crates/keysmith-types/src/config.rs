//! Configuration types and structures.

use serde::{Deserialize, Serialize};

/// Sealer configuration: the commands used to encrypt and decrypt artifacts.
///
/// ```yaml
/// sealer:
///   encrypt: [rage, -e, -R, keys/recipients.txt]
///   decrypt: [rage, -d, -i, keys/master.txt]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SealerConfig {
    /// Reads plaintext on stdin, writes ciphertext to stdout
    pub encrypt: Vec<String>,
    /// Receives the artifact path as last argument, writes plaintext to stdout
    pub decrypt: Vec<String>,
}

/// Log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log file path
    pub path: String,
    /// Log level for this output
    pub level: crate::LogLevel,
    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    Pretty,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}
