//! Error types for the starter kit component.
//!
//! Each concern gets its own enum so callers can tell a broken config file
//! apart from a ledger that could not be written.

use std::path::PathBuf;

/// Errors produced while loading or bootstrapping the kit configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No configuration file exists at the given path
    #[error("configuration file not found: {0}")]
    Missing(PathBuf),
    /// The file exists but could not be read or written
    #[error("configuration I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or has the wrong shape
    #[error("malformed configuration: {0}")]
    Malformed(#[from] toml::de::Error),
    /// A kit record is missing a field or carries an invalid count
    #[error("invalid kit entry #{index}: {reason}")]
    InvalidEntry { index: usize, reason: String },
}

/// Errors produced by the grant ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Reading or rewriting the ledger file failed
    #[error("ledger I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Identifiers must be non-empty and fit on a single line
    #[error("invalid player identifier: {0:?}")]
    InvalidId(String),
}

/// Failure reported by the host when an inventory add does not go through.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delivery to {player} failed: {reason}")]
pub struct DeliveryError {
    pub player: String,
    pub reason: String,
}

impl DeliveryError {
    pub fn new(player: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error for lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum KitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
