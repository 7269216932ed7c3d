//! # Server Configuration
//!
//! Optional TOML configuration for the HTTP server. Values present in the
//! file override the CLI defaults; anything absent falls back to the
//! command-line arguments.
//!
//! ```toml
//! # plotledger.toml
//! host = "0.0.0.0"
//! port = 9090
//! database = "/var/lib/plotledger/ledger.redb"
//! ```

use plotledger_core::LedgerError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Server settings loaded from a TOML file. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
}

impl ServerConfig {
    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        toml::from_str(&contents).map_err(|e| {
            LedgerError::SerializationError(format!(
                "Invalid config '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
