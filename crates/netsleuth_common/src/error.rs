//! Error taxonomy for the correlation engine.
//!
//! Only two classes are allowed to stop a run: a missing/undecryptable
//! environment (before any network call) and a failed active-session
//! discovery query. Everything else is absorbed where it occurs and shows
//! up in the report as empty or null data.

use std::path::PathBuf;

/// A single upstream call that did not produce a usable payload.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("HTTP {0} from upstream")]
    Status(u16),

    #[error("could not decode response body: {0}")]
    Decode(String),
}

impl SourceError {
    /// Map a reqwest failure onto the transport/status split.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SourceError::Status(status.as_u16()),
            None => SourceError::Request(err.to_string()),
        }
    }
}

/// Startup-fatal configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment file not found: {0}")]
    Missing(PathBuf),

    #[error("could not read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not decrypt environment file: {0}")]
    Decrypt(String),

    #[error("decrypted environment is malformed: {0}")]
    Malformed(String),
}

/// Startup-fatal failure lookup store problems.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failure store not found: {0}")]
    Missing(PathBuf),

    #[error("failure store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors that abort a diagnostic run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The initial active-session query failed. Without it no MAC can be
    /// discovered, so there is nothing to correlate.
    #[error("active session discovery failed: {0}")]
    Discovery(SourceError),
}
