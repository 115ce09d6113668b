//! Environment configuration for both upstream systems.
//!
//! The one-time builder utility (separate tool) captures URLs and service
//! account credentials and writes them Fernet-encrypted to `env_config.txt`
//! next to its key file `mykey.key`. This module only consumes that output:
//! decrypt, parse, and hand the result to the clients as an explicit struct.
//! Nothing here is global state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// Encrypted environment file written by the builder.
pub const ENV_CONFIG_FILE: &str = "env_config.txt";

/// Fernet key file written by the builder.
pub const KEY_FILE: &str = "mykey.key";

/// Failure lookup store file, populated by the builder's catalog import.
pub const FAILURE_DB_FILE: &str = "failure_db";

/// Decrypted upstream endpoints and credentials.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub ise_base_url: String,
    pub ise_username: String,
    pub ise_password: String,
    pub dnac_base_url: String,
    pub dnac_username: String,
    pub dnac_password: String,
}

impl EnvConfig {
    /// Load and decrypt the environment from `dir`.
    ///
    /// The decrypted payload is a JSON array of six strings in builder
    /// order: ISE URL, ISE user, ISE password, DNAC URL, DNAC user, DNAC
    /// password.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let env_path = dir.join(ENV_CONFIG_FILE);
        let key_path = dir.join(KEY_FILE);

        if !env_path.exists() {
            return Err(ConfigError::Missing(env_path));
        }

        let key = read_trimmed(&key_path)?;
        let token = read_trimmed(&env_path)?;

        let fernet = fernet::Fernet::new(&key)
            .ok_or_else(|| ConfigError::Decrypt("key file is not a valid Fernet key".into()))?;

        let plaintext = fernet
            .decrypt(&token)
            .map_err(|e| ConfigError::Decrypt(e.to_string()))?;

        let fields: Vec<String> = serde_json::from_slice(&plaintext)
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;

        if fields.len() != 6 {
            return Err(ConfigError::Malformed(format!(
                "expected 6 environment fields, found {}",
                fields.len()
            )));
        }

        let mut fields = fields.into_iter();
        // Field order is fixed by the builder.
        let config = EnvConfig {
            ise_base_url: strip_trailing_slash(fields.next().unwrap_or_default()),
            ise_username: fields.next().unwrap_or_default(),
            ise_password: fields.next().unwrap_or_default(),
            dnac_base_url: strip_trailing_slash(fields.next().unwrap_or_default()),
            dnac_username: fields.next().unwrap_or_default(),
            dnac_password: fields.next().unwrap_or_default(),
        };

        debug!(
            ise = %config.ise_base_url,
            dnac = %config.dnac_base_url,
            "environment decrypted"
        );

        Ok(config)
    }
}

fn read_trimmed(path: &PathBuf) -> Result<String, ConfigError> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|source| ConfigError::Unreadable {
            path: path.clone(),
            source,
        })
}

fn strip_trailing_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Tunables for the correlation engine itself.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Maximum concurrent upstream requests per fan-out wave.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Auth-status history lookback window in seconds.
    #[serde(default = "default_lookback_secs")]
    pub lookback_secs: u64,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_max_in_flight() -> usize {
    8
}

fn default_lookback_secs() -> u64 {
    86_400
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            lookback_secs: default_lookback_secs(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_env(dir: &Path, fields: &[&str]) {
        let key = fernet::Fernet::generate_key();
        let fernet = fernet::Fernet::new(&key).unwrap();
        let payload = serde_json::to_vec(fields).unwrap();
        let token = fernet.encrypt(&payload);

        fs::write(dir.join(KEY_FILE), key).unwrap();
        fs::write(dir.join(ENV_CONFIG_FILE), token).unwrap();
    }

    #[test]
    fn test_load_decrypts_six_tuple() {
        let dir = tempfile::tempdir().unwrap();
        write_env(
            dir.path(),
            &[
                "https://ise.example.net/",
                "ise-svc",
                "ise-secret",
                "https://dnac.example.net",
                "dnac-svc",
                "dnac-secret",
            ],
        );

        let config = EnvConfig::load(dir.path()).unwrap();
        assert_eq!(config.ise_base_url, "https://ise.example.net");
        assert_eq!(config.ise_username, "ise-svc");
        assert_eq!(config.dnac_base_url, "https://dnac.example.net");
        assert_eq!(config.dnac_password, "dnac-secret");
    }

    #[test]
    fn test_load_missing_env_is_fatal_setup() {
        let dir = tempfile::tempdir().unwrap();
        let err = EnvConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_load_rejects_wrong_field_count() {
        let dir = tempfile::tempdir().unwrap();
        write_env(dir.path(), &["https://ise.example.net", "only", "three"]);

        let err = EnvConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(_)));
    }

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.lookback_secs, 86_400);
        assert_eq!(config.request_timeout_secs, 15);
    }
}
