//! Runtime configuration read from environment variables.
//!
//! | variable | default |
//! |---|---|
//! | `RENALGUARD_MODEL_DIR` | `models` |
//! | `RENALGUARD_MODEL_PUBKEY_B64` | unset (no signature required) |
//! | `RENALGUARD_MODEL_PUBKEY_B64_FILE` | unset |
//! | `RENALGUARD_LOG_MODE` | `auto` |
//! | `RENALGUARD_LOG_FILE` | `renalguard.log` |

use std::fs;
use std::path::PathBuf;

use crate::adapters::artifacts::verifying_key_from_b64;
use crate::adapters::{ArtifactLoader, LoadError};

pub const MODEL_DIR_ENV: &str = "RENALGUARD_MODEL_DIR";
pub const MODEL_PUBKEY_ENV: &str = "RENALGUARD_MODEL_PUBKEY_B64";
pub const MODEL_PUBKEY_FILE_ENV: &str = "RENALGUARD_MODEL_PUBKEY_B64_FILE";
pub const LOG_MODE_ENV: &str = "RENALGUARD_LOG_MODE";
pub const LOG_FILE_ENV: &str = "RENALGUARD_LOG_FILE";

const DEFAULT_MODEL_DIR: &str = "models";
const DEFAULT_LOG_FILE: &str = "renalguard.log";

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise.
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "stdout" => Self::Stdout,
            _ => Self::Auto,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_dir: PathBuf,
    /// Trusted Ed25519 key (base64). When set, artifacts must be signed.
    pub model_pubkey_b64: Option<String>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            model_pubkey_b64: None,
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let model_pubkey_b64 = non_empty(MODEL_PUBKEY_ENV).or_else(|| {
            let path = non_empty(MODEL_PUBKEY_FILE_ENV)?;
            match fs::read_to_string(path.trim()) {
                Ok(content) => Some(content.trim().to_string()),
                Err(e) => {
                    // Fail closed: an unreadable key file still requires a signature.
                    tracing::error!(error = %e, "Failed to read {MODEL_PUBKEY_FILE_ENV}");
                    Some(String::new())
                }
            }
        });

        Self {
            model_dir: non_empty(MODEL_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
            model_pubkey_b64,
            log_mode: non_empty(LOG_MODE_ENV)
                .map(|v| LogMode::parse(&v))
                .unwrap_or(defaults.log_mode),
            log_file: non_empty(LOG_FILE_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
        }
    }

    /// Artifact loader for the configured directory and trust anchor.
    ///
    /// # Errors
    /// Returns `LoadError::Integrity` if a public key is configured but
    /// cannot be decoded.
    pub fn artifact_loader(&self) -> Result<ArtifactLoader, LoadError> {
        let loader = ArtifactLoader::new(self.model_dir.clone());
        match &self.model_pubkey_b64 {
            Some(b64) => Ok(loader.with_trusted_key(verifying_key_from_b64(b64)?)),
            None => Ok(loader),
        }
    }
}
