//! # Configuration
//!
//! Startup configuration resolved from the environment and a TOML secrets
//! file. The binary loads `.env` into the environment before this runs.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use crate::core::error::ConfigurationError;
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";
pub const DEFAULT_SECRETS_FILE: &str = ".secrets/secrets.toml";

const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(rename = "OPENAI_API_KEY")]
    openai_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Extra persona definitions (YAML), if configured
    pub personas_file: Option<PathBuf>,
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::resolve(|name| std::env::var(name).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn resolve<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = match var(API_KEY_VAR) {
            Some(key) => {
                info!("Using {API_KEY_VAR} from the environment");
                key
            }
            None => {
                let path = var("PERSONA_SECRETS_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SECRETS_FILE));
                let key = read_api_key_from_secrets(&path)?;
                info!("Using {API_KEY_VAR} from {}", path.display());
                key
            }
        };
        let api_key = validate_api_key(api_key)?;

        let model = var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let model = model.trim().to_string();

        let base_url = normalize_base_url(
            &var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;

        let personas_file = var("PERSONAS_FILE").map(PathBuf::from);

        Ok(Config {
            api_key,
            model,
            base_url,
            personas_file,
        })
    }
}

/// Read the API key from a TOML secrets file.
///
/// A missing file and a file without the key are reported separately so the
/// user knows which one to fix; both are fatal.
fn read_api_key_from_secrets(path: &Path) -> Result<String, ConfigurationError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigurationError::SecretsFileNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(ConfigurationError::SecretsFileUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let secrets: SecretsFile =
        toml::from_str(&contents).map_err(|e| ConfigurationError::SecretsFileUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    secrets
        .openai_api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ConfigurationError::MissingApiKey {
            path: path.to_path_buf(),
        })
}

fn validate_api_key(key: String) -> Result<String, ConfigurationError> {
    let key = key.trim().to_string();
    if key.chars().any(char::is_whitespace) {
        return Err(ConfigurationError::InvalidApiKey(
            "contains whitespace".to_string(),
        ));
    }
    if key.len() < 8 {
        return Err(ConfigurationError::InvalidApiKey(
            "too short to be a real key".to_string(),
        ));
    }
    Ok(key)
}

/// The completion client appends routes directly, so the base URL must end in `/`.
fn normalize_base_url(url: &str) -> Result<String, ConfigurationError> {
    let url = url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ConfigurationError::InvalidSetting {
            name: "OPENAI_BASE_URL",
            reason: format!("expected an http(s) URL, got '{url}'"),
        });
    }
    if url.ends_with('/') {
        Ok(url.to_string())
    } else {
        Ok(format!("{url}/"))
    }
}
