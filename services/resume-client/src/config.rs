//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The account password is loaded from the RESUME_PASSWORD env var or
//! password_file, never stored in the TOML directly.

use common::Secret;
use resume_api::ClientSettings;
use resume_api::constants::{ANALYZE_TIMEOUT, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PASSWORD_ENV: &str = "RESUME_PASSWORD";
const DEFAULT_CONFIG_FILE: &str = "resume-client.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Backend connection settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_analyze_timeout")]
    pub analyze_timeout_secs: u64,
    /// Bound on a single session refresh; unset waits for the backend timeout
    #[serde(default)]
    pub refresh_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            analyze_timeout_secs: default_analyze_timeout(),
            refresh_timeout_secs: None,
        }
    }
}

/// Account used to sign in before running a command
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(skip)]
    pub password: Option<Secret<String>>,
    /// Path to a file containing the password (alternative to RESUME_PASSWORD)
    #[serde(default)]
    pub password_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_analyze_timeout() -> u64 {
    ANALYZE_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Password resolution order:
    /// 1. RESUME_PASSWORD env var
    /// 2. password_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.validate()?;

        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            config.credentials.password = Some(Secret::new(password));
        } else if let Some(ref password_file) = config.credentials.password_file {
            let password = std::fs::read_to_string(password_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read password_file {}: {e}",
                    password_file.display()
                ))
            })?;
            let password = password.trim_end_matches(['\r', '\n']).to_owned();
            if !password.is_empty() {
                config.credentials.password = Some(Secret::new(password));
            }
        }

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        let api = &self.api;
        if !api.base_url.starts_with("http://") && !api.base_url.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                api.base_url
            )));
        }
        if api.timeout_secs == 0 {
            return Err(common::Error::InvalidValue {
                field: "timeout_secs",
                reason: "must be greater than 0".into(),
            });
        }
        if api.analyze_timeout_secs == 0 {
            return Err(common::Error::InvalidValue {
                field: "analyze_timeout_secs",
                reason: "must be greater than 0".into(),
            });
        }
        if api.refresh_timeout_secs == Some(0) {
            return Err(common::Error::InvalidValue {
                field: "refresh_timeout_secs",
                reason: "must be greater than 0 when set".into(),
            });
        }
        Ok(())
    }

    /// Settings for `ApiClient::connect`.
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
            analyze_timeout: Duration::from_secs(self.api.analyze_timeout_secs),
            refresh_timeout: self.api.refresh_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }
}
