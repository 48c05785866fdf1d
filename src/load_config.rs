//! `load_config` module: loads the optional YAML config file and layers environment overrides
//! on top, producing the [`AppConfig`] used by both the server and the CLI.
//!
//! This module is the only place where untrusted YAML and environment strings are parsed into
//! typed settings.
//!
//! # Responsibilities
//! - Parse an optional YAML file (every key optional, missing keys keep their defaults)
//! - Inject secrets from the environment only (`FIREWORKS_API_KEY` is never read from YAML)
//! - Apply environment overrides (`PORT`, `POLYGLOT_*`) after the file
//! - Fail with a clear diagnostic on unreadable files, bad YAML or unparsable numbers
//!
//! # Errors
//! All errors use `anyhow::Error` and surface at the CLI boundary.

use anyhow::{Context, Result};
use polyglot_forge_core::batch::{BatchSettings, DEFAULT_PACE};
use polyglot_forge_core::convert::DEFAULT_MAX_RETRIES;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};

pub const DEFAULT_PORT: u16 = 5050;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 8 * 1024 * 1024;
pub const DEFAULT_BASE_URL: &str = "https://api.fireworks.ai/inference/v1";
pub const DEFAULT_MODEL: &str =
    "accounts/sentientfoundation/models/dobby-unhinged-llama-3-3-70b-new";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub provider: ProviderSection,
    pub conversion: ConversionSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub body_limit_bytes: usize,
    /// Comma-separated origins; wildcard CORS when unset.
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: DEFAULT_PORT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            cors_allowed_origins: None,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    #[serde(skip)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub retry_initial_delay_ms: u64,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            timeout_secs: 120,
            retry_initial_delay_ms: 2000,
        }
    }
}

// Hand-written so the key never ends up in logs.
impl std::fmt::Debug for ProviderSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSection")
            .field("api_key_set", &self.api_key.is_some())
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_initial_delay_ms", &self.retry_initial_delay_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversionSection {
    pub max_retries: u32,
    pub pace_ms: u64,
}

impl Default for ConversionSection {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            pace_ms: DEFAULT_PACE.as_millis() as u64,
        }
    }
}

impl AppConfig {
    pub fn batch_settings(&self) -> BatchSettings {
        let mut settings = BatchSettings::new(self.provider.model.clone());
        settings.convert.max_retries = self.conversion.max_retries;
        settings.pace = Duration::from_millis(self.conversion.pace_ms);
        settings
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Loads the YAML config file (if any), then applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path.as_ref())?,
        None => {
            info!("No config file given, using defaults");
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config)?;

    info!(
        bind = %config.bind_address(),
        model = %config.provider.model,
        api_key_set = config.provider.api_key.is_some(),
        max_retries = config.conversion.max_retries,
        pace_ms = config.conversion.pace_ms,
        "Config loaded and merged successfully"
    );
    Ok(config)
}

fn read_config_file(path_ref: &Path) -> Result<AppConfig> {
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str::<AppConfig>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn apply_env_overrides(config: &mut AppConfig) -> Result<()> {
    if let Some(key) = env_var("FIREWORKS_API_KEY") {
        info!("FIREWORKS_API_KEY found in env");
        config.provider.api_key = Some(key);
    }
    if let Some(port) = parse_env::<u16>("PORT")? {
        config.server.port = port;
    }
    if let Some(model) = env_var("POLYGLOT_MODEL") {
        config.provider.model = model;
    }
    if let Some(base_url) = env_var("POLYGLOT_BASE_URL") {
        config.provider.base_url = base_url;
    }
    if let Some(origins) = env_var("POLYGLOT_CORS_ORIGINS") {
        config.server.cors_allowed_origins = Some(origins);
    }
    if let Some(retries) = parse_env::<u32>("POLYGLOT_MAX_RETRIES")? {
        config.conversion.max_retries = retries;
    }
    if let Some(pace) = parse_env::<u64>("POLYGLOT_PACE_MS")? {
        config.conversion.pace_ms = pace;
    }
    Ok(())
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_var(key) {
        Some(raw) => {
            let parsed = raw.trim().parse::<T>().map_err(|e| {
                error!(error = %e, var = key, raw = %raw, "Environment variable has an invalid value");
                e
            });
            parsed
                .map(Some)
                .with_context(|| format!("{key} must be a valid number, got {raw:?}"))
        }
        None => Ok(None),
    }
}
