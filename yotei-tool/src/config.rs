use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use yotei_core::{DEFAULT_TIMEZONE, Tz};
use yotei_openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, OpenAiClient};

use crate::error::YtError;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8000";

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// IANA zone name, e.g. "Asia/Tokyo".
    pub timezone: Option<String>,
    pub timeout_secs: Option<u64>,
    pub listen: Option<String>,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn listen_addr(&self, cli: Option<String>) -> String {
        cli.or_else(|| self.listen.clone())
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string())
    }

    /// Builds the oracle client; `model` from the command line wins over the file.
    pub fn client(&self, api_key: String, model: Option<String>) -> OpenAiClient {
        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let model = model
            .or_else(|| self.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        OpenAiClient::with_base_url(api_key, base_url)
            .model(model)
            .timeout(self.timeout())
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("yotei").join("config.toml"))
}

pub fn parse_config(content: &str) -> Result<Config, YtError> {
    Ok(toml::from_str(content)?)
}

/// Reads the config file; a missing file yields the defaults.
pub fn load_config() -> Result<Config, YtError> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };

    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

fn pick_api_key(env: Option<String>, config: &Config) -> Result<String, YtError> {
    // First, the environment variable; then the config file.
    if let Some(key) = env.filter(|k| !k.is_empty()) {
        return Ok(key);
    }
    config
        .openai_api_key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or(YtError::ApiKeyNotFound)
}

pub fn load_api_key(config: &Config) -> Result<String, YtError> {
    pick_api_key(std::env::var("OPENAI_API_KEY").ok(), config)
}

pub fn resolve_timezone(cli: Option<&str>, config: &Config) -> Result<Tz, YtError> {
    match cli.or(config.timezone.as_deref()) {
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| YtError::InvalidTimezone(name.to_string())),
        None => Ok(DEFAULT_TIMEZONE),
    }
}
