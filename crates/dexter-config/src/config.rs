use std::sync::{LazyLock, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{atomic::{read_json_or_default, write_json_atomic}, error::Result, paths::config_path};

/// Default model used when no configuration file exists yet.
const DEFAULT_MODEL: &str = "llama3.2";
/// Default local ollama endpoint.
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434";

/// User-editable application configuration.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Name of the model the assistant talks to by default.
    pub model: String,

    /// Base URL of the runtime endpoint (e.g. `http://127.0.0.1:11434`).
    pub endpoint: String,

    /// Optional personality/system-prompt preset.
    pub personality: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            personality: None,
        }
    }
}

impl Config {
    /// Classifies the configured endpoint as local if its host is localhost,
    /// 127.0.0.1 or ::1 -- anything else is treated as remote.
    pub fn is_local_endpoint(&self) -> bool {
        let authority = self
            .endpoint
            .split("://")
            .nth(1)
            .unwrap_or(&self.endpoint);

        let host = if let Some(rest) = authority.strip_prefix('[') {
            rest.split(']').next().unwrap_or("")
        } else {
            authority
                .split(['/', ':'])
                .next()
                .unwrap_or("")
        };

        matches!(host, "localhost" | "127.0.0.1" | "::1")
    }

    pub fn load() -> Result<Self> {
        read_json_or_default(&config_path())
    }

    pub fn save(&self) -> Result<()> {
        write_json_atomic(&config_path(), self)?;
        info!("configuration saved to {}", config_path().display());
        Ok(())
    }
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub fn init() -> Result<()> {
    let config = Config::load()?;
    *CONFIG.write().unwrap() = Some(config);
    Ok(())
}

fn ensure_initialized() {
    let mut guard = CONFIG.write().unwrap();
    if guard.is_none() {
        *guard = Some(Config::default());
    }
}

pub fn get_config() -> Config {
    {
        let guard = CONFIG.read().unwrap();
        if let Some(config) = guard.as_ref() {
            return config.clone();
        }
    }
    ensure_initialized();
    CONFIG.read().unwrap().as_ref().unwrap().clone()
}

/// Sets the active model and persists the configuration.
pub fn set_model(model: &str) -> Result<()> {
    ensure_initialized();
    let mut guard = CONFIG.write().unwrap();
    let config = guard.as_mut().unwrap();
    config.model = model.to_string();
    config.save()
}
