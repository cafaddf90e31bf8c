//! Settings loaded from `coterie.toml` and `COTERIE_*` environment variables

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::agent::DEFAULT_MAX_ITER;
use crate::error::CrewError;
use crate::llm::{LlmError, OpenAiClient, OpenAiConfig};

/// Project-level settings file
pub const CONFIG_FILE: &str = "coterie.toml";
/// Environment prefix; nested keys use `__`, e.g. `COTERIE_LLM__MODEL`
pub const ENV_PREFIX: &str = "COTERIE_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewSettings {
    pub llm: LlmSettings,
    pub agent: AgentSettings,
    pub logging: LoggingSettings,
}

/// OpenAI-compatible provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_base: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub temperature: Option<f32>,
    pub request_timeout_ms: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            api_key_env: "OPENAI_API_KEY".into(),
            temperature: None,
            request_timeout_ms: 120_000,
        }
    }
}

impl LlmSettings {
    /// Build a client, reading the key from `api_key_env`
    pub fn client(&self) -> Result<OpenAiClient, LlmError> {
        let key = std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(self.api_key_env.clone()))?;
        self.client_with_key(key)
    }

    pub fn client_with_key(&self, api_key: impl Into<String>) -> Result<OpenAiClient, LlmError> {
        OpenAiClient::new(OpenAiConfig {
            api_base: self.api_base.clone(),
            api_key: api_key.into(),
            model: self.model.clone(),
            temperature: self.temperature,
            request_timeout_ms: self.request_timeout_ms,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_iter: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self { max_iter: DEFAULT_MAX_ITER }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub verbose: bool,
}

impl CrewSettings {
    /// Load settings
    ///
    /// Priority (highest to lowest):
    /// 1. `COTERIE_*` environment variables
    /// 2. Explicit config path (if provided)
    /// 3. `./coterie.toml`
    /// 4. Default values
    pub fn load(config_path: Option<&Path>) -> Result<Self, CrewError> {
        Self::figment(config_path)
            .extract()
            .map_err(|e| CrewError::Config(e.to_string()))
    }

    /// Layered provider used by [`CrewSettings::load`]
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(CrewSettings::default()));

        let project = PathBuf::from(CONFIG_FILE);
        if project.exists() {
            figment = figment.merge(Toml::file(&project));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
