use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use mentor_core::ChatOptions;
use mentor_core::prompt::MENTOR_PERSONA;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub agents: AgentsConfig,
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentsConfig {
    pub defaults: AgentDefaults,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentDefaults {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    /// Replaces the built-in CBT/DBT persona when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

impl AgentDefaults {
    #[must_use]
    pub fn chat_options(&self, model_override: Option<String>) -> ChatOptions {
        ChatOptions {
            model: model_override.unwrap_or_else(|| self.model.clone()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    #[must_use]
    pub fn persona(&self) -> &str {
        self.persona
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(MENTOR_PERSONA)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "ProviderConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ProviderConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pause before each retry of a failed request; empty disables retries.
    #[serde(default = "ProviderConfig::default_retry_delays_secs")]
    pub retry_delays_secs: Vec<u64>,
}

impl ProviderConfig {
    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }

    const fn default_request_timeout_secs() -> u64 {
        120
    }

    fn default_retry_delays_secs() -> Vec<u64> {
        vec![1, 2, 4]
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry_delays_secs
            .iter()
            .copied()
            .map(Duration::from_secs)
            .collect()
    }

    /// Configured key, or `env_value` (normally `$OPENAI_API_KEY`) when the
    /// file leaves it blank.
    pub fn resolve_api_key(&self, env_value: Option<String>) -> anyhow::Result<String> {
        if !self.api_key.trim().is_empty() {
            return Ok(self.api_key.clone());
        }
        env_value
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured. Set providers.openai.api_key or {API_KEY_ENV}."
                )
            })
    }

    pub fn api_key(&self) -> anyhow::Result<String> {
        self.resolve_api_key(std::env::var(API_KEY_ENV).ok())
    }
}

/// How turn-log size is measured against the token budget.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EstimatorKind {
    /// Characters divided by `chars_per_token`, rounded up per turn.
    #[default]
    ApproxTokens,
    /// Raw character count.
    Chars,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MemoryConfig {
    #[serde(default = "MemoryConfig::default_token_budget")]
    pub token_budget: usize,
    #[serde(default)]
    pub estimator: EstimatorKind,
    #[serde(default = "MemoryConfig::default_chars_per_token")]
    pub chars_per_token: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            token_budget: Self::default_token_budget(),
            estimator: EstimatorKind::default(),
            chars_per_token: Self::default_chars_per_token(),
        }
    }
}

impl MemoryConfig {
    const fn default_token_budget() -> usize {
        1000
    }

    const fn default_chars_per_token() -> usize {
        4
    }
}

const CONFIG_TEMPLATE: &str = r#"{
  "agents": {
    "defaults": {
      "model": "gpt-4",
      "max_tokens": 1024,
      "temperature": 0.5
    }
  },
  "providers": {
    "openai": {
      "api_key": "",
      "base_url": "https://api.openai.com/v1",
      "request_timeout_secs": 120,
      "retry_delays_secs": [1, 2, 4]
    }
  },
  "memory": {
    "token_budget": 1000,
    "estimator": "approx_tokens",
    "chars_per_token": 4
  }
}"#;

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("mentor"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'mentor init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, CONFIG_TEMPLATE)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Add your API key to the config file, or export {API_KEY_ENV}");
        println!("   2. Run 'mentor chat' to start a conversation");
        println!();
        println!("🔧 Configuration options:");
        println!("   - model: chat model to use (gpt-4, gpt-4o, ...)");
        println!("   - base_url: any OpenAI-compatible endpoint");
        println!("   - retry_delays_secs: backoff between retries of a failed request");
        println!("   - persona: optional replacement for the CBT/DBT mentor instruction");
        println!("   - memory.token_budget: size of recent history kept verbatim before it is summarized");
        println!();
        Ok(())
    }
}
