use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use parley::inference::DEFAULT_MAX_TOKENS;
use parley::providers::configs::{AnthropicProviderConfig, ANTHROPIC_HOST, ANTHROPIC_MODEL};
use serde::Deserialize;
use std::env;

/// Values given on the command line. They win over everything else.
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub host: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub system: Option<String>,
}

impl ProviderSettings {
    // Convert to the parley provider config
    pub fn into_config(self) -> Result<AnthropicProviderConfig, ConfigError> {
        let api_key = self.api_key.ok_or_else(|| ConfigError::MissingEnvVar {
            env_var: to_env_var("provider.api_key"),
        })?;
        Ok(AnthropicProviderConfig {
            host: self.host,
            api_key,
            model: self.model,
            temperature: self.temperature,
            system: self.system,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    pub provider: ProviderSettings,
}

impl Settings {
    /// Defaults, then `ANTHROPIC_API_KEY`, then `PARLEY_*` variables, then `overrides`.
    pub fn load(overrides: Overrides) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("max_tokens", u64::from(default_max_tokens()))?
            .set_default("provider.host", default_host())?
            .set_default("provider.model", default_model())?;

        if let Ok(api_key) = env::var("ANTHROPIC_API_KEY") {
            builder = builder.set_default("provider.api_key", api_key)?;
        }

        let config = builder
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("provider.api_key", overrides.api_key)?
            .set_override_option("provider.host", overrides.host)?
            .set_override_option("provider.model", overrides.model)?
            .set_override_option("max_tokens", overrides.max_tokens.map(u64::from))?
            .build()?;

        config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            match err {
                config::ConfigError::NotFound(field) => ConfigError::MissingEnvVar {
                    env_var: to_env_var(&field),
                },
                other => ConfigError::Other(other),
            }
        })
    }
}

fn default_host() -> String {
    ANTHROPIC_HOST.to_string()
}

fn default_model() -> String {
    ANTHROPIC_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
