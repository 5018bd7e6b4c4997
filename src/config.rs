//! Worker configuration
//!
//! Loaded from a TOML file. The backend credentials are validated as
//! non-blank at load time; the access token itself is resolved from an
//! environment variable at runtime so it never lives in the config file.
//!
//! The currency table maps ISO codes to the rate service's lowercase codes.
//! It is configuration, not code: adding a currency is a data change.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Main worker configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerConfig {
    #[serde(default)]
    pub server: ServerSection,
    pub backend: BackendSection,
    #[serde(default)]
    pub currency: CurrencySection,
    #[serde(default)]
    pub http: HttpSection,
}

/// Inbound webhook server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// Port the webhook endpoint listens on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

/// Workflow backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendSection {
    /// Base URL of the workflow backend REST API
    pub endpoint: String,
    /// Application identifier presented on every outbound call
    pub application_id: String,
    /// Environment variable containing the access token
    pub token_env: String,
}

/// Currency conversion settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrencySection {
    /// Base URL of the external rate lookup service
    #[serde(default = "default_rate_endpoint")]
    pub rate_endpoint: String,
    /// Supported currencies: ISO code -> rate service code
    #[serde(default = "default_currency_codes")]
    pub codes: HashMap<String, String>,
}

impl Default for CurrencySection {
    fn default() -> Self {
        Self {
            rate_endpoint: default_rate_endpoint(),
            codes: default_currency_codes(),
        }
    }
}

fn default_rate_endpoint() -> String {
    "https://cdn.jsdelivr.net/gh/fawazahmed0/currency-api@1/latest/currencies".to_string()
}

fn default_currency_codes() -> HashMap<String, String> {
    HashMap::from([
        ("EUR".to_string(), "eur".to_string()),
        ("USD".to_string(), "usd".to_string()),
        ("GBP".to_string(), "gbp".to_string()),
    ])
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpSection {
    /// Timeout for every outbound call, in seconds. Generous on purpose:
    /// the upstream platform tolerates slow deliveries better than spurious
    /// timeout failures.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    500
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WorkerConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: WorkerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_not_blank("backend.endpoint", &self.backend.endpoint)?;
        validate_not_blank("backend.application_id", &self.backend.application_id)?;
        validate_not_blank("backend.token_env", &self.backend.token_env)?;

        Url::parse(&self.backend.endpoint).map_err(|e| {
            ConfigError::InvalidConfig(format!("backend.endpoint is not a valid URL: {e}"))
        })?;
        Url::parse(&self.currency.rate_endpoint).map_err(|e| {
            ConfigError::InvalidConfig(format!("currency.rate_endpoint is not a valid URL: {e}"))
        })?;

        if self.currency.codes.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "currency.codes must declare at least one supported currency".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the backend access token from the configured environment variable.
    ///
    /// A variable that is set but blank is rejected here, at startup, instead
    /// of surfacing later as authentication failures on every backend call.
    pub fn get_backend_token(&self) -> Result<String, ConfigError> {
        let token = std::env::var(&self.backend.token_env)
            .map_err(|_| ConfigError::EnvVarNotFound(self.backend.token_env.clone()))?;

        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::InvalidConfig(format!(
                "token in {} must not be blank",
                self.backend.token_env
            )));
        }

        Ok(token.to_string())
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[backend]
endpoint = "https://workflow.example.com/v1"
application_id = "test-application"
token_env = "WORKFLOW_TOKEN"
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

fn validate_not_blank(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(format!(
            "{name} must not be blank"
        )));
    }
    Ok(())
}
