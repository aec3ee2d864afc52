use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::orchestrator::EngineSettings;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{validate_one_of, validate_positive_number, validate_url, Validate};

pub const DEFAULT_CONFIG_PATH: &str = "card-recommender.toml";

/// Longest accepted cache TTL (one year).
pub const MAX_CACHE_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub providers: ProvidersConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 300,
            max_entries: Some(10_000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Per-provider deadline.
    pub timeout_ms: u64,
    pub cscards: ProviderEndpoint,
    pub scoredcards: ProviderEndpoint,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3_000,
            cscards: ProviderEndpoint::new("http://localhost:8081/v1/cards"),
            scoredcards: ProviderEndpoint::new("http://localhost:8082/v2/creditcards"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub endpoint: String,
}

impl ProviderEndpoint {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            enabled: true,
            endpoint: endpoint.into(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.as_ref().display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::internal(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn provider_deadline(&self) -> Duration {
        Duration::from_millis(self.providers.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_seconds)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            provider_deadline: self.provider_deadline(),
            cache_ttl: self.cache_ttl(),
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("providers.timeout_ms", self.providers.timeout_ms, 1)?;

        if self.providers.cscards.enabled {
            validate_url("providers.cscards.endpoint", &self.providers.cscards.endpoint)?;
        }
        if self.providers.scoredcards.enabled {
            validate_url(
                "providers.scoredcards.endpoint",
                &self.providers.scoredcards.endpoint,
            )?;
        }

        if self.cache.enabled {
            validate_positive_number("cache.ttl_seconds", self.cache.ttl_seconds, 1)?;
            if self.cache.ttl_seconds > MAX_CACHE_TTL_SECONDS {
                return Err(AppError::InvalidConfigValueError {
                    field: "cache.ttl_seconds".to_string(),
                    value: self.cache.ttl_seconds.to_string(),
                    reason: format!("Value must be at most {}", MAX_CACHE_TTL_SECONDS),
                });
            }
            if let Some(max_entries) = self.cache.max_entries {
                validate_positive_number("cache.max_entries", max_entries as u64, 1)?;
            }
        }

        validate_one_of("logging.format", &self.logging.format, &["pretty", "json"])?;

        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(AppError::InvalidConfigValueError {
                field: "server.bind".to_string(),
                value: self.server.bind.clone(),
                reason: "Expected a socket address such as 127.0.0.1:5000".to_string(),
            });
        }

        Ok(())
    }
}
