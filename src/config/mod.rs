#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use toml_config::{
    AppConfig, CacheConfig, LoggingConfig, ProviderEndpoint, ProvidersConfig, ServerConfig,
    DEFAULT_CONFIG_PATH,
};
