//! Configuration types and loading
//!
//! Values are layered: built-in defaults, then an optional config file,
//! then `AQUAPLAN__*` environment variables, then the conventional
//! deployment variables (`DATABASE_URL`, `HOST`, `PORT`).

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Local database holding model bindings
    pub database: DatabaseConfig,

    /// Resource store (templates and networks)
    pub resource_store: ResourceStoreConfig,

    /// Defaults applied when model records are synthesized
    pub models: ModelDefaults,

    /// Template conventions
    pub templates: TemplateDefaults,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
    pub max_body_size_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Without a URL, model bindings are kept in memory
    pub url: Option<String>,
    pub pool_size: u32,
    pub pool_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ResourceStoreConfig {
    /// JSON file with templates and networks loaded at startup
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelDefaults {
    /// Scope given to model stubs created during a template switch
    pub default_scope: String,
}

/// Type names resolved as a template's default types when its layout does
/// not point at specific types
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateDefaults {
    pub inflow_type: String,
    pub outflow_type: String,
    pub junction_type: String,
}

impl Default for TemplateDefaults {
    fn default() -> Self {
        Self {
            inflow_type: "Inflow".to_string(),
            outflow_type: "Outflow".to_string(),
            junction_type: "Junction".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                request_timeout_seconds: 60,
                max_body_size_bytes: 16 * 1024 * 1024,
            },
            database: DatabaseConfig {
                url: None,
                pool_size: 10,
                pool_timeout_seconds: 5,
            },
            resource_store: ResourceStoreConfig::default(),
            models: ModelDefaults {
                default_scope: "public".to_string(),
            },
            templates: TemplateDefaults::default(),
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),
}

impl AppConfig {
    /// Default location of the optional config file (extension resolved by `config`)
    pub const DEFAULT_FILE: &'static str = "config/aquaplan";

    /// Load configuration from all layers
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::DEFAULT_FILE)
    }

    /// Load configuration using a specific config file path
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let layered = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("AQUAPLAN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = layered.try_deserialize()?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("'{}' is not a port number", port),
            })?;
        }
        if let Ok(path) = std::env::var("RESOURCE_STORE_SEED") {
            self.resource_store.seed_path = Some(path);
        }
        Ok(())
    }

    /// Get the server address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::SocketAddr;
        let ip: std::net::IpAddr = self.server.host.parse().unwrap_or([0, 0, 0, 0].into());
        SocketAddr::new(ip, self.server.port)
    }
}
