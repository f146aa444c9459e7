//! Server configuration.
//!
//! Loaded in layers, later sources overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. `sponsora.yaml` in the working directory, if present
//! 3. the file named by `SPONSORA_CONFIG`, if set
//! 4. `SPONSORA__*` environment variables, e.g. `SPONSORA__HTTP__PORT=8080`

use ::config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use sponsora_db::DbConfig;
use sponsora_donations::DonationsConfig;

/// Environment variable naming an extra configuration file.
pub const CONFIG_ENV_VAR: &str = "SPONSORA_CONFIG";

/// Prefix of configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "SPONSORA";

const DEFAULT_CONFIG_FILE: &str = "sponsora";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

impl HttpConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub database: DbConfig,
    pub donations: DonationsConfig,
}

impl ServerConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(
            File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false),
        );

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&path, FileFormat::Yaml).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
