use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            filename: Some(default_database_filename()),
            auth_token: None,
            max_connections: None,
        }
    }
}

impl DatabaseConfig {
    pub fn db_type(&self) -> DbType {
        let url = self.connection_string();
        if REMOTE_SCHEMES.iter().any(|scheme| url.starts_with(scheme)) {
            DbType::Remote
        } else {
            DbType::Sqlite
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(ref url) = self.url {
            url.clone()
        } else if let Some(ref file) = self.filename {
            format!("sqlite://{}", file)
        } else {
            String::new()
        }
    }

    pub fn sqlite_path(&self) -> Option<String> {
        if let DbType::Sqlite = self.db_type() {
            let url = self.connection_string();
            Some(url.strip_prefix("sqlite://").unwrap_or(&url).to_string())
        } else {
            None
        }
    }

    pub fn remote_url(&self) -> Option<String> {
        match self.db_type() {
            DbType::Remote => Some(self.connection_string()),
            DbType::Sqlite => None,
        }
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(4).max(1)
    }
}

const REMOTE_SCHEMES: [&str; 5] = ["libsql://", "https://", "http://", "wss://", "ws://"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Sqlite,
    Remote,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        } else {
            Config::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.connection_string().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database connection string cannot be empty".to_string(),
            ));
        }

        if let Some(path) = self.database.sqlite_path() {
            if path.is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "database.url must name a file after sqlite://".to_string(),
                ));
            }
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "logging.level cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PIPELINES_DATABASE_URL") {
            self.database.url = Some(value);
        }
        if let Some(value) = lookup("PIPELINES_DATABASE_AUTH_TOKEN") {
            self.database.auth_token = Some(value);
        }
        if let Some(value) = lookup("PIPELINES_PORT") {
            self.server.port = value.parse().map_err(|_| {
                ConfigError::InvalidConfig(format!("PIPELINES_PORT is not a valid port: {value}"))
            })?;
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    5173
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_filename() -> String {
    "pipelines.db".to_string()
}
