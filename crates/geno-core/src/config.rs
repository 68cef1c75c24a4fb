//! Configuration for geno.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`GENO__` prefix, `__` separator,
//!    e.g. `GENO__NEO4J__PASSWORD`)
//! 2. Config file (`geno.toml` by default, or any format `config` reads)
//! 3. Defaults
//!
//! Command-line overrides are applied by the binary on top of this.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Constraints;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Server must be provided as host:port")]
    MissingServer,

    #[error("Server {0:?} must contain an address and a port separated by a colon")]
    ServerWithoutPort(String),

    #[error("Database name {0:?} must be between 3 and 63 characters")]
    DatabaseNameLength(String),

    #[error("Database name {0:?} must start with a letter or digit")]
    DatabaseNameStart(String),

    #[error("Database name {0:?} may only contain letters, digits, '.' and '-'")]
    DatabaseNameCharacters(String),

    #[error("Username {0:?} must start with a letter or digit")]
    UsernameStart(String),

    #[error("Username {0:?} may only contain letters, digits, '.' and '-'")]
    UsernameCharacters(String),

    #[error("Password must be provided via configuration or GENO__NEO4J__PASSWORD")]
    MissingPassword,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenoConfig {
    /// Target database (default: "neo4j").
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub neo4j: Neo4jSettings,

    /// Known constraints per database, used when the live catalog is not
    /// refreshed.
    #[serde(default)]
    pub constraints: HashMap<String, Constraints>,
}

/// Connection settings, the `[neo4j]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jSettings {
    /// host:port of the Bolt endpoint.
    #[serde(default = "default_server")]
    pub server: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

fn default_database() -> String {
    "neo4j".to_string()
}

fn default_server() -> String {
    "localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> usize {
    16
}

fn default_fetch_size() -> usize {
    256
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            server: default_server(),
            user: default_user(),
            password: String::new(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl Default for GenoConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            neo4j: Neo4jSettings::default(),
            constraints: HashMap::new(),
        }
    }
}

impl GenoConfig {
    /// Load from `<file_prefix>.{toml,json,yaml,...}` (optional) and the
    /// `GENO` environment.
    pub fn load(file_prefix: &str) -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("GENO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: GenoConfig = cfg.try_deserialize()?;
        tracing::debug!(
            database = %loaded.database,
            server = %loaded.neo4j.server,
            catalogs = loaded.constraints.len(),
            "Loaded configuration"
        );
        Ok(loaded)
    }

    /// Configured constraints for `database`, or an empty catalog.
    pub fn constraints_for(&self, database: &str) -> Constraints {
        self.constraints
            .get(database)
            .or_else(|| {
                self.constraints
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(database))
                    .map(|(_, c)| c)
            })
            .cloned()
            .unwrap_or_default()
    }

    /// Check server, database, user and password, in that order.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_server(&self.neo4j.server)?;
        validate_database(&self.database)?;
        validate_username(&self.neo4j.user)?;
        if self.neo4j.password.is_empty() {
            return Err(ConfigError::MissingPassword);
        }
        Ok(())
    }
}

fn validate_server(server: &str) -> Result<(), ConfigError> {
    if server.is_empty() {
        return Err(ConfigError::MissingServer);
    }
    if !server.contains(':') {
        return Err(ConfigError::ServerWithoutPort(server.to_string()));
    }
    Ok(())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-'
}

fn starts_alphanumeric(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
}

// Neo4j database naming rules. A leading '_' (reserved for system
// databases) fails the start check.
fn validate_database(name: &str) -> Result<(), ConfigError> {
    if !(3..=63).contains(&name.len()) {
        return Err(ConfigError::DatabaseNameLength(name.to_string()));
    }
    if !starts_alphanumeric(name) {
        return Err(ConfigError::DatabaseNameStart(name.to_string()));
    }
    if !name.chars().all(is_name_char) {
        return Err(ConfigError::DatabaseNameCharacters(name.to_string()));
    }
    Ok(())
}

fn validate_username(user: &str) -> Result<(), ConfigError> {
    if !starts_alphanumeric(user) {
        return Err(ConfigError::UsernameStart(user.to_string()));
    }
    if !user.chars().all(is_name_char) {
        return Err(ConfigError::UsernameCharacters(user.to_string()));
    }
    Ok(())
}
