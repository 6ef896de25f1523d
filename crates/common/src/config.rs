use anyhow::{Context, Result};
use flatql_error::{find_closest_match, ErrorCode, FlatqlError};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Default constants
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("flatql/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;
pub const DEFAULT_SQLSERVER_PORT: u16 = 1433;

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn serialize_secret<S>(_secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str("[REDACTED]")
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(SecretString::from(s.unwrap_or_default()))
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, Validate)]
pub struct AppConfig {
    #[serde(default)]
    #[validate(nested)]
    pub logging: LoggingConfig,
    #[serde(default)]
    #[validate(nested)]
    pub http: HttpConfig,
    #[serde(default)]
    pub s3: S3Config,
    #[serde(default)]
    #[validate(nested)]
    pub connections: Vec<ConnectionConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    #[validate(custom(function = "validate_log_level"))]
    pub level: String,
    #[serde(default)]
    pub json: bool,
    /// Emit every executed statement on the `queries` target.
    #[serde(default)]
    pub log_queries: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            log_queries: false,
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn validate_log_level(level: &str) -> Result<(), validator::ValidationError> {
    // Full EnvFilter directives ("flatql=debug,warn") are accepted as-is.
    if level.contains('=') || level.contains(',') {
        return Ok(());
    }
    if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_log_level"))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct HttpConfig {
    #[serde(default = "default_http_timeout_secs")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Object store settings. The region falls back to the AWS environment;
/// credentials and `AWS_PROFILE` are resolved by the S3 credential chain.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct S3Config {
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl S3Config {
    /// Region from config, then `AWS_REGION`, then `us-east-1`.
    pub fn resolved_region(&self) -> String {
        self.region
            .clone()
            .or_else(|| std::env::var("AWS_REGION").ok().filter(|r| !r.is_empty()))
            .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string())
    }
}

/// A named database connection.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ConnectionConfig {
    #[validate(length(min = 1))]
    pub name: String,
    /// One of `sqlite`, `mysql`, `postgres`, `sqlserver`.
    #[validate(length(min = 1))]
    pub dialect: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: String,
    #[serde(
        default = "empty_secret",
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub password: SecretString,
    /// Database name, or the database file path for sqlite.
    #[serde(default)]
    pub database: String,
}

impl ConnectionConfig {
    /// Configured port, or the dialect's well-known port.
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(match self.dialect.to_ascii_lowercase().as_str() {
            "mysql" => DEFAULT_MYSQL_PORT,
            "postgres" | "postgresql" => DEFAULT_POSTGRES_PORT,
            "sqlserver" | "mssql" => DEFAULT_SQLSERVER_PORT,
            _ => 0,
        })
    }
}

impl AppConfig {
    /// Loads an optional YAML file, then applies `FLATQL_*` environment overrides.
    ///
    /// `FLATQL_LOGGING__LEVEL=debug` maps to `logging.level`.
    pub fn from_file(path: &str) -> Result<Self> {
        let builder = config::Config::builder();

        let builder = if std::path::Path::new(path).exists() {
            builder.add_source(config::File::with_name(path))
        } else {
            builder
        };

        let builder = builder.add_source(
            config::Environment::with_prefix("FLATQL")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build().context("Failed to build configuration")?;

        let app_config: AppConfig = cfg
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {:?}", e))?;

        Ok(app_config)
    }
}

/// Supplies connection settings by name.
pub trait ConnectionProvider: Send + Sync {
    fn connection(&self, name: &str) -> flatql_error::Result<ConnectionConfig>;

    fn names(&self) -> Vec<String>;
}

/// Connections declared in [`AppConfig::connections`].
#[derive(Debug, Clone, Default)]
pub struct StaticConnections {
    connections: Vec<ConnectionConfig>,
}

impl StaticConnections {
    pub fn new(connections: Vec<ConnectionConfig>) -> Self {
        Self { connections }
    }
}

impl From<&AppConfig> for StaticConnections {
    fn from(config: &AppConfig) -> Self {
        Self::new(config.connections.clone())
    }
}

impl ConnectionProvider for StaticConnections {
    fn connection(&self, name: &str) -> flatql_error::Result<ConnectionConfig> {
        if let Some(found) = self.connections.iter().find(|c| c.name == name) {
            return Ok(found.clone());
        }

        let mut err = FlatqlError::new(
            ErrorCode::ConnectionNotFound,
            format!("connection '{}' is not configured", name),
        );
        if let Some(close) = find_closest_match(name, &self.names()) {
            err = err.with_hint(format!("Did you mean '{}'?", close));
        }
        Err(err)
    }

    fn names(&self) -> Vec<String> {
        self.connections.iter().map(|c| c.name.clone()).collect()
    }
}
