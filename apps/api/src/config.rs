//! API configuration module.
//!
//! Configuration is layered with the `config` crate:
//!
//! ```text
//! built-in defaults
//!     ▼ overridden by
//! shopdesk.toml (optional, working directory)
//!     ▼ overridden by
//! environment (DATABASE_URL, SECRET_KEY, ...; `.env` is loaded first)
//!     ▼ overridden by
//! SHOPDESK_* environment (SHOPDESK_PORT, ...)
//! ```
//!
//! The result is validated once at startup and shared read-only.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use jsonwebtoken::Algorithm;
use serde::Deserialize;

/// Credentials for the Cloudinary-compatible image host.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// API configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite connection string
    pub database_url: String,

    /// Pool size
    pub db_max_connections: u32,

    /// HMAC secret for signing tokens
    pub secret_key: String,

    /// Token signing algorithm (HS256, HS384 or HS512)
    pub algorithm: Algorithm,

    /// Access token lifetime in minutes
    pub access_token_expire_minutes: i64,

    /// Image host credentials; uploads fail with 422 when absent
    pub cloudinary: Option<CloudinaryConfig>,

    /// Timeout for a single image upload
    pub upload_timeout: Duration,

    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("db_max_connections", &self.db_max_connections)
            .field("secret_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("cloudinary", &self.cloudinary)
            .field("upload_timeout", &self.upload_timeout)
            .field("json_logs", &self.json_logs)
            .finish()
    }
}

/// Shape of the merged sources before validation.
#[derive(Debug, Deserialize)]
struct RawConfig {
    host: String,
    port: u16,
    database_url: String,
    db_max_connections: u32,
    secret_key: Option<String>,
    algorithm: String,
    access_token_expire_minutes: i64,
    cloudinary_cloud_name: Option<String>,
    cloudinary_public_api_key: Option<String>,
    cloudinary_secret_api_key: Option<String>,
    upload_timeout_secs: u64,
    log_format: String,
}

impl ApiConfig {
    /// Load configuration from `.env`, `shopdesk.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is fine
        let _ = dotenvy::dotenv();

        let builder = Self::defaults()?
            .add_source(File::with_name("shopdesk").required(false))
            .add_source(Environment::default().try_parsing(true))
            .add_source(
                Environment::with_prefix("SHOPDESK")
                    .prefix_separator("_")
                    .try_parsing(true),
            );

        Self::from_builder(builder)
    }

    /// Built-in defaults. Everything except the secret has one.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("database_url", "sqlite://shopdesk.db")?
            .set_default("db_max_connections", 5)?
            .set_default("algorithm", "HS256")?
            .set_default("access_token_expire_minutes", 30)?
            .set_default("upload_timeout_secs", 30)?
            .set_default("log_format", "pretty")?)
    }

    /// Build and validate a configuration from any set of sources.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let raw: RawConfig = builder.build()?.try_deserialize()?;

        let secret_key = raw
            .secret_key
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired("SECRET_KEY".to_string()))?;

        let algorithm = match raw.algorithm.to_ascii_uppercase().as_str() {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            _ => return Err(ConfigError::InvalidValue("ALGORITHM".to_string())),
        };

        if raw.access_token_expire_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "ACCESS_TOKEN_EXPIRE_MINUTES".to_string(),
            ));
        }
        if raw.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        let cloudinary = match (
            present(raw.cloudinary_cloud_name),
            present(raw.cloudinary_public_api_key),
            present(raw.cloudinary_secret_api_key),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::IncompleteCloudinary),
        };

        Ok(ApiConfig {
            host: raw.host,
            port: raw.port,
            database_url: raw.database_url,
            db_max_connections: raw.db_max_connections,
            secret_key,
            algorithm,
            access_token_expire_minutes: raw.access_token_expire_minutes,
            cloudinary,
            upload_timeout: Duration::from_secs(raw.upload_timeout_secs),
            json_logs: raw.log_format.eq_ignore_ascii_case("json"),
        })
    }

    /// Address the HTTP server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("HOST".to_string()))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Cloudinary needs CLOUDINARY_CLOUD_NAME, CLOUDINARY_PUBLIC_API_KEY and CLOUDINARY_SECRET_API_KEY together")]
    IncompleteCloudinary,

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}
