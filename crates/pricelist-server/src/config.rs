//! Configuration management

use serde::{Deserialize, Serialize};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Database Configuration Constants
// ============================================================================

pub const DEFAULT_POSTGRES_HOST: &str = "localhost";
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;
pub const DEFAULT_POSTGRES_USER: &str = "validator";
pub const DEFAULT_POSTGRES_PASSWORD: &str = "val1dat0r";
pub const DEFAULT_POSTGRES_DB: &str = "project-sem-1";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 1;

/// Default pool acquire timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// How long startup keeps retrying an unreachable database.
pub const DEFAULT_DATABASE_CONNECT_RETRY_SECS: u64 = 30;

// ============================================================================
// Upload / CORS Constants
// ============================================================================

/// Default upload body limit (32 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Default CORS allowed origin.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub cors: CorsConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub connect_retry_secs: u64,
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_upload_bytes: usize,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl DatabaseConfig {
    /// `DATABASE_URL` if set, otherwise a URL assembled from the `POSTGRES_*` variables
    pub fn url_from_env() -> String {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.trim().is_empty() {
                return url;
            }
        }

        format!(
            "postgres://{}:{}@{}:{}/{}",
            env_string("POSTGRES_USER", DEFAULT_POSTGRES_USER),
            env_string("POSTGRES_PASSWORD", DEFAULT_POSTGRES_PASSWORD),
            env_string("POSTGRES_HOST", DEFAULT_POSTGRES_HOST),
            env_or("POSTGRES_PORT", DEFAULT_POSTGRES_PORT),
            env_string("POSTGRES_DB", DEFAULT_POSTGRES_DB),
        )
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env_string("PRICELIST_HOST", DEFAULT_SERVER_HOST),
                port: env_or("PRICELIST_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "PRICELIST_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: DatabaseConfig::url_from_env(),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or("DATABASE_IDLE_TIMEOUT", DEFAULT_DATABASE_IDLE_TIMEOUT_SECS),
                connect_retry_secs: env_or(
                    "DATABASE_CONNECT_RETRY_SECS",
                    DEFAULT_DATABASE_CONNECT_RETRY_SECS,
                ),
            },
            upload: UploadConfig {
                max_upload_bytes: env_or("PRICELIST_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            },
            cors: CorsConfig {
                allowed_origins: env_string("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ALLOWED_ORIGIN)
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", false),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.upload.max_upload_bytes == 0 {
            anyhow::bail!("Upload limit must be greater than 0");
        }

        // Browsers reject a wildcard origin combined with credentials
        let wildcard = self.cors.allowed_origins.is_empty()
            || self.cors.allowed_origins.iter().any(|o| o == "*");
        if wildcard && self.cors.allow_credentials {
            anyhow::bail!("CORS_ALLOW_CREDENTIALS requires explicit CORS_ALLOWED_ORIGINS");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            database: DatabaseConfig {
                url: format!(
                    "postgres://{}:{}@{}:{}/{}",
                    DEFAULT_POSTGRES_USER,
                    DEFAULT_POSTGRES_PASSWORD,
                    DEFAULT_POSTGRES_HOST,
                    DEFAULT_POSTGRES_PORT,
                    DEFAULT_POSTGRES_DB
                ),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                connect_retry_secs: DEFAULT_DATABASE_CONNECT_RETRY_SECS,
            },
            upload: UploadConfig {
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: false,
            },
        }
    }
}
