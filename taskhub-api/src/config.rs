/// Configuration management for the API server
///
/// Configuration is read once at startup from the environment (a `.env` file
/// is honored in development) into an immutable `Config`.
///
/// # Environment Variables
///
/// - `JWT_SECRET`: Secret key for JWT signing (required)
/// - `DB_CONNECTION`: PostgreSQL connection string (required outside production)
/// - `PROD_DB_CONNECTION`: Connection string used when `NODE_ENV=production`;
///   falls back to `DB_CONNECTION`
/// - `NODE_ENV`: `development` (default) or `production`
/// - `HOST`: Host to bind to (default: 0.0.0.0)
/// - `PORT`: Port to bind to (default: 3000)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `LOG_FORMAT`: `pretty` or `json` (default: json in production)
/// - `RUST_LOG`: Tracing filter
///
/// # Example
///
/// ```no_run
/// use taskhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::fmt;
use std::str::FromStr;
use taskhub_shared::db::pool::PoolConfig;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Running with `NODE_ENV=production`
    pub production: bool,
}

/// Database configuration
#[derive(Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Should be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig").field("secret", &"[REDACTED]").finish()
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

/// Secrets shorter than this are accepted with a warning
pub const RECOMMENDED_SECRET_LENGTH: usize = 32;

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or empty
    /// - no database URL is configured
    /// - a numeric or enum variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let production = var("NODE_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("PORT")
            .map(|v| v.parse::<u16>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("PORT must be a valid port number: {}", e))?
            .unwrap_or(3000);

        let cors_origins = var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        let database_url = if production {
            var("PROD_DB_CONNECTION").or_else(|| var("DB_CONNECTION"))
        } else {
            var("DB_CONNECTION")
        }
        .ok_or_else(|| {
            if production {
                anyhow::anyhow!("PROD_DB_CONNECTION or DB_CONNECTION environment variable is required")
            } else {
                anyhow::anyhow!("DB_CONNECTION environment variable is required")
            }
        })?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS must be a number: {}", e))?
            .unwrap_or(10);

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < RECOMMENDED_SECRET_LENGTH {
            tracing::warn!(
                "JWT_SECRET is shorter than {} characters; use a longer random secret",
                RECOMMENDED_SECRET_LENGTH
            );
        }

        let log_format = match var("LOG_FORMAT") {
            Some(v) => v.parse()?,
            None if production => LogFormat::Json,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Pool settings for the configured database, other knobs at their defaults
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET), ("DB_CONNECTION", "postgresql://localhost/dev")]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.database.url, "postgresql://localhost/dev");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert!(!config.api.production);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.pool_config().max_connections, 10);
    }

    #[test]
    fn test_missing_secret_fails() {
        let err = load(&[("DB_CONNECTION", "postgresql://localhost/dev")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        assert!(load(&[("JWT_SECRET", "  "), ("DB_CONNECTION", "postgresql://localhost/dev")]).is_err());
    }

    #[test]
    fn test_missing_database_fails() {
        let err = load(&[("JWT_SECRET", SECRET)]).unwrap_err();
        assert!(err.to_string().contains("DB_CONNECTION"));
    }

    #[test]
    fn test_production_prefers_prod_connection() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("NODE_ENV", "production"),
            ("DB_CONNECTION", "postgresql://localhost/dev"),
            ("PROD_DB_CONNECTION", "postgresql://db/prod"),
        ])
        .unwrap();

        assert!(config.api.production);
        assert_eq!(config.database.url, "postgresql://db/prod");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_production_falls_back_to_dev_connection() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("NODE_ENV", "production"),
            ("DB_CONNECTION", "postgresql://localhost/dev"),
        ])
        .unwrap();

        assert_eq!(config.database.url, "postgresql://localhost/dev");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("JWT_SECRET", "short"),
            ("DB_CONNECTION", "postgresql://localhost/dev"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.database.max_connections, 25);
        assert_eq!(config.api.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.jwt.secret, "short");
    }

    #[test]
    fn test_invalid_values_fail() {
        let base = [("JWT_SECRET", SECRET), ("DB_CONNECTION", "postgresql://localhost/dev")];

        assert!(load(&[base[0], base[1], ("PORT", "not-a-port")]).is_err());
        assert!(load(&[base[0], base[1], ("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[("JWT_SECRET", SECRET), ("DB_CONNECTION", "postgresql://admin:hunter2@db/x")]).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains(SECRET));
        assert!(!debug.contains("hunter2"));
    }
}
