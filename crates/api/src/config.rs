use std::env;
use std::str::FromStr;

use thiserror::Error;
use visa_cms_core::collection::CascadeScope;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got `{value}`")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("STORE_BACKEND=postgres requires DATABASE_URL")]
    MissingDatabaseUrl,
}

/// Which [`DocumentStore`](visa_cms_core::store::DocumentStore) the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            _ => Err(()),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    pub store_backend: StoreBackend,
    /// PostgreSQL connection URL. Required for the postgres backend.
    pub database_url: Option<String>,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
    pub log_format: LogFormat,
    /// Child collections removed together with a form.
    pub cascade_scope: CascadeScope,
    /// Allowed CORS origins. Empty (or `*`) means any origin.
    pub cors_origins: Vec<String>,
    /// Maximum accepted request body size.
    pub body_limit_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            store_backend: StoreBackend::Memory,
            database_url: None,
            db_max_connections: 20,
            db_min_connections: 5,
            event_bus_capacity: 1024,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            cascade_scope: CascadeScope::default(),
            cors_origins: Vec::new(),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let database_url = lookup("DATABASE_URL");
        let default_backend = if database_url.is_some() {
            StoreBackend::Postgres
        } else {
            StoreBackend::Memory
        };

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PORT", "port number", defaults.port)?,
            store_backend: parse(&lookup, "STORE_BACKEND", "store backend (memory|postgres)", default_backend)?,
            database_url,
            db_max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", "u32", defaults.db_max_connections)?,
            db_min_connections: parse(&lookup, "DB_MIN_CONNECTIONS", "u32", defaults.db_min_connections)?,
            event_bus_capacity: parse(&lookup, "EVENT_BUS_CAPACITY", "usize", defaults.event_bus_capacity)?,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: parse(&lookup, "LOG_FORMAT", "log format (json|pretty)", defaults.log_format)?,
            cascade_scope: parse(&lookup, "CASCADE_SCOPE", "cascade scope (fields|all)", defaults.cascade_scope)?,
            cors_origins: lookup("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty() && *origin != "*")
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            body_limit_bytes: parse(&lookup, "BODY_LIMIT_BYTES", "usize", defaults.body_limit_bytes)?,
        };

        if config.store_backend == StoreBackend::Postgres && config.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        Ok(config)
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_to_memory_without_database_url() {
        let config = load(&[]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.addr(), "0.0.0.0:5000");
        assert_eq!(config.cascade_scope, CascadeScope::Fields);
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn database_url_selects_postgres() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/visa")]).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Postgres);

        let forced = load(&[
            ("DATABASE_URL", "postgres://localhost/visa"),
            ("STORE_BACKEND", "memory"),
        ])
        .unwrap();
        assert_eq!(forced.store_backend, StoreBackend::Memory);
    }

    #[test]
    fn rejects_invalid_numbers() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                expected: "port number",
                value: "eighty".to_string(),
            }
        );
        assert!(load(&[("DB_MAX_CONNECTIONS", "-1")]).is_err());
    }

    #[test]
    fn rejects_unknown_backend_and_missing_url() {
        assert!(matches!(
            load(&[("STORE_BACKEND", "mongo")]),
            Err(ConfigError::Invalid { name: "STORE_BACKEND", .. })
        ));
        assert_eq!(
            load(&[("STORE_BACKEND", "postgres")]).unwrap_err(),
            ConfigError::MissingDatabaseUrl
        );
    }

    #[test]
    fn parses_scope_format_and_origins() {
        let config = load(&[
            ("CASCADE_SCOPE", "all"),
            ("LOG_FORMAT", "pretty"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
        ])
        .unwrap();
        assert_eq!(config.cascade_scope, CascadeScope::AllChildren);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
    }
}
