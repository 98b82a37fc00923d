use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    /// Apply embedded migrations before serving
    pub should_migrate: bool,
    pub http_address: SocketAddr,
    /// Upper bound for draining in-flight requests on shutdown
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    /// When false the connection string carries `sslmode=disable`
    pub tls: bool,
    /// Full URL override (`DATABASE_URL`); wins over the individual parts
    pub url: Option<String>,
    pub connect_attempts: u32,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        let ssl = if self.tls { "" } else { "?sslmode=disable" };
        format!(
            "postgres://{}:{}@{}:{}/{}{}",
            self.user, self.password, self.host, self.port, self.name, ssl
        )
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL").filter(|u| !u.is_empty());
        let has_url = url.is_some();

        // The individual parts are only mandatory without a full URL.
        let required = |name: &'static str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(v) if !v.is_empty() => Ok(v),
                _ if has_url => Ok(String::new()),
                _ => Err(ConfigError::Missing(name)),
            }
        };

        let database = DatabaseConfig {
            host: required("DATABASE_HOST")?,
            port: parse_or(&lookup, "DATABASE_PORT", 5432)?,
            user: required("DATABASE_USER")?,
            password: required("DATABASE_PASSWORD")?,
            name: required("DATABASE_NAME")?,
            tls: parse_or(&lookup, "DATABASE_TLS", false)?,
            url,
            connect_attempts: parse_or(&lookup, "DATABASE_CONNECT_ATTEMPTS", 5)?,
            connect_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DATABASE_CONNECT_TIMEOUT_SECS",
                10,
            )?),
        };

        Ok(Self {
            database,
            should_migrate: parse_or(&lookup, "SHOULD_MIGRATE", false)?,
            http_address: parse_or(
                &lookup,
                "HTTP_ADDRESS",
                SocketAddr::from(([0, 0, 0, 0], 8080)),
            )?,
            shutdown_timeout: Duration::from_secs(parse_or(&lookup, "SHUTDOWN_TIMEOUT_SECS", 10)?),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_HOST", "db"),
            ("DATABASE_USER", "subs"),
            ("DATABASE_PASSWORD", "secret"),
            ("DATABASE_NAME", "subscriptions"),
        ]
    }

    #[test]
    fn loads_defaults() {
        let config = Config::from_lookup(lookup_from(&minimal())).unwrap();

        assert_eq!(config.database.port, 5432);
        assert!(!config.database.tls);
        assert_eq!(config.database.connect_attempts, 5);
        assert_eq!(config.database.connect_timeout, Duration::from_secs(10));
        assert!(!config.should_migrate);
        assert_eq!(config.http_address.to_string(), "0.0.0.0:8080");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn connection_string_disables_ssl_without_tls() {
        let config = Config::from_lookup(lookup_from(&minimal())).unwrap();
        assert_eq!(
            config.database.connection_string(),
            "postgres://subs:secret@db:5432/subscriptions?sslmode=disable"
        );
    }

    #[test]
    fn connection_string_with_tls() {
        let mut pairs = minimal();
        pairs.push(("DATABASE_TLS", "true"));
        pairs.push(("DATABASE_PORT", "6543"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(
            config.database.connection_string(),
            "postgres://subs:secret@db:6543/subscriptions"
        );
    }

    #[test]
    fn database_url_overrides_parts() {
        let config = Config::from_lookup(lookup_from(&[(
            "DATABASE_URL",
            "postgres://u:p@elsewhere/x",
        )]))
        .unwrap();
        assert_eq!(
            config.database.connection_string(),
            "postgres://u:p@elsewhere/x"
        );
    }

    #[test]
    fn missing_host_is_an_error() {
        let pairs: Vec<_> = minimal()
            .into_iter()
            .filter(|(k, _)| *k != "DATABASE_HOST")
            .collect();
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_HOST"));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let mut pairs = minimal();
        pairs.push(("DATABASE_PORT", "not-a-port"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DATABASE_PORT", .. }));
    }

    #[test]
    fn parses_migrate_flag_and_address() {
        let mut pairs = minimal();
        pairs.push(("SHOULD_MIGRATE", "true"));
        pairs.push(("HTTP_ADDRESS", "127.0.0.1:9000"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert!(config.should_migrate);
        assert_eq!(config.http_address.to_string(), "127.0.0.1:9000");
    }
}
