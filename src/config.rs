use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres connection string. Without it annotations live in memory only.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS is not a number: {v}"))?,
            None => 10,
        };
        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "annotations".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "annotations-users".into()),
            ttl_minutes: lookup("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a valid port: {v}"))?,
            None => 8080,
        };
        Ok(Self {
            database_url,
            max_connections,
            jwt,
            host,
            port,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let cfg = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.max_connections, 10);
        assert_eq!(cfg.jwt.issuer, "annotations");
        assert_eq!(cfg.jwt.audience, "annotations-users");
        assert_eq!(cfg.jwt.ttl_minutes, 60);
        assert_eq!(cfg.bind_addr().unwrap().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("DATABASE_URL", "  "),
        ]))
        .unwrap();
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "x"),
            ("DATABASE_URL", "postgres://u:p@db:5432/annotations"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("JWT_TTL_MINUTES", "15"),
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.database_url.as_deref(),
            Some("postgres://u:p@db:5432/annotations")
        );
        assert_eq!(cfg.max_connections, 4);
        assert_eq!(cfg.jwt.ttl_minutes, 15);
        assert_eq!(cfg.bind_addr().unwrap().to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "x"), ("APP_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }
}
