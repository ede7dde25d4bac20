/*
 * Responsibility
 * - Read gateway settings from the environment (.env supported via dotenvy)
 * - Validate them up front; a bad value fails startup
 *
 * The signing key is the exception: it is carried as-is and judged by the auth factory,
 * which fails closed instead of refusing to boot.
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::services::route_table::{DEFAULT_ROUTES, RouteTable, RouteTableError};

pub const DEFAULT_EXCLUDED_PATHS: &str = "/auth/login,/auth/register";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid(&'static str),
    Routes(RouteTableError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
            ConfigError::Routes(e) => write!(f, "invalid configuration: GATEWAY_ROUTES: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // Base64 HMAC secret shared with the token issuer
    pub jwt_secret_key: Option<String>,
    pub auth_excluded_paths: Vec<String>,

    pub routes: RouteTable,
    pub upstream_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub max_body_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret_key", &self.jwt_secret_key.as_ref().map(|_| "<redacted>"))
            .field("auth_excluded_paths", &self.auth_excluded_paths)
            .field("routes", &self.routes)
            .field("upstream_timeout_seconds", &self.upstream_timeout_seconds)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            app_env: AppEnv::Development,
            cors_allowed_origins: Vec::new(),
            jwt_secret_key: None,
            auth_excluded_paths: split_list(DEFAULT_EXCLUDED_PATHS),
            routes: RouteTable::parse(DEFAULT_ROUTES).unwrap_or_default(),
            upstream_timeout_seconds: 10,
            request_timeout_seconds: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port: u16 = parse_or(&lookup, "PORT", defaults.addr.port())?;
        let addr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let jwt_secret_key = lookup("JWT_SECRET_KEY").filter(|v| !v.trim().is_empty());

        let auth_excluded_paths = split_list(
            &lookup("AUTH_EXCLUDED_PATHS").unwrap_or_else(|| DEFAULT_EXCLUDED_PATHS.to_string()),
        );
        if auth_excluded_paths.iter().any(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid("AUTH_EXCLUDED_PATHS"));
        }

        let routes = RouteTable::parse(
            &lookup("GATEWAY_ROUTES").unwrap_or_else(|| DEFAULT_ROUTES.to_string()),
        )
        .map_err(ConfigError::Routes)?;

        let upstream_timeout_seconds = parse_or(
            &lookup,
            "UPSTREAM_TIMEOUT_SECONDS",
            defaults.upstream_timeout_seconds,
        )?;
        let request_timeout_seconds = parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECONDS",
            defaults.request_timeout_seconds,
        )?;
        let max_body_bytes = parse_or(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes)?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            jwt_secret_key,
            auth_excluded_paths,
            routes,
            upstream_timeout_seconds,
            request_timeout_seconds,
            max_body_bytes,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid(key))
        }
        _ => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.addr.port(), 8000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert!(config.jwt_secret_key.is_none());
        assert_eq!(config.auth_excluded_paths, ["/auth/login", "/auth/register"]);
        assert_eq!(config.routes.routes().len(), 7);
        assert_eq!(config.request_timeout_seconds, 30);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("APP_ENV", "PROD"),
            ("CORS_ALLOWED_ORIGINS", "https://a.test, https://b.test,"),
            ("JWT_SECRET_KEY", "abc123=="),
            ("AUTH_EXCLUDED_PATHS", "/auth/login, /public"),
            ("GATEWAY_ROUTES", "svc=/svc=http://127.0.0.1:7000"),
            ("UPSTREAM_TIMEOUT_SECONDS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.addr.port(), 9090);
        assert!(config.app_env.is_production());
        assert_eq!(config.cors_allowed_origins, ["https://a.test", "https://b.test"]);
        assert_eq!(config.jwt_secret_key.as_deref(), Some("abc123=="));
        assert_eq!(config.auth_excluded_paths, ["/auth/login", "/public"]);
        assert_eq!(config.routes.resolve("/svc/x").unwrap().id, "svc");
        assert_eq!(config.upstream_timeout_seconds, 3);
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET_KEY", "  ")])).unwrap();
        assert!(config.jwt_secret_key.is_none());
    }

    #[test]
    fn invalid_values_fail_startup() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("PORT", "http")])),
            Err(ConfigError::Invalid("PORT"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("MAX_BODY_BYTES", "-1")])),
            Err(ConfigError::Invalid("MAX_BODY_BYTES"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("AUTH_EXCLUDED_PATHS", "auth/login")])),
            Err(ConfigError::Invalid("AUTH_EXCLUDED_PATHS"))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("GATEWAY_ROUTES", "broken")])),
            Err(ConfigError::Routes(_))
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = Config {
            jwt_secret_key: Some("abc123==".to_string()),
            ..Config::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("abc123=="));
        assert!(printed.contains("<redacted>"));
    }
}
