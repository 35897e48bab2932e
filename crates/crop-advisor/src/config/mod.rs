use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::advisory::{AdvisoryConfig, PlannerConfig, DEFAULT_RANKED_LIMIT};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub catalog: CatalogConfig,
    pub advisory: AdvisoryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let catalog_path = env::var("APP_CATALOG_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            catalog: CatalogConfig { path: catalog_path },
            advisory: load_advisory()?,
        })
    }
}

fn load_advisory() -> Result<AdvisoryConfig, ConfigError> {
    let defaults = PlannerConfig::default();

    let altitude_factor = env::var("APP_ALTITUDE_FACTOR")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or(defaults.altitude_factor);

    let priority_factors = env::var("APP_PRIORITY_FACTORS")
        .map(|value| parse_list(&value))
        .unwrap_or_default();

    let include_unlisted_factors = match env::var("APP_INCLUDE_UNLISTED_FACTORS") {
        Ok(value) => parse_flag("APP_INCLUDE_UNLISTED_FACTORS", &value)?,
        Err(_) => defaults.include_unlisted_factors,
    };

    let unit_label = env::var("APP_UNIT_LABEL").unwrap_or(defaults.unit_label);

    let ranked_limit = match env::var("APP_RANKED_LIMIT") {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|limit| *limit >= 1)
            .ok_or(ConfigError::InvalidRankedLimit)?,
        Err(_) => DEFAULT_RANKED_LIMIT,
    };

    Ok(AdvisoryConfig {
        planner: PlannerConfig {
            altitude_factor,
            priority_factors,
            include_unlisted_factors,
            unit_label,
        },
        ranked_limit,
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name }),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the rule catalog is read from. `None` serves the built-in demo
/// catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { name: &'static str },
    InvalidRankedLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { name } => {
                write!(f, "{name} must be one of true/false/1/0/yes/no")
            }
            ConfigError::InvalidRankedLimit => {
                write!(f, "APP_RANKED_LIMIT must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidRankedLimit => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_CATALOG_PATH",
            "APP_ALTITUDE_FACTOR",
            "APP_PRIORITY_FACTORS",
            "APP_INCLUDE_UNLISTED_FACTORS",
            "APP_UNIT_LABEL",
            "APP_RANKED_LIMIT",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.catalog.path.is_none());
        assert_eq!(config.advisory, AdvisoryConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_planner_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ALTITUDE_FACTOR", "Elevacion");
        env::set_var("APP_PRIORITY_FACTORS", " clima, suelo ,,riego");
        env::set_var("APP_INCLUDE_UNLISTED_FACTORS", "no");
        env::set_var("APP_UNIT_LABEL", "m");
        env::set_var("APP_RANKED_LIMIT", "3");
        env::set_var("APP_CATALOG_PATH", "rules.csv");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.advisory.planner.altitude_factor, "Elevacion");
        assert_eq!(
            config.advisory.planner.priority_factors,
            vec!["clima", "suelo", "riego"]
        );
        assert!(!config.advisory.planner.include_unlisted_factors);
        assert_eq!(config.advisory.planner.unit_label, "m");
        assert_eq!(config.advisory.ranked_limit, 3);
        assert_eq!(config.catalog.path, Some(PathBuf::from("rules.csv")));
        reset_env();
    }

    #[test]
    fn rejects_zero_ranked_limit() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_RANKED_LIMIT", "0");
        let err = AppConfig::load().expect_err("zero limit rejected");
        assert!(matches!(err, ConfigError::InvalidRankedLimit));
        reset_env();
    }

    #[test]
    fn rejects_unknown_flag_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_INCLUDE_UNLISTED_FACTORS", "sometimes");
        let err = AppConfig::load().expect_err("flag rejected");
        assert_eq!(
            err.to_string(),
            "APP_INCLUDE_UNLISTED_FACTORS must be one of true/false/1/0/yes/no"
        );
        reset_env();
    }
}
