//! Configuration management for the case ABAC engine

use crate::domain::{FullAccessRoles, Role};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Snapshot cache and full-access configuration
    pub abac: AbacConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AbacConfig {
    /// Maximum number of principals held by each snapshot cache
    pub cache_capacity: usize,
    /// Lifetime of a cached entry in seconds
    pub cache_ttl_secs: u64,
    /// Roles that bypass policy resolution entirely
    pub full_access_roles: FullAccessRoles,
}

impl AbacConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for AbacConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1024,
            cache_ttl_secs: 300,
            full_access_roles: FullAccessRoles::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "text" or "json"
    pub log_format: String,
    /// Whether to install the Prometheus recorder
    pub metrics_enabled: bool,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            metrics_enabled: false,
            service_name: "casedb-abac".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first
    /// when present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            abac: AbacConfig {
                cache_capacity: env::var("ABAC_CACHE_CAPACITY")
                    .unwrap_or_else(|_| "1024".to_string())
                    .parse()
                    .context("Invalid ABAC_CACHE_CAPACITY")?,
                cache_ttl_secs: env::var("ABAC_CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .context("Invalid ABAC_CACHE_TTL_SECS")?,
                full_access_roles: match env::var("ABAC_FULL_ACCESS_ROLES") {
                    Ok(raw) => parse_roles(&raw).context("Invalid ABAC_FULL_ACCESS_ROLES")?,
                    Err(_) => FullAccessRoles::default(),
                },
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .map(|s| s.to_lowercase() == "true")
                    .unwrap_or(false),
                service_name: env::var("SERVICE_NAME")
                    .unwrap_or_else(|_| "casedb-abac".to_string()),
            },
        })
    }
}

/// Parse a comma-separated role list such as `ROOT,APP_ADMIN`.
pub fn parse_roles(raw: &str) -> Result<FullAccessRoles> {
    let roles = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Role>())
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(FullAccessRoles::new(roles))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database: DatabaseConfig {
                url: "mysql://localhost/casedb".to_string(),
                max_connections: 10,
                min_connections: 2,
            },
            abac: AbacConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    #[test]
    fn test_abac_config_default() {
        let config = AbacConfig::default();
        assert_eq!(config.cache_capacity, 1024);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert!(config.full_access_roles.contains(Role::Root));
        assert!(config.full_access_roles.contains(Role::AppAdmin));
        assert!(!config.full_access_roles.contains(Role::OrgAdmin));
    }

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_format, "text");
        assert!(!config.metrics_enabled);
        assert_eq!(config.service_name, "casedb-abac");
    }

    #[test]
    fn test_parse_roles() {
        let roles = parse_roles(" ROOT, ORG_ADMIN ,").unwrap();
        assert!(roles.contains(Role::Root));
        assert!(roles.contains(Role::OrgAdmin));
        assert!(!roles.contains(Role::AppAdmin));
    }

    #[test]
    fn test_parse_roles_rejects_unknown() {
        assert!(parse_roles("ROOT,SUPERUSER").is_err());
    }

    #[test]
    fn test_config_clone() {
        let config1 = test_config();
        let config2 = config1.clone();

        assert_eq!(config1.database.url, config2.database.url);
        assert_eq!(config1.abac.cache_capacity, config2.abac.cache_capacity);
    }

    #[test]
    fn test_config_debug() {
        let config = test_config();
        let debug_str = format!("{:?}", config);

        assert!(debug_str.contains("DatabaseConfig"));
        assert!(debug_str.contains("cache_ttl_secs"));
    }
}
