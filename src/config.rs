use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Medibook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medibook=info,medibook_lib=info,tower_http=warn"
}

/// Get the application data directory.
/// ~/Medibook/ when a home directory is known, otherwise `./Medibook`.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default database location inside the data directory.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("medibook.db")
}

// ═══════════════════════════════════════════════════════════
// Server configuration
// ═══════════════════════════════════════════════════════════

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
pub const DEFAULT_RATE_PER_MINUTE: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read from `MEDIBOOK_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub session_ttl_hours: i64,
    pub rate_per_minute: u32,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing or blank keys take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("MEDIBOOK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw.trim().parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                key: "MEDIBOOK_BIND",
                value: bind_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let db_path = get("MEDIBOOK_DB")
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let session_ttl_hours = match get("MEDIBOOK_SESSION_TTL_HOURS") {
            Some(raw) => parse_positive("MEDIBOOK_SESSION_TTL_HOURS", &raw)?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        let rate_per_minute = match get("MEDIBOOK_RATE_PER_MINUTE") {
            Some(raw) => {
                let value = parse_positive("MEDIBOOK_RATE_PER_MINUTE", &raw)?;
                u32::try_from(value).map_err(|e| ConfigError::Invalid {
                    key: "MEDIBOOK_RATE_PER_MINUTE",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?
            }
            None => DEFAULT_RATE_PER_MINUTE,
        };

        Ok(Self {
            bind,
            db_path,
            session_ttl_hours,
            rate_per_minute,
        })
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<i64, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason,
    };
    let value: i64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    if value <= 0 {
        return Err(invalid("must be greater than zero".into()));
    }
    Ok(value)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 5000)),
            db_path: default_db_path(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            rate_per_minute: DEFAULT_RATE_PER_MINUTE,
        }
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
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("Medibook"));
        assert!(default_db_path().ends_with("medibook.db"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.rate_per_minute, 100);
        assert_eq!(config.db_path, default_db_path());
    }

    #[test]
    fn overrides_are_read() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("MEDIBOOK_BIND", "0.0.0.0:8080"),
            ("MEDIBOOK_DB", "/tmp/x.db"),
            ("MEDIBOOK_SESSION_TTL_HOURS", "2"),
            ("MEDIBOOK_RATE_PER_MINUTE", "10"),
        ]))
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.session_ttl_hours, 2);
        assert_eq!(config.rate_per_minute, 10);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[("MEDIBOOK_BIND", "  ")])).unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[("MEDIBOOK_BIND", "nowhere")])).unwrap_err();
        assert!(err.to_string().contains("MEDIBOOK_BIND"));
        assert!(ServerConfig::from_lookup(lookup(&[("MEDIBOOK_SESSION_TTL_HOURS", "0")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("MEDIBOOK_RATE_PER_MINUTE", "-5")])).is_err());
    }
}
