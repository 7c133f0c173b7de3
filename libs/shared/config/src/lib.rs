use std::env;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_SLOT_MINUTES: u32 = 30;
pub const DEFAULT_SLOT_CACHE_TTL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub auth_token: Option<String>,
    pub auth_token_path: Option<PathBuf>,
    /// Offset applied to timestamped slot dates before they are compared as calendar days.
    pub display_utc_offset_minutes: i32,
    pub default_slot_minutes: u32,
    pub slot_cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            auth_token_path: None,
            display_utc_offset_minutes: 0,
            default_slot_minutes: DEFAULT_SLOT_MINUTES,
            slot_cache_ttl_secs: DEFAULT_SLOT_CACHE_TTL_SECS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for
    /// missing or malformed values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            api_base_url: lookup("SCHEDULER_API_URL").unwrap_or_else(|| {
                warn!("SCHEDULER_API_URL not set, using default");
                DEFAULT_API_URL.to_string()
            }),
            auth_token: lookup("SCHEDULER_AUTH_TOKEN").filter(|t| !t.is_empty()),
            auth_token_path: lookup("SCHEDULER_TOKEN_PATH").map(PathBuf::from),
            display_utc_offset_minutes: parse_or_default(&lookup, "SCHEDULER_UTC_OFFSET_MINUTES", 0),
            default_slot_minutes: parse_or_default(
                &lookup,
                "SCHEDULER_DEFAULT_SLOT_MINUTES",
                DEFAULT_SLOT_MINUTES,
            ),
            slot_cache_ttl_secs: parse_or_default(
                &lookup,
                "SCHEDULER_SLOT_CACHE_TTL_SECS",
                DEFAULT_SLOT_CACHE_TTL_SECS,
            ),
        };

        if config.display_utc_offset_minutes.abs() >= 24 * 60 {
            warn!(
                "SCHEDULER_UTC_OFFSET_MINUTES out of range ({}), falling back to UTC",
                config.display_utc_offset_minutes
            );
            return Self {
                display_utc_offset_minutes: 0,
                ..config
            };
        }

        config
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value ({}), using default", key, raw);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.default_slot_minutes, 30);
        assert_eq!(config.display_utc_offset_minutes, 0);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_with_base_url_and_token() {
        let config = AppConfig {
            auth_token: Some("token".to_string()),
            ..AppConfig::with_base_url("http://api.test")
        };
        assert_eq!(config.api_base_url, "http://api.test");
        assert_eq!(config.auth_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_reads_scheduler_variables() {
        let config = config_from(&[
            ("SCHEDULER_API_URL", "http://api.test"),
            ("SCHEDULER_AUTH_TOKEN", "secret"),
            ("SCHEDULER_TOKEN_PATH", "/tmp/token"),
            ("SCHEDULER_UTC_OFFSET_MINUTES", "-300"),
            ("SCHEDULER_DEFAULT_SLOT_MINUTES", " 45 "),
            ("SCHEDULER_SLOT_CACHE_TTL_SECS", "5"),
        ]);

        assert_eq!(config.api_base_url, "http://api.test");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.auth_token_path, Some(PathBuf::from("/tmp/token")));
        assert_eq!(config.display_utc_offset_minutes, -300);
        assert_eq!(config.default_slot_minutes, 45);
        assert_eq!(config.slot_cache_ttl_secs, 5);
    }

    #[test]
    fn test_missing_variables_use_defaults() {
        let config = config_from(&[("SCHEDULER_AUTH_TOKEN", "")]);

        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert!(config.auth_token.is_none());
        assert!(config.auth_token_path.is_none());
        assert_eq!(config.slot_cache_ttl_secs, DEFAULT_SLOT_CACHE_TTL_SECS);
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let config = config_from(&[
            ("SCHEDULER_UTC_OFFSET_MINUTES", "1500"),
            ("SCHEDULER_DEFAULT_SLOT_MINUTES", "20"),
        ]);
        assert_eq!(config.display_utc_offset_minutes, 0);
        assert_eq!(config.default_slot_minutes, 20);

        let edge = config_from(&[("SCHEDULER_UTC_OFFSET_MINUTES", "-1440")]);
        assert_eq!(edge.display_utc_offset_minutes, 0);

        let widest = config_from(&[("SCHEDULER_UTC_OFFSET_MINUTES", "840")]);
        assert_eq!(widest.display_utc_offset_minutes, 840);
    }

    #[test]
    fn test_invalid_numbers_use_defaults() {
        let config = config_from(&[
            ("SCHEDULER_UTC_OFFSET_MINUTES", "east"),
            ("SCHEDULER_DEFAULT_SLOT_MINUTES", "-5"),
        ]);
        assert_eq!(config.display_utc_offset_minutes, 0);
        assert_eq!(config.default_slot_minutes, DEFAULT_SLOT_MINUTES);
    }
}
