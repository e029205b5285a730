/// Connection settings, read from the environment by [`DbConfig::from_env`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbConfig {
    pub database_url: Option<String>,

    pub min_connections: u32,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: Option<u64>,
    pub max_lifetime_secs: Option<u64>,
    pub acquire_timeout_secs: u64,

    pub retry_max_attempts: u32,
    pub retry_base_backoff_ms: u64,

    /// true: `init` fails when the DB cannot be reached after retries.
    /// false: `init` logs and continues; the first `get_pool` retries.
    pub eager_init: bool,

    /// Run embedded migrations after the first successful connect.
    pub migrate_on_start: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            min_connections: 0,
            max_connections: 10,
            connect_timeout_secs: 5,
            idle_timeout_secs: None,
            max_lifetime_secs: None,
            acquire_timeout_secs: 5,
            retry_max_attempts: 5,
            retry_base_backoff_ms: 200,
            eager_init: false,
            migrate_on_start: false,
        }
    }
}

impl DbConfig {
    /// - DATABASE_URL (optional; no database when unset or blank)
    /// - DB_MIN_CONNECTIONS (default 0)
    /// - DB_MAX_CONNECTIONS (default 10)
    /// - DB_CONNECT_TIMEOUT_SECS (default 5)
    /// - DB_IDLE_TIMEOUT_SECS (optional)
    /// - DB_MAX_LIFETIME_SECS (optional)
    /// - DB_ACQUIRE_TIMEOUT_SECS (default 5)
    /// - DB_RETRY_MAX_ATTEMPTS (default 5)
    /// - DB_RETRY_BASE_BACKOFF_MS (default 200)
    /// - DB_EAGER_INIT (bool, default false)
    /// - DB_MIGRATE_ON_START (bool, default false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DbConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let u32_or = |key: &str, default: u32| {
            lookup(key)
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(default)
        };
        let u64_opt = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        let bool_or = |key: &str, default: bool| {
            lookup(key)
                .map(|s| parse_bool(&s))
                .unwrap_or(default)
        };

        Self {
            database_url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
            min_connections: u32_or("DB_MIN_CONNECTIONS", d.min_connections),
            max_connections: u32_or("DB_MAX_CONNECTIONS", d.max_connections),
            connect_timeout_secs: u64_opt("DB_CONNECT_TIMEOUT_SECS").unwrap_or(d.connect_timeout_secs),
            idle_timeout_secs: u64_opt("DB_IDLE_TIMEOUT_SECS"),
            max_lifetime_secs: u64_opt("DB_MAX_LIFETIME_SECS"),
            acquire_timeout_secs: u64_opt("DB_ACQUIRE_TIMEOUT_SECS").unwrap_or(d.acquire_timeout_secs),
            retry_max_attempts: u32_or("DB_RETRY_MAX_ATTEMPTS", d.retry_max_attempts),
            retry_base_backoff_ms: u64_opt("DB_RETRY_BASE_BACKOFF_MS").unwrap_or(d.retry_base_backoff_ms),
            eager_init: bool_or("DB_EAGER_INIT", d.eager_init),
            migrate_on_start: bool_or("DB_MIGRATE_ON_START", d.migrate_on_start),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.database_url.is_some()
    }
}

pub(crate) fn parse_bool(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
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
        move |k| map.get(k).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        assert_eq!(DbConfig::from_lookup(|_| None), DbConfig::default());
        assert!(!DbConfig::default().is_configured());
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let cfg = DbConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://blog@localhost/blog"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("DB_IDLE_TIMEOUT_SECS", "30"),
            ("DB_RETRY_MAX_ATTEMPTS", "many"),
            ("DB_MIGRATE_ON_START", "Yes"),
        ]));
        assert!(cfg.is_configured());
        assert_eq!(cfg.max_connections, 3);
        assert_eq!(cfg.idle_timeout_secs, Some(30));
        assert_eq!(cfg.retry_max_attempts, 5);
        assert!(cfg.migrate_on_start);
        assert!(!cfg.eager_init);
    }

    #[test]
    fn blank_url_counts_as_missing() {
        let cfg = DbConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")]));
        assert!(!cfg.is_configured());
    }
}
