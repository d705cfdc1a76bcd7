//! Engine configuration, read from the process environment.

use std::time::Duration;

pub const LOCK_TIMEOUT_VAR: &str = "STOCKFLOW_LOCK_TIMEOUT_MS";
pub const CONFLICT_RETRIES_VAR: &str = "STOCKFLOW_CONFLICT_RETRIES";

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 250;
const DEFAULT_CONFLICT_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bound on every key or document lock wait.
    pub lock_timeout: Duration,
    /// Extra attempts for a transition that failed with a concurrency conflict.
    pub conflict_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values fall back to
    /// the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lock_timeout_ms = parse_or(&lookup, LOCK_TIMEOUT_VAR, DEFAULT_LOCK_TIMEOUT_MS);
        let conflict_retries = parse_or(&lookup, CONFLICT_RETRIES_VAR, DEFAULT_CONFLICT_RETRIES);

        let lock_timeout_ms = if lock_timeout_ms == 0 {
            tracing::warn!(var = LOCK_TIMEOUT_VAR, "zero lock timeout; using default");
            DEFAULT_LOCK_TIMEOUT_MS
        } else {
            lock_timeout_ms
        };

        Self {
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            conflict_retries,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: core::str::FromStr + Copy + core::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = key, value = %raw, %default, "invalid value; using default");
            default
        }),
    }
}
