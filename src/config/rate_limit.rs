use super::parse_bool_env;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Register/login.
    pub auth: RateLimitRule,
    /// Everything behind the auth middleware.
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule {
                per_second: 5,
                burst_size: 10,
            },
            protected: RateLimitRule {
                per_second: 10,
                burst_size: 20,
            },
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        let per_second = parse_positive("RATE_LIMIT_PER_SECOND");
        let burst_size = parse_positive("RATE_LIMIT_BURST").and_then(|b| u32::try_from(b).ok());
        if let Some(per_second) = per_second {
            cfg.protected.per_second = per_second;
        }
        if let Some(burst_size) = burst_size {
            cfg.protected.burst_size = burst_size;
        }

        cfg
    }
}

fn parse_positive(var_name: &str) -> Option<u64> {
    let raw = env::var(var_name).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!("Invalid {}='{}', keeping default", var_name, raw);
            None
        }
    }
}
