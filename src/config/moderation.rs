use std::env;

pub const DEFAULT_BAN_THRESHOLD: u64 = 3;
pub const DEFAULT_BANNED_EMAIL_DOMAIN: &str = "banned.invalid";

/// Knobs for the report/ban workflow.
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    /// Upheld user-reports at which an account becomes eligible for a ban.
    pub ban_threshold: u64,
    /// Domain used for the placeholder email written over a banned account.
    pub banned_email_domain: String,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            ban_threshold: DEFAULT_BAN_THRESHOLD,
            banned_email_domain: DEFAULT_BANNED_EMAIL_DOMAIN.to_string(),
        }
    }
}

impl ModerationConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ban_threshold = env::var("BAN_THRESHOLD")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.ban_threshold);

        let banned_email_domain = env::var("BANNED_EMAIL_DOMAIN")
            .ok()
            .map(|d| d.trim().trim_start_matches('@').to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or(defaults.banned_email_domain);

        Self {
            ban_threshold,
            banned_email_domain,
        }
    }
}
