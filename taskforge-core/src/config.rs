//! Runtime configuration.
//!
//! Every interval and lifetime the core uses comes from here, with the
//! defaults the system ships with. `from_env` overrides individual values
//! from `TASKFORGE_*` environment variables.

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// How long a verification code stays valid after generation.
    pub code_expiry: Duration,

    /// How far ahead of an item's due time the reminder fires.
    pub reminder_lead: Duration,

    /// Width of the due-time window each reminder scan covers. Should match
    /// the scan interval so consecutive scans tile the timeline without
    /// gaps or overlaps.
    pub reminder_scan_window: Duration,

    /// How often the reminder scan runs.
    pub reminder_interval: std::time::Duration,

    /// How often expired verification codes are deleted.
    pub cleanup_interval: std::time::Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            code_expiry: Duration::minutes(15),
            reminder_lead: Duration::hours(24),
            reminder_scan_window: Duration::minutes(5),
            reminder_interval: std::time::Duration::from_secs(300),
            cleanup_interval: std::time::Duration::from_secs(3600),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            code_expiry: env_i64("TASKFORGE_CODE_EXPIRY_MINUTES")
                .map(Duration::minutes)
                .unwrap_or(defaults.code_expiry),
            reminder_lead: env_i64("TASKFORGE_REMINDER_LEAD_HOURS")
                .map(Duration::hours)
                .unwrap_or(defaults.reminder_lead),
            reminder_scan_window: env_i64("TASKFORGE_REMINDER_SCAN_WINDOW_MINUTES")
                .map(Duration::minutes)
                .unwrap_or(defaults.reminder_scan_window),
            reminder_interval: env_i64("TASKFORGE_REMINDER_INTERVAL_SECS")
                .map(|secs| std::time::Duration::from_secs(secs as u64))
                .unwrap_or(defaults.reminder_interval),
            cleanup_interval: env_i64("TASKFORGE_CLEANUP_INTERVAL_SECS")
                .map(|secs| std::time::Duration::from_secs(secs as u64))
                .unwrap_or(defaults.cleanup_interval),
        }
    }
}

fn env_i64(name: &str) -> Option<i64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
