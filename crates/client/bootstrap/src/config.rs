//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use progress_core::XpCurveConfig;
use progress_sync::SyncConfig;

/// Public endpoint answering 204 to anyone, used when the API health check fails.
pub const DEFAULT_PROBE_FALLBACK_URL: &str = "https://www.google.com/generate_204";

/// Where the stats API lives and how long to wait for it.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// `None` runs the client local-only: every write stays queued.
    pub base_url: Option<String>,
    /// Defaults to `{base_url}/health`.
    pub health_url: Option<String>,
    pub probe_fallback_url: Option<String>,
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            health_url: None,
            probe_fallback_url: Some(DEFAULT_PROBE_FALLBACK_URL.to_owned()),
            request_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(3),
        }
    }
}

impl ApiConfig {
    pub fn resolved_health_url(&self) -> Option<String> {
        self.health_url.clone().or_else(|| {
            self.base_url
                .as_deref()
                .map(|base| format!("{}/health", base.trim_end_matches('/')))
        })
    }
}

/// Configuration required to bootstrap a scheduler for one user.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    /// Signed-in user; guests use [`ClientConfig::GUEST_USER`].
    pub user_id: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub sync: SyncConfig,
    pub curve: XpCurveConfig,
}

impl ClientConfig {
    pub const GUEST_USER: &'static str = "guest";

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `STATS_API_BASE_URL` - Stats API root (default: unset, local-only)
    /// - `STATS_HEALTH_URL` - Reachability endpoint (default: `{base}/health`)
    /// - `STATS_PROBE_FALLBACK_URL` - Second probe target, empty disables it
    /// - `STATS_USER_ID` - Signed-in user id (default: guest)
    /// - `STATS_DATA_DIR` - Cache and queue directory (default: platform-specific)
    /// - `SYNC_INTERVAL_SECS` - Background pass period (default: 30)
    /// - `SYNC_PROBE_INTERVAL_SECS` - Minimum probe spacing (default: 60)
    /// - `SYNC_FRESHNESS_SECS` - Read freshness window (default: 30)
    /// - `SYNC_PROBE_TIMEOUT_MS` - Probe timeout (default: 3000)
    /// - `SYNC_REQUEST_TIMEOUT_MS` - API request timeout (default: 10000)
    /// - `SYNC_REPORT_SESSIONS` - Also POST sessions to `/progress/finish` (default: false)
    /// - `XP_BASE_REQUIREMENT`, `XP_GROWTH_RATE`, `XP_ROUNDING_STEP` - Level curve
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        // API endpoints
        config.api.base_url = read_string(&lookup, "STATS_API_BASE_URL");
        config.api.health_url = read_string(&lookup, "STATS_HEALTH_URL");
        if let Some(raw) = lookup("STATS_PROBE_FALLBACK_URL") {
            config.api.probe_fallback_url = non_empty(raw);
        }
        if let Some(ms) = read_env::<u64>(&lookup, "SYNC_REQUEST_TIMEOUT_MS") {
            config.api.request_timeout = Duration::from_millis(ms.max(1));
        }
        if let Some(ms) = read_env::<u64>(&lookup, "SYNC_PROBE_TIMEOUT_MS") {
            config.api.probe_timeout = Duration::from_millis(ms.max(1));
        }

        // Identity and storage
        config.user_id = read_string(&lookup, "STATS_USER_ID");
        config.data_dir = read_string(&lookup, "STATS_DATA_DIR").map(PathBuf::from);

        // Scheduler timing
        if let Some(secs) = read_env::<u64>(&lookup, "SYNC_INTERVAL_SECS") {
            config.sync.sync_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = read_env::<u64>(&lookup, "SYNC_PROBE_INTERVAL_SECS") {
            config.sync.probe_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = read_env::<u64>(&lookup, "SYNC_FRESHNESS_SECS") {
            config.sync.freshness = Duration::from_secs(secs);
        }
        if let Some(enable) = read_flag(&lookup, "SYNC_REPORT_SESSIONS") {
            config.sync.report_sessions = enable;
        }

        // Level curve (validated when the scheduler is built)
        if let Some(base) = read_env::<u64>(&lookup, "XP_BASE_REQUIREMENT") {
            config.curve.base_requirement = base;
        }
        if let Some(rate) = read_env::<f64>(&lookup, "XP_GROWTH_RATE") {
            config.curve.growth_rate = rate;
        }
        if let Some(step) = read_env::<u64>(&lookup, "XP_ROUNDING_STEP") {
            config.curve.rounding_step = step;
        }

        config
    }

    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(Self::GUEST_USER)
    }

    pub fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(crate::dirs::data_dir)
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn read_string(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).and_then(non_empty)
}

fn read_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
{
    lookup(key)?.trim().parse().ok()
}

fn read_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    match lookup(key)?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]);

        assert!(config.is_guest());
        assert_eq!(config.user_id(), "guest");
        assert_eq!(config.api.base_url, None);
        assert_eq!(config.api.resolved_health_url(), None);
        assert_eq!(
            config.api.probe_fallback_url.as_deref(),
            Some(DEFAULT_PROBE_FALLBACK_URL)
        );
        assert_eq!(config.sync.sync_interval, Duration::from_secs(30));
        assert!(!config.sync.report_sessions);
        assert_eq!(config.curve, XpCurveConfig::default());
    }

    #[test]
    fn reads_every_knob() {
        let config = config_from(&[
            ("STATS_API_BASE_URL", "https://api.example.com/"),
            ("STATS_PROBE_FALLBACK_URL", ""),
            ("STATS_USER_ID", " learner-7 "),
            ("STATS_DATA_DIR", "/var/lib/progress"),
            ("SYNC_INTERVAL_SECS", "15"),
            ("SYNC_PROBE_INTERVAL_SECS", "120"),
            ("SYNC_FRESHNESS_SECS", "5"),
            ("SYNC_PROBE_TIMEOUT_MS", "750"),
            ("SYNC_REQUEST_TIMEOUT_MS", "2500"),
            ("SYNC_REPORT_SESSIONS", "yes"),
            ("XP_BASE_REQUIREMENT", "200"),
            ("XP_GROWTH_RATE", "1.3"),
            ("XP_ROUNDING_STEP", "10"),
        ]);

        assert_eq!(config.user_id(), "learner-7");
        assert_eq!(
            config.api.resolved_health_url().as_deref(),
            Some("https://api.example.com/health")
        );
        assert_eq!(config.api.probe_fallback_url, None);
        assert_eq!(config.api.probe_timeout, Duration::from_millis(750));
        assert_eq!(config.api.request_timeout, Duration::from_millis(2500));
        assert_eq!(config.data_dir(), PathBuf::from("/var/lib/progress"));
        assert_eq!(config.sync.sync_interval, Duration::from_secs(15));
        assert_eq!(config.sync.probe_interval, Duration::from_secs(120));
        assert_eq!(config.sync.freshness, Duration::from_secs(5));
        assert!(config.sync.report_sessions);
        assert_eq!(config.curve.base_requirement, 200);
        assert_eq!(config.curve.growth_rate, 1.3);
        assert_eq!(config.curve.rounding_step, 10);
    }

    #[test]
    fn unparsable_values_keep_defaults() {
        let config = config_from(&[
            ("SYNC_INTERVAL_SECS", "soon"),
            ("SYNC_REPORT_SESSIONS", "maybe"),
            ("XP_GROWTH_RATE", "fast"),
        ]);

        assert_eq!(config.sync.sync_interval, Duration::from_secs(30));
        assert!(!config.sync.report_sessions);
        assert_eq!(config.curve.growth_rate, XpCurveConfig::default().growth_rate);
    }
}
