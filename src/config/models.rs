use serde::Deserialize;
use std::time::Duration;

use super::defaults;

/// Flattened client configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct AppConfig {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub volume: f32,
    pub autoplay: bool,
    pub error_skip_delay_ms: u64,
    pub retained_cache_entries: usize,
    pub results_delay_ms: u64,
    pub voice_engine: String,
    pub voice_language: String,
    pub voice_slow: bool,
    pub log_level: LogLevel,
    pub key_toggle_play_pause: String,
    pub key_previous_page: String,
    pub key_next_page: String,
    pub key_volume_up: String,
    pub key_volume_down: String,
    pub key_close: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            server_url: defaults::default_server_url(),
            request_timeout_secs: defaults::default_request_timeout_secs(),
            volume: defaults::default_volume(),
            autoplay: defaults::default_autoplay(),
            error_skip_delay_ms: defaults::default_error_skip_delay_ms(),
            retained_cache_entries: defaults::default_retained_cache_entries(),
            results_delay_ms: defaults::default_results_delay_ms(),
            voice_engine: defaults::default_voice_engine(),
            voice_language: defaults::default_voice_language(),
            voice_slow: false,
            log_level: defaults::default_log_level(),
            key_toggle_play_pause: defaults::default_key_toggle_play_pause(),
            key_previous_page: defaults::default_key_previous_page(),
            key_next_page: defaults::default_key_next_page(),
            key_volume_up: defaults::default_key_volume_up(),
            key_volume_down: defaults::default_key_volume_down(),
            key_close: defaults::default_key_close(),
        }
    }
}

impl AppConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn error_skip_delay(&self) -> Duration {
        Duration::from_millis(self.error_skip_delay_ms)
    }

    pub fn results_delay(&self) -> Duration {
        Duration::from_millis(self.results_delay_ms)
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
