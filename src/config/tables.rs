use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

/// On-disk layout of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    conversion: ConversionConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    keys: KeysConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            server_url: tables.server.url,
            request_timeout_secs: tables.server.request_timeout_secs,
            volume: tables.playback.volume.clamp(0.0, 1.0),
            autoplay: tables.playback.autoplay,
            error_skip_delay_ms: tables.playback.error_skip_delay_ms,
            retained_cache_entries: tables
                .playback
                .retained_cache_entries
                .min(defaults::MAX_RETAINED_CACHE_ENTRIES),
            results_delay_ms: tables.conversion.results_delay_ms,
            voice_engine: tables.conversion.voice_engine,
            voice_language: tables.conversion.voice_language,
            voice_slow: tables.conversion.voice_slow,
            log_level: tables.logging.log_level,
            key_toggle_play_pause: tables.keys.toggle_play_pause,
            key_previous_page: tables.keys.previous_page,
            key_next_page: tables.keys.next_page,
            key_volume_up: tables.keys.volume_up,
            key_volume_down: tables.keys.volume_down,
            key_close: tables.keys.close,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            server: ServerConfig {
                url: config.server_url.clone(),
                request_timeout_secs: config.request_timeout_secs,
            },
            playback: PlaybackConfig {
                volume: config.volume,
                autoplay: config.autoplay,
                error_skip_delay_ms: config.error_skip_delay_ms,
                retained_cache_entries: config.retained_cache_entries,
            },
            conversion: ConversionConfig {
                results_delay_ms: config.results_delay_ms,
                voice_engine: config.voice_engine.clone(),
                voice_language: config.voice_language.clone(),
                voice_slow: config.voice_slow,
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            keys: KeysConfig {
                toggle_play_pause: config.key_toggle_play_pause.clone(),
                previous_page: config.key_previous_page.clone(),
                next_page: config.key_next_page.clone(),
                volume_up: config.key_volume_up.clone(),
                volume_down: config.key_volume_down.clone(),
                close: config.key_close.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ServerConfig {
    #[serde(default = "defaults::default_server_url")]
    url: String,
    #[serde(default = "defaults::default_request_timeout_secs")]
    request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            url: defaults::default_server_url(),
            request_timeout_secs: defaults::default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_volume")]
    volume: f32,
    #[serde(default = "defaults::default_autoplay")]
    autoplay: bool,
    #[serde(default = "defaults::default_error_skip_delay_ms")]
    error_skip_delay_ms: u64,
    #[serde(default = "defaults::default_retained_cache_entries")]
    retained_cache_entries: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            volume: defaults::default_volume(),
            autoplay: defaults::default_autoplay(),
            error_skip_delay_ms: defaults::default_error_skip_delay_ms(),
            retained_cache_entries: defaults::default_retained_cache_entries(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ConversionConfig {
    #[serde(default = "defaults::default_results_delay_ms")]
    results_delay_ms: u64,
    #[serde(default = "defaults::default_voice_engine")]
    voice_engine: String,
    #[serde(default = "defaults::default_voice_language")]
    voice_language: String,
    #[serde(default)]
    voice_slow: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            results_delay_ms: defaults::default_results_delay_ms(),
            voice_engine: defaults::default_voice_engine(),
            voice_language: defaults::default_voice_language(),
            voice_slow: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct KeysConfig {
    #[serde(default = "defaults::default_key_toggle_play_pause")]
    toggle_play_pause: String,
    #[serde(default = "defaults::default_key_previous_page")]
    previous_page: String,
    #[serde(default = "defaults::default_key_next_page")]
    next_page: String,
    #[serde(default = "defaults::default_key_volume_up")]
    volume_up: String,
    #[serde(default = "defaults::default_key_volume_down")]
    volume_down: String,
    #[serde(default = "defaults::default_key_close")]
    close: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        KeysConfig {
            toggle_play_pause: defaults::default_key_toggle_play_pause(),
            previous_page: defaults::default_key_previous_page(),
            next_page: defaults::default_key_next_page(),
            volume_up: defaults::default_key_volume_up(),
            volume_down: defaults::default_key_volume_down(),
            close: defaults::default_key_close(),
        }
    }
}
