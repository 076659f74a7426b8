pub(crate) fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_volume() -> f32 {
    1.0
}

pub(crate) fn default_autoplay() -> bool {
    true
}

pub(crate) fn default_error_skip_delay_ms() -> u64 {
    1000
}

/// Upper bound on cache entries kept across a player close.
pub(crate) const MAX_RETAINED_CACHE_ENTRIES: usize = 3;

pub(crate) fn default_retained_cache_entries() -> usize {
    MAX_RETAINED_CACHE_ENTRIES
}

pub(crate) fn default_results_delay_ms() -> u64 {
    2000
}

pub(crate) fn default_voice_engine() -> String {
    "gtts".to_string()
}

pub(crate) fn default_voice_language() -> String {
    "en".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}

pub(crate) fn default_key_toggle_play_pause() -> String {
    "space".to_string()
}

pub(crate) fn default_key_previous_page() -> String {
    "left".to_string()
}

pub(crate) fn default_key_next_page() -> String {
    "right".to_string()
}

pub(crate) fn default_key_volume_up() -> String {
    "up".to_string()
}

pub(crate) fn default_key_volume_down() -> String {
    "down".to_string()
}

pub(crate) fn default_key_close() -> String {
    "escape".to_string()
}
