use super::super::super::messages::Message;
use super::super::super::state::App;
use crossterm::event::{KeyCode, KeyModifiers};
use tracing::trace;

impl App {
    pub(super) fn shortcut_message_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> Option<Message> {
        let pressed = match code {
            KeyCode::Char(' ') => "space".to_string(),
            KeyCode::Char(ch) => ch.to_ascii_lowercase().to_string(),
            KeyCode::Left => "left".to_string(),
            KeyCode::Right => "right".to_string(),
            KeyCode::Up => "up".to_string(),
            KeyCode::Down => "down".to_string(),
            KeyCode::Esc => "escape".to_string(),
            KeyCode::Enter => "enter".to_string(),
            _ => return None,
        };

        // Raw mode swallows SIGINT; treat ctrl+c as an interrupt.
        if Self::shortcut_matches("ctrl+c", "c", &pressed, modifiers) {
            return Some(if self.player.is_open() {
                Message::ClosePlayer
            } else {
                Message::Quit
            });
        }

        if !self.player.shortcuts_attached {
            trace!(key = %pressed, "Shortcuts detached; ignoring key");
            return None;
        }

        let config = &self.config;
        if Self::shortcut_matches(&config.key_toggle_play_pause, "space", &pressed, modifiers) {
            Some(Message::TogglePlayPause)
        } else if Self::shortcut_matches(&config.key_previous_page, "left", &pressed, modifiers) {
            Some(Message::PreviousPage)
        } else if Self::shortcut_matches(&config.key_next_page, "right", &pressed, modifiers) {
            Some(Message::NextPage)
        } else if Self::shortcut_matches(&config.key_volume_up, "up", &pressed, modifiers) {
            Some(Message::VolumeUp)
        } else if Self::shortcut_matches(&config.key_volume_down, "down", &pressed, modifiers) {
            Some(Message::VolumeDown)
        } else if Self::shortcut_matches(&config.key_close, "escape", &pressed, modifiers) {
            Some(Message::ClosePlayer)
        } else {
            None
        }
    }

    pub(super) fn shortcut_matches(
        raw: &str,
        fallback: &str,
        pressed: &str,
        modifiers: KeyModifiers,
    ) -> bool {
        let normalized = Self::normalize_shortcut_token(raw, fallback);

        let mut required_ctrl = false;
        let mut required_alt = false;
        let mut required_logo = false;
        let mut required_shift = false;
        let mut required_key: Option<&str> = None;

        for token in normalized
            .split('+')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            match token {
                "ctrl" | "control" => required_ctrl = true,
                "alt" => required_alt = true,
                "logo" | "meta" | "super" | "cmd" | "command" => required_logo = true,
                "shift" => required_shift = true,
                key => required_key = Some(key),
            }
        }

        let required_key = required_key.unwrap_or(fallback);
        if pressed != required_key {
            return false;
        }

        modifiers.contains(KeyModifiers::CONTROL) == required_ctrl
            && modifiers.contains(KeyModifiers::ALT) == required_alt
            && modifiers.contains(KeyModifiers::SUPER) == required_logo
            && modifiers.contains(KeyModifiers::SHIFT) == required_shift
    }

    pub(super) fn normalize_shortcut_token(raw: &str, fallback: &str) -> String {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return fallback.to_string();
        }
        normalized
            .split('+')
            .map(|token| match token.trim() {
                "spacebar" => "space",
                "esc" => "escape",
                "arrowleft" => "left",
                "arrowright" => "right",
                "arrowup" => "up",
                "arrowdown" => "down",
                other => other,
            })
            .collect::<Vec<_>>()
            .join("+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::RunMode;
    use crate::config::AppConfig;

    #[test]
    fn normalizes_aliases() {
        assert_eq!(App::normalize_shortcut_token(" SpaceBar ", "x"), "space");
        assert_eq!(App::normalize_shortcut_token("ArrowLeft", "x"), "left");
        assert_eq!(App::normalize_shortcut_token("Esc", "x"), "escape");
        assert_eq!(App::normalize_shortcut_token("", "right"), "right");
    }

    #[test]
    fn matches_ctrl_shortcut() {
        assert!(App::shortcut_matches(
            "ctrl+n",
            "x",
            "n",
            KeyModifiers::CONTROL
        ));
    }

    #[test]
    fn rejects_unexpected_extra_modifier() {
        assert!(!App::shortcut_matches(
            "ctrl+n",
            "x",
            "n",
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
        ));
    }

    #[test]
    fn keys_are_ignored_while_detached() {
        let mut app = App::new(AppConfig::default(), RunMode::Player);
        assert!(
            app.shortcut_message_for_key(KeyCode::Char(' '), KeyModifiers::NONE)
                .is_none()
        );
        app.player.shortcuts_attached = true;
        assert!(matches!(
            app.shortcut_message_for_key(KeyCode::Char(' '), KeyModifiers::NONE),
            Some(Message::TogglePlayPause)
        ));
        assert!(matches!(
            app.shortcut_message_for_key(KeyCode::Right, KeyModifiers::NONE),
            Some(Message::NextPage)
        ));
        assert!(matches!(
            app.shortcut_message_for_key(KeyCode::Esc, KeyModifiers::NONE),
            Some(Message::ClosePlayer)
        ));
    }

    #[test]
    fn ctrl_c_quits_even_when_detached() {
        let app = App::new(AppConfig::default(), RunMode::Conversion);
        assert!(matches!(
            app.shortcut_message_for_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Message::Quit)
        ));
    }
}
