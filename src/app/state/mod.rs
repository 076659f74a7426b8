mod constants;
mod player;
mod progress;

use crate::config::AppConfig;

pub(crate) use constants::*;
pub(crate) use player::PlaybackLifecycle;
pub(in crate::app) use player::{PlaybackSession, PlayerState};
pub(crate) use progress::Applied;
pub(in crate::app) use progress::ProgressReporter;

/// What the process was started to do; decides when the event loop exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Interactive player; exits when the player closes.
    Player,
    /// Follow one conversion until its results are shown or it fails.
    Conversion,
    /// A single request/response exchange.
    OneShot,
}

/// Core application state composed of sub-models.
pub struct App {
    pub(super) config: AppConfig,
    pub(super) mode: RunMode,
    pub(super) player: PlayerState,
    pub(super) progress: ProgressReporter,
}

impl App {
    pub fn new(config: AppConfig, mode: RunMode) -> Self {
        let player = PlayerState::new(config.volume);
        Self {
            config,
            mode,
            player,
            progress: ProgressReporter::default(),
        }
    }
}
