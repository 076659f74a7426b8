use super::super::notification::Notification;
use super::super::state::{App, MAX_VOLUME, MIN_VOLUME, PlaybackLifecycle, VOLUME_STEP};
use super::Effect;
use crate::output::{OutputEvent, SegmentTag};
use tracing::{debug, info, warn};

impl App {
    pub(super) fn handle_toggle_play_pause(&mut self, effects: &mut Vec<Effect>) {
        let Some(session) = self.player.session.as_mut() else {
            return;
        };
        if session.completed {
            // Replay the final page.
            session.resume_after_load = true;
            let page = session.current_page;
            self.load_page(page, effects);
            return;
        }
        match session.lifecycle {
            PlaybackLifecycle::Idle => {}
            PlaybackLifecycle::Playing => {
                session.lifecycle = PlaybackLifecycle::Paused;
                session.resume_after_load = false;
                effects.push(Effect::Pause);
                effects.push(Effect::Notify(Notification::Paused));
            }
            PlaybackLifecycle::Paused | PlaybackLifecycle::Ready => {
                session.lifecycle = PlaybackLifecycle::Playing;
                session.resume_after_load = true;
                effects.push(Effect::Play);
                effects.push(Effect::Notify(Notification::Resumed));
            }
            PlaybackLifecycle::Loading { page } => {
                session.resume_after_load = !session.resume_after_load;
                debug!(page, resume = session.resume_after_load, "Toggled autoplay while loading");
                if session.resume_after_load {
                    effects.push(Effect::Play);
                } else {
                    effects.push(Effect::Pause);
                }
            }
        }
    }

    pub(super) fn handle_volume_step(&mut self, delta: f32, effects: &mut Vec<Effect>) {
        let stepped = ((self.player.volume + delta) * 10.0).round() / 10.0;
        let volume = stepped.clamp(MIN_VOLUME, MAX_VOLUME);
        if (volume - self.player.volume).abs() < f32::EPSILON {
            return;
        }
        self.player.volume = volume;
        debug!(volume, "Volume changed");
        effects.push(Effect::SetVolume(volume));
        effects.push(Effect::Notify(Notification::Volume(volume)));
    }

    pub(super) fn handle_volume_up(&mut self, effects: &mut Vec<Effect>) {
        self.handle_volume_step(VOLUME_STEP, effects);
    }

    pub(super) fn handle_volume_down(&mut self, effects: &mut Vec<Effect>) {
        self.handle_volume_step(-VOLUME_STEP, effects);
    }

    pub(super) fn handle_output_event(&mut self, event: OutputEvent, effects: &mut Vec<Effect>) {
        match event {
            OutputEvent::Ready(tag) => self.handle_output_ready(tag, effects),
            OutputEvent::Ended(tag) => {
                if self.is_current_segment(tag) {
                    self.on_playback_ended(effects);
                } else {
                    debug!(?tag, "Ignoring stale end of segment");
                }
            }
            OutputEvent::Failed { tag, error } => {
                if self.is_current_segment(tag) {
                    self.on_playback_error(error, effects);
                } else {
                    debug!(?tag, "Ignoring stale playback failure: {error}");
                }
            }
            OutputEvent::Primed { tag, ok } => {
                self.handle_page_primed(tag.generation, tag.page, ok);
            }
        }
    }

    fn is_current_segment(&self, tag: SegmentTag) -> bool {
        self.player
            .session_for(tag.generation)
            .is_some_and(|session| session.current_page == tag.page)
    }

    fn handle_output_ready(&mut self, tag: SegmentTag, effects: &mut Vec<Effect>) {
        if !self.is_current_segment(tag) {
            debug!(?tag, "Ignoring stale ready segment");
            return;
        }
        if let Some(session) = self.player.session.as_mut() {
            session.lifecycle = if session.resume_after_load {
                PlaybackLifecycle::Playing
            } else {
                PlaybackLifecycle::Ready
            };
        }
        self.preload_next(effects);
    }

    pub(super) fn on_playback_ended(&mut self, effects: &mut Vec<Effect>) {
        let Some(session) = self.player.session.as_mut() else {
            return;
        };
        if !session.is_last_page() {
            session.resume_after_load = true;
            self.handle_next_page(effects);
            return;
        }
        session.completed = true;
        session.lifecycle = PlaybackLifecycle::Ready;
        info!(
            audiobook_id = %session.handle.id,
            "Reached the end of the audiobook"
        );
        effects.push(Effect::Notify(Notification::SessionComplete {
            title: session.handle.title.clone(),
        }));
    }

    pub(super) fn on_playback_error(&mut self, error: String, effects: &mut Vec<Effect>) {
        let Some(session) = self.player.session.as_mut() else {
            return;
        };
        let page = session.current_page;
        warn!(page, "Playback failed: {error}");
        session.lifecycle = PlaybackLifecycle::Ready;
        effects.push(Effect::Notify(Notification::PlaybackFailed { page, error }));
        if session.is_last_page() {
            session.completed = true;
            return;
        }
        effects.push(Effect::ScheduleErrorSkip {
            generation: session.generation(),
            page,
            delay: self.config.error_skip_delay(),
        });
    }

    pub(super) fn handle_error_skip_due(
        &mut self,
        generation: u64,
        page: u32,
        effects: &mut Vec<Effect>,
    ) {
        let Some(session) = self.player.session_for_mut(generation) else {
            debug!(generation, page, "Ignoring stale error skip");
            return;
        };
        if session.current_page != page {
            debug!(page, current = session.current_page, "Page changed before error skip");
            return;
        }
        info!(from = page, "Skipping past failed page");
        session.resume_after_load = true;
        self.handle_next_page(effects);
    }
}
