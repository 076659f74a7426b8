use super::super::notification::Notification;
use super::super::state::{App, FIRST_PAGE, PlaybackLifecycle, PlaybackSession, RunMode};
use super::Effect;
use crate::audiobook::AudiobookPages;
use crate::cancellation::SessionToken;
use tracing::{debug, info, warn};

impl App {
    pub(super) fn handle_open_audiobook(&mut self, audiobook_id: String, effects: &mut Vec<Effect>) {
        if let Some(previous) = self.player.pending_open.take() {
            previous.cancel();
        }
        let token = self.player.next_token();
        info!(
            %audiobook_id,
            generation = token.generation(),
            "Requesting audiobook page metadata"
        );
        self.player.pending_open = Some(token.clone());
        effects.push(Effect::FetchPages {
            token,
            audiobook_id,
        });
    }

    pub(super) fn handle_pages_fetched(
        &mut self,
        generation: u64,
        audiobook_id: String,
        result: Result<AudiobookPages, String>,
        effects: &mut Vec<Effect>,
    ) {
        let token = match self.player.pending_open.take() {
            Some(token) if token.generation() == generation => token,
            other => {
                self.player.pending_open = other;
                debug!(generation, %audiobook_id, "Ignoring stale page metadata");
                return;
            }
        };
        match result {
            Ok(AudiobookPages { handle, pages }) => {
                self.open_session(token, handle, pages, effects);
            }
            Err(err) => {
                warn!(%audiobook_id, "Failed to load audiobook pages: {err}");
                effects.push(Effect::Notify(Notification::Error(format!(
                    "Could not open audiobook {audiobook_id}: {err}"
                ))));
                self.exit_if(RunMode::Player, false, effects);
            }
        }
    }

    /// Start a session for `handle`, replacing whatever session is active.
    pub(super) fn open_session(
        &mut self,
        token: SessionToken,
        handle: crate::audiobook::AudiobookHandle,
        pages: Vec<crate::audiobook::Page>,
        effects: &mut Vec<Effect>,
    ) {
        if pages.is_empty() || pages.len() != handle.total_pages as usize {
            warn!(
                audiobook_id = %handle.id,
                pages = pages.len(),
                total_pages = handle.total_pages,
                "Rejecting audiobook with inconsistent page list"
            );
            effects.push(Effect::Notify(Notification::Error(format!(
                "\"{}\" has no playable pages",
                handle.title
            ))));
            self.exit_if(RunMode::Player, false, effects);
            return;
        }

        if self.player.is_open() {
            self.close_session(effects);
        }

        info!(
            audiobook_id = %handle.id,
            generation = token.generation(),
            total_pages = handle.total_pages,
            "Opening player session"
        );
        effects.push(Effect::Notify(Notification::AudiobookLoaded {
            title: handle.title.clone(),
            author: handle.author.clone(),
            total_pages: handle.total_pages,
        }));
        effects.push(Effect::SetVolume(self.player.volume));
        self.player.session = Some(PlaybackSession::new(
            token,
            handle,
            pages,
            self.config.autoplay,
        ));
        self.player.shortcuts_attached = true;

        if self.load_page(FIRST_PAGE, effects) {
            self.preload_next(effects);
        }
    }

    /// Assign page `page` as the output source. Returns whether the current
    /// page changed.
    pub(super) fn load_page(&mut self, page: u32, effects: &mut Vec<Effect>) -> bool {
        let Some(session) = self.player.session.as_mut() else {
            return false;
        };
        if !session.contains_page(page) {
            warn!(page, total_pages = session.total_pages(), "Refusing out-of-range page");
            return false;
        }
        let Some(entry) = session.page(page).filter(|entry| entry.available) else {
            info!(page, "Page is unavailable");
            effects.push(Effect::Notify(Notification::PageUnavailable { page }));
            return false;
        };
        let stream_url = entry.stream_url.clone();
        let key = session.key(page);
        let generation = session.generation();

        let url = if let Some(locator) = self.player.cache.get(&key) {
            debug!(page, "Serving page from cache");
            locator.to_string()
        } else {
            self.player.loading.begin(page);
            self.player.cache.insert(key, stream_url.clone());
            self.player.loading.finish(page);
            stream_url
        };
        effects.push(Effect::SetSource {
            generation,
            page,
            url,
        });

        session.current_page = page;
        session.completed = false;
        session.lifecycle = PlaybackLifecycle::Loading { page };
        if session.resume_after_load {
            effects.push(Effect::Play);
        }
        info!(page, generation, "Loaded page");
        effects.push(Effect::Notify(Notification::NowPlaying {
            page,
            total_pages: session.total_pages(),
        }));
        true
    }

    pub(super) fn handle_next_page(&mut self, effects: &mut Vec<Effect>) {
        let Some(session) = self.player.session.as_ref() else {
            return;
        };
        if session.is_last_page() {
            debug!(page = session.current_page, "Already on the last page");
            return;
        }
        let target = session.current_page + 1;
        self.step_to(target, effects);
        self.preload_page(target + 1, effects);
    }

    pub(super) fn handle_previous_page(&mut self, effects: &mut Vec<Effect>) {
        let Some(session) = self.player.session.as_ref() else {
            return;
        };
        if session.current_page <= FIRST_PAGE {
            debug!("Already on the first page");
            return;
        }
        let target = session.current_page - 1;
        self.step_to(target, effects);
        if target > FIRST_PAGE {
            self.preload_page(target - 1, effects);
        }
    }

    /// Move the cursor to `page` and try to load it. An unavailable page
    /// still becomes current so the following step can move past it; the
    /// output is stopped while it is current.
    fn step_to(&mut self, page: u32, effects: &mut Vec<Effect>) {
        if self.load_page(page, effects) {
            return;
        }
        let Some(session) = self.player.session.as_mut() else {
            return;
        };
        if !session.contains_page(page) {
            return;
        }
        debug!(page, from = session.current_page, "Stepping onto unavailable page");
        session.current_page = page;
        session.completed = false;
        session.lifecycle = PlaybackLifecycle::Idle;
        effects.push(Effect::Stop);
    }

    pub(super) fn handle_close_player(&mut self, effects: &mut Vec<Effect>) {
        if !self.player.is_open() && self.player.pending_open.is_none() {
            return;
        }
        self.close_session(effects);
        effects.push(Effect::Notify(Notification::Info("Player closed".to_string())));
        self.exit_if(RunMode::Player, true, effects);
    }

    /// Tear down the active session. In-flight work for it becomes stale.
    pub(super) fn close_session(&mut self, effects: &mut Vec<Effect>) {
        effects.push(Effect::Stop);
        if let Some(session) = self.player.session.take() {
            session.token.cancel();
            info!(
                audiobook_id = %session.handle.id,
                generation = session.generation(),
                page = session.current_page,
                "Closed player session"
            );
        }
        if let Some(pending) = self.player.pending_open.take() {
            pending.cancel();
        }
        if !self.player.loading.is_empty() {
            debug!("Abandoning in-flight page loads");
            self.player.loading.clear();
        }
        self.player
            .cache
            .retain_recent(self.config.retained_cache_entries);
        debug!(retained = self.player.cache.len(), "Trimmed page cache");
        self.player.shortcuts_attached = false;
        self.player.generation = self.player.generation.wrapping_add(1);
    }

    pub(super) fn exit_if(&self, mode: RunMode, success: bool, effects: &mut Vec<Effect>) {
        if self.mode == mode {
            effects.push(Effect::Exit { success });
        }
    }
}
