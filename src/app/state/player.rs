use super::constants::{FIRST_PAGE, MAX_VOLUME, MIN_VOLUME};
use crate::audiobook::{AudiobookHandle, Page};
use crate::cache::{PageCache, PageKey};
use crate::cancellation::SessionToken;
use crate::loading::LoadingSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackLifecycle {
    Idle,
    /// Source assigned, output has not reported it decodable yet.
    Loading {
        page: u32,
    },
    Ready,
    Playing,
    Paused,
}

/// One open-to-close cycle of the player for one audiobook.
#[derive(Debug)]
pub struct PlaybackSession {
    pub(in crate::app) token: SessionToken,
    pub(in crate::app) handle: AudiobookHandle,
    pub(in crate::app) pages: Vec<Page>,
    pub(in crate::app) current_page: u32,
    pub(in crate::app) lifecycle: PlaybackLifecycle,
    pub(in crate::app) resume_after_load: bool,
    pub(in crate::app) completed: bool,
}

impl PlaybackSession {
    pub(in crate::app) fn new(
        token: SessionToken,
        handle: AudiobookHandle,
        pages: Vec<Page>,
        autoplay: bool,
    ) -> Self {
        Self {
            token,
            handle,
            pages,
            current_page: FIRST_PAGE,
            lifecycle: PlaybackLifecycle::Idle,
            resume_after_load: autoplay,
            completed: false,
        }
    }

    pub(in crate::app) fn generation(&self) -> u64 {
        self.token.generation()
    }

    pub(in crate::app) fn total_pages(&self) -> u32 {
        self.handle.total_pages
    }

    pub(in crate::app) fn contains_page(&self, page: u32) -> bool {
        (FIRST_PAGE..=self.total_pages()).contains(&page)
    }

    pub(in crate::app) fn page(&self, page: u32) -> Option<&Page> {
        if !self.contains_page(page) {
            return None;
        }
        self.pages.get((page - FIRST_PAGE) as usize)
    }

    pub(in crate::app) fn is_last_page(&self) -> bool {
        self.current_page >= self.total_pages()
    }

    pub(in crate::app) fn key(&self, page: u32) -> PageKey {
        PageKey::new(self.handle.id.clone(), page)
    }
}

/// Audio player model (configuration lives in `AppConfig`).
#[derive(Debug)]
pub struct PlayerState {
    pub(in crate::app) session: Option<PlaybackSession>,
    pub(in crate::app) pending_open: Option<SessionToken>,
    pub(in crate::app) cache: PageCache,
    pub(in crate::app) loading: LoadingSet,
    pub(in crate::app) generation: u64,
    pub(in crate::app) volume: f32,
    pub(in crate::app) shortcuts_attached: bool,
}

impl PlayerState {
    pub(in crate::app) fn new(volume: f32) -> Self {
        Self {
            session: None,
            pending_open: None,
            cache: PageCache::new(),
            loading: LoadingSet::new(),
            generation: 0,
            volume: volume.clamp(MIN_VOLUME, MAX_VOLUME),
            shortcuts_attached: false,
        }
    }

    /// Allocate a token for a new session generation.
    pub(in crate::app) fn next_token(&mut self) -> SessionToken {
        self.generation = self.generation.wrapping_add(1);
        SessionToken::new(self.generation)
    }

    /// The session a completion was issued for, if it is still the active one.
    pub(in crate::app) fn session_for(&self, generation: u64) -> Option<&PlaybackSession> {
        self.session
            .as_ref()
            .filter(|session| session.generation() == generation)
    }

    pub(in crate::app) fn session_for_mut(
        &mut self,
        generation: u64,
    ) -> Option<&mut PlaybackSession> {
        self.session
            .as_mut()
            .filter(|session| session.generation() == generation)
    }

    pub(in crate::app) fn is_open(&self) -> bool {
        self.session.is_some()
    }
}
