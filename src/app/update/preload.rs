use super::super::state::App;
use super::Effect;
use tracing::debug;

impl App {
    pub(super) fn preload_next(&mut self, effects: &mut Vec<Effect>) {
        let Some(session) = self.player.session.as_ref() else {
            return;
        };
        if session.is_last_page() {
            return;
        }
        let next = session.current_page + 1;
        self.preload_page(next, effects);
    }

    /// Prime a page's audio ahead of need. Idempotent while the page is cached
    /// or already in flight.
    pub(super) fn preload_page(&mut self, page: u32, effects: &mut Vec<Effect>) {
        let Some(session) = self.player.session.as_ref() else {
            return;
        };
        let Some(entry) = session.page(page).filter(|entry| entry.available) else {
            return;
        };
        let key = session.key(page);
        if self.player.cache.contains(&key) || self.player.loading.contains(page) {
            return;
        }
        self.player.loading.begin(page);
        debug!(page, generation = session.generation(), "Preloading page");
        effects.push(Effect::Prime {
            generation: session.generation(),
            page,
            url: entry.stream_url.clone(),
        });
    }

    pub(super) fn handle_page_primed(&mut self, generation: u64, page: u32, ok: bool) {
        let Some(session) = self.player.session_for(generation) else {
            debug!(generation, page, "Ignoring stale preload completion");
            return;
        };
        let key = session.key(page);
        let locator = session.page(page).map(|entry| entry.stream_url.clone());
        self.player.loading.finish(page);
        match locator {
            Some(locator) if ok => {
                self.player.cache.insert(key, locator);
                debug!(page, "Preloaded page");
            }
            _ => debug!(page, "Preload did not complete; page stays uncached"),
        }
    }
}
