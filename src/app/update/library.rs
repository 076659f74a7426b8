use super::super::notification::Notification;
use super::super::state::{App, RunMode};
use super::Effect;
use crate::api::models::{AudiobookListing, LibraryStats};
use std::path::PathBuf;
use tracing::{info, warn};

impl App {
    pub(super) fn handle_fetch_summary(&mut self, conversion_id: String, effects: &mut Vec<Effect>) {
        effects.push(Effect::FetchConversionSummary(conversion_id));
    }

    pub(super) fn handle_list_audiobooks(&mut self, effects: &mut Vec<Effect>) {
        effects.push(Effect::ListAudiobooks);
    }

    pub(super) fn handle_audiobooks_listed(
        &mut self,
        result: Result<Vec<AudiobookListing>, String>,
        effects: &mut Vec<Effect>,
    ) {
        match result {
            Ok(listings) if listings.is_empty() => {
                effects.push(Effect::Notify(Notification::Info(
                    "The library is empty".to_string(),
                )));
            }
            Ok(listings) => {
                info!(count = listings.len(), "Listed audiobooks");
                for listing in listings {
                    effects.push(Effect::Notify(Notification::Info(listing_line(listing))));
                }
            }
            Err(err) => {
                warn!("Failed to list audiobooks: {err}");
                effects.push(Effect::Notify(Notification::Error(format!(
                    "Could not list audiobooks: {err}"
                ))));
                self.exit_if(RunMode::OneShot, false, effects);
                return;
            }
        }
        self.exit_if(RunMode::OneShot, true, effects);
    }

    pub(super) fn handle_delete_audiobook(
        &mut self,
        audiobook_id: String,
        effects: &mut Vec<Effect>,
    ) {
        let playing_it = self
            .player
            .session
            .as_ref()
            .is_some_and(|session| session.handle.id == audiobook_id);
        if playing_it {
            effects.push(Effect::Notify(Notification::Warning(
                "Close the player before deleting the audiobook it is playing".to_string(),
            )));
            return;
        }
        info!(%audiobook_id, "Deleting audiobook");
        effects.push(Effect::DeleteAudiobook(audiobook_id));
    }

    pub(super) fn handle_audiobook_deleted(
        &mut self,
        audiobook_id: String,
        result: Result<(), String>,
        effects: &mut Vec<Effect>,
    ) {
        let success = match result {
            Ok(()) => {
                effects.push(Effect::Notify(Notification::Success(format!(
                    "Deleted audiobook {audiobook_id}"
                ))));
                true
            }
            Err(err) => {
                warn!(%audiobook_id, "Delete failed: {err}");
                effects.push(Effect::Notify(Notification::Error(format!(
                    "Could not delete audiobook {audiobook_id}: {err}"
                ))));
                false
            }
        };
        self.exit_if(RunMode::OneShot, success, effects);
    }

    pub(super) fn handle_fetch_stats(&mut self, effects: &mut Vec<Effect>) {
        effects.push(Effect::FetchStats);
    }

    pub(super) fn handle_stats_loaded(
        &mut self,
        result: Result<LibraryStats, String>,
        effects: &mut Vec<Effect>,
    ) {
        let success = match result {
            Ok(stats) => {
                effects.push(Effect::Notify(Notification::Info(format!(
                    "{} audiobooks: {} completed, {} processing, {} failed",
                    stats.total_audiobooks, stats.completed, stats.processing, stats.failed
                ))));
                true
            }
            Err(err) => {
                warn!("Failed to load library stats: {err}");
                effects.push(Effect::Notify(Notification::Error(format!(
                    "Could not load library stats: {err}"
                ))));
                false
            }
        };
        self.exit_if(RunMode::OneShot, success, effects);
    }

    pub(super) fn handle_download_page(
        &mut self,
        conversion_id: String,
        page: u32,
        out: PathBuf,
        effects: &mut Vec<Effect>,
    ) {
        if page == 0 {
            effects.push(Effect::Notify(Notification::Error(
                "Pages are numbered from 1".to_string(),
            )));
            self.exit_if(RunMode::OneShot, false, effects);
            return;
        }
        info!(%conversion_id, page, out = %out.display(), "Downloading page audio");
        effects.push(Effect::DownloadPage {
            conversion_id,
            page,
            out,
        });
    }

    pub(super) fn handle_page_downloaded(
        &mut self,
        conversion_id: String,
        page: u32,
        result: Result<(PathBuf, usize), String>,
        effects: &mut Vec<Effect>,
    ) {
        let success = match result {
            Ok((path, bytes)) => {
                effects.push(Effect::Notify(Notification::Success(format!(
                    "Saved page {page} of {conversion_id} to {} ({bytes} bytes)",
                    path.display()
                ))));
                true
            }
            Err(err) => {
                warn!(%conversion_id, page, "Download failed: {err}");
                effects.push(Effect::Notify(Notification::Error(format!(
                    "Could not download page {page} of {conversion_id}: {err}"
                ))));
                false
            }
        };
        self.exit_if(RunMode::OneShot, success, effects);
    }
}

fn listing_line(listing: AudiobookListing) -> String {
    let id = listing.id.into_string();
    let title = listing.title.unwrap_or_else(|| "Untitled".to_string());
    let mut line = format!("{id:>6}  {title}");
    if let Some(author) = listing.author {
        line.push_str(&format!(" by {author}"));
    }
    if let Some(pages) = listing.total_pages {
        line.push_str(&format!(" ({pages} pages)"));
    }
    if let Some(status) = listing.status {
        line.push_str(&format!(" [{status}]"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::listing_line;
    use crate::api::models::{AudiobookListing, LibraryStats, RawId};
    use crate::app::messages::Message;
    use crate::app::notification::Notification;
    use crate::app::state::{App, RunMode};
    use crate::app::update::Effect;
    use crate::config::AppConfig;
    use std::path::PathBuf;

    fn one_shot() -> App {
        App::new(AppConfig::default(), RunMode::OneShot)
    }

    #[test]
    fn listing_line_skips_missing_fields() {
        let line = listing_line(AudiobookListing {
            id: RawId::Number(12),
            title: Some("Dune".to_string()),
            author: None,
            status: Some("completed".to_string()),
            total_pages: Some(40),
        });
        assert_eq!(line, "    12  Dune (40 pages) [completed]");
    }

    #[test]
    fn stats_are_printed_and_finish_the_run() {
        let mut app = one_shot();
        assert!(matches!(
            app.reduce(Message::FetchStats).as_slice(),
            [Effect::FetchStats]
        ));
        let effects = app.reduce(Message::StatsLoaded(Ok(LibraryStats {
            total_audiobooks: 4,
            completed: 3,
            processing: 1,
            failed: 0,
        })));
        assert!(matches!(
            effects.as_slice(),
            [
                Effect::Notify(Notification::Info(line)),
                Effect::Exit { success: true }
            ] if line == "4 audiobooks: 3 completed, 1 processing, 0 failed"
        ));
    }

    #[test]
    fn download_requests_page_and_reports_saved_file() {
        let mut app = one_shot();
        let effects = app.reduce(Message::DownloadPage {
            conversion_id: "c-9".to_string(),
            page: 4,
            out: PathBuf::from("page-4.mp3"),
        });
        assert!(matches!(
            effects.as_slice(),
            [Effect::DownloadPage { conversion_id, page: 4, .. }] if conversion_id == "c-9"
        ));

        let effects = app.reduce(Message::PageDownloaded {
            conversion_id: "c-9".to_string(),
            page: 4,
            result: Ok((PathBuf::from("page-4.mp3"), 2048)),
        });
        assert!(matches!(effects.last(), Some(Effect::Exit { success: true })));
    }

    #[test]
    fn failed_download_exits_unsuccessfully() {
        let mut app = one_shot();
        let effects = app.reduce(Message::PageDownloaded {
            conversion_id: "c-9".to_string(),
            page: 7,
            result: Err("HTTP 404: Audio file not found".to_string()),
        });
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notify(Notification::Error(m)) if m.contains("Audio file not found")
        )));
        assert!(matches!(effects.last(), Some(Effect::Exit { success: false })));

        let effects = app.reduce(Message::DownloadPage {
            conversion_id: "c-9".to_string(),
            page: 0,
            out: PathBuf::from("x.mp3"),
        });
        assert!(matches!(effects.last(), Some(Effect::Exit { success: false })));
    }
}
