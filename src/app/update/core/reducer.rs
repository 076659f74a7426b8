use super::super::super::messages::Message;
use super::super::super::state::{App, RunMode};
use super::super::Effect;
use tracing::debug;

impl App {
    pub(in crate::app) fn reduce(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::OpenAudiobook(audiobook_id) => {
                self.handle_open_audiobook(audiobook_id, &mut effects)
            }
            Message::PagesFetched {
                generation,
                audiobook_id,
                result,
            } => self.handle_pages_fetched(generation, audiobook_id, result, &mut effects),
            Message::NextPage => self.handle_next_page(&mut effects),
            Message::PreviousPage => self.handle_previous_page(&mut effects),
            Message::TogglePlayPause => self.handle_toggle_play_pause(&mut effects),
            Message::VolumeUp => self.handle_volume_up(&mut effects),
            Message::VolumeDown => self.handle_volume_down(&mut effects),
            Message::ClosePlayer => self.handle_close_player(&mut effects),
            Message::KeyPressed { code, modifiers } => {
                if let Some(shortcut) = self.shortcut_message_for_key(code, modifiers) {
                    effects.extend(self.reduce(shortcut));
                }
            }
            Message::Output(event) => self.handle_output_event(event, &mut effects),
            Message::ErrorSkipDue { generation, page } => {
                self.handle_error_skip_due(generation, page, &mut effects)
            }
            Message::StartConversion(request) => {
                self.handle_start_conversion(request, &mut effects)
            }
            Message::ConvertFromCollection(request) => {
                self.handle_convert_from_collection(request, &mut effects)
            }
            Message::ConversionStarted(result) => {
                self.handle_conversion_started(result, &mut effects)
            }
            Message::WatchConversion(conversion_id) => {
                self.handle_watch_conversion(conversion_id, &mut effects)
            }
            Message::Push(event) => self.handle_push_event(event, &mut effects),
            Message::ResultsDue { conversion_id } => {
                self.handle_results_due(conversion_id, &mut effects)
            }
            Message::FetchSummary(conversion_id) => {
                self.handle_fetch_summary(conversion_id, &mut effects)
            }
            Message::ConversionSummaryLoaded {
                conversion_id,
                result,
            } => self.handle_summary_loaded(conversion_id, result, &mut effects),
            Message::ListAudiobooks => self.handle_list_audiobooks(&mut effects),
            Message::AudiobooksListed(result) => {
                self.handle_audiobooks_listed(result, &mut effects)
            }
            Message::DeleteAudiobook(audiobook_id) => {
                self.handle_delete_audiobook(audiobook_id, &mut effects)
            }
            Message::AudiobookDeleted {
                audiobook_id,
                result,
            } => self.handle_audiobook_deleted(audiobook_id, result, &mut effects),
            Message::FetchStats => self.handle_fetch_stats(&mut effects),
            Message::StatsLoaded(result) => self.handle_stats_loaded(result, &mut effects),
            Message::DownloadPage {
                conversion_id,
                page,
                out,
            } => self.handle_download_page(conversion_id, page, out, &mut effects),
            Message::PageDownloaded {
                conversion_id,
                page,
                result,
            } => self.handle_page_downloaded(conversion_id, page, result, &mut effects),
            Message::Quit => self.handle_quit(&mut effects),
        }

        effects
    }

    fn handle_quit(&mut self, effects: &mut Vec<Effect>) {
        if self.player.is_open() || self.player.pending_open.is_some() {
            self.close_session(effects);
        }
        debug!(mode = ?self.mode, "Quit requested");
        let success = self.mode != RunMode::Conversion;
        effects.push(Effect::Exit { success });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ProgressUpdate;
    use crate::app::notification::Notification;
    use crate::app::state::PlaybackLifecycle;
    use crate::audiobook::{AudiobookHandle, AudiobookPages, Page};
    use crate::config::AppConfig;
    use crate::output::{OutputEvent, SegmentTag};
    use crate::push::PushEvent;

    fn book(total: u32, unavailable: &[u32]) -> AudiobookPages {
        AudiobookPages {
            handle: AudiobookHandle {
                id: "42".to_string(),
                title: "The Long Road".to_string(),
                author: "A. Writer".to_string(),
                total_pages: total,
            },
            pages: (1..=total)
                .map(|page| Page {
                    page,
                    available: !unavailable.contains(&page),
                    stream_url: format!("http://h/api/audiobook/42/stream/{page}"),
                })
                .collect(),
        }
    }

    fn opened(total: u32, unavailable: &[u32]) -> (App, u64) {
        let mut app = App::new(AppConfig::default(), RunMode::Player);
        app.reduce(Message::OpenAudiobook("42".to_string()));
        let generation = app.player.generation;
        app.reduce(Message::PagesFetched {
            generation,
            audiobook_id: "42".to_string(),
            result: Ok(book(total, unavailable)),
        });
        (app, generation)
    }

    fn current_page(app: &App) -> u32 {
        app.player
            .session
            .as_ref()
            .map(|s| s.current_page)
            .unwrap_or_default()
    }

    fn sources(effects: &[Effect]) -> Vec<u32> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::SetSource { page, .. } => Some(*page),
                _ => None,
            })
            .collect()
    }

    fn primes(effects: &[Effect]) -> Vec<u32> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Prime { page, .. } => Some(*page),
                _ => None,
            })
            .collect()
    }

    fn tag(generation: u64, page: u32) -> SegmentTag {
        SegmentTag { generation, page }
    }

    fn assert_in_bounds(app: &App) {
        if let Some(session) = app.player.session.as_ref() {
            assert!(session.current_page >= 1);
            assert!(session.current_page <= session.total_pages());
        }
    }

    #[test]
    fn open_loads_first_page_and_preloads_second() {
        let mut app = App::new(AppConfig::default(), RunMode::Player);
        let effects = app.reduce(Message::OpenAudiobook("42".to_string()));
        assert!(matches!(effects.as_slice(), [Effect::FetchPages { .. }]));

        let generation = app.player.generation;
        let effects = app.reduce(Message::PagesFetched {
            generation,
            audiobook_id: "42".to_string(),
            result: Ok(book(5, &[])),
        });
        assert_eq!(sources(&effects), vec![1]);
        assert_eq!(primes(&effects), vec![2]);
        assert!(effects.iter().any(|e| matches!(e, Effect::Play)));
        assert!(app.player.shortcuts_attached);
        assert!(app.player.loading.contains(2));
        assert!(!app.player.loading.contains(1));
        assert_eq!(current_page(&app), 1);
    }

    #[test]
    fn open_rejects_inconsistent_page_list() {
        let mut app = App::new(AppConfig::default(), RunMode::Player);
        app.reduce(Message::OpenAudiobook("42".to_string()));
        let mut pages = book(5, &[]);
        pages.pages.pop();
        let effects = app.reduce(Message::PagesFetched {
            generation: app.player.generation,
            audiobook_id: "42".to_string(),
            result: Ok(pages),
        });
        assert!(app.player.session.is_none());
        assert!(sources(&effects).is_empty());
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Exit { success: false }))
        );
    }

    #[test]
    fn boundaries_are_no_ops() {
        let (mut app, _) = opened(2, &[]);
        let effects = app.reduce(Message::PreviousPage);
        assert!(effects.is_empty());
        assert_eq!(current_page(&app), 1);

        app.reduce(Message::NextPage);
        assert_eq!(current_page(&app), 2);
        let effects = app.reduce(Message::NextPage);
        assert!(effects.is_empty());
        assert_eq!(current_page(&app), 2);
        assert_in_bounds(&app);
    }

    #[test]
    fn previous_preloads_the_page_before() {
        let (mut app, _) = opened(5, &[]);
        app.reduce(Message::NextPage);
        app.reduce(Message::NextPage);
        app.reduce(Message::NextPage);
        app.player.cache.retain_recent(0);
        let effects = app.reduce(Message::PreviousPage);
        assert_eq!(sources(&effects), vec![3]);
        assert_eq!(primes(&effects), vec![2]);
    }

    #[test]
    fn unavailable_page_leaves_current_page_unchanged() {
        let (mut app, _) = opened(5, &[3]);
        app.reduce(Message::NextPage);
        assert_eq!(current_page(&app), 2);

        let mut effects = Vec::new();
        assert!(!app.load_page(3, &mut effects));
        assert_eq!(current_page(&app), 2);
        assert!(sources(&effects).is_empty());
        assert!(matches!(
            effects.as_slice(),
            [Effect::Notify(Notification::PageUnavailable { page: 3 })]
        ));
        assert!(!app.player.loading.contains(3));
    }

    #[test]
    fn stepping_moves_past_an_unavailable_page() {
        let (mut app, _) = opened(5, &[3]);
        app.reduce(Message::NextPage);
        assert_eq!(current_page(&app), 2);

        let effects = app.reduce(Message::NextPage);
        assert_eq!(current_page(&app), 3);
        assert!(sources(&effects).is_empty());
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notify(Notification::PageUnavailable { page: 3 })
        )));
        assert!(effects.iter().any(|e| matches!(e, Effect::Stop)));
        assert_eq!(primes(&effects), vec![4]);
        assert_eq!(
            app.player.session.as_ref().unwrap().lifecycle,
            PlaybackLifecycle::Idle
        );

        let effects = app.reduce(Message::NextPage);
        assert_eq!(sources(&effects), vec![4]);
        assert!(effects.iter().any(|e| matches!(e, Effect::Play)));
        assert_eq!(current_page(&app), 4);

        app.reduce(Message::PreviousPage);
        assert_eq!(current_page(&app), 3);
        let effects = app.reduce(Message::PreviousPage);
        assert_eq!(sources(&effects), vec![2]);
        assert_eq!(current_page(&app), 2);
        assert_in_bounds(&app);
    }

    #[test]
    fn natural_end_into_unavailable_page_waits_for_next_step() {
        let (mut app, generation) = opened(5, &[3]);
        app.reduce(Message::NextPage);

        let effects = app.reduce(Message::Output(OutputEvent::Ended(tag(generation, 2))));
        assert_eq!(current_page(&app), 3);
        assert!(sources(&effects).is_empty());
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notify(Notification::PageUnavailable { page: 3 })
        )));

        let effects = app.reduce(Message::NextPage);
        assert_eq!(sources(&effects), vec![4]);
        assert_eq!(current_page(&app), 4);
    }

    #[test]
    fn failed_page_metadata_is_reported_and_exits_player() {
        let mut app = App::new(AppConfig::default(), RunMode::Player);
        app.reduce(Message::OpenAudiobook("42".to_string()));
        let effects = app.reduce(Message::PagesFetched {
            generation: app.player.generation,
            audiobook_id: "42".to_string(),
            result: Err("server could not load the audiobook".to_string()),
        });
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notify(Notification::Error(m)) if m.contains("server could not load the audiobook")
        )));
        assert!(matches!(
            effects.last(),
            Some(Effect::Exit { success: false })
        ));
        assert!(app.player.session.is_none());
        assert!(app.player.pending_open.is_none());
        assert!(!app.player.shortcuts_attached);
    }

    #[test]
    fn natural_end_advances_and_stops_after_last_page() {
        let (mut app, generation) = opened(5, &[]);
        app.reduce(Message::NextPage);
        assert_eq!(current_page(&app), 2);

        let effects = app.reduce(Message::Output(OutputEvent::Ended(tag(generation, 2))));
        assert_eq!(sources(&effects), vec![3]);
        assert_eq!(current_page(&app), 3);

        for page in 3..5 {
            app.reduce(Message::Output(OutputEvent::Ended(tag(generation, page))));
        }
        assert_eq!(current_page(&app), 5);

        let effects = app.reduce(Message::Output(OutputEvent::Ended(tag(generation, 5))));
        assert!(sources(&effects).is_empty());
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notify(Notification::SessionComplete { .. })
        )));
        let session = app.player.session.as_ref().unwrap();
        assert_eq!(session.current_page, 5);
        assert!(session.completed);
        assert_eq!(session.lifecycle, PlaybackLifecycle::Ready);
        assert_in_bounds(&app);
    }

    #[test]
    fn playback_error_skips_ahead_exactly_once() {
        let (mut app, generation) = opened(5, &[]);
        for _ in 0..3 {
            app.reduce(Message::NextPage);
        }
        assert_eq!(current_page(&app), 4);

        let effects = app.reduce(Message::Output(OutputEvent::Failed {
            tag: tag(generation, 4),
            error: "decode error".to_string(),
        }));
        assert!(sources(&effects).is_empty());
        let delay = effects.iter().find_map(|e| match e {
            Effect::ScheduleErrorSkip { page, delay, .. } => Some((*page, *delay)),
            _ => None,
        });
        assert_eq!(delay, Some((4, app.config.error_skip_delay())));

        let effects = app.reduce(Message::ErrorSkipDue {
            generation,
            page: 4,
        });
        assert_eq!(sources(&effects), vec![5]);
        assert_eq!(current_page(&app), 5);

        let effects = app.reduce(Message::ErrorSkipDue {
            generation,
            page: 4,
        });
        assert!(effects.is_empty());
        assert_eq!(current_page(&app), 5);
    }

    #[test]
    fn playback_error_on_last_page_is_terminal() {
        let (mut app, generation) = opened(1, &[]);
        let effects = app.reduce(Message::Output(OutputEvent::Failed {
            tag: tag(generation, 1),
            error: "404".to_string(),
        }));
        assert!(
            !effects
                .iter()
                .any(|e| matches!(e, Effect::ScheduleErrorSkip { .. }))
        );
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notify(Notification::PlaybackFailed { page: 1, .. })
        )));
    }

    #[test]
    fn preload_is_idempotent_and_loading_never_dangles() {
        let (mut app, generation) = opened(5, &[]);
        let mut effects = Vec::new();
        app.preload_page(2, &mut effects);
        assert!(effects.is_empty(), "page 2 is already in flight");

        app.reduce(Message::Output(OutputEvent::Primed {
            tag: tag(generation, 2),
            ok: true,
        }));
        assert!(!app.player.loading.contains(2));
        assert!(app.player.cache.contains(&app.player.session.as_ref().unwrap().key(2)));

        let mut effects = Vec::new();
        app.preload_page(2, &mut effects);
        assert!(effects.is_empty(), "page 2 is cached");

        let mut effects = Vec::new();
        app.preload_page(3, &mut effects);
        assert_eq!(primes(&effects), vec![3]);
        app.reduce(Message::Output(OutputEvent::Primed {
            tag: tag(generation, 3),
            ok: false,
        }));
        assert!(app.player.loading.is_empty());
        assert!(!app.player.cache.contains(&app.player.session.as_ref().unwrap().key(3)));
    }

    #[test]
    fn ready_segment_triggers_preload_of_next_page() {
        let (mut app, generation) = opened(5, &[]);
        app.reduce(Message::Output(OutputEvent::Primed {
            tag: tag(generation, 2),
            ok: true,
        }));
        app.reduce(Message::NextPage);
        app.player.loading.clear();
        app.player.cache.retain_recent(0);

        let effects = app.reduce(Message::Output(OutputEvent::Ready(tag(generation, 2))));
        assert_eq!(primes(&effects), vec![3]);
        assert_eq!(
            app.player.session.as_ref().unwrap().lifecycle,
            PlaybackLifecycle::Playing
        );
    }

    #[test]
    fn close_trims_cache_and_detaches_shortcuts() {
        let (mut app, generation) = opened(6, &[]);
        for page in 2..=6 {
            app.reduce(Message::Output(OutputEvent::Primed {
                tag: tag(generation, page),
                ok: true,
            }));
            app.reduce(Message::NextPage);
        }
        assert!(app.player.cache.len() > 3);

        let effects = app.reduce(Message::ClosePlayer);
        assert!(matches!(effects.first(), Some(Effect::Stop)));
        assert!(matches!(
            effects.last(),
            Some(Effect::Exit { success: true })
        ));
        assert!(app.player.session.is_none());
        assert!(app.player.loading.is_empty());
        assert!(!app.player.shortcuts_attached);
        assert_eq!(app.player.cache.len(), 3);
        for page in 4..=6 {
            assert!(
                app.player
                    .cache
                    .contains(&crate::cache::PageKey::new("42", page))
            );
        }
    }

    #[test]
    fn completions_for_closed_session_are_dropped() {
        let (mut app, generation) = opened(5, &[]);
        app.reduce(Message::ClosePlayer);

        assert!(
            app.reduce(Message::Output(OutputEvent::Ended(tag(generation, 1))))
                .is_empty()
        );
        assert!(
            app.reduce(Message::ErrorSkipDue {
                generation,
                page: 1
            })
            .is_empty()
        );
        app.reduce(Message::Output(OutputEvent::Primed {
            tag: tag(generation, 2),
            ok: true,
        }));
        assert!(app.player.loading.is_empty());
        assert!(
            !app.player
                .cache
                .contains(&crate::cache::PageKey::new("42", 2))
        );
    }

    #[test]
    fn stale_page_metadata_is_dropped() {
        let mut app = App::new(AppConfig::default(), RunMode::Player);
        app.reduce(Message::OpenAudiobook("1".to_string()));
        let stale = app.player.generation;
        app.reduce(Message::OpenAudiobook("42".to_string()));

        let effects = app.reduce(Message::PagesFetched {
            generation: stale,
            audiobook_id: "1".to_string(),
            result: Ok(book(3, &[])),
        });
        assert!(effects.is_empty());
        assert!(app.player.session.is_none());
        assert!(app.player.pending_open.is_some());
    }

    #[test]
    fn reopening_replaces_the_session() {
        let (mut app, first) = opened(3, &[]);
        app.reduce(Message::OpenAudiobook("42".to_string()));
        let second = app.player.generation;
        let effects = app.reduce(Message::PagesFetched {
            generation: second,
            audiobook_id: "42".to_string(),
            result: Ok(book(3, &[])),
        });
        assert!(matches!(effects.first(), Some(Effect::Stop)));
        let session = app.player.session.as_ref().unwrap();
        assert_ne!(session.generation(), first);
        assert_eq!(session.current_page, 1);
    }

    #[test]
    fn keys_drive_navigation_and_volume() {
        use crossterm::event::{KeyCode, KeyModifiers};
        let (mut app, _) = opened(3, &[]);
        app.reduce(Message::KeyPressed {
            code: KeyCode::Right,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(current_page(&app), 2);

        let effects = app.reduce(Message::KeyPressed {
            code: KeyCode::Up,
            modifiers: KeyModifiers::NONE,
        });
        assert!(effects.is_empty(), "volume already at maximum");
        let effects = app.reduce(Message::KeyPressed {
            code: KeyCode::Down,
            modifiers: KeyModifiers::NONE,
        });
        assert!(matches!(effects.first(), Some(Effect::SetVolume(v)) if (*v - 0.9).abs() < 1e-6));
    }

    #[test]
    fn volume_never_leaves_unit_range() {
        let mut app = App::new(AppConfig::default(), RunMode::Player);
        for _ in 0..15 {
            app.reduce(Message::VolumeDown);
        }
        assert_eq!(app.player.volume, 0.0);
        for _ in 0..15 {
            app.reduce(Message::VolumeUp);
        }
        assert_eq!(app.player.volume, 1.0);
    }

    #[test]
    fn toggle_pauses_and_resumes() {
        let (mut app, generation) = opened(3, &[]);
        app.reduce(Message::Output(OutputEvent::Ready(tag(generation, 1))));
        let effects = app.reduce(Message::TogglePlayPause);
        assert!(matches!(effects.first(), Some(Effect::Pause)));
        let effects = app.reduce(Message::TogglePlayPause);
        assert!(matches!(effects.first(), Some(Effect::Play)));
    }

    fn progress(status: &str, message: &str) -> Message {
        Message::Push(PushEvent::Progress {
            conversion_id: "c-1".to_string(),
            update: ProgressUpdate {
                status: status.to_string(),
                progress: Some(50.0),
                total_pages: Some(4),
                current_page: Some(2),
                message: message.to_string(),
            },
        })
    }

    #[test]
    fn completed_conversion_shows_results_once() {
        let mut app = App::new(AppConfig::default(), RunMode::Conversion);
        let effects = app.reduce(Message::WatchConversion("c-1".to_string()));
        assert!(matches!(effects.as_slice(), [Effect::JoinConversion(id)] if id == "c-1"));

        app.reduce(progress("converting", "Page 2"));
        let effects = app.reduce(progress("completed", "Done"));
        let scheduled = effects
            .iter()
            .filter(|e| matches!(e, Effect::ScheduleResults { .. }))
            .count();
        assert_eq!(scheduled, 1);

        let duplicate = app.reduce(progress("completed", "Done"));
        assert!(duplicate.is_empty());

        let effects = app.reduce(Message::ResultsDue {
            conversion_id: "c-1".to_string(),
        });
        assert!(matches!(
            effects.as_slice(),
            [Effect::FetchConversionSummary(id)] if id == "c-1"
        ));
        assert!(
            app.reduce(Message::ResultsDue {
                conversion_id: "c-1".to_string(),
            })
            .is_empty()
        );
        assert_eq!(app.progress.log.len(), 1);
    }

    #[test]
    fn failed_conversion_surfaces_message_verbatim() {
        let mut app = App::new(AppConfig::default(), RunMode::Conversion);
        app.reduce(Message::WatchConversion("c-1".to_string()));
        let effects = app.reduce(progress("failed", "Source book not found"));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notify(Notification::ConversionFailed(m)) if m == "Source book not found"
        )));
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Exit { success: false }))
        );
        assert!(
            !effects
                .iter()
                .any(|e| matches!(e, Effect::ScheduleResults { .. }))
        );
    }
}
