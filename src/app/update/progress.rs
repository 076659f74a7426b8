use super::super::notification::Notification;
use super::super::state::{App, Applied, RunMode};
use super::Effect;
use crate::api::models::{
    CollectionConversionRequest, ConversionRequest, ConversionStarted, ConversionSummary,
};
use crate::push::PushEvent;
use chrono::Local;
use tracing::{debug, info, warn};

impl App {
    pub(super) fn handle_start_conversion(
        &mut self,
        request: ConversionRequest,
        effects: &mut Vec<Effect>,
    ) {
        info!(title = %request.title, engine = %request.voice_engine, "Requesting conversion");
        effects.push(Effect::Notify(Notification::Info(format!(
            "Requesting conversion of \"{}\"",
            request.title
        ))));
        effects.push(Effect::SubmitConversion(request));
    }

    pub(super) fn handle_convert_from_collection(
        &mut self,
        request: CollectionConversionRequest,
        effects: &mut Vec<Effect>,
    ) {
        info!(audiobook_id = %request.audiobook_id, "Requesting conversion from collection");
        effects.push(Effect::SubmitCollectionConversion(request));
    }

    pub(super) fn handle_conversion_started(
        &mut self,
        result: Result<ConversionStarted, String>,
        effects: &mut Vec<Effect>,
    ) {
        match result {
            Ok(ConversionStarted {
                conversion_id: Some(conversion_id),
                message,
                ..
            }) => {
                if let Some(message) = message {
                    effects.push(Effect::Notify(Notification::Info(message)));
                }
                self.handle_watch_conversion(conversion_id, effects);
            }
            Ok(ConversionStarted {
                audiobook_id,
                message,
                ..
            }) => {
                let text = message.unwrap_or_else(|| {
                    format!(
                        "Audiobook {} is ready",
                        audiobook_id.as_deref().unwrap_or("?")
                    )
                });
                effects.push(Effect::Notify(Notification::Success(text)));
                self.exit_if(RunMode::Conversion, true, effects);
            }
            Err(err) => {
                warn!("Conversion request failed: {err}");
                effects.push(Effect::Notify(Notification::ConversionFailed(err)));
                self.exit_if(RunMode::Conversion, false, effects);
            }
        }
    }

    pub(super) fn handle_watch_conversion(
        &mut self,
        conversion_id: String,
        effects: &mut Vec<Effect>,
    ) {
        info!(%conversion_id, "Tracking conversion");
        self.progress.track(&conversion_id);
        effects.push(Effect::JoinConversion(conversion_id));
    }

    pub(super) fn handle_push_event(&mut self, event: PushEvent, effects: &mut Vec<Effect>) {
        match event {
            PushEvent::Connected => debug!("Push channel connected"),
            PushEvent::Joined { conversion_id } => {
                debug!(%conversion_id, "Joined conversion room");
            }
            PushEvent::Progress {
                conversion_id,
                update,
            } => self.handle_progress(conversion_id, update, effects),
            PushEvent::Malformed { reason } => {
                warn!("Malformed push payload: {reason}");
                effects.push(Effect::Notify(Notification::Warning(format!(
                    "Ignored malformed progress update: {reason}"
                ))));
            }
            PushEvent::Disconnected { reason } => {
                let waiting = self.progress.tracked.is_some() && self.progress.terminal.is_none();
                if !waiting {
                    debug!("Push channel closed: {reason}");
                    return;
                }
                warn!("Push channel lost while tracking: {reason}");
                effects.push(Effect::Notify(Notification::Error(format!(
                    "Lost connection to progress updates: {reason}"
                ))));
                self.exit_if(RunMode::Conversion, false, effects);
            }
        }
    }

    fn handle_progress(
        &mut self,
        conversion_id: String,
        update: crate::api::models::ProgressUpdate,
        effects: &mut Vec<Effect>,
    ) {
        match self.progress.apply(&conversion_id, update, Local::now()) {
            Applied::Ignored => {}
            Applied::Updated => self.notify_snapshot(effects),
            Applied::Completed => {
                self.notify_snapshot(effects);
                info!(%conversion_id, "Conversion completed");
                effects.push(Effect::Notify(Notification::Success(
                    "Conversion completed".to_string(),
                )));
                effects.push(Effect::ScheduleResults {
                    conversion_id,
                    delay: self.config.results_delay(),
                });
            }
            Applied::Failed(message) => {
                warn!(%conversion_id, "Conversion failed: {message}");
                effects.push(Effect::Notify(Notification::ConversionFailed(message)));
                self.exit_if(RunMode::Conversion, false, effects);
            }
        }
    }

    fn notify_snapshot(&self, effects: &mut Vec<Effect>) {
        let Some(snapshot) = self.progress.snapshot.as_ref() else {
            return;
        };
        effects.push(Effect::Notify(Notification::Progress {
            percentage: snapshot.percentage,
            status: snapshot.status_label.clone(),
            current_page: snapshot.current_page,
            total_pages: snapshot.total_pages,
            message: snapshot.message.clone(),
        }));
    }

    pub(super) fn handle_results_due(&mut self, conversion_id: String, effects: &mut Vec<Effect>) {
        if !self.progress.show_results(&conversion_id) {
            debug!(%conversion_id, "Results view already shown or conversion untracked");
            return;
        }
        info!(%conversion_id, "Showing conversion results");
        effects.push(Effect::FetchConversionSummary(conversion_id));
    }

    pub(super) fn handle_summary_loaded(
        &mut self,
        conversion_id: String,
        result: Result<ConversionSummary, String>,
        effects: &mut Vec<Effect>,
    ) {
        let success = match result {
            Ok(summary) => {
                let ready = summary
                    .audio_files
                    .iter()
                    .filter(|file| file.file.is_some())
                    .count();
                effects.push(Effect::Notify(Notification::Success(format!(
                    "\"{}\": {} ({ready} of {} pages with audio)",
                    summary.display_title(),
                    summary.status.as_deref().unwrap_or("unknown"),
                    summary
                        .total_pages
                        .unwrap_or(summary.audio_files.len() as u32),
                ))));
                if let Some(error) = summary.error {
                    effects.push(Effect::Notify(Notification::Warning(error)));
                }
                true
            }
            Err(err) => {
                warn!(%conversion_id, "Failed to load conversion summary: {err}");
                effects.push(Effect::Notify(Notification::Error(format!(
                    "Could not load conversion {conversion_id}: {err}"
                ))));
                false
            }
        };
        self.exit_if(RunMode::Conversion, success, effects);
        self.exit_if(RunMode::OneShot, success, effects);
    }
}
