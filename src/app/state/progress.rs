use crate::api::models::ProgressUpdate;
use chrono::{DateTime, Local};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    Initializing,
    Processing,
    Completed,
    Failed,
}

impl ConversionStatus {
    /// Map a server status label. Unknown labels count as work in progress.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "initializing" | "queued" | "started" => ConversionStatus::Initializing,
            "completed" => ConversionStatus::Completed,
            "failed" | "error" => ConversionStatus::Failed,
            _ => ConversionStatus::Processing,
        }
    }
}

/// Latest server snapshot of one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionProgress {
    pub conversion_id: String,
    pub percentage: f64,
    pub status: ConversionStatus,
    pub status_label: String,
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub received_at: DateTime<Local>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressView {
    Idle,
    Tracking,
    Results,
}

/// Outcome of feeding one push event into the reporter.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Ignored,
    Updated,
    Completed,
    Failed(String),
}

#[derive(Debug)]
pub struct ProgressReporter {
    pub(in crate::app) tracked: Option<String>,
    pub(in crate::app) snapshot: Option<ConversionProgress>,
    pub(in crate::app) log: Vec<LogEntry>,
    pub(in crate::app) terminal: Option<ConversionStatus>,
    pub(in crate::app) view: ProgressView,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self {
            tracked: None,
            snapshot: None,
            log: Vec::new(),
            terminal: None,
            view: ProgressView::Idle,
        }
    }
}

impl ProgressReporter {
    pub(in crate::app) fn track(&mut self, conversion_id: &str) {
        self.tracked = Some(conversion_id.to_string());
        self.snapshot = None;
        self.log.clear();
        self.terminal = None;
        self.view = ProgressView::Tracking;
    }

    pub(in crate::app) fn is_tracking(&self, conversion_id: &str) -> bool {
        self.tracked.as_deref() == Some(conversion_id)
    }

    pub(in crate::app) fn apply(
        &mut self,
        conversion_id: &str,
        update: ProgressUpdate,
        received_at: DateTime<Local>,
    ) -> Applied {
        if !self.is_tracking(conversion_id) {
            debug!(conversion_id, "Ignoring progress for untracked conversion");
            return Applied::Ignored;
        }
        if let Some(terminal) = self.terminal {
            debug!(conversion_id, ?terminal, "Ignoring progress after terminal status");
            return Applied::Ignored;
        }

        let status = ConversionStatus::from_label(&update.status);
        let percentage = match (update.progress, &self.snapshot) {
            (Some(progress), _) => progress,
            (None, _) if status == ConversionStatus::Completed => 100.0,
            (None, Some(previous)) => previous.percentage,
            (None, None) => 0.0,
        };
        self.snapshot = Some(ConversionProgress {
            conversion_id: conversion_id.to_string(),
            percentage,
            status,
            status_label: update.status,
            current_page: update.current_page,
            total_pages: update.total_pages,
            message: update.message.clone(),
        });

        match status {
            ConversionStatus::Completed => {
                self.terminal = Some(status);
                Applied::Completed
            }
            ConversionStatus::Failed => {
                self.terminal = Some(status);
                Applied::Failed(update.message)
            }
            ConversionStatus::Initializing | ConversionStatus::Processing => {
                if !update.message.is_empty() {
                    self.log.push(LogEntry {
                        received_at,
                        message: update.message,
                    });
                }
                Applied::Updated
            }
        }
    }

    /// Switch to the results view. Returns `false` when already shown or the
    /// conversion is no longer tracked.
    pub(in crate::app) fn show_results(&mut self, conversion_id: &str) -> bool {
        if !self.is_tracking(conversion_id) || self.view == ProgressView::Results {
            return false;
        }
        self.view = ProgressView::Results;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(status: &str, progress: Option<f64>, message: &str) -> ProgressUpdate {
        ProgressUpdate {
            status: status.to_string(),
            progress,
            total_pages: Some(10),
            current_page: Some(2),
            message: message.to_string(),
        }
    }

    #[test]
    fn maps_server_labels() {
        assert_eq!(
            ConversionStatus::from_label("queued"),
            ConversionStatus::Initializing
        );
        assert_eq!(
            ConversionStatus::from_label("extracting"),
            ConversionStatus::Processing
        );
        assert_eq!(
            ConversionStatus::from_label("Completed"),
            ConversionStatus::Completed
        );
        assert_eq!(
            ConversionStatus::from_label("error"),
            ConversionStatus::Failed
        );
    }

    #[test]
    fn snapshot_is_overwritten_and_log_appended() {
        let mut reporter = ProgressReporter::default();
        reporter.track("c1");
        let now = Local::now();
        assert_eq!(
            reporter.apply("c1", update("downloading", Some(10.0), "Downloading"), now),
            Applied::Updated
        );
        assert_eq!(
            reporter.apply("c1", update("converting", None, ""), now),
            Applied::Updated
        );
        let snapshot = reporter.snapshot.clone().unwrap();
        assert_eq!(snapshot.status_label, "converting");
        assert_eq!(snapshot.percentage, 10.0);
        assert_eq!(reporter.log.len(), 1);
        assert_eq!(reporter.log[0].message, "Downloading");
        assert_eq!(reporter.log[0].received_at, now);
    }

    #[test]
    fn other_conversions_and_post_terminal_events_are_ignored() {
        let mut reporter = ProgressReporter::default();
        reporter.track("c1");
        let now = Local::now();
        assert_eq!(
            reporter.apply("c2", update("converting", Some(5.0), "x"), now),
            Applied::Ignored
        );
        assert_eq!(
            reporter.apply("c1", update("failed", None, "disk full"), now),
            Applied::Failed("disk full".to_string())
        );
        assert_eq!(
            reporter.apply("c1", update("completed", Some(100.0), ""), now),
            Applied::Ignored
        );
        assert_eq!(reporter.terminal, Some(ConversionStatus::Failed));
    }

    #[test]
    fn results_view_shows_once() {
        let mut reporter = ProgressReporter::default();
        reporter.track("c1");
        assert!(!reporter.show_results("other"));
        assert!(reporter.show_results("c1"));
        assert!(!reporter.show_results("c1"));
    }
}
