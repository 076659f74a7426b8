use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// User-visible signals raised by the player and the progress reporter.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    AudiobookLoaded {
        title: String,
        author: String,
        total_pages: u32,
    },
    NowPlaying {
        page: u32,
        total_pages: u32,
    },
    PageUnavailable {
        page: u32,
    },
    PlaybackFailed {
        page: u32,
        error: String,
    },
    SessionComplete {
        title: String,
    },
    Volume(f32),
    Paused,
    Resumed,
    Progress {
        percentage: f64,
        status: String,
        current_page: Option<u32>,
        total_pages: Option<u32>,
        message: String,
    },
    ConversionFailed(String),
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
}

impl Notification {
    pub fn level(&self) -> Level {
        match self {
            Notification::SessionComplete { .. } | Notification::Success(_) => Level::Success,
            Notification::PageUnavailable { .. } | Notification::Warning(_) => Level::Warning,
            Notification::PlaybackFailed { .. }
            | Notification::ConversionFailed(_)
            | Notification::Error(_) => Level::Error,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::AudiobookLoaded {
                title,
                author,
                total_pages,
            } => write!(f, "Loaded \"{title}\" by {author} ({total_pages} pages)"),
            Notification::NowPlaying { page, total_pages } => {
                write!(f, "Page {page} of {total_pages}")
            }
            Notification::PageUnavailable { page } => {
                write!(f, "Page {page} is not available yet")
            }
            Notification::PlaybackFailed { page, error } => {
                write!(f, "Could not play page {page}: {error}")
            }
            Notification::SessionComplete { title } => write!(f, "Finished \"{title}\""),
            Notification::Volume(volume) => write!(f, "Volume {:.0}%", volume * 100.0),
            Notification::Paused => f.write_str("Paused"),
            Notification::Resumed => f.write_str("Playing"),
            Notification::Progress {
                percentage,
                status,
                current_page,
                total_pages,
                message,
            } => {
                write!(f, "[{percentage:>3.0}%] {status}")?;
                if let (Some(current), Some(total)) = (current_page, total_pages) {
                    write!(f, " page {current}/{total}")?;
                }
                if !message.is_empty() {
                    write!(f, ": {message}")?;
                }
                Ok(())
            }
            Notification::ConversionFailed(message) => write!(f, "Conversion failed: {message}"),
            Notification::Info(text)
            | Notification::Success(text)
            | Notification::Warning(text)
            | Notification::Error(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, Notification};

    #[test]
    fn progress_line_includes_counters_and_message() {
        let line = Notification::Progress {
            percentage: 42.4,
            status: "converting".to_string(),
            current_page: Some(3),
            total_pages: Some(10),
            message: "Converting page 3".to_string(),
        }
        .to_string();
        assert_eq!(line, "[ 42%] converting page 3/10: Converting page 3");
    }

    #[test]
    fn failures_are_errors() {
        assert_eq!(
            Notification::ConversionFailed("boom".to_string()).level(),
            Level::Error
        );
        assert_eq!(
            Notification::PageUnavailable { page: 3 }.level(),
            Level::Warning
        );
    }
}
