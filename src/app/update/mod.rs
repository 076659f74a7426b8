use super::notification::Notification;
use crate::api::models::{CollectionConversionRequest, ConversionRequest};
use crate::cancellation::SessionToken;
use std::path::PathBuf;
use std::time::Duration;

mod core;
mod library;
mod navigation;
mod playback;
mod preload;
mod progress;

pub(in crate::app) use self::core::{Flow, Runtime};

/// Describes work that must be performed outside the pure reducer.
#[derive(Debug)]
pub(in crate::app) enum Effect {
    FetchPages {
        token: SessionToken,
        audiobook_id: String,
    },
    SetSource {
        generation: u64,
        page: u32,
        url: String,
    },
    Prime {
        generation: u64,
        page: u32,
        url: String,
    },
    Play,
    Pause,
    Stop,
    SetVolume(f32),
    ScheduleErrorSkip {
        generation: u64,
        page: u32,
        delay: Duration,
    },
    SubmitConversion(ConversionRequest),
    SubmitCollectionConversion(CollectionConversionRequest),
    JoinConversion(String),
    ScheduleResults {
        conversion_id: String,
        delay: Duration,
    },
    FetchConversionSummary(String),
    ListAudiobooks,
    DeleteAudiobook(String),
    FetchStats,
    DownloadPage {
        conversion_id: String,
        page: u32,
        out: PathBuf,
    },
    Notify(Notification),
    Exit {
        success: bool,
    },
}
