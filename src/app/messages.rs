use crate::api::models::{
    AudiobookListing, CollectionConversionRequest, ConversionRequest, ConversionStarted,
    ConversionSummary, LibraryStats,
};
use crate::audiobook::AudiobookPages;
use crate::output::OutputEvent;
use crate::push::PushEvent;
use crossterm::event::{KeyCode, KeyModifiers};
use std::path::PathBuf;

/// Inputs to the reducer: user intents, keyboard events and completions of
/// background work.
#[derive(Debug, Clone)]
pub enum Message {
    OpenAudiobook(String),
    PagesFetched {
        generation: u64,
        audiobook_id: String,
        result: Result<AudiobookPages, String>,
    },
    NextPage,
    PreviousPage,
    TogglePlayPause,
    VolumeUp,
    VolumeDown,
    ClosePlayer,
    KeyPressed {
        code: KeyCode,
        modifiers: KeyModifiers,
    },
    Output(OutputEvent),
    ErrorSkipDue {
        generation: u64,
        page: u32,
    },
    StartConversion(ConversionRequest),
    ConvertFromCollection(CollectionConversionRequest),
    ConversionStarted(Result<ConversionStarted, String>),
    WatchConversion(String),
    Push(PushEvent),
    ResultsDue {
        conversion_id: String,
    },
    FetchSummary(String),
    ConversionSummaryLoaded {
        conversion_id: String,
        result: Result<ConversionSummary, String>,
    },
    ListAudiobooks,
    AudiobooksListed(Result<Vec<AudiobookListing>, String>),
    DeleteAudiobook(String),
    AudiobookDeleted {
        audiobook_id: String,
        result: Result<(), String>,
    },
    FetchStats,
    StatsLoaded(Result<LibraryStats, String>),
    DownloadPage {
        conversion_id: String,
        page: u32,
        out: PathBuf,
    },
    PageDownloaded {
        conversion_id: String,
        page: u32,
        result: Result<(PathBuf, usize), String>,
    },
    Quit,
}
