//! Wire shapes of the conversion service and their boundary validation.
//!
//! Raw payloads are deserialized leniently (every field optional where the
//! server has been seen to omit it) and then validated into the strongly typed
//! values the rest of the client works with. Anything that does not fit is an
//! `ApiError::Malformed`.

use super::error::ApiError;
use crate::audiobook::{AudiobookHandle, AudiobookPages, Page};
use serde::{Deserialize, Serialize};

/// Identifiers arrive either as JSON numbers or strings depending on the
/// endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    pub fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudiobookPagesResponse {
    #[serde(default)]
    pub success: bool,
    pub audiobook: Option<RawAudiobook>,
    #[serde(default)]
    pub pages: Vec<RawPage>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAudiobook {
    pub id: Option<RawId>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub total_pages: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPage {
    pub page: u32,
    #[serde(default)]
    pub available: bool,
    pub stream_url: Option<String>,
}

impl AudiobookPagesResponse {
    /// Validate into player metadata. `fallback_id` is the id the request was
    /// issued for, used when the payload omits it.
    pub fn validate(self, url: &str, fallback_id: &str) -> Result<AudiobookPages, ApiError> {
        if !self.success {
            return Err(ApiError::rejected(
                self.message.or(self.error),
                "server could not load the audiobook",
            ));
        }
        let raw = self
            .audiobook
            .ok_or_else(|| ApiError::malformed(url, "missing `audiobook` object"))?;

        let mut raw_pages = self.pages;
        raw_pages.sort_by_key(|p| p.page);
        let mut pages = Vec::with_capacity(raw_pages.len());
        for (idx, raw_page) in raw_pages.into_iter().enumerate() {
            let expected = idx as u32 + 1;
            if raw_page.page != expected {
                return Err(ApiError::malformed(
                    url,
                    format!(
                        "page numbers must be contiguous from 1; expected {expected}, found {}",
                        raw_page.page
                    ),
                ));
            }
            // Empty for pages without a locator; the client substitutes the
            // canonical stream path.
            let stream_url = raw_page.stream_url.unwrap_or_default().trim().to_string();
            pages.push(Page {
                page: raw_page.page,
                available: raw_page.available,
                stream_url,
            });
        }

        let handle = AudiobookHandle {
            id: raw
                .id
                .map(RawId::into_string)
                .unwrap_or_else(|| fallback_id.to_string()),
            title: raw.title.unwrap_or_else(|| "Untitled".to_string()),
            author: raw.author.unwrap_or_else(|| "Unknown".to_string()),
            total_pages: raw.total_pages.unwrap_or(pages.len() as u32),
        };
        Ok(AudiobookPages { handle, pages })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VoiceSettings {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slow: Option<bool>,
}

/// Body of `POST /api/convert`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversionRequest {
    pub title: String,
    pub language: String,
    pub voice_engine: String,
    pub voice_settings: VoiceSettings,
}

/// Body of `POST /api/book/convert-from-collection`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectionConversionRequest {
    pub audiobook_id: String,
    pub voice_engine: String,
    pub voice_settings: VoiceSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversionStartResponse {
    pub success: Option<bool>,
    pub conversion_id: Option<String>,
    pub audiobook_id: Option<RawId>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionStarted {
    pub conversion_id: Option<String>,
    pub audiobook_id: Option<String>,
    pub message: Option<String>,
}

impl ConversionStartResponse {
    pub fn validate(self, url: &str) -> Result<ConversionStarted, ApiError> {
        if self.success == Some(false) || self.error.is_some() {
            return Err(ApiError::rejected(
                self.message.or(self.error),
                "server refused to start the conversion",
            ));
        }
        let conversion_id = self.conversion_id.filter(|id| !id.trim().is_empty());
        let audiobook_id = self.audiobook_id.map(RawId::into_string);
        if conversion_id.is_none() && audiobook_id.is_none() {
            return Err(ApiError::malformed(
                url,
                "neither `conversion_id` nor `audiobook_id` present",
            ));
        }
        Ok(ConversionStarted {
            conversion_id,
            audiobook_id,
            message: self.message,
        })
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AudioFile {
    pub page: u32,
    pub file: Option<String>,
}

/// `GET /api/conversion/{id}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConversionSummary {
    pub id: Option<String>,
    pub title: Option<String>,
    pub book_title: Option<String>,
    pub status: Option<String>,
    pub progress: Option<f64>,
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub audio_files: Vec<AudioFile>,
    pub error: Option<String>,
}

impl ConversionSummary {
    pub fn validate(self) -> Result<ConversionSummary, ApiError> {
        if self.id.is_none() && self.status.is_none() {
            return Err(ApiError::rejected(self.error, "conversion not found"));
        }
        Ok(self)
    }

    pub fn display_title(&self) -> &str {
        self.book_title
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("untitled")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudiobookListResponse {
    #[serde(default)]
    pub audiobooks: Vec<AudiobookListing>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AudiobookListing {
    pub id: RawId,
    pub title: Option<String>,
    pub author: Option<String>,
    pub status: Option<String>,
    pub total_pages: Option<u32>,
}

/// `GET /api/stats`. Only the per-user block is read.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    pub success: Option<bool>,
    pub user_stats: Option<LibraryStats>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LibraryStats {
    #[serde(default)]
    pub total_audiobooks: u32,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub processing: u32,
    #[serde(default)]
    pub failed: u32,
}

impl StatsResponse {
    pub fn validate(self, url: &str) -> Result<LibraryStats, ApiError> {
        if self.success == Some(false) || self.error.is_some() {
            return Err(ApiError::rejected(
                self.message.or(self.error),
                "server could not compute library stats",
            ));
        }
        self.user_stats
            .ok_or_else(|| ApiError::malformed(url, "missing `user_stats` object"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Acknowledgement {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl Acknowledgement {
    pub fn validate(self) -> Result<(), ApiError> {
        if self.success == Some(false) || self.error.is_some() {
            return Err(ApiError::rejected(
                self.message.or(self.error),
                "server rejected the request",
            ));
        }
        Ok(())
    }
}

/// Payload of the `conversion_progress` push event.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProgressUpdate {
    pub status: String,
    pub progress: Option<f64>,
    pub total_pages: Option<u32>,
    pub current_page: Option<u32>,
    #[serde(default)]
    pub message: String,
}

impl ProgressUpdate {
    pub fn validate(mut self) -> Result<ProgressUpdate, ApiError> {
        if self.status.trim().is_empty() {
            return Err(ApiError::malformed(
                "conversion_progress",
                "empty `status` field",
            ));
        }
        self.progress = self
            .progress
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 100.0));
        Ok(self)
    }
}
