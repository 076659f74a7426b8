use super::error::ApiError;
use super::models::{
    Acknowledgement, AudiobookListResponse, AudiobookListing, AudiobookPagesResponse,
    CollectionConversionRequest, ConversionRequest, ConversionStartResponse, ConversionStarted,
    ConversionSummary, LibraryStats, StatsResponse,
};
use crate::audiobook::AudiobookPages;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Async client for the conversion service's REST surface.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                url: base.to_string(),
                source,
            })?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an API path (no leading slash) against the configured base.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }

    /// Turn a locator returned by the server into an absolute URL. Absolute
    /// locators are passed through; root-relative ones resolve against the
    /// server origin.
    pub fn resolve_locator(&self, locator: &str) -> Result<String, ApiError> {
        Ok(self.base.join(locator.trim())?.to_string())
    }

    pub fn stream_url(&self, audiobook_id: &str, page: u32) -> Result<String, ApiError> {
        Ok(self
            .endpoint(&format!("api/audiobook/{audiobook_id}/stream/{page}"))?
            .to_string())
    }

    /// `GET /api/audiobook/{id}/pages`, with every page locator made absolute.
    pub async fn audiobook_pages(&self, audiobook_id: &str) -> Result<AudiobookPages, ApiError> {
        let url = self.endpoint(&format!("api/audiobook/{audiobook_id}/pages"))?;
        let raw: AudiobookPagesResponse = self.send_json(self.http.get(url.clone()), &url).await?;
        let mut validated = raw.validate(url.as_str(), audiobook_id)?;
        for page in &mut validated.pages {
            if !page.available {
                continue;
            }
            page.stream_url = if page.stream_url.is_empty() {
                self.stream_url(&validated.handle.id, page.page)?
            } else {
                self.resolve_locator(&page.stream_url)?
            };
        }
        info!(
            audiobook_id,
            pages = validated.pages.len(),
            "Fetched audiobook page metadata"
        );
        Ok(validated)
    }

    pub async fn start_conversion(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionStarted, ApiError> {
        let url = self.endpoint("api/convert")?;
        let raw: ConversionStartResponse = self.post_json(&url, request).await?;
        raw.validate(url.as_str())
    }

    pub async fn convert_from_collection(
        &self,
        request: &CollectionConversionRequest,
    ) -> Result<ConversionStarted, ApiError> {
        let url = self.endpoint("api/book/convert-from-collection")?;
        let raw: ConversionStartResponse = self.post_json(&url, request).await?;
        raw.validate(url.as_str())
    }

    pub async fn conversion(&self, conversion_id: &str) -> Result<ConversionSummary, ApiError> {
        let url = self.endpoint(&format!("api/conversion/{conversion_id}"))?;
        let raw: ConversionSummary = self.send_json(self.http.get(url.clone()), &url).await?;
        raw.validate()
    }

    pub async fn list_audiobooks(&self) -> Result<Vec<AudiobookListing>, ApiError> {
        let url = self.endpoint("api/audiobooks")?;
        let raw: AudiobookListResponse = self.send_json(self.http.get(url.clone()), &url).await?;
        Ok(raw.audiobooks)
    }

    pub async fn delete_audiobook(&self, audiobook_id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("api/audiobook/{audiobook_id}"))?;
        let body = self
            .send_raw(self.http.request(Method::DELETE, url.clone()), &url)
            .await?;
        if body.trim().is_empty() {
            return Ok(());
        }
        let ack: Acknowledgement = decode(&url, &body)?;
        ack.validate()
    }

    /// `GET /api/stats`.
    pub async fn stats(&self) -> Result<LibraryStats, ApiError> {
        let url = self.endpoint("api/stats")?;
        let raw: StatsResponse = self.send_json(self.http.get(url.clone()), &url).await?;
        raw.validate(url.as_str())
    }

    /// `GET /api/download/{conversion_id}/{page}`: the raw audio of one page
    /// of a finished conversion.
    pub async fn download_page(&self, conversion_id: &str, page: u32) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(&format!("api/download/{conversion_id}/{page}"))?;
        let body = self.send_bytes(self.http.get(url.clone()), &url).await?;
        if body.is_empty() {
            return Err(ApiError::malformed(url.as_str(), "empty audio body"));
        }
        info!(conversion_id, page, bytes = body.len(), "Downloaded page audio");
        Ok(body)
    }

    async fn post_json<B, T>(&self, url: &Url, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(self.http.post(url.clone()).json(body), url)
            .await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, ApiError> {
        let body = self.send_raw(request, url).await?;
        decode(url, &body)
    }

    async fn send_raw(&self, request: RequestBuilder, url: &Url) -> Result<String, ApiError> {
        let body = self.send_bytes(request, url).await?;
        String::from_utf8(body)
            .map_err(|err| ApiError::malformed(url.as_str(), format!("body is not UTF-8: {err}")))
    }

    async fn send_bytes(&self, request: RequestBuilder, url: &Url) -> Result<Vec<u8>, ApiError> {
        debug!(%url, "Sending API request");
        let response = request.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                detail: error_detail(&String::from_utf8_lossy(&body)),
            });
        }
        Ok(body.to_vec())
    }
}

fn decode<T: DeserializeOwned>(url: &Url, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::malformed(url.as_str(), err.to_string()))
}

/// Pull a human readable reason out of an error body, if it is JSON.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(*key)?.as_str().map(str::to_string))
}
