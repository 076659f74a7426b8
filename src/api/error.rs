use thiserror::Error;

/// Failures at the HTTP boundary of the conversion service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}{}", format_detail(.detail))]
    Status {
        url: String,
        status: u16,
        detail: Option<String>,
    },

    #[error("malformed payload from {url}: {reason}")]
    Malformed { url: String, reason: String },

    #[error("{message}")]
    Rejected { message: String },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

fn format_detail(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl ApiError {
    pub(crate) fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::Malformed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn rejected(message: Option<String>, fallback: &str) -> Self {
        ApiError::Rejected {
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ApiError::Malformed { .. })
    }
}
