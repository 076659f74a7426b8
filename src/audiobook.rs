//! Validated audiobook metadata handed to the player.

/// Identity of the audiobook a player session is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudiobookHandle {
    pub id: String,
    pub title: String,
    pub author: String,
    pub total_pages: u32,
}

/// One page of an audiobook and the locator of its audio segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub available: bool,
    pub stream_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudiobookPages {
    pub handle: AudiobookHandle,
    pub pages: Vec<Page>,
}
