//! Resolved audio locators per audiobook page.
//!
//! The cache lives for the whole process and survives player sessions. It only
//! shrinks when a session closes, at which point the most recently touched
//! entries are kept so reopening the same audiobook can skip resolution.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub audiobook_id: String,
    pub page: u32,
}

impl PageKey {
    pub fn new(audiobook_id: impl Into<String>, page: u32) -> Self {
        Self {
            audiobook_id: audiobook_id.into(),
            page,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    locator: String,
    touched: u64,
}

#[derive(Debug, Default)]
pub struct PageCache {
    entries: HashMap<PageKey, CacheEntry>,
    clock: u64,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Membership test; does not count as a touch.
    pub fn contains(&self, key: &PageKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a locator and mark it as most recently used.
    pub fn get(&mut self, key: &PageKey) -> Option<&str> {
        let tick = self.tick();
        let entry = self.entries.get_mut(key)?;
        entry.touched = tick;
        Some(entry.locator.as_str())
    }

    pub fn insert(&mut self, key: PageKey, locator: impl Into<String>) {
        let touched = self.tick();
        self.entries.insert(
            key,
            CacheEntry {
                locator: locator.into(),
                touched,
            },
        );
    }

    /// Drop everything except the `keep` most recently touched entries.
    pub fn retain_recent(&mut self, keep: usize) {
        if self.entries.len() <= keep {
            return;
        }
        let mut ticks: Vec<u64> = self.entries.values().map(|e| e.touched).collect();
        ticks.sort_unstable_by(|a, b| b.cmp(a));
        let cutoff = if keep == 0 { u64::MAX } else { ticks[keep - 1] };
        self.entries.retain(|_, entry| entry.touched >= cutoff);
    }

    fn tick(&mut self) -> u64 {
        self.clock = self.clock.wrapping_add(1);
        self.clock
    }
}
