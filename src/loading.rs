//! Pages whose audio resource is currently being resolved or primed.

use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct LoadingSet {
    pages: BTreeSet<u32>,
}

impl LoadingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page as in flight. Returns `false` when it already was.
    pub fn begin(&mut self, page: u32) -> bool {
        self.pages.insert(page)
    }

    /// Clear a page once its load settles, whatever the outcome.
    pub fn finish(&mut self, page: u32) -> bool {
        self.pages.remove(&page)
    }

    pub fn contains(&self, page: u32) -> bool {
        self.pages.contains(&page)
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::LoadingSet;

    #[test]
    fn begin_deduplicates_in_flight_pages() {
        let mut loading = LoadingSet::new();
        assert!(loading.begin(3));
        assert!(!loading.begin(3));
        assert_eq!(loading.len(), 1);
    }

    #[test]
    fn finish_removes_exactly_once() {
        let mut loading = LoadingSet::new();
        loading.begin(2);
        assert!(loading.finish(2));
        assert!(!loading.finish(2));
        assert!(loading.is_empty());
    }
}
