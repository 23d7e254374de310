//! Back-forward list snapshot

use url::Url;

/// An entry in the session history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackForwardItem {
    /// Engine identifier of the history entry
    pub id: u64,
    pub url: Url,
    pub initial_url: Url,
    pub title: Option<String>,
}

impl BackForwardItem {
    pub fn new(id: u64, url: Url) -> Self {
        Self {
            id,
            initial_url: url.clone(),
            url,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Snapshot of the session history
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackForwardList {
    /// Older entries, oldest first
    pub back: Vec<BackForwardItem>,
    pub current: Option<BackForwardItem>,
    /// Newer entries, nearest first
    pub forward: Vec<BackForwardItem>,
}

impl BackForwardList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn back_item(&self) -> Option<&BackForwardItem> {
        self.back.last()
    }

    pub fn forward_item(&self) -> Option<&BackForwardItem> {
        self.forward.first()
    }

    pub fn contains(&self, item: &BackForwardItem) -> bool {
        self.current.as_ref() == Some(item) || self.back.contains(item) || self.forward.contains(item)
    }

    pub fn len(&self) -> usize {
        self.back.len() + self.forward.len() + usize::from(self.current.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
