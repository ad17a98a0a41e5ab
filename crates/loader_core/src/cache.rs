use std::collections::HashMap;

use crate::FragmentKey;

/// Content returned by the content service for one fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FragmentPayload {
    pub content: String,
    pub title: Option<String>,
    pub featured_image_url: Option<String>,
    pub source_id: Option<u64>,
    pub fragment_path: String,
}

impl FragmentPayload {
    pub fn new(fragment_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            fragment_path: fragment_path.into(),
            ..Self::default()
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Session-lifetime cache of fetched fragments. Never evicts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FragmentCache {
    entries: HashMap<FragmentKey, FragmentPayload>,
}

impl FragmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &FragmentKey) -> Option<&FragmentPayload> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &FragmentKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Stores `payload`, replacing any earlier fetch of the same key.
    pub fn insert(&mut self, key: FragmentKey, payload: FragmentPayload) {
        self.entries.insert(key, payload);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
