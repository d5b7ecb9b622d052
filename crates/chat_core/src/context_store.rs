//! In-memory set of loaded context files, kept in insertion order.

use shared::{ChatError, ContextItem};

#[derive(Debug, Clone, Default)]
pub struct ContextStore {
    items: Vec<ContextItem>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` unless one with the same path is already loaded.
    /// Returns whether it was inserted.
    pub fn add(&mut self, item: ContextItem) -> bool {
        if self.contains_path(&item.path) {
            tracing::debug!(path = %item.path, "context item already loaded");
            return false;
        }
        self.items.push(item);
        true
    }

    /// Add each item in order; returns how many were new.
    pub fn extend(&mut self, items: impl IntoIterator<Item = ContextItem>) -> usize {
        items
            .into_iter()
            .map(|item| self.add(item))
            .filter(|inserted| *inserted)
            .count()
    }

    pub fn remove(&mut self, index: usize) -> Result<ContextItem, ChatError> {
        if index >= self.items.len() {
            return Err(ChatError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of the original file sizes, in bytes.
    pub fn total_size(&self) -> u64 {
        self.items.iter().map(|i| i.size).sum()
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.items.iter().any(|i| i.path == path)
    }

    pub fn items(&self) -> &[ContextItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContextItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
