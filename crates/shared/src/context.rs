//! Context items: loaded files whose text grounds a chat question.

use serde::{Deserialize, Serialize};

/// One loaded file. Never mutated after it is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextItem {
    /// Filesystem path, used as the deduplication key
    pub path: String,
    /// Display name (basename)
    pub name: String,
    /// Extracted plain text
    pub content: String,
    /// Size of the original file in bytes
    pub size: u64,
}

impl ContextItem {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        size: u64,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            content: content.into(),
            size,
        }
    }
}
