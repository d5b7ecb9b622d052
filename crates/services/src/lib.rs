//! File-side services: turning picked paths into context items.

pub mod documents;
pub mod loader;

pub use documents::{read_text, DocumentKind, SUPPORTED_EXTENSIONS};
pub use loader::{load_paths, LoadFailure, LoadReport};
