//! Context-grounded chat core.
//!
//! - [`ContextStore`]: loaded files, deduplicated by path
//! - [`prompt::assemble`]: files + question → prompt text
//! - [`ChatSession`]: one-request-at-a-time chat turns and the transcript

pub mod context_store;
pub mod prompt;
pub mod session;

pub use context_store::ContextStore;
pub use session::{ChatRequest, ChatSession, ConnectionStatus, SessionState, TurnOutcome};
