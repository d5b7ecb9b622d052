//! Model server clients.
//!
//! The chat core only talks to [`ModelClient`]; the Ollama REST client is the
//! one implementation shipped with the app.

pub mod ollama;

pub use ollama::OllamaClient;

use shared::ChatError;

/// Shown when the model server cannot be reached at all.
pub const CONNECTION_HINT: &str = "Cannot connect to Ollama. Make sure Ollama is running.";

/// Chat completion and model listing against a locally addressed server.
///
/// Every transport, status or decoding problem comes back as
/// [`ChatError::ModelFailure`] with a readable reason.
#[async_trait::async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one user prompt to `model` and return the reply text.
    async fn chat(&self, prompt: &str, model: &str) -> Result<String, ChatError>;

    /// Names of the models the server can run.
    async fn list_models(&self) -> Result<Vec<String>, ChatError>;

    /// Cheap reachability probe.
    async fn check_connection(&self) -> Result<(), ChatError> {
        self.list_models()
            .await
            .map(|_| ())
            .map_err(|_| ChatError::model(CONNECTION_HINT))
    }
}
