use crate::{ModelClient, CONNECTION_HINT};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use shared::settings::ModelServer;
use shared::ChatError;
use std::env;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaReply,
}

#[derive(Debug, Deserialize)]
struct OllamaReply {
    content: String,
}

/// `GET /api/tags` body; only the names are used.
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}

/// Error body Ollama sends with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

pub struct OllamaClient {
    http: Client,
    base: String,
}

impl OllamaClient {
    pub fn new(base: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        let http = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| ChatError::model(format!("failed to build HTTP client: {}", e)))?;
        let base = base.into().trim_end_matches('/').to_string();
        Ok(Self { http, base })
    }

    /// Build from settings; `OLLAMA_BASE_URL` wins over the configured URL.
    pub fn from_settings(server: &ModelServer) -> Result<Self, ChatError> {
        let base = env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| server.base_url.clone());
        Self::new(base, Duration::from_secs(server.request_timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn describe_transport_error(&self, err: reqwest::Error) -> ChatError {
        if err.is_connect() {
            ChatError::model(format!("{} (no server at {})", CONNECTION_HINT, self.base))
        } else if err.is_timeout() {
            ChatError::model(format!("Request to Ollama at {} timed out", self.base))
        } else if err.is_decode() {
            ChatError::model(format!("Malformed response from Ollama: {}", err))
        } else {
            ChatError::model(format!("Ollama request failed: {}", err))
        }
    }

    async fn check_status(&self, resp: Response) -> Result<Response, ChatError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<OllamaErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        if detail.trim().is_empty() {
            Err(ChatError::model(format!("ollama error: {}", status)))
        } else {
            Err(ChatError::model(format!(
                "ollama error: {}: {}",
                status,
                detail.trim()
            )))
        }
    }
}

#[async_trait::async_trait]
impl ModelClient for OllamaClient {
    async fn chat(&self, prompt: &str, model: &str) -> Result<String, ChatError> {
        let url = format!("{}/api/chat", self.base);
        let req = OllamaChatRequest {
            model,
            messages: vec![OllamaMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };
        tracing::debug!(model, prompt_len = prompt.len(), "sending chat request");

        let resp = self
            .http
            .post(url)
            .json(&req)
            .send()
            .await
            .map_err(|e| self.describe_transport_error(e))?;
        let resp = self.check_status(resp).await?;
        let body: OllamaChatResponse = resp
            .json()
            .await
            .map_err(|e| self.describe_transport_error(e))?;

        tracing::debug!(model, reply_len = body.message.content.len(), "chat reply received");
        Ok(body.message.content)
    }

    async fn list_models(&self) -> Result<Vec<String>, ChatError> {
        let url = format!("{}/api/tags", self.base);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.describe_transport_error(e))?;
        let resp = self.check_status(resp).await?;
        let body: OllamaTagsResponse = resp
            .json()
            .await
            .map_err(|e| self.describe_transport_error(e))?;
        Ok(body.models.into_iter().map(|m| m.name).collect())
    }
}
