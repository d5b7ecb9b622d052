//! Chat session: transcript, the one-request-at-a-time guard, model choice
//! and server status.
//!
//! A turn runs `Idle → Sending → (Succeeded | Failed) → Idle`. [`ChatSession::begin`]
//! and [`ChatSession::finish`] are separate so the network call can happen on
//! another task while the session stays owned by the UI; [`ChatSession::submit`]
//! does the whole turn in one await.

use crate::context_store::ContextStore;
use crate::prompt;
use futures::FutureExt;
use providers::ModelClient;
use shared::{ChatError, Message, RejectReason};
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Text of the assistant message shown while waiting for the model.
pub const PLACEHOLDER: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Succeeded,
    Failed,
    /// `finish` was called with nothing in flight
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Checking,
    Connected,
    Disconnected(String),
}

impl ConnectionStatus {
    /// Status line for the header bar.
    pub fn label(&self) -> &str {
        match self {
            ConnectionStatus::Checking => "Checking connection...",
            ConnectionStatus::Connected => "Connected to Ollama",
            ConnectionStatus::Disconnected(reason) => reason,
        }
    }
}

/// What to send for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub prompt: String,
    pub model: String,
}

pub struct ChatSession {
    transcript: Vec<Message>,
    state: SessionState,
    /// Index of the placeholder in `transcript` while `Sending`
    placeholder: Option<usize>,
    selected_model: String,
    available_models: Vec<String>,
    connection: ConnectionStatus,
}

impl ChatSession {
    pub fn new(initial_model: impl Into<String>) -> Self {
        Self {
            transcript: Vec::new(),
            state: SessionState::Idle,
            placeholder: None,
            selected_model: initial_model.into(),
            available_models: Vec::new(),
            connection: ConnectionStatus::Checking,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn in_flight(&self) -> bool {
        self.state == SessionState::Sending
    }

    /// Whether transcript entry `index` is the pending reply of the open turn.
    pub fn is_placeholder(&self, index: usize) -> bool {
        self.in_flight() && self.placeholder == Some(index)
    }

    pub fn selected_model(&self) -> &str {
        &self.selected_model
    }

    pub fn set_selected_model(&mut self, model: impl Into<String>) {
        self.selected_model = model.into();
    }

    pub fn available_models(&self) -> &[String] {
        &self.available_models
    }

    pub fn connection(&self) -> &ConnectionStatus {
        &self.connection
    }

    /// Whether `question` would be accepted right now.
    pub fn can_submit(&self, question: &str) -> bool {
        !self.in_flight() && !question.trim().is_empty()
    }

    /// Accept a question and open a turn.
    ///
    /// Rejected submissions change nothing. Accepted ones append the user
    /// message and the placeholder, and return the prompt built from the
    /// store's current contents.
    pub fn begin(
        &mut self,
        question: &str,
        store: &ContextStore,
    ) -> Result<ChatRequest, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::Rejected(RejectReason::EmptyQuestion));
        }
        if self.in_flight() {
            tracing::debug!("submission rejected while a request is in flight");
            return Err(ChatError::Rejected(RejectReason::AlreadySending));
        }

        self.transcript.push(Message::user(question));
        self.state = SessionState::Sending;
        self.placeholder = Some(self.transcript.len());
        self.transcript.push(Message::assistant(PLACEHOLDER));

        let request = ChatRequest {
            prompt: prompt::assemble(store.items(), question),
            model: self.selected_model.clone(),
        };
        tracing::info!(
            model = %request.model,
            context_files = store.len(),
            prompt_len = request.prompt.len(),
            "chat turn started"
        );
        Ok(request)
    }

    /// Close the open turn with the model's result.
    ///
    /// The placeholder is always removed before the terminal message is
    /// appended, whichever way the turn went.
    pub fn finish(&mut self, result: Result<String, ChatError>) -> TurnOutcome {
        if !self.in_flight() {
            tracing::warn!("turn result arrived with no request in flight");
            return TurnOutcome::Ignored;
        }

        if let Some(index) = self.placeholder.take() {
            if index < self.transcript.len() {
                self.transcript.remove(index);
            }
        }
        self.state = SessionState::Idle;

        match result {
            Ok(reply) => {
                tracing::info!(reply_len = reply.len(), "chat turn succeeded");
                self.transcript.push(Message::assistant(reply));
                TurnOutcome::Succeeded
            }
            Err(e) => {
                tracing::error!(error = %e, "chat turn failed");
                self.transcript.push(Message::error(format!("Error: {}", e)));
                TurnOutcome::Failed
            }
        }
    }

    /// Run a full turn against `client`.
    ///
    /// A panic inside the client is caught and reported like any other model
    /// failure, so the session never stays stuck in `Sending`.
    pub async fn submit(
        &mut self,
        question: &str,
        store: &ContextStore,
        client: &dyn ModelClient,
    ) -> Result<TurnOutcome, ChatError> {
        let request = self.begin(question, store)?;
        let result = AssertUnwindSafe(client.chat(&request.prompt, &request.model))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ChatError::model(panic_reason(panic.as_ref()))));
        Ok(self.finish(result))
    }

    /// Append a status notice, e.g. "Context cleared."
    pub fn notify(&mut self, text: impl Into<String>) {
        self.transcript.push(Message::system(text));
    }

    /// Append an error that happened outside a chat turn (file loading, dialogs).
    pub fn report_error(&mut self, text: impl Into<String>) {
        self.transcript.push(Message::error(text));
    }

    /// Take the result of a model listing. Failures are logged and leave the
    /// current selection alone; the transcript is never touched.
    pub fn apply_model_list(&mut self, result: Result<Vec<String>, ChatError>) {
        match result {
            Ok(models) if !models.is_empty() => {
                if !models.iter().any(|m| *m == self.selected_model) {
                    self.selected_model = models[0].clone();
                }
                tracing::info!(count = models.len(), selected = %self.selected_model, "models listed");
                self.available_models = models;
            }
            Ok(_) => {
                tracing::warn!(fallback = %self.selected_model, "server reported no models");
                self.available_models.clear();
            }
            Err(e) => {
                tracing::warn!(error = %e, fallback = %self.selected_model, "could not list models");
            }
        }
    }

    pub async fn refresh_models(&mut self, client: &dyn ModelClient) {
        let result = client.list_models().await;
        self.apply_model_list(result);
    }

    pub fn mark_checking(&mut self) {
        self.connection = ConnectionStatus::Checking;
    }

    pub fn apply_connection(&mut self, result: Result<(), ChatError>) {
        self.connection = match result {
            Ok(()) => ConnectionStatus::Connected,
            Err(e) => {
                tracing::warn!(error = %e, "model server unreachable");
                ConnectionStatus::Disconnected(e.to_string())
            }
        };
    }

    pub async fn check_connection(&mut self, client: &dyn ModelClient) {
        self.mark_checking();
        let result = client.check_connection().await;
        self.apply_connection(result);
    }
}

/// Readable text for a caught panic payload.
pub fn panic_reason(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown fault".to_string());
    format!("model client crashed: {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ContextItem, MessageKind};

    enum Script {
        Reply(&'static str),
        Fail(&'static str),
        Panic,
    }

    struct ScriptedClient {
        script: Script,
        models: Result<Vec<String>, ChatError>,
    }

    impl ScriptedClient {
        fn new(script: Script) -> Self {
            Self {
                script,
                models: Ok(vec![]),
            }
        }
    }

    #[async_trait::async_trait]
    impl ModelClient for ScriptedClient {
        async fn chat(&self, _prompt: &str, _model: &str) -> Result<String, ChatError> {
            match self.script {
                Script::Reply(text) => Ok(text.to_string()),
                Script::Fail(reason) => Err(ChatError::model(reason)),
                Script::Panic => panic!("socket exploded"),
            }
        }

        async fn list_models(&self) -> Result<Vec<String>, ChatError> {
            self.models.clone()
        }
    }

    fn kinds(session: &ChatSession) -> Vec<MessageKind> {
        session.transcript().iter().map(|m| m.kind).collect()
    }

    fn has_placeholder(session: &ChatSession) -> bool {
        session
            .transcript()
            .iter()
            .any(|m| m.kind == MessageKind::Assistant && m.content == PLACEHOLDER)
    }

    #[test]
    fn test_blank_question_rejected_without_mutation() {
        let mut session = ChatSession::new("llama3.1");
        let store = ContextStore::new();
        for blank in ["", "   ", "\n\t "] {
            let err = session.begin(blank, &store).unwrap_err();
            assert_eq!(err, ChatError::Rejected(RejectReason::EmptyQuestion));
        }
        assert!(session.transcript().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_begin_opens_turn_with_placeholder() {
        let mut session = ChatSession::new("llama3.1");
        let mut store = ContextStore::new();
        store.add(ContextItem::new("/a.txt", "a.txt", "hello", 5));

        let request = session.begin("  Q  ", &store).unwrap();
        assert!(session.in_flight());
        assert_eq!(request.model, "llama3.1");
        assert_eq!(request.prompt, prompt::assemble(store.items(), "Q"));
        assert_eq!(kinds(&session), vec![MessageKind::User, MessageKind::Assistant]);
        assert_eq!(session.transcript()[0].content, "Q");
        assert!(has_placeholder(&session));
    }

    #[test]
    fn test_second_submit_while_sending_rejected() {
        let mut session = ChatSession::new("llama3.1");
        let store = ContextStore::new();
        session.begin("first", &store).unwrap();
        let len = session.transcript().len();

        let err = session.begin("second", &store).unwrap_err();
        assert_eq!(err, ChatError::Rejected(RejectReason::AlreadySending));
        assert_eq!(session.transcript().len(), len);
        let placeholders = session
            .transcript()
            .iter()
            .filter(|m| m.content == PLACEHOLDER)
            .count();
        assert_eq!(placeholders, 1);
        assert!(!session.can_submit("second"));
    }

    #[test]
    fn test_finish_success_replaces_placeholder() {
        let mut session = ChatSession::new("llama3.1");
        let store = ContextStore::new();
        session.begin("hi", &store).unwrap();

        assert_eq!(session.finish(Ok("hello there".into())), TurnOutcome::Succeeded);
        assert!(!session.in_flight());
        assert!(!has_placeholder(&session));
        assert_eq!(kinds(&session), vec![MessageKind::User, MessageKind::Assistant]);
        assert_eq!(session.transcript()[1].content, "hello there");
    }

    #[test]
    fn test_finish_failure_replaces_placeholder_with_error() {
        let mut session = ChatSession::new("llama3.1");
        let store = ContextStore::new();
        session.begin("hi", &store).unwrap();

        let outcome = session.finish(Err(ChatError::model("ollama error: 500")));
        assert_eq!(outcome, TurnOutcome::Failed);
        assert!(!session.in_flight());
        assert_eq!(kinds(&session), vec![MessageKind::User, MessageKind::Error]);
        assert_eq!(session.transcript()[1].content, "Error: ollama error: 500");

        // Session is immediately usable again
        assert!(session.begin("again", &store).is_ok());
    }

    #[test]
    fn test_notice_during_turn_survives_placeholder_removal() {
        let mut session = ChatSession::new("llama3.1");
        let store = ContextStore::new();
        session.begin("hi", &store).unwrap();
        session.notify("Loaded 2 files successfully.");
        assert!(session.is_placeholder(1));
        assert!(!session.is_placeholder(2));
        session.finish(Ok("done".into()));
        assert!(!session.is_placeholder(1));

        assert_eq!(
            kinds(&session),
            vec![MessageKind::User, MessageKind::System, MessageKind::Assistant]
        );
        assert!(!has_placeholder(&session));
    }

    #[test]
    fn test_finish_without_turn_ignored() {
        let mut session = ChatSession::new("llama3.1");
        assert_eq!(session.finish(Ok("stray".into())), TurnOutcome::Ignored);
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_submit_success() {
        let mut session = ChatSession::new("llama3.1");
        let store = ContextStore::new();
        let client = ScriptedClient::new(Script::Reply("Hi!"));

        let outcome = session.submit("hello", &store, &client).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Succeeded);
        assert!(!session.in_flight());
        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1].kind, MessageKind::Assistant);
        assert_eq!(session.transcript()[1].content, "Hi!");
    }

    #[tokio::test]
    async fn test_submit_structured_failure() {
        let mut session = ChatSession::new("llama3.1");
        let store = ContextStore::new();
        let client = ScriptedClient::new(Script::Fail("Cannot connect to Ollama."));

        let outcome = session.submit("hello", &store, &client).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Failed);
        assert!(!session.in_flight());
        assert_eq!(kinds(&session), vec![MessageKind::User, MessageKind::Error]);
    }

    #[tokio::test]
    async fn test_submit_client_panic_still_clears_flag() {
        let mut session = ChatSession::new("llama3.1");
        let store = ContextStore::new();
        let client = ScriptedClient::new(Script::Panic);

        let outcome = session.submit("hello", &store, &client).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Failed);
        assert!(!session.in_flight());
        assert!(!has_placeholder(&session));
        assert_eq!(kinds(&session), vec![MessageKind::User, MessageKind::Error]);
        assert!(session.transcript()[1].content.contains("socket exploded"));
    }

    #[tokio::test]
    async fn test_submit_rejected_returns_error() {
        let mut session = ChatSession::new("llama3.1");
        let store = ContextStore::new();
        let client = ScriptedClient::new(Script::Reply("unused"));
        let err = session.submit("  ", &store, &client).await.unwrap_err();
        assert_eq!(err, ChatError::Rejected(RejectReason::EmptyQuestion));
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_capital_of_france_end_to_end() {
        let mut store = ContextStore::new();
        store.add(ContextItem::new(
            "/notes/geo.txt",
            "geo.txt",
            "Paris is the capital of France.",
            31,
        ));
        let before = store.items().to_vec();
        let mut session = ChatSession::new("llama3.1");
        let client = ScriptedClient::new(Script::Reply("Paris."));

        session
            .submit("What is the capital of France?", &store, &client)
            .await
            .unwrap();

        let transcript: Vec<_> = session
            .transcript()
            .iter()
            .map(|m| (m.kind, m.content.as_str()))
            .collect();
        assert_eq!(
            transcript,
            vec![
                (MessageKind::User, "What is the capital of France?"),
                (MessageKind::Assistant, "Paris."),
            ]
        );
        assert!(!session.in_flight());
        assert_eq!(store.items(), before.as_slice());
    }

    #[tokio::test]
    async fn test_model_list_updates_selection() {
        let mut session = ChatSession::new("llama3.1");
        let mut client = ScriptedClient::new(Script::Reply(""));
        client.models = Ok(vec!["mistral:7b".into(), "llama3.1:latest".into()]);

        session.refresh_models(&client).await;
        assert_eq!(session.selected_model(), "mistral:7b");
        assert_eq!(session.available_models().len(), 2);

        session.set_selected_model("llama3.1:latest");
        session.refresh_models(&client).await;
        assert_eq!(session.selected_model(), "llama3.1:latest");
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_model_list_failure_keeps_fallback() {
        let mut session = ChatSession::new("llama3.1");
        let mut client = ScriptedClient::new(Script::Reply(""));
        client.models = Err(ChatError::model("connection refused"));

        session.refresh_models(&client).await;
        assert_eq!(session.selected_model(), "llama3.1");
        assert!(session.available_models().is_empty());
        assert!(session.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_connection_status_strings() {
        let mut session = ChatSession::new("llama3.1");
        assert_eq!(session.connection().label(), "Checking connection...");

        let ok = ScriptedClient::new(Script::Reply(""));
        session.check_connection(&ok).await;
        assert_eq!(session.connection(), &ConnectionStatus::Connected);
        assert_eq!(session.connection().label(), "Connected to Ollama");

        let mut down = ScriptedClient::new(Script::Reply(""));
        down.models = Err(ChatError::model("refused"));
        session.check_connection(&down).await;
        assert_eq!(
            session.connection().label(),
            "Cannot connect to Ollama. Make sure Ollama is running."
        );
        assert!(session.transcript().is_empty());
    }
}
