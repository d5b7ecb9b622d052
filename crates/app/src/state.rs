//! Application state and the background work behind the UI.
//!
//! The context store and chat session are owned here and only touched from
//! the UI thread. Network calls and file loading run on the tokio runtime and
//! report back over channels that `poll_*` drains once per frame.

use crate::config;
use crate::widgets::FilePickerWidget;
use chat_core::{ChatSession, ContextStore};
use providers::{ModelClient, OllamaClient};
use services::LoadReport;
use shared::settings::AppSettings;
use shared::ChatError;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Reported when the request task died without sending a result.
const LOST_REPLY: &str = "model request ended without a reply";

pub struct AppState {
    pub settings: AppSettings,
    pub store: ContextStore,
    pub session: ChatSession,
    /// Current input text
    pub input_text: String,
    /// Status line while files are being read
    pub loading_status: Option<String>,
    pub debug: bool,

    picker: FilePickerWidget,
    runtime: Runtime,
    client: Arc<dyn ModelClient>,

    chat_rx: Option<Receiver<Result<String, ChatError>>>,
    load_rx: Option<Receiver<LoadReport>>,
    models_rx: Option<Receiver<Result<Vec<String>, ChatError>>>,
    connection_rx: Option<Receiver<Result<(), ChatError>>>,
}

impl AppState {
    pub fn new(settings: AppSettings, debug: bool) -> anyhow::Result<Self> {
        let client = OllamaClient::from_settings(&settings.server)?;
        tracing::info!(base_url = client.base_url(), "using Ollama server");
        Self::with_client(settings, debug, Arc::new(client))
    }

    pub fn with_client(
        settings: AppSettings,
        debug: bool,
        client: Arc<dyn ModelClient>,
    ) -> anyhow::Result<Self> {
        let runtime = Runtime::new()?;
        let session = ChatSession::new(settings.server.initial_model());
        Ok(Self {
            settings,
            store: ContextStore::new(),
            session,
            input_text: String::new(),
            loading_status: None,
            debug,
            picker: FilePickerWidget::new(),
            runtime,
            client,
            chat_rx: None,
            load_rx: None,
            models_rx: None,
            connection_rx: None,
        })
    }

    /// Whether any background work is outstanding (the UI keeps repainting).
    pub fn is_busy(&self) -> bool {
        self.chat_rx.is_some()
            || self.load_rx.is_some()
            || self.models_rx.is_some()
            || self.connection_rx.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.load_rx.is_some()
    }

    pub fn can_send(&self) -> bool {
        self.session.can_submit(&self.input_text)
    }

    /// Probe the server and fetch its model list.
    pub fn refresh_server_status(&mut self) {
        self.session.mark_checking();

        let (tx, rx) = channel();
        let client = Arc::clone(&self.client);
        self.runtime.spawn(async move {
            let _ = tx.send(client.check_connection().await);
        });
        self.connection_rx = Some(rx);

        let (tx, rx) = channel();
        let client = Arc::clone(&self.client);
        self.runtime.spawn(async move {
            let _ = tx.send(client.list_models().await);
        });
        self.models_rx = Some(rx);
    }

    /// Submit the input box. The input is cleared only if the turn starts.
    pub fn send_message(&mut self) {
        let request = match self.session.begin(&self.input_text, &self.store) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "send ignored");
                return;
            }
        };
        self.input_text.clear();

        let (tx, rx) = channel();
        let client = Arc::clone(&self.client);
        self.runtime.spawn(async move {
            let result = client.chat(&request.prompt, &request.model).await;
            let _ = tx.send(result);
        });
        self.chat_rx = Some(rx);
    }

    pub fn select_files(&mut self) {
        let files = self.picker.pick_files();
        if !files.is_empty() {
            self.start_loading(files);
        }
    }

    pub fn select_folder(&mut self) {
        if let Some(folder) = self.picker.pick_folder() {
            self.start_loading(vec![folder]);
        }
    }

    fn start_loading(&mut self, paths: Vec<PathBuf>) {
        if self.is_loading() {
            return;
        }
        self.loading_status = Some("Processing files...".to_string());
        let (tx, rx) = channel();
        self.runtime.spawn_blocking(move || {
            let _ = tx.send(services::load_paths(paths.as_slice()));
        });
        self.load_rx = Some(rx);
    }

    pub fn clear_context(&mut self) {
        self.store.clear();
        self.session.notify("Context cleared.");
    }

    pub fn remove_context(&mut self, index: usize) {
        if let Err(e) = self.store.remove(index) {
            tracing::warn!(error = %e, "remove ignored");
        }
    }

    pub fn select_model(&mut self, model: String) {
        if model == self.session.selected_model() {
            return;
        }
        tracing::info!(%model, "model selected");
        self.session.set_selected_model(model.clone());
        self.settings.server.last_model = Some(model);
        config::save_settings(&self.settings);
    }

    /// Drain every finished background job.
    pub fn poll(&mut self) {
        self.poll_chat();
        self.poll_loading();
        self.poll_server_status();
    }

    fn poll_chat(&mut self) {
        let Some(rx) = &self.chat_rx else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            // The task panicked or was dropped before replying
            Err(TryRecvError::Disconnected) => Err(ChatError::model(LOST_REPLY)),
        };
        self.chat_rx = None;
        self.session.finish(result);
    }

    fn poll_loading(&mut self) {
        let Some(rx) = &self.load_rx else {
            return;
        };
        let report = match rx.try_recv() {
            Ok(report) => report,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.load_rx = None;
                self.loading_status = None;
                self.session.report_error("Error processing files: loader stopped unexpectedly");
                return;
            }
        };
        self.load_rx = None;
        self.loading_status = None;
        self.apply_load_report(report);
    }

    pub fn apply_load_report(&mut self, report: LoadReport) {
        let processed = report.items.len();
        let added = self.store.extend(report.items);
        tracing::info!(processed, added, "context files loaded");

        if processed > 0 {
            self.session
                .notify(format!("Loaded {} files successfully.", processed));
        }
        if !report.failures.is_empty() {
            let lines: Vec<String> = report
                .failures
                .iter()
                .map(|f| format!("- {}", f.error))
                .collect();
            self.session.report_error(format!(
                "Skipped {} file(s):\n{}",
                report.failures.len(),
                lines.join("\n")
            ));
        }
    }

    fn poll_server_status(&mut self) {
        if let Some(rx) = &self.connection_rx {
            match rx.try_recv() {
                Ok(result) => {
                    self.connection_rx = None;
                    self.session.apply_connection(result);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.connection_rx = None;
                    self.session
                        .apply_connection(Err(ChatError::model(providers::CONNECTION_HINT)));
                }
            }
        }

        if let Some(rx) = &self.models_rx {
            match rx.try_recv() {
                Ok(result) => {
                    self.models_rx = None;
                    self.session.apply_model_list(result);
                }
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    self.models_rx = None;
                }
            }
        }
    }
}
