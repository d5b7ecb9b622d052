pub mod context;
pub mod error;
pub mod message;

pub use context::ContextItem;
pub use error::{ChatError, RejectReason};
pub use message::{Message, MessageKind};

pub mod settings {
    use serde::{Deserialize, Serialize};

    pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
    pub const DEFAULT_MODEL: &str = "llama3.1";

    fn default_timeout_secs() -> u64 {
        300
    }

    /// Connection settings for the local model server.
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct ModelServer {
        pub base_url: String,      // e.g., "http://127.0.0.1:11434"
        pub fallback_model: String, // used until the server reports its models
        /// Last model the user picked; preferred over the fallback when offered
        #[serde(default)]
        pub last_model: Option<String>,
        #[serde(default = "default_timeout_secs")]
        pub request_timeout_secs: u64,
    }

    /// Window geometry for the desktop shell
    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct WindowSettings {
        pub width: f32,
        pub height: f32,
        pub dark_mode: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub struct AppSettings {
        pub server: ModelServer,
        #[serde(default)]
        pub window: WindowSettings,
    }

    impl Default for ModelServer {
        fn default() -> Self {
            Self {
                base_url: DEFAULT_OLLAMA_URL.into(),
                fallback_model: DEFAULT_MODEL.into(),
                last_model: None,
                request_timeout_secs: default_timeout_secs(),
            }
        }
    }

    impl Default for WindowSettings {
        fn default() -> Self {
            Self {
                width: 1200.0,
                height: 800.0,
                dark_mode: true,
            }
        }
    }

    impl Default for AppSettings {
        fn default() -> Self {
            Self {
                server: ModelServer::default(),
                window: WindowSettings::default(),
            }
        }
    }

    impl ModelServer {
        /// Model to select before the server has answered a list request.
        pub fn initial_model(&self) -> &str {
            self.last_model.as_deref().unwrap_or(&self.fallback_model)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_defaults_point_at_local_ollama() {
            let settings = AppSettings::default();
            assert_eq!(settings.server.base_url, "http://127.0.0.1:11434");
            assert_eq!(settings.server.initial_model(), "llama3.1");
            assert_eq!(settings.server.request_timeout_secs, 300);
        }

        #[test]
        fn test_partial_settings_fill_defaults() {
            let json = r#"{"server":{"base_url":"http://gpu-box:11434","fallback_model":"mistral"}}"#;
            let settings: AppSettings = serde_json::from_str(json).unwrap();
            assert_eq!(settings.server.base_url, "http://gpu-box:11434");
            assert_eq!(settings.server.request_timeout_secs, 300);
            assert_eq!(settings.window, WindowSettings::default());
        }

        #[test]
        fn test_last_model_preferred_over_fallback() {
            let mut server = ModelServer::default();
            server.last_model = Some("qwen2.5:7b".into());
            assert_eq!(server.initial_model(), "qwen2.5:7b");
        }
    }
}
