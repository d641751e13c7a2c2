//! The external chat-stream collaborator and its one-time construction.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;

use crate::config::{Backend, Config};
use crate::error::{ChatError, InitError};
use crate::gemini::{GeminiChat, GeminiConfig};
use crate::relay;

/// One text increment of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
}

impl Fragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Lazy, finite, forward-only sequence of fragments. Any item may fail.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment, ChatError>> + Send>>;

/// A chat backend able to stream a reply to one user message.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn send_message_stream(&self, message: &str) -> Result<FragmentStream, ChatError>;
}

/// Construct the configured chat service once at startup.
pub async fn initialize(config: &Config) -> Result<Arc<dyn ChatService>, InitError> {
    let service: Arc<dyn ChatService> = match config.backend() {
        Backend::Gemini => {
            let gemini = GeminiConfig::from_env(config)?;
            tracing::info!(model = %gemini.model, "gemini chat service ready");
            Arc::new(GeminiChat::new(gemini))
        }
        Backend::Relay => {
            let url = config
                .relay
                .url
                .as_deref()
                .ok_or_else(|| InitError("relay.url is not set in the config.".into()))?;
            let client = relay::connect(url)
                .await
                .map_err(|e| InitError(format!("could not connect to relay {url}: {e}")))?;
            tracing::info!(%url, "relay chat service ready");
            Arc::new(client)
        }
    };
    Ok(service)
}
