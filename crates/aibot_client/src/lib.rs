//! Shared AI chat client library (config, chat services, streaming session,
//! markdown blocks, speech input). Used by the `aibot` shell and `aibot-ask`.

pub mod config;
pub mod conversation;
pub mod error;
pub mod gemini;
pub mod markdown;
pub mod relay;
pub mod service;
pub mod session;
pub mod speech;

pub use config::{default_config_path, Backend, Config, ConfigError};
pub use conversation::{Conversation, Message, Role};
pub use error::{ChatError, ErrorKind, InitError};
pub use markdown::{render, Block, Span};
pub use relay::{connect, RelayChat, RelayError};
pub use service::{initialize, ChatService, Fragment, FragmentStream};
pub use session::{ChatSession, SendOutcome};
pub use speech::{SpeechCapability, SpeechEvent, SpeechInput};

/// Install the stderr `tracing` subscriber used by the binaries.
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
