//! WebSocket relay chat service: send a query, stream back STREAM_CHUNK
//! texts until STREAM_END or ERROR.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{stream, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;

use crate::error::ChatError;
use crate::service::{ChatService, Fragment, FragmentStream};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Client → relay: one chat message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename = "query")]
pub struct QueryMessage<'a> {
    pub message: &'a str,
}

/// Relay → client message; discriminator is the JSON "type" field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    StreamStart,
    StreamChunk {
        chunk: String,
    },
    StreamEnd,
    Error {
        message: String,
    },
    Status {
        status: String,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// Connected relay client. Queries are serialized over the one socket.
pub struct RelayChat {
    inner: Arc<Mutex<WsStream>>,
}

/// Relay connection error.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connect to the relay at `url` (e.g. `ws://localhost:8765`).
pub async fn connect(url: &str) -> Result<RelayChat, RelayError> {
    let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
    Ok(RelayChat {
        inner: Arc::new(Mutex::new(ws_stream)),
    })
}

fn transport_error(e: impl std::fmt::Display) -> ChatError {
    ChatError::network(format!("Network error: {e}"))
}

/// Read until the next chunk; `None` once the reply is over.
async fn next_fragment(
    mut socket: OwnedMutexGuard<WsStream>,
) -> Option<(Result<Fragment, ChatError>, Option<OwnedMutexGuard<WsStream>>)> {
    loop {
        let text = match socket.next().await {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => {
                return Some((Err(transport_error("relay closed the connection")), None));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Some((Err(transport_error(e)), None)),
        };
        let message = match serde_json::from_str::<ServerMessage>(&text) {
            Ok(message) => message,
            Err(e) => {
                let err = ChatError::from_message(format!("invalid relay message: {e}"));
                return Some((Err(err), None));
            }
        };
        match message {
            ServerMessage::StreamChunk { chunk } => {
                return Some((Ok(Fragment::new(chunk)), Some(socket)));
            }
            ServerMessage::StreamEnd => return None,
            ServerMessage::Error { message } => {
                tracing::warn!(%message, "relay reported an error");
                return Some((Err(ChatError::from_message(message)), None));
            }
            ServerMessage::StreamStart | ServerMessage::Status { .. } | ServerMessage::Unknown => {}
        }
    }
}

#[async_trait]
impl ChatService for RelayChat {
    async fn send_message_stream(&self, message: &str) -> Result<FragmentStream, ChatError> {
        let mut socket = Arc::clone(&self.inner).lock_owned().await;
        let json = serde_json::to_string(&QueryMessage { message })
            .map_err(|e| ChatError::from_message(e.to_string()))?;
        socket.send(Message::Text(json)).await.map_err(transport_error)?;

        let fragments = stream::unfold(Some(socket), |socket| async move {
            next_fragment(socket?).await
        });
        Ok(Box::pin(fragments))
    }
}
