//! Gemini chat service (Google Generative Language API, SSE streaming).

use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{ready, Context, Poll};

use async_trait::async_trait;
use eventsource_stream::{EventStream, EventStreamError, Eventsource};
use futures_util::Stream;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ChatError, ErrorKind, InitError};
use crate::service::{ChatService, Fragment, FragmentStream};

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub system_instruction: String,
}

impl GeminiConfig {
    /// Build from the config file plus the API key environment variable
    /// named by `gemini.api_key_env` (default `API_KEY`).
    pub fn from_env(config: &Config) -> Result<Self, InitError> {
        let key_env = config.api_key_env();
        let api_key = std::env::var(key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                InitError(format!(
                    "{key_env} is not defined. Please check your environment variables."
                ))
            })?;

        let base_url = config.base_url().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| InitError(format!("Invalid Gemini base URL {base_url}: {e}")))?;

        Ok(Self {
            api_key,
            base_url,
            model: config.model().to_string(),
            system_instruction: config.system_instruction().to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

impl Content {
    fn user(text: &str) -> Self {
        Self {
            role: "user".into(),
            parts: vec![Part { text: text.into() }],
        }
    }

    fn model(text: String) -> Self {
        Self {
            role: "model".into(),
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content>,
    system_instruction: SystemInstruction<'a>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<u16>,
    #[serde(default)]
    message: String,
    status: Option<String>,
}

impl ApiError {
    fn into_chat_error(self) -> ChatError {
        let detail = match &self.status {
            Some(status) => format!("{status}: {}", self.message),
            None => self.message.clone(),
        };
        let kind = match self.code {
            Some(code) => ErrorKind::from_status(code, &detail),
            None => ErrorKind::classify(&detail),
        };
        ChatError::new(kind, detail)
    }
}

/// Gemini client holding the multi-turn history of this process.
pub struct GeminiChat {
    config: GeminiConfig,
    http: reqwest::Client,
    history: Arc<Mutex<Vec<Content>>>,
}

impl GeminiChat {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of completed turns (user + model messages) kept as context.
    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn history_snapshot(&self) -> Vec<Content> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ChatService for GeminiChat {
    async fn send_message_stream(&self, message: &str) -> Result<FragmentStream, ChatError> {
        let mut contents = self.history_snapshot();
        contents.push(Content::user(message));
        let request = GenerateRequest {
            contents,
            system_instruction: SystemInstruction {
                parts: [TextPart {
                    text: &self.config.system_instruction,
                }],
            },
        };
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url, self.config.model
        );

        tracing::debug!(%url, "sending gemini stream request");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let fragments = GeminiSse::new(Box::pin(response.bytes_stream()));
        Ok(Box::pin(RecordingStream {
            inner: Box::pin(fragments),
            reply: String::new(),
            user_turn: Some(Content::user(message)),
            history: Arc::clone(&self.history),
            failed: false,
        }))
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> ChatError {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        ChatError::network(format!("Network error: {e}"))
    } else {
        ChatError::from_message(e.to_string())
    }
}

fn status_error(status: reqwest::StatusCode, body: &str) -> ChatError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());
    let detail = format!("got status: {status}. {message}");
    ChatError::new(ErrorKind::from_status(status.as_u16(), &detail), detail)
}

/// Turns Gemini SSE events into text fragments.
pub struct GeminiSse<S> {
    inner: EventStream<S>,
}

impl<S> GeminiSse<S> {
    pub fn new(stream: S) -> Self
    where
        S: Eventsource,
    {
        Self {
            inner: stream.eventsource(),
        }
    }
}

/// Parse one SSE `data:` payload. `Ok(None)` for chunks without text.
fn parse_chunk(data: &str) -> Result<Option<Fragment>, ChatError> {
    let trimmed = data.trim();
    if trimmed.is_empty() || trimmed == "[DONE]" {
        return Ok(None);
    }
    let chunk: StreamChunk = serde_json::from_str(trimmed)
        .map_err(|e| ChatError::from_message(format!("Failed to parse SSE JSON: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(error.into_chat_error());
    }

    let text: String = chunk
        .candidates
        .into_iter()
        .take(1)
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect();
    Ok((!text.is_empty()).then(|| Fragment::new(text)))
}

impl<S, B, E> Stream for GeminiSse<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    type Item = Result<Fragment, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => match parse_chunk(&event.data) {
                    Ok(Some(fragment)) => return Poll::Ready(Some(Ok(fragment))),
                    Ok(None) => continue,
                    Err(e) => return Poll::Ready(Some(Err(e))),
                },
                Poll::Ready(Some(Err(EventStreamError::Transport(e)))) => {
                    return Poll::Ready(Some(Err(ChatError::network(format!(
                        "Network error: {e}"
                    )))));
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(ChatError::from_message(format!(
                        "SSE stream error: {e}"
                    )))));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Records the user and model turns into history once a reply completes.
struct RecordingStream {
    inner: FragmentStream,
    reply: String,
    user_turn: Option<Content>,
    history: Arc<Mutex<Vec<Content>>>,
    failed: bool,
}

impl Stream for RecordingStream {
    type Item = Result<Fragment, ChatError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let item = ready!(self.inner.as_mut().poll_next(cx));
        match &item {
            Some(Ok(fragment)) => self.reply.push_str(&fragment.text),
            Some(Err(_)) => self.failed = true,
            None if !self.failed => {
                if let Some(user) = self.user_turn.take() {
                    let reply = std::mem::take(&mut self.reply);
                    let mut history = self
                        .history
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    history.push(user);
                    history.push(Content::model(reply));
                }
            }
            None => {}
        }
        Poll::Ready(item)
    }
}
