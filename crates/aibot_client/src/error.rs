//! Chat error taxonomy and the fixed user-facing text for each category.

use thiserror::Error;

const AUTHENTICATION_MESSAGE: &str =
    "Authentication Error: Your API key is not valid. Please check your configuration and try again.";
const RATE_LIMIT_MESSAGE: &str = "Rate Limit Exceeded: You've sent too many requests in a short period. Please wait a moment before trying again.";
const NETWORK_MESSAGE: &str =
    "Network Error: Could not connect to the AI service. Please check your internet connection.";
const SERVER_MESSAGE: &str = "Server Error: The AI service is currently experiencing issues on its end. Please try again in a few moments.";
const UNKNOWN_MESSAGE: &str =
    "An unexpected error occurred while communicating with the AI. Please try again later.";

/// Category of a failed chat call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Initialization,
    Authentication,
    RateLimit,
    Network,
    Server,
    Unknown,
}

impl ErrorKind {
    /// Classify an untyped error message (relay errors, SSE error payloads).
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if message.contains("API key not valid") {
            ErrorKind::Authentication
        } else if message.contains("429") {
            ErrorKind::RateLimit
        } else if lower.contains("fetch failed") || lower.contains("network error") {
            ErrorKind::Network
        } else if message.contains("INTERNAL") || message.contains("500") {
            ErrorKind::Server
        } else {
            ErrorKind::Unknown
        }
    }

    /// Classify an HTTP status, falling back to the message rules for
    /// statuses without a dedicated category.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ErrorKind::Authentication,
            429 => ErrorKind::RateLimit,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::classify(body),
        }
    }
}

/// A failed chat call: its category plus the raw detail for logs.
#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct ChatError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl ChatError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Build from a raw message, classifying it by content.
    pub fn from_message(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(ErrorKind::classify(&detail), detail)
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, detail)
    }

    pub fn initialization(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Initialization, detail)
    }

    /// Text shown to the user in place of the failed reply.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::Initialization => format!("Initialization Error: {}", self.detail),
            ErrorKind::Authentication => AUTHENTICATION_MESSAGE.to_string(),
            ErrorKind::RateLimit => RATE_LIMIT_MESSAGE.to_string(),
            ErrorKind::Network => NETWORK_MESSAGE.to_string(),
            ErrorKind::Server => SERVER_MESSAGE.to_string(),
            ErrorKind::Unknown => UNKNOWN_MESSAGE.to_string(),
        }
    }
}

/// The chat service could not be constructed. Permanent for the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InitError(pub String);

impl InitError {
    /// Banner text shown while chat is disabled.
    pub fn user_message(&self) -> String {
        format!("Initialization Error: {}", self.0)
    }
}

impl From<InitError> for ChatError {
    fn from(e: InitError) -> Self {
        ChatError::initialization(e.0)
    }
}
