//! Message stream consumer: drives one reply at a time into the conversation.

use std::sync::Arc;

use futures_util::StreamExt;

use crate::conversation::Conversation;
use crate::error::{ChatError, ErrorKind, InitError};
use crate::service::ChatService;

/// What happened to a `send` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank message; nothing changed.
    Ignored,
    /// The chat service failed to initialize; input is disabled.
    Disabled,
    Completed,
    Failed(ErrorKind),
}

/// Conversation plus the state a front-end renders: loading flag and the
/// single-line error banner.
pub struct ChatSession {
    service: Result<Arc<dyn ChatService>, InitError>,
    conversation: Conversation,
    loading: bool,
    error: Option<String>,
}

impl ChatSession {
    /// Create a session around the result of service initialization.
    /// An init error is shown in the banner right away.
    pub fn new(service: Result<Arc<dyn ChatService>, InitError>, greeting: &str) -> Self {
        let error = service.as_ref().err().map(InitError::user_message);
        Self {
            service,
            conversation: Conversation::with_greeting(greeting),
            loading: false,
            error,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True when chat is permanently unavailable for this process.
    pub fn is_disabled(&self) -> bool {
        self.service.is_err()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Drop all messages except a fresh greeting. Service history is untouched.
    pub fn reset(&mut self, greeting: &str) {
        self.conversation = Conversation::with_greeting(greeting);
        if !self.is_disabled() {
            self.error = None;
        }
    }

    /// Send `message` and stream the reply into the trailing AI message.
    /// `on_update` sees the session after every change, fragment by fragment.
    /// The `&mut self` borrow held across the await rules out a second
    /// send while a reply is loading.
    pub async fn send<F>(&mut self, message: &str, mut on_update: F) -> SendOutcome
    where
        F: FnMut(&ChatSession),
    {
        if message.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        let service = match &self.service {
            Ok(service) => Arc::clone(service),
            Err(init) => {
                self.error = Some(init.user_message());
                on_update(self);
                return SendOutcome::Disabled;
            }
        };
        self.error = None;
        self.conversation.push_user(message);
        self.loading = true;
        self.conversation.push_placeholder();
        on_update(self);

        let outcome = match self.stream_reply(service.as_ref(), message, &mut on_update).await {
            Ok(()) => SendOutcome::Completed,
            Err(e) => {
                tracing::warn!(kind = ?e.kind, detail = %e.detail, "chat reply failed");
                let text = e.user_message();
                self.conversation.replace_placeholder(text.clone());
                self.error = Some(text);
                SendOutcome::Failed(e.kind)
            }
        };

        self.loading = false;
        on_update(self);
        outcome
    }

    async fn stream_reply<F>(
        &mut self,
        service: &dyn ChatService,
        message: &str,
        on_update: &mut F,
    ) -> Result<(), ChatError>
    where
        F: FnMut(&ChatSession),
    {
        let mut fragments = service.send_message_stream(message).await?;
        let mut count = 0usize;
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            self.conversation.append_to_placeholder(&fragment.text);
            count += 1;
            on_update(self);
        }
        tracing::debug!(fragments = count, "chat reply complete");
        Ok(())
    }
}
