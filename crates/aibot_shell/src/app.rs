//! Shell state: chat session, speech input and the dictation draft.
//! Input lines and speech events are applied one at a time by the caller's
//! event loop.

use std::io::{self, Write};

use aibot_client::speech::merge_transcript;
use aibot_client::{ChatSession, SendOutcome, SpeechEvent, SpeechInput};

use crate::view::{render_banner, render_message, LiveView};

const DISABLED_NOTICE: &str = "Chat is disabled due to a configuration error.";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    ToggleMic,
    Clear,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Command {
    match line.trim() {
        "/quit" | "/exit" => Command::Quit,
        "/mic" => Command::ToggleMic,
        "/clear" => Command::Clear,
        "/help" => Command::Help,
        _ => Command::Send(line.to_string()),
    }
}

/// Whether the event loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    session: ChatSession,
    speech: SpeechInput,
    view: LiveView,
    greeting: String,
    draft: String,
}

impl App {
    pub fn new(session: ChatSession, speech: SpeechInput, view: LiveView, greeting: &str) -> Self {
        Self {
            session,
            speech,
            view,
            greeting: greeting.to_string(),
            draft: String::new(),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn speech(&self) -> &SpeechInput {
        &self.speech
    }

    /// Dictated text waiting to be sent with the next line.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Print the conversation so far and the usage hint.
    pub fn print_intro(&self, out: &mut impl Write) -> io::Result<()> {
        let style = self.view.style();
        for message in self.session.conversation().messages() {
            write!(out, "{}", render_message(message, style, false))?;
        }
        if let Some(error) = self.session.error() {
            write!(out, "{}", render_banner(error, style))?;
        }
        if self.session.is_disabled() {
            writeln!(out, "{DISABLED_NOTICE}")?;
        }
        let mic = if self.speech.is_supported() { ", /mic" } else { "" };
        writeln!(out, "(commands: /help, /clear{mic}, /quit)")?;
        out.flush()
    }

    pub fn prompt(&self, out: &mut impl Write) -> io::Result<()> {
        let marker = if self.speech.is_listening() { "[mic] " } else { "" };
        write!(out, "{marker}> ")?;
        out.flush()
    }

    pub async fn handle_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<Flow> {
        match parse_command(line) {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {
                writeln!(out, "Type a message and press Enter to send it.")?;
                if self.speech.is_supported() {
                    writeln!(out, "/mic    start or stop dictation")?;
                }
                writeln!(out, "/clear  start a new conversation view")?;
                writeln!(out, "/quit   exit")?;
            }
            Command::Clear => {
                self.session.reset(&self.greeting);
                self.draft.clear();
                self.print_intro(out)?;
            }
            Command::ToggleMic => self.toggle_mic(out)?,
            Command::Send(text) => self.send(&text, out).await?,
        }
        Ok(Flow::Continue)
    }

    fn toggle_mic(&mut self, out: &mut impl Write) -> io::Result<()> {
        if !self.speech.is_supported() {
            writeln!(out, "Speech input is not available (set speech.command in the config).")?;
            return Ok(());
        }
        if self.session.is_loading() || self.session.is_disabled() {
            return Ok(());
        }
        let was_listening = self.speech.is_listening();
        self.speech.toggle();
        if let Some(error) = self.speech.error() {
            write!(out, "{}", render_banner(error, self.view.style()))?;
        } else if self.speech.is_listening() {
            writeln!(out, "Listening... type /mic again to stop.")?;
        } else if was_listening {
            writeln!(out, "Stopped listening.")?;
        }
        Ok(())
    }

    async fn send(&mut self, typed: &str, out: &mut impl Write) -> io::Result<()> {
        let message = merge_transcript(&self.draft, typed);
        if message.trim().is_empty() {
            return Ok(());
        }
        if self.speech.is_listening() {
            self.speech.toggle();
        }
        self.draft.clear();

        let view = &mut self.view;
        view.begin();
        let outcome = self
            .session
            .send(&message, |session| {
                let _ = view.update(session, out);
            })
            .await;
        tracing::debug!(?outcome, "message handled");

        match outcome {
            SendOutcome::Completed | SendOutcome::Failed(_) => self.view.finish(&self.session, out),
            SendOutcome::Disabled => {
                if let Some(error) = self.session.error() {
                    write!(out, "{}", render_banner(error, self.view.style()))?;
                }
                writeln!(out, "{DISABLED_NOTICE}")
            }
            SendOutcome::Ignored => Ok(()),
        }
    }

    /// Apply a recognizer event; dictated text joins the draft.
    pub fn handle_speech(&mut self, event: SpeechEvent, out: &mut impl Write) -> io::Result<()> {
        let was_listening = self.speech.is_listening();
        self.speech.handle_event(event);

        if let Some(transcript) = self.speech.take_transcript() {
            self.draft = merge_transcript(&self.draft, &transcript);
            writeln!(out)?;
            writeln!(out, "(dictated) {}", self.draft)?;
        }
        if was_listening && !self.speech.is_listening() {
            if let Some(error) = self.speech.error() {
                write!(out, "{}", render_banner(error, self.view.style()))?;
            } else {
                writeln!(out, "Stopped listening.")?;
            }
        }
        out.flush()
    }
}
