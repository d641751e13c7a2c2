//! Speech input adapter: a start/stop toggle over an injected recognizer.
//!
//! Platform recognizers deliver [`SpeechEvent`]s through the channel handed
//! to [`SpeechCapability::create`]; the owner of the event loop feeds them
//! back into [`SpeechInput::handle_event`].

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::{SpeechSection, DEFAULT_LANG};

const START_FAILED_MESSAGE: &str = "Could not start speech recognition. Please try again.";
const ACCESS_DENIED_MESSAGE: &str =
    "Microphone access denied. Please allow microphone access in your settings.";

/// Recognizer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerOptions {
    pub continuous: bool,
    pub interim_results: bool,
    pub lang: String,
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self {
            continuous: true,
            interim_results: true,
            lang: DEFAULT_LANG.to_string(),
        }
    }
}

impl From<&SpeechSection> for RecognizerOptions {
    fn from(section: &SpeechSection) -> Self {
        let defaults = Self::default();
        Self {
            continuous: section.continuous.unwrap_or(defaults.continuous),
            interim_results: section.interim_results.unwrap_or(defaults.interim_results),
            lang: section.lang.clone().unwrap_or(defaults.lang),
        }
    }
}

/// One recognition hypothesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub transcript: String,
    pub is_final: bool,
}

impl RecognitionResult {
    pub fn final_text(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }

    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }
}

/// Callback from a running recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Results from `result_index` onward are new since the last event.
    Result {
        result_index: usize,
        results: Vec<RecognitionResult>,
    },
    /// Raw error code, e.g. `not-allowed`, `network`, `no-speech`.
    Error(String),
    /// The recognizer stopped on its own or after `stop`.
    End,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct SpeechError(pub String);

/// A live recognition handle.
///
/// Every successful `start` is followed by exactly one [`SpeechEvent::End`],
/// including runs ended through `stop`.
pub trait Recognizer: Send {
    fn start(&mut self) -> Result<(), SpeechError>;
    fn stop(&mut self);
}

/// Platform speech-recognition provider.
pub trait SpeechCapability {
    fn is_supported(&self) -> bool;
    fn create(
        &self,
        options: &RecognizerOptions,
        events: UnboundedSender<SpeechEvent>,
    ) -> Result<Box<dyn Recognizer>, SpeechError>;
}

/// Capability for platforms without speech recognition.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl SpeechCapability for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    fn create(
        &self,
        _options: &RecognizerOptions,
        _events: UnboundedSender<SpeechEvent>,
    ) -> Result<Box<dyn Recognizer>, SpeechError> {
        Err(SpeechError("speech recognition is not supported".into()))
    }
}

/// Listening flag, latest transcript and error for one input box.
pub struct SpeechInput {
    recognizer: Option<Box<dyn Recognizer>>,
    listening: bool,
    /// Stopped runs whose `End` has not been delivered yet.
    stale_runs: usize,
    transcript: String,
    error: Option<String>,
}

impl SpeechInput {
    /// Build the adapter. Unsupported capabilities leave it inert.
    pub fn new(
        capability: &dyn SpeechCapability,
        options: &RecognizerOptions,
        events: UnboundedSender<SpeechEvent>,
    ) -> Self {
        let recognizer = if capability.is_supported() {
            match capability.create(options, events) {
                Ok(recognizer) => Some(recognizer),
                Err(e) => {
                    tracing::warn!(error = %e, "could not create speech recognizer");
                    None
                }
            }
        } else {
            None
        };
        Self {
            recognizer,
            listening: false,
            stale_runs: 0,
            transcript: String::new(),
            error: None,
        }
    }

    /// Whether a mic control should be offered at all.
    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Hand the latest transcript to the caller and clear it.
    pub fn take_transcript(&mut self) -> Option<String> {
        if self.transcript.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.transcript))
        }
    }

    /// Start listening when idle, stop when listening. No-op when unsupported.
    pub fn toggle(&mut self) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            return;
        };

        if self.listening {
            recognizer.stop();
            self.listening = false;
            self.stale_runs += 1;
            tracing::debug!("speech input stopped");
            return;
        }

        self.transcript.clear();
        self.error = None;
        match recognizer.start() {
            Ok(()) => {
                self.listening = true;
                tracing::debug!("speech input listening");
            }
            Err(e) => {
                tracing::warn!(error = %e, "speech recognizer failed to start");
                self.error = Some(START_FAILED_MESSAGE.to_string());
                self.listening = false;
            }
        }
    }

    pub fn handle_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::Result {
                result_index,
                results,
            } => {
                let text: String = results
                    .iter()
                    .skip(result_index)
                    .filter(|r| r.is_final)
                    .map(|r| r.transcript.as_str())
                    .collect();
                if !text.is_empty() {
                    self.transcript = text;
                }
            }
            SpeechEvent::Error(code) if self.stale_runs > 0 => {
                tracing::debug!(%code, "ignoring error from a stopped recognizer run");
            }
            SpeechEvent::Error(code) => {
                tracing::warn!(%code, "speech recognition error");
                self.error = Some(describe_error(&code));
                self.listening = false;
            }
            SpeechEvent::End if self.stale_runs > 0 => {
                self.stale_runs -= 1;
            }
            SpeechEvent::End => {
                self.listening = false;
            }
        }
    }
}

impl Drop for SpeechInput {
    fn drop(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            if self.listening {
                recognizer.stop();
            }
        }
    }
}

/// User-facing text for a recognizer error code.
pub fn describe_error(code: &str) -> String {
    match code {
        "not-allowed" | "service-not-allowed" => ACCESS_DENIED_MESSAGE.to_string(),
        other => format!("Speech recognition error: {other}"),
    }
}

/// Merge a dictated transcript into a typed input buffer.
pub fn merge_transcript(buffer: &str, transcript: &str) -> String {
    if buffer.is_empty() {
        transcript.to_string()
    } else {
        format!("{buffer} {transcript}").trim().to_string()
    }
}
