//! Terminal speech capability backed by an external speech-to-text command.
//!
//! The command is started on `/mic` and stopped on the next `/mic`. Each
//! non-empty line it prints is one final transcript.

use std::process::Stdio;

use aibot_client::config::SpeechSection;
use aibot_client::speech::{
    RecognitionResult, Recognizer, RecognizerOptions, SpeechCapability, SpeechError,
};
use aibot_client::SpeechEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

/// Error code reported when the command exits unsuccessfully.
const CAPTURE_FAILED: &str = "audio-capture";

/// Supported only when `speech.command` is configured.
#[derive(Debug, Clone, Default)]
pub struct CommandSpeech {
    program: Option<String>,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn from_config(section: &SpeechSection) -> Self {
        Self {
            program: section.command.clone().filter(|c| !c.trim().is_empty()),
            args: section.args.clone(),
        }
    }
}

impl SpeechCapability for CommandSpeech {
    fn is_supported(&self) -> bool {
        self.program.is_some()
    }

    fn create(
        &self,
        options: &RecognizerOptions,
        events: UnboundedSender<SpeechEvent>,
    ) -> Result<Box<dyn Recognizer>, SpeechError> {
        let program = self
            .program
            .clone()
            .ok_or_else(|| SpeechError("no speech command configured".into()))?;
        Ok(Box::new(CommandRecognizer {
            program,
            args: self.args.clone(),
            lang: options.lang.clone(),
            events,
            stop: None,
        }))
    }
}

struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    lang: String,
    events: UnboundedSender<SpeechEvent>,
    stop: Option<oneshot::Sender<()>>,
}

impl Recognizer for CommandRecognizer {
    fn start(&mut self) -> Result<(), SpeechError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("AIBOT_SPEECH_LANG", &self.lang)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpeechError(format!("could not run {}: {e}", self.program)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SpeechError("speech command has no stdout".into()))?;

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let events = self.events.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut stopped = false;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => {
                        stopped = true;
                        let _ = child.kill().await;
                        break;
                    }
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            let text = line.trim();
                            if !text.is_empty() {
                                let _ = events.send(SpeechEvent::Result {
                                    result_index: 0,
                                    results: vec![RecognitionResult::final_text(text)],
                                });
                            }
                        }
                        Ok(None) | Err(_) => break,
                    }
                }
            }
            let succeeded = matches!(child.wait().await, Ok(status) if status.success());
            if !stopped && !succeeded {
                let _ = events.send(SpeechEvent::Error(CAPTURE_FAILED.into()));
            }
            let _ = events.send(SpeechEvent::End);
        });

        self.stop = Some(stop_tx);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

impl Drop for CommandRecognizer {
    fn drop(&mut self) {
        self.stop();
    }
}
