//! aibot: interactive terminal chat.
//! Reads config, initializes the chat service once, then handles input lines
//! and speech events on a single event loop until `/quit` or EOF.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use aibot_client::config::{self, Backend};
use aibot_client::speech::RecognizerOptions;
use aibot_client::{ChatSession, SpeechInput};
use aibot_shell_lib::{App, CommandSpeech, Flow, LiveView, Style};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const DEFAULT_COLUMNS: usize = 80;

#[derive(Parser)]
#[command(name = "aibot", about = "Chat with an AI assistant in the terminal")]
struct Cli {
    /// Config file (default: ~/.aibot/config.yaml)
    #[arg(long, env = "AIBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Chat backend, overriding chat.backend
    #[arg(long, value_parser = parse_backend)]
    backend: Option<Backend>,

    /// Relay WebSocket URL, overriding relay.url
    #[arg(long)]
    relay_url: Option<String>,
}

fn parse_backend(value: &str) -> Result<Backend, String> {
    match value {
        "gemini" => Ok(Backend::Gemini),
        "relay" => Ok(Backend::Relay),
        other => Err(format!("unknown backend {other:?} (expected gemini or relay)")),
    }
}

fn terminal_columns() -> usize {
    crossterm::terminal::size()
        .ok()
        .map(|(columns, _)| usize::from(columns))
        .or_else(|| std::env::var("COLUMNS").ok().and_then(|c| c.parse().ok()))
        .filter(|&c| c > 0)
        .unwrap_or(DEFAULT_COLUMNS)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    aibot_client::init_tracing();
    let cli = Cli::parse();

    let Some(config_path) = config::resolve_config_path(cli.config.as_deref()) else {
        eprintln!("Error: unable to determine config path (set --config or AIBOT_CONFIG)");
        return ExitCode::FAILURE;
    };
    let mut cfg = match config::load_or_default(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to load config from {}: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(backend) = cli.backend {
        cfg.chat.backend = Some(backend);
    }
    if let Some(url) = cli.relay_url {
        cfg.relay.url = Some(url);
    }

    let service = aibot_client::initialize(&cfg).await;
    if let Err(e) = &service {
        tracing::error!(error = %e, "chat service failed to initialize");
    }
    let session = ChatSession::new(service, cfg.greeting());

    let (speech_tx, mut speech_rx) = mpsc::unbounded_channel();
    let capability = CommandSpeech::from_config(&cfg.speech);
    let speech = SpeechInput::new(
        &capability,
        &RecognizerOptions::from(&cfg.speech),
        speech_tx,
    );

    let stdout = io::stdout();
    let live = stdout.is_terminal();
    let style = if live && std::env::var_os("NO_COLOR").is_none() {
        Style::Ansi
    } else {
        Style::Plain
    };
    let view = LiveView::new(style, live, terminal_columns());
    let mut app = App::new(session, speech, view, cfg.greeting());

    let mut out = stdout.lock();
    if let Err(e) = app.print_intro(&mut out) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if live {
            let _ = app.prompt(&mut out);
        }
        let step = tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => app.handle_line(&line, &mut out).await,
                Ok(None) => Ok(Flow::Quit),
                Err(e) => Err(e),
            },
            Some(event) = speech_rx.recv() => app.handle_speech(event, &mut out).map(|()| Flow::Continue),
        };
        match step {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if app.session().is_disabled() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
