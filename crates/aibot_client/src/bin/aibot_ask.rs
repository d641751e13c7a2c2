//! aibot-ask: one-shot chat from the command line.
//! Reads config, initializes the chat service, sends one message (argument
//! or first stdin line) and prints the streamed reply to stdout.

use aibot_client::{config, ChatSession, Role, SendOutcome};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "aibot-ask", about = "Send one message to the AI and stream the reply")]
struct Cli {
    /// Config file (default: ~/.aibot/config.yaml)
    #[arg(long, env = "AIBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Message to send; read from stdin when omitted
    message: Option<String>,
}

fn read_message(cli: &Cli) -> String {
    if let Some(message) = &cli.message {
        return message.clone();
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).unwrap_or(0);
    line.trim().to_string()
}

fn main() {
    aibot_client::init_tracing();
    let cli = Cli::parse();

    let config_path = config::resolve_config_path(cli.config.as_deref()).unwrap_or_else(|| {
        eprintln!("Error: unable to determine config path (set --config or AIBOT_CONFIG)");
        process::exit(1);
    });
    let cfg = match config::load_or_default(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to load config from {}: {}", config_path.display(), e);
            process::exit(1);
        }
    };

    let message = read_message(&cli);
    if message.trim().is_empty() {
        eprintln!("Error: no message provided");
        process::exit(1);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Error: failed to create runtime: {}", e);
            process::exit(1);
        });

    let outcome = rt.block_on(async {
        let service = aibot_client::initialize(&cfg).await;
        let mut session = ChatSession::new(service, cfg.greeting());

        let stdout = io::stdout();
        let mut printed = 0usize;
        let outcome = session
            .send(&message, |s| {
                if !s.is_loading() {
                    return;
                }
                if let Some(last) = s.conversation().last().filter(|m| m.role == Role::Ai) {
                    let mut out = stdout.lock();
                    let _ = write!(out, "{}", &last.content[printed..]);
                    let _ = out.flush();
                    printed = last.content.len();
                }
            })
            .await;

        if let Some(banner) = session.error() {
            eprintln!("{}", banner);
        }
        outcome
    });

    match outcome {
        SendOutcome::Completed => println!(),
        SendOutcome::Ignored => {}
        SendOutcome::Disabled | SendOutcome::Failed(_) => {
            println!();
            process::exit(1);
        }
    }
}
