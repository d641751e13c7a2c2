//! Terminal front-end for the AI chat client: rendering, input handling and
//! a command-backed speech capability.

pub mod app;
pub mod speech;
pub mod view;

pub use app::{parse_command, App, Command, Flow};
pub use speech::CommandSpeech;
pub use view::{render_blocks, render_message, LiveView, Style};
