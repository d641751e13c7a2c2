//! Terminal rendering of messages, markdown blocks and the error banner.

use std::io::{self, Write};

use aibot_client::{render, Block, ChatSession, Message, Role, Span};
use crossterm::cursor::MoveUp;
use crossterm::queue;
use crossterm::style::{self as term, Stylize};
use crossterm::terminal::{Clear, ClearType};
use unicode_width::UnicodeWidthStr;

const TYPING: &str = "▍";
const INDENT: &str = "     ";

/// Whether to emit ANSI styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Ansi,
    Plain,
}

fn render_spans(spans: &[Span], style: Style, out: &mut String) {
    for span in spans {
        match span {
            Span::Plain(text) => out.push_str(text),
            Span::Bold(text) if style == Style::Ansi => {
                out.push_str(&term::style(text).bold().to_string());
            }
            Span::Bold(text) => out.push_str(text),
            Span::LineBreak => out.push('\n'),
        }
    }
}

/// Render markdown blocks as terminal text, blocks separated by a blank line.
pub fn render_blocks(blocks: &[Block], style: Style) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        match block {
            Block::Paragraph(spans) => render_spans(spans, style, &mut out),
            Block::OrderedList(items) => {
                for (n, item) in items.iter().enumerate() {
                    if n > 0 {
                        out.push('\n');
                    }
                    out.push_str(&format!("{}. ", n + 1));
                    render_spans(item, style, &mut out);
                }
            }
            Block::UnorderedList(items) => {
                for (n, item) in items.iter().enumerate() {
                    if n > 0 {
                        out.push('\n');
                    }
                    out.push_str("• ");
                    render_spans(item, style, &mut out);
                }
            }
        }
    }
    out
}

/// One message as printed: `you> ...` verbatim, `ai> ...` through the
/// markdown renderer. Continuation lines are indented under the prefix.
pub fn render_message(message: &Message, style: Style, streaming: bool) -> String {
    let (prefix, mut body) = match message.role {
        Role::User => ("you> ", message.content.clone()),
        Role::Ai => ("ai>  ", render_blocks(&render(&message.content), style)),
    };
    if streaming {
        body.push_str(TYPING);
    }
    let mut out = String::from(prefix);
    out.push_str(&body.replace('\n', &format!("\n{INDENT}")));
    out.push('\n');
    out
}

/// The single-line error banner.
pub fn render_banner(error: &str, style: Style) -> String {
    match style {
        Style::Ansi => format!("{}\n", term::style(format!("! {error}")).bold()),
        Style::Plain => format!("! {error}\n"),
    }
}

/// Terminal rows unstyled `text` occupies at `columns` wide.
pub fn rows(text: &str, columns: usize) -> usize {
    let columns = columns.max(1);
    text.lines()
        .map(|line| line.width().div_ceil(columns).max(1))
        .sum()
}

/// Redraws the trailing message in place while a reply streams. When the
/// output is not a terminal, only the finished reply is printed.
pub struct LiveView {
    style: Style,
    live: bool,
    columns: usize,
    drawn_rows: usize,
}

impl LiveView {
    pub fn new(style: Style, live: bool, columns: usize) -> Self {
        Self {
            style,
            live,
            columns,
            drawn_rows: 0,
        }
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Forget the previous draw; the next update starts on a fresh line.
    pub fn begin(&mut self) {
        self.drawn_rows = 0;
    }

    pub fn update(&mut self, session: &ChatSession, out: &mut impl Write) -> io::Result<()> {
        if !self.live {
            return Ok(());
        }
        let Some(last) = session.conversation().last() else {
            return Ok(());
        };
        if last.role != Role::Ai {
            return Ok(());
        }
        let streaming = session.is_loading();
        if self.drawn_rows > 0 {
            let up = u16::try_from(self.drawn_rows).unwrap_or(u16::MAX);
            queue!(out, MoveUp(up), Clear(ClearType::FromCursorDown))?;
        }
        write!(out, "{}", render_message(last, self.style, streaming))?;
        out.flush()?;
        // Escape sequences take no columns; measure the unstyled text.
        let plain = render_message(last, Style::Plain, streaming);
        self.drawn_rows = rows(&plain, self.columns);
        Ok(())
    }

    /// Print what live updates did not: the final reply when not live, and
    /// the error banner.
    pub fn finish(&mut self, session: &ChatSession, out: &mut impl Write) -> io::Result<()> {
        if !self.live {
            if let Some(last) = session.conversation().last() {
                write!(out, "{}", render_message(last, self.style, false))?;
            }
        }
        if let Some(error) = session.error() {
            write!(out, "{}", render_banner(error, self.style))?;
        }
        self.drawn_rows = 0;
        out.flush()
    }
}
