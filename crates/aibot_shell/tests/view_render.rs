//! Terminal rendering of markdown blocks and messages.

use aibot_client::{render, ChatSession, InitError, Message};
use aibot_shell_lib::view::{render_banner, rows};
use aibot_shell_lib::{render_blocks, render_message, LiveView, Style};
use crossterm::cursor::MoveUp;
use crossterm::queue;
use crossterm::style::{self as term, Stylize};
use crossterm::terminal::{Clear, ClearType};

#[test]
fn lists_are_numbered_and_bulleted() {
    let blocks = render("Plan:\n\n1. **Read** it\n2. Write it\n\n* quick\n* tidy");
    assert_eq!(
        render_blocks(&blocks, Style::Plain),
        "Plan:\n\n1. Read it\n2. Write it\n\n• quick\n• tidy"
    );
}

#[test]
fn bold_uses_ansi_only_when_styled() {
    let blocks = render("a **b** c");
    assert_eq!(
        render_blocks(&blocks, Style::Ansi),
        format!("a {} c", term::style("b").bold())
    );
    assert_ne!(render_blocks(&blocks, Style::Ansi), "a b c");
    assert_eq!(render_blocks(&blocks, Style::Plain), "a b c");
}

#[test]
fn user_messages_are_printed_verbatim() {
    let message = Message::user("**not bold**\n1. not a list");
    assert_eq!(
        render_message(&message, Style::Ansi, false),
        "you> **not bold**\n     1. not a list\n"
    );
}

#[test]
fn ai_continuation_lines_are_indented() {
    let message = Message::ai("line one\nline two");
    assert_eq!(
        render_message(&message, Style::Plain, false),
        "ai>  line one\n     line two\n"
    );
}

#[test]
fn streaming_message_shows_typing_marker() {
    let empty = Message::ai("");
    assert_eq!(render_message(&empty, Style::Plain, true), "ai>  ▍\n");

    let partial = Message::ai("Hel");
    assert_eq!(render_message(&partial, Style::Plain, true), "ai>  Hel▍\n");
}

#[test]
fn banner_is_one_line() {
    assert_eq!(render_banner("Network Error: offline", Style::Plain), "! Network Error: offline\n");
    assert_eq!(
        render_banner("oops", Style::Ansi),
        format!("{}\n", term::style("! oops").bold())
    );
}

#[test]
fn rows_count_wrapped_lines() {
    assert_eq!(rows("ai>  hi\n", 80), 1);
    assert_eq!(rows("ai>  a\n     b\n", 80), 2);
    assert_eq!(rows(&"x".repeat(81), 80), 2);
    assert_eq!(rows("\n", 80), 1);
}

#[test]
fn wide_characters_take_two_columns() {
    let cjk = format!("{}\n", "你好".repeat(10));
    assert_eq!(rows(&cjk, 10), 4);
    assert_eq!(rows("🦀🦀🦀", 4), 2);
}

#[test]
fn live_redraw_moves_up_over_wrapped_wide_reply() {
    // Greeting: 5 prefix columns plus 20 wide characters is 45 columns.
    let greeting = "你好".repeat(10);
    let session = ChatSession::new(Err(InitError("offline".into())), &greeting);
    let mut view = LiveView::new(Style::Plain, true, 10);

    let mut first = Vec::new();
    view.update(&session, &mut first).unwrap();
    assert_eq!(String::from_utf8(first).unwrap(), format!("ai>  {greeting}\n"));

    let mut second = Vec::new();
    view.update(&session, &mut second).unwrap();
    let mut expected = Vec::new();
    queue!(expected, MoveUp(5), Clear(ClearType::FromCursorDown)).unwrap();
    assert!(second.starts_with(&expected));
}
