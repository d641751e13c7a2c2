//! Minimal markdown block renderer for streamed replies.
//!
//! Only paragraphs, `1.` ordered lists, `*` unordered lists and `**bold**`
//! spans are recognised. The whole accumulated text is re-rendered on every
//! update, so [`render`] keeps no state between calls.

use regex::Regex;
use std::sync::LazyLock;

static BLOCK_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid block separator pattern"));
static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[0-9]+\.\s").expect("valid ordered item pattern"));
static UNORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\*\s").expect("valid unordered item pattern"));
static BOLD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*.*?\*\*").expect("valid bold pattern"));

/// Inline piece of a rendered line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Plain(String),
    Bold(String),
    /// Separates the source lines of a paragraph.
    LineBreak,
}

/// One classified block of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Span>),
    OrderedList(Vec<Vec<Span>>),
    UnorderedList(Vec<Vec<Span>>),
}

/// Render `content` into blocks. Identical input always yields identical output.
pub fn render(content: &str) -> Vec<Block> {
    BLOCK_SEPARATOR
        .split(content)
        .filter(|block| !block.is_empty())
        .map(render_block)
        .collect()
}

fn render_block(block: &str) -> Block {
    let lines: Vec<&str> = block.split('\n').collect();

    if lines.iter().all(|line| ORDERED_ITEM.is_match(line)) {
        return Block::OrderedList(list_items(&lines, &ORDERED_ITEM));
    }
    if lines.iter().all(|line| UNORDERED_ITEM.is_match(line)) {
        return Block::UnorderedList(list_items(&lines, &UNORDERED_ITEM));
    }

    let mut spans = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            spans.push(Span::LineBreak);
        }
        spans.extend(parse_inline(line));
    }
    Block::Paragraph(spans)
}

fn list_items(lines: &[&str], marker: &Regex) -> Vec<Vec<Span>> {
    lines
        .iter()
        .map(|line| parse_inline(&marker.replace(line, "")))
        .collect()
}

/// Split one line into plain and bold spans, in source order.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;
    for run in BOLD_RUN.find_iter(text) {
        if run.start() > last {
            spans.push(Span::Plain(text[last..run.start()].to_string()));
        }
        let inner = &text[run.start() + 2..run.end() - 2];
        spans.push(Span::Bold(inner.to_string()));
        last = run.end();
    }
    if last < text.len() {
        spans.push(Span::Plain(text[last..].to_string()));
    }
    spans
}
