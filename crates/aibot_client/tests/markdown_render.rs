//! Block classification and inline span parsing of the markdown renderer.

use aibot_client::markdown::{parse_inline, render, Block, Span};

fn plain(s: &str) -> Span {
    Span::Plain(s.to_string())
}

fn bold(s: &str) -> Span {
    Span::Bold(s.to_string())
}

#[test]
fn prose_without_blank_lines_is_one_paragraph_with_line_breaks() {
    let blocks = render("first line\nsecond line\nthird line");
    assert_eq!(
        blocks,
        vec![Block::Paragraph(vec![
            plain("first line"),
            Span::LineBreak,
            plain("second line"),
            Span::LineBreak,
            plain("third line"),
        ])]
    );
}

#[test]
fn blank_lines_separate_blocks() {
    let blocks = render("one\n\ntwo\n   \n\nthree");
    assert_eq!(
        blocks,
        vec![
            Block::Paragraph(vec![plain("one")]),
            Block::Paragraph(vec![plain("two")]),
            Block::Paragraph(vec![plain("three")]),
        ]
    );
}

#[test]
fn empty_input_renders_nothing() {
    assert!(render("").is_empty());
    assert!(render("\n\n").is_empty());
}

#[test]
fn numbered_lines_become_ordered_list_items() {
    let blocks = render("1. Install Rust\n2. Run **cargo new**\n  10. Profit");
    assert_eq!(
        blocks,
        vec![Block::OrderedList(vec![
            vec![plain("Install Rust")],
            vec![plain("Run "), bold("cargo new")],
            vec![plain("Profit")],
        ])]
    );
}

#[test]
fn asterisk_lines_become_unordered_list_items() {
    let blocks = render("* apples\n * pears");
    assert_eq!(
        blocks,
        vec![Block::UnorderedList(vec![
            vec![plain("apples")],
            vec![plain("pears")],
        ])]
    );
}

#[test]
fn one_prose_line_demotes_list_to_paragraph() {
    let blocks = render("Steps:\n1. first\n2. second");
    assert_eq!(
        blocks,
        vec![Block::Paragraph(vec![
            plain("Steps:"),
            Span::LineBreak,
            plain("1. first"),
            Span::LineBreak,
            plain("2. second"),
        ])]
    );

    let mixed = render("* one\n1. two");
    assert!(matches!(mixed.as_slice(), [Block::Paragraph(_)]));
}

#[test]
fn marker_without_trailing_space_is_not_a_list() {
    assert!(matches!(render("1.no space").as_slice(), [Block::Paragraph(_)]));
    assert!(matches!(render("*emphasis*").as_slice(), [Block::Paragraph(_)]));
}

#[test]
fn list_and_paragraph_blocks_keep_order() {
    let blocks = render("Intro\n\n* a\n* b\n\n1. c");
    assert_eq!(blocks.len(), 3);
    assert!(matches!(blocks[0], Block::Paragraph(_)));
    assert!(matches!(blocks[1], Block::UnorderedList(_)));
    assert!(matches!(blocks[2], Block::OrderedList(_)));
}

#[test]
fn bold_then_plain() {
    assert_eq!(
        parse_inline("**bold** and plain"),
        vec![bold("bold"), plain(" and plain")]
    );
}

#[test]
fn bold_runs_are_non_greedy() {
    assert_eq!(
        parse_inline("a **b** c **d**"),
        vec![plain("a "), bold("b"), plain(" c "), bold("d")]
    );
}

#[test]
fn unterminated_bold_stays_plain() {
    assert_eq!(parse_inline("**open and never closed"), vec![plain("**open and never closed")]);
    assert_eq!(
        parse_inline("**done** then **dangling"),
        vec![bold("done"), plain(" then **dangling")]
    );
}

#[test]
fn rendering_is_idempotent_across_streamed_prefixes() {
    let full = "Here you go:\n\n1. **Clone** the repo\n2. Build it\n\n* fast\n* safe";
    for end in (0..=full.len()).filter(|&i| full.is_char_boundary(i)) {
        let prefix = &full[..end];
        assert_eq!(render(prefix), render(prefix), "prefix {prefix:?}");
    }
}
