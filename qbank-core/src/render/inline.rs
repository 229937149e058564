//! Inline markup parsing for the lesson dialect.
//!
//! Handles `**bold**`, `*italic*`, inline images and `[[chapter:i|label]]`
//! reference markers. Unclosed markers never fail: they stay in the output
//! as literal text.

use crate::render::ir::{Image, Inline};

/// Parse one run of text into inline nodes.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if let Some((node, consumed)) = match_special(rest) {
            flush(&mut literal, &mut nodes);
            nodes.push(node);
            i += consumed;
        } else {
            let ch = rest.chars().next().expect("non-empty remainder");
            literal.push(ch);
            i += ch.len_utf8();
        }
    }
    flush(&mut literal, &mut nodes);
    nodes
}

fn flush(literal: &mut String, nodes: &mut Vec<Inline>) {
    if !literal.is_empty() {
        nodes.push(Inline::Text(std::mem::take(literal)));
    }
}

fn match_special(rest: &str) -> Option<(Inline, usize)> {
    if let Some(found) = match_image(rest) {
        return Some(found);
    }
    if let Some(found) = match_chapter_ref(rest) {
        return Some(found);
    }
    if let Some(inner) = rest.strip_prefix("**") {
        if let Some(close) = inner.find("**") {
            if close > 0 {
                let content = &inner[..close];
                return Some((Inline::Bold(parse_inline(content)), close + 4));
            }
        }
        return None;
    }
    if let Some(inner) = rest.strip_prefix('*') {
        if let Some(close) = inner.find('*') {
            if close > 0 {
                let content = &inner[..close];
                return Some((Inline::Italic(parse_inline(content)), close + 2));
            }
        }
        return None;
    }
    None
}

/// `![alt](src)`
fn match_image(rest: &str) -> Option<(Inline, usize)> {
    let inner = rest.strip_prefix("![")?;
    let close_bracket = inner.find(']')?;
    let alt = &inner[..close_bracket];
    let after = inner[close_bracket + 1..].strip_prefix('(')?;
    let close_paren = after.find(')')?;
    let src = after[..close_paren].trim();
    if src.is_empty() {
        return None;
    }
    let consumed = 2 + close_bracket + 2 + close_paren + 1;
    Some((
        Inline::Image(Image {
            src: src.to_string(),
            alt: alt.to_string(),
        }),
        consumed,
    ))
}

/// `[[chapter:3|label]]`
fn match_chapter_ref(rest: &str) -> Option<(Inline, usize)> {
    let inner = rest.strip_prefix("[[chapter:")?;
    let close = inner.find("]]")?;
    let (index_part, label) = inner[..close].split_once('|')?;
    let index = index_part.parse::<usize>().ok()?;
    Some((
        Inline::ChapterRef {
            index,
            label: label.to_string(),
        },
        "[[chapter:".len() + close + 2,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(
            parse_inline("just some prose"),
            vec![Inline::text("just some prose")]
        );
    }

    #[test]
    fn bold_and_italic_are_wrapped() {
        assert_eq!(
            parse_inline("Some **bold** and *quiet* text"),
            vec![
                Inline::text("Some "),
                Inline::Bold(vec![Inline::text("bold")]),
                Inline::text(" and "),
                Inline::Italic(vec![Inline::text("quiet")]),
                Inline::text(" text"),
            ]
        );
    }

    #[test]
    fn nested_markup_parses_recursively() {
        assert_eq!(
            parse_inline("**bold *inner* tail**"),
            vec![Inline::Bold(vec![
                Inline::text("bold "),
                Inline::Italic(vec![Inline::text("inner")]),
                Inline::text(" tail"),
            ])]
        );
    }

    #[test]
    fn unclosed_markers_stay_literal() {
        assert_eq!(
            parse_inline("an **unclosed marker"),
            vec![Inline::text("an **unclosed marker")]
        );
        assert_eq!(
            parse_inline("a * stray asterisk"),
            vec![Inline::text("a * stray asterisk")]
        );
    }

    #[test]
    fn inline_images_are_recognized() {
        assert_eq!(
            parse_inline("see ![ECG strip](https://img.example/ecg.png) here"),
            vec![
                Inline::text("see "),
                Inline::Image(Image {
                    src: "https://img.example/ecg.png".to_string(),
                    alt: "ECG strip".to_string(),
                }),
                Inline::text(" here"),
            ]
        );
    }

    #[test]
    fn chapter_ref_markers_become_references() {
        assert_eq!(
            parse_inline("(see [[chapter:2|Heart Failure]])"),
            vec![
                Inline::text("(see "),
                Inline::ChapterRef {
                    index: 2,
                    label: "Heart Failure".to_string(),
                },
                Inline::text(")"),
            ]
        );
    }

    #[test]
    fn malformed_marker_stays_literal() {
        assert_eq!(
            parse_inline("[[chapter:x|Nope]]"),
            vec![Inline::text("[[chapter:x|Nope]]")]
        );
    }
}
