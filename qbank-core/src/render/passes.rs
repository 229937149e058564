//! The ordered rendering pipeline.
//!
//! Rendering is a fixed sequence of passes over a list of segments, where a
//! segment is either unprocessed raw text or a finished block. Each pass only
//! splits raw segments; finished blocks pass through untouched. The order is
//! a contract:
//!
//! 1. fenced blocks (diagrams and code) are lifted out first, so no later
//!    pass can alter their sources;
//! 2. chapter mentions are rewritten into reference markers;
//! 3. callout labels claim their span, up to the next heading;
//! 4. tables, 5. images, 6. lists, 7. headings are carved out of what is
//!    left;
//! 8. remaining text becomes paragraphs split on blank lines.
//!
//! Callout bodies run through passes 4-8 themselves, so a callout may carry
//! tables or lists but never another callout: a second label inside a
//! claimed span stays plain text, which is the intended first-match-wins
//! policy rather than an error.

use crate::render::chapter_refs::rewrite_chapter_references;
use crate::render::inline::parse_inline;
use crate::render::ir::{
    Block, Callout, CalloutKind, Code, Diagram, Heading, Image, Inline, List, Paragraph, Table,
    TableRow,
};
use regex::Regex;
use std::collections::VecDeque;

/// A unit of pipeline work: text still to be parsed, or a finished block.
#[derive(Debug, Clone)]
pub enum Segment {
    Raw(String),
    Done(Block),
}

/// Run the full pipeline over one lesson text.
pub fn run_pipeline(content: &str, chapters: &[String]) -> Vec<Block> {
    let normalized = content.replace("\r\n", "\n");
    let mut next_diagram = 0usize;
    let mut segments = Vec::new();
    split_fences(&normalized, &mut next_diagram, &mut segments);

    if !chapters.is_empty() {
        segments = segments
            .into_iter()
            .map(|seg| match seg {
                Segment::Raw(text) => Segment::Raw(rewrite_chapter_references(&text, chapters)),
                done => done,
            })
            .collect();
    }

    let segments = extract_callouts(segments);
    finish_tail(segments)
}

/// Passes downstream of callout extraction. Callout bodies re-enter here.
fn finish_tail(segments: Vec<Segment>) -> Vec<Block> {
    let segments = map_raw(segments, split_tables);
    let segments = map_raw(segments, split_images);
    let segments = map_raw(segments, split_lists);
    let segments = map_raw(segments, split_headings);
    let segments = map_raw(segments, split_paragraphs);
    segments
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Done(block) => Some(block),
            // split_paragraphs leaves no raw text behind
            Segment::Raw(_) => None,
        })
        .collect()
}

fn map_raw(segments: Vec<Segment>, f: impl Fn(&str, &mut Vec<Segment>)) -> Vec<Segment> {
    let mut out = Vec::new();
    for seg in segments {
        match seg {
            Segment::Done(block) => out.push(Segment::Done(block)),
            Segment::Raw(text) => f(&text, &mut out),
        }
    }
    out
}

fn flush_raw(current: &mut String, out: &mut Vec<Segment>) {
    if !current.trim().is_empty() {
        out.push(Segment::Raw(std::mem::take(current)));
    } else {
        current.clear();
    }
}

// ---- pass 1: fenced blocks ------------------------------------------------

fn split_fences(text: &str, next_diagram: &mut usize, out: &mut Vec<Segment>) {
    let mut current = String::new();
    let mut fence_open = false;
    let mut info = String::new();
    let mut body = String::new();

    for line in text.lines() {
        if fence_open {
            if line.trim() == "```" {
                out.push(Segment::Done(fence_block(&info, &body, next_diagram)));
                fence_open = false;
                body.clear();
                info.clear();
            } else {
                body.push_str(line);
                body.push('\n');
            }
        } else if let Some(rest) = line.trim_start().strip_prefix("```") {
            flush_raw(&mut current, out);
            fence_open = true;
            info = rest.trim().to_string();
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    // Unclosed fence: the rest of the input is the block's source.
    if fence_open {
        out.push(Segment::Done(fence_block(&info, &body, next_diagram)));
    }
    flush_raw(&mut current, out);
}

fn fence_block(info: &str, source: &str, next_diagram: &mut usize) -> Block {
    if info.eq_ignore_ascii_case("mermaid") {
        let id = format!("diagram-{}", *next_diagram);
        *next_diagram += 1;
        Block::Diagram(Diagram {
            id,
            source: source.to_string(),
        })
    } else {
        Block::Code(Code {
            language: if info.is_empty() {
                None
            } else {
                Some(info.to_string())
            },
            source: source.to_string(),
        })
    }
}

// ---- pass 3: callouts -----------------------------------------------------

fn label_regex() -> Regex {
    Regex::new(
        r"(?im)^[ \t]*(?:\*\*)?(mnemonic|red flags?|clinical pearls?|key points summary|key points|visual aid)(?:\*\*)?:(?:\*\*)?[ \t]*",
    )
    .expect("label pattern is valid")
}

fn find_first_label(text: &str) -> Option<(String, CalloutKind, String)> {
    for caps in label_regex().captures_iter(text) {
        let whole = caps.get(0).expect("whole match");
        let label = caps.get(1).expect("label group");
        if let Some(kind) = CalloutKind::from_label(label.as_str()) {
            return Some((
                text[..whole.start()].to_string(),
                kind,
                text[whole.end()..].to_string(),
            ));
        }
    }
    None
}

/// Split at the first ATX heading line, if any.
fn split_at_heading(text: &str) -> (String, Option<String>) {
    let re = Regex::new(r"(?m)^[ \t]*#{1,6} ").expect("heading pattern is valid");
    match re.find(text) {
        Some(m) => (
            text[..m.start()].to_string(),
            Some(text[m.start()..].to_string()),
        ),
        None => (text.to_string(), None),
    }
}

fn extract_callouts(segments: Vec<Segment>) -> Vec<Segment> {
    let mut queue: VecDeque<Segment> = segments.into();
    let mut out = Vec::new();

    while let Some(seg) = queue.pop_front() {
        let text = match seg {
            Segment::Done(block) => {
                out.push(Segment::Done(block));
                continue;
            }
            Segment::Raw(text) => text,
        };
        let Some((before, kind, after)) = find_first_label(&text) else {
            out.push(Segment::Raw(text));
            continue;
        };
        if !before.trim().is_empty() {
            out.push(Segment::Raw(before));
        }

        // The callout runs to the next heading or end of input, absorbing
        // already-finished blocks (e.g. a diagram) along the way.
        let mut body = Vec::new();
        let (part, mut remainder) = split_at_heading(&after);
        if !part.trim().is_empty() {
            body.push(Segment::Raw(part));
        }
        while remainder.is_none() {
            match queue.pop_front() {
                None => break,
                Some(Segment::Done(block)) => body.push(Segment::Done(block)),
                Some(Segment::Raw(text)) => {
                    let (part, rest) = split_at_heading(&text);
                    if !part.trim().is_empty() {
                        body.push(Segment::Raw(part));
                    }
                    remainder = rest;
                }
            }
        }

        out.push(Segment::Done(Block::Callout(Callout {
            kind,
            body: finish_tail(body),
        })));
        if let Some(rest) = remainder {
            queue.push_front(Segment::Raw(rest));
        }
    }
    out
}

// ---- pass 4: tables -------------------------------------------------------

fn is_table_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

fn is_separator_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn parse_table_cells(line: &str, width: Option<usize>) -> Vec<Vec<Inline>> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    let mut cells: Vec<Vec<Inline>> = trimmed
        .split('|')
        .map(|cell| parse_inline(cell.trim()))
        .collect();
    if let Some(width) = width {
        // Malformed rows are padded or truncated to the header width.
        cells.truncate(width);
        while cells.len() < width {
            cells.push(Vec::new());
        }
    }
    cells
}

fn split_tables(text: &str, out: &mut Vec<Segment>) {
    let lines: Vec<&str> = text.lines().collect();
    let mut current = String::new();
    let mut i = 0;
    while i < lines.len() {
        if is_table_line(lines[i]) && i + 1 < lines.len() && is_separator_line(lines[i + 1]) {
            flush_raw(&mut current, out);
            let header = TableRow {
                cells: parse_table_cells(lines[i], None),
            };
            let width = header.cells.len();
            let mut rows = Vec::new();
            let mut j = i + 2;
            while j < lines.len() && is_table_line(lines[j]) {
                rows.push(TableRow {
                    cells: parse_table_cells(lines[j], Some(width)),
                });
                j += 1;
            }
            out.push(Segment::Done(Block::Table(Table { header, rows })));
            i = j;
        } else {
            current.push_str(lines[i]);
            current.push('\n');
            i += 1;
        }
    }
    flush_raw(&mut current, out);
}

// ---- pass 5: standalone images --------------------------------------------

fn split_images(text: &str, out: &mut Vec<Segment>) {
    let re = Regex::new(r"^!\[([^\]]*)\]\(([^)\s]+)\)[ \t]*$").expect("image pattern is valid");
    let mut current = String::new();
    for line in text.lines() {
        if let Some(caps) = re.captures(line.trim()) {
            flush_raw(&mut current, out);
            out.push(Segment::Done(Block::Image(Image {
                alt: caps[1].to_string(),
                src: caps[2].to_string(),
            })));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    flush_raw(&mut current, out);
}

// ---- pass 6: lists --------------------------------------------------------

fn list_item(line: &str) -> Option<(bool, &str)> {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed
        .strip_prefix("* ")
        .or_else(|| trimmed.strip_prefix("- "))
    {
        return Some((false, rest));
    }
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let after = &trimmed[digits..];
        if let Some(rest) = after.strip_prefix(". ").or_else(|| after.strip_prefix(") ")) {
            return Some((true, rest));
        }
    }
    None
}

fn split_lists(text: &str, out: &mut Vec<Segment>) {
    let mut current = String::new();
    let mut items: Vec<Vec<Inline>> = Vec::new();
    let mut ordered = false;

    for line in text.lines() {
        match list_item(line) {
            Some((item_ordered, content)) => {
                if items.is_empty() {
                    flush_raw(&mut current, out);
                    ordered = item_ordered;
                } else if item_ordered != ordered {
                    out.push(Segment::Done(Block::List(List {
                        ordered,
                        items: std::mem::take(&mut items),
                    })));
                    ordered = item_ordered;
                }
                items.push(parse_inline(content.trim()));
            }
            None => {
                if !items.is_empty() {
                    out.push(Segment::Done(Block::List(List {
                        ordered,
                        items: std::mem::take(&mut items),
                    })));
                }
                current.push_str(line);
                current.push('\n');
            }
        }
    }
    if !items.is_empty() {
        out.push(Segment::Done(Block::List(List { ordered, items })));
    }
    flush_raw(&mut current, out);
}

// ---- pass 7: headings -----------------------------------------------------

fn heading_line(line: &str) -> Option<(u8, &str)> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if (1..=6).contains(&hashes) {
        if let Some(content) = trimmed[hashes..].strip_prefix(' ') {
            return Some((hashes as u8, content.trim()));
        }
    }
    None
}

fn split_headings(text: &str, out: &mut Vec<Segment>) {
    let mut current = String::new();
    for line in text.lines() {
        if let Some((level, content)) = heading_line(line) {
            flush_raw(&mut current, out);
            out.push(Segment::Done(Block::Heading(Heading {
                level,
                content: parse_inline(content),
            })));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    flush_raw(&mut current, out);
}

// ---- pass 8: paragraphs ---------------------------------------------------

fn split_paragraphs(text: &str, out: &mut Vec<Segment>) {
    for chunk in text.split("\n\n") {
        let joined = chunk
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            out.push(Segment::Done(Block::Paragraph(Paragraph {
                content: parse_inline(&joined),
            })));
        }
    }
}
