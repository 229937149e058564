//! Chapter cross-reference rewriting.
//!
//! Recognized chapter-name mentions are rewritten into `[[chapter:i|name]]`
//! markers that the inline parser turns into navigable references. Names are
//! processed longest first so "Heart" never claims part of a "Heart Failure"
//! mention, and any candidate overlapping an existing marker is skipped, so
//! running the rewrite twice changes nothing.

use regex::Regex;

const MARKER_PATTERN: &str = r"\[\[chapter:\d+\|[^\]]*\]\]";

/// Rewrite `(see **Name**)`, `(see Name)` and standalone `**Name**` mentions
/// of each chapter into reference markers carrying the chapter's index.
pub fn rewrite_chapter_references(text: &str, chapters: &[String]) -> String {
    if chapters.is_empty() {
        return text.to_string();
    }
    let mut order: Vec<(usize, &String)> = chapters.iter().enumerate().collect();
    order.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));

    let mut out = text.to_string();
    for (index, name) in order {
        if name.trim().is_empty() {
            continue;
        }
        let escaped = regex::escape(name);
        let patterns = [
            (format!(r"\(see \*\*{escaped}\*\*\)"), true),
            (format!(r"\(see {escaped}\)"), true),
            (format!(r"\*\*{escaped}\*\*"), false),
        ];
        for (pattern, parenthesized) in patterns {
            let re = Regex::new(&pattern).expect("escaped chapter pattern is valid");
            loop {
                let spans = marker_spans(&out);
                let found = re
                    .find_iter(&out)
                    .find(|m| !overlaps(&spans, m.start(), m.end()))
                    .map(|m| (m.start(), m.end()));
                let Some((start, end)) = found else {
                    break;
                };
                let marker = format!("[[chapter:{index}|{name}]]");
                let replacement = if parenthesized {
                    format!("(see {marker})")
                } else {
                    marker
                };
                out.replace_range(start..end, &replacement);
            }
        }
    }
    out
}

fn marker_spans(text: &str) -> Vec<(usize, usize)> {
    let re = Regex::new(MARKER_PATTERN).expect("marker pattern is valid");
    re.find_iter(text).map(|m| (m.start(), m.end())).collect()
}

fn overlaps(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| start < e && s < end)
}
