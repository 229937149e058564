//! End-to-end rendering of a kitchen-sink lesson.

use qbank_core::formats::html::render_lesson_page;
use qbank_core::formats::html::serializer::HtmlOptions;
use qbank_core::render::ir::{Block, CalloutKind};
use qbank_core::render::{render_lesson, rewrite_chapter_references};

const KITCHENSINK: &str = include_str!("fixtures/kitchensink.md");

fn kitchensink_blocks() -> Vec<Block> {
    render_lesson(KITCHENSINK, &["Natural History".to_string()])
}

#[test]
fn top_level_structure_is_headings_prose_callout_and_list() {
    let blocks = kitchensink_blocks();

    let headings: Vec<u8> = blocks
        .iter()
        .filter_map(|b| match b {
            Block::Heading(h) => Some(h.level),
            _ => None,
        })
        .collect();
    assert_eq!(headings, vec![2, 2]);

    // The mnemonic claims everything up to the next heading, so no table or
    // diagram floats at the top level.
    assert!(!blocks.iter().any(|b| matches!(b, Block::Table(_))));
    assert!(!blocks.iter().any(|b| matches!(b, Block::Diagram(_))));
    assert!(blocks
        .iter()
        .any(|b| matches!(b, Block::List(l) if l.ordered)));
}

#[test]
fn mnemonic_callout_absorbs_table_diagram_and_image() {
    let blocks = kitchensink_blocks();
    let callout = blocks
        .iter()
        .find_map(|b| match b {
            Block::Callout(c) => Some(c),
            _ => None,
        })
        .expect("mnemonic callout");
    assert_eq!(callout.kind, CalloutKind::Mnemonic);

    assert!(callout.body.iter().any(|b| matches!(b, Block::Table(_))));
    assert!(callout.body.iter().any(|b| matches!(b, Block::Diagram(_))));
    assert!(callout.body.iter().any(|b| matches!(b, Block::Image(_))));
    assert!(callout
        .body
        .iter()
        .any(|b| matches!(b, Block::List(l) if !l.ordered)));
    // The overlapping "Key Points Summary" label stays plain text.
    assert!(!callout
        .body
        .iter()
        .any(|b| matches!(b, Block::Callout(_))));
}

#[test]
fn diagram_source_is_untouched_by_the_full_pipeline() {
    let blocks = kitchensink_blocks();
    let mut diagrams = Vec::new();
    collect_diagram_sources(&blocks, &mut diagrams);
    assert_eq!(diagrams.len(), 1);
    assert_eq!(
        diagrams[0],
        "graph TD\n  A[Calcific degeneration] --> B[Outflow obstruction]\n  B --> C[LV hypertrophy]\n"
    );
}

fn collect_diagram_sources(blocks: &[Block], out: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Diagram(d) => out.push(d.source.clone()),
            Block::Callout(c) => collect_diagram_sources(&c.body, out),
            _ => {}
        }
    }
}

#[test]
fn chapter_rewrite_is_idempotent_on_the_fixture() {
    let chapters = vec!["Natural History".to_string(), "Aortic Stenosis".to_string()];
    let once = rewrite_chapter_references(KITCHENSINK, &chapters);
    let twice = rewrite_chapter_references(&once, &chapters);
    assert_eq!(once, twice);
    assert!(once.contains("[[chapter:0|Natural History]]"));
}

#[test]
fn html_page_carries_all_renditions() {
    let html = render_lesson_page(
        "Aortic Stenosis",
        KITCHENSINK,
        &["Natural History".to_string()],
        &HtmlOptions::default(),
    )
    .unwrap();

    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("callout callout-mnemonic"));
    assert!(html.contains("class=\"mermaid\""));
    assert!(html.contains("Diagram unavailable"));
    assert!(html.contains("lesson-table"));
    assert!(html.contains("href=\"#chapter-0\""));
    assert!(html.contains("mermaid.esm.min.mjs"));
}
