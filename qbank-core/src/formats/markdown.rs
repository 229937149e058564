//! Markdown export (document assembly → comrak → Markdown string)
//!
//! Builds a comrak AST for the export document and lets comrak's serializer
//! produce the Markdown. Lesson bodies are already Markdown-dialect text, so
//! they are parsed with comrak and grafted into the document tree rather
//! than re-escaped.

use crate::error::ExportError;
use crate::export::{ExportDocument, ExportItem};
use crate::formats::ExportFormat;
use crate::model::{Lesson, Question};
use comrak::nodes::{
    Ast, AstNode, ListDelimType, ListType, NodeHeading, NodeLink, NodeList, NodeValue,
};
use comrak::{format_commonmark, parse_document, Arena, ComrakOptions};
use std::cell::RefCell;

pub struct MarkdownFormat;

impl ExportFormat for MarkdownFormat {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "Markdown document with numbered sections"
    }

    fn file_extension(&self) -> &str {
        "md"
    }

    fn serialize(&self, doc: &ExportDocument) -> Result<String, ExportError> {
        serialize_to_markdown(doc)
    }
}

/// Serialize an export document to Markdown.
pub fn serialize_to_markdown(doc: &ExportDocument) -> Result<String, ExportError> {
    let arena = Arena::new();
    let options = default_comrak_options();
    let root = append_node(&arena, None, NodeValue::Document);

    append_heading(&arena, root, 1, &doc.title);
    for (key, value) in &doc.metadata {
        let para = append_node(&arena, Some(root), NodeValue::Paragraph);
        let strong = append_node(&arena, Some(para), NodeValue::Strong);
        append_text(&arena, strong, &format!("{key}:"));
        append_text(&arena, para, &format!(" {value}"));
    }

    for (i, item) in doc.items.iter().enumerate() {
        match item {
            ExportItem::Question(question) => append_question(&arena, root, i + 1, question),
            ExportItem::Lesson(lesson) => append_lesson(&arena, root, i + 1, lesson, &options),
        }
    }

    let mut output = Vec::new();
    format_commonmark(root, &options, &mut output).map_err(|e| {
        ExportError::SerializationError(format!("Comrak serialization failed: {e}"))
    })?;
    String::from_utf8(output)
        .map_err(|e| ExportError::SerializationError(format!("UTF-8 conversion failed: {e}")))
}

fn default_comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options
}

fn append_node<'a>(
    arena: &'a Arena<AstNode<'a>>,
    parent: Option<&'a AstNode<'a>>,
    value: NodeValue,
) -> &'a AstNode<'a> {
    let node = arena.alloc(AstNode::new(RefCell::new(Ast::new(value, (0, 0).into()))));
    if let Some(parent) = parent {
        parent.append(node);
    }
    node
}

fn append_text<'a>(arena: &'a Arena<AstNode<'a>>, parent: &'a AstNode<'a>, text: &str) {
    append_node(arena, Some(parent), NodeValue::Text(text.to_string()));
}

fn append_heading<'a>(
    arena: &'a Arena<AstNode<'a>>,
    parent: &'a AstNode<'a>,
    level: u8,
    text: &str,
) {
    let heading = append_node(
        arena,
        Some(parent),
        NodeValue::Heading(NodeHeading {
            level,
            setext: false,
        }),
    );
    append_text(arena, heading, text);
}

fn ordered_list_data() -> NodeList {
    NodeList {
        list_type: ListType::Ordered,
        marker_offset: 0,
        padding: 0,
        start: 1,
        delimiter: ListDelimType::Period,
        bullet_char: b'-',
        tight: true,
    }
}

fn append_question<'a>(
    arena: &'a Arena<AstNode<'a>>,
    root: &'a AstNode<'a>,
    number: usize,
    question: &Question,
) {
    append_heading(arena, root, 2, &format!("Question {number}"));

    let stem = append_node(arena, Some(root), NodeValue::Paragraph);
    append_text(arena, stem, &question.question);

    if let Some(url) = &question.image_url {
        let para = append_node(arena, Some(root), NodeValue::Paragraph);
        let image = append_node(
            arena,
            Some(para),
            NodeValue::Image(NodeLink {
                url: url.clone(),
                title: String::new(),
            }),
        );
        append_text(
            arena,
            image,
            question
                .image_description
                .as_deref()
                .unwrap_or("Question image"),
        );
    }

    let list = append_node(arena, Some(root), NodeValue::List(ordered_list_data()));
    for option in &question.options {
        let item = append_node(arena, Some(list), NodeValue::Item(ordered_list_data()));
        let para = append_node(arena, Some(item), NodeValue::Paragraph);
        if option == &question.correct_option {
            let strong = append_node(arena, Some(para), NodeValue::Strong);
            append_text(arena, strong, option);
            append_text(arena, para, " (correct)");
        } else {
            append_text(arena, para, option);
        }
    }

    if !question.explanation.is_empty() {
        let para = append_node(arena, Some(root), NodeValue::Paragraph);
        let strong = append_node(arena, Some(para), NodeValue::Strong);
        append_text(arena, strong, "Explanation:");
        append_text(arena, para, &format!(" {}", question.explanation));
    }

    let mut meta = format!(
        "Bloom's level {} / Difficulty: {}",
        question.blooms_level,
        question.difficulty_name()
    );
    if !question.tags.is_empty() {
        meta.push_str(&format!(" / Tags: {}", question.tags.join(", ")));
    }
    let para = append_node(arena, Some(root), NodeValue::Paragraph);
    let emph = append_node(arena, Some(para), NodeValue::Emph);
    append_text(arena, emph, &meta);
}

fn append_lesson<'a>(
    arena: &'a Arena<AstNode<'a>>,
    root: &'a AstNode<'a>,
    number: usize,
    lesson: &Lesson,
    options: &ComrakOptions<'static>,
) {
    let mut title = format!("{number}. {}", lesson.topic);
    if lesson.high_yield == Some(true) {
        title.push_str(" (High Yield)");
    }
    append_heading(arena, root, 2, &title);
    graft_markdown(arena, root, &lesson.topic_lesson, options);
    for chapter in &lesson.chapters {
        append_heading(arena, root, 3, &chapter.name);
        graft_markdown(arena, root, &chapter.lesson, options);
    }
}

/// Parse already-Markdown text and adopt its blocks into the document.
fn graft_markdown<'a>(
    arena: &'a Arena<AstNode<'a>>,
    parent: &'a AstNode<'a>,
    source: &str,
    options: &ComrakOptions<'static>,
) {
    if source.trim().is_empty() {
        return;
    }
    let parsed = parse_document(arena, source, options);
    let children: Vec<&AstNode> = parsed.children().collect();
    for child in children {
        parent.append(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChapterLesson;

    fn question(correct: &str) -> Question {
        Question {
            question: "A 62-year-old presents with exertional syncope. Most likely cause?"
                .to_string(),
            options: vec![
                "Mitral stenosis".to_string(),
                "Aortic stenosis".to_string(),
                "Tricuspid regurgitation".to_string(),
                "Pulmonary stenosis".to_string(),
            ],
            correct_option: correct.to_string(),
            explanation: "Exertional syncope is classic for aortic stenosis.".to_string(),
            blooms_level: 3,
            difficulty: 2,
            tags: vec!["USMLE".to_string()],
            image_url: None,
            image_description: None,
            image_type: None,
            image_source: None,
            image_search_terms: None,
            image_status: None,
        }
    }

    #[test]
    fn question_document_has_header_and_numbered_sections() {
        let doc = ExportDocument::from_questions(
            "USMLE",
            Some("Cardiology"),
            &[],
            vec![question("Aortic stenosis"), question("Mitral stenosis")],
        );
        let md = serialize_to_markdown(&doc).unwrap();
        assert!(md.starts_with("# USMLE Question Bank"));
        assert!(md.contains("**Course:** USMLE"));
        assert!(md.contains("## Question 1"));
        assert!(md.contains("## Question 2"));
        assert!(md.contains("**Aortic stenosis** (correct)"));
        assert_eq!(md.matches("(correct)").count(), 2);
    }

    #[test]
    fn image_bearing_question_references_its_image() {
        let mut q = question("Aortic stenosis");
        q.image_url = Some("https://img.example/echo.png".to_string());
        q.image_description = Some("Parasternal long axis view".to_string());
        let doc = ExportDocument::from_questions("USMLE", None, &[], vec![q]);
        let md = serialize_to_markdown(&doc).unwrap();
        assert!(md.contains("![Parasternal long axis view](https://img.example/echo.png)"));
    }

    #[test]
    fn lesson_bodies_are_grafted_as_markdown() {
        let lesson = Lesson {
            topic: "Valvular Disease".to_string(),
            high_yield: Some(true),
            topic_lesson: "An overview with **key** findings.".to_string(),
            chapters: vec![ChapterLesson {
                name: "Aortic Stenosis".to_string(),
                lesson: "* syncope\n* angina\n* dyspnea".to_string(),
                nice_refs: None,
            }],
        };
        let doc = ExportDocument::from_lessons("NEET PG", None, vec![lesson]);
        let md = serialize_to_markdown(&doc).unwrap();
        assert!(md.contains("## 1"));
        assert!(md.contains("Valvular Disease (High Yield)"));
        assert!(md.contains("**key**"));
        assert!(md.contains("### Aortic Stenosis"));
        assert!(md.contains("syncope"));
    }
}
