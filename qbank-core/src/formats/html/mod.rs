//! HTML export format.
//!
//! # Library Choice
//!
//! Output goes through the `html5ever` + `markup5ever_rcdom` ecosystem: the
//! document is built as an rcdom tree and serialized by html5ever, so text
//! and attributes are escaped by a browser-grade serializer rather than by
//! string templating.
//!
//! # Element Mapping
//!
//! | IR element   | HTML                                                  |
//! |--------------|-------------------------------------------------------|
//! | Heading      | `<hN class="lesson-heading">` (capped at h6)          |
//! | Paragraph    | `<p class="lesson-paragraph">`                        |
//! | List         | `<ul>`/`<ol>` with `class="lesson-list"`              |
//! | Table        | `<table class="lesson-table">` + thead/tbody          |
//! | Image        | `<figure class="lesson-image">` + img + figcaption    |
//! | Diagram      | `<figure class="diagram">` + `<pre class="mermaid">`  |
//! | Code         | `<pre class="lesson-code">` + `<code>`                |
//! | Callout      | `<div class="callout callout-<kind>">`                |
//! | ChapterRef   | `<a class="chapter-ref" href="#chapter-N">`           |
//!
//! Questions render their options as exactly one `<ol class="options">` in
//! which exactly one `<li>` carries the `option-correct` class (matched by
//! string equality with the question's correct option).

pub mod serializer;

use crate::error::ExportError;
use crate::export::{ExportDocument, ExportItem};
use crate::formats::ExportFormat;
use crate::model::{Lesson, Question};
use crate::render::ir::Block;
use crate::render::{parse_inline, render_lesson};
use markup5ever_rcdom::Handle;
use serializer::{
    add_inline_nodes, append_block, create_element, create_text, serialize_container,
    wrap_in_document, HtmlOptions,
};

pub struct HtmlFormat;

impl ExportFormat for HtmlFormat {
    fn name(&self) -> &str {
        "html"
    }

    fn description(&self) -> &str {
        "Self-contained HTML preview"
    }

    fn file_extension(&self) -> &str {
        "html"
    }

    fn serialize(&self, doc: &ExportDocument) -> Result<String, ExportError> {
        serialize_to_html(doc, &HtmlOptions::default())
    }
}

/// Serialize an export document to a complete HTML page.
pub fn serialize_to_html(
    doc: &ExportDocument,
    options: &HtmlOptions,
) -> Result<String, ExportError> {
    let container = create_element("div", vec![("class", "qbank-document")]);

    let title = create_element("h1", vec![("class", "document-title")]);
    title.children.borrow_mut().push(create_text(&doc.title));
    container.children.borrow_mut().push(title);

    if !doc.metadata.is_empty() {
        let meta = create_element("dl", vec![("class", "document-meta")]);
        for (key, value) in &doc.metadata {
            let dt = create_element("dt", vec![]);
            dt.children.borrow_mut().push(create_text(key));
            meta.children.borrow_mut().push(dt);
            let dd = create_element("dd", vec![]);
            dd.children.borrow_mut().push(create_text(value));
            meta.children.borrow_mut().push(dd);
        }
        container.children.borrow_mut().push(meta);
    }

    let mut any_diagrams = false;
    for (i, item) in doc.items.iter().enumerate() {
        match item {
            ExportItem::Question(question) => {
                append_question_section(&container, i + 1, question);
            }
            ExportItem::Lesson(lesson) => {
                any_diagrams |= append_lesson_section(&container, i + 1, lesson);
            }
        }
    }

    let body = serialize_container(&container)?;
    Ok(wrap_in_document(&body, &doc.title, options, any_diagrams))
}

/// Render one lesson text on its own, without the document wrapper sections.
pub fn render_lesson_page(
    title: &str,
    content: &str,
    chapters: &[String],
    options: &HtmlOptions,
) -> Result<String, ExportError> {
    let blocks = render_lesson(content, chapters);
    let container = create_element("div", vec![("class", "qbank-document")]);
    for block in &blocks {
        append_block(&container, block);
    }
    let body = serialize_container(&container)?;
    Ok(wrap_in_document(
        &body,
        title,
        options,
        blocks_have_diagram(&blocks),
    ))
}

fn append_question_section(parent: &Handle, number: usize, question: &Question) {
    let section = create_element("section", vec![("class", "question")]);

    let heading = create_element("h2", vec![("class", "question-number")]);
    heading
        .children
        .borrow_mut()
        .push(create_text(&format!("Question {number}")));
    section.children.borrow_mut().push(heading);

    let stem = create_element("p", vec![("class", "question-stem")]);
    add_inline_nodes(&stem, &parse_inline(&question.question));
    section.children.borrow_mut().push(stem);

    if let Some(url) = &question.image_url {
        let figure = create_element("figure", vec![("class", "question-image")]);
        let alt = question.image_description.as_deref().unwrap_or("");
        let img = create_element("img", vec![("src", url.as_str()), ("alt", alt)]);
        figure.children.borrow_mut().push(img);
        section.children.borrow_mut().push(figure);
    }

    let list = create_element("ol", vec![("class", "options")]);
    for option in &question.options {
        let class = if option == &question.correct_option {
            "option option-correct"
        } else {
            "option"
        };
        let li = create_element("li", vec![("class", class)]);
        li.children.borrow_mut().push(create_text(option));
        list.children.borrow_mut().push(li);
    }
    section.children.borrow_mut().push(list);

    if !question.explanation.is_empty() {
        let explanation = create_element("div", vec![("class", "explanation")]);
        let label = create_element("strong", vec![]);
        label.children.borrow_mut().push(create_text("Explanation:"));
        explanation.children.borrow_mut().push(label);
        explanation
            .children
            .borrow_mut()
            .push(create_text(&format!(" {}", question.explanation)));
        section.children.borrow_mut().push(explanation);
    }

    let mut meta = format!(
        "Bloom's level {} · Difficulty: {}",
        question.blooms_level,
        question.difficulty_name()
    );
    if !question.tags.is_empty() {
        meta.push_str(&format!(" · Tags: {}", question.tags.join(", ")));
    }
    let meta_el = create_element("p", vec![("class", "question-meta")]);
    meta_el.children.borrow_mut().push(create_text(&meta));
    section.children.borrow_mut().push(meta_el);

    parent.children.borrow_mut().push(section);
}

/// Returns whether the lesson rendered any diagram blocks.
fn append_lesson_section(parent: &Handle, number: usize, lesson: &Lesson) -> bool {
    let chapters = lesson.chapter_names();
    let section = create_element("section", vec![("class", "lesson")]);

    let mut title = format!("{number}. {}", lesson.topic);
    if lesson.high_yield == Some(true) {
        title.push_str(" (High Yield)");
    }
    let heading = create_element("h2", vec![("class", "lesson-topic")]);
    heading.children.borrow_mut().push(create_text(&title));
    section.children.borrow_mut().push(heading);

    let mut any_diagrams = false;
    let topic_blocks = render_lesson(&lesson.topic_lesson, &chapters);
    any_diagrams |= blocks_have_diagram(&topic_blocks);
    for block in &topic_blocks {
        append_block(&section, block);
    }

    for (index, chapter) in lesson.chapters.iter().enumerate() {
        let id = format!("chapter-{index}");
        let heading = create_element("h3", vec![("class", "chapter-heading"), ("id", &id)]);
        heading.children.borrow_mut().push(create_text(&chapter.name));
        section.children.borrow_mut().push(heading);

        let blocks = render_lesson(&chapter.lesson, &chapters);
        any_diagrams |= blocks_have_diagram(&blocks);
        for block in &blocks {
            append_block(&section, block);
        }
    }

    parent.children.borrow_mut().push(section);
    any_diagrams
}

fn blocks_have_diagram(blocks: &[Block]) -> bool {
    blocks.iter().any(|block| match block {
        Block::Diagram(_) => true,
        Block::Callout(callout) => blocks_have_diagram(&callout.body),
        _ => false,
    })
}
