//! HTML DOM construction and serialization.
//!
//! Blocks become an rcdom tree serialized by html5ever, then wrapped in a
//! self-contained HTML document with embedded CSS. Diagram blocks render as
//! a placeholder handed to mermaid at load time plus a hidden fallback
//! notice revealed if the external renderer cannot start.

use crate::error::ExportError;
use crate::render::ir::{Block, Inline};
use html5ever::{
    ns, serialize, serialize::SerializeOpts, serialize::TraversalScope, Attribute, LocalName,
    QualName,
};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Options for HTML document output
#[derive(Debug, Clone, Default)]
pub struct HtmlOptions {
    /// Optional custom CSS appended after the baseline stylesheet
    pub custom_css: Option<String>,
}

/// Append the DOM rendition of one block to `parent`.
pub fn append_block(parent: &Handle, block: &Block) {
    match block {
        Block::Heading(heading) => {
            let tag = format!("h{}", heading.level.min(6));
            let node = create_element(&tag, vec![("class", "lesson-heading")]);
            add_inline_nodes(&node, &heading.content);
            parent.children.borrow_mut().push(node);
        }

        Block::Paragraph(paragraph) => {
            let node = create_element("p", vec![("class", "lesson-paragraph")]);
            add_inline_nodes(&node, &paragraph.content);
            parent.children.borrow_mut().push(node);
        }

        Block::List(list) => {
            let tag = if list.ordered { "ol" } else { "ul" };
            let node = create_element(tag, vec![("class", "lesson-list")]);
            for item in &list.items {
                let li = create_element("li", vec![]);
                add_inline_nodes(&li, item);
                node.children.borrow_mut().push(li);
            }
            parent.children.borrow_mut().push(node);
        }

        Block::Table(table) => {
            let node = create_element("table", vec![("class", "lesson-table")]);
            let thead = create_element("thead", vec![]);
            let tr = create_element("tr", vec![]);
            for cell in &table.header.cells {
                let th = create_element("th", vec![]);
                add_inline_nodes(&th, cell);
                tr.children.borrow_mut().push(th);
            }
            thead.children.borrow_mut().push(tr);
            node.children.borrow_mut().push(thead);

            let tbody = create_element("tbody", vec![]);
            for row in &table.rows {
                let tr = create_element("tr", vec![]);
                for cell in &row.cells {
                    let td = create_element("td", vec![]);
                    add_inline_nodes(&td, cell);
                    tr.children.borrow_mut().push(td);
                }
                tbody.children.borrow_mut().push(tr);
            }
            node.children.borrow_mut().push(tbody);
            parent.children.borrow_mut().push(node);
        }

        Block::Image(image) => {
            let figure = create_element("figure", vec![("class", "lesson-image")]);
            let img = create_element("img", vec![("src", &image.src), ("alt", &image.alt)]);
            figure.children.borrow_mut().push(img);
            if !image.alt.is_empty() {
                let caption = create_element("figcaption", vec![]);
                caption.children.borrow_mut().push(create_text(&image.alt));
                figure.children.borrow_mut().push(caption);
            }
            parent.children.borrow_mut().push(figure);
        }

        Block::Diagram(diagram) => {
            let figure = create_element("figure", vec![("class", "diagram")]);
            let pre = create_element("pre", vec![("class", "mermaid"), ("id", &diagram.id)]);
            pre.children.borrow_mut().push(create_text(&diagram.source));
            figure.children.borrow_mut().push(pre);
            let fallback = create_element(
                "div",
                vec![("class", "diagram-fallback"), ("hidden", "")],
            );
            fallback
                .children
                .borrow_mut()
                .push(create_text("Diagram unavailable"));
            figure.children.borrow_mut().push(fallback);
            parent.children.borrow_mut().push(figure);
        }

        Block::Code(code) => {
            let mut attrs = vec![("class", "lesson-code")];
            let language;
            if let Some(lang) = &code.language {
                language = lang.clone();
                attrs.push(("data-language", &language));
            }
            let pre = create_element("pre", attrs);
            let code_el = create_element("code", vec![]);
            code_el.children.borrow_mut().push(create_text(&code.source));
            pre.children.borrow_mut().push(code_el);
            parent.children.borrow_mut().push(pre);
        }

        Block::Callout(callout) => {
            let class = format!("callout callout-{}", callout.kind.css_class());
            let node = create_element("div", vec![("class", &class)]);
            let title = create_element("div", vec![("class", "callout-title")]);
            title
                .children
                .borrow_mut()
                .push(create_text(callout.kind.label()));
            node.children.borrow_mut().push(title);
            let body = create_element("div", vec![("class", "callout-body")]);
            for inner in &callout.body {
                append_block(&body, inner);
            }
            node.children.borrow_mut().push(body);
            parent.children.borrow_mut().push(node);
        }
    }
}

/// Add inline content to an HTML node.
pub fn add_inline_nodes(parent: &Handle, content: &[Inline]) {
    for node in content {
        match node {
            Inline::Text(text) => {
                parent.children.borrow_mut().push(create_text(text));
            }
            Inline::Bold(children) => {
                let strong = create_element("strong", vec![]);
                add_inline_nodes(&strong, children);
                parent.children.borrow_mut().push(strong);
            }
            Inline::Italic(children) => {
                let em = create_element("em", vec![]);
                add_inline_nodes(&em, children);
                parent.children.borrow_mut().push(em);
            }
            Inline::Image(image) => {
                let img =
                    create_element("img", vec![("src", &image.src), ("alt", &image.alt)]);
                parent.children.borrow_mut().push(img);
            }
            Inline::ChapterRef { index, label } => {
                let href = format!("#chapter-{index}");
                let data_index = index.to_string();
                let anchor = create_element(
                    "a",
                    vec![
                        ("class", "chapter-ref"),
                        ("href", &href),
                        ("data-chapter", &data_index),
                    ],
                );
                anchor.children.borrow_mut().push(create_text(label));
                parent.children.borrow_mut().push(anchor);
            }
        }
    }
}

/// Create an HTML element with attributes
pub fn create_element(tag: &str, attrs: Vec<(&str, &str)>) -> Handle {
    let qual_name = QualName::new(None, ns!(html), LocalName::from(tag));
    let attributes = attrs
        .into_iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(name)),
            value: value.to_string().into(),
        })
        .collect();

    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Element {
            name: qual_name,
            attrs: RefCell::new(attributes),
            template_contents: Default::default(),
            mathml_annotation_xml_integration_point: false,
        },
    })
}

/// Create a text node
pub fn create_text(text: &str) -> Handle {
    Rc::new(Node {
        parent: Cell::new(None),
        children: RefCell::new(Vec::new()),
        data: NodeData::Text {
            contents: RefCell::new(text.to_string().into()),
        },
    })
}

/// Serialize a container element's children to an HTML string.
pub fn serialize_container(container: &Handle) -> Result<String, ExportError> {
    let mut output = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    for child in container.children.borrow().iter() {
        let serializable = SerializableHandle::from(child.clone());
        serialize(&mut output, &serializable, opts.clone()).map_err(|e| {
            ExportError::SerializationError(format!("HTML serialization failed: {e}"))
        })?;
    }
    String::from_utf8(output)
        .map_err(|e| ExportError::SerializationError(format!("UTF-8 conversion failed: {e}")))
}

/// Wrap body markup in a complete HTML document with embedded CSS.
///
/// `include_mermaid` pulls in the external diagram renderer; its failure
/// path unhides the per-diagram fallback notices.
pub fn wrap_in_document(
    body_html: &str,
    title: &str,
    options: &HtmlOptions,
    include_mermaid: bool,
) -> String {
    let baseline_css = include_str!("../../../css/baseline.css");
    let custom_css = options.custom_css.as_deref().unwrap_or("");
    let escaped_title = html_escape(title);
    let mermaid_script = if include_mermaid {
        concat!(
            "<script type=\"module\">\n",
            "  import mermaid from \"https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.esm.min.mjs\";\n",
            "  try {\n",
            "    mermaid.initialize({ startOnLoad: true });\n",
            "  } catch (err) {\n",
            "    for (const el of document.querySelectorAll(\".diagram-fallback\")) {\n",
            "      el.removeAttribute(\"hidden\");\n",
            "    }\n",
            "  }\n",
            "</script>"
        )
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="generator" content="qbank">
  <title>{escaped_title}</title>
  <style>
{baseline_css}
{custom_css}
  </style>
</head>
<body>
<div class="qbank-document">
{body_html}
</div>
{mermaid_script}
</body>
</html>"#
    )
}

/// Escape HTML special characters in text
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ir::{Diagram, Heading, Paragraph};

    fn serialize_one(block: &Block) -> String {
        let container = create_element("div", vec![("class", "qbank-document")]);
        append_block(&container, block);
        serialize_container(&container).unwrap()
    }

    #[test]
    fn heading_gets_capped_level_and_class() {
        let html = serialize_one(&Block::Heading(Heading {
            level: 2,
            content: vec![Inline::text("Overview")],
        }));
        assert!(html.contains("<h2 class=\"lesson-heading\">Overview</h2>"));
    }

    #[test]
    fn text_content_is_escaped() {
        let html = serialize_one(&Block::Paragraph(Paragraph {
            content: vec![Inline::text("a < b & c")],
        }));
        assert!(html.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn diagram_has_placeholder_and_fallback() {
        let html = serialize_one(&Block::Diagram(Diagram {
            id: "diagram-0".to_string(),
            source: "A-->B\n".to_string(),
        }));
        assert!(html.contains("class=\"mermaid\""));
        assert!(html.contains("id=\"diagram-0\""));
        assert!(html.contains("A--&gt;B"));
        assert!(html.contains("diagram-fallback"));
        assert!(html.contains("Diagram unavailable"));
    }

    #[test]
    fn chapter_ref_links_to_chapter_anchor() {
        let html = serialize_one(&Block::Paragraph(Paragraph {
            content: vec![Inline::ChapterRef {
                index: 3,
                label: "Valves".to_string(),
            }],
        }));
        assert!(html.contains("href=\"#chapter-3\""));
        assert!(html.contains("data-chapter=\"3\""));
        assert!(html.contains(">Valves</a>"));
    }

    #[test]
    fn document_wrapper_embeds_css_and_mermaid_on_demand() {
        let with = wrap_in_document("<p>x</p>", "T", &HtmlOptions::default(), true);
        assert!(with.contains("<!DOCTYPE html>"));
        assert!(with.contains(".qbank-document"));
        assert!(with.contains("mermaid.esm.min.mjs"));
        let without = wrap_in_document("<p>x</p>", "T", &HtmlOptions::default(), false);
        assert!(!without.contains("mermaid.esm.min.mjs"));
    }
}
