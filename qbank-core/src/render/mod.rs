//! Lesson-dialect rendering.
//!
//! Turns a lesson's free text into the block IR that the HTML serializer
//! consumes. See [`passes`] for the pass ordering contract. Rendering never
//! fails: malformed input degrades to literal text.

pub mod chapter_refs;
pub mod inline;
pub mod ir;
pub mod passes;

pub use chapter_refs::rewrite_chapter_references;
pub use inline::parse_inline;
pub use ir::{Block, Callout, CalloutKind, Inline};

/// Render one lesson text to blocks.
///
/// `chapters` is the ordered chapter-name list of the surrounding topic;
/// recognized mentions become navigable [`ir::Inline::ChapterRef`] nodes.
/// Pass an empty slice to skip cross-reference rewriting.
pub fn render_lesson(content: &str, chapters: &[String]) -> Vec<Block> {
    passes::run_pipeline(content, chapters)
}
