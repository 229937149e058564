//! Export document assembly and download naming.

use crate::model::{Lesson, Question};
use chrono::{DateTime, Utc};

#[cfg(feature = "api-client")]
pub mod images;

/// A document ready for serialization by an export format: a title, header
/// metadata, and sequentially numbered items.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub title: String,
    pub metadata: Vec<(String, String)>,
    pub items: Vec<ExportItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportItem {
    Question(Question),
    Lesson(Lesson),
}

impl ExportDocument {
    pub fn from_questions(
        course: &str,
        subject: Option<&str>,
        topics: &[String],
        questions: Vec<Question>,
    ) -> ExportDocument {
        let mut metadata = vec![("Course".to_string(), course.to_string())];
        if let Some(subject) = subject {
            metadata.push(("Subject".to_string(), subject.to_string()));
        }
        if !topics.is_empty() {
            metadata.push(("Topics".to_string(), topics.join(", ")));
        }
        metadata.push(("Questions".to_string(), questions.len().to_string()));
        ExportDocument {
            title: format!("{course} Question Bank"),
            metadata,
            items: questions.into_iter().map(ExportItem::Question).collect(),
        }
    }

    pub fn from_lessons(
        course: &str,
        subject: Option<&str>,
        lessons: Vec<Lesson>,
    ) -> ExportDocument {
        let mut metadata = vec![("Course".to_string(), course.to_string())];
        if let Some(subject) = subject {
            metadata.push(("Subject".to_string(), subject.to_string()));
        }
        metadata.push(("Lessons".to_string(), lessons.len().to_string()));
        ExportDocument {
            title: format!("{course} Lessons"),
            metadata,
            items: lessons.into_iter().map(ExportItem::Lesson).collect(),
        }
    }
}

/// Download filename: `{prefix}_{course}_{timestamp}.{ext}`.
pub fn export_filename(prefix: &str, course: &str, ext: &str) -> String {
    export_filename_at(prefix, course, ext, Utc::now())
}

fn export_filename_at(prefix: &str, course: &str, ext: &str, at: DateTime<Utc>) -> String {
    format!(
        "{prefix}_{}_{}.{ext}",
        sanitize_component(course),
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Collapse a free-text course name into a filename-safe component.
fn sanitize_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "course".to_string()
    } else {
        trimmed.to_string()
    }
}
