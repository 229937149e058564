//! JSON export: a structural pass-through of the items.
//!
//! The document header exists only in the Markdown and HTML renditions; the
//! JSON download is the item list itself, minus bookkeeping fields (the
//! model marks those `skip_serializing`).

use crate::error::ExportError;
use crate::export::{ExportDocument, ExportItem};
use crate::formats::ExportFormat;

pub struct JsonFormat;

impl ExportFormat for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Verbatim JSON item list"
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    fn serialize(&self, doc: &ExportDocument) -> Result<String, ExportError> {
        let encode_err = |e: serde_json::Error| {
            ExportError::SerializationError(format!("JSON encoding: {e}"))
        };

        // Serialize homogeneous lists directly so field order stays exactly
        // as the model declares it (a Value round-trip would sort keys).
        let questions: Vec<_> = doc
            .items
            .iter()
            .filter_map(|item| match item {
                ExportItem::Question(q) => Some(q),
                ExportItem::Lesson(_) => None,
            })
            .collect();
        if questions.len() == doc.items.len() {
            return serde_json::to_string_pretty(&questions).map_err(encode_err);
        }
        let lessons: Vec<_> = doc
            .items
            .iter()
            .filter_map(|item| match item {
                ExportItem::Lesson(l) => Some(l),
                ExportItem::Question(_) => None,
            })
            .collect();
        if lessons.len() == doc.items.len() {
            return serde_json::to_string_pretty(&lessons).map_err(encode_err);
        }

        let values: Result<Vec<serde_json::Value>, serde_json::Error> = doc
            .items
            .iter()
            .map(|item| match item {
                ExportItem::Question(q) => serde_json::to_value(q),
                ExportItem::Lesson(l) => serde_json::to_value(l),
            })
            .collect();
        serde_json::to_string_pretty(&serde_json::Value::Array(values.map_err(encode_err)?))
            .map_err(encode_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;

    fn question() -> Question {
        Question {
            question: "Q1".to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            correct_option: "B".to_string(),
            explanation: String::new(),
            blooms_level: 2,
            difficulty: 1,
            tags: vec![],
            image_url: None,
            image_description: None,
            image_type: None,
            image_source: None,
            image_search_terms: None,
            image_status: Some("pending".to_string()),
        }
    }

    #[test]
    fn export_drops_bookkeeping_fields_only() {
        let doc = ExportDocument::from_questions("NEET PG", None, &[], vec![question()]);
        let json = JsonFormat.serialize(&doc).unwrap();
        assert!(json.contains("\"correctOption\": \"B\""));
        assert!(!json.contains("imageStatus"));
        assert!(!json.contains("pending"));
        // Round-trips back into the model.
        let back: Vec<Question> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].correct_option, "B");
    }
}
