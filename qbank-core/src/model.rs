//! Core data structures for course structures, questions and lessons.
//!
//! All entities are transient: they are reconstructed from backend responses
//! or uploaded JSON each session and never persisted. Serialized field names
//! are camelCase (the current backend contract); snake_case aliases keep
//! older payloads loadable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Root entity: the Course → Subject → Topic → Chapter tree that drives
/// every content-generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStructure {
    pub course: String,
    #[serde(default, alias = "exam_format", skip_serializing_if = "Option::is_none")]
    pub exam_format: Option<ExamFormat>,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl CourseStructure {
    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name)
    }

    /// Total number of topics across all subjects.
    pub fn topic_count(&self) -> usize {
        self.subjects.iter().map(|s| s.topics.len()).sum()
    }
}

/// Exam-level generation parameters. Percentages come from user input or an
/// AI response and are not trusted to sum to 100; the distribution module
/// normalizes them before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamFormat {
    #[serde(default = "default_num_options", alias = "num_options")]
    pub num_options: u32,
    #[serde(default, alias = "question_style")]
    pub question_style: String,
    /// Percent per Bloom's level. Keys are 1..=5 on the five-point scale;
    /// seven-point scales use 1..=7.
    #[serde(default, alias = "blooms_distribution")]
    pub blooms_distribution: BTreeMap<u8, f64>,
    #[serde(default, alias = "difficulty_distribution", skip_serializing_if = "Option::is_none")]
    pub difficulty_distribution: Option<BTreeMap<String, f64>>,
    #[serde(default, alias = "image_percentage_by_subject", skip_serializing_if = "Option::is_none")]
    pub image_percentage_by_subject: Option<BTreeMap<String, f64>>,
}

fn default_num_options() -> u32 {
    4
}

impl Default for ExamFormat {
    fn default() -> Self {
        ExamFormat {
            num_options: default_num_options(),
            question_style: String::new(),
            blooms_distribution: BTreeMap::new(),
            difficulty_distribution: None,
            image_percentage_by_subject: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub name: String,
    #[serde(default, alias = "high_yield", skip_serializing_if = "Option::is_none")]
    pub high_yield: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Vec<Chapter>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub name: String,
    #[serde(default, alias = "nice_refs", skip_serializing_if = "Option::is_none")]
    pub nice_refs: Option<Vec<String>>,
    /// Chapter lesson text in the lesson dialect. Older payloads used the
    /// key "chapterLesson".
    #[serde(default, alias = "chapterLesson", skip_serializing_if = "Option::is_none")]
    pub lesson: Option<String>,
}

/// A single multiple-choice question.
///
/// Difficulty follows the backend's scale: 1 = Medium, 2 = Hard,
/// 3 = Very Hard. `image_status` is transfer bookkeeping from the
/// image-attachment endpoint and is never serialized back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    #[serde(alias = "correct_option")]
    pub correct_option: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, alias = "blooms_level")]
    pub blooms_level: u8,
    #[serde(default)]
    pub difficulty: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "image_url", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, alias = "image_description", skip_serializing_if = "Option::is_none")]
    pub image_description: Option<String>,
    #[serde(default, alias = "image_type", skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    #[serde(default, alias = "image_source", skip_serializing_if = "Option::is_none")]
    pub image_source: Option<String>,
    #[serde(default, alias = "image_search_terms", skip_serializing_if = "Option::is_none")]
    pub image_search_terms: Option<Vec<String>>,
    #[serde(default, alias = "image_status", skip_serializing)]
    pub image_status: Option<String>,
}

impl Question {
    /// Index of `correct_option` within `options`, if the invariant holds.
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| o == &self.correct_option)
    }

    /// Check the `correct_option ∈ options` invariant.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.correct_index().is_none() {
            return Err(ModelError::CorrectOptionMissing {
                question: self.question.clone(),
                correct_option: self.correct_option.clone(),
            });
        }
        Ok(())
    }

    pub fn difficulty_name(&self) -> &'static str {
        match self.difficulty {
            1 => "Medium",
            2 => "Hard",
            3 => "Very Hard",
            _ => "Unrated",
        }
    }
}

/// Generated lesson text for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub topic: String,
    #[serde(default, alias = "high_yield", skip_serializing_if = "Option::is_none")]
    pub high_yield: Option<bool>,
    #[serde(default, alias = "topic_lesson")]
    pub topic_lesson: String,
    #[serde(default)]
    pub chapters: Vec<ChapterLesson>,
}

impl Lesson {
    /// Chapter names in document order, for cross-reference rewriting.
    pub fn chapter_names(&self) -> Vec<String> {
        self.chapters.iter().map(|c| c.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterLesson {
    pub name: String,
    #[serde(default)]
    pub lesson: String,
    #[serde(default, alias = "nice_refs", skip_serializing_if = "Option::is_none")]
    pub nice_refs: Option<Vec<String>>,
}

/// Data-model invariant violations
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// `correct_option` does not match any entry of `options`
    CorrectOptionMissing {
        question: String,
        correct_option: String,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::CorrectOptionMissing {
                question,
                correct_option,
            } => write!(
                f,
                "correct option '{correct_option}' is not among the options of question '{question}'"
            ),
        }
    }
}

impl std::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question {
            question: "Which vitamin deficiency causes scurvy?".to_string(),
            options: vec![
                "Vitamin A".to_string(),
                "Vitamin B12".to_string(),
                "Vitamin C".to_string(),
                "Vitamin D".to_string(),
            ],
            correct_option: "Vitamin C".to_string(),
            explanation: "Ascorbic acid is required for collagen synthesis.".to_string(),
            blooms_level: 1,
            difficulty: 1,
            tags: vec!["NEET-PG".to_string()],
            image_url: None,
            image_description: None,
            image_type: None,
            image_source: None,
            image_search_terms: None,
            image_status: None,
        }
    }

    #[test]
    fn validate_accepts_correct_option_in_options() {
        assert!(sample_question().validate().is_ok());
        assert_eq!(sample_question().correct_index(), Some(2));
    }

    #[test]
    fn validate_rejects_missing_correct_option() {
        let mut q = sample_question();
        q.correct_option = "Vitamin K".to_string();
        assert!(matches!(
            q.validate(),
            Err(ModelError::CorrectOptionMissing { .. })
        ));
    }

    #[test]
    fn question_roundtrips_camel_case() {
        let q = sample_question();
        let json = serde_json::to_string(&q).unwrap();
        assert!(json.contains("\"correctOption\""));
        assert!(json.contains("\"bloomsLevel\""));
        let back: Question = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
    }

    #[test]
    fn question_accepts_snake_case_payloads() {
        let json = r#"{
            "question": "Q",
            "options": ["A", "B"],
            "correct_option": "B",
            "explanation": "E",
            "blooms_level": 3,
            "difficulty": 2,
            "tags": ["USMLE"]
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.correct_option, "B");
        assert_eq!(q.blooms_level, 3);
        assert_eq!(q.difficulty_name(), "Hard");
    }

    #[test]
    fn image_status_is_not_serialized() {
        let mut q = sample_question();
        q.image_status = Some("pending".to_string());
        let json = serde_json::to_string(&q).unwrap();
        assert!(!json.contains("image_status"));
        assert!(!json.contains("imageStatus"));
    }

    #[test]
    fn chapter_accepts_legacy_lesson_key() {
        let json = r#"{"name": "Anatomy of the Heart", "chapterLesson": "text"}"#;
        let c: Chapter = serde_json::from_str(json).unwrap();
        assert_eq!(c.lesson.as_deref(), Some("text"));
    }

    #[test]
    fn exam_format_parses_integer_keyed_distribution() {
        let json = r#"{
            "numOptions": 5,
            "questionStyle": "clinical vignette",
            "bloomsDistribution": {"1": 10.0, "2": 20.0, "3": 30.0, "4": 25.0, "5": 15.0}
        }"#;
        let fmt: ExamFormat = serde_json::from_str(json).unwrap();
        assert_eq!(fmt.num_options, 5);
        assert_eq!(fmt.blooms_distribution.get(&3), Some(&30.0));
    }

    #[test]
    fn structure_lookup_by_subject_name() {
        let s = CourseStructure {
            course: "NEET PG".to_string(),
            exam_format: None,
            subjects: vec![Subject {
                name: "Biochemistry".to_string(),
                topics: vec![Topic {
                    name: "Vitamins".to_string(),
                    high_yield: Some(true),
                    chapters: None,
                }],
            }],
        };
        assert!(s.subject("Biochemistry").is_some());
        assert!(s.subject("Anatomy").is_none());
        assert_eq!(s.topic_count(), 1);
    }
}
