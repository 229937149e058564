//! The session workflow state machine.
//!
//! One user, one session: a single [`Session`] owns the loaded course
//! structure and everything generated from it, replacing the free-standing
//! mutable globals the workflow grew up with. Transitions are explicit and
//! invalid triggers are errors, not silent no-ops.
//!
//! ```text
//! Empty ──load──► StructureLoaded ──approve──► StructureApproved ──record──► ContentGenerated
//!   ▲                    ▲                             │                          │
//!   └───────reset────────┤◄──────────refine────────────┴──────────────────────────┘
//! ```

use crate::model::{CourseStructure, Lesson, Question};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Empty,
    StructureLoaded,
    StructureApproved,
    ContentGenerated,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Empty => "empty",
            WorkflowState::StructureLoaded => "structure-loaded",
            WorkflowState::StructureApproved => "structure-approved",
            WorkflowState::ContentGenerated => "content-generated",
        };
        write!(f, "{name}")
    }
}

/// Errors from invalid workflow operations
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The trigger is not legal in the current state
    InvalidTransition {
        from: WorkflowState,
        trigger: &'static str,
    },
    /// Uploaded structure was not valid JSON; the session is unchanged
    InvalidStructureJson(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidTransition { from, trigger } => {
                write!(f, "Cannot {trigger} while the session is {from}")
            }
            SessionError::InvalidStructureJson(msg) => {
                write!(f, "Uploaded structure is not valid JSON: {msg}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// All state for one user session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: WorkflowState,
    structure: Option<CourseStructure>,
    questions: Vec<Question>,
    lessons: Vec<Lesson>,
    reference_doc: Option<PathBuf>,
}

impl Session {
    pub fn new() -> Session {
        Session::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn structure(&self) -> Option<&CourseStructure> {
        self.structure.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn reference_doc(&self) -> Option<&PathBuf> {
        self.reference_doc.as_ref()
    }

    /// Load a course structure, from the backend or an upload.
    ///
    /// Legal in every state: loading a new course invalidates previously
    /// generated content and any prior approval.
    pub fn load_structure(&mut self, structure: CourseStructure) {
        self.structure = Some(structure);
        self.questions.clear();
        self.lessons.clear();
        self.state = WorkflowState::StructureLoaded;
    }

    /// Parse and load an uploaded JSON structure.
    ///
    /// On malformed input the session is left exactly as it was.
    pub fn load_structure_json(&mut self, raw: &str) -> Result<(), SessionError> {
        let structure: CourseStructure = serde_json::from_str(raw)
            .map_err(|e| SessionError::InvalidStructureJson(e.to_string()))?;
        self.load_structure(structure);
        Ok(())
    }

    /// Replace the structure with an AI-refined revision.
    ///
    /// A refined structure needs re-approval, so this returns the session to
    /// `StructureLoaded` even when it was already approved.
    pub fn apply_refinement(&mut self, updated: CourseStructure) -> Result<(), SessionError> {
        if self.state() == WorkflowState::Empty {
            return Err(SessionError::InvalidTransition {
                from: WorkflowState::Empty,
                trigger: "refine the structure",
            });
        }
        self.structure = Some(updated);
        self.state = WorkflowState::StructureLoaded;
        Ok(())
    }

    /// Sign off the loaded structure for content generation.
    pub fn approve_structure(&mut self) -> Result<(), SessionError> {
        match self.state() {
            WorkflowState::StructureLoaded => {
                self.state = WorkflowState::StructureApproved;
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                trigger: "approve the structure",
            }),
        }
    }

    /// Record generated questions. Repeated generation appends.
    pub fn record_questions(&mut self, questions: Vec<Question>) -> Result<(), SessionError> {
        match self.state() {
            WorkflowState::StructureApproved | WorkflowState::ContentGenerated => {
                self.questions.extend(questions);
                self.state = WorkflowState::ContentGenerated;
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                trigger: "record generated questions",
            }),
        }
    }

    /// Record generated lessons. Repeated generation appends.
    pub fn record_lessons(&mut self, lessons: Vec<Lesson>) -> Result<(), SessionError> {
        match self.state() {
            WorkflowState::StructureApproved | WorkflowState::ContentGenerated => {
                self.lessons.extend(lessons);
                self.state = WorkflowState::ContentGenerated;
                Ok(())
            }
            from => Err(SessionError::InvalidTransition {
                from,
                trigger: "record generated lessons",
            }),
        }
    }

    /// Attach a reference document for structure refinement.
    pub fn attach_reference(&mut self, path: PathBuf) {
        self.reference_doc = Some(path);
    }

    pub fn detach_reference(&mut self) {
        self.reference_doc = None;
    }

    /// Drop everything and return to `Empty`.
    pub fn reset(&mut self) {
        *self = Session::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Subject;

    fn structure(course: &str) -> CourseStructure {
        CourseStructure {
            course: course.to_string(),
            exam_format: None,
            subjects: vec![Subject {
                name: "Medicine".to_string(),
                topics: vec![],
            }],
        }
    }

    fn question() -> Question {
        Question {
            question: "Q".to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            correct_option: "A".to_string(),
            explanation: String::new(),
            blooms_level: 1,
            difficulty: 1,
            tags: vec![],
            image_url: None,
            image_description: None,
            image_type: None,
            image_source: None,
            image_search_terms: None,
            image_status: None,
        }
    }

    #[test]
    fn happy_path_walks_all_states() {
        let mut session = Session::new();
        assert_eq!(session.state(), WorkflowState::Empty);

        session.load_structure(structure("NEET PG"));
        assert_eq!(session.state(), WorkflowState::StructureLoaded);

        session.approve_structure().unwrap();
        assert_eq!(session.state(), WorkflowState::StructureApproved);

        session.record_questions(vec![question()]).unwrap();
        assert_eq!(session.state(), WorkflowState::ContentGenerated);
        assert_eq!(session.questions().len(), 1);
    }

    #[test]
    fn generation_before_approval_is_rejected() {
        let mut session = Session::new();
        session.load_structure(structure("NEET PG"));
        let err = session.record_questions(vec![question()]).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: WorkflowState::StructureLoaded,
                ..
            }
        ));
    }

    #[test]
    fn malformed_upload_leaves_session_untouched() {
        let mut session = Session::new();
        session.load_structure(structure("NEET PG"));
        session.approve_structure().unwrap();

        let err = session.load_structure_json("{not valid json").unwrap_err();
        assert!(matches!(err, SessionError::InvalidStructureJson(_)));
        assert_eq!(session.state(), WorkflowState::StructureApproved);
        assert_eq!(session.structure().unwrap().course, "NEET PG");
    }

    #[test]
    fn loading_a_new_course_invalidates_generated_content() {
        let mut session = Session::new();
        session.load_structure(structure("NEET PG"));
        session.approve_structure().unwrap();
        session.record_questions(vec![question()]).unwrap();

        session.load_structure(structure("USMLE"));
        assert_eq!(session.state(), WorkflowState::StructureLoaded);
        assert!(session.questions().is_empty());
        assert_eq!(session.structure().unwrap().course, "USMLE");
    }

    #[test]
    fn refinement_requires_reapproval() {
        let mut session = Session::new();
        session.load_structure(structure("NEET PG"));
        session.approve_structure().unwrap();

        session.apply_refinement(structure("NEET PG")).unwrap();
        assert_eq!(session.state(), WorkflowState::StructureLoaded);

        let err = session.record_questions(vec![question()]).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
    }

    #[test]
    fn refinement_of_an_empty_session_is_rejected() {
        let mut session = Session::new();
        let err = session.apply_refinement(structure("NEET PG")).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: WorkflowState::Empty,
                ..
            }
        ));
    }

    #[test]
    fn reset_returns_to_empty() {
        let mut session = Session::new();
        session.load_structure(structure("NEET PG"));
        session.attach_reference(PathBuf::from("notes.pdf"));
        session.reset();
        assert_eq!(session.state(), WorkflowState::Empty);
        assert!(session.structure().is_none());
        assert!(session.reference_doc().is_none());
    }
}
