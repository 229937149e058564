//! Exam-content assembly for AI-generated question banks and lessons.
//!
//!     This crate is the library behind the `qbank` tool. It owns everything that
//!     is not terminal I/O: the course data model, the question-distribution
//!     arithmetic, the lesson-dialect renderer, the export formats, the backend
//!     API client and the session workflow state machine.
//!
//! Architecture
//!
//!     Content flows one way. A course structure (generated by the backend or
//!     uploaded as JSON) plus a requested question count go through the
//!     distribution calculator to produce an integer plan per Bloom's level and
//!     difficulty band. The plan parameterizes a generation request; the
//!     response (questions or lesson text) is handed to the renderer and the
//!     export formats for display and download.
//!
//!     The file structure:
//!     .
//!     ├── error.rs            # Export error type
//!     ├── model               # Course / question / lesson entities
//!     ├── distribution.rs     # Count splitting and reconciliation
//!     ├── render              # Lesson dialect → block IR
//!     │   ├── ir.rs           # Block and inline node types
//!     │   ├── passes.rs       # Ordered segment-rewriting passes
//!     │   ├── inline.rs       # Inline markup parsing
//!     │   └── chapter_refs.rs # Cross-reference rewriting
//!     ├── formats             # Export format implementations
//!     │   ├── json
//!     │   ├── markdown
//!     │   └── html
//!     ├── export.rs           # Export documents, filenames, image inlining
//!     ├── api                 # Backend HTTP client (feature "api-client")
//!     ├── session.rs          # Workflow state machine
//!     └── registry.rs         # ExportFormat registry
//!
//! The renderer
//!
//!     The lesson dialect is Markdown-ish but not CommonMark: it carries labeled
//!     callout sections ("Mnemonic:", "Red Flags:", ...), mermaid diagram
//!     fences, and chapter cross-references. General-purpose Markdown parsers
//!     cannot represent those, so the renderer is an explicit ordered pipeline
//!     of passes over raw/done text segments (see render/passes.rs). Pass order
//!     is a contract: fences are lifted out first so no later pass can corrupt
//!     diagram sources, and callouts claim their span before tables, lists and
//!     headings carve up what is left. The renderer never fails; malformed
//!     input degrades to literal text.
//!
//! Library choices
//!
//!     Serialization is offloaded to specialized crates rather than written
//!     here: Markdown export builds a comrak AST and lets comrak print it, and
//!     HTML export builds an rcdom tree serialized by html5ever. The renderer
//!     produces the shared block IR both consume.

pub mod api;
pub mod distribution;
pub mod error;
pub mod export;
pub mod formats;
pub mod model;
pub mod registry;
pub mod render;
pub mod session;

pub use distribution::{DistributionSpec, Matrix};
pub use error::ExportError;
pub use export::{ExportDocument, ExportItem};
pub use formats::ExportFormat;
pub use registry::FormatRegistry;
pub use render::render_lesson;
pub use session::{Session, WorkflowState};

#[cfg(feature = "api-client")]
pub use api::ApiClient;
