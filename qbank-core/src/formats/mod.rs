//! Export format implementations.
//!
//! Each format turns an [`ExportDocument`] into text. Serialization is
//! offloaded to specialized crates: Markdown goes through comrak, HTML
//! through html5ever/rcdom; JSON is a serde pass-through.

pub mod html;
pub mod json;
pub mod markdown;

use crate::error::ExportError;
use crate::export::ExportDocument;

/// Trait for export formats
///
/// Implementors produce one serialized document per call; formats carry no
/// state of their own.
pub trait ExportFormat: Send + Sync {
    /// The name of this format (e.g., "json", "markdown", "html")
    fn name(&self) -> &str;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }

    /// File extension used for downloads, without the leading dot.
    fn file_extension(&self) -> &str;

    /// Serialize an export document into this format.
    fn serialize(&self, doc: &ExportDocument) -> Result<String, ExportError>;
}
