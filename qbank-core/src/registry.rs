//! Export format registry for discovery and selection.

use crate::error::ExportError;
use crate::export::ExportDocument;
use crate::formats::ExportFormat;
use std::collections::HashMap;

/// Registry of export formats
///
/// Formats can be registered and retrieved by name.
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn ExportFormat>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format
    ///
    /// If a format with the same name already exists, it will be replaced.
    pub fn register<F: ExportFormat + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    /// Get a format by name
    pub fn get(&self, name: &str) -> Result<&dyn ExportFormat, ExportError> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| ExportError::FormatNotFound(name.to_string()))
    }

    /// Check if a format exists
    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Serialize a document using the named format
    pub fn serialize(&self, doc: &ExportDocument, format: &str) -> Result<String, ExportError> {
        self.get(format)?.serialize(doc)
    }

    /// Create a registry with the built-in formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(crate::formats::json::JsonFormat);
        registry.register(crate::formats::markdown::MarkdownFormat);
        registry.register(crate::formats::html::HtmlFormat);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_export_targets() {
        let registry = FormatRegistry::default();
        assert!(registry.has("json"));
        assert!(registry.has("markdown"));
        assert!(registry.has("html"));
        assert_eq!(registry.list_formats(), vec!["html", "json", "markdown"]);
    }

    #[test]
    fn unknown_format_is_an_error() {
        let registry = FormatRegistry::default();
        let err = registry.get("pdf").map(|_| ()).unwrap_err();
        match err {
            ExportError::FormatNotFound(name) => assert_eq!(name, "pdf"),
            other => panic!("expected FormatNotFound, got {other:?}"),
        }
    }

    #[test]
    fn extensions_match_download_names() {
        let registry = FormatRegistry::default();
        assert_eq!(registry.get("json").unwrap().file_extension(), "json");
        assert_eq!(registry.get("markdown").unwrap().file_extension(), "md");
        assert_eq!(registry.get("html").unwrap().file_extension(), "html");
    }
}
