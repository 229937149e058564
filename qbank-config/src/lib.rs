//! Shared configuration loader for the qbank toolchain.
//!
//! `defaults/qbank.default.toml` is embedded into every binary so that docs
//! and runtime behavior stay in sync. Applications layer user-specific files
//! on top of those defaults via [`Loader`] before deserializing into
//! [`QbankConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/qbank.default.toml");

/// Top-level configuration consumed by qbank applications.
#[derive(Debug, Clone, Deserialize)]
pub struct QbankConfig {
    pub api: ApiConfig,
    pub generate: GenerateConfig,
    pub render: RenderConfig,
    pub export: ExportConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Question-generation knobs mirroring the backend's accepted ranges.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateConfig {
    pub questions_per_topic: u32,
    pub min_questions: u32,
    pub max_questions: u32,
    pub include_images: bool,
}

impl GenerateConfig {
    /// Check a per-topic question count against the accepted range.
    pub fn count_in_range(&self, count: u32) -> bool {
        (self.min_questions..=self.max_questions).contains(&count)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Rewrite chapter mentions into navigable cross-references
    pub chapter_links: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Inline images as data URIs during Markdown export
    pub inline_images: bool,
    pub output_dir: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<QbankConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<QbankConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.api.base_url, "http://localhost:5000");
        assert_eq!(config.generate.questions_per_topic, 10);
        assert!(config.export.inline_images);
        assert!(config.render.chapter_links);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("api.base_url", "http://qbank.internal:8080")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.api.base_url, "http://qbank.internal:8080");
    }

    #[test]
    fn question_count_range_follows_backend_bounds() {
        let config = load_defaults().expect("defaults to deserialize");
        assert!(config.generate.count_in_range(5));
        assert!(config.generate.count_in_range(50));
        assert!(!config.generate.count_in_range(4));
        assert!(!config.generate.count_in_range(51));
    }
}
