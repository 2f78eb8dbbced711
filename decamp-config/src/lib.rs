//! Shared configuration loader for decamp.
//!
//! `defaults/decamp.default.toml` is embedded into the binary so that docs and
//! runtime behavior stay in sync. Callers layer repository or user files on top
//! of those defaults via [`Loader`] before deserializing into [`DecampConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/decamp.default.toml");

/// Top-level configuration consumed by the decamp binary.
#[derive(Debug, Clone, Deserialize)]
pub struct DecampConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Where chapters and slide decks live inside the input repository.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub chapter_pattern: String,
    pub slides_dir: String,
}

/// Subdirectory names under the output root.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub chapters_dir: String,
    pub exercises_dir: String,
    pub slides_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Layers `decamp.toml` files and command-line overrides over the embedded
/// defaults; later layers win key by key.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a config file passed with `--config`; it must exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Layer the `decamp.toml` of an input repository, if it has one.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let source = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Override one dotted key, e.g. `logging.level` from `--log`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Resolve every layer into a [`DecampConfig`].
    pub fn build(self) -> Result<DecampConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone.
pub fn load_defaults() -> Result<DecampConfig, ConfigError> {
    Loader::new().build()
}
