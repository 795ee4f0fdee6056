//! Configuration loader for thinc conversions.
//!
//! `defaults/thinc.default.toml` is embedded into the crate so that the documented defaults
//! and the runtime behavior stay in sync. Callers layer project files on top of those
//! defaults via [`Loader`] before deserializing into [`ThincConfig`], then hand the resulting
//! [`ConvertOptions`] to every conversion explicitly. Nothing here is read implicitly.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

use crate::thinc::convert::ConvertOptions;
use crate::thinc::token::{IndentUnit, Notation};

const DEFAULT_TOML: &str = include_str!("../../defaults/thinc.default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ThincConfig {
    pub indent: IndentConfig,
    pub conversion: ConversionConfig,
}

/// Output indentation unit.
#[derive(Debug, Clone, Deserialize)]
pub struct IndentConfig {
    pub style: IndentStyle,
    pub width: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndentStyle {
    Spaces,
    Tab,
}

/// Mirrors the knobs of [`ConvertOptions`].
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    /// Forced input notation; detected when absent.
    #[serde(default)]
    pub source: Option<Notation>,
    /// Output notation; the opposite of the input when absent.
    #[serde(default)]
    pub target: Option<Notation>,
    pub strict: bool,
    pub cuddle_else: bool,
    pub annotate_ambiguity: bool,
    pub flag_macro_lines: bool,
}

impl IndentConfig {
    pub fn unit(&self) -> IndentUnit {
        match self.style {
            IndentStyle::Tab => IndentUnit::Tab,
            IndentStyle::Spaces => IndentUnit::Spaces(self.width),
        }
    }
}

impl ThincConfig {
    pub fn options(&self) -> ConvertOptions {
        ConvertOptions {
            source: self.conversion.source,
            target: self.conversion.target,
            strict: self.conversion.strict,
            indent: self.indent.unit(),
            cuddle_else: self.conversion.cuddle_else,
            annotate_ambiguity: self.conversion.annotate_ambiguity,
            flag_macro_lines: self.conversion.flag_macro_lines,
        }
    }
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

    /// Apply a single key/value override.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<ThincConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<ThincConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_convert_options() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.indent.style, IndentStyle::Spaces);
        assert_eq!(config.options(), ConvertOptions::default());
    }

    #[test]
    fn test_overrides() {
        let config = Loader::new()
            .set_override("indent.style", "tab")
            .expect("override to apply")
            .set_override("conversion.strict", true)
            .expect("override to apply")
            .set_override("conversion.target", "brace")
            .expect("override to apply")
            .build()
            .expect("config to build");
        let options = config.options();
        assert_eq!(options.indent, IndentUnit::Tab);
        assert!(options.strict);
        assert_eq!(options.target, Some(Notation::Brace));
        assert_eq!(options.source, None);
    }

    #[test]
    fn test_missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("does/not/exist/thinc.toml")
            .build()
            .expect("config to build");
        assert!(config.conversion.cuddle_else);
    }

    #[test]
    fn test_missing_required_file_fails() {
        assert!(Loader::new()
            .with_file("does/not/exist/thinc.toml")
            .build()
            .is_err());
    }
}
