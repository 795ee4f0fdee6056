//! Conversion entry points
//!
//!     convert          one source with explicit options
//!     to_brace         shortcut with the target forced to brace notation
//!     to_indentation   shortcut with the target forced to indentation notation
//!     convert_many     independent sources in parallel on the rayon pool
//!     Converter        reusable options plus a cancellation flag checked between stages
//!
//! A conversion either returns complete output together with its warnings, or fails with
//! every diagnostic gathered up to the failure. Options are always passed in; nothing is read
//! from the environment or from configuration files (see [config](crate::thinc::config)).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::thinc::ast::DiagnosticList;
use crate::thinc::formats::EmitOptions;
use crate::thinc::lexing::Scan;
use crate::thinc::parsing::ir::Tree;
use crate::thinc::token::{IndentUnit, Notation};
use crate::thinc::transforms::stages::{
    Classifying, Emitting, Parsing, ResolvingAliases, Scanning, Terminating,
};
use crate::thinc::transforms::standard::{CONVERSION, SCANNING, TO_TREE};
use crate::thinc::transforms::{Runnable, Stage, TransformError};

/// Options for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Forced input notation; detected when `None`.
    pub source: Option<Notation>,
    /// Output notation; the opposite of the input when `None`.
    pub target: Option<Notation>,
    /// Fail on any ambiguity instead of passing it through.
    pub strict: bool,
    pub indent: IndentUnit,
    pub cuddle_else: bool,
    pub annotate_ambiguity: bool,
    pub flag_macro_lines: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            source: None,
            target: None,
            strict: false,
            indent: IndentUnit::default(),
            cuddle_else: true,
            annotate_ambiguity: true,
            flag_macro_lines: true,
        }
    }
}

impl ConvertOptions {
    pub fn target_for(&self, source: Notation) -> Notation {
        self.target.unwrap_or_else(|| source.opposite())
    }

    pub fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            indent: self.indent,
            cuddle_else: self.cuddle_else,
            annotate_ambiguity: self.annotate_ambiguity,
        }
    }
}

/// A successful conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub output: String,
    pub source: Notation,
    pub target: Notation,
    /// Warnings collected along the way.
    pub diagnostics: DiagnosticList,
}

pub fn convert(source: &str, options: &ConvertOptions) -> Result<Conversion, DiagnosticList> {
    let span = tracing::info_span!("convert", source = ?options.source, target = ?options.target);
    let _entered = span.enter();
    let conversion = CONVERSION
        .run(Stage::new(source.to_string(), options.clone()))
        .map_err(TransformError::into_diagnostics)?;
    tracing::info!(
        source = %conversion.source,
        target = %conversion.target,
        warnings = conversion.diagnostics.len(),
        "converted"
    );
    Ok(conversion)
}

pub fn to_brace(source: &str) -> Result<Conversion, DiagnosticList> {
    convert(
        source,
        &ConvertOptions {
            target: Some(Notation::Brace),
            ..ConvertOptions::default()
        },
    )
}

pub fn to_indentation(source: &str) -> Result<Conversion, DiagnosticList> {
    convert(
        source,
        &ConvertOptions {
            target: Some(Notation::Indentation),
            ..ConvertOptions::default()
        },
    )
}

/// Convert independent sources in parallel. Results keep the order of `sources`.
pub fn convert_many(
    sources: &[&str],
    options: &ConvertOptions,
) -> Vec<Result<Conversion, DiagnosticList>> {
    sources
        .par_iter()
        .map(|source| convert(source, options))
        .collect()
}

pub fn detect_notation(source: &str) -> Result<Notation, DiagnosticList> {
    scan_only(source).map(|stage| stage.value.notation)
}

/// Number of user comments in `source`. Engine ambiguity markers are not counted.
pub fn count_comments(source: &str) -> Result<usize, DiagnosticList> {
    scan_only(source).map(|stage| stage.value.comments.len())
}

/// Run the stages up to alias resolution and return the block tree.
pub fn parse_tree(source: &str, notation: Option<Notation>) -> Result<Tree, DiagnosticList> {
    let options = ConvertOptions {
        source: notation,
        ..ConvertOptions::default()
    };
    TO_TREE
        .run(Stage::new(source.to_string(), options))
        .map(|stage| stage.value)
        .map_err(TransformError::into_diagnostics)
}

fn scan_only(source: &str) -> Result<Stage<Scan>, DiagnosticList> {
    SCANNING
        .run(Stage::new(source.to_string(), ConvertOptions::default()))
        .map_err(TransformError::into_diagnostics)
}

/// Shared flag for aborting a running conversion between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    #[error("{0}")]
    Rejected(DiagnosticList),
    /// `after` names the last completed stage (`start` when none ran).
    #[error("conversion cancelled after {after}")]
    Cancelled { after: &'static str },
}

impl From<TransformError> for ConvertError {
    fn from(error: TransformError) -> Self {
        ConvertError::Rejected(error.into_diagnostics())
    }
}

/// Reusable conversion settings with an optional cancellation flag.
///
/// The flag is checked before the first stage and after each one; a stage that has started
/// always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
    cancel: Option<CancelFlag>,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            cancel: None,
        }
    }

    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn run(&self, source: &str) -> Result<Conversion, ConvertError> {
        let span = tracing::info_span!(
            "convert",
            source = ?self.options.source,
            target = ?self.options.target
        );
        let _entered = span.enter();

        self.checkpoint("start")?;
        let scanned = Scanning::new().run(Stage::new(source.to_string(), self.options.clone()))?;
        self.checkpoint("scan")?;
        let parsed = Parsing::new().run(scanned)?;
        self.checkpoint("parse")?;
        let classified = Classifying::new().run(parsed)?;
        self.checkpoint("classify")?;
        let resolved = ResolvingAliases::new().run(classified)?;
        self.checkpoint("aliases")?;
        let terminated = Terminating::new().run(resolved)?;
        self.checkpoint("terminate")?;
        Ok(Emitting::new().run(terminated)?)
    }

    fn checkpoint(&self, after: &'static str) -> Result<(), ConvertError> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => {
                tracing::info!(after, "conversion cancelled");
                Err(ConvertError::Cancelled { after })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thinc::ast::{DiagnosticKind, Severity};

    const MACRO_CLASS: &str = "class W:\n    Q_OBJECT\n    int x\n";

    #[test]
    fn test_convert_detects_and_flips_notation() {
        let conversion = convert("int main():\n    return 0\n", &ConvertOptions::default()).unwrap();
        assert_eq!(conversion.source, Notation::Indentation);
        assert_eq!(conversion.target, Notation::Brace);
        assert_eq!(conversion.output, "int main() {\n    return 0;\n}\n");
    }

    #[test]
    fn test_forced_target_normalizes_layout() {
        let conversion = to_brace("int main() {\n  return 0;\n}\n").unwrap();
        assert_eq!(conversion.source, Notation::Brace);
        assert_eq!(conversion.output, "int main() {\n    return 0;\n}\n");
    }

    #[test]
    fn test_indent_unit_option() {
        let options = ConvertOptions {
            indent: IndentUnit::Tab,
            ..ConvertOptions::default()
        };
        let conversion = convert("int main() {\n    return 0;\n}\n", &options).unwrap();
        assert_eq!(conversion.output, "int main():\n\treturn 0\n");
    }

    #[test]
    fn test_strict_mode_rejects_ambiguity() {
        let options = ConvertOptions {
            strict: true,
            ..ConvertOptions::default()
        };
        let diagnostics = convert(MACRO_CLASS, &options).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::AmbiguityWarning);
        assert_eq!(diagnostic.severity, Severity::Error);
    }

    #[test]
    fn test_warnings_precede_fatal_errors() {
        let options = ConvertOptions {
            strict: true,
            ..ConvertOptions::default()
        };
        let source = "struct s, s:\n    int i\nstruct t:\n    FOO\n";
        let kinds: Vec<DiagnosticKind> = convert(source, &options)
            .unwrap_err()
            .iter()
            .map(|d| d.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::AliasConflict, DiagnosticKind::AmbiguityWarning]
        );
    }

    #[test]
    fn test_lex_errors_are_fatal() {
        let diagnostics = to_indentation("int f() {\n    /* open\n}\n").unwrap_err();
        assert_eq!(
            diagnostics.iter().next().unwrap().code.as_deref(),
            Some("unterminated-comment")
        );
    }

    #[test]
    fn test_detect_and_count() {
        assert_eq!(detect_notation("int x;\n").unwrap(), Notation::Brace);
        assert_eq!(
            detect_notation("int main():\n    return 0\n").unwrap(),
            Notation::Indentation
        );
        assert_eq!(
            count_comments("// a\nint x; /* b */\nFOO() /* thinc: ambiguous macro */\n").unwrap(),
            2
        );
    }

    #[test]
    fn test_convert_many_keeps_order() {
        let sources = ["int a;\n", "int f() {\n", "int main():\n    return 0\n"];
        let results = convert_many(&sources, &ConvertOptions::default());
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().output, "int a\n");
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().target, Notation::Brace);
    }

    #[test]
    fn test_converter_matches_convert() {
        let converter = Converter::new(ConvertOptions::default());
        assert_eq!(
            converter.run(MACRO_CLASS).unwrap(),
            convert(MACRO_CLASS, &ConvertOptions::default()).unwrap()
        );
    }

    #[test]
    fn test_cancelled_converter_stops_before_scanning() {
        let flag = CancelFlag::new();
        let converter = Converter::new(ConvertOptions::default()).with_cancel_flag(flag.clone());
        flag.cancel();
        assert_eq!(
            converter.run("int x;\n"),
            Err(ConvertError::Cancelled { after: "start" })
        );
    }
}
