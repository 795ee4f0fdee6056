//! Transform pipeline infrastructure
//!
//! A composable, type-safe transformation system. Each conversion stage is a small
//! [`Runnable`]; a [`Transform`] chains stages whose types line up, and the compiler rejects
//! a chain where they don't:
//!
//! ```rust,ignore
//! let pipeline = Transform::from_fn(Ok)
//!     .then(Scanning::new())   // Stage<String> -> Stage<Scan>
//!     .then(Parsing::new());   // Stage<Scan>   -> Stage<Tree>
//! ```
//!
//! Common pipelines are prebuilt as lazy statics in [`standard`].
//!
//! # The Stage value
//!
//! Stages pass an owned [`Stage`] along: the value being transformed, the options of the
//! conversion, and the warnings gathered so far. Nothing is shared between stages, so a
//! stage owns everything it touches.
//!
//! # Failure
//!
//! A stage that hits a fatal diagnostic returns [`TransformError::StageFailed`] carrying the
//! earlier warnings followed by the fatal diagnostics, so no diagnostic is lost when a
//! conversion aborts.
//!
//! # Module Organization
//!
//! - [`stages`]: the individual conversion stages
//! - [`standard`]: prebuilt transform combinations

pub mod stages;
pub mod standard;

use crate::thinc::ast::{Diagnostic, DiagnosticKind, DiagnosticList, Range, Severity};
use crate::thinc::convert::ConvertOptions;

/// Error that can occur during transformation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    /// Generic error with message
    #[error("{0}")]
    Error(String),
    /// Stage failed; diagnostics are in report order
    #[error("stage '{stage}' failed: {diagnostics}")]
    StageFailed {
        stage: String,
        diagnostics: DiagnosticList,
    },
}

impl TransformError {
    /// The diagnostics a caller should see for this failure.
    pub fn into_diagnostics(self) -> DiagnosticList {
        match self {
            TransformError::StageFailed { diagnostics, .. } => diagnostics,
            TransformError::Error(message) => DiagnosticList::from(Diagnostic::new(
                Severity::Error,
                DiagnosticKind::ParseError,
                Range::default(),
                message,
            )),
        }
    }
}

impl From<String> for TransformError {
    fn from(s: String) -> Self {
        TransformError::Error(s)
    }
}

impl From<&str> for TransformError {
    fn from(s: &str) -> Self {
        TransformError::Error(s.to_string())
    }
}

/// The value handed from one stage to the next.
#[derive(Debug, Clone)]
pub struct Stage<T> {
    pub value: T,
    pub options: ConvertOptions,
    /// Warnings gathered by the stages run so far.
    pub warnings: DiagnosticList,
}

impl<T> Stage<T> {
    pub fn new(value: T, options: ConvertOptions) -> Self {
        Self {
            value,
            options,
            warnings: DiagnosticList::new(),
        }
    }

    /// Replace the value, keeping options and warnings.
    pub fn carry<U>(self, value: U) -> Stage<U> {
        Stage {
            value,
            options: self.options,
            warnings: self.warnings,
        }
    }

    /// Take the value out, leaving options and warnings behind.
    pub fn split(self) -> (T, Stage<()>) {
        let Stage {
            value,
            options,
            warnings,
        } = self;
        (
            value,
            Stage {
                value: (),
                options,
                warnings,
            },
        )
    }

    /// Abort at `stage`, reporting the gathered warnings before `fatal`.
    pub fn fail(self, stage: &str, fatal: impl Into<DiagnosticList>) -> TransformError {
        let mut diagnostics = self.warnings;
        diagnostics.extend(fatal.into());
        TransformError::StageFailed {
            stage: stage.to_string(),
            diagnostics,
        }
    }
}

/// Trait for anything that can transform an input to an output
///
/// This is implemented by individual transformation stages.
/// The `Transform` struct composes multiple `Runnable` implementations.
pub trait Runnable<I, O> {
    /// Execute this transformation on the input
    fn run(&self, input: I) -> Result<O, TransformError>;
}

/// A composable transformation pipeline from `I` to `O`
pub struct Transform<I, O> {
    run_fn: Box<dyn Fn(I) -> Result<O, TransformError> + Send + Sync>,
}

impl<I, O> Transform<I, O> {
    /// Create a transform from a function
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> Result<O, TransformError> + Send + Sync + 'static,
    {
        Transform {
            run_fn: Box::new(f),
        }
    }

    /// Chain a stage after this transform, extending its output type
    pub fn then<O2, S>(self, stage: S) -> Transform<I, O2>
    where
        S: Runnable<O, O2> + Send + Sync + 'static,
        I: 'static,
        O: 'static,
        O2: 'static,
    {
        let prev_run = self.run_fn;
        Transform {
            run_fn: Box::new(move |input| {
                let intermediate = prev_run(input)?;
                stage.run(intermediate)
            }),
        }
    }

    /// Chain a prebuilt transform after this one
    ///
    /// The referenced transform must be static (typically one of the [`standard`] pipelines).
    pub fn then_transform<O2>(self, next: &'static Transform<O, O2>) -> Transform<I, O2>
    where
        I: 'static,
        O: 'static,
        O2: 'static,
    {
        let prev_run = self.run_fn;
        Transform {
            run_fn: Box::new(move |input| {
                let intermediate = prev_run(input)?;
                next.run(intermediate)
            }),
        }
    }

    /// Execute this transform on the given input
    pub fn run(&self, input: I) -> Result<O, TransformError> {
        (self.run_fn)(input)
    }
}

// Transforms can be used as stages of larger transforms
impl<I, O> Runnable<I, O> for Transform<I, O>
where
    I: 'static,
    O: 'static,
{
    fn run(&self, input: I) -> Result<O, TransformError> {
        Transform::run(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DoubleNumber;
    impl Runnable<i32, i32> for DoubleNumber {
        fn run(&self, input: i32) -> Result<i32, TransformError> {
            Ok(input * 2)
        }
    }

    struct AddTen;
    impl Runnable<i32, i32> for AddTen {
        fn run(&self, input: i32) -> Result<i32, TransformError> {
            Ok(input + 10)
        }
    }

    struct IntToString;
    impl Runnable<i32, String> for IntToString {
        fn run(&self, input: i32) -> Result<String, TransformError> {
            Ok(input.to_string())
        }
    }

    struct FailingStage;
    impl Runnable<i32, i32> for FailingStage {
        fn run(&self, _input: i32) -> Result<i32, TransformError> {
            Err(TransformError::Error("intentional failure".to_string()))
        }
    }

    #[test]
    fn test_transform_from_fn() {
        let transform = Transform::from_fn(|x: i32| Ok(x * 2));
        assert_eq!(transform.run(5).unwrap(), 10);
    }

    #[test]
    fn test_multiple_same_type_stages() {
        let transform = Transform::from_fn(|x: i32| Ok(x))
            .then(DoubleNumber)
            .then(AddTen)
            .then(DoubleNumber);

        // (5 * 2) + 10 = 20, then 20 * 2 = 40
        assert_eq!(transform.run(5).unwrap(), 40);
    }

    #[test]
    fn test_type_changing_stage() {
        let transform = Transform::from_fn(|x: i32| Ok(x))
            .then(DoubleNumber)
            .then(IntToString);
        assert_eq!(transform.run(5).unwrap(), "10");
    }

    #[test]
    fn test_error_propagation() {
        let transform = Transform::from_fn(|x: i32| Ok(x))
            .then(DoubleNumber)
            .then(FailingStage)
            .then(AddTen);
        assert_eq!(
            transform.run(5).unwrap_err(),
            TransformError::Error("intentional failure".to_string())
        );
    }

    #[test]
    fn test_stage_failure_keeps_earlier_warnings() {
        let mut stage = Stage::new((), ConvertOptions::default());
        stage
            .warnings
            .push(Diagnostic::alias_conflict(Range::default(), "first"));
        let error = stage.fail("parse", Diagnostic::parse(Range::default(), "second"));

        assert!(matches!(&error, TransformError::StageFailed { stage, .. } if stage == "parse"));
        let messages: Vec<String> = error
            .into_diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_error_display() {
        let err = TransformError::Error("test error".to_string());
        assert_eq!(format!("{}", err), "test error");

        let stage_err = TransformError::StageFailed {
            stage: "scan".to_string(),
            diagnostics: DiagnosticList::from(Diagnostic::lex(Range::default(), "bad indent")),
        };
        assert_eq!(
            format!("{}", stage_err),
            "stage 'scan' failed: error [LexError]: bad indent at 1:1"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err1: TransformError = "string error".into();
        assert_eq!(err1, TransformError::Error("string error".to_string()));

        let err2: TransformError = "owned string".to_string().into();
        assert_eq!(err2, TransformError::Error("owned string".to_string()));
    }
}
