//! Source positions and diagnostics shared by every stage

pub mod diagnostics;
pub mod range;

pub use diagnostics::{
    format_source_context, Diagnostic, DiagnosticKind, DiagnosticList, Severity,
};
pub use range::{Position, Range, SourceLocation};
