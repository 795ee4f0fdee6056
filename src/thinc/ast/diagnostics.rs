//! Diagnostic records produced by the conversion stages
//!
//! Every stage reports problems as [`Diagnostic`] values rather than bailing out with a bare
//! string, so that a caller always receives the complete, ordered story of a conversion.
//!
//! ## Taxonomy
//!
//!     LexError          Invalid or inconsistent indentation, unterminated comment or literal.
//!                       Fatal for the file.
//!     ParseError        Unmatched delimiter, missing block after a header colon, unexpected
//!                       indentation. Fatal for the file.
//!     AmbiguityWarning  A line whose terminator cannot be decided without preprocessing or
//!                       guessing. Recoverable, unless the conversion runs in strict mode.
//!     AliasConflict     A malformed or colliding alias list on an aggregate header.
//!                       Recoverable.
//!
//! Fatal diagnostics abort the stage that raised them; warnings accumulate and travel with the
//! output. No diagnostic is ever dropped on the way to the caller.

use super::range::Range;
use serde::Serialize;
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    LexError,
    ParseError,
    AmbiguityWarning,
    AliasConflict,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::LexError => "LexError",
            DiagnosticKind::ParseError => "ParseError",
            DiagnosticKind::AmbiguityWarning => "AmbiguityWarning",
            DiagnosticKind::AliasConflict => "AliasConflict",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub range: Range,
    pub message: String,
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        range: Range,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            range,
            message: message.into(),
            code: None,
        }
    }

    pub fn lex(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, DiagnosticKind::LexError, range, message)
    }

    pub fn parse(range: Range, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, DiagnosticKind::ParseError, range, message)
    }

    pub fn ambiguity(range: Range, message: impl Into<String>) -> Self {
        Self::new(
            Severity::Warning,
            DiagnosticKind::AmbiguityWarning,
            range,
            message,
        )
    }

    pub fn alias_conflict(range: Range, message: impl Into<String>) -> Self {
        Self::new(
            Severity::Warning,
            DiagnosticKind::AliasConflict,
            range,
            message,
        )
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Raise a warning to error severity (strict mode).
    pub fn promoted(mut self) -> Self {
        self.severity = Severity::Error;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: {} at {}",
            self.severity, self.kind, self.message, self.range.start
        )
    }
}

/// Ordered list of diagnostics, also the error type of a failed conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, thiserror::Error)]
#[error("{}", summarize(.0))]
pub struct DiagnosticList(Vec<Diagnostic>);

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl DiagnosticList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: DiagnosticList) {
        self.0.extend(other.0);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| !d.is_error())
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.kind == kind)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }

    /// Promote every ambiguity warning to an error (strict mode).
    pub fn promote_ambiguities(self) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|d| {
                    if d.kind == DiagnosticKind::AmbiguityWarning {
                        d.promoted()
                    } else {
                        d
                    }
                })
                .collect(),
        )
    }

    /// Human-readable report with a source excerpt under each diagnostic.
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();
        for diagnostic in &self.0 {
            out.push_str(&diagnostic.to_string());
            out.push('\n');
            out.push_str(&format_source_context(source, &diagnostic.range));
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }
}

impl From<Diagnostic> for DiagnosticList {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl From<Vec<Diagnostic>> for DiagnosticList {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self(diagnostics)
    }
}

impl IntoIterator for DiagnosticList {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiagnosticList {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Format source code context around a range (two lines either side, `>>` on the culprit)
pub fn format_source_context(source: &str, range: &Range) -> String {
    let lines: Vec<&str> = source.lines().collect();
    let error_line = range.start.line;

    let start_line = error_line.saturating_sub(2);
    let end_line = (error_line + 3).min(lines.len());

    let mut context = String::new();
    for (line_num, line) in lines.iter().enumerate().take(end_line).skip(start_line) {
        let marker = if line_num == error_line { ">>" } else { "  " };
        context.push_str(&format!("{} {:3} | {}\n", marker, line_num + 1, line));
    }
    context
}
