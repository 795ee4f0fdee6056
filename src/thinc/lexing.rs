//! Scanner
//!
//!     Turns source text into the annotated token stream the structural parsers consume.
//!
//! The Scanning Pipeline
//!
//!         1. Core tokenization using the logos lexer. See [base_tokenization].
//!            Layout and comments are still in the stream at this point.
//!
//!         2. Line grouping. See [line_grouping].
//!            Comments leave the stream for a side table keyed by anchor token, code tokens
//!            pick up their layout flags, and tokens are grouped into logical lines.
//!
//!         3. Notation detection. See [notation]. Skipped when the caller forces a notation.
//!
//!         4. Indentation measurement. See [indentation]. Only for indentation notation:
//!            brace files are free-form and their leading whitespace carries no structure.
//!
//!     Nothing downstream ever looks at the source text again; every token owns its lexeme
//!     and range.

pub mod base_tokenization;
pub mod indentation;
pub mod line_grouping;
pub mod notation;

use std::collections::HashMap;

use crate::thinc::ast::{DiagnosticList, SourceLocation};
use crate::thinc::token::{AmbiguityReason, Comment, IndentUnit, Notation, Token, TokenId};

pub use base_tokenization::tokenize;
pub use indentation::IndentationMeasure;
pub use line_grouping::{group_into_lines, SourceLine};

/// Scanner output for one file.
#[derive(Debug, Clone)]
pub struct Scan {
    pub notation: Notation,
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
    /// Engine ambiguity markers found in the input, keyed by the token they annotate.
    pub markers: HashMap<TokenId, AmbiguityReason>,
    pub lines: Vec<SourceLine>,
    /// Indent unit established by an indentation-notation file.
    pub unit: Option<IndentUnit>,
    pub location: SourceLocation,
}

impl Scan {
    pub fn line_tokens(&self, line: &SourceLine) -> &[Token] {
        &self.tokens[line.tokens.clone()]
    }
}

pub fn scan(source: &str, forced: Option<Notation>) -> Result<Scan, DiagnosticList> {
    let location = SourceLocation::new(source);
    let raw = tokenize(source, &location)?;
    let grouped = group_into_lines(source, &raw, &location);

    let notation =
        forced.unwrap_or_else(|| notation::detect_notation(&grouped.tokens, &grouped.lines));

    let mut lines = grouped.lines;
    let unit = match notation {
        Notation::Indentation => IndentationMeasure::new().measure(&mut lines)?,
        Notation::Brace => None,
    };

    tracing::debug!(
        stage = "scan",
        %notation,
        tokens = grouped.tokens.len(),
        comments = grouped.comments.len(),
        lines = lines.len(),
        markers = grouped.markers.len(),
        "scanned source"
    );

    Ok(Scan {
        notation,
        tokens: grouped.tokens,
        comments: grouped.comments,
        markers: grouped.markers,
        lines,
        unit,
        location,
    })
}
