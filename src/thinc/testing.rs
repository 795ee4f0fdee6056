//! Testing utilities
//!
//!     Helpers shared by the unit tests and the integration suites in `tests/`.
//!
//!     Conversion output is compared at three levels, from strictest to loosest:
//!
//!         1. Exact text. Use for fixed scenarios where the layout is part of the contract.
//!         2. Lexemes. [code_lexemes] and [comment_texts] ignore layout and the delimiters
//!            that change between notations, so they hold up for generated programs.
//!         3. Structure. [parse_tree](crate::thinc::convert::parse_tree) plus
//!            [StructureEq](crate::thinc::parsing::ir::StructureEq) compares the block trees.
//!
//!     All helpers return the conversion's diagnostics on failure so a test can print them.

use crate::thinc::ast::DiagnosticList;
use crate::thinc::convert::{convert, ConvertOptions};
use crate::thinc::lexing::scan;
use crate::thinc::token::RawToken;

/// Code-token lexemes of `source`, without `;` terminators and `{`/`}` delimiters.
pub fn code_lexemes(source: &str) -> Result<Vec<String>, DiagnosticList> {
    let scanned = scan(source, None)?;
    Ok(scanned
        .tokens
        .into_iter()
        .filter(|token| {
            !matches!(
                token.raw,
                RawToken::Semicolon | RawToken::OpenBrace | RawToken::CloseBrace
            )
        })
        .map(|token| token.text)
        .collect())
}

/// User comment texts of `source`, in source order.
pub fn comment_texts(source: &str) -> Result<Vec<String>, DiagnosticList> {
    let scanned = scan(source, None)?;
    Ok(scanned
        .comments
        .into_iter()
        .map(|comment| comment.text)
        .collect())
}

/// Convert `source` to the other notation and back again.
///
/// The return leg is told its source notation rather than detecting it, since a short
/// output can look like either notation.
pub fn round_trip(source: &str) -> Result<String, DiagnosticList> {
    let there = convert(source, &ConvertOptions::default())?;
    let back = convert(
        &there.output,
        &ConvertOptions {
            source: Some(there.target),
            target: Some(there.source),
            ..ConvertOptions::default()
        },
    )?;
    Ok(back.output)
}
