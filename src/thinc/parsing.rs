//! Structural parsing
//!
//!     Builds the Intermediate Block Tree from a scan. There is one parser per notation,
//!     both producing the same tree for equivalent programs:
//!
//!         braces       a `{`/`}` frame stack over the token stream. See [braces].
//!         indentation  a level stack over logical lines. See [indentation].
//!
//!     Neither parser interprets headers beyond what it needs to find block boundaries;
//!     construct kinds are assigned afterwards by [crate::thinc::classify].

pub mod braces;
pub mod indentation;
pub mod ir;
pub mod sections;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::thinc::ast::Diagnostic;
use crate::thinc::lexing::Scan;
use crate::thinc::token::{Notation, RawToken, Token};

pub use ir::{Block, BlockKind, Line, LineKind, Node, StructureEq, Tree};

static MACRO_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_*[A-Z][A-Z0-9_]+$").expect("macro name pattern is valid"));

/// A bare ALL_CAPS name, optionally followed by one balanced argument list.
pub fn looks_like_macro(tokens: &[Token]) -> bool {
    let Some((name, rest)) = tokens.split_first() else {
        return false;
    };
    if !name.is(RawToken::Ident) || !MACRO_NAME.is_match(&name.text) {
        return false;
    }
    match rest {
        [] => true,
        [open, .., close] if open.is(RawToken::OpenParen) && close.is(RawToken::CloseParen) => {
            let mut depth = 0usize;
            for (index, token) in rest.iter().enumerate() {
                match token.raw {
                    RawToken::OpenParen => depth += 1,
                    RawToken::CloseParen => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 && index + 1 != rest.len() {
                            return false;
                        }
                    }
                    _ => {}
                }
            }
            depth == 0
        }
        _ => false,
    }
}

/// `else` in `#  else // x`.
pub(crate) fn directive_name(text: &str) -> &str {
    let body = text.trim_start_matches('#').trim_start();
    let end = body
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(body.len());
    &body[..end]
}

/// `#else` and the `#elif` family.
pub(crate) fn is_alternative_branch(directive: &Token) -> bool {
    directive.is(RawToken::Directive)
        && matches!(
            directive_name(&directive.text),
            "elif" | "else" | "elifdef" | "elifndef"
        )
}

pub fn parse(scan: &Scan, flag_macro_lines: bool) -> Result<Tree, Diagnostic> {
    let tree = match scan.notation {
        Notation::Brace => braces::parse_braces(scan, flag_macro_lines)?,
        Notation::Indentation => indentation::parse_indentation(scan)?,
    };
    tracing::debug!(
        stage = "parse",
        notation = %scan.notation,
        blocks = tree.block_count(),
        top_level = tree.root.children.len(),
        "built block tree"
    );
    Ok(tree)
}
