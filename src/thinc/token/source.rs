//! Code tokens as they leave the scanner
//!
//! A [`Token`] owns its lexeme and span and records just enough layout (spacing, line
//! breaks, blank lines) for the emitter to reproduce the author's line structure. Token
//! identity is a [`TokenId`]; comments and ambiguity markers are keyed by it.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::core::RawToken;
use crate::thinc::ast::Range;

/// One of the two surface syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    /// `{ ... }` blocks and `;` terminators
    Brace,
    /// `header:` blocks closed by dedent, no terminators
    Indentation,
}

impl Notation {
    pub fn opposite(self) -> Self {
        match self {
            Notation::Brace => Notation::Indentation,
            Notation::Indentation => Notation::Brace,
        }
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notation::Brace => write!(f, "brace"),
            Notation::Indentation => write!(f, "indentation"),
        }
    }
}

/// Width of one indentation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndentUnit {
    Tab,
    Spaces(usize),
}

impl IndentUnit {
    pub fn render(&self, depth: usize) -> String {
        match self {
            IndentUnit::Tab => "\t".repeat(depth),
            IndentUnit::Spaces(width) => " ".repeat(width * depth),
        }
    }

    /// Number of whole levels in a run of leading whitespace, tabs counting as one unit.
    pub fn levels_in(&self, whitespace: &str) -> usize {
        match self {
            IndentUnit::Tab => whitespace.chars().filter(|c| *c == '\t').count(),
            IndentUnit::Spaces(width) => {
                let columns: usize = whitespace
                    .chars()
                    .map(|c| if c == '\t' { *width } else { 1 })
                    .sum();
                columns / (*width).max(1)
            }
        }
    }
}

impl Default for IndentUnit {
    fn default() -> Self {
        IndentUnit::Spaces(4)
    }
}

impl fmt::Display for IndentUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndentUnit::Tab => write!(f, "tab"),
            IndentUnit::Spaces(width) => write!(f, "{} spaces", width),
        }
    }
}

/// Stable, totally ordered token identity.
///
/// Real tokens are numbered in source order with `synthetic == 0`. The indentation parser
/// mints closer ids after the last token of a block (`synthetic > 0`), so every id still
/// sorts at its position in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TokenId {
    pub index: u32,
    pub synthetic: u16,
}

impl TokenId {
    pub fn real(index: usize) -> Self {
        Self {
            index: index as u32,
            synthetic: 0,
        }
    }

    pub fn synthetic_after(last: TokenId, ordinal: u16) -> Self {
        Self {
            index: last.index,
            synthetic: ordinal,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Operator,
    Literal,
    Punctuation,
    Terminator,
    Directive,
    CommentMarker,
}

/// Sorted for binary search.
const KEYWORDS: &[&str] = &[
    "alignas", "alignof", "asm", "auto", "bool", "break", "case", "catch", "char", "class",
    "const", "consteval", "constexpr", "constinit", "continue", "decltype", "default",
    "delete", "do", "double", "else", "enum", "explicit", "export", "extern", "false", "float",
    "for", "friend", "goto", "if", "inline", "int", "long", "mutable", "namespace", "new",
    "noexcept", "nullptr", "operator", "private", "protected", "public", "register",
    "reinterpret_cast", "restrict", "return", "short", "signed", "sizeof", "static",
    "static_assert", "static_cast", "struct", "switch", "template", "this", "throw", "true",
    "try", "typedef", "typeid", "typename", "union", "unsigned", "using", "virtual", "void",
    "volatile", "while",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.binary_search(&word).is_ok()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub id: TokenId,
    pub raw: RawToken,
    pub kind: TokenKind,
    pub text: String,
    pub range: Range,
    /// Whitespace preceded the token on its physical line.
    pub space_before: bool,
    /// First code token on a new physical line.
    pub newline_before: bool,
    /// At least one blank line precedes the token's physical line.
    pub blank_before: bool,
}

impl Token {
    pub fn new(id: TokenId, raw: RawToken, text: impl Into<String>, range: Range) -> Self {
        let text = text.into();
        let kind = match raw {
            RawToken::Ident if is_keyword(&text) => TokenKind::Keyword,
            other => other.kind(),
        };
        Self {
            id,
            raw,
            kind,
            text,
            range,
            space_before: false,
            newline_before: false,
            blank_before: false,
        }
    }

    pub fn is(&self, raw: RawToken) -> bool {
        self.raw == raw
    }

    pub fn is_word(&self, word: &str) -> bool {
        self.raw == RawToken::Ident && self.text == word
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Matches operator tokens by lexeme, e.g. `=` or `?`.
    pub fn is_op(&self, op: &str) -> bool {
        self.raw == RawToken::Operator && self.text == op
    }
}
