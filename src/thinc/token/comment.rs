//! Comments as satellite records
//!
//! Comments never enter the code token stream. Each one is bound to an anchor token and a
//! placement relative to it, and the emitter re-attaches it wherever that anchor lands in the
//! output.
//!
//! Placement rules
//!
//!     Leading     code follows the comment on the line where the comment ends;
//!                 anchored to that following token (`int /* c */ x;`)
//!     Trailing    code precedes the comment on the line where it starts;
//!                 anchored to that preceding token (`x = 1; // c`)
//!     Standalone  the comment is alone on its line(s); anchored to the next code
//!                 token in the file, or to the end of file
//!
//! The engine's own ambiguity markers look like comments but are recognised by
//! [`AmbiguityReason::from_marker`] and never stored as user comments.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

use super::source::TokenId;
use crate::thinc::ast::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Placement {
    Leading,
    Trailing,
    Standalone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Anchor {
    Token(TokenId),
    EndOfFile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    /// Verbatim comment text, delimiters included.
    pub text: String,
    pub range: Range,
    pub placement: Placement,
    pub anchor: Anchor,
    /// Leading whitespace of the comment's first physical line.
    pub indent: String,
    pub blank_before: bool,
}

impl Comment {
    pub fn is_line_comment(&self) -> bool {
        self.text.starts_with("//")
    }
}

/// Why a line's terminator could not be decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityReason {
    /// Multi-line aggregate initializer or other unbalanced bracket run
    Initializer,
    /// Bare macro invocation that may or may not expand to a full statement
    Macro,
    /// Structure interleaved with conditional compilation
    Preprocessor,
}

static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/\* thinc: ambiguous (initializer|macro|preprocessor) \*/$")
        .expect("marker pattern is valid")
});

impl AmbiguityReason {
    pub fn code(&self) -> &'static str {
        match self {
            AmbiguityReason::Initializer => "initializer",
            AmbiguityReason::Macro => "macro",
            AmbiguityReason::Preprocessor => "preprocessor",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            AmbiguityReason::Initializer => {
                "line continues an unbalanced initializer or bracket run; terminator left as written"
            }
            AmbiguityReason::Macro => {
                "bare macro invocation; cannot tell whether it needs a terminator without preprocessing"
            }
            AmbiguityReason::Preprocessor => {
                "structure is split by conditional compilation; passed through unchanged"
            }
        }
    }

    /// The inline comment written after an ambiguous line.
    pub fn marker(&self) -> String {
        format!("/* thinc: ambiguous {} */", self.code())
    }

    pub fn from_marker(text: &str) -> Option<Self> {
        let captures = MARKER.captures(text)?;
        match captures.get(1)?.as_str() {
            "initializer" => Some(AmbiguityReason::Initializer),
            "macro" => Some(AmbiguityReason::Macro),
            "preprocessor" => Some(AmbiguityReason::Preprocessor),
            _ => None,
        }
    }
}

impl fmt::Display for AmbiguityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
