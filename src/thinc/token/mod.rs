//! Core token types shared across the scanner, parser, and emitter.

pub mod comment;
pub mod core;
pub mod source;

pub use comment::{AmbiguityReason, Anchor, Comment, Placement};
pub use self::core::RawToken;
pub use source::{IndentUnit, Notation, Token, TokenId, TokenKind};
