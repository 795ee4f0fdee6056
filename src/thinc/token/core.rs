//! Raw token definitions for C/C++ source in either notation
//!
//! The tokens are defined using the logos derive macro. Both notations share one token set:
//! the notations differ only in which delimiters they use, never in how expressions are
//! spelled. Layout tokens (whitespace, newlines, continuations) and comments are produced
//! here too; the scanner strips them out of the code stream afterwards.

use logos::{Lexer, Logos};
use serde::Serialize;

use super::source::TokenKind;

/// All raw tokens the scanner recognises
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RawToken {
    // Layout
    #[regex(r"[ \t\x0C]+")]
    Whitespace,
    #[regex(r"\r?\n")]
    Newline,
    #[regex(r"\\\r?\n")]
    Continuation,

    // Comments
    #[regex(r"//[^\n]*")]
    LineComment,
    #[token("/*", block_comment)]
    BlockComment,

    // Preprocessor line, continued lines included, kept verbatim
    #[regex(r"#([^\n\\]|\\[^\r\n]|\\\r?\n)*")]
    Directive,

    // Literals
    #[regex(r#""([^"\\\n]|\\[^\n]|\\\n)*""#)]
    StringLiteral,
    #[regex(r"'([^'\\\n]|\\[^\n])*'")]
    CharLiteral,
    #[regex(r"[0-9]([0-9A-Za-z_.']|[eEpP][+-])*")]
    Number,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*")]
    Ident,

    // Structural punctuation
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("::")]
    Scope,
    #[token(",")]
    Comma,

    #[regex(r"->\*?|\+\+|--|<<=?|>>=?|<=>|&&|\|\||\.\.\.|\.\*|[-+*/%&|^!=<>]=?|[.~?@\\]")]
    Operator,

    /// Any character the table above does not cover; passed through untouched.
    Unknown,
}

/// Consume a block comment body up to and including the closing `*/`.
fn block_comment(lex: &mut Lexer<RawToken>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

impl RawToken {
    pub fn is_layout(&self) -> bool {
        matches!(
            self,
            RawToken::Whitespace | RawToken::Newline | RawToken::Continuation
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, RawToken::LineComment | RawToken::BlockComment)
    }

    pub fn is_opening(&self) -> bool {
        matches!(
            self,
            RawToken::OpenBrace | RawToken::OpenParen | RawToken::OpenBracket
        )
    }

    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            RawToken::CloseBrace | RawToken::CloseParen | RawToken::CloseBracket
        )
    }

    /// Coarse kind of a raw token; keywords are refined by the scanner from the lexeme.
    pub fn kind(&self) -> TokenKind {
        match self {
            RawToken::LineComment | RawToken::BlockComment => TokenKind::CommentMarker,
            RawToken::Directive => TokenKind::Directive,
            RawToken::StringLiteral | RawToken::CharLiteral | RawToken::Number => {
                TokenKind::Literal
            }
            RawToken::Ident => TokenKind::Identifier,
            RawToken::Semicolon => TokenKind::Terminator,
            RawToken::Operator => TokenKind::Operator,
            _ => TokenKind::Punctuation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<RawToken> {
        RawToken::lexer(source)
            .map(|result| result.unwrap_or(RawToken::Unknown))
            .collect()
    }

    #[test]
    fn test_scope_is_not_two_colons() {
        assert_eq!(
            lex("a::b:"),
            vec![
                RawToken::Ident,
                RawToken::Scope,
                RawToken::Ident,
                RawToken::Colon
            ]
        );
    }

    #[test]
    fn test_comments_win_over_division() {
        assert_eq!(
            lex("a / b // c"),
            vec![
                RawToken::Ident,
                RawToken::Whitespace,
                RawToken::Operator,
                RawToken::Whitespace,
                RawToken::Ident,
                RawToken::Whitespace,
                RawToken::LineComment
            ]
        );
        assert_eq!(
            lex("x/*y*/z"),
            vec![RawToken::Ident, RawToken::BlockComment, RawToken::Ident]
        );
    }

    #[test]
    fn test_unterminated_block_comment_is_an_error() {
        let mut lexer = RawToken::lexer("a /* never closed");
        assert_eq!(lexer.next(), Some(Ok(RawToken::Ident)));
        assert_eq!(lexer.next(), Some(Ok(RawToken::Whitespace)));
        assert_eq!(lexer.next(), Some(Err(())));
        assert!(lexer.slice().starts_with("/*"));
    }

    #[test]
    fn test_directive_swallows_continued_lines() {
        let mut lexer = RawToken::lexer("#define X \\\n  1\nint");
        assert_eq!(lexer.next(), Some(Ok(RawToken::Directive)));
        assert_eq!(lexer.slice(), "#define X \\\n  1");
        assert_eq!(lexer.next(), Some(Ok(RawToken::Newline)));
        assert_eq!(lexer.next(), Some(Ok(RawToken::Ident)));
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            lex(r#""a\"b" 'c' 0x1F 1.5e+3"#),
            vec![
                RawToken::StringLiteral,
                RawToken::Whitespace,
                RawToken::CharLiteral,
                RawToken::Whitespace,
                RawToken::Number,
                RawToken::Whitespace,
                RawToken::Number
            ]
        );
    }

    #[test]
    fn test_continuation_and_operators() {
        assert_eq!(
            lex("a->b \\\n+= c"),
            vec![
                RawToken::Ident,
                RawToken::Operator,
                RawToken::Ident,
                RawToken::Whitespace,
                RawToken::Continuation,
                RawToken::Operator,
                RawToken::Whitespace,
                RawToken::Ident
            ]
        );
    }
}
