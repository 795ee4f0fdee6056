//! Base tokenization
//!
//! Runs the logos lexer to completion and pairs every raw token with its byte span. The only
//! lexing failures that abort a conversion are unterminated block comments and literals;
//! anything else the token table does not know is passed through as [`RawToken::Unknown`].

use logos::Logos;
use std::ops::Range as ByteRange;

use crate::thinc::ast::{Diagnostic, SourceLocation};
use crate::thinc::token::RawToken;

pub type RawStream = Vec<(RawToken, ByteRange<usize>)>;

pub fn tokenize(source: &str, location: &SourceLocation) -> Result<RawStream, Diagnostic> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let slice = lexer.slice();
                let range = location.byte_range_to_ast_range(&span);
                if slice.starts_with("/*") {
                    return Err(Diagnostic::lex(range, "unterminated block comment")
                        .with_code("unterminated-comment"));
                }
                if slice.starts_with('"') || slice.starts_with('\'') {
                    return Err(Diagnostic::lex(range, "unterminated literal")
                        .with_code("unterminated-literal"));
                }
                tokens.push((RawToken::Unknown, span));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thinc::ast::{DiagnosticKind, Position};

    fn kinds(source: &str) -> Vec<RawToken> {
        let location = SourceLocation::new(source);
        tokenize(source, &location)
            .unwrap()
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn test_tokenize_with_spans() {
        let source = "x = 1;";
        let location = SourceLocation::new(source);
        let tokens = tokenize(source, &location).unwrap();
        assert_eq!(
            tokens,
            vec![
                (RawToken::Ident, 0..1),
                (RawToken::Whitespace, 1..2),
                (RawToken::Operator, 2..3),
                (RawToken::Whitespace, 3..4),
                (RawToken::Number, 4..5),
                (RawToken::Semicolon, 5..6),
            ]
        );
    }

    #[test]
    fn test_unknown_characters_pass_through() {
        assert_eq!(
            kinds("a ` b"),
            vec![
                RawToken::Ident,
                RawToken::Whitespace,
                RawToken::Unknown,
                RawToken::Whitespace,
                RawToken::Ident
            ]
        );
    }

    #[test]
    fn test_unterminated_comment_reports_position() {
        let source = "int x;\n/* open";
        let location = SourceLocation::new(source);
        let error = tokenize(source, &location).unwrap_err();
        assert_eq!(error.kind, DiagnosticKind::LexError);
        assert_eq!(error.code.as_deref(), Some("unterminated-comment"));
        assert_eq!(error.range.start, Position::new(1, 0));
    }

    #[test]
    fn test_unterminated_string() {
        let source = "printf(\"oops);\n";
        let location = SourceLocation::new(source);
        let error = tokenize(source, &location).unwrap_err();
        assert_eq!(error.code.as_deref(), Some("unterminated-literal"));
    }
}
