//! Line grouping and comment extraction
//!
//! Turns the raw stream into the scanner's three outputs:
//!
//!     tokens    code tokens only, each carrying its layout flags
//!     comments  satellite records with a placement and an anchor token
//!     lines     logical lines (physical lines joined across `\` continuations)
//!
//! Comment anchoring needs to know the nearest code token on either side of every comment,
//! so the walk first records an ordered list of items and resolves anchors afterwards.
//!
//! A line comment after code that ends in `\` continues its logical line like a bare `\`
//! would; the backslash is not part of the comment's text.

use std::collections::HashMap;
use std::ops::Range as ByteRange;

use serde::Serialize;

use super::base_tokenization::RawStream;
use crate::thinc::ast::{Range, SourceLocation};
use crate::thinc::token::{AmbiguityReason, Anchor, Comment, Placement, RawToken, Token, TokenId};

/// A logical source line: one or more physical lines joined by continuations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceLine {
    /// Indices into the scan's token list.
    pub tokens: ByteRange<usize>,
    /// Leading whitespace of the first physical line.
    pub indent: String,
    pub indent_range: Range,
    /// Indentation level, filled in by indentation measurement.
    pub level: usize,
    pub is_directive: bool,
}

impl SourceLine {
    pub fn first(&self) -> usize {
        self.tokens.start
    }

    pub fn last(&self) -> usize {
        self.tokens.end - 1
    }
}

#[derive(Debug, Default)]
pub struct Grouped {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
    pub markers: HashMap<TokenId, AmbiguityReason>,
    pub lines: Vec<SourceLine>,
}

enum Item {
    Code(usize),
    Comment {
        text: String,
        range: Range,
        indent: String,
        blank_before: bool,
    },
}

pub fn group_into_lines(source: &str, raw: &RawStream, location: &SourceLocation) -> Grouped {
    let mut grouped = Grouped::default();
    let mut items = Vec::new();

    // Whitespace or a comment since the last code token on this physical line
    let mut spaced = false;
    // A hard newline since the last code token: the next one opens a logical line
    let mut line_break = true;
    // The physical line ended in a line comment with a trailing `\`
    let mut continued = false;
    let mut last_item_end: Option<usize> = None;
    let mut last_code_end: Option<usize> = None;

    for (token, span) in raw {
        match token {
            RawToken::Whitespace | RawToken::Continuation => spaced = true,
            RawToken::Newline if std::mem::take(&mut continued) => spaced = true,
            RawToken::Newline => {
                line_break = true;
                spaced = false;
            }
            RawToken::LineComment | RawToken::BlockComment => {
                let range = location.byte_range_to_ast_range(span);
                let mut text = source[span.clone()].trim_end_matches('\r');
                let after_code = last_code_end == Some(range.start.line);
                if *token == RawToken::LineComment && after_code {
                    if let Some(body) = text.strip_suffix('\\') {
                        text = body.trim_end();
                        continued = true;
                    }
                }
                let text = text.to_string();
                if range.end.line > range.start.line {
                    line_break = true;
                }
                items.push(Item::Comment {
                    indent: leading_whitespace(source, location, range.start.line),
                    blank_before: follows_blank(last_item_end, range.start.line),
                    text,
                    range: range.clone(),
                });
                last_item_end = Some(range.end.line);
                spaced = true;
            }
            _ => {
                let index = grouped.tokens.len();
                let range = location.byte_range_to_ast_range(span);
                let mut code = Token::new(
                    TokenId::real(index),
                    *token,
                    source[span.clone()].to_string(),
                    range.clone(),
                );
                code.newline_before = last_code_end.map_or(true, |end| range.start.line > end);
                code.space_before = spaced && !code.newline_before;
                code.blank_before = follows_blank(last_item_end, range.start.line);

                let is_directive = *token == RawToken::Directive;
                let opens_line = line_break || is_directive || grouped.lines.is_empty();
                if opens_line {
                    let indent = leading_whitespace(source, location, range.start.line);
                    let start = location.line_start(range.start.line).unwrap_or(0);
                    grouped.lines.push(SourceLine {
                        tokens: index..index + 1,
                        indent_range: location.byte_range_to_ast_range(&(start..start + indent.len())),
                        indent,
                        level: 0,
                        is_directive,
                    });
                } else if let Some(line) = grouped.lines.last_mut() {
                    line.tokens.end = index + 1;
                }

                line_break = false;
                spaced = false;
                last_item_end = Some(range.end.line);
                last_code_end = Some(range.end.line);
                items.push(Item::Code(index));
                grouped.tokens.push(code);
            }
        }
    }

    resolve_comments(items, &mut grouped);
    grouped
}

fn follows_blank(previous_end: Option<usize>, line: usize) -> bool {
    previous_end.map_or(false, |end| line >= end + 2)
}

fn leading_whitespace(source: &str, location: &SourceLocation, line: usize) -> String {
    let start = location.line_start(line).unwrap_or(0);
    source[start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

fn resolve_comments(items: Vec<Item>, grouped: &mut Grouped) {
    // Nearest code token before / after each item position
    let mut previous_code = Vec::with_capacity(items.len());
    let mut seen = None;
    for item in &items {
        previous_code.push(seen);
        if let Item::Code(index) = item {
            seen = Some(*index);
        }
    }
    let mut next_code = vec![None; items.len()];
    let mut seen = None;
    for (position, item) in items.iter().enumerate().rev() {
        next_code[position] = seen;
        if let Item::Code(index) = item {
            seen = Some(*index);
        }
    }

    for (position, item) in items.into_iter().enumerate() {
        let Item::Comment {
            text,
            range,
            indent,
            blank_before,
        } = item
        else {
            continue;
        };

        let next = next_code[position].map(|i| &grouped.tokens[i]);
        let previous = previous_code[position].map(|i| &grouped.tokens[i]);

        let (placement, anchor) = match (previous, next) {
            (_, Some(next)) if next.range.start.line == range.end.line => {
                (Placement::Leading, Anchor::Token(next.id))
            }
            (Some(previous), _) if previous.range.end.line == range.start.line => {
                (Placement::Trailing, Anchor::Token(previous.id))
            }
            (_, Some(next)) => (Placement::Standalone, Anchor::Token(next.id)),
            (_, None) => (Placement::Standalone, Anchor::EndOfFile),
        };

        if let Some(reason) = AmbiguityReason::from_marker(&text) {
            if let Anchor::Token(id) = anchor {
                grouped.markers.insert(id, reason);
            }
            continue;
        }

        grouped.comments.push(Comment {
            text,
            range,
            placement,
            anchor,
            indent,
            blank_before,
        });
    }
}
