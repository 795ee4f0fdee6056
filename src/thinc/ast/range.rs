//! Position and location tracking for source code locations
//!
//! ## Types
//!
//! - [`Position`] - A line:column position in source code (both 0-based)
//! - [`Range`] - A source range with start/end positions and byte span
//! - [`SourceLocation`] - Utility for converting byte offsets to positions
//!
//! The scanner produces byte spans from logos; every token and comment then stores a
//! [`Range`] built through [`SourceLocation::byte_range_to_ast_range`], so diagnostics raised
//! by later stages can point back at exact source text without re-scanning.

use serde::Serialize;
use std::fmt;
use std::ops::Range as ByteRange;

/// A position in source code (line and column, 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// A location in source code (start and end positions plus the byte span)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    pub span: ByteRange<usize>,
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(span: ByteRange<usize>, start: Position, end: Position) -> Self {
        Self { span, start, end }
    }

    /// Number of bytes covered.
    pub fn len(&self) -> usize {
        self.span.end.saturating_sub(self.span.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a bounding box that contains all provided ranges.
    pub fn bounding_box<'a, I>(mut ranges: I) -> Option<Range>
    where
        I: Iterator<Item = &'a Range>,
    {
        let first = ranges.next()?.clone();
        let mut span_start = first.span.start;
        let mut span_end = first.span.end;
        let mut start_pos = first.start;
        let mut end_pos = first.end;

        for range in ranges {
            if range.start < start_pos {
                start_pos = range.start;
                span_start = range.span.start;
            }
            if range.end > end_pos {
                end_pos = range.end;
                span_end = range.span.end;
            }
        }

        Some(Range::new(span_start..span_end, start_pos, end_pos))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::new(0..0, Position::default(), Position::default())
    }
}

/// Provides fast conversion from byte offsets to line/column positions
#[derive(Debug, Clone)]
pub struct SourceLocation {
    /// Byte offsets where each line starts
    line_starts: Vec<usize>,
}

impl SourceLocation {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (byte_pos, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(byte_pos + 1);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a line/column position
    pub fn byte_to_position(&self, byte_offset: usize) -> Position {
        let line = self
            .line_starts
            .binary_search(&byte_offset)
            .unwrap_or_else(|i| i.saturating_sub(1));
        let column = byte_offset - self.line_starts[line];
        Position::new(line, column)
    }

    pub fn byte_range_to_ast_range(&self, range: &ByteRange<usize>) -> Range {
        Range::new(
            range.clone(),
            self.byte_to_position(range.start),
            self.byte_to_position(range.end),
        )
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset where a line starts
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display_is_one_based() {
        assert_eq!(format!("{}", Position::new(0, 0)), "1:1");
        assert_eq!(format!("{}", Position::new(4, 9)), "5:10");
    }

    #[test]
    fn test_byte_to_position_across_lines() {
        let loc = SourceLocation::new("int a;\nint b;\n");
        assert_eq!(loc.byte_to_position(0), Position::new(0, 0));
        assert_eq!(loc.byte_to_position(4), Position::new(0, 4));
        assert_eq!(loc.byte_to_position(7), Position::new(1, 0));
        assert_eq!(loc.byte_to_position(11), Position::new(1, 4));
        assert_eq!(loc.line_count(), 3);
    }

    #[test]
    fn test_byte_range_to_ast_range() {
        let loc = SourceLocation::new("a\nbc\n");
        let range = loc.byte_range_to_ast_range(&(2..4));
        assert_eq!(range.start, Position::new(1, 0));
        assert_eq!(range.end, Position::new(1, 2));
        assert_eq!(range.len(), 2);
    }

    #[test]
    fn test_bounding_box() {
        let a = Range::new(2..4, Position::new(0, 2), Position::new(0, 4));
        let b = Range::new(10..12, Position::new(1, 3), Position::new(1, 5));
        let bbox = Range::bounding_box([b.clone(), a.clone()].iter()).unwrap();
        assert_eq!(bbox.span, 2..12);
        assert_eq!(bbox.start, a.start);
        assert_eq!(bbox.end, b.end);
        assert!(Range::bounding_box(std::iter::empty()).is_none());
    }
}
