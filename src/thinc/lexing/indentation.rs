//! Indentation measurement
//!
//!     Assigns an indentation level to every logical line of an indentation-notation file.
//!
//! Algorithm
//!
//!     The first indented line fixes the unit: a run of tabs means one tab per level, a run
//!     of N spaces means N spaces per level. Every later line must use the same character
//!     and a whole number of units.
//!
//!     A stack of open levels mirrors the block structure. Deeper lines push, shallower lines
//!     pop until the stack top equals their level; if no open level matches, the dedent is
//!     an error, since it would land between two blocks.
//!
//!     Preprocessor lines are measured but never move the stack: C lets them sit at any
//!     column, so their indentation cannot be allowed to close or open blocks.

use super::line_grouping::SourceLine;
use crate::thinc::ast::Diagnostic;
use crate::thinc::token::IndentUnit;

pub struct IndentationMeasure {
    unit: Option<IndentUnit>,
    stack: Vec<usize>,
}

impl IndentationMeasure {
    pub fn new() -> Self {
        Self {
            unit: None,
            stack: vec![0],
        }
    }

    /// Fill in `level` on every line; returns the unit the file established, if any.
    pub fn measure(mut self, lines: &mut [SourceLine]) -> Result<Option<IndentUnit>, Diagnostic> {
        for line in lines.iter_mut() {
            if line.is_directive {
                line.level = self.unit.map_or(0, |unit| unit.levels_in(&line.indent));
                continue;
            }

            let level = self.level_of(line)?;
            let top = self.stack.last().copied().unwrap_or(0);
            if level > top {
                self.stack.push(level);
            } else if level < top {
                while self.stack.last().is_some_and(|open| *open > level) {
                    self.stack.pop();
                }
                if self.stack.last().copied() != Some(level) {
                    self.stack.push(level);
                    return Err(Diagnostic::lex(
                        line.indent_range.clone(),
                        format!("dedent to unknown level {}", level),
                    )
                    .with_code("dedent-unknown-level"));
                }
            }
            line.level = level;
        }
        Ok(self.unit)
    }

    fn level_of(&mut self, line: &SourceLine) -> Result<usize, Diagnostic> {
        let indent = line.indent.as_str();
        if indent.is_empty() {
            return Ok(0);
        }

        let tabs = indent.chars().all(|c| c == '\t');
        let spaces = indent.chars().all(|c| c == ' ');
        let mixed = || {
            Diagnostic::lex(
                line.indent_range.clone(),
                "indentation mixes tabs and spaces",
            )
            .with_code("mixed-indentation")
        };

        let unit = match self.unit {
            Some(unit) => unit,
            None if tabs => *self.unit.insert(IndentUnit::Tab),
            None if spaces => *self.unit.insert(IndentUnit::Spaces(indent.len())),
            None => return Err(mixed()),
        };

        match unit {
            IndentUnit::Tab if tabs => Ok(indent.len()),
            IndentUnit::Spaces(width) if spaces => {
                if indent.len() % width == 0 {
                    Ok(indent.len() / width)
                } else {
                    Err(Diagnostic::lex(
                        line.indent_range.clone(),
                        format!(
                            "indentation of {} spaces is not a multiple of the {}-space unit",
                            indent.len(),
                            width
                        ),
                    )
                    .with_code("mixed-indentation"))
                }
            }
            IndentUnit::Tab => Err(mixed()),
            IndentUnit::Spaces(_) => Err(mixed()),
        }
    }
}

impl Default for IndentationMeasure {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thinc::ast::SourceLocation;
    use crate::thinc::lexing::base_tokenization::tokenize;
    use crate::thinc::lexing::line_grouping::group_into_lines;

    fn measure(source: &str) -> Result<(Option<IndentUnit>, Vec<usize>), Diagnostic> {
        let location = SourceLocation::new(source);
        let raw = tokenize(source, &location).unwrap();
        let mut grouped = group_into_lines(source, &raw, &location);
        let unit = IndentationMeasure::new().measure(&mut grouped.lines)?;
        Ok((unit, grouped.lines.iter().map(|l| l.level).collect()))
    }

    #[test]
    fn test_first_indented_line_sets_unit() {
        let (unit, levels) = measure("a:\n  b:\n    c\n  d\ne\n").unwrap();
        assert_eq!(unit, Some(IndentUnit::Spaces(2)));
        assert_eq!(levels, vec![0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_tabs() {
        let (unit, levels) = measure("a:\n\tb:\n\t\tc\n").unwrap();
        assert_eq!(unit, Some(IndentUnit::Tab));
        assert_eq!(levels, vec![0, 1, 2]);
    }

    #[test]
    fn test_mixed_indentation_is_a_lex_error() {
        let error = measure("a:\n    b\n\tc\n").unwrap_err();
        assert_eq!(error.code.as_deref(), Some("mixed-indentation"));
        assert_eq!(error.range.start.line, 2);
    }

    #[test]
    fn test_partial_unit_is_a_lex_error() {
        let error = measure("a:\n    b\n      c\n").unwrap_err();
        assert_eq!(error.code.as_deref(), Some("mixed-indentation"));
    }

    #[test]
    fn test_dedent_to_unknown_level() {
        let error = measure("a:\n  b:\n      c\n    d\n").unwrap_err();
        assert_eq!(error.code.as_deref(), Some("dedent-unknown-level"));
        assert_eq!(error.range.start.line, 3);
    }

    #[test]
    fn test_directives_do_not_move_levels() {
        let (_, levels) = measure("f():\n    a\n#if X\n    b\n#endif\n").unwrap();
        assert_eq!(levels, vec![0, 1, 0, 1, 0]);
    }
}
