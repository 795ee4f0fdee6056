//! Notation detection
//!
//! A file is in brace notation when some `{` at file scope opens a block, i.e. it is not an
//! initializer brace (`= {`, `, {`, `( {`, `return {`) and its logical line has no `=` in
//! front of it. Files without such a brace fall back to comparing how many logical lines end
//! in `;` against how many end in `:`.

use super::line_grouping::SourceLine;
use crate::thinc::token::{Notation, RawToken, Token};

pub fn detect_notation(tokens: &[Token], lines: &[SourceLine]) -> Notation {
    if has_file_scope_block(tokens, lines) {
        return Notation::Brace;
    }

    let (mut semicolons, mut colons) = (0usize, 0usize);
    for line in lines.iter().filter(|line| !line.is_directive) {
        match tokens[line.last()].raw {
            RawToken::Semicolon => semicolons += 1,
            RawToken::Colon => colons += 1,
            _ => {}
        }
    }

    if semicolons > colons {
        Notation::Brace
    } else {
        Notation::Indentation
    }
}

fn has_file_scope_block(tokens: &[Token], lines: &[SourceLine]) -> bool {
    let mut depth = 0usize;
    for line in lines {
        let mut assigned = false;
        for index in line.tokens.clone() {
            let token = &tokens[index];
            match token.raw {
                RawToken::OpenBrace => {
                    if depth == 0 && !assigned && !follows_initializer_context(tokens, line, index)
                    {
                        return true;
                    }
                    depth += 1;
                }
                RawToken::CloseBrace => depth = depth.saturating_sub(1),
                RawToken::Operator if token.text == "=" => assigned = true,
                _ => {}
            }
        }
    }
    false
}

fn follows_initializer_context(tokens: &[Token], line: &SourceLine, index: usize) -> bool {
    if index == line.first() {
        return false;
    }
    let previous = &tokens[index - 1];
    matches!(
        previous.raw,
        RawToken::Comma | RawToken::OpenParen | RawToken::OpenBracket | RawToken::Operator
    ) || previous.is_word("return")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thinc::ast::SourceLocation;
    use crate::thinc::lexing::base_tokenization::tokenize;
    use crate::thinc::lexing::line_grouping::group_into_lines;

    fn detect(source: &str) -> Notation {
        let location = SourceLocation::new(source);
        let raw = tokenize(source, &location).unwrap();
        let grouped = group_into_lines(source, &raw, &location);
        detect_notation(&grouped.tokens, &grouped.lines)
    }

    #[test]
    fn test_function_body_means_brace() {
        assert_eq!(detect("int main() {\n    return 0;\n}\n"), Notation::Brace);
    }

    #[test]
    fn test_indented_source() {
        assert_eq!(
            detect("int main():\n    int a[] = {1, 2}\n    return 0\n"),
            Notation::Indentation
        );
    }

    #[test]
    fn test_initializer_brace_is_not_a_block() {
        assert_eq!(detect("int a[] = {1, 2}\n"), Notation::Indentation);
        assert_eq!(
            detect("auto f = [](int x) { return x; }\n"),
            Notation::Indentation
        );
    }

    #[test]
    fn test_declarations_only_fall_back_to_line_endings() {
        assert_eq!(
            detect("#include <stdio.h>\nint f(int);\nextern int g;\n"),
            Notation::Brace
        );
    }
}
