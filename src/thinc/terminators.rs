//! Terminator engine
//!
//!     Decides what every line ends with in the target notation and reports the lines whose
//!     ending cannot be decided.
//!
//!         indentation -> brace   statements get `;`, except directives, labels, enum items
//!                                and ambiguous lines
//!         brace -> indentation   every terminator is stripped, except on ambiguous lines
//!         same notation          brace keeps terminators as written, indentation strips them
//!
//!     A lone `;` (an empty statement) is always written as `;`.
//!
//! Ambiguity
//!
//!     Lines are ambiguous for one of three reasons (see [`AmbiguityReason`]):
//!
//!         initializer   the line begins with `{`, leaves a bracket unbalanced, or continues
//!                       such a line (indentation sources only; brace statements are whole)
//!         macro         a bare ALL_CAPS name or invocation with no terminator
//!         preprocessor  a statement split by a directive, a block whose braces sit in
//!                       different conditional branches, or a header whose body is opened
//!                       by its twin in the next branch
//!
//!     Flags set by the parsers are kept, and an engine marker found by the scanner re-flags
//!     the line it annotates with the marker's reason. Ambiguous lines keep their terminator
//!     exactly as written, and each one is reported as an AmbiguityWarning.

use std::collections::HashMap;

use crate::thinc::ast::{Diagnostic, DiagnosticList, Range};
use crate::thinc::parsing::indentation::carry_balance;
use crate::thinc::parsing::ir::{Block, Ending, Line, LineKind, Node, Tree};
use crate::thinc::parsing::looks_like_macro;
use crate::thinc::token::{AmbiguityReason, Notation, RawToken, Token, TokenId};

struct Rules<'a> {
    source: Notation,
    target: Notation,
    flag_macro_lines: bool,
    markers: &'a HashMap<TokenId, AmbiguityReason>,
}

pub fn terminate(tree: &mut Tree, target: Notation, flag_macro_lines: bool) -> DiagnosticList {
    let rules = Rules {
        source: tree.notation,
        target,
        flag_macro_lines,
        markers: &tree.markers,
    };
    let mut warnings = DiagnosticList::new();
    terminate_block(&mut tree.root, &rules, &mut warnings);
    tracing::debug!(
        stage = "terminate",
        %target,
        ambiguous = warnings.len(),
        "decided line endings"
    );
    warnings
}

fn terminate_block(block: &mut Block, rules: &Rules<'_>, warnings: &mut DiagnosticList) {
    if let Some(reason) = marked(block.header.iter().chain(block.opener.iter()), rules.markers) {
        block.ambiguity = Some(reason);
    }
    if let Some(reason) = block.ambiguity {
        report(block.range(), reason, warnings);
    }

    if rules.source == Notation::Indentation {
        flag_bracket_runs(&mut block.children);
    }

    let enum_body = block.is_enum_body();
    for child in &mut block.children {
        match child {
            Node::Line(line) => {
                terminate_line(line, enum_body, rules);
                if let Some(reason) = line.ambiguity {
                    report(line.range(), reason, warnings);
                }
            }
            Node::Block(inner) => terminate_block(inner, rules, warnings),
        }
    }
}

fn terminate_line(line: &mut Line, enum_body: bool, rules: &Rules<'_>) {
    let delimiters = line.terminator.iter().chain(line.opener.iter());
    if let Some(reason) = marked(line.tokens.iter().chain(delimiters), rules.markers) {
        line.ambiguity = Some(reason);
    }
    if rules.source == Notation::Indentation
        && rules.flag_macro_lines
        && !enum_body
        && line.ambiguity.is_none()
        && line.kind == LineKind::Statement
        && line.terminator.is_none()
        && looks_like_macro(&line.tokens)
    {
        line.ambiguity = Some(AmbiguityReason::Macro);
    }

    line.ending = match (rules.target, line.kind) {
        _ if line.ambiguity.is_some() => Ending::AsWritten,
        (_, LineKind::Empty) => Ending::AsWritten,
        (Notation::Brace, LineKind::Statement)
            if rules.source == Notation::Indentation && !enum_body =>
        {
            Ending::Terminated
        }
        (Notation::Brace, _) => Ending::AsWritten,
        (Notation::Indentation, _) => Ending::Bare,
    };
}

/// Flag runs of sibling lines held together by an unclosed bracket.
fn flag_bracket_runs(children: &mut [Node]) {
    let mut balance = 0usize;
    // A directive landed inside the current run.
    let mut split = false;
    for child in children.iter_mut() {
        let line = match child {
            Node::Block(_) => {
                balance = 0;
                split = false;
                continue;
            }
            Node::Line(line) if line.kind == LineKind::Directive => {
                split |= balance > 0;
                continue;
            }
            Node::Line(line) => line,
        };
        if line.kind != LineKind::Statement {
            continue;
        }

        let continues = balance > 0 || line.extra_indent > 0;
        let opens_with_brace = line.tokens.first().is_some_and(|t| t.is(RawToken::OpenBrace));
        if (continues || opens_with_brace || net_brackets(&line.tokens) != 0)
            && line.ambiguity.is_none()
        {
            line.ambiguity = Some(if split && continues {
                AmbiguityReason::Preprocessor
            } else {
                AmbiguityReason::Initializer
            });
        }

        balance = carry_balance(balance, &line.tokens);
        if balance == 0 {
            split = false;
        }
    }
}

fn net_brackets(tokens: &[Token]) -> isize {
    tokens.iter().fold(0, |net, token| {
        if token.raw.is_opening() {
            net + 1
        } else if token.raw.is_closing() {
            net - 1
        } else {
            net
        }
    })
}

fn marked<'t>(
    mut tokens: impl Iterator<Item = &'t Token>,
    markers: &HashMap<TokenId, AmbiguityReason>,
) -> Option<AmbiguityReason> {
    if markers.is_empty() {
        return None;
    }
    tokens.find_map(|token| markers.get(&token.id).copied())
}

fn report(range: Range, reason: AmbiguityReason, warnings: &mut DiagnosticList) {
    tracing::warn!(line = range.start.line + 1, %reason, "ambiguous line");
    warnings.push(
        Diagnostic::ambiguity(range, reason.describe())
            .with_code(format!("ambiguous-{}", reason.code())),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thinc::aliases::resolve_aliases;
    use crate::thinc::classify::classify;
    use crate::thinc::lexing::scan;
    use crate::thinc::parsing::parse;

    fn tree(source: &str) -> Tree {
        let scan = scan(source, None).unwrap();
        let tree = parse(&scan, true).unwrap();
        let mut tree = classify(tree).unwrap();
        resolve_aliases(&mut tree);
        tree
    }

    fn body_endings(tree: &Tree, index: usize) -> Vec<(Ending, Option<AmbiguityReason>)> {
        tree.root.children[index]
            .as_block()
            .unwrap()
            .children
            .iter()
            .map(|node| match node {
                Node::Line(line) => (line.ending, line.ambiguity),
                Node::Block(_) => panic!("expected a line"),
            })
            .collect()
    }

    fn codes(warnings: &DiagnosticList) -> Vec<String> {
        warnings
            .iter()
            .map(|d| d.code.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_statements_are_terminated_for_brace_output() {
        let mut tree = tree("int main():\n    printf(\"hi\")\n    return 0\n");
        let warnings = terminate(&mut tree, Notation::Brace, true);
        assert!(warnings.is_empty());
        assert_eq!(
            body_endings(&tree, 0),
            vec![(Ending::Terminated, None), (Ending::Terminated, None)]
        );
    }

    #[test]
    fn test_enum_items_are_left_alone() {
        let mut tree = tree("enum days:\n    Mon,\n    Tue\n");
        terminate(&mut tree, Notation::Brace, true);
        assert_eq!(
            body_endings(&tree, 0),
            vec![(Ending::AsWritten, None), (Ending::AsWritten, None)]
        );
    }

    #[test]
    fn test_uppercase_enumerators_are_not_macros() {
        let mut tree = tree("enum colour:\n    RED,\n    BLUE\n");
        assert!(terminate(&mut tree, Notation::Brace, true).is_empty());
        assert_eq!(
            body_endings(&tree, 0),
            vec![(Ending::AsWritten, None), (Ending::AsWritten, None)]
        );
    }

    #[test]
    fn test_unbalanced_runs_are_ambiguous() {
        let mut tree = tree("void f():\n    int a[] = {\n        1, 2,\n    }\n    g()\n");
        let warnings = terminate(&mut tree, Notation::Brace, true);
        let initializer = (Ending::AsWritten, Some(AmbiguityReason::Initializer));
        assert_eq!(
            body_endings(&tree, 0),
            vec![
                initializer,
                initializer,
                initializer,
                (Ending::Terminated, None)
            ]
        );
        assert_eq!(codes(&warnings), vec!["ambiguous-initializer"; 3]);
        assert_eq!(warnings.iter().next().unwrap().range.start.line, 1);
    }

    #[test]
    fn test_macro_lines_follow_the_flag() {
        let source = "class W:\n    Q_OBJECT\n    int x\n";

        let mut flagged = tree(source);
        let warnings = terminate(&mut flagged, Notation::Brace, true);
        assert_eq!(codes(&warnings), vec!["ambiguous-macro"]);
        assert_eq!(
            body_endings(&flagged, 0),
            vec![
                (Ending::AsWritten, Some(AmbiguityReason::Macro)),
                (Ending::Terminated, None)
            ]
        );

        let mut unflagged = tree(source);
        assert!(terminate(&mut unflagged, Notation::Brace, false).is_empty());
        assert_eq!(body_endings(&unflagged, 0)[0], (Ending::Terminated, None));
    }

    #[test]
    fn test_terminators_are_stripped_for_indentation_output() {
        let mut tree = tree("int f() {\n    x = 1;\n    ;\n    return 0;\n}\n");
        let warnings = terminate(&mut tree, Notation::Indentation, true);
        assert!(warnings.is_empty());
        assert_eq!(
            body_endings(&tree, 0),
            vec![
                (Ending::Bare, None),
                (Ending::AsWritten, None),
                (Ending::Bare, None)
            ]
        );
    }

    #[test]
    fn test_brace_sources_keep_terminators_as_written() {
        let mut tree = tree("int f() {\n    return 0;\n}\n");
        terminate(&mut tree, Notation::Brace, true);
        assert_eq!(body_endings(&tree, 0), vec![(Ending::AsWritten, None)]);
    }

    #[test]
    fn test_markers_reflag_lines() {
        let mut tree = tree("int main():\n    setup(x) /* thinc: ambiguous macro */\n    return 0\n");
        let warnings = terminate(&mut tree, Notation::Brace, false);
        assert_eq!(codes(&warnings), vec!["ambiguous-macro"]);
        assert_eq!(
            body_endings(&tree, 0),
            vec![
                (Ending::AsWritten, Some(AmbiguityReason::Macro)),
                (Ending::Terminated, None)
            ]
        );
    }

    #[test]
    fn test_twin_headers_are_reported() {
        let mut tree = tree("#ifdef X\nif (a):\n#else\nif (b):\n#endif\n    body()\n");
        let warnings = terminate(&mut tree, Notation::Brace, true);
        assert_eq!(codes(&warnings), vec!["ambiguous-preprocessor"; 2]);
        let lines: Vec<usize> = warnings.iter().map(|d| d.range.start.line).collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn test_parser_flags_are_reported_in_order() {
        let mut tree = tree("int x =\n#ifdef BIG\n    100\n#else\n    1\n#endif\n    ;\n");
        let warnings = terminate(&mut tree, Notation::Indentation, true);
        assert_eq!(codes(&warnings), vec!["ambiguous-preprocessor"; 4]);
        let lines: Vec<usize> = warnings.iter().map(|d| d.range.start.line).collect();
        assert_eq!(lines, vec![0, 2, 4, 6]);
    }
}
