//! Diagnostics grid: every fatal error code, and the recoverable warnings in lenient mode

use rstest::rstest;
use thinc::{convert, ConvertOptions, DiagnosticKind, Notation, Severity};

fn options(notation: Notation) -> ConvertOptions {
    ConvertOptions {
        source: Some(notation),
        ..ConvertOptions::default()
    }
}

#[rstest]
#[case::unterminated_comment("int f() {\n    /* open\n}\n", Notation::Brace, DiagnosticKind::LexError, "unterminated-comment", 1)]
#[case::unterminated_literal("char *s = \"open;\n", Notation::Brace, DiagnosticKind::LexError, "unterminated-literal", 0)]
#[case::mixed_indentation("a():\n    b\n\tc\n", Notation::Indentation, DiagnosticKind::LexError, "mixed-indentation", 2)]
#[case::dedent_unknown_level("a():\n  b():\n      c\n    d\n", Notation::Indentation, DiagnosticKind::LexError, "dedent-unknown-level", 3)]
#[case::unmatched_open("int f() {\n    return 0;\n", Notation::Brace, DiagnosticKind::ParseError, "unmatched-open", 0)]
#[case::unmatched_close("int x;\n}\n", Notation::Brace, DiagnosticKind::ParseError, "unmatched-close", 1)]
#[case::expected_block("int f():\nint g\n", Notation::Indentation, DiagnosticKind::ParseError, "expected-block", 0)]
#[case::unexpected_indent("f():\n    x\n        y\n", Notation::Indentation, DiagnosticKind::ParseError, "unexpected-indent", 2)]
#[case::missing_while("void f() {\n    do {\n        n++;\n    }\n    g();\n}\n", Notation::Brace, DiagnosticKind::ParseError, "missing-while", 4)]
fn test_fatal_diagnostics(
    #[case] source: &str,
    #[case] notation: Notation,
    #[case] kind: DiagnosticKind,
    #[case] code: &str,
    #[case] line: usize,
) {
    let diagnostics = convert(source, &options(notation)).unwrap_err();
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = diagnostics.iter().next().unwrap();
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.kind, kind);
    assert_eq!(diagnostic.code.as_deref(), Some(code));
    assert_eq!(diagnostic.range.start.line, line);
}

#[rstest]
#[case::macro_line("class W:\n    Q_OBJECT\n    int x\n", DiagnosticKind::AmbiguityWarning, vec![1])]
#[case::initializer_run("void f():\n    int a[] = {\n        1, 2,\n    }\n", DiagnosticKind::AmbiguityWarning, vec![1, 2, 3])]
#[case::split_by_directive("int x =\n#ifdef BIG\n    100\n#else\n    1\n#endif\n    ;\n", DiagnosticKind::AmbiguityWarning, vec![0, 2, 4, 6])]
#[case::twin_brace_headers("#ifdef X\nif (a) {\n#else\nif (b) {\n#endif\n    body();\n}\n", DiagnosticKind::AmbiguityWarning, vec![1, 3])]
#[case::twin_indented_headers("#ifdef X\nif (a):\n#else\nif (b):\n#endif\n    body()\n", DiagnosticKind::AmbiguityWarning, vec![1, 3])]
#[case::alias_collision("struct a, x:\n    int i\nstruct b, x:\n    int j\n", DiagnosticKind::AliasConflict, vec![2])]
fn test_recoverable_warnings(
    #[case] source: &str,
    #[case] kind: DiagnosticKind,
    #[case] lines: Vec<usize>,
) {
    let conversion = convert(source, &ConvertOptions::default()).unwrap();
    assert!(!conversion.output.is_empty());
    assert!(conversion.diagnostics.warnings().all(|d| d.kind == kind));
    let found: Vec<usize> = conversion
        .diagnostics
        .iter()
        .map(|d| d.range.start.line)
        .collect();
    assert_eq!(found, lines);
}

#[test]
fn test_twin_headers_report_preprocessor_ambiguity() {
    let source = "#ifdef X\nif (a) {\n#else\nif (b) {\n#endif\n    body();\n}\n";
    let conversion = convert(source, &ConvertOptions::default()).unwrap();
    assert_eq!(conversion.target, Notation::Indentation);
    let codes: Vec<&str> = conversion
        .diagnostics
        .iter()
        .filter_map(|d| d.code.as_deref())
        .collect();
    assert_eq!(codes, vec!["ambiguous-preprocessor"; 2]);

    let strict = ConvertOptions {
        strict: true,
        ..ConvertOptions::default()
    };
    assert!(convert(source, &strict).unwrap_err().has_errors());
}

#[test]
fn test_strict_mode_produces_no_output() {
    let strict = ConvertOptions {
        strict: true,
        ..ConvertOptions::default()
    };
    let diagnostics = convert("class W:\n    Q_OBJECT\n    int x\n", &strict).unwrap_err();
    assert!(diagnostics.has_errors());
    assert_eq!(diagnostics.errors().count(), 1);
}

#[test]
fn test_alias_conflicts_stay_warnings_in_strict_mode() {
    let strict = ConvertOptions {
        strict: true,
        ..ConvertOptions::default()
    };
    let conversion = convert("struct a, x:\n    int i\nstruct b, x:\n    int j\n", &strict).unwrap();
    assert_eq!(conversion.diagnostics.len(), 1);
    assert!(!conversion.diagnostics.has_errors());
}

#[test]
fn test_diagnostics_render_and_serialize() {
    let source = "int f() {\n    return 0;\n";
    let diagnostics = convert(source, &ConvertOptions::default()).unwrap_err();
    let rendered = diagnostics.render(source);
    assert!(rendered.starts_with("error [ParseError]: unmatched '{' at 1:9\n"));
    assert!(rendered.contains(">>"));

    let json: serde_json::Value = serde_json::from_str(&diagnostics.to_json().unwrap()).unwrap();
    assert_eq!(json[0]["kind"], "ParseError");
    assert_eq!(json[0]["severity"], "error");
    assert_eq!(json[0]["code"], "unmatched-open");
}
