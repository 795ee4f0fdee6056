//! Canonical conversion scenarios
//!
//! Each scenario converts an indentation-notation program to brace notation, snapshots the
//! result, and checks that converting back reproduces the input exactly.

use thinc::{to_brace, to_indentation};

fn brace(source: &str) -> String {
    let conversion = to_brace(source).expect("conversion to succeed");
    assert!(
        conversion.diagnostics.is_empty(),
        "unexpected warnings: {}",
        conversion.diagnostics
    );
    conversion.output
}

fn indentation(source: &str) -> String {
    to_indentation(source)
        .expect("conversion to succeed")
        .output
}

#[test]
fn test_a_main_with_for_loop() {
    let source = r#"#include <stdio.h>

int main():
    for (int i = 0; i < 5; i++):
        printf("%d\n", i)
    return 0
"#;
    let output = brace(source);
    insta::assert_snapshot!(output, @r#"
#include <stdio.h>

int main() {
    for (int i = 0; i < 5; i++) {
        printf("%d\n", i);
    }
    return 0;
}
"#);
    assert_eq!(indentation(&output), source);
}

#[test]
fn test_b_do_while_condition_relocates() {
    let source = r#"int main():
    int N = 0
    do while (N < 20):
        printf("%d\n", N)
        N++
    return 0
"#;
    let output = brace(source);
    insta::assert_snapshot!(output, @r#"
int main() {
    int N = 0;
    do {
        printf("%d\n", N);
        N++;
    } while (N < 20);
    return 0;
}
"#);
    assert_eq!(indentation(&output), source);
}

#[test]
fn test_c_class_alias_moves_behind_the_body() {
    let source = "class Circle, dot: public Geometry:
    public:
        Circle(int r)
        double area()
    private:
        int radius
";
    let output = brace(source);
    insta::assert_snapshot!(output, @r"
class Circle: public Geometry {
    public:
        Circle(int r);
        double area();
    private:
        int radius;
} dot;
");
    assert_eq!(indentation(&output), source);
}

#[test]
fn test_d_enum_without_aliases() {
    let source = "enum days:
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun
";
    let output = brace(source);
    insta::assert_snapshot!(output, @r"
enum days {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun
};
");
    assert_eq!(indentation(&output), source);
}

#[test]
fn test_e_switch_closes_once() {
    let source = "void pick(int v):
    switch (v):
        case 1:
            one()
            break
        case 2:
            two()
            break
        default:
            other()
            break
";
    let output = brace(source);
    insta::assert_snapshot!(output, @r"
void pick(int v) {
    switch (v) {
        case 1:
            one();
            break;
        case 2:
            two();
            break;
        default:
            other();
            break;
    }
}
");
    assert_eq!(indentation(&output), source);
}
