//! Header classification grid, and construct kinds agreeing across notations

use rstest::rstest;
use thinc::thinc::classify::{classify_header, HeaderClass};
use thinc::thinc::lexing::scan;
use thinc::thinc::parsing::ir::{AggregateKeyword, Compound};
use thinc::{parse_tree, Notation};

fn class_of(header: &str) -> HeaderClass {
    let scanned = scan(header, Some(Notation::Brace)).unwrap();
    classify_header(&scanned.tokens)
}

#[rstest]
#[case::function("int main(int argc, char **argv)", HeaderClass::Compound(Compound::Function))]
#[case::method("void Circle::draw() const", HeaderClass::Compound(Compound::Function))]
#[case::conditional("if (x > 0)", HeaderClass::Compound(Compound::Conditional))]
#[case::else_branch("else", HeaderClass::Compound(Compound::Conditional))]
#[case::for_loop("for (;;)", HeaderClass::Compound(Compound::Loop))]
#[case::while_loop("while (n--)", HeaderClass::Compound(Compound::Loop))]
#[case::namespace("namespace util", HeaderClass::Compound(Compound::Namespace))]
#[case::try_block("try", HeaderClass::Compound(Compound::Exception))]
#[case::catch_block("catch (const std::exception &e)", HeaderClass::Compound(Compound::Exception))]
#[case::linkage("extern \"C\"", HeaderClass::Compound(Compound::Linkage))]
#[case::anonymous_scope("", HeaderClass::Compound(Compound::Scope))]
#[case::plain_struct("struct point", HeaderClass::Aggregate(AggregateKeyword::Struct))]
#[case::class_with_bases("class Circle : public Geometry", HeaderClass::Aggregate(AggregateKeyword::Class))]
#[case::template_class("template <typename K, typename V> class Map", HeaderClass::Aggregate(AggregateKeyword::Class))]
#[case::union_type("union value", HeaderClass::Aggregate(AggregateKeyword::Union))]
#[case::enum_type("enum days", HeaderClass::Aggregate(AggregateKeyword::Enum))]
#[case::typedef_struct("typedef struct", HeaderClass::Aggregate(AggregateKeyword::Typedef))]
#[case::struct_returning_function("struct point make(int x)", HeaderClass::Compound(Compound::Function))]
#[case::do_block("do", HeaderClass::DoWhile)]
#[case::switch_block("switch (v)", HeaderClass::Switch)]
#[case::case_label("case 1", HeaderClass::Case)]
#[case::default_label("default", HeaderClass::Case)]
#[case::access_label("private", HeaderClass::Access)]
fn test_header_classes(#[case] header: &str, #[case] expected: HeaderClass) {
    assert_eq!(class_of(header), expected);
}

#[rstest]
#[case::do_while(
    "void f() {\n    do {\n        n++;\n    } while (n < 3);\n}\n",
    "void f():\n    do while (n < 3):\n        n++\n"
)]
#[case::switch_sections(
    "void f(int v) {\n    switch (v) {\n        case 1:\n            a();\n            break;\n        default:\n            b();\n    }\n}\n",
    "void f(int v):\n    switch (v):\n        case 1:\n            a()\n            break\n        default:\n            b()\n"
)]
#[case::class_sections(
    "class W : public Base {\npublic:\n    int x;\nprivate:\n    int y;\n} w;\n",
    "class W, w : public Base:\n    public:\n        int x\n    private:\n        int y\n"
)]
fn test_trees_agree_across_notations(#[case] brace: &str, #[case] indentation: &str) {
    use thinc::StructureEq;

    let from_brace = parse_tree(brace, Some(Notation::Brace)).unwrap();
    let from_indentation = parse_tree(indentation, Some(Notation::Indentation)).unwrap();
    assert!(
        from_brace.structure_eq(&from_indentation),
        "brace:\n{}\nindentation:\n{}",
        from_brace.to_treeviz(),
        from_indentation.to_treeviz()
    );
}
