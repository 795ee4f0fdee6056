//! Treeviz formatter for block trees
//!
//! One line per node, nesting drawn with box connectors, so the structure the parsers built
//! can be read at a glance in test failures and debug logs.
//!
//! Format:
//!     <prefix><connector> <icon> <label> (label truncated to 30 characters)
//!
//! Example:
//!
//!     ⧉ indentation, 2 blocks
//!     └─ ƒ int main ( )
//!       ├─ ↻ for ( int i = 0 ; i < 3 ; i ++...
//!       │ └─ ↵ printf ( "%d" , i )
//!       └─ ↵ return 0
//!
//! Icons
//!     Blocks:
//!         Function: ƒ
//!         Conditional: ⋔
//!         Loop: ↻
//!         Aggregate: ◇
//!         DoWhile: ↺
//!         Switch: ⇶
//!         Case / Access section: §
//!         Other compound: ▣
//!     Lines:
//!         Statement: ↵
//!         Directive: #
//!         Label: ⌖
//!         Empty: ∅
//!
//! Ambiguous nodes get a `[?reason]` suffix.

use crate::thinc::parsing::ir::{Block, BlockKind, Compound, Line, LineKind, Node, Tree};
use crate::thinc::token::Token;

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

fn lexemes(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn block_icon(kind: &BlockKind) -> &'static str {
    match kind {
        BlockKind::Compound(Compound::Function) => "ƒ",
        BlockKind::Compound(Compound::Conditional) => "⋔",
        BlockKind::Compound(Compound::Loop) => "↻",
        BlockKind::Aggregate(_) => "◇",
        BlockKind::DoWhile(_) => "↺",
        BlockKind::Switch => "⇶",
        BlockKind::Case | BlockKind::Access => "§",
        _ => "▣",
    }
}

fn line_icon(kind: LineKind) -> &'static str {
    match kind {
        LineKind::Statement => "↵",
        LineKind::Directive => "#",
        LineKind::Label => "⌖",
        LineKind::Empty => "∅",
        LineKind::Header => "⑂",
    }
}

fn block_label(block: &Block) -> String {
    let label = match &block.kind {
        BlockKind::Aggregate(group) => {
            let mut label = lexemes(&group.head);
            for alias in &group.aliases {
                label.push_str(" , ");
                label.push_str(&lexemes(&alias.tokens));
            }
            if !group.bases.is_empty() {
                label.push(' ');
                label.push_str(&lexemes(&group.bases));
            }
            label
        }
        BlockKind::DoWhile(do_while) => format!("do {}", lexemes(&do_while.clause)),
        _ if block.header.is_empty() => "(scope)".to_string(),
        _ => lexemes(&block.header),
    };
    truncate(&label, 30)
}

fn line_label(line: &Line) -> String {
    match line.kind {
        LineKind::Empty => ";".to_string(),
        _ => truncate(&lexemes(&line.tokens), 30),
    }
}

fn format_node(node: &Node, prefix: &str, is_last: bool, output: &mut String) {
    let connector = if is_last { "└─" } else { "├─" };
    let (icon, label, ambiguity, children) = match node {
        Node::Line(line) => (line_icon(line.kind), line_label(line), line.ambiguity, &[][..]),
        Node::Block(block) => (
            block_icon(&block.kind),
            block_label(block),
            block.ambiguity,
            block.children.as_slice(),
        ),
    };
    output.push_str(&format!("{}{} {} {}", prefix, connector, icon, label));
    if let Some(reason) = ambiguity {
        output.push_str(&format!(" [?{}]", reason));
    }
    output.push('\n');

    let child_prefix = format!("{}{}", prefix, if is_last { "  " } else { "│ " });
    format_children(children, &child_prefix, output);
}

fn format_children(children: &[Node], prefix: &str, output: &mut String) {
    let count = children.len();
    for (index, child) in children.iter().enumerate() {
        format_node(child, prefix, index + 1 == count, output);
    }
}

pub fn to_treeviz(tree: &Tree) -> String {
    let mut output = format!("⧉ {}, {} blocks\n", tree.notation, tree.block_count());
    format_children(&tree.root.children, "", &mut output);
    output
}
