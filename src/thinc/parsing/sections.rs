//! Section regrouping
//!
//! `case`, `default` and access labels have no closing delimiter in brace notation: a
//! section runs until the next label or the end of the enclosing body. Both parsers build
//! label blocks first and then fold the following siblings into them here, so a switch
//! parsed from either notation has the same shape.

use super::ir::Node;

pub fn regroup_sections(children: Vec<Node>) -> Vec<Node> {
    let mut grouped: Vec<Node> = Vec::with_capacity(children.len());
    for node in children {
        if node.is_section() {
            grouped.push(node);
            continue;
        }
        match grouped.last_mut() {
            Some(Node::Block(section)) if section.section => section.children.push(node),
            _ => grouped.push(node),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thinc::ast::Range;
    use crate::thinc::parsing::ir::{Block, Line};
    use crate::thinc::token::{RawToken, Token, TokenId};

    fn word(index: usize, text: &str) -> Token {
        Token::new(TokenId::real(index), RawToken::Ident, text, Range::default())
    }

    fn line(index: usize, text: &str) -> Node {
        Node::Line(Line::statement(vec![word(index, text)], None))
    }

    fn label(index: usize, text: &str) -> Node {
        Node::Block(Block::section(
            vec![word(index, text)],
            Token::new(TokenId::real(index + 1), RawToken::Colon, ":", Range::default()),
        ))
    }

    fn shape(nodes: &[Node]) -> Vec<(String, usize)> {
        nodes
            .iter()
            .map(|node| match node {
                Node::Block(block) => (block.header[0].text.clone(), block.children.len()),
                Node::Line(line) => (line.tokens[0].text.clone(), 0),
            })
            .collect()
    }

    #[test]
    fn test_labels_absorb_following_siblings() {
        let grouped = regroup_sections(vec![
            line(0, "before"),
            label(1, "default"),
            line(3, "a"),
            line(4, "b"),
            label(5, "private"),
            line(7, "c"),
        ]);
        assert_eq!(
            shape(&grouped),
            vec![
                ("before".to_string(), 0),
                ("default".to_string(), 2),
                ("private".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_adjacent_labels_stay_siblings() {
        let grouped = regroup_sections(vec![label(0, "default"), label(2, "public"), line(4, "x")]);
        assert_eq!(
            shape(&grouped),
            vec![("default".to_string(), 0), ("public".to_string(), 1)]
        );
    }
}
