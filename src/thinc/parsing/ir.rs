//! Intermediate Block Tree
//!
//!     The notation-agnostic structure both parsers produce and the emitter walks. A tree is
//!     a root [`Block`] whose children are [`Node`]s: either a [`Line`] (statement,
//!     directive, label, empty statement) or a nested [`Block`]. Ownership is strictly
//!     top-down; nothing points back at a parent.
//!
//!     Delimiter tokens are kept beside the structure rather than inside it (`opener`,
//!     `closer`, `terminator`) so an equivalent program parsed from either notation yields
//!     the same headers and lines, while comment anchors on those delimiters stay resolvable.

use serde::Serialize;
use std::collections::HashMap;

use crate::thinc::ast::Range;
use crate::thinc::token::{AmbiguityReason, Comment, IndentUnit, Notation, Token, TokenId};

#[derive(Debug, Clone)]
pub struct Tree {
    pub root: Block,
    pub comments: Vec<Comment>,
    pub markers: HashMap<TokenId, AmbiguityReason>,
    pub notation: Notation,
    pub unit: Option<IndentUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    Line(Line),
    Block(Block),
}

impl Node {
    pub fn first_token(&self) -> Option<&Token> {
        match self {
            Node::Line(line) => line.first_token(),
            Node::Block(block) => block.first_token(),
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Node::Block(block) => Some(block),
            Node::Line(_) => None,
        }
    }

    pub fn is_section(&self) -> bool {
        matches!(self, Node::Block(block) if block.section)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineKind {
    Statement,
    /// A preprocessor line, kept verbatim as one token
    Directive,
    /// A goto label; its `:` is part of the tokens
    Label,
    /// A lone `;`
    Empty,
    /// A block header in one `#if` branch whose body is opened by its twin in the next
    /// branch; the opener is kept in [`Line::opener`]
    Header,
}

/// What the emitter writes after a line's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Ending {
    /// Reproduce the source terminator, if any
    AsWritten,
    /// No terminator
    Bare,
    /// A `;`, reusing the source token when there was one
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub kind: LineKind,
    pub tokens: Vec<Token>,
    pub terminator: Option<Token>,
    /// `{` or `:` of a header line.
    pub opener: Option<Token>,
    pub ambiguity: Option<AmbiguityReason>,
    /// Levels of indentation beyond the enclosing body (continuations of unbalanced lines).
    pub extra_indent: usize,
    pub ending: Ending,
}

impl Line {
    pub fn new(kind: LineKind, tokens: Vec<Token>) -> Self {
        Self {
            kind,
            tokens,
            terminator: None,
            opener: None,
            ambiguity: None,
            extra_indent: 0,
            ending: Ending::AsWritten,
        }
    }

    pub fn statement(tokens: Vec<Token>, terminator: Option<Token>) -> Self {
        let kind = if tokens.is_empty() {
            LineKind::Empty
        } else {
            LineKind::Statement
        };
        Self {
            terminator,
            ..Self::new(kind, tokens)
        }
    }

    pub fn first_token(&self) -> Option<&Token> {
        self.tokens.first().or(self.terminator.as_ref())
    }

    pub fn range(&self) -> Range {
        Range::bounding_box(
            self.tokens
                .iter()
                .chain(self.terminator.iter())
                .chain(self.opener.iter())
                .map(|t| &t.range),
        )
        .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Compound {
    Function,
    Conditional,
    Loop,
    Namespace,
    Exception,
    Linkage,
    Scope,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregateKeyword {
    Class,
    Struct,
    Union,
    Enum,
    Typedef,
}

impl AggregateKeyword {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "class" => Some(Self::Class),
            "struct" => Some(Self::Struct),
            "union" => Some(Self::Union),
            "enum" => Some(Self::Enum),
            "typedef" => Some(Self::Typedef),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alias {
    /// The comma in front of the alias, when the source had one.
    pub separator: Option<Token>,
    pub tokens: Vec<Token>,
}

impl Alias {
    /// The declared identifier, e.g. `p` in `*p` or `arr` in `arr[N]`.
    pub fn name(&self) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| t.is_identifier())
            .map(|t| t.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasGroup {
    pub keyword: AggregateKeyword,
    /// Keyword(s) and primary name, `template <...>` prefix included.
    pub head: Vec<Token>,
    pub aliases: Vec<Alias>,
    /// Base clause starting at its `:`.
    pub bases: Vec<Token>,
    /// A conflict was reported; an indentation header is then kept verbatim in `head`.
    pub conflict: bool,
}

impl AliasGroup {
    /// The declared type name; `None` for anonymous aggregates.
    pub fn primary_name(&self) -> Option<&str> {
        let last = self.head.last()?;
        (last.is_identifier()).then_some(last.text.as_str())
    }

    pub fn is_enum(&self) -> bool {
        self.head.iter().any(|t| t.is_word("enum"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoWhile {
    /// `while ( ... )`, without the terminator.
    pub clause: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BlockKind {
    Unclassified,
    Compound(Compound),
    Aggregate(AliasGroup),
    DoWhile(DoWhile),
    Switch,
    Case,
    Access,
}

impl BlockKind {
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Unclassified => "block",
            BlockKind::Compound(Compound::Function) => "function",
            BlockKind::Compound(Compound::Conditional) => "conditional",
            BlockKind::Compound(Compound::Loop) => "loop",
            BlockKind::Compound(Compound::Namespace) => "namespace",
            BlockKind::Compound(Compound::Exception) => "exception",
            BlockKind::Compound(Compound::Linkage) => "linkage",
            BlockKind::Compound(Compound::Scope) => "scope",
            BlockKind::Compound(Compound::Other) => "compound",
            BlockKind::Aggregate(_) => "aggregate",
            BlockKind::DoWhile(_) => "do-while",
            BlockKind::Switch => "switch",
            BlockKind::Case => "case",
            BlockKind::Access => "access",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    /// Tokens up to and excluding the opening delimiter.
    pub header: Vec<Token>,
    pub children: Vec<Node>,
    /// `{`, or the header's `:`. `None` for the root.
    pub opener: Option<Token>,
    /// `}`, or the synthetic closer minted by the indentation parser.
    pub closer: Option<TokenId>,
    /// Brace notation: tokens between `}` and the declaration's `;`.
    pub tail: Vec<Token>,
    pub terminator: Option<Token>,
    /// A label-shaped block (case/default/access) with no delimiters of its own.
    pub section: bool,
    pub ambiguity: Option<AmbiguityReason>,
}

impl Block {
    pub fn new(header: Vec<Token>, opener: Option<Token>) -> Self {
        Self {
            kind: BlockKind::Unclassified,
            header,
            children: Vec::new(),
            opener,
            closer: None,
            tail: Vec::new(),
            terminator: None,
            section: false,
            ambiguity: None,
        }
    }

    pub fn root() -> Self {
        Self::new(Vec::new(), None)
    }

    pub fn section(header: Vec<Token>, colon: Token) -> Self {
        Self {
            section: true,
            ..Self::new(header, Some(colon))
        }
    }

    pub fn first_token(&self) -> Option<&Token> {
        self.header.first().or(self.opener.as_ref())
    }

    /// Range of the header, falling back to the opener.
    pub fn range(&self) -> Range {
        Range::bounding_box(self.header.iter().chain(self.opener.iter()).map(|t| &t.range))
            .unwrap_or_default()
    }

    pub fn alias_group(&self) -> Option<&AliasGroup> {
        match &self.kind {
            BlockKind::Aggregate(group) => Some(group),
            _ => None,
        }
    }

    pub fn is_enum_body(&self) -> bool {
        match &self.kind {
            BlockKind::Aggregate(group) => group.is_enum(),
            _ => header_declares_enum(&self.header),
        }
    }

    /// Depth-first walk over every block below (and including) this one.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Block)) {
        visit(self);
        for child in &self.children {
            if let Node::Block(block) = child {
                block.walk(visit);
            }
        }
    }

    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Block)) {
        visit(self);
        for child in &mut self.children {
            if let Node::Block(block) = child {
                block.walk_mut(visit);
            }
        }
    }
}

/// `enum ...` or `typedef enum ...`
pub fn header_declares_enum(header: &[Token]) -> bool {
    match header.first() {
        Some(first) if first.is_word("enum") => true,
        Some(first) if first.is_word("typedef") => header.get(1).is_some_and(|t| t.is_word("enum")),
        _ => false,
    }
}

impl Tree {
    pub fn block_count(&self) -> usize {
        let mut count = 0;
        self.root.walk(&mut |_| count += 1);
        count - 1
    }

    pub fn ambiguous_lines(&self) -> usize {
        fn count(block: &Block) -> usize {
            block
                .children
                .iter()
                .map(|child| match child {
                    Node::Line(line) => usize::from(line.ambiguity.is_some()),
                    Node::Block(inner) => {
                        usize::from(inner.ambiguity.is_some()) + count(inner)
                    }
                })
                .sum()
        }
        count(&self.root)
    }

    pub fn to_treeviz(&self) -> String {
        crate::thinc::formats::treeviz::to_treeviz(self)
    }
}

/// Structural equality up to notation.
///
/// Compares construct kinds, header, alias and condition lexemes, and children in
/// order. Token ids, spans, spacing and terminators are ignored.
pub trait StructureEq {
    fn structure_eq(&self, other: &Self) -> bool;
}

fn lexemes_eq(a: &[Token], b: &[Token]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.text == y.text)
}

fn vec_structure_eq<T: StructureEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structure_eq(y))
}

impl StructureEq for Tree {
    fn structure_eq(&self, other: &Self) -> bool {
        self.root.structure_eq(&other.root)
    }
}

impl StructureEq for Node {
    fn structure_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Line(a), Node::Line(b)) => a.structure_eq(b),
            (Node::Block(a), Node::Block(b)) => a.structure_eq(b),
            _ => false,
        }
    }
}

impl StructureEq for Line {
    fn structure_eq(&self, other: &Self) -> bool {
        self.kind == other.kind && lexemes_eq(&self.tokens, &other.tokens)
    }
}

impl StructureEq for Alias {
    fn structure_eq(&self, other: &Self) -> bool {
        lexemes_eq(&self.tokens, &other.tokens)
    }
}

impl StructureEq for BlockKind {
    fn structure_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BlockKind::Aggregate(a), BlockKind::Aggregate(b)) => {
                a.keyword == b.keyword
                    && lexemes_eq(&a.head, &b.head)
                    && vec_structure_eq(&a.aliases, &b.aliases)
                    && lexemes_eq(&a.bases, &b.bases)
            }
            (BlockKind::DoWhile(a), BlockKind::DoWhile(b)) => lexemes_eq(&a.clause, &b.clause),
            (BlockKind::Compound(a), BlockKind::Compound(b)) => a == b,
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl StructureEq for Block {
    fn structure_eq(&self, other: &Self) -> bool {
        let headers_match = match (&self.kind, &other.kind) {
            // Aggregate headers are compared through their alias groups
            (BlockKind::Aggregate(_), BlockKind::Aggregate(_)) => true,
            _ => lexemes_eq(&self.header, &other.header),
        };
        headers_match
            && self.kind.structure_eq(&other.kind)
            && vec_structure_eq(&self.children, &other.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thinc::token::RawToken;

    fn tok(index: usize, raw: RawToken, text: &str) -> Token {
        Token::new(TokenId::real(index), raw, text, Range::default())
    }

    fn words(start: usize, text: &str) -> Vec<Token> {
        text.split_whitespace()
            .enumerate()
            .map(|(i, w)| tok(start + i, RawToken::Ident, w))
            .collect()
    }

    #[test]
    fn test_structure_eq_ignores_ids_and_terminators() {
        let a = Line::statement(words(0, "return x"), Some(tok(2, RawToken::Semicolon, ";")));
        let b = Line::statement(words(40, "return x"), None);
        assert!(a.structure_eq(&b));
        assert!(!a.structure_eq(&Line::statement(words(0, "return y"), None)));
    }

    #[test]
    fn test_structure_eq_compares_children_in_order() {
        let mut a = Block::new(words(0, "if x"), None);
        a.children.push(Node::Line(Line::statement(words(2, "f"), None)));
        a.children.push(Node::Line(Line::statement(words(3, "g"), None)));
        let mut b = a.clone();
        b.children.reverse();
        assert!(a.structure_eq(&a.clone()));
        assert!(!a.structure_eq(&b));
    }

    #[test]
    fn test_header_declares_enum() {
        assert!(header_declares_enum(&words(0, "enum days")));
        assert!(header_declares_enum(&words(0, "typedef enum")));
        assert!(!header_declares_enum(&words(0, "typedef struct")));
        assert!(!header_declares_enum(&words(0, "struct enumeration")));
    }

    #[test]
    fn test_primary_name() {
        let group = AliasGroup {
            keyword: AggregateKeyword::Struct,
            head: words(0, "struct point"),
            aliases: vec![],
            bases: vec![],
            conflict: false,
        };
        assert_eq!(group.primary_name(), Some("point"));

        let anonymous = AliasGroup {
            head: words(0, "typedef struct"),
            keyword: AggregateKeyword::Typedef,
            ..group
        };
        assert_eq!(anonymous.primary_name(), None);
    }
}
