//! Header classification
//!
//!     Tags every block with its construct kind from the header's leading keywords. The
//!     kind drives everything downstream: aggregates go to alias resolution, do-while
//!     blocks carry their relocated condition, sections are emitted without delimiters of
//!     their own.
//!
//!         class|struct|union|enum|typedef   aggregate (no top-level parameter list)
//!         do                                do-while
//!         switch                            switch
//!         case <expr> | default             case section
//!         public|private|protected          access section
//!         anything else                     compound, with a sub-kind
//!
//!     A leading `template <...>` is skipped before the lookup.

use crate::thinc::ast::Diagnostic;
use crate::thinc::parsing::ir::{
    AggregateKeyword, AliasGroup, Block, BlockKind, Compound, DoWhile, Node, Tree,
};
use crate::thinc::token::{RawToken, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderClass {
    Aggregate(AggregateKeyword),
    DoWhile,
    Switch,
    Case,
    Access,
    Compound(Compound),
}

/// Index of the first token after a leading `template <...>`, or 0.
pub fn skip_template_prefix(tokens: &[Token]) -> usize {
    if !tokens.first().is_some_and(|t| t.is_word("template")) {
        return 0;
    }
    let mut angle = 0i32;
    let mut parens = 0i32;
    for (index, token) in tokens.iter().enumerate().skip(1) {
        match token.raw {
            RawToken::OpenParen | RawToken::OpenBracket | RawToken::OpenBrace => parens += 1,
            RawToken::CloseParen | RawToken::CloseBracket | RawToken::CloseBrace => parens -= 1,
            RawToken::Operator if parens == 0 => match token.text.as_str() {
                "<" => angle += 1,
                ">" => angle -= 1,
                ">>" => angle -= 2,
                _ => {}
            },
            _ => {}
        }
        if index > 1 && angle <= 0 && parens == 0 {
            return index + 1;
        }
    }
    tokens.len()
}

fn has_top_level_paren(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| t.is(RawToken::OpenParen))
}

fn is_access_word(token: &Token) -> bool {
    matches!(token.text.as_str(), "public" | "private" | "protected") && token.is(RawToken::Ident)
}

/// Tokens of a `case`/`default`/access label, without its colon.
pub fn is_section_label(tokens: &[Token]) -> bool {
    match tokens {
        [first, ..] if first.is_word("case") => tokens.len() > 1,
        [only] => only.is_word("default") || is_access_word(only),
        _ => false,
    }
}

pub fn classify_header(header: &[Token]) -> HeaderClass {
    let body = &header[skip_template_prefix(header)..];
    let Some(first) = body.first() else {
        return HeaderClass::Compound(Compound::Scope);
    };

    if let Some(keyword) = AggregateKeyword::from_word(&first.text) {
        if first.is(RawToken::Ident) && !has_top_level_paren(body) {
            return HeaderClass::Aggregate(keyword);
        }
    }

    match first.text.as_str() {
        "do" => return HeaderClass::DoWhile,
        "switch" => return HeaderClass::Switch,
        _ => {}
    }
    if is_section_label(body) {
        return if is_access_word(first) {
            HeaderClass::Access
        } else {
            HeaderClass::Case
        };
    }

    let compound = match first.text.as_str() {
        "if" | "else" => Compound::Conditional,
        "for" | "while" => Compound::Loop,
        "namespace" => Compound::Namespace,
        "try" | "catch" => Compound::Exception,
        "extern" => Compound::Linkage,
        _ if has_top_level_paren(body) => Compound::Function,
        _ => Compound::Other,
    };
    HeaderClass::Compound(compound)
}

/// Classification stage: assigns kinds and moves do-while conditions into their payload.
pub fn classify(mut tree: Tree) -> Result<Tree, Diagnostic> {
    classify_children(&mut tree.root)?;
    tracing::debug!(
        stage = "classify",
        blocks = tree.block_count(),
        "classified block headers"
    );
    Ok(tree)
}

fn classify_children(block: &mut Block) -> Result<(), Diagnostic> {
    for child in &mut block.children {
        if let Node::Block(inner) = child {
            classify_block(inner)?;
            classify_children(inner)?;
        }
    }
    Ok(())
}

fn classify_block(block: &mut Block) -> Result<(), Diagnostic> {
    block.kind = match classify_header(&block.header) {
        HeaderClass::Aggregate(keyword) => BlockKind::Aggregate(AliasGroup {
            keyword,
            head: block.header.clone(),
            aliases: Vec::new(),
            bases: Vec::new(),
            conflict: false,
        }),
        HeaderClass::DoWhile => BlockKind::DoWhile(relocate_condition(block)?),
        HeaderClass::Switch => BlockKind::Switch,
        HeaderClass::Case => BlockKind::Case,
        HeaderClass::Access => BlockKind::Access,
        HeaderClass::Compound(compound) => BlockKind::Compound(compound),
    };
    Ok(())
}

/// Take the `while (...)` clause from behind the body (brace) or the header (indentation).
fn relocate_condition(block: &mut Block) -> Result<DoWhile, Diagnostic> {
    let clause = if block.header.len() > 1 {
        block.header.split_off(1)
    } else {
        std::mem::take(&mut block.tail)
    };

    let well_formed = clause.first().is_some_and(|t| t.is_word("while"))
        && clause.get(1).is_some_and(|t| t.is(RawToken::OpenParen))
        && clause.last().is_some_and(|t| t.is(RawToken::CloseParen));
    if !well_formed {
        return Err(Diagnostic::parse(
            block.range(),
            "do block without a `while (...)` condition",
        )
        .with_code("missing-while"));
    }
    Ok(DoWhile { clause })
}
