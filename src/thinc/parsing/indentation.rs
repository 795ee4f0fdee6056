//! Indentation-notation parser
//!
//!     Works over logical lines whose levels were fixed by indentation measurement. A line
//!     whose last token is a top-level `:` is a header; the lines after it that sit deeper
//!     form its body, which ends at the first line back at the header's level or above.
//!
//! Headers without a body
//!
//!     A header followed by a line at its own level has no body. That is legal for a
//!     `case`/`default`/access label (an empty section, regrouped with its siblings later)
//!     and for a lone identifier (a goto label). Anything else is `expected-block`.
//!
//! Unexpected depth
//!
//!     A line deeper than the current body is only legal right after a header, or while an
//!     earlier line still has an unclosed `(`, `[` or `{`: then it continues that line and
//!     keeps its extra depth. Otherwise it is `unexpected-indent`.
//!
//! Closing blocks
//!
//!     Dedenting closes blocks innermost first. Each closed block gets a synthetic closer id
//!     minted after the last token of its body, so comments that sat between the body and
//!     the dedent can be re-anchored to the block they visually belong to.
//!
//!     A lone `;` as the whole body of a non-section block marks an empty body.
//!
//!     A single comment written right after a body at its header's level is that block's
//!     closer comment (`} // end` in brace notation) when nothing else can claim it: it
//!     is followed by the end of the file, a blank line, or an `else`/`catch` header.
//!
//! Twin headers
//!
//!     A header with no body followed by `#else` or `#elif` is the first of two headers
//!     sharing one body across conditional branches. It is kept as a header line and the
//!     next block to open is flagged `preprocessor` with it.

use std::collections::HashMap;

use super::ir::{Block, Line, LineKind, Node, Tree};
use super::is_alternative_branch;
use super::sections::regroup_sections;
use crate::thinc::ast::Diagnostic;
use crate::thinc::classify::is_section_label;
use crate::thinc::lexing::{Scan, SourceLine};
use crate::thinc::token::{
    AmbiguityReason, Anchor, Comment, IndentUnit, Placement, RawToken, Token, TokenId,
};

struct Open {
    block: Block,
    body_level: usize,
}

struct PendingHeader {
    block: Block,
    level: usize,
}

impl PendingHeader {
    /// Sections and goto labels are complete without a body.
    fn is_label(&self) -> bool {
        self.block.section || matches!(self.block.header.as_slice(), [only] if only.is_identifier())
    }
}

pub struct IndentationParser<'a> {
    scan: &'a Scan,
    unit: IndentUnit,
    root: Open,
    stack: Vec<Open>,
    pending: Option<PendingHeader>,
    /// Unclosed brackets carried over from earlier statement lines in the current body.
    balance: usize,
    last_token: Option<TokenId>,
    comments: Vec<Comment>,
    /// Standalone comments waiting on the token they precede.
    standalone: HashMap<TokenId, Vec<usize>>,
    trailing_eof: Vec<usize>,
    /// A twin header line was written; the next block to open shares its body.
    twin: bool,
}

impl<'a> IndentationParser<'a> {
    pub fn new(scan: &'a Scan) -> Self {
        let comments = scan.comments.clone();
        let mut standalone: HashMap<TokenId, Vec<usize>> = HashMap::new();
        let mut trailing_eof = Vec::new();
        for (index, comment) in comments.iter().enumerate() {
            if comment.placement != Placement::Standalone {
                continue;
            }
            match comment.anchor {
                Anchor::Token(id) => standalone.entry(id).or_default().push(index),
                Anchor::EndOfFile => trailing_eof.push(index),
            }
        }

        Self {
            scan,
            unit: scan.unit.unwrap_or_default(),
            root: Open {
                block: Block::root(),
                body_level: 0,
            },
            stack: Vec::new(),
            pending: None,
            balance: 0,
            last_token: None,
            comments,
            standalone,
            trailing_eof,
            twin: false,
        }
    }

    pub fn parse(mut self) -> Result<(Block, Vec<Comment>), Diagnostic> {
        let scan = self.scan;
        let lines = &scan.lines[..];
        for (position, line) in lines.iter().enumerate() {
            if line.is_directive {
                let next_level = lines[position + 1..]
                    .iter()
                    .find(|l| !l.is_directive)
                    .map(|l| l.level);
                self.directive(line, next_level)?;
            } else {
                self.code_line(line)?;
            }
        }
        self.finish()
    }

    fn top(&mut self) -> &mut Open {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    fn body_level(&self) -> usize {
        self.stack.last().map_or(self.root.body_level, |open| open.body_level)
    }

    fn push_node(&mut self, node: Node) {
        self.top().block.children.push(node);
    }

    fn code_line(&mut self, line: &SourceLine) -> Result<(), Diagnostic> {
        let scan = self.scan;
        let tokens = scan.line_tokens(line);
        let level = line.level;

        if self.balance > 0 && level >= self.body_level() && self.pending.is_none() {
            let mut continuation = statement_line(tokens);
            continuation.extra_indent = level - self.body_level();
            self.balance = carry_balance(self.balance, tokens);
            self.finish_line(tokens, Node::Line(continuation));
            return Ok(());
        }

        self.resolve_pending(level, tokens.first())?;
        self.dedent_to(level, tokens.first())?;

        if level > self.body_level() {
            return Err(Diagnostic::parse(
                line.indent_range.clone(),
                "unexpected indentation; only a header ending in ':' opens a block",
            )
            .with_code("unexpected-indent"));
        }

        if let Some((colon, header)) = tokens.split_last() {
            if colon.is(RawToken::Colon) && carry_balance(0, tokens) == 0 {
                let mut block = Block::new(header.to_vec(), Some(colon.clone()));
                block.section = is_section_label(&block.header);
                self.pending = Some(PendingHeader { block, level });
                self.last_token = Some(colon.id);
                return Ok(());
            }
        }

        self.balance = carry_balance(0, tokens);
        self.finish_line(tokens, Node::Line(statement_line(tokens)));
        Ok(())
    }

    fn finish_line(&mut self, tokens: &[Token], node: Node) {
        self.push_node(node);
        if let Some(last) = tokens.last() {
            self.last_token = Some(last.id);
        }
    }

    fn directive(&mut self, line: &SourceLine, next_level: Option<usize>) -> Result<(), Diagnostic> {
        let scan = self.scan;
        let tokens = scan.line_tokens(line);
        let next = next_level.unwrap_or(0);

        let alternative = tokens.first().is_some_and(is_alternative_branch);
        let pending = self.pending.as_ref().map(|p| (p.level, p.is_label()));
        match pending {
            Some((header_level, _)) if next > header_level => self.open_pending(next),
            Some((_, false)) if alternative => self.write_twin_header(),
            Some(_) => self.resolve_pending(next, tokens.first())?,
            None => {}
        }

        let own = if line.indent.is_empty() { next } else { line.level };
        let level = own.max(next).min(self.body_level());
        self.dedent_to(level, tokens.first())?;
        self.finish_line(
            tokens,
            Node::Line(Line::new(LineKind::Directive, tokens.to_vec())),
        );
        Ok(())
    }

    fn open_pending(&mut self, body_level: usize) {
        if let Some(pending) = self.pending.take() {
            let mut block = pending.block;
            if std::mem::take(&mut self.twin) {
                block.ambiguity = Some(AmbiguityReason::Preprocessor);
            }
            self.balance = 0;
            self.stack.push(Open { block, body_level });
        }
    }

    fn write_twin_header(&mut self) {
        let Some(PendingHeader { block, .. }) = self.pending.take() else {
            return;
        };
        tracing::debug!(
            line = block.range().start.line + 1,
            "header shares its body with the next branch"
        );
        let mut header = Line::new(LineKind::Header, block.header);
        header.opener = block.opener;
        header.ambiguity = Some(AmbiguityReason::Preprocessor);
        self.push_node(Node::Line(header));
        self.twin = true;
    }

    /// Settle a waiting header once the next line's level is known.
    fn resolve_pending(&mut self, level: usize, next: Option<&Token>) -> Result<(), Diagnostic> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        if level > pending.level {
            self.pending = Some(pending);
            self.open_pending(level);
            return Ok(());
        }

        let is_label = pending.is_label();
        let PendingHeader { block, .. } = pending;
        if block.section {
            self.push_node(Node::Block(block));
            return Ok(());
        }
        if is_label {
            let mut tokens = block.header;
            tokens.extend(block.opener);
            self.push_node(Node::Line(Line::new(LineKind::Label, tokens)));
            return Ok(());
        }

        let found = next.map_or("end of file".to_string(), |t| format!("'{}'", t.text));
        Err(Diagnostic::parse(
            block.range(),
            format!("expected an indented block after ':', found {}", found),
        )
        .with_code("expected-block"))
    }

    /// Close every block whose body is deeper than `level`.
    fn dedent_to(&mut self, level: usize, trigger: Option<&Token>) -> Result<(), Diagnostic> {
        let mut closed: Vec<(TokenId, usize)> = Vec::new();
        let mut ordinal: u16 = 0;
        while self.stack.last().is_some_and(|open| open.body_level > level) {
            let Some(open) = self.stack.pop() else { break };
            let mut block = open.block;
            if !block.section {
                ordinal += 1;
                let last = self.last_token.unwrap_or(TokenId::real(0));
                let closer = TokenId::synthetic_after(last, ordinal);
                block.closer = Some(closer);
                closed.push((closer, open.body_level));
            }
            block.children = regroup_sections(std::mem::take(&mut block.children));
            if !block.section && is_empty_body_marker(&block.children) {
                block.children.clear();
            }
            self.balance = 0;
            self.push_node(Node::Block(block));
        }

        if !closed.is_empty() {
            self.rebind_comments(trigger, &closed);
        }
        Ok(())
    }

    fn rebind_comments(&mut self, trigger: Option<&Token>, closed: &[(TokenId, usize)]) {
        let waiting = match trigger {
            Some(token) => self.standalone.remove(&token.id).unwrap_or_default(),
            None => std::mem::take(&mut self.trailing_eof),
        };
        let mut unclaimed = Vec::new();
        for index in waiting {
            let comment = &mut self.comments[index];
            let level = self.unit.levels_in(&comment.indent);
            let target = closed
                .iter()
                .filter(|(_, body_level)| *body_level <= level)
                .max_by_key(|(_, body_level)| *body_level);
            match target {
                Some((closer, _)) => comment.anchor = Anchor::Token(*closer),
                None => unclaimed.push(index),
            }
        }

        let ends_group = trigger.map_or(true, |token| {
            token.blank_before || token.is_word("else") || token.is_word("catch")
        });
        if let [index] = unclaimed[..] {
            let comment = &self.comments[index];
            let level = self.unit.levels_in(&comment.indent);
            let closer = closed
                .iter()
                .find(|(_, body_level)| *body_level == level + 1)
                .map(|(closer, _)| *closer);
            if let Some(closer) = closer.filter(|_| ends_group && !comment.blank_before) {
                let comment = &mut self.comments[index];
                comment.anchor = Anchor::Token(closer);
                comment.placement = Placement::Trailing;
                unclaimed.clear();
            }
        }
        if trigger.is_none() {
            self.trailing_eof = unclaimed;
        }
    }

    fn finish(mut self) -> Result<(Block, Vec<Comment>), Diagnostic> {
        self.resolve_pending(0, None)?;
        self.dedent_to(0, None)?;
        let mut root = self.root.block;
        root.children = regroup_sections(root.children);
        Ok((root, self.comments))
    }
}

fn is_empty_body_marker(children: &[Node]) -> bool {
    matches!(children, [Node::Line(line)] if line.kind == LineKind::Empty)
}

/// Split a trailing `;` off into the line's terminator.
fn statement_line(tokens: &[Token]) -> Line {
    match tokens.split_last() {
        Some((last, rest)) if last.is(RawToken::Semicolon) => {
            Line::statement(rest.to_vec(), Some(last.clone()))
        }
        _ => Line::statement(tokens.to_vec(), None),
    }
}

pub(crate) fn carry_balance(balance: usize, tokens: &[Token]) -> usize {
    tokens.iter().fold(balance, |depth, token| {
        if token.raw.is_opening() {
            depth + 1
        } else if token.raw.is_closing() {
            depth.saturating_sub(1)
        } else {
            depth
        }
    })
}

pub fn parse_indentation(scan: &Scan) -> Result<Tree, Diagnostic> {
    let (root, comments) = IndentationParser::new(scan).parse()?;
    Ok(Tree {
        root,
        comments,
        markers: scan.markers.clone(),
        notation: scan.notation,
        unit: scan.unit,
    })
}
