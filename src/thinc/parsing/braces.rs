//! Brace-notation parser
//!
//!     A single pass over the code tokens with a stack of open blocks. Statements end at a
//!     `;` outside any parenthesis, bracket or inline brace; blocks are delimited by the
//!     `{ }` pairs that open blocks.
//!
//! Block and inline braces
//!
//!     Not every `{` delimits a block. Initializers, lambdas and brace-init expressions are
//!     part of the statement they appear in. A `{` is inline when:
//!
//!         - it is nested inside `( )`, `[ ]` or another inline brace
//!         - it follows an operator, `,`, `(`, `[` or `return`
//!         - the statement has a top-level `=` (neither `operator=` nor a template default)
//!         - the statement has no `(` and does not start with a block keyword
//!         - its matching `}` is followed by `, ) ] . ->`, or by `{` or `(` on the same line
//!         - it is a member initializer (`b{2}` in `F() : a{1}, b{2}`), whose `}` may be
//!           followed by the constructor body on the next line
//!
//!     A line ending in an ambiguity marker ends its statement there, even inside open
//!     brackets. Such lines are written by the indentation -> brace direction, which leaves
//!     them without a terminator.
//!
//! Labels
//!
//!     A top-level `:` after `case ...`, `default` or an access keyword closes a label, which
//!     becomes an empty section block; sections absorb their statements when the body is
//!     complete (see [super::sections]). A lone identifier followed by `:` is a goto label.
//!
//! After the closing brace
//!
//!     Aggregates collect everything up to the next `;` as their alias trailer, and a do
//!     block must be followed by `while (...);`.
//!
//! Twin headers
//!
//!     `#ifdef X / if (a) { / #else / if (b) { / #endif` opens one body from two branches,
//!     which leaves a `{` unmatched. When a first pass ends that way and the source has an
//!     `#else` or `#elif`, the parse is repeated with twin headers: any block still open
//!     when a conditional switches branch becomes a header line, its body flattened after
//!     it, and the header is flagged `preprocessor`.

use std::collections::HashMap;

use super::ir::{header_declares_enum, Block, Line, LineKind, Node, Tree};
use super::sections::regroup_sections;
use super::{directive_name, is_alternative_branch, looks_like_macro};
use crate::thinc::ast::Diagnostic;
use crate::thinc::classify::{classify_header, is_section_label, skip_template_prefix, HeaderClass};
use crate::thinc::lexing::Scan;
use crate::thinc::token::{AmbiguityReason, RawToken, Token, TokenId};

const BLOCK_KEYWORDS: &[&str] = &[
    "catch", "class", "do", "else", "enum", "extern", "for", "if", "namespace", "struct",
    "switch", "template", "try", "typedef", "union", "while",
];

struct Frame {
    block: Block,
    enum_body: bool,
    aggregate_body: bool,
    region: usize,
}

impl Frame {
    fn new(block: Block, region: usize) -> Self {
        let body = &block.header[skip_template_prefix(&block.header)..];
        Self {
            enum_body: header_declares_enum(body),
            aggregate_body: matches!(classify_header(&block.header), HeaderClass::Aggregate(_)),
            block,
            region,
        }
    }
}

/// Columns of a statement that marked lines split over several physical lines.
#[derive(Clone, Copy)]
struct Run {
    base: usize,
    step: Option<usize>,
}

#[derive(Default)]
struct Statement {
    tokens: Vec<Token>,
    parens: usize,
    brackets: usize,
    braces: usize,
    /// An earlier part of this statement was cut off by a directive.
    split: bool,
    run: Option<Run>,
}

impl Statement {
    fn is_balanced(&self) -> bool {
        self.parens == 0 && self.brackets == 0 && self.braces == 0
    }

    /// Levels the statement's first line sits beyond the first line of its run. The first
    /// indented line of a run fixes the width of a level.
    fn continuation_depth(&mut self) -> usize {
        let column = self.tokens.first().map_or(0, |t| t.range.start.column);
        let run = self.run.get_or_insert(Run {
            base: column,
            step: None,
        });
        let delta = column.saturating_sub(run.base);
        if delta == 0 {
            return 0;
        }
        delta / *run.step.get_or_insert(delta)
    }

    /// An empty statement that keeps this one's open brackets.
    fn carried(&self) -> Self {
        Self {
            tokens: Vec::new(),
            parens: self.parens,
            brackets: self.brackets,
            braces: self.braces,
            split: self.split,
            run: if self.is_balanced() { None } else { self.run },
        }
    }

    fn push(&mut self, token: Token) {
        match token.raw {
            RawToken::OpenParen => self.parens += 1,
            RawToken::CloseParen => self.parens = self.parens.saturating_sub(1),
            RawToken::OpenBracket => self.brackets += 1,
            RawToken::CloseBracket => self.brackets = self.brackets.saturating_sub(1),
            RawToken::OpenBrace => self.braces += 1,
            RawToken::CloseBrace => self.braces = self.braces.saturating_sub(1),
            _ => {}
        }
        self.tokens.push(token);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TailKind {
    Aggregate,
    DoWhile,
}

struct Tail {
    block: Block,
    kind: TailKind,
    depth: usize,
}

/// An open `#if` group: the branch being read and how many blocks were open at `#if`.
struct Conditional {
    region: usize,
    depth: usize,
}

pub struct BraceParser<'a> {
    tokens: &'a [Token],
    markers: &'a HashMap<TokenId, AmbiguityReason>,
    flag_macro_lines: bool,
    twin_headers: bool,
    root: Frame,
    frames: Vec<Frame>,
    statement: Statement,
    tail: Option<Tail>,
    /// Innermost last.
    conditionals: Vec<Conditional>,
    next_region: usize,
}

impl<'a> BraceParser<'a> {
    pub fn new(
        tokens: &'a [Token],
        markers: &'a HashMap<TokenId, AmbiguityReason>,
        flag_macro_lines: bool,
    ) -> Self {
        Self {
            tokens,
            markers,
            flag_macro_lines,
            twin_headers: false,
            root: Frame::new(Block::root(), 0),
            frames: Vec::new(),
            statement: Statement::default(),
            tail: None,
            conditionals: Vec::new(),
            next_region: 1,
        }
    }

    /// Fold blocks left open by a conditional's branch into header lines.
    pub fn with_twin_headers(mut self) -> Self {
        self.twin_headers = true;
        self
    }

    pub fn parse(mut self) -> Result<Block, Diagnostic> {
        let tokens = self.tokens;
        for (index, token) in tokens.iter().enumerate() {
            if self.tail.is_some() && self.continue_tail(token)? {
                continue;
            }
            self.split_at_line_break(token);

            match token.raw {
                RawToken::Directive => self.directive(token),
                RawToken::OpenBrace => {
                    if self.opens_block(index) {
                        self.open_block(token.clone());
                    } else {
                        self.statement.push(token.clone());
                    }
                }
                RawToken::CloseBrace if self.statement.braces > 0 => {
                    self.statement.push(token.clone())
                }
                RawToken::CloseBrace => self.close_block(token)?,
                RawToken::Semicolon if self.statement.is_balanced() => {
                    self.flush(Some(token.clone()), None)
                }
                RawToken::Colon if self.statement.is_balanced() => self.colon(token),
                _ => self.statement.push(token.clone()),
            }
            if let Some(reason) = self.markers.get(&token.id) {
                self.end_marked_line(*reason);
            }
        }
        self.finish()
    }

    fn top(&mut self) -> &mut Frame {
        self.frames.last_mut().unwrap_or(&mut self.root)
    }

    fn push_node(&mut self, node: Node) {
        self.top().block.children.push(node);
    }

    fn current_region(&self) -> usize {
        self.conditionals.last().map_or(0, |conditional| conditional.region)
    }

    fn flush(&mut self, terminator: Option<Token>, ambiguity: Option<AmbiguityReason>) {
        let mut statement = std::mem::take(&mut self.statement);
        if statement.tokens.is_empty() && terminator.is_none() {
            return;
        }
        let extra_indent = match statement.run {
            Some(_) => statement.continuation_depth(),
            None => 0,
        };
        let mut line = Line::statement(statement.tokens, terminator);
        line.ambiguity = ambiguity.or(statement.split.then_some(AmbiguityReason::Preprocessor));
        line.extra_indent = extra_indent;
        self.push_node(Node::Line(line));
    }

    fn end_marked_line(&mut self, reason: AmbiguityReason) {
        if self.statement.tokens.is_empty() {
            return;
        }
        let extra_indent = self.statement.continuation_depth();
        let carried = self.statement.carried();
        let statement = std::mem::replace(&mut self.statement, carried);
        let mut line = Line::statement(statement.tokens, None);
        line.ambiguity = Some(reason);
        line.extra_indent = extra_indent;
        self.push_node(Node::Line(line));
    }

    /// Physical line ends close enum items and bare macro invocations.
    fn split_at_line_break(&mut self, token: &Token) {
        if !token.newline_before
            || self.statement.tokens.is_empty()
            || !self.statement.is_balanced()
            || token.is(RawToken::Directive)
        {
            return;
        }
        if self.top().enum_body {
            if !token.is(RawToken::CloseBrace) {
                self.flush(None, None);
            }
            return;
        }
        if self.flag_macro_lines
            && looks_like_macro(&self.statement.tokens)
            && !continues_statement(token)
        {
            self.flush(None, Some(AmbiguityReason::Macro));
        }
    }

    fn directive(&mut self, token: &Token) {
        if !self.statement.tokens.is_empty() {
            let tokens = std::mem::take(&mut self.statement.tokens);
            let mut fragment = Line::statement(tokens, None);
            fragment.ambiguity = Some(AmbiguityReason::Preprocessor);
            self.push_node(Node::Line(fragment));
            self.statement.split = true;
        }

        match directive_name(&token.text) {
            "if" | "ifdef" | "ifndef" => {
                self.conditionals.push(Conditional {
                    region: self.next_region,
                    depth: self.frames.len(),
                });
                self.next_region += 1;
            }
            "elif" | "else" | "elifdef" | "elifndef" => {
                let depth = self
                    .conditionals
                    .pop()
                    .map_or(self.frames.len(), |conditional| conditional.depth);
                if self.twin_headers {
                    self.fold_twin_headers(depth);
                }
                self.conditionals.push(Conditional {
                    region: self.next_region,
                    depth,
                });
                self.next_region += 1;
            }
            "endif" => {
                self.conditionals.pop();
            }
            _ => {}
        }

        self.push_node(Node::Line(Line::new(LineKind::Directive, vec![token.clone()])));
    }

    /// Every block opened in the branch that just ended shares its body with the next
    /// branch's header; keep it as a header line followed by what it held so far.
    fn fold_twin_headers(&mut self, depth: usize) {
        while self.frames.len() > depth {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            tracing::debug!(
                line = frame.block.range().start.line + 1,
                "folding twin header into its branch"
            );
            let block = frame.block;
            let mut header = Line::new(LineKind::Header, block.header);
            header.opener = block.opener;
            header.ambiguity = Some(AmbiguityReason::Preprocessor);
            self.push_node(Node::Line(header));
            for child in block.children {
                self.push_node(child);
            }
        }
    }

    fn colon(&mut self, token: &Token) {
        let tokens = &self.statement.tokens;
        let is_label = match tokens.first() {
            Some(first) if first.is_word("case") => {
                let questions = tokens.iter().filter(|t| t.is_op("?")).count();
                let colons = tokens.iter().filter(|t| t.is(RawToken::Colon)).count();
                colons >= questions && is_section_label(tokens)
            }
            Some(_) => is_section_label(tokens),
            None => false,
        };

        if is_label {
            let header = std::mem::take(&mut self.statement).tokens;
            self.push_node(Node::Block(Block::section(header, token.clone())));
            return;
        }

        let frame = self.top();
        let in_declaration_body = frame.aggregate_body || frame.enum_body;
        let goto_label = !in_declaration_body
            && matches!(self.statement.tokens.as_slice(), [only] if only.is_identifier());
        if goto_label {
            let mut tokens = std::mem::take(&mut self.statement).tokens;
            tokens.push(token.clone());
            self.push_node(Node::Line(Line::new(LineKind::Label, tokens)));
            return;
        }

        self.statement.push(token.clone());
    }

    fn opens_block(&self, index: usize) -> bool {
        let statement = &self.statement;
        if !statement.is_balanced() || self.marks_initializer_line(index) {
            return false;
        }

        if let Some(previous) = statement.tokens.last() {
            let after_operator = matches!(
                previous.raw,
                RawToken::Operator | RawToken::Comma | RawToken::OpenParen | RawToken::OpenBracket
            ) || previous.is_word("return");
            if after_operator || has_top_level_assignment(&statement.tokens) {
                return false;
            }
            let has_parameters = statement.tokens.iter().any(|t| t.is(RawToken::OpenParen));
            let keyword_led = BLOCK_KEYWORDS.contains(&statement.tokens[0].text.as_str());
            if !has_parameters && !keyword_led {
                return false;
            }
        }

        !self.closing_brace_continues_expression(index)
    }

    /// The physical line of the `{` ends in an initializer marker.
    fn marks_initializer_line(&self, open: usize) -> bool {
        self.tokens[open..]
            .iter()
            .enumerate()
            .take_while(|(offset, token)| *offset == 0 || !token.newline_before)
            .any(|(_, token)| self.markers.get(&token.id) == Some(&AmbiguityReason::Initializer))
    }

    /// `b{` in `Foo::Foo() : a{1}, b{2}`.
    fn opens_member_initializer(&self) -> bool {
        let tokens = &self.statement.tokens;
        let keyword_led = tokens
            .first()
            .is_some_and(|t| BLOCK_KEYWORDS.contains(&t.text.as_str()));
        !keyword_led
            && tokens.last().is_some_and(|t| t.is_identifier())
            && tokens.iter().any(|t| t.is(RawToken::Colon))
    }

    fn closing_brace_continues_expression(&self, open: usize) -> bool {
        let member_initializer = self.opens_member_initializer();
        let mut depth = 0usize;
        for (index, token) in self.tokens.iter().enumerate().skip(open) {
            match token.raw {
                RawToken::OpenBrace => depth += 1,
                RawToken::CloseBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return self.tokens.get(index + 1).is_some_and(|next| {
                            let same_line = !next.newline_before;
                            matches!(
                                next.raw,
                                RawToken::Comma | RawToken::CloseParen | RawToken::CloseBracket
                            ) || next.is_op(".")
                                || next.is_op("->")
                                || (next.is(RawToken::OpenBrace) && (same_line || member_initializer))
                                || (next.is(RawToken::OpenParen) && same_line)
                        });
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn open_block(&mut self, brace: Token) {
        let header = std::mem::take(&mut self.statement).tokens;
        let region = self.current_region();
        self.frames
            .push(Frame::new(Block::new(header, Some(brace)), region));
    }

    fn close_block(&mut self, brace: &Token) -> Result<(), Diagnostic> {
        self.flush(None, None);
        let region = self.current_region();
        let Some(frame) = self.frames.pop() else {
            return Err(Diagnostic::parse(brace.range.clone(), "unmatched '}'")
                .with_code("unmatched-close"));
        };

        let mut block = frame.block;
        block.children = regroup_sections(std::mem::take(&mut block.children));
        block.closer = Some(brace.id);
        if frame.region != region {
            block.ambiguity = Some(AmbiguityReason::Preprocessor);
        }

        match classify_header(&block.header) {
            HeaderClass::Aggregate(_) => {
                self.tail = Some(Tail {
                    block,
                    kind: TailKind::Aggregate,
                    depth: 0,
                })
            }
            HeaderClass::DoWhile => {
                self.tail = Some(Tail {
                    block,
                    kind: TailKind::DoWhile,
                    depth: 0,
                })
            }
            _ => self.push_node(Node::Block(block)),
        }
        Ok(())
    }

    /// Feed a token to the pending trailer; returns false when the token belongs to the
    /// next statement instead.
    fn continue_tail(&mut self, token: &Token) -> Result<bool, Diagnostic> {
        let Some(mut tail) = self.tail.take() else {
            return Ok(false);
        };

        if tail.kind == TailKind::DoWhile && tail.block.tail.is_empty() && !token.is_word("while")
        {
            return Err(missing_while(&tail.block, token));
        }
        if tail.kind == TailKind::Aggregate && token.is(RawToken::Directive) {
            self.push_node(Node::Block(tail.block));
            return Ok(false);
        }

        match token.raw {
            RawToken::Semicolon if tail.depth == 0 => {
                tail.block.terminator = Some(token.clone());
                self.push_node(Node::Block(tail.block));
                return Ok(true);
            }
            raw if raw.is_opening() => tail.depth += 1,
            raw if raw.is_closing() => tail.depth = tail.depth.saturating_sub(1),
            _ => {}
        }
        tail.block.tail.push(token.clone());
        self.tail = Some(tail);
        Ok(true)
    }

    fn finish(mut self) -> Result<Block, Diagnostic> {
        if let Some(tail) = self.tail.take() {
            if tail.kind == TailKind::DoWhile {
                return Err(Diagnostic::parse(
                    tail.block.range(),
                    "do block without a `while (...);` after its body",
                )
                .with_code("missing-while"));
            }
            self.push_node(Node::Block(tail.block));
        }
        self.flush(None, None);

        if let Some(open) = self.frames.last() {
            let range = open
                .block
                .opener
                .as_ref()
                .map(|brace| brace.range.clone())
                .unwrap_or_else(|| open.block.range());
            return Err(Diagnostic::parse(range, "unmatched '{'").with_code("unmatched-open"));
        }

        let mut root = self.root.block;
        root.children = regroup_sections(root.children);
        Ok(root)
    }
}

fn missing_while(block: &Block, found: &Token) -> Diagnostic {
    Diagnostic::parse(
        found.range.clone(),
        format!(
            "expected `while (...)` after do block at {}, found '{}'",
            block.range().start,
            found.text
        ),
    )
    .with_code("missing-while")
}

fn continues_statement(token: &Token) -> bool {
    matches!(
        token.raw,
        RawToken::OpenBrace
            | RawToken::Semicolon
            | RawToken::Comma
            | RawToken::CloseParen
            | RawToken::CloseBracket
            | RawToken::Colon
            | RawToken::Scope
            | RawToken::Operator
    )
}

/// A `=` outside brackets, not part of `operator=` and not inside a template parameter list.
pub(crate) fn has_top_level_assignment(tokens: &[Token]) -> bool {
    let mut depth = 0usize;
    let start = skip_template_prefix(tokens);
    for (index, token) in tokens.iter().enumerate().skip(start) {
        match token.raw {
            raw if raw.is_opening() => depth += 1,
            raw if raw.is_closing() => depth = depth.saturating_sub(1),
            RawToken::Operator if token.text == "=" && depth == 0 => {
                let after_operator = index > 0 && tokens[index - 1].is_word("operator");
                if !after_operator {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

pub fn parse_braces(scan: &Scan, flag_macro_lines: bool) -> Result<Tree, Diagnostic> {
    let parser = || BraceParser::new(&scan.tokens, &scan.markers, flag_macro_lines);
    let root = match parser().parse() {
        Err(error)
            if error.code.as_deref() == Some("unmatched-open")
                && scan.tokens.iter().any(is_alternative_branch) =>
        {
            tracing::debug!(%error, "retrying with twin headers");
            parser().with_twin_headers().parse()?
        }
        parsed => parsed?,
    };
    Ok(Tree {
        root,
        comments: scan.comments.clone(),
        markers: scan.markers.clone(),
        notation: scan.notation,
        unit: scan.unit,
    })
}
