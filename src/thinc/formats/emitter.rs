//! Emitter
//!
//!     Serializes a block tree in either notation. Emission runs in three passes:
//!
//!         1. Layout. The tree is walked into output lines made of pieces. Each piece
//!            remembers the id of the source token it stands for; delimiters written in
//!            place of the other notation's carry their counterpart's id (`{` and the
//!            header `:`, `}` and the synthetic closer). An inserted `;` has no id.
//!         2. Comment placement. Every comment goes back to the piece carrying its anchor.
//!            A missing anchor falls back to the nearest id present in the output: the
//!            one before it for leading and trailing comments, the one after it for
//!            standalone ones.
//!         3. Rendering. Pieces are joined with the source spacing, indentation is written
//!            in the configured unit, and physical breaks inside a logical line are kept
//!            at their source depth relative to the line's first token.
//!
//! Notation forms
//!
//!     brace                          indentation
//!     header {  ...  }               header:  ...
//!     {  ...  }                      :  ...
//!     struct s : base { ... } a, b;  struct s, a, b : base:
//!     do { ... } while (c);          do while (c):
//!     header { }                     header:  ;
//!     case 1:  ...                   case 1:  ...
//!     } else {                       else:
//!
//!     In indentation output a closing brace has no text of its own. Its comments are
//!     written at body depth on a placeholder line, which disappears when it holds none;
//!     a comment trailing the `}` goes right after the body at the header's depth, and
//!     an `else` after such a `}` is not cuddled in brace output.
//!
//!     A line comment inside a continued line is written before the ` \` that continues
//!     it. Goto labels sit in column 0 in brace output.

use std::collections::{BTreeMap, HashSet};

use crate::thinc::parsing::ir::{Block, BlockKind, Ending, Line, LineKind, Node, Tree};
use crate::thinc::token::{
    AmbiguityReason, Anchor, Comment, IndentUnit, Notation, Placement, RawToken, Token, TokenId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    pub indent: IndentUnit,
    pub cuddle_else: bool,
    pub annotate_ambiguity: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            indent: IndentUnit::default(),
            cuddle_else: true,
            annotate_ambiguity: true,
        }
    }
}

pub fn emit(tree: &Tree, target: Notation, options: &EmitOptions) -> String {
    let mut layout = Layout::new(target, options, tree);
    layout.children(&tree.root.children, 0);
    layout.place_comments(&tree.comments);
    let output = layout.render();
    tracing::debug!(
        stage = "emit",
        %target,
        bytes = output.len(),
        comments = tree.comments.len(),
        "emitted output"
    );
    output
}

#[derive(Debug, Clone)]
struct Piece {
    text: String,
    id: Option<TokenId>,
    space_before: bool,
    break_before: bool,
    /// Source column, for continuation lines.
    column: Option<usize>,
    leading: Vec<String>,
    trailing: Vec<String>,
    /// Line comments, written at the end of the physical line.
    line_end: Vec<String>,
}

impl Piece {
    fn token(token: &Token) -> Self {
        Self {
            text: token.text.clone(),
            id: Some(token.id),
            space_before: token.space_before,
            break_before: token.newline_before,
            column: Some(token.range.start.column),
            leading: Vec::new(),
            trailing: Vec::new(),
            line_end: Vec::new(),
        }
    }

    fn synthetic(text: &str, id: Option<TokenId>, space_before: bool) -> Self {
        Self {
            text: text.to_string(),
            id,
            space_before,
            break_before: false,
            column: None,
            leading: Vec::new(),
            trailing: Vec::new(),
            line_end: Vec::new(),
        }
    }

    /// Joined to the preceding piece on the same physical line.
    fn joined(mut self, space_before: bool) -> Self {
        self.break_before = false;
        self.space_before = space_before;
        self
    }

    fn is_inserted_terminator(&self) -> bool {
        self.id.is_none() && self.text == ";"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Code,
    Directive,
    /// A goto label.
    Label,
    /// A `}` line in brace output.
    Closer,
    /// Where a `}` would be in indentation output; holds comments only.
    Placeholder,
}

#[derive(Debug)]
struct OutLine {
    depth: usize,
    role: Role,
    pieces: Vec<Piece>,
    blank_before: bool,
    marker: Option<AmbiguityReason>,
    /// Standalone comments written above the line.
    above: Vec<(String, bool)>,
    /// Comments trailing the `}` of a placeholder, written at the header's depth.
    after: Vec<String>,
    /// Id held by a placeholder line.
    anchor: Option<TokenId>,
}

impl OutLine {
    fn new(depth: usize, role: Role) -> Self {
        Self {
            depth,
            role,
            pieces: Vec::new(),
            blank_before: false,
            marker: None,
            above: Vec::new(),
            after: Vec::new(),
            anchor: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Found {
    Exact,
    Earlier,
    Later,
}

struct Layout<'a> {
    target: Notation,
    options: &'a EmitOptions,
    /// Source columns per indentation level.
    width: usize,
    /// Tokens followed by a line comment on their line.
    line_commented: HashSet<TokenId>,
    lines: Vec<OutLine>,
    eof: Vec<(String, bool)>,
}

impl<'a> Layout<'a> {
    fn new(target: Notation, options: &'a EmitOptions, tree: &Tree) -> Self {
        let line_commented = tree
            .comments
            .iter()
            .filter(|comment| comment.placement == Placement::Trailing && comment.is_line_comment())
            .filter_map(|comment| match comment.anchor {
                Anchor::Token(id) => Some(id),
                Anchor::EndOfFile => None,
            })
            .collect();
        Self {
            target,
            options,
            width: source_width(tree, options.indent),
            line_commented,
            lines: Vec::new(),
            eof: Vec::new(),
        }
    }

    fn marker(&self, ambiguity: Option<AmbiguityReason>) -> Option<AmbiguityReason> {
        ambiguity.filter(|_| self.options.annotate_ambiguity)
    }

    fn children(&mut self, nodes: &[Node], depth: usize) {
        for node in nodes {
            match node {
                Node::Line(line) => self.line(line, depth),
                Node::Block(block) if block.section => self.section(block, depth),
                Node::Block(block) => match self.target {
                    Notation::Brace => self.brace_block(block, depth),
                    Notation::Indentation => self.indented_block(block, depth),
                },
            }
        }
    }

    fn line(&mut self, line: &Line, depth: usize) {
        let role = match line.kind {
            LineKind::Directive => Role::Directive,
            LineKind::Label => Role::Label,
            _ => Role::Code,
        };
        let mut out = OutLine::new(depth + line.extra_indent, role);
        out.blank_before = line.first_token().is_some_and(|t| t.blank_before);
        out.marker = self.marker(line.ambiguity);
        out.pieces.extend(line.tokens.iter().map(Piece::token));
        if line.kind == LineKind::Header {
            out.pieces.push(self.opener(line.opener.as_ref()));
        }

        let terminator = line.terminator.as_ref().map(Piece::token);
        match (line.kind, line.ending) {
            (LineKind::Empty, _) | (_, Ending::Terminated) => out
                .pieces
                .push(terminator.unwrap_or_else(|| Piece::synthetic(";", None, false))),
            (_, Ending::AsWritten) => out.pieces.extend(terminator),
            (_, Ending::Bare) => {}
        }
        self.lines.push(out);
    }

    /// A label block: `case 1:` with its body one level deeper, in both notations.
    fn section(&mut self, block: &Block, depth: usize) {
        let mut out = OutLine::new(depth, Role::Code);
        out.blank_before = block.first_token().is_some_and(|t| t.blank_before);
        out.marker = self.marker(block.ambiguity);
        out.pieces.extend(block.header.iter().map(Piece::token));
        out.pieces.extend(block.opener.iter().map(|colon| Piece::token(colon).joined(false)));
        self.lines.push(out);
        self.children(&block.children, depth + 1);
    }

    fn header(&self, block: &Block) -> Vec<Piece> {
        let mut pieces = Vec::new();
        match &block.kind {
            BlockKind::Aggregate(group) => {
                pieces.extend(group.head.iter().map(Piece::token));
                if self.target == Notation::Indentation {
                    for alias in &group.aliases {
                        pieces.push(match &alias.separator {
                            Some(comma) => Piece::token(comma).joined(false),
                            None => Piece::synthetic(",", None, false),
                        });
                        pieces.extend(relocated(&alias.tokens));
                    }
                }
                pieces.extend(group.bases.iter().map(Piece::token));
            }
            BlockKind::DoWhile(do_while) if self.target == Notation::Indentation => {
                pieces.extend(block.header.iter().map(Piece::token));
                pieces.extend(relocated(&do_while.clause));
            }
            _ => pieces.extend(block.header.iter().map(Piece::token)),
        }
        pieces.push(self.opener(block.opener.as_ref()));
        pieces
    }

    fn opener(&self, opener: Option<&Token>) -> Piece {
        let id = opener.map(|t| t.id);
        match (self.target, opener) {
            (Notation::Brace, Some(brace)) if brace.is(RawToken::OpenBrace) => {
                Piece::token(brace).joined(true)
            }
            (Notation::Brace, _) => Piece::synthetic("{", id, true),
            (Notation::Indentation, Some(colon)) if colon.is(RawToken::Colon) => {
                Piece::token(colon).joined(false)
            }
            (Notation::Indentation, _) => Piece::synthetic(":", id, false),
        }
    }

    fn terminator(block: &Block) -> Piece {
        match &block.terminator {
            Some(semicolon) => Piece::token(semicolon).joined(false),
            None => Piece::synthetic(";", None, false),
        }
    }

    fn brace_block(&mut self, block: &Block, depth: usize) {
        let mut header = self.header(block);
        let marker = self.marker(block.ambiguity);

        let line_commented = &self.line_commented;
        let cuddled = match self.lines.last_mut() {
            Some(previous)
                if self.options.cuddle_else
                    && continues_previous(block, previous, depth, line_commented) =>
            {
                if let Some(first) = header.first_mut() {
                    first.break_before = false;
                    first.space_before = true;
                }
                previous.pieces.append(&mut header);
                previous.marker = marker;
                true
            }
            _ => false,
        };
        if !cuddled {
            let mut out = OutLine::new(depth, Role::Code);
            out.blank_before = block.first_token().is_some_and(|t| t.blank_before);
            out.marker = marker;
            out.pieces = header;
            self.lines.push(out);
        }

        self.children(&block.children, depth + 1);

        let mut close = OutLine::new(depth, Role::Closer);
        close.pieces.push(Piece::synthetic("}", block.closer, false));
        match &block.kind {
            BlockKind::Aggregate(group) => {
                for (index, alias) in group.aliases.iter().enumerate() {
                    if index > 0 {
                        close.pieces.push(match &alias.separator {
                            Some(comma) => Piece::token(comma).joined(false),
                            None => Piece::synthetic(",", None, false),
                        });
                    }
                    close.pieces.extend(relocated(&alias.tokens));
                }
                close.pieces.push(Self::terminator(block));
            }
            BlockKind::DoWhile(do_while) => {
                close.pieces.extend(relocated(&do_while.clause));
                close.pieces.push(Self::terminator(block));
            }
            _ => {}
        }
        self.lines.push(close);
    }

    fn indented_block(&mut self, block: &Block, depth: usize) {
        let mut out = OutLine::new(depth, Role::Code);
        out.blank_before = block.first_token().is_some_and(|t| t.blank_before);
        out.marker = self.marker(block.ambiguity);
        out.pieces = self.header(block);
        self.lines.push(out);

        if block.children.is_empty() {
            let mut empty = OutLine::new(depth + 1, Role::Code);
            empty.pieces.push(Piece::synthetic(";", None, false));
            self.lines.push(empty);
        } else {
            self.children(&block.children, depth + 1);
        }

        if let Some(closer) = block.closer {
            let mut placeholder = OutLine::new(depth + 1, Role::Placeholder);
            placeholder.anchor = Some(closer);
            self.lines.push(placeholder);
        }
    }

    fn place_comments(&mut self, comments: &[Comment]) {
        let mut slots: BTreeMap<TokenId, (usize, Option<usize>)> = BTreeMap::new();
        for (line_index, line) in self.lines.iter().enumerate() {
            if let Some(id) = line.anchor {
                slots.insert(id, (line_index, None));
            }
            for (piece_index, piece) in line.pieces.iter().enumerate() {
                if let Some(id) = piece.id {
                    slots.entry(id).or_insert((line_index, Some(piece_index)));
                }
            }
        }

        for comment in comments {
            let found = match comment.anchor {
                Anchor::Token(id) => lookup(&slots, id, comment.placement),
                Anchor::EndOfFile => None,
            };
            match found {
                Some((slot, how)) => self.attach(comment, slot, how),
                None => self.eof.push((comment.text.clone(), comment.blank_before)),
            }
        }
    }

    fn attach(&mut self, comment: &Comment, (line, piece): (usize, Option<usize>), how: Found) {
        let text = comment.text.clone();
        let out = &mut self.lines[line];
        let piece = match piece {
            Some(index) if out.role != Role::Placeholder => &mut out.pieces[index],
            _ if out.role == Role::Placeholder && comment.placement == Placement::Trailing => {
                out.after.push(text);
                return;
            }
            _ => {
                out.above.push((text, comment.blank_before));
                return;
            }
        };

        match (comment.placement, how) {
            (Placement::Standalone, _) => out.above.push((text, comment.blank_before)),
            (Placement::Leading, Found::Earlier) | (Placement::Trailing, Found::Exact | Found::Earlier) => {
                if comment.is_line_comment() {
                    piece.line_end.push(text);
                } else {
                    piece.trailing.push(text);
                }
            }
            (Placement::Trailing, Found::Later) if comment.is_line_comment() => {
                out.above.push((text, comment.blank_before))
            }
            (Placement::Leading | Placement::Trailing, _) => piece.leading.push(text),
        }
    }

    fn render(self) -> String {
        let unit = self.options.indent;
        let mut out = String::new();
        for line in &self.lines {
            let comment_depth = match line.role {
                Role::Closer => line.depth + 1,
                _ => line.depth,
            };
            for (text, blank_before) in &line.above {
                if *blank_before {
                    blank_line(&mut out);
                }
                out.push_str(&unit.render(comment_depth));
                out.push_str(text);
                out.push('\n');
            }
            if line.role == Role::Placeholder {
                for text in &line.after {
                    out.push_str(&unit.render(line.depth.saturating_sub(1)));
                    out.push_str(text);
                    out.push('\n');
                }
                continue;
            }
            if line.blank_before {
                blank_line(&mut out);
            }
            self.render_code(line, &mut out);
        }
        for (text, blank_before) in &self.eof {
            if *blank_before {
                blank_line(&mut out);
            }
            out.push_str(text);
            out.push('\n');
        }

        out.truncate(out.trim_end_matches('\n').len());
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn render_code(&self, line: &OutLine, out: &mut String) {
        let unit = self.options.indent;
        let mut text = match (line.role, self.target) {
            (Role::Directive | Role::Label, Notation::Brace) => String::new(),
            _ => unit.render(line.depth),
        };
        let base = line.pieces.iter().find_map(|piece| piece.column);
        let mut line_end: Vec<&str> = Vec::new();
        // Block comments that follow an inserted `;`
        let mut held: Vec<&str> = Vec::new();
        let last = line.pieces.len().saturating_sub(1);

        for (index, piece) in line.pieces.iter().enumerate() {
            if index > 0 {
                if piece.break_before {
                    flush_line_end(&mut text, &mut line_end);
                    match self.target {
                        Notation::Brace => text.push('\n'),
                        Notation::Indentation => text.push_str(" \\\n"),
                    }
                    let levels = match (base, piece.column) {
                        (Some(base), Some(column)) => column.saturating_sub(base) / self.width,
                        _ => 1,
                    };
                    text.push_str(&unit.render(line.depth + levels));
                } else if piece.space_before {
                    text.push(' ');
                }
            }
            for comment in &piece.leading {
                text.push_str(comment);
                text.push(' ');
            }
            text.push_str(&piece.text);
            if index == last {
                if let Some(reason) = line.marker {
                    text.push(' ');
                    text.push_str(&reason.marker());
                }
            }
            for comment in held.drain(..) {
                text.push(' ');
                text.push_str(comment);
            }
            let inserted_next = line
                .pieces
                .get(index + 1)
                .is_some_and(Piece::is_inserted_terminator);
            if inserted_next {
                held.extend(piece.trailing.iter().map(String::as_str));
            } else {
                for comment in &piece.trailing {
                    text.push(' ');
                    text.push_str(comment);
                }
            }
            line_end.extend(piece.line_end.iter().map(String::as_str));
        }
        flush_line_end(&mut text, &mut line_end);

        out.push_str(&text);
        out.push('\n');
    }
}

/// Source columns per level: the source's own unit, or the first nested body's offset in a
/// brace file.
fn source_width(tree: &Tree, fallback: IndentUnit) -> usize {
    let columns = |unit: IndentUnit| match unit {
        IndentUnit::Tab => 1,
        IndentUnit::Spaces(width) => width.max(1),
    };
    if let Some(unit) = tree.unit {
        return columns(unit);
    }
    let mut width = None;
    tree.root.walk(&mut |block| {
        if width.is_some() || block.section {
            return;
        }
        let header = block.first_token().filter(|t| t.newline_before);
        let body = block.children.iter().find_map(Node::first_token);
        if let (Some(header), Some(body)) = (header, body) {
            let (outer, inner) = (header.range.start.column, body.range.start.column);
            if body.newline_before && inner > outer {
                width = Some(inner - outer);
            }
        }
    });
    width.unwrap_or_else(|| columns(fallback))
}

/// Tokens moved to the other side of a body: first token joined to what precedes it.
fn relocated(tokens: &[Token]) -> impl Iterator<Item = Piece> + '_ {
    tokens.iter().enumerate().map(|(index, token)| {
        let piece = Piece::token(token);
        if index == 0 {
            piece.joined(true)
        } else {
            piece
        }
    })
}

/// `else`/`catch` after a sibling's `}` at the same depth, with no line comment after it.
fn continues_previous(
    block: &Block,
    previous: &OutLine,
    depth: usize,
    line_commented: &HashSet<TokenId>,
) -> bool {
    let continues = block
        .header
        .first()
        .is_some_and(|t| t.is_word("else") || t.is_word("catch"));
    let commented = previous
        .pieces
        .first()
        .and_then(|piece| piece.id)
        .is_some_and(|id| line_commented.contains(&id));
    continues
        && previous.role == Role::Closer
        && previous.depth == depth
        && previous.pieces.len() == 1
        && !commented
}

fn lookup(
    slots: &BTreeMap<TokenId, (usize, Option<usize>)>,
    id: TokenId,
    placement: Placement,
) -> Option<((usize, Option<usize>), Found)> {
    if let Some(slot) = slots.get(&id) {
        return Some((*slot, Found::Exact));
    }
    let earlier = slots.range(..id).next_back().map(|(_, slot)| (*slot, Found::Earlier));
    let later = slots.range(id..).next().map(|(_, slot)| (*slot, Found::Later));
    match placement {
        Placement::Leading | Placement::Trailing => earlier.or(later),
        Placement::Standalone => later.or(earlier),
    }
}

fn blank_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
}

fn flush_line_end(text: &mut String, pending: &mut Vec<&str>) {
    for comment in pending.drain(..) {
        text.push(' ');
        text.push_str(comment);
    }
}
