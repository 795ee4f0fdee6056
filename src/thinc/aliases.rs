//! Alias resolution
//!
//!     Aggregate declarations name their instances in different places in the two
//!     notations:
//!
//!         brace        struct point { ... } origin, *cursor;
//!         indentation  struct point, origin, *cursor:
//!
//!     This stage fills each aggregate's [`AliasGroup`] from whichever form the source used,
//!     so the emitter can write either. Splitting happens at top-level commas only, and the
//!     base clause (`: public Geometry`) always stays behind the aliases.
//!
//! Conflicts
//!
//!     A group without an identifier, a repeated alias, an alias equal to the type's own
//!     name (except for typedefs) and an alias already declared by an earlier sibling
//!     aggregate are reported as AliasConflict warnings. An indentation header with a
//!     conflict is then kept verbatim and declares no instance; brace trailers still move.

use std::collections::HashSet;

use crate::thinc::ast::{Diagnostic, DiagnosticList, Range};
use crate::thinc::classify::skip_template_prefix;
use crate::thinc::parsing::ir::{AggregateKeyword, Alias, Block, BlockKind, Node, Tree};
use crate::thinc::token::{Notation, RawToken, Token};

pub fn resolve_aliases(tree: &mut Tree) -> DiagnosticList {
    let mut warnings = DiagnosticList::new();
    resolve_scope(&mut tree.root, tree.notation, &mut warnings);
    tracing::debug!(
        stage = "aliases",
        conflicts = warnings.len(),
        "resolved alias lists"
    );
    warnings
}

fn resolve_scope(scope: &mut Block, notation: Notation, warnings: &mut DiagnosticList) {
    let mut declared: HashSet<String> = HashSet::new();
    for child in &mut scope.children {
        let Node::Block(block) = child else { continue };
        if matches!(block.kind, BlockKind::Aggregate(_)) {
            resolve_block(block, notation, &mut declared, warnings);
        }
        resolve_scope(block, notation, warnings);
    }
}

fn resolve_block(
    block: &mut Block,
    notation: Notation,
    declared: &mut HashSet<String>,
    warnings: &mut DiagnosticList,
) {
    let (head, aliases, bases) = match notation {
        Notation::Brace => {
            let (head, bases) = split_bases(&block.header);
            (head, split_groups(std::mem::take(&mut block.tail)), bases)
        }
        Notation::Indentation => {
            let (front, bases) = split_bases(&block.header);
            let (head, rest) = split_first_group(front);
            (head, split_groups(rest), bases)
        }
    };

    let BlockKind::Aggregate(group) = &mut block.kind else {
        return;
    };
    group.head = head;
    group.aliases = aliases;
    group.bases = bases;

    let primary = group.primary_name().map(str::to_string);
    let mut conflicts = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for alias in &group.aliases {
        let range = alias_range(alias, &block.header);
        let Some(name) = alias.name() else {
            conflicts.push(Diagnostic::alias_conflict(
                range,
                "malformed alias list: a group names no identifier",
            ));
            continue;
        };
        if !seen.insert(name) {
            conflicts.push(Diagnostic::alias_conflict(
                range,
                format!("alias '{}' is listed twice", name),
            ));
        } else if primary.as_deref() == Some(name) && group.keyword != AggregateKeyword::Typedef {
            conflicts.push(Diagnostic::alias_conflict(
                range,
                format!("alias '{}' repeats the type's own name", name),
            ));
        } else if declared.contains(name) {
            conflicts.push(Diagnostic::alias_conflict(
                range,
                format!("alias '{}' is already declared in this scope", name),
            ));
        }
    }

    declared.extend(primary);
    declared.extend(
        group
            .aliases
            .iter()
            .filter_map(|alias| alias.name().map(str::to_string)),
    );

    if conflicts.is_empty() {
        return;
    }
    for conflict in &conflicts {
        tracing::warn!(
            line = conflict.range.start.line + 1,
            reason = %conflict.message,
            "alias conflict"
        );
    }
    group.conflict = true;
    if notation == Notation::Indentation {
        group.head = block.header.clone();
        group.aliases.clear();
        group.bases.clear();
    }
    warnings.extend(DiagnosticList::from(conflicts));
}

fn alias_range(alias: &Alias, header: &[Token]) -> Range {
    Range::bounding_box(alias.tokens.iter().chain(alias.separator.iter()).map(|t| &t.range))
        .or_else(|| Range::bounding_box(header.iter().map(|t| &t.range)))
        .unwrap_or_default()
}

/// Split off the base clause at the first top-level `:` after any template prefix.
fn split_bases(header: &[Token]) -> (Vec<Token>, Vec<Token>) {
    let start = skip_template_prefix(header);
    let mut depth = 0usize;
    for (index, token) in header.iter().enumerate().skip(start) {
        match token.raw {
            raw if raw.is_opening() => depth += 1,
            raw if raw.is_closing() => depth = depth.saturating_sub(1),
            RawToken::Colon if depth == 0 => {
                return (header[..index].to_vec(), header[index..].to_vec());
            }
            _ => {}
        }
    }
    (header.to_vec(), Vec::new())
}

/// Everything before the first top-level comma, and the comma-led rest.
fn split_first_group(tokens: Vec<Token>) -> (Vec<Token>, Vec<Token>) {
    let start = skip_template_prefix(&tokens);
    let mut depth = 0usize;
    let mut cut = None;
    for (index, token) in tokens.iter().enumerate().skip(start) {
        match token.raw {
            raw if raw.is_opening() => depth += 1,
            raw if raw.is_closing() => depth = depth.saturating_sub(1),
            RawToken::Comma if depth == 0 => {
                cut = Some(index);
                break;
            }
            _ => {}
        }
    }
    match cut {
        Some(index) => {
            let mut head = tokens;
            let rest = head.split_off(index);
            (head, rest)
        }
        None => (tokens, Vec::new()),
    }
}

/// Top-level comma groups; each comma becomes the separator of the group after it.
fn split_groups(tokens: Vec<Token>) -> Vec<Alias> {
    let mut groups = Vec::new();
    let mut separator = None;
    let mut current = Vec::new();
    let mut started = false;
    let mut depth = 0usize;
    for token in tokens {
        match token.raw {
            RawToken::Comma if depth == 0 => {
                if started {
                    groups.push(Alias {
                        separator: separator.take(),
                        tokens: std::mem::take(&mut current),
                    });
                }
                separator = Some(token);
                started = true;
                continue;
            }
            raw if raw.is_opening() => depth += 1,
            raw if raw.is_closing() => depth = depth.saturating_sub(1),
            _ => {}
        }
        started = true;
        current.push(token);
    }
    if started {
        groups.push(Alias {
            separator,
            tokens: current,
        });
    }
    groups
}
