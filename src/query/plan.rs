//! Trigram query compilation and candidate lookup.

use crate::error::Result;
use crate::index::types::{trigram_to_string, FileId, Trigram, TrigramIndex};
use crate::query::postings::{intersect, union};
use crate::regex::{parse, Modifier, Node};
use std::fmt;
use std::path::Path;

/// Necessary condition on a file for a pattern to match somewhere in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrigramQuery {
    /// File contains this trigram
    Trigram(Trigram),
    /// File satisfies both operands
    Concatenation(Box<TrigramQuery>, Box<TrigramQuery>),
    /// File satisfies at least one operand
    Alternation(Box<TrigramQuery>, Box<TrigramQuery>),
    /// No constraint
    Any,
}

impl TrigramQuery {
    /// Both constraints. `Any` on either side drops out.
    pub fn and(self, other: TrigramQuery) -> TrigramQuery {
        match (self, other) {
            (TrigramQuery::Any, q) | (q, TrigramQuery::Any) => q,
            (a, b) => TrigramQuery::Concatenation(Box::new(a), Box::new(b)),
        }
    }

    /// Either constraint. `Any` on either side absorbs the other.
    pub fn or(self, other: TrigramQuery) -> TrigramQuery {
        match (self, other) {
            (TrigramQuery::Any, _) | (_, TrigramQuery::Any) => TrigramQuery::Any,
            (a, b) => TrigramQuery::Alternation(Box::new(a), Box::new(b)),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TrigramQuery::Any)
    }

    /// Evaluate against `index`. The result is ascending and a superset of
    /// the files the pattern can match.
    pub fn lookup(&self, index: &TrigramIndex) -> Vec<FileId> {
        match self {
            TrigramQuery::Trigram(t) => index.postings(t).to_vec(),
            TrigramQuery::Concatenation(a, b) => intersect(&a.lookup(index), &b.lookup(index)),
            TrigramQuery::Alternation(a, b) => union(&a.lookup(index), &b.lookup(index)),
            TrigramQuery::Any => index.all_file_ids(),
        }
    }
}

impl fmt::Display for TrigramQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrigramQuery::Trigram(t) => write!(f, "{:?}", trigram_to_string(t)),
            TrigramQuery::Concatenation(a, b) => write!(f, "({a} AND {b})"),
            TrigramQuery::Alternation(a, b) => write!(f, "({a} OR {b})"),
            TrigramQuery::Any => f.write_str("*"),
        }
    }
}

/// Query for a raw literal string.
///
/// A `|` splits the string once into two alternatives. Otherwise a run
/// shorter than three code points is `Any`, exactly three is a single
/// trigram, and longer runs become the first trigram or'd with the query
/// for everything after the first code point.
pub fn compile_literal(text: &str) -> TrigramQuery {
    if let Some((left, right)) = text.split_once('|') {
        return compile_literal(left).or(compile_literal(right));
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 3 {
        return TrigramQuery::Any;
    }

    // Right fold over the windows instead of recursing once per code point
    let mut windows = chars.windows(3).rev().map(|w| [w[0], w[1], w[2]]);
    let mut query = match windows.next() {
        Some(last) => TrigramQuery::Trigram(last),
        None => return TrigramQuery::Any,
    };
    for t in windows {
        query = TrigramQuery::Alternation(Box::new(TrigramQuery::Trigram(t)), Box::new(query));
    }
    query
}

/// Query for a regex pattern
pub fn compile(pattern: &str) -> Result<TrigramQuery> {
    let ast = parse(pattern)?;
    let query = compile_node(&ast);
    tracing::debug!(pattern, query = %query, "compiled trigram query");
    Ok(query)
}

/// Query for a parsed pattern
pub fn compile_node(node: &Node) -> TrigramQuery {
    match node {
        Node::Group(children) => compile_group(children),
        Node::Branch(alternatives) => alternatives
            .iter()
            .map(compile_node)
            .reduce(TrigramQuery::or)
            .unwrap_or(TrigramQuery::Any),
        Node::Character(_) | Node::Wildcard => TrigramQuery::Any,
        Node::Modifier { modifier, child } => match modifier {
            Modifier::OneOrMany => compile_node(child),
            Modifier::ZeroOrOne | Modifier::ZeroOrMany => TrigramQuery::Any,
        },
    }
}

/// Adjacent characters form literal runs; every other child is compiled
/// on its own and the pieces are and'ed together.
fn compile_group(children: &[Node]) -> TrigramQuery {
    let mut query = TrigramQuery::Any;
    let mut run = String::new();

    for child in children {
        if let Node::Character(c) = child {
            run.push(*c);
            continue;
        }
        if !run.is_empty() {
            query = query.and(compile_literal(&run));
            run.clear();
        }
        query = query.and(compile_node(child));
    }

    if !run.is_empty() {
        query = query.and(compile_literal(&run));
    }
    query
}

impl TrigramIndex {
    /// Candidate files for `query`, in build order
    pub fn lookup(&self, query: &TrigramQuery) -> Vec<&Path> {
        let ids = query.lookup(self);
        tracing::debug!(candidates = ids.len(), files = self.file_count(), "index lookup");
        ids.into_iter().filter_map(|id| self.path(id)).collect()
    }
}
