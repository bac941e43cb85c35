//! Trigram pre-filter: compile a pattern into a [`TrigramQuery`] and
//! evaluate it against a [`TrigramIndex`](crate::index::TrigramIndex).
//!
//! ```no_run
//! use trigrep::index::TrigramIndex;
//! use trigrep::query::compile;
//!
//! let index = TrigramIndex::from_documents([("a.txt", "heaven and hell")]);
//! let query = compile("heaven.*hell").unwrap();
//! assert_eq!(index.lookup(&query).len(), 1);
//! ```

pub mod plan;
pub mod postings;

pub use plan::{compile, compile_literal, compile_node, TrigramQuery};
pub use postings::{intersect, union};
