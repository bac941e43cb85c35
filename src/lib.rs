//! # trigrep - regular expression search with a trigram pre-filter
//!
//! trigrep compiles a small regular expression language into a Thompson
//! NFA, simulates it without backtracking, and reports line-relative
//! matches. Before scanning a directory it narrows the candidate files
//! with an in-memory trigram index that never drops a file which could
//! match.
//!
//! ## Architecture
//!
//! - [`regex`] - lexer, parser, NFA compiler, runner, and match scanner
//! - [`index`] - trigram index construction and statistics
//! - [`query`] - pattern to trigram query compilation and posting lookup
//! - [`search`] - parallel directory search over one result stream
//! - [`output`] - ripgrep-style result formatting
//! - [`config`] - JSON configuration
//! - [`utils`] - file reading, trigram extraction, progress bars
//!
//! ## Quick Start
//!
//! ```no_run
//! use trigrep::index::TrigramIndex;
//! use trigrep::query;
//! use trigrep::regex::{compile, find_all};
//!
//! let index = TrigramIndex::from_documents([
//!     ("psalm.txt", "the LORD is my shepherd"),
//!     ("genesis.txt", "In the beginning God created the heaven"),
//! ]);
//!
//! let candidates = index.lookup(&query::compile("heaven").unwrap());
//! assert_eq!(candidates.len(), 1);
//!
//! let nfa = compile("(G|g)od").unwrap();
//! let spans = find_all(&nfa, "In the beginning God created");
//! assert_eq!(spans[0].position(), (1, 17, 19));
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod regex;
pub mod search;
pub mod utils;

pub use error::{Error, ParseError, Result};
