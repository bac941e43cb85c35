//! Backtracking-free regular expression engine.
//!
//! Patterns go through [`lexer`] → [`parser`] → [`compiler`] and come out
//! as an arena [`Nfa`]. A [`Runner`] simulates every live branch of the
//! automaton at once, and the [`scanner`] turns a runner into a stream of
//! line-relative [`MatchSpan`]s.
//!
//! Supported syntax: literal characters, `.` (anything but a line feed),
//! `|`, `(...)`, and the `*`, `+`, `?` modifiers.
//!
//! ```no_run
//! use trigrep::regex::{compile, find_all};
//!
//! let nfa = compile("a*b").unwrap();
//! let spans = find_all(&nfa, "bb");
//! assert_eq!(spans.len(), 2);
//! ```

pub mod ast;
pub mod compiler;
pub mod lexer;
pub mod nfa;
pub mod parser;
pub mod runner;
pub mod scanner;

pub use ast::{Modifier, Node};
pub use compiler::{compile, compile_ast};
pub use lexer::{lex, Symbol};
pub use nfa::{Guard, Nfa, State, StateId, Transition};
pub use parser::parse;
pub use runner::{Runner, Status};
pub use scanner::{find_all, scan, CancelToken, MatchSpan, MatchStream, Matches};
