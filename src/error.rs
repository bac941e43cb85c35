//! Error types shared by the engine, the index, and directory search.

use std::path::PathBuf;

/// A malformed pattern. Positions are code-point offsets into the pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// A `)` with no matching `(`
    #[error("unmatched ')' at position {position}")]
    UnmatchedClose { position: usize },

    /// A `(` that is never closed
    #[error("unclosed group opened at position {position}")]
    UnclosedGroup { position: usize },

    /// A modifier with nothing to repeat
    #[error("dangling modifier '{symbol}' at position {position}")]
    DanglingModifier { position: usize, symbol: char },
}

/// trigrep error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Pattern could not be parsed
    #[error("invalid pattern: {0}")]
    Parse(#[from] ParseError),

    /// File I/O error
    #[error("io error: {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory walk error
    #[error("walk error: {message}")]
    Walk { message: String },

    /// Configuration file invalid
    #[error("config error: {message}")]
    Config { message: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type using the trigrep [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
