//! Helpers shared by indexing and search.
//!
//! - [`file_reader`] - size-gated file loading (mmap above a threshold), line offsets
//! - [`trigram`] - per-line code-point trigrams, binary detection
//! - [`progress`] - progress bars, silent without the `progress` feature

pub mod file_reader;
pub mod progress;
pub mod trigram;

pub use file_reader::*;
pub use trigram::*;
