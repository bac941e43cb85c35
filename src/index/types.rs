use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Position of a file in the index's file map
pub type FileId = u32;

/// Three consecutive code points
pub type Trigram = [char; 3];

/// Render a trigram as a string
pub fn trigram_to_string(t: &Trigram) -> String {
    t.iter().collect()
}

/// Parse exactly three code points
pub fn trigram_from_str(s: &str) -> Option<Trigram> {
    let mut chars = s.chars();
    let t = [chars.next()?, chars.next()?, chars.next()?];
    chars.next().is_none().then_some(t)
}

/// In-memory trigram index: an ordered file map plus one ascending,
/// duplicate-free posting list per trigram. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct TrigramIndex {
    pub(crate) files: Vec<PathBuf>,
    pub(crate) postings: FxHashMap<Trigram, Vec<FileId>>,
}

impl TrigramIndex {
    /// Indexed paths, in build order
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.files.get(id as usize).map(PathBuf::as_path)
    }

    /// Posting list for `trigram`; empty if it never occurs
    pub fn postings(&self, trigram: &Trigram) -> &[FileId] {
        self.postings.get(trigram).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every file id, ascending
    pub fn all_file_ids(&self) -> Vec<FileId> {
        (0..self.files.len() as FileId).collect()
    }

    pub fn trigram_count(&self) -> usize {
        self.postings.len()
    }

    /// Iterate `(trigram, postings)` in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&Trigram, &[FileId])> {
        self.postings.iter().map(|(t, p)| (t, p.as_slice()))
    }
}

/// Configuration for the indexer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub max_file_size: u64,
    /// Leave likely-binary files out of the file map
    pub skip_binary: bool,
    /// Skip hidden files and directories
    pub hidden: bool,
    /// Respect .gitignore and friends
    pub git_ignore: bool,
    pub ignored_dirs: Vec<String>,
    pub max_depth: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024, // 100MB
            skip_binary: true,
            hidden: true,
            git_ignore: true,
            ignored_dirs: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
                "__pycache__".to_string(),
                ".venv".to_string(),
            ],
            max_depth: None,
        }
    }
}
