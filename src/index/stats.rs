use crate::error::{Error, Result};
use crate::index::types::{trigram_to_string, Trigram, TrigramIndex};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Summary numbers for an index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub file_count: usize,
    pub trigram_count: usize,
    /// Sum of all posting list lengths
    pub posting_count: usize,
    pub longest_posting: usize,
    /// Trigrams found in the most files, with their file counts
    pub most_common: Vec<(String, usize)>,
}

/// How many trigrams [`TrigramIndex::stats`] lists as most common
pub const MOST_COMMON_LIMIT: usize = 10;

/// One posting list in the JSON dump
#[derive(Debug, Serialize)]
struct PostingEntry<'a> {
    trigram: String,
    files: Vec<&'a Path>,
}

impl TrigramIndex {
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            file_count: self.file_count(),
            trigram_count: self.trigram_count(),
            ..IndexStats::default()
        };
        for (_, list) in self.iter() {
            stats.posting_count += list.len();
            stats.longest_posting = stats.longest_posting.max(list.len());
        }
        stats.most_common = self
            .most_common(MOST_COMMON_LIMIT)
            .into_iter()
            .map(|(t, n)| (trigram_to_string(&t), n))
            .collect();
        stats
    }

    /// The `n` trigrams with the longest posting lists, ties broken by trigram
    pub fn most_common(&self, n: usize) -> Vec<(Trigram, usize)> {
        let mut counts: Vec<(Trigram, usize)> =
            self.iter().map(|(t, list)| (*t, list.len())).collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts.truncate(n);
        counts
    }

    /// Dump every posting list as `[{"trigram": .., "files": [..]}]`,
    /// sorted by trigram
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.to_json_writer(&mut writer)
            .map_err(|e| Error::io(path, e))?;
        writer.flush().map_err(|e| Error::io(path, e))
    }

    pub(crate) fn to_json_writer<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let mut entries: Vec<PostingEntry<'_>> = self
            .iter()
            .map(|(trigram, list)| PostingEntry {
                trigram: trigram_to_string(trigram),
                files: list.iter().filter_map(|&id| self.path(id)).collect(),
            })
            .collect();
        entries.sort_by(|a, b| a.trigram.cmp(&b.trigram));

        serde_json::to_writer_pretty(writer, &entries).map_err(std::io::Error::from)
    }
}
