//! Directory search: trigram pre-filter, then a parallel scan of every
//! candidate file, with all results converging on one channel.
//!
//! ```no_run
//! use trigrep::regex::CancelToken;
//! use trigrep::search::DirectorySearch;
//! use std::path::Path;
//!
//! let search = DirectorySearch::new("heaven.*hell").unwrap();
//! for result in search.run(Path::new("."), CancelToken::new()).unwrap() {
//!     let found = result.unwrap();
//!     println!("{}:{}:{}", found.path.display(), found.span.line, found.line);
//! }
//! ```

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::index::build::{discover_files, index_paths, read_text, Discovery, IndexBuild};
use crate::index::IndexConfig;
use crate::query::{self, TrigramQuery};
use crate::regex::{compile, CancelToken, MatchSpan, Matches, Nfa};
use crate::utils::{line_starts, line_text, FileReader};
use crossbeam_channel::{bounded, Receiver, Sender};
use globset::{Glob, GlobMatcher};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One match inside one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMatch {
    pub path: PathBuf,
    pub span: MatchSpan,
    /// Text of the matched line, without its terminator
    pub line: String,
}

/// A compiled pattern ready to search directory trees
pub struct DirectorySearch {
    pattern: Arc<str>,
    nfa: Arc<Nfa>,
    query: TrigramQuery,
    index_config: IndexConfig,
    search_config: SearchConfig,
    glob: Option<GlobMatcher>,
}

impl DirectorySearch {
    /// Compile `pattern` once for the automaton and the trigram query
    pub fn new(pattern: &str) -> Result<Self> {
        let nfa = compile(pattern)?;
        let query = query::compile(pattern)?;
        Ok(Self {
            pattern: Arc::from(pattern),
            nfa: Arc::new(nfa),
            query,
            index_config: IndexConfig::default(),
            search_config: SearchConfig::default(),
            glob: None,
        })
    }

    pub fn with_index_config(mut self, config: IndexConfig) -> Self {
        self.index_config = config;
        self
    }

    /// Apply search settings. Fails if the glob does not compile.
    pub fn with_search_config(mut self, config: SearchConfig) -> Result<Self> {
        self.glob = match &config.glob {
            Some(glob) => Some(
                Glob::new(glob)
                    .map_err(|e| Error::Config {
                        message: format!("invalid glob '{glob}': {e}"),
                    })?
                    .compile_matcher(),
            ),
            None => None,
        };
        self.search_config = config;
        Ok(self)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }

    pub fn query(&self) -> &TrigramQuery {
        &self.query
    }

    /// Start searching `root`. Discovery and the index lookup happen before
    /// this returns; scanning runs on a worker pool behind the stream.
    /// Entries that cannot be walked or read arrive as `Err` items.
    pub fn run(&self, root: &Path, cancel: CancelToken) -> Result<SearchStream> {
        let Discovery { paths, errors } = discover_files(root, &self.index_config, false)?;
        let paths = self.filter_glob(root, paths);
        self.search_paths(paths, errors, cancel)
    }

    /// Search an explicit file list. `unreadable` is reported ahead of any
    /// match, followed by whatever else fails to read.
    fn search_paths(
        &self,
        paths: Vec<PathBuf>,
        mut unreadable: Vec<Error>,
        cancel: CancelToken,
    ) -> Result<SearchStream> {
        let candidates = if self.search_config.use_index {
            let IndexBuild { index, errors } = index_paths(paths, &self.index_config, false);
            // Files the index could not read are reported instead of dropped
            unreadable.extend(errors);
            let candidates: Vec<PathBuf> = index
                .lookup(&self.query)
                .into_iter()
                .map(Path::to_path_buf)
                .collect();
            tracing::debug!(
                candidates = candidates.len(),
                files = index.file_count(),
                "trigram pre-filter"
            );
            candidates
        } else {
            paths
        };

        let threads = self.search_config.effective_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::Config {
                message: format!("cannot start {threads} search threads: {e}"),
            })?;
        tracing::debug!(threads, files = candidates.len(), "starting scan");

        let worker = Worker {
            nfa: Arc::clone(&self.nfa),
            pattern: Arc::clone(&self.pattern),
            reader: FileReader::new(self.index_config.max_file_size),
            skip_binary: self.index_config.skip_binary,
            cancel,
        };

        let (sender, receiver) = bounded(self.search_config.channel_capacity.max(1));

        std::thread::spawn(move || {
            for err in unreadable {
                if !worker.send(&sender, Err(err)) {
                    return;
                }
            }
            pool.install(|| {
                candidates
                    .par_iter()
                    .for_each_with(sender, |sender, path| worker.scan_file(path, sender));
            });
            if worker.cancel.is_cancelled() {
                tracing::debug!("search cancelled");
            }
        });

        Ok(SearchStream { receiver })
    }

    /// Globs match the path below `root`, or the file name when `root` is
    /// the file itself
    fn filter_glob(&self, root: &Path, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        let Some(glob) = &self.glob else {
            return paths;
        };
        paths
            .into_iter()
            .filter(|path| {
                let relative = path.strip_prefix(root).unwrap_or(path);
                if relative.as_os_str().is_empty() {
                    return path.file_name().is_some_and(|name| glob.is_match(name));
                }
                glob.is_match(relative)
            })
            .collect()
    }
}

/// Per-file scan state shared by the pool
struct Worker {
    nfa: Arc<Nfa>,
    pattern: Arc<str>,
    reader: FileReader,
    skip_binary: bool,
    cancel: CancelToken,
}

impl Worker {
    fn scan_file(&self, path: &Path, sender: &mut Sender<Result<FileMatch>>) {
        if self.cancel.is_cancelled() {
            return;
        }

        let text = match read_text(&self.reader, path, self.skip_binary) {
            Ok(Some(text)) => text,
            Ok(None) => return,
            Err(err) => {
                self.send(sender, Err(err));
                return;
            }
        };

        let starts = line_starts(text.as_bytes());
        let matches = Matches::new(&self.nfa, &text)
            .with_query(Arc::clone(&self.pattern))
            .with_cancel(self.cancel.clone());

        for span in matches {
            let line = line_text(&text, &starts, span.line)
                .trim_end_matches('\r')
                .to_string();
            let found = FileMatch {
                path: path.to_path_buf(),
                span,
                line,
            };
            if !self.send(sender, Ok(found)) {
                return;
            }
        }
    }

    /// Returns false once the receiver is gone, cancelling the other workers
    fn send(&self, sender: &Sender<Result<FileMatch>>, item: Result<FileMatch>) -> bool {
        if sender.send(item).is_err() {
            self.cancel.cancel();
            return false;
        }
        true
    }
}

/// Results of a running search, in completion order. Ends when every
/// candidate has been scanned or the search is cancelled.
pub struct SearchStream {
    receiver: Receiver<Result<FileMatch>>,
}

impl SearchStream {
    pub fn into_receiver(self) -> Receiver<Result<FileMatch>> {
        self.receiver
    }
}

impl Iterator for SearchStream {
    type Item = Result<FileMatch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("genesis.txt"),
            "In the beginning God\ncreated the heaven",
        )
        .unwrap();
        fs::write(dir.path().join("hell.txt"), "from heaven to hell").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "fn god() {}\n").unwrap();
        dir
    }

    fn collect(search: &DirectorySearch, root: &Path) -> Vec<(String, usize, usize, usize)> {
        let mut found: Vec<_> = search
            .run(root, CancelToken::new())
            .unwrap()
            .map(|r| {
                let m = r.unwrap();
                let name = m.path.file_name().unwrap().to_string_lossy().into_owned();
                (name, m.span.line, m.span.start, m.span.end)
            })
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_search_with_index() {
        let dir = tree();
        let search = DirectorySearch::new("heaven.*hell").unwrap();
        assert_eq!(collect(&search, dir.path()), vec![("hell.txt".to_string(), 1, 5, 18)]);
    }

    #[test]
    fn test_search_without_index_matches_indexed() {
        let dir = tree();
        for pattern in ["(G|g)od", "heaven", "the"] {
            let indexed = DirectorySearch::new(pattern).unwrap();
            let plain = DirectorySearch::new(pattern)
                .unwrap()
                .with_search_config(SearchConfig {
                    use_index: false,
                    ..SearchConfig::default()
                })
                .unwrap();
            assert_eq!(
                collect(&indexed, dir.path()),
                collect(&plain, dir.path()),
                "{pattern}"
            );
        }
    }

    #[test]
    fn test_line_text_attached() {
        let dir = tree();
        let search = DirectorySearch::new("created").unwrap();
        let found: Vec<FileMatch> = search
            .run(dir.path(), CancelToken::new())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, "created the heaven");
        assert_eq!(found[0].span.position(), (2, 0, 6));
        assert_eq!(&*found[0].span.query, "created");
    }

    #[test]
    fn test_glob_filter() {
        let dir = tree();
        let search = DirectorySearch::new("od")
            .unwrap()
            .with_search_config(SearchConfig {
                glob: Some("*.rs".to_string()),
                ..SearchConfig::default()
            })
            .unwrap();
        let names: Vec<String> = collect(&search, dir.path())
            .into_iter()
            .map(|m| m.0)
            .collect();
        assert_eq!(names, vec!["lib.rs"]);
    }

    #[test]
    fn test_glob_on_single_file_root() {
        let dir = tree();
        let file = dir.path().join("hell.txt");
        let glob = |pattern: &str| {
            DirectorySearch::new("hell")
                .unwrap()
                .with_search_config(SearchConfig {
                    glob: Some(pattern.to_string()),
                    ..SearchConfig::default()
                })
                .unwrap()
        };
        assert_eq!(collect(&glob("*.txt"), &file).len(), 1);
        assert!(collect(&glob("*.rs"), &file).is_empty());
    }

    fn plain_config() -> SearchConfig {
        SearchConfig {
            use_index: false,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn test_unreadable_file_surfaces_in_both_modes() {
        let dir = tree();
        let present = dir.path().join("hell.txt");
        let missing = dir.path().join("gone.txt");

        for config in [SearchConfig::default(), plain_config()] {
            let use_index = config.use_index;
            let search = DirectorySearch::new("hell")
                .unwrap()
                .with_search_config(config)
                .unwrap();
            let results: Vec<Result<FileMatch>> = search
                .search_paths(
                    vec![missing.clone(), present.clone()],
                    Vec::new(),
                    CancelToken::new(),
                )
                .unwrap()
                .collect();

            assert_eq!(results.len(), 2, "use_index: {use_index}");
            assert!(
                results
                    .iter()
                    .any(|r| matches!(r, Err(Error::Io { path, .. }) if *path == missing)),
                "use_index: {use_index}"
            );
            assert!(results.iter().any(|r| matches!(r, Ok(m) if m.path == present)));
        }
    }

    #[test]
    fn test_walk_errors_come_first() {
        let dir = tree();
        let search = DirectorySearch::new("hell")
            .unwrap()
            .with_search_config(plain_config())
            .unwrap();
        let walk = Error::Walk {
            message: "cannot read tree/secret".to_string(),
        };
        let mut results = search
            .search_paths(vec![dir.path().join("hell.txt")], vec![walk], CancelToken::new())
            .unwrap();

        assert!(matches!(results.next(), Some(Err(Error::Walk { .. }))));
        assert!(matches!(results.next(), Some(Ok(_))));
        assert!(results.next().is_none());
    }

    #[test]
    fn test_worker_reports_missing_file() {
        let (mut sender, receiver) = bounded(4);
        let worker = Worker {
            nfa: Arc::new(compile("x").unwrap()),
            pattern: Arc::from("x"),
            reader: FileReader::new(1024),
            skip_binary: true,
            cancel: CancelToken::new(),
        };
        worker.scan_file(Path::new("/no/such/file.txt"), &mut sender);
        drop(sender);

        let items: Vec<Result<FileMatch>> = receiver.iter().collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], Err(Error::Io { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_not_silent() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tree();
        let locked = dir.path().join("secret");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("a.txt"), "heaven and hell").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through the mode bits
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        for config in [SearchConfig::default(), plain_config()] {
            let search = DirectorySearch::new("heaven")
                .unwrap()
                .with_search_config(config)
                .unwrap();
            let results: Vec<Result<FileMatch>> =
                search.run(dir.path(), CancelToken::new()).unwrap().collect();
            assert!(
                results
                    .iter()
                    .any(|r| matches!(r, Err(Error::Io { path, .. }) if *path == locked)),
                "{results:?}"
            );
        }
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_invalid_glob() {
        let result = DirectorySearch::new("x").unwrap().with_search_config(SearchConfig {
            glob: Some("a[".to_string()),
            ..SearchConfig::default()
        });
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(DirectorySearch::new("a)"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_missing_root() {
        let search = DirectorySearch::new("abc").unwrap();
        assert!(search.run(Path::new("/no/such/root"), CancelToken::new()).is_err());
    }

    #[test]
    fn test_cancelled_before_start_yields_nothing() {
        let dir = tree();
        let cancel = CancelToken::new();
        cancel.cancel();
        let search = DirectorySearch::new("heaven").unwrap();
        assert_eq!(search.run(dir.path(), cancel).unwrap().count(), 0);
    }

    #[test]
    fn test_single_thread() {
        let dir = tree();
        let search = DirectorySearch::new("the")
            .unwrap()
            .with_search_config(SearchConfig {
                threads: 1,
                ..SearchConfig::default()
            })
            .unwrap();
        assert_eq!(collect(&search, dir.path()).len(), 2);
    }
}
