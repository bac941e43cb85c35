use crate::error::{Error, Result};
use crate::index::types::{FileId, IndexConfig, Trigram, TrigramIndex};
use crate::utils::progress::IndexProgress;
use crate::utils::{extract_trigrams, is_binary, FileReader};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

impl TrigramIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the file map and post every trigram of `text`
    /// under its id. Returns the new id.
    pub fn add_document(&mut self, path: impl Into<PathBuf>, text: &str) -> FileId {
        self.add_trigrams(path, &extract_trigrams(text))
    }

    /// Append `path` to the file map and post each of `trigrams` under its
    /// id. Repeated trigrams are posted once.
    pub fn add_trigrams(&mut self, path: impl Into<PathBuf>, trigrams: &[Trigram]) -> FileId {
        let id = self.files.len() as FileId;
        self.files.push(path.into());

        for trigram in trigrams {
            let list = self.postings.entry(*trigram).or_default();
            // Ids only ever grow, so checking the tail keeps lists sorted and unique
            if list.last() != Some(&id) {
                list.push(id);
            }
        }
        id
    }

    /// Index an in-memory collection, in iteration order
    pub fn from_documents<P, T>(docs: impl IntoIterator<Item = (P, T)>) -> Self
    where
        P: Into<PathBuf>,
        T: AsRef<str>,
    {
        let mut index = Self::new();
        for (path, text) in docs {
            index.add_document(path, text.as_ref());
        }
        index
    }
}

/// An index plus everything that could not be walked or read while
/// building it
#[derive(Debug, Default)]
pub struct IndexBuild {
    pub index: TrigramIndex,
    pub errors: Vec<Error>,
}

/// Build an index over every text file under `root`. Unreadable files and
/// directories are logged and left out.
pub fn build_index(root: &Path, config: &IndexConfig) -> Result<TrigramIndex> {
    let IndexBuild { index, errors } = build_index_with_progress(root, config, false)?;
    for err in &errors {
        tracing::warn!(error = %err, "left out of index");
    }
    Ok(index)
}

/// Build an index, optionally drawing progress on stderr, and return the
/// walk and read errors alongside it
pub fn build_index_with_progress(
    root: &Path,
    config: &IndexConfig,
    show_progress: bool,
) -> Result<IndexBuild> {
    let Discovery { paths, mut errors } = discover_files(root, config, show_progress)?;
    let IndexBuild {
        index,
        errors: unreadable,
    } = index_paths(paths, config, show_progress);
    // Walk errors first, in walk order
    errors.extend(unreadable);
    Ok(IndexBuild { index, errors })
}

/// Files found under a root, plus the entries the walk could not read
#[derive(Debug, Default)]
pub(crate) struct Discovery {
    pub paths: Vec<PathBuf>,
    pub errors: Vec<Error>,
}

/// Files under `root` the config admits, sorted. A file root is returned
/// as is; a missing root is an error.
pub(crate) fn discover_files(
    root: &Path,
    config: &IndexConfig,
    show_progress: bool,
) -> Result<Discovery> {
    let metadata = root.metadata().map_err(|e| Error::io(root, e))?;
    if metadata.is_file() {
        return Ok(Discovery {
            paths: vec![root.to_path_buf()],
            errors: Vec::new(),
        });
    }

    let progress = IndexProgress::discovering(show_progress);
    let discovery = collect_files(root, config);
    progress.finish(format!("Found {} files", discovery.paths.len()));
    tracing::debug!(
        root = %root.display(),
        files = discovery.paths.len(),
        errors = discovery.errors.len(),
        "discovered files"
    );
    Ok(discovery)
}

/// Index `paths` in order. Each worker reduces its file to a trigram set
/// and drops the text; ids are then assigned sequentially so they follow
/// `paths`.
pub(crate) fn index_paths(
    paths: Vec<PathBuf>,
    config: &IndexConfig,
    show_progress: bool,
) -> IndexBuild {
    let progress = IndexProgress::reading(show_progress, paths.len());
    let reader = FileReader::new(config.max_file_size);

    let results: Vec<(PathBuf, Result<Option<Vec<Trigram>>>)> = paths
        .into_par_iter()
        .map(|path| {
            let trigrams = read_text(&reader, &path, config.skip_binary)
                .map(|text| text.map(|text| extract_trigrams(&text)));
            progress.advance();
            (path, trigrams)
        })
        .collect();

    let mut index = TrigramIndex::new();
    let mut errors = Vec::new();
    for (path, result) in results {
        match result {
            Ok(Some(trigrams)) => {
                index.add_trigrams(path, &trigrams);
            }
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    progress.finish(format!("Indexed {} files", index.file_count()));

    tracing::info!(
        files = index.file_count(),
        trigrams = index.trigram_count(),
        errors = errors.len(),
        "index built"
    );

    IndexBuild { index, errors }
}

/// Walk `root` and return every regular file the config admits, sorted,
/// with the entries that could not be read
pub(crate) fn collect_files(root: &Path, config: &IndexConfig) -> Discovery {
    let ignored_dirs = config.ignored_dirs.clone();

    let walker = WalkBuilder::new(root)
        .hidden(config.hidden)
        .git_ignore(config.git_ignore)
        .git_global(config.git_ignore)
        .git_exclude(config.git_ignore)
        .max_depth(config.max_depth)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let name = entry.file_name().to_string_lossy();
            !(is_dir && ignored_dirs.iter().any(|d| d.as_str() == name.as_ref()))
        })
        .build();

    let mut discovery = Discovery::default();
    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_some_and(|t| t.is_file()) {
                    discovery.paths.push(entry.into_path());
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "walk error");
                discovery.errors.push(walk_error(err));
            }
        }
    }

    discovery.paths.sort();
    discovery
}

/// An I/O failure on a known entry becomes `Error::Io` for that path;
/// anything else the walker reports is kept as a message.
pub(crate) fn walk_error(err: ignore::Error) -> Error {
    match err {
        ignore::Error::WithDepth { err, .. } => walk_error(*err),
        ignore::Error::WithPath { path, err } => {
            let message = format!("{}: {err}", path.display());
            match (*err).into_io_error() {
                Some(source) => Error::io(path, source),
                None => Error::Walk { message },
            }
        }
        other => Error::Walk {
            message: other.to_string(),
        },
    }
}

/// Read a file as text. `Ok(None)` means the file was skipped.
pub(crate) fn read_text(
    reader: &FileReader,
    path: &Path,
    skip_binary: bool,
) -> Result<Option<String>> {
    let Some(content) = reader.read(path)? else {
        return Ok(None);
    };
    if skip_binary && is_binary(content.as_bytes()) {
        tracing::trace!(path = %path.display(), "skipping binary file");
        return Ok(None);
    }
    Ok(Some(content.to_text().into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn t(s: &str) -> [char; 3] {
        let mut c = s.chars();
        [c.next().unwrap(), c.next().unwrap(), c.next().unwrap()]
    }

    #[test]
    fn test_add_document_posts_ids_once() {
        let mut index = TrigramIndex::new();
        assert_eq!(index.add_document("a.txt", "hello hello"), 0);
        assert_eq!(index.add_document("b.txt", "yellow"), 1);

        assert_eq!(index.postings(&t("hel")), &[0]);
        assert_eq!(index.postings(&t("ell")), &[0, 1]);
        assert_eq!(index.postings(&t("low")), &[1]);
        assert!(index.postings(&t("xyz")).is_empty());
    }

    #[test]
    fn test_short_and_empty_documents_keep_ids() {
        let index = TrigramIndex::from_documents([("a", ""), ("b", "ab"), ("c", "abc")]);
        assert_eq!(index.file_count(), 3);
        assert_eq!(index.postings(&t("abc")), &[2]);
        assert_eq!(index.path(1), Some(Path::new("b")));
    }

    #[test]
    fn test_trigrams_do_not_span_lines() {
        let index = TrigramIndex::from_documents([("a", "ab\nc")]);
        assert_eq!(index.trigram_count(), 0);
    }

    #[test]
    fn test_postings_sorted_and_unique() {
        let docs: Vec<(String, String)> = (0..50)
            .map(|i| (format!("f{i}"), "abcabc\nabc".repeat(i % 3 + 1)))
            .collect();
        let index = TrigramIndex::from_documents(docs);
        for (_, list) in index.iter() {
            assert!(list.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_build_index_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.txt"), "the quick brown fox").unwrap();
        fs::write(dir.path().join("two.txt"), "lazy dog").unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/skip.txt"), "quick").unwrap();
        fs::write(dir.path().join("blob.bin"), b"qui\x00ck").unwrap();

        let index = build_index(dir.path(), &IndexConfig::default()).unwrap();
        let names: Vec<_> = index
            .files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["one.txt", "two.txt"]);
        assert_eq!(index.postings(&t("qui")), &[0]);
        assert_eq!(index.postings(&t("dog")), &[1]);
    }

    #[test]
    fn test_build_index_single_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("only.txt");
        fs::write(&file, "abcd").unwrap();

        let index = build_index(&file, &IndexConfig::default()).unwrap();
        assert_eq!(index.files(), &[file]);
        assert_eq!(index.postings(&t("bcd")), &[0]);
    }

    #[test]
    fn test_build_index_missing_root() {
        let err = build_index(Path::new("/no/such/dir"), &IndexConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_add_trigrams_matches_add_document() {
        let mut by_text = TrigramIndex::new();
        by_text.add_document("a", "abcab\nbca");
        let mut by_set = TrigramIndex::new();
        by_set.add_trigrams("a", &[t("bca"), t("abc"), t("cab"), t("bca")]);

        for trigram in ["abc", "bca", "cab"] {
            assert_eq!(by_text.postings(&t(trigram)), by_set.postings(&t(trigram)));
        }
        assert_eq!(by_set.postings(&t("bca")), &[0]);
    }

    #[test]
    fn test_index_paths_reports_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.txt");
        let missing = dir.path().join("missing.txt");
        fs::write(&present, "heaven").unwrap();

        let IndexBuild { index, errors } =
            index_paths(vec![missing.clone(), present.clone()], &IndexConfig::default(), false);
        assert_eq!(index.files(), &[present]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], Error::Io { path, .. } if *path == missing));
    }

    #[test]
    fn test_walk_error_keeps_path() {
        let err = ignore::Error::WithDepth {
            depth: 1,
            err: Box::new(ignore::Error::WithPath {
                path: PathBuf::from("/tree/secret"),
                err: Box::new(ignore::Error::Io(std::io::Error::from(
                    std::io::ErrorKind::PermissionDenied,
                ))),
            }),
        };
        match walk_error(err) {
            Error::Io { path, source } => {
                assert_eq!(path, Path::new("/tree/secret"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected Error::Io, got {other:?}"),
        }

        let err = ignore::Error::Loop {
            ancestor: PathBuf::from("/a"),
            child: PathBuf::from("/a/b"),
        };
        assert!(matches!(walk_error(err), Error::Walk { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("open.txt"), "abc").unwrap();
        let locked = dir.path().join("secret");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("a.txt"), "heaven and hell").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users read through the mode bits
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let build = build_index_with_progress(dir.path(), &IndexConfig::default(), false);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let IndexBuild { index, errors } = build.unwrap();
        assert_eq!(index.file_count(), 1);
        assert!(
            errors.iter().any(|e| matches!(e, Error::Io { path, .. } if *path == locked)),
            "{errors:?}"
        );
    }

    #[test]
    fn test_max_file_size_skips() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.txt"), "x".repeat(100)).unwrap();
        fs::write(dir.path().join("small.txt"), "abc").unwrap();

        let config = IndexConfig {
            max_file_size: 10,
            ..IndexConfig::default()
        };
        let index = build_index(dir.path(), &config).unwrap();
        assert_eq!(index.file_count(), 1);
    }
}
