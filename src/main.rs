use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use trigrep::config::AppConfig;
use trigrep::index::{build_index_with_progress, IndexBuild};
use trigrep::output;
use trigrep::regex::{compile_ast, parse, CancelToken};
use trigrep::search::{DirectorySearch, FileMatch};

#[derive(Parser)]
#[command(name = "trigrep")]
#[command(about = "Regular expression search with a trigram pre-filter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to <config dir>/trigrep/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search files under a path
    Search {
        /// Pattern: literals, '.', '|', '(...)', '*', '+', '?'
        pattern: String,

        /// File or directory to search
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Scan every file instead of narrowing with the trigram index
        #[arg(long)]
        no_index: bool,

        /// Print one JSON object per match
        #[arg(long)]
        json: bool,

        /// Only search paths matching this glob
        #[arg(short, long)]
        glob: Option<String>,

        /// Worker threads (0 = one per core)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Print match counts per file
        #[arg(short, long)]
        count: bool,

        /// Print only the names of matching files
        #[arg(short = 'l', long)]
        files_with_matches: bool,

        /// Group matches under a file name header
        #[arg(long)]
        heading: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Build an index and show its statistics
    Index {
        /// File or directory to index
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Write every posting list to this JSON file
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Show how a pattern is parsed and compiled
    Debug {
        pattern: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("TRIGREP_LOG").unwrap_or_else(|_| EnvFilter::new("off"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// How a command ended, mapped to grep's exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// A match was found, or a non-search command finished
    Success,
    NoMatch,
    /// Finished, but some files or directories could not be read
    Incomplete,
}

fn main() {
    init_logging();

    let code = match run() {
        Ok(Outcome::Success) => 0,
        Ok(Outcome::NoMatch) => 1,
        Ok(Outcome::Incomplete) => 2,
        Err(e) => {
            eprintln!("trigrep: {:#}", e);
            2
        }
    };

    std::process::exit(code);
}

fn run() -> Result<Outcome> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .context("Failed to load config")?;

    match cli.command {
        Commands::Search {
            pattern,
            path,
            no_index,
            json,
            glob,
            threads,
            count,
            files_with_matches,
            heading,
            no_color,
        } => {
            let mut search_config = config.search;
            if no_index {
                search_config.use_index = false;
            }
            if let Some(threads) = threads {
                search_config.threads = threads;
            }
            if glob.is_some() {
                search_config.glob = glob;
            }

            let search = DirectorySearch::new(&pattern)
                .context("Invalid pattern")?
                .with_index_config(config.index)
                .with_search_config(search_config)?;

            let (mut matches, failures) = collect_matches(&search, &path)?;
            output::sort_matches(&mut matches);

            if json {
                let stdout = std::io::stdout();
                output::print_json_lines(&mut stdout.lock(), &matches)?;
            } else {
                let mut stdout = output::stdout(!no_color);
                if files_with_matches {
                    output::print_files_only(&mut stdout, &matches)?;
                } else if count {
                    output::print_match_counts(&mut stdout, &matches)?;
                } else {
                    output::print_matches(&mut stdout, &matches, heading)?;
                }
            }

            Ok(if failures > 0 {
                Outcome::Incomplete
            } else if matches.is_empty() {
                Outcome::NoMatch
            } else {
                Outcome::Success
            })
        }
        Commands::Index { path, dump } => {
            let IndexBuild { index, errors } =
                build_index_with_progress(&path, &config.index, true)
                    .with_context(|| format!("Failed to index {}", path.display()))?;
            for err in &errors {
                report(err);
            }

            let stats = index.stats();
            println!("Index Statistics");
            println!("================");
            println!();
            println!("Root path:        {}", path.display());
            println!("Files:            {}", stats.file_count);
            println!("Trigrams:         {}", stats.trigram_count);
            println!("Postings:         {}", stats.posting_count);
            println!("Longest posting:  {}", stats.longest_posting);

            if !stats.most_common.is_empty() {
                println!();
                println!("Most common trigrams:");
                for (trigram, files) in &stats.most_common {
                    println!("  {:?} {}", trigram, files);
                }
            }

            if let Some(dump) = dump {
                index
                    .write_json(&dump)
                    .with_context(|| format!("Failed to write {}", dump.display()))?;
                println!();
                println!("Posting lists written to: {}", dump.display());
            }

            Ok(if errors.is_empty() {
                Outcome::Success
            } else {
                Outcome::Incomplete
            })
        }
        Commands::Debug { pattern } => {
            let ast = parse(&pattern).context("Invalid pattern")?;
            let nfa = compile_ast(&ast);
            let query = trigrep::query::compile_node(&ast);

            println!("Syntax tree:");
            print!("{}", ast);
            println!();
            println!(
                "Automaton ({} states, {} transitions, {} epsilons):",
                nfa.len(),
                nfa.transition_count(),
                nfa.epsilon_count()
            );
            print!("{}", nfa);
            println!();
            println!("Trigram query: {}", query);

            Ok(Outcome::Success)
        }
    }
}

/// Drain the search stream, reporting unreadable entries on stderr.
/// Returns the matches and how many entries failed.
fn collect_matches(search: &DirectorySearch, path: &Path) -> Result<(Vec<FileMatch>, usize)> {
    let stream = search
        .run(path, CancelToken::new())
        .with_context(|| format!("Failed to search {}", path.display()))?;

    let mut matches = Vec::new();
    let mut failures = 0;
    for result in stream {
        match result {
            Ok(found) => matches.push(found),
            Err(e) => {
                report(&e);
                failures += 1;
            }
        }
    }
    Ok((matches, failures))
}

/// Print a library error with its cause chain
fn report(err: &trigrep::Error) {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    eprintln!("trigrep: {}", message);
}
