//! Output formatting for search results, ripgrep style

use crate::search::FileMatch;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Colored stdout, or plain when `color` is off
pub fn stdout(color: bool) -> StandardStream {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Order results by path, then position
pub fn sort_matches(matches: &mut [FileMatch]) {
    matches.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then(a.span.line.cmp(&b.span.line))
            .then(a.span.start.cmp(&b.span.start))
    });
}

/// Print matches grouped by line, every span on a line highlighted.
/// Expects `matches` sorted with [`sort_matches`].
pub fn print_matches<W: WriteColor>(
    out: &mut W,
    matches: &[FileMatch],
    heading: bool,
) -> io::Result<()> {
    let mut current_file: Option<&Path> = None;
    let mut rest = matches;

    while let Some(first) = rest.first() {
        let same_line = rest
            .iter()
            .take_while(|m| m.path == first.path && m.span.line == first.span.line)
            .count();
        let (line_matches, tail) = rest.split_at(same_line);
        rest = tail;

        if current_file != Some(first.path.as_path()) {
            if heading {
                if current_file.is_some() {
                    // Blank line between files
                    writeln!(out)?;
                }
                out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
                writeln!(out, "{}", first.path.display())?;
                out.reset()?;
            }
            current_file = Some(first.path.as_path());
        }

        print_match_line(out, line_matches, heading)?;
    }

    Ok(())
}

/// Print one line with each span highlighted
fn print_match_line<W: WriteColor>(
    out: &mut W,
    line_matches: &[FileMatch],
    heading: bool,
) -> io::Result<()> {
    let Some(first) = line_matches.first() else {
        return Ok(());
    };

    if !heading {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(out, "{}", first.path.display())?;
        out.reset()?;
        write!(out, ":")?;
    }

    out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(out, "{}", first.span.line)?;
    out.reset()?;
    write!(out, ":")?;

    let content = first.line.as_str();
    let mut printed = 0;
    for m in line_matches {
        let (start, end) = byte_range(content, m.span.start, m.span.end);
        // Overlapping spans only highlight what is left
        let start = start.max(printed);
        if end <= start {
            continue;
        }
        write!(out, "{}", &content[printed..start])?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(out, "{}", &content[start..end])?;
        out.reset()?;
        printed = end;
    }
    writeln!(out, "{}", &content[printed..])?;

    Ok(())
}

/// Byte range of code-point columns `start..=end` in `line`, clamped to it
pub fn byte_range(line: &str, start: usize, end: usize) -> (usize, usize) {
    let offset = |column: usize| {
        line.char_indices()
            .nth(column)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    };
    let begin = offset(start);
    let finish = offset(end.saturating_add(1)).max(begin);
    (begin, finish)
}

/// Print each matching file once (for -l flag)
pub fn print_files_only<W: WriteColor>(out: &mut W, matches: &[FileMatch]) -> io::Result<()> {
    let mut last: Option<&Path> = None;

    for m in matches {
        if last != Some(m.path.as_path()) {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
            writeln!(out, "{}", m.path.display())?;
            out.reset()?;
            last = Some(m.path.as_path());
        }
    }

    Ok(())
}

/// Print match count per file (for -c flag)
pub fn print_match_counts<W: WriteColor>(out: &mut W, matches: &[FileMatch]) -> io::Result<()> {
    let mut counts: BTreeMap<&Path, usize> = BTreeMap::new();
    for m in matches {
        *counts.entry(&m.path).or_insert(0) += 1;
    }

    for (path, count) in counts {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)))?;
        write!(out, "{}", path.display())?;
        out.reset()?;
        write!(out, ":")?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
        writeln!(out, "{}", count)?;
        out.reset()?;
    }

    Ok(())
}

#[derive(Serialize)]
struct JsonMatch<'a> {
    path: &'a Path,
    line_number: usize,
    start: usize,
    end: usize,
    line: &'a str,
    query: &'a str,
}

/// One JSON object per match
pub fn print_json_lines<W: Write>(out: &mut W, matches: &[FileMatch]) -> io::Result<()> {
    for m in matches {
        let record = JsonMatch {
            path: &m.path,
            line_number: m.span.line,
            start: m.span.start,
            end: m.span.end,
            line: &m.line,
            query: &m.span.query,
        };
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::MatchSpan;
    use std::path::PathBuf;
    use std::sync::Arc;
    use termcolor::NoColor;

    fn found(path: &str, line: usize, start: usize, end: usize, text: &str) -> FileMatch {
        FileMatch {
            path: PathBuf::from(path),
            span: MatchSpan {
                line,
                start,
                end,
                query: Arc::from("q"),
            },
            line: text.to_string(),
        }
    }

    fn render(f: impl FnOnce(&mut NoColor<Vec<u8>>) -> io::Result<()>) -> String {
        let mut out = NoColor::new(Vec::new());
        f(&mut out).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn test_byte_range_code_points() {
        assert_eq!(byte_range("abc", 0, 1), (0, 2));
        assert_eq!(byte_range("été!", 1, 2), (2, 5));
        assert_eq!(byte_range("ab", 1, 9), (1, 2));
        assert_eq!(byte_range("ab", 5, 9), (2, 2));
    }

    #[test]
    fn test_print_matches_flat() {
        let matches = vec![
            found("a.txt", 1, 0, 2, "the god"),
            found("a.txt", 1, 4, 6, "the god"),
            found("b.txt", 3, 0, 1, "hi"),
        ];
        let text = render(|out| print_matches(out, &matches, false));
        assert_eq!(text, "a.txt:1:the god\nb.txt:3:hi\n");
    }

    #[test]
    fn test_print_matches_heading() {
        let matches = vec![found("a.txt", 2, 0, 0, "x"), found("b.txt", 1, 0, 0, "y")];
        let text = render(|out| print_matches(out, &matches, true));
        assert_eq!(text, "a.txt\n2:x\n\nb.txt\n1:y\n");
    }

    #[test]
    fn test_files_and_counts() {
        let mut matches = vec![
            found("b.txt", 1, 0, 0, "x"),
            found("a.txt", 2, 0, 0, "x"),
            found("a.txt", 1, 0, 0, "x"),
        ];
        sort_matches(&mut matches);
        assert_eq!(matches[0].span.line, 1);

        assert_eq!(render(|out| print_files_only(out, &matches)), "a.txt\nb.txt\n");
        assert_eq!(render(|out| print_match_counts(out, &matches)), "a.txt:2\nb.txt:1\n");
    }

    #[test]
    fn test_json_lines() {
        let matches = vec![found("a.txt", 1, 4, 6, "the god")];
        let mut out = Vec::new();
        print_json_lines(&mut out, &matches).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["path"], "a.txt");
        assert_eq!(value["line_number"], 1);
        assert_eq!(value["end"], 6);
        assert_eq!(value["query"], "q");
    }
}
