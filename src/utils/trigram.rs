use crate::index::types::Trigram;
use std::str::Chars;

/// Sliding 3-code-point window over one line
pub struct CharWindows<'a> {
    chars: Chars<'a>,
    prev: Option<(char, char)>,
}

impl<'a> CharWindows<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars(),
            prev: None,
        }
    }
}

impl Iterator for CharWindows<'_> {
    type Item = Trigram;

    fn next(&mut self) -> Option<Trigram> {
        let (a, b) = match self.prev {
            Some(pair) => pair,
            None => (self.chars.next()?, self.chars.next()?),
        };
        let c = self.chars.next()?;
        self.prev = Some((b, c));
        Some([a, b, c])
    }
}

/// Every trigram of `text`, line by line. No window spans a line feed.
/// Duplicates are kept, in scan order.
pub fn line_trigrams(text: &str) -> impl Iterator<Item = Trigram> + '_ {
    text.split('\n').flat_map(CharWindows::new)
}

/// Unique trigrams of `text`, sorted
pub fn extract_trigrams(text: &str) -> Vec<Trigram> {
    let mut trigrams: Vec<Trigram> = line_trigrams(text).collect();
    trigrams.sort_unstable();
    trigrams.dedup();
    trigrams
}

/// Check if content is likely binary
pub fn is_binary(content: &[u8]) -> bool {
    let sample_size = content.len().min(8192);
    let sample = &content[..sample_size];

    // Any NUL in the sample
    if memchr::memchr(0, sample).is_some() {
        return true;
    }

    let non_text_count = sample
        .iter()
        .filter(|&&b| b < 0x20 && b != b'\n' && b != b'\r' && b != b'\t')
        .count();

    non_text_count > sample_size / 8
}
