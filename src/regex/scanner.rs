//! Line-aware match enumeration.
//!
//! [`Matches`] drives one [`Runner`] across a text buffer and yields a
//! [`MatchSpan`] each time a match ends. Matches never span lines. There is
//! no backtracking and no longest-match search: a character that makes the
//! automaton fail is re-presented once after a reset, so it can begin the
//! next match, and then the cursor moves on.
//!
//! [`scan`] runs the same loop on a producer thread and hands the spans to
//! the caller through a channel.

use crate::regex::nfa::Nfa;
use crate::regex::runner::{Runner, Status};
use crossbeam_channel::{bounded, Receiver};
use std::str::Chars;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Default capacity of the channel behind [`scan`]
pub const SCAN_CHANNEL_CAPACITY: usize = 1024;

/// One match. Offsets are code-point columns within the line; `end` is
/// inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
    /// 1-based line number
    pub line: usize,
    pub start: usize,
    pub end: usize,
    /// Pattern that produced this match
    pub query: Arc<str>,
}

impl MatchSpan {
    /// `(line, start, end)`
    pub fn position(&self) -> (usize, usize, usize) {
        (self.line, self.start, self.end)
    }

    /// Number of code points covered
    pub fn width(&self) -> usize {
        self.end + 1 - self.start
    }
}

/// Cooperative cancellation flag, checked once per scanned code point
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Whether the character under the cursor is being presented for the
/// first time or re-presented after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Fresh,
    Retrying,
}

/// Lazy iterator over the matches of an automaton in a text buffer
pub struct Matches<'n, 't> {
    runner: Runner<'n>,
    chars: Chars<'t>,
    /// Character under the cursor
    current: Option<char>,
    query: Arc<str>,
    cancel: Option<CancelToken>,
    /// Code-point offset of `current`
    pos: usize,
    line: usize,
    line_start: usize,
    /// Where the runner was last reset
    start: usize,
    last_success: usize,
    in_match: bool,
    mode: Mode,
    empty_input: bool,
    done: bool,
}

impl<'n, 't> Matches<'n, 't> {
    pub fn new(nfa: &'n Nfa, text: &'t str) -> Self {
        let mut chars = text.chars();
        let current = chars.next();
        Self {
            runner: Runner::new(nfa),
            chars,
            current,
            query: Arc::from(""),
            cancel: None,
            pos: 0,
            line: 1,
            line_start: 0,
            start: 0,
            last_success: 0,
            in_match: false,
            mode: Mode::Fresh,
            empty_input: current.is_none(),
            done: false,
        }
    }

    /// Tag every span with the originating pattern
    pub fn with_query(mut self, query: impl Into<Arc<str>>) -> Self {
        self.query = query.into();
        self
    }

    /// Stop (without flushing) once `token` is cancelled
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn advance(&mut self) {
        self.current = self.chars.next();
        self.pos += 1;
    }

    /// End the match in progress, if any
    fn take_match(&mut self) -> Option<MatchSpan> {
        if !self.in_match {
            return None;
        }
        self.in_match = false;
        Some(MatchSpan {
            line: self.line,
            start: self.start - self.line_start,
            end: self.last_success - self.line_start,
            query: Arc::clone(&self.query),
        })
    }

    /// Empty input still matches patterns that accept zero characters
    fn probe_empty(&mut self) -> Option<MatchSpan> {
        self.runner.reset();
        let accepted =
            self.runner.status() == Status::Success || self.runner.next('\0') == Status::Success;
        accepted.then(|| MatchSpan {
            line: 1,
            start: 0,
            end: 0,
            query: Arc::clone(&self.query),
        })
    }
}

impl Iterator for Matches<'_, '_> {
    type Item = MatchSpan;

    fn next(&mut self) -> Option<MatchSpan> {
        if self.done {
            return None;
        }

        loop {
            if self.is_cancelled() {
                trace!(line = self.line, "scan cancelled");
                self.done = true;
                return None;
            }

            let Some(c) = self.current else {
                self.done = true;
                if self.empty_input {
                    return self.probe_empty();
                }
                return self.take_match();
            };

            if c == '\n' {
                let flushed = self.take_match();
                self.runner.reset();
                self.line += 1;
                self.advance();
                self.line_start = self.pos;
                self.start = self.pos;
                self.mode = Mode::Fresh;
                if flushed.is_some() {
                    return flushed;
                }
                continue;
            }

            match self.runner.next(c) {
                Status::Success => {
                    self.in_match = true;
                    self.last_success = self.pos;
                    self.advance();
                    self.mode = Mode::Fresh;
                }
                Status::Normal => {
                    self.advance();
                    self.mode = Mode::Fresh;
                }
                Status::Fail => {
                    let flushed = self.take_match();
                    self.runner.reset();
                    match self.mode {
                        Mode::Fresh => self.mode = Mode::Retrying,
                        Mode::Retrying => {
                            self.advance();
                            self.mode = Mode::Fresh;
                        }
                    }
                    self.start = self.pos;
                    if flushed.is_some() {
                        return flushed;
                    }
                }
            }
        }
    }
}

/// Collect every match of `nfa` in `text`
pub fn find_all(nfa: &Nfa, text: &str) -> Vec<MatchSpan> {
    Matches::new(nfa, text).collect()
}

/// Receiving end of an asynchronous scan. Finite; ends when the producer
/// finishes or is cancelled.
pub struct MatchStream {
    receiver: Receiver<MatchSpan>,
}

impl MatchStream {
    pub fn into_receiver(self) -> Receiver<MatchSpan> {
        self.receiver
    }
}

impl Iterator for MatchStream {
    type Item = MatchSpan;

    fn next(&mut self) -> Option<MatchSpan> {
        self.receiver.recv().ok()
    }
}

/// Scan `text` on a producer thread, streaming spans as they are found
pub fn scan(
    nfa: Arc<Nfa>,
    text: String,
    query: impl Into<Arc<str>>,
    cancel: CancelToken,
) -> MatchStream {
    scan_with_capacity(nfa, text, query, cancel, SCAN_CHANNEL_CAPACITY)
}

/// [`scan`] with an explicit channel capacity
pub fn scan_with_capacity(
    nfa: Arc<Nfa>,
    text: String,
    query: impl Into<Arc<str>>,
    cancel: CancelToken,
    capacity: usize,
) -> MatchStream {
    let (sender, receiver) = bounded(capacity.max(1));
    let query = query.into();

    std::thread::spawn(move || {
        let matches = Matches::new(&nfa, &text)
            .with_query(query)
            .with_cancel(cancel);
        for span in matches {
            // Receiver dropped: nobody is listening any more
            if sender.send(span).is_err() {
                break;
            }
        }
    });

    MatchStream { receiver }
}
