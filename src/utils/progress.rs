//! Terminal progress for index builds. Without the `progress` feature no
//! bar is ever created and every call is a no-op.

use self::display::{file_bar, spinner, Bar};

/// A spinner or file bar shown while an index is built
#[derive(Default)]
pub struct IndexProgress {
    bar: Option<Bar>,
}

impl IndexProgress {
    pub fn hidden() -> Self {
        Self::default()
    }

    /// Spinner for the directory walk
    pub fn discovering(visible: bool) -> Self {
        Self {
            bar: visible.then(spinner).flatten(),
        }
    }

    /// Bar counting files read
    pub fn reading(visible: bool, files: usize) -> Self {
        Self {
            bar: visible.then(|| file_bar(files as u64)).flatten(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    /// One more file done
    pub fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(self, message: String) {
        if let Some(bar) = self.bar {
            bar.finish_with_message(message);
        }
    }
}

#[cfg(feature = "progress")]
mod display {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::Duration;

    pub type Bar = ProgressBar;

    pub fn spinner() -> Option<Bar> {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Discovering files...");
        spinner.enable_steady_tick(Duration::from_millis(80));
        Some(spinner)
    }

    pub fn file_bar(len: u64) -> Option<Bar> {
        let bar = ProgressBar::new(len);
        let template = concat!(
            "{spinner:.green} [{elapsed_precise}] ",
            "[{bar:40.cyan/blue}] {pos}/{len} files {msg}"
        );
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message("indexing");
        Some(bar)
    }
}

#[cfg(not(feature = "progress"))]
mod display {
    /// Uninhabited: there is nothing to draw
    pub enum Bar {}

    impl Bar {
        pub fn inc(&self, _delta: u64) {
            match *self {}
        }

        pub fn finish_with_message(self, _message: String) {
            match self {}
        }
    }

    pub fn spinner() -> Option<Bar> {
        None
    }

    pub fn file_bar(_len: u64) -> Option<Bar> {
        None
    }
}
