//! Progress reporting for a running scrape.
//!
//! The pagination driver calls into a [`Progress`] sink; the CLI renders it as
//! an `indicatif` bar, tests record the calls.

use indicatif::{ProgressBar, ProgressStyle};

pub trait Progress {
    /// Called once before the first page with the number of pages to fetch.
    fn begin(&mut self, _total: u32) {}

    /// Called before a page is fetched.
    fn page_started(&mut self, _page: u32, _url: &str) {}

    /// Called after a page completes, successfully or not.
    /// `fraction` is `page / total` and never decreases within a run.
    fn page_done(&mut self, _page: u32, _fraction: f64) {}

    /// Called after the last page.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Terminal progress bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} pages  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏ ");
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for BarProgress {
    fn begin(&mut self, total: u32) {
        self.bar.set_length(u64::from(total));
        self.bar.set_position(0);
    }

    fn page_started(&mut self, page: u32, _url: &str) {
        self.bar.set_message(format!("scraping page {page}..."));
    }

    fn page_done(&mut self, page: u32, _fraction: f64) {
        self.bar.set_position(u64::from(page));
    }

    fn finish(&mut self) {
        self.bar.finish_with_message("done");
    }
}
