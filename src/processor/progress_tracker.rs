use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

pub struct ProgressTracker {
    pb: ProgressBar,
    start_time: Instant,
    fetched: usize,
}

impl ProgressTracker {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
            pb.set_style(style);
        }

        Self {
            pb,
            start_time: Instant::now(),
            fetched: 0,
        }
    }

    /// Tracker that never draws; used where no terminal is attached.
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
            start_time: Instant::now(),
            fetched: 0,
        }
    }

    pub fn start(&mut self, message: &str) {
        self.start_time = Instant::now();
        self.pb.set_message(message.to_string());
        self.pb.enable_steady_tick(Duration::from_millis(100));
    }

    pub fn update(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    pub fn log_page(&mut self, page: u32, total: u32, rows: usize) {
        self.pb.set_message(format!(
            "Page {}/{}: {} rows ({} records fetched so far)",
            page, total, rows, self.fetched
        ));
    }

    pub fn log_record(&mut self, qid: &str) {
        self.fetched += 1;
        self.pb.set_message(format!("Fetched QID {} ({} total)", qid, self.fetched));
    }

    pub fn fetched(&self) -> usize {
        self.fetched
    }

    pub fn complete(&self, message: &str) {
        self.pb.finish_with_message(format!(
            "{} in {:.2} seconds",
            message,
            self.start_time.elapsed().as_secs_f32()
        ));
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
