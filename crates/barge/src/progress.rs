//! Terminal progress display for a running import.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

/// Formats a number with thousands separators.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Formats a Duration into MM:SS or HH:MM:SS.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Tracks files and records imported so far and renders them on a bar.
///
/// The folder size is unknown up front (the listing is paginated), so there
/// is no percent or ETA; rates come from a 5-second sliding window so short
/// bursts don't distort the display.
pub(crate) struct ProgressMetrics {
    source_name: String,
    total_files: u64,
    total_records: u64,
    progress_bar: ProgressBar,
    /// Sliding window of (timestamp, records) samples.
    rate_samples: VecDeque<(Instant, u64)>,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // ProgressBar does not implement Debug.
        f.debug_struct("ProgressMetrics")
            .field("source_name", &self.source_name)
            .field("total_files", &self.total_files)
            .field("total_records", &self.total_records)
            .finish()
    }
}

impl ProgressMetrics {
    pub(crate) fn new(source_name: String) -> Self {
        let progress_bar = ProgressBar::new(0);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n| [{bar:40.cyan/blue}]")
                .unwrap() // safe: template string is hardcoded and valid
                .progress_chars("=>-"),
        );

        let start_time = Instant::now();
        let mut rate_samples = VecDeque::new();
        rate_samples.push_back((start_time, 0u64));

        Self {
            source_name,
            total_files: 0,
            total_records: 0,
            progress_bar,
            rate_samples,
            start_time,
        }
    }

    /// Feed the display with one page's worth of results.
    pub(crate) fn update(&mut self, files: u64, records: u64) {
        self.total_files += files;
        self.total_records += records;

        let rate = self.records_per_sec();
        self.render(rate);
        self.progress_bar.set_position(self.total_files);
    }

    pub(crate) fn finish(&self) {
        self.progress_bar.finish();
    }

    fn records_per_sec(&mut self) -> f64 {
        let now = Instant::now();
        let window = Duration::from_secs(5);
        while let Some(&(timestamp, _)) = self.rate_samples.front() {
            if now.duration_since(timestamp) > window {
                self.rate_samples.pop_front();
            } else {
                break;
            }
        }

        self.rate_samples.push_back((now, self.total_records));

        if let Some(&(oldest_time, oldest_records)) = self.rate_samples.front() {
            let elapsed = now.duration_since(oldest_time).as_secs_f64();
            if elapsed > 0.0 {
                let delta = self.total_records.saturating_sub(oldest_records);
                return delta as f64 / elapsed;
            }
        }
        0.0
    }

    fn render(&self, records_per_sec: f64) {
        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);

        table.add_row(vec![
            Cell::new(format!("{} Records/s", format_number(records_per_sec as u64)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} Records", format_number(self.total_records)))
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} Files", format_number(self.total_files)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} elapsed", format_duration(self.start_time.elapsed())))
                .set_alignment(CellAlignment::Right),
        ]);

        self.progress_bar
            .set_message(format!("source: {}\n{}", self.source_name, table));
    }
}
