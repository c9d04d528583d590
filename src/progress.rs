//! Progress accounting and rendering
//!
//! Counters are threaded through the run loop as a plain value and returned
//! at the end, never shared or mutated through globals. Rendering is pure
//! presentation: text in, text out, no side effects.

use std::time::{Duration, Instant};

/// Default width of the rendered progress bar, in cells
pub const DEFAULT_BAR_WIDTH: usize = 50;

/// Running counters for one invocation
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Number of candidate files in this run
    pub total: usize,
    /// Files the loop has finished with, successfully or not
    pub processed: usize,
    /// Files fully converted/aggregated
    pub succeeded: usize,
    /// Files skipped or failed, including partial successes
    pub failed: usize,
    /// Wall-clock start of the run
    pub started: Instant,
}

impl RunStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            succeeded: 0,
            failed: 0,
            started: Instant::now(),
        }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    /// Completion ratio in `0.0..=1.0`; a zero-total run counts as complete
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Estimated remaining time, `avg_time_per_item * remaining_items`.
    /// Undefined until at least one item has completed.
    pub fn eta(&self) -> Option<Duration> {
        if self.processed == 0 {
            return None;
        }
        let remaining = self.total.saturating_sub(self.processed);
        let avg = self.elapsed() / self.processed as u32;
        Some(avg * remaining as u32)
    }

    pub fn summary(&self) -> String {
        format!(
            "Total: {}, Processed: {}, Succeeded: {}, Failed: {}",
            self.total, self.processed, self.succeeded, self.failed
        )
    }
}

/// Render a fixed-width bar of filled/empty glyphs plus a percentage
pub fn render_bar(stats: &RunStats, width: usize) -> String {
    let ratio = stats.ratio().clamp(0.0, 1.0);
    let filled = (width as f64 * ratio) as usize;
    let bar: String = "█".repeat(filled) + &"░".repeat(width.saturating_sub(filled));
    format!("[{}] {:.1}%", bar, ratio * 100.0)
}

/// One-line progress report: bar, elapsed, and estimated remaining time
pub fn render_progress_line(stats: &RunStats) -> String {
    let bar = render_bar(stats, DEFAULT_BAR_WIDTH);
    match stats.eta() {
        Some(eta) => format!(
            "{} elapsed: {} remaining: {}",
            bar,
            format_duration(stats.elapsed()),
            format_duration(eta)
        ),
        None => format!("{} elapsed: {}", bar, format_duration(stats.elapsed())),
    }
}

/// Humanize a duration as seconds, minutes+seconds, or hours+minutes+seconds
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let minutes = (secs / 60.0) as u64;
        format!("{}m{:.1}s", minutes, secs % 60.0)
    } else {
        let hours = (secs / 3600.0) as u64;
        let minutes = ((secs % 3600.0) / 60.0) as u64;
        format!("{}h{}m{:.1}s", hours, minutes, secs % 60.0)
    }
}
