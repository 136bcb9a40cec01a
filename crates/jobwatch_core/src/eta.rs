use std::collections::VecDeque;
use std::fmt;

use crate::job::{EpochSeconds, JobStatus};

pub const ETA_WINDOW_CAPACITY: usize = 10;
/// Forecast used before any completion has been timed.
pub const DEFAULT_SECONDS_PER_ITEM: f64 = 12.0;

/// Most recent per-item durations, oldest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EtaWindow {
    samples: VecDeque<f64>,
}

impl EtaWindow {
    /// Negative or non-finite samples are stored as zero.
    pub fn push(&mut self, seconds_per_item: f64) {
        let sample = if seconds_per_item.is_finite() {
            seconds_per_item.max(0.0)
        } else {
            0.0
        };
        if self.samples.len() == ETA_WINDOW_CAPACITY {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Minutes(u64),
    Complete,
    /// Stopped jobs have no meaningful forecast.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EtaReport {
    pub remaining: Remaining,
    pub elapsed_minutes: u64,
}

impl fmt::Display for EtaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.remaining {
            Remaining::Minutes(minutes) => write!(f, "ETA: ~{minutes} min")?,
            Remaining::Complete => write!(f, "ETA: complete")?,
            Remaining::Unknown => write!(f, "ETA: —")?,
        }
        write!(f, " • Elapsed: {} min", self.elapsed_minutes)
    }
}

/// Sliding-window estimator fed once per successful poll.
///
/// Samples are weighted by completed items: a burst of N completions between
/// two observations contributes N copies of that burst's average duration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EtaEstimator {
    window: EtaWindow,
    last_done: u64,
    last_progress_at: Option<EpochSeconds>,
    started_at: Option<EpochSeconds>,
}

impl EtaEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, done: u64, started_at: Option<EpochSeconds>, now: EpochSeconds) {
        if self.started_at.is_none() {
            self.started_at = started_at;
        }

        let Some(previous_at) = self.last_progress_at else {
            self.last_done = done;
            self.last_progress_at = Some(now);
            return;
        };

        if done > self.last_done {
            let delta = done - self.last_done;
            let per_item = (now - previous_at).max(0.0) / delta as f64;
            // Anything beyond the capacity would be evicted immediately.
            let pushes = delta.min(ETA_WINDOW_CAPACITY as u64);
            for _ in 0..pushes {
                self.window.push(per_item);
            }
            self.last_progress_at = Some(now);
        }
        self.last_done = done;
    }

    pub fn window(&self) -> &EtaWindow {
        &self.window
    }

    pub fn started_at(&self) -> Option<EpochSeconds> {
        self.started_at
    }

    pub fn seconds_per_item(&self) -> f64 {
        match self.window.mean() {
            Some(mean) if mean.is_finite() && mean > 0.0 => mean,
            _ => DEFAULT_SECONDS_PER_ITEM,
        }
    }

    pub fn report(
        &self,
        status: &JobStatus,
        total: u64,
        done: u64,
        now: EpochSeconds,
    ) -> EtaReport {
        let elapsed_minutes = self
            .started_at
            .map(|started| ceil_minutes((now - started).max(0.0)))
            .unwrap_or(0);

        let remaining = match status {
            JobStatus::Done => Remaining::Complete,
            JobStatus::Stopped => Remaining::Unknown,
            _ => {
                let items_left = total.saturating_sub(done) as f64;
                Remaining::Minutes(ceil_minutes(items_left * self.seconds_per_item()))
            }
        };

        EtaReport {
            remaining,
            elapsed_minutes,
        }
    }
}

fn ceil_minutes(seconds: f64) -> u64 {
    (seconds / 60.0).ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_evicts_oldest_beyond_capacity() {
        let mut window = EtaWindow::default();
        for i in 0..15 {
            window.push(i as f64);
        }
        assert_eq!(window.len(), ETA_WINDOW_CAPACITY);
        assert_eq!(window.samples().next(), Some(5.0));
    }

    #[test]
    fn window_rejects_negative_samples() {
        let mut window = EtaWindow::default();
        window.push(-3.0);
        window.push(f64::NAN);
        assert!(window.samples().all(|s| s == 0.0));
    }

    #[test]
    fn burst_contributes_one_sample_per_item() {
        let mut eta = EtaEstimator::new();
        eta.observe(0, Some(1_000.0), 1_000.0);
        assert!(eta.window().is_empty());

        eta.observe(5, Some(1_000.0), 1_060.0);
        assert_eq!(eta.window().len(), 5);
        assert!(eta.window().samples().all(|s| (s - 12.0).abs() < f64::EPSILON));

        let report = eta.report(&JobStatus::Running, 20, 5, 1_060.0);
        assert_eq!(report.remaining, Remaining::Minutes(3));
        assert_eq!(report.elapsed_minutes, 1);
    }

    #[test]
    fn empty_window_falls_back_to_default_rate() {
        let eta = EtaEstimator::new();
        assert_eq!(eta.seconds_per_item(), DEFAULT_SECONDS_PER_ITEM);
        let report = eta.report(&JobStatus::Running, 10, 0, 0.0);
        assert_eq!(report.remaining, Remaining::Minutes(2));
        assert_eq!(report.elapsed_minutes, 0);
    }

    #[test]
    fn window_never_exceeds_capacity_or_goes_negative() {
        let mut eta = EtaEstimator::new();
        let mut now = 0.0;
        let mut done = 0;
        for step in 0..200u64 {
            now += (step % 7) as f64 * 1.5;
            done += step % 13;
            eta.observe(done, None, now);
            assert!(eta.window().len() <= ETA_WINDOW_CAPACITY);
            assert!(eta.window().samples().all(|s| s >= 0.0));
        }
    }

    #[test]
    fn clock_skew_clamps_to_zero() {
        let mut eta = EtaEstimator::new();
        eta.observe(0, None, 100.0);
        eta.observe(2, None, 90.0);
        assert!(eta.window().samples().all(|s| s == 0.0));
        // All-zero window falls back to the default forecast.
        assert_eq!(eta.seconds_per_item(), DEFAULT_SECONDS_PER_ITEM);
    }

    #[test]
    fn done_reports_complete_and_keeps_elapsed() {
        let mut eta = EtaEstimator::new();
        eta.observe(3, Some(0.0), 125.0);
        let report = eta.report(&JobStatus::Done, 3, 3, 125.0);
        assert_eq!(report.remaining, Remaining::Complete);
        assert_eq!(report.elapsed_minutes, 3);
        assert_eq!(report.to_string(), "ETA: complete • Elapsed: 3 min");
    }

    #[test]
    fn started_at_is_captured_once() {
        let mut eta = EtaEstimator::new();
        eta.observe(0, None, 10.0);
        eta.observe(0, Some(5.0), 12.0);
        eta.observe(0, Some(9.0), 14.0);
        assert_eq!(eta.started_at(), Some(5.0));
    }
}
