//! Rolling per-window admission budget

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

use crate::constants::dispatch::WINDOW_WAIT_BUFFER_MS;

/// Tracks admission timestamps inside a trailing window.
///
/// Never more than `max_per_window` records are younger than `window`,
/// provided callers `prune` and check `has_capacity` before each `record`.
#[derive(Debug, Clone)]
pub struct RateWindow {
    max_per_window: usize,
    window: Duration,
    admissions: VecDeque<Instant>,
}

impl RateWindow {
    pub fn new(max_per_window: NonZeroUsize, window: Duration) -> Self {
        Self {
            max_per_window: max_per_window.get(),
            window,
            admissions: VecDeque::with_capacity(max_per_window.get()),
        }
    }

    pub fn max_per_window(&self) -> usize {
        self.max_per_window
    }

    /// Drops records that are `window` or more old.
    pub fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.admissions.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.admissions.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.admissions.len() < self.max_per_window
    }

    /// How long until the oldest record leaves the window, plus a small buffer.
    pub fn wait_time(&self, now: Instant) -> Duration {
        match self.admissions.front() {
            Some(&oldest) => {
                (oldest + self.window).saturating_duration_since(now)
                    + Duration::from_millis(WINDOW_WAIT_BUFFER_MS)
            }
            None => Duration::ZERO,
        }
    }

    pub fn record(&mut self, now: Instant) {
        self.admissions.push_back(now);
    }

    /// Admissions younger than the window, without pruning.
    pub fn admitted_in_window(&self, now: Instant) -> usize {
        self.admissions
            .iter()
            .filter(|&&at| now.saturating_duration_since(at) < self.window)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn budget(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_capacity_runs_out_at_budget() {
        let now = Instant::now();
        let mut window = RateWindow::new(budget(3), MINUTE);

        for _ in 0..3 {
            assert!(window.has_capacity());
            window.record(now);
        }
        assert!(!window.has_capacity());
        assert_eq!(window.admitted_in_window(now), 3);
    }

    #[test]
    fn test_prune_frees_capacity_after_window() {
        let start = Instant::now();
        let mut window = RateWindow::new(budget(2), MINUTE);
        window.record(start);
        window.record(start + Duration::from_secs(10));

        window.prune(start + Duration::from_secs(59));
        assert!(!window.has_capacity());

        window.prune(start + MINUTE);
        assert!(window.has_capacity());
        assert_eq!(window.admitted_in_window(start + MINUTE), 1);
    }

    #[test]
    fn test_wait_time_targets_oldest_record() {
        let start = Instant::now();
        let mut window = RateWindow::new(budget(1), MINUTE);
        window.record(start);

        let wait = window.wait_time(start + Duration::from_secs(45));
        assert_eq!(
            wait,
            Duration::from_secs(15) + Duration::from_millis(WINDOW_WAIT_BUFFER_MS)
        );
    }

    #[test]
    fn test_wait_time_empty_window_is_zero() {
        let window = RateWindow::new(budget(5), MINUTE);
        assert_eq!(window.wait_time(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_admitted_in_window_does_not_mutate() {
        let start = Instant::now();
        let mut window = RateWindow::new(budget(5), MINUTE);
        window.record(start);

        let later = start + Duration::from_secs(120);
        assert_eq!(window.admitted_in_window(later), 0);
        // The stale record is only removed by an explicit prune
        assert!(window.has_capacity());
        window.prune(later);
        assert_eq!(window.admitted_in_window(later), 0);
    }
}
