//! Live run-completion tracking with a throttled terminal display

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::humanize::format_compact;
use crate::pool::Task;

const BAR_WIDTH: usize = 20;

#[derive(Debug)]
struct TierCounter {
    total: usize,
    done: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub completed: usize,
    pub errors: usize,
}

/// Process-wide counters plus the throttled progress line.
///
/// The tier map is fixed at construction; all mutation afterwards goes
/// through atomic increments, so concurrent workers never race.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
    errors: AtomicUsize,
    started: Instant,
    interval: Duration,
    last_render_ms: AtomicU64,
    tiers: HashMap<String, TierCounter>,
}

impl ProgressTracker {
    pub fn new(tasks: &[Task], interval: Duration) -> Self {
        let mut tiers: HashMap<String, TierCounter> = HashMap::new();
        for task in tasks {
            tiers
                .entry(task.tier.clone())
                .or_insert_with(|| TierCounter {
                    total: 0,
                    done: AtomicUsize::new(0),
                })
                .total += 1;
        }

        Self {
            total: tasks.len(),
            completed: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            started: Instant::now(),
            interval,
            last_render_ms: AtomicU64::new(0),
            tiers,
        }
    }

    /// Count one finished task (success or failure) against the global and
    /// per-tier counters. Monotonic; safe under concurrent callers.
    pub fn record_completion(&self, tier: &str) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Some(counter) = self.tiers.get(tier) {
            counter.done.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total,
            completed: self.completed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn tier_done(&self, tier: &str) -> Option<(usize, usize)> {
        self.tiers
            .get(tier)
            .map(|counter| (counter.done.load(Ordering::Relaxed), counter.total))
    }

    /// Redraw the progress line, at most once per interval unless forced.
    /// The displayed tier is whichever task most recently completed; it is
    /// cosmetic only. The last render of a run must be forced so the
    /// terminal settles at 100%.
    pub fn maybe_render(&self, last_tier: Option<&str>, force_final: bool) {
        let now_ms = self.started.elapsed().as_millis() as u64;
        if force_final {
            self.last_render_ms.store(now_ms, Ordering::Relaxed);
        } else {
            let last = self.last_render_ms.load(Ordering::Relaxed);
            if now_ms.saturating_sub(last) < self.interval.as_millis() as u64 {
                return;
            }
            // One concurrent caller wins the render slot; the rest skip.
            if self
                .last_render_ms
                .compare_exchange(last, now_ms, Ordering::Relaxed, Ordering::Relaxed)
                .is_err()
            {
                return;
            }
        }

        let snapshot = self.snapshot();
        let ratio = if snapshot.total == 0 {
            1.0
        } else {
            snapshot.completed as f64 / snapshot.total as f64
        };
        let eta = estimate_eta(snapshot.completed, snapshot.total, self.elapsed());

        let tier_part = match last_tier.and_then(|tier| self.tier_done(tier).map(|c| (tier, c))) {
            Some((tier, (done, total))) => format!("{tier}: {done}/{total} | "),
            None => String::new(),
        };

        let line = format!(
            "{}{}/{} | {} {:.1}% | ETA ~{}",
            tier_part,
            snapshot.completed,
            snapshot.total,
            render_bar(ratio, BAR_WIDTH),
            ratio * 100.0,
            format_compact(eta),
        );

        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "\r\x1b[K{line}");
        if force_final {
            let _ = writeln!(stdout);
        }
        let _ = stdout.flush();
    }
}

/// Remaining work over observed throughput, floored at zero so clock
/// anomalies never produce a negative estimate.
pub fn estimate_eta(completed: usize, total: usize, elapsed: Duration) -> Duration {
    let elapsed_secs = elapsed.as_secs_f64();
    if completed == 0 || elapsed_secs <= 0.0 {
        return Duration::ZERO;
    }
    let throughput = completed as f64 / elapsed_secs;
    if throughput <= 0.0 {
        return Duration::ZERO;
    }
    let remaining = total.saturating_sub(completed) as f64;
    Duration::from_secs_f64((remaining / throughput).max(0.0))
}

/// Proportional fixed-width bar, `█` for done and `░` for remaining
pub fn render_bar(ratio: f64, width: usize) -> String {
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round()) as usize;
    let mut bar = "█".repeat(filled);
    bar.push_str(&"░".repeat(width - filled));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn tasks_for(tiers: &[(&str, usize)]) -> Vec<Task> {
        let mut tasks = Vec::new();
        for (tier, count) in tiers {
            for i in 1..=*count {
                tasks.push(Task {
                    path: PathBuf::from(format!("dataset/{tier}/doc_{i}.html")),
                    tier: tier.to_string(),
                    tier_index: i,
                    tier_total: *count,
                });
            }
        }
        tasks
    }

    #[test]
    fn test_tier_totals_fixed_at_construction() {
        let tracker = ProgressTracker::new(&tasks_for(&[("a", 3), ("b", 1)]), Duration::ZERO);
        assert_eq!(tracker.tier_done("a"), Some((0, 3)));
        assert_eq!(tracker.tier_done("b"), Some((0, 1)));
        assert_eq!(tracker.tier_done("missing"), None);
    }

    #[test]
    fn test_completion_counters_are_monotonic() {
        let tracker = ProgressTracker::new(&tasks_for(&[("a", 3)]), Duration::ZERO);
        tracker.record_completion("a");
        tracker.record_completion("a");

        assert_eq!(tracker.snapshot().completed, 2);
        assert_eq!(tracker.tier_done("a"), Some((2, 3)));
    }

    #[test]
    fn test_done_never_exceeds_total_during_run() {
        let tracker = Arc::new(ProgressTracker::new(
            &tasks_for(&[("a", 40)]),
            Duration::ZERO,
        ));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let tracker = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for _ in 0..10 {
                    tracker.record_completion("a");
                    let (done, total) = tracker.tier_done("a").unwrap();
                    assert!(done <= total);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.tier_done("a"), Some((40, 40)));
    }

    #[test]
    fn test_error_counter() {
        let tracker = ProgressTracker::new(&tasks_for(&[("a", 1)]), Duration::ZERO);
        tracker.record_error();
        tracker.record_error();
        assert_eq!(tracker.snapshot().errors, 2);
    }

    #[test]
    fn test_eta_floors_at_zero() {
        assert_eq!(estimate_eta(0, 10, Duration::from_secs(5)), Duration::ZERO);
        assert_eq!(estimate_eta(10, 10, Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_eta_proportional_to_remaining() {
        // 5 done in 10s -> 0.5/s -> 5 remaining take ~10s
        let eta = estimate_eta(5, 10, Duration::from_secs(10));
        assert!((eta.as_secs_f64() - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_bar_is_fixed_width_and_proportional() {
        assert_eq!(render_bar(0.0, 20), "░".repeat(20));
        assert_eq!(render_bar(1.0, 20), "█".repeat(20));

        let half = render_bar(0.5, 20);
        assert_eq!(half.chars().count(), 20);
        assert_eq!(half.chars().filter(|&c| c == '█').count(), 10);
    }

    #[test]
    fn test_render_does_not_panic_on_empty_run() {
        let tracker = ProgressTracker::new(&[], Duration::ZERO);
        tracker.maybe_render(None, true);
    }
}
