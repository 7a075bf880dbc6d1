//! Statistics gatherer hierarchy: an online mean/standard-error accumulator,
//! a convergence-snapshot decorator, and two ways to share one across
//! threads (mutex-protected, lock-free).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Capability consumed by the synchronous engine: push one path result,
/// read back `[mean, stderr]` rows (one row per tracked quantity; the
/// convergence decorator appends one row per stopping point instead).
pub trait Gatherer {
    fn observe(&mut self, x: f64);
    fn results(&self) -> Vec<Vec<f64>>;
}

/// Capability required by the async pricing path: `observe` through a
/// shared reference, safe to call from multiple threads concurrently.
/// Implemented only by [`StatisticsThreadSafe`] and [`StatisticsMeanLockFree`]
/// — passing a plain [`StatisticsMean`] to the async engine is therefore a
/// compile error rather than the "programmer error" the original design
/// could only document.
pub trait SyncGatherer: Send + Sync {
    fn observe_shared(&self, x: f64);
    fn results(&self) -> Vec<Vec<f64>>;
}

/// Online mean and standard error from a running sum and sum of squares.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatisticsMean {
    n: u64,
    sum: f64,
    sum_sq: f64,
}

impl StatisticsMean {
    pub fn new() -> Self {
        StatisticsMean::default()
    }

    pub fn path_count(&self) -> u64 {
        self.n
    }
}

impl Gatherer for StatisticsMean {
    fn observe(&mut self, x: f64) {
        self.n += 1;
        self.sum += x;
        self.sum_sq += x * x;
    }

    fn results(&self) -> Vec<Vec<f64>> {
        if self.n == 0 {
            return vec![vec![0.0, 0.0]];
        }
        let mean = self.sum / self.n as f64;
        let stderr = if self.n == 1 {
            0.0
        } else {
            let variance =
                ((self.sum_sq - self.n as f64 * mean * mean) / (self.n as f64 - 1.0)).max(0.0);
            (variance / self.n as f64).sqrt()
        };
        vec![vec![mean, stderr]]
    }
}

/// Wraps an inner gatherer and snapshots `(pathCount, ...innerResults)` the
/// instant the observation count reaches one of `stopping_points`. Value
/// semantics: cloning copies both the inner accumulator and the log.
#[derive(Clone, Debug)]
pub struct StatisticsConvergence<Inner: Gatherer + Clone> {
    inner: Inner,
    stopping_points: Vec<u64>,
    log: Vec<Vec<f64>>,
    paths_done: u64,
    next_stop: usize,
}

impl<Inner: Gatherer + Clone> StatisticsConvergence<Inner> {
    pub fn new(inner: Inner, stopping_points: Vec<u64>) -> Self {
        StatisticsConvergence {
            inner,
            stopping_points,
            log: Vec::new(),
            paths_done: 0,
            next_stop: 0,
        }
    }

    pub fn inner(&self) -> &Inner {
        &self.inner
    }

    fn snapshot_row(&self) -> Vec<f64> {
        let mut entry = vec![self.paths_done as f64];
        for row in self.inner.results() {
            entry.extend(row);
        }
        entry
    }
}

impl<Inner: Gatherer + Clone> Gatherer for StatisticsConvergence<Inner> {
    fn observe(&mut self, x: f64) {
        self.inner.observe(x);
        self.paths_done += 1;

        if self.next_stop < self.stopping_points.len()
            && self.paths_done == self.stopping_points[self.next_stop]
        {
            let row = self.snapshot_row();
            self.log.push(row);
            self.next_stop += 1;
        }
    }

    fn results(&self) -> Vec<Vec<f64>> {
        let mut out = self.log.clone();
        let already_logged = out
            .last()
            .map(|row| row[0] as u64 == self.paths_done)
            .unwrap_or(false);
        if self.paths_done > 0 && !already_logged {
            out.push(self.snapshot_row());
        }
        out
    }
}

/// Mutex-protected decorator: linearizes every `observe`/`results` call
/// across threads. Not `Clone` — a mutex cannot be sensibly duplicated.
pub struct StatisticsThreadSafe<Inner: Gatherer> {
    inner: Mutex<Inner>,
}

impl<Inner: Gatherer> StatisticsThreadSafe<Inner> {
    pub fn new(inner: Inner) -> Self {
        StatisticsThreadSafe {
            inner: Mutex::new(inner),
        }
    }

    fn observe_locked(&self, x: f64) {
        self.inner
            .lock()
            .expect("gatherer mutex poisoned by a panicking observer")
            .observe(x);
    }

    fn results_locked(&self) -> Vec<Vec<f64>> {
        self.inner
            .lock()
            .expect("gatherer mutex poisoned by a panicking observer")
            .results()
    }
}

impl<Inner: Gatherer> Gatherer for StatisticsThreadSafe<Inner> {
    fn observe(&mut self, x: f64) {
        self.observe_locked(x);
    }

    fn results(&self) -> Vec<Vec<f64>> {
        self.results_locked()
    }
}

impl<Inner: Gatherer + Send> SyncGatherer for StatisticsThreadSafe<Inner> {
    fn observe_shared(&self, x: f64) {
        self.observe_locked(x);
    }

    fn results(&self) -> Vec<Vec<f64>> {
        self.results_locked()
    }
}

/// Lock-free mean/standard-error accumulator: three independent atomics
/// updated with relaxed ordering. Summation is associative and commutative,
/// so interleavings across producer threads need no ordering stronger than
/// relaxed; a monitor calling `snapshot` mid-flight may see `n` updated
/// before the sums catch up (a torn read), which is fine for progress
/// display and is absorbed by clamping variance to zero. Not `Clone`:
/// copying the three atomics independently would not be a coherent snapshot.
#[derive(Default)]
pub struct StatisticsMeanLockFree {
    n: AtomicU64,
    sum_bits: AtomicU64,
    sum_sq_bits: AtomicU64,
}

impl StatisticsMeanLockFree {
    pub fn new() -> Self {
        StatisticsMeanLockFree::default()
    }

    fn atomic_add(target: &AtomicU64, delta: f64) {
        let mut current = target.load(Ordering::Relaxed);
        loop {
            let updated = f64::from_bits(current) + delta;
            match target.compare_exchange_weak(
                current,
                updated.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    fn record(&self, x: f64) {
        self.n.fetch_add(1, Ordering::Relaxed);
        Self::atomic_add(&self.sum_bits, x);
        Self::atomic_add(&self.sum_sq_bits, x * x);
    }

    fn snapshot(&self) -> Vec<Vec<f64>> {
        let n = self.n.load(Ordering::Relaxed);
        if n == 0 {
            return vec![vec![0.0, 0.0]];
        }
        let sum = f64::from_bits(self.sum_bits.load(Ordering::Relaxed));
        let sum_sq = f64::from_bits(self.sum_sq_bits.load(Ordering::Relaxed));
        let n_f = n as f64;
        let mean = sum / n_f;
        let stderr = if n == 1 {
            0.0
        } else {
            let variance = ((sum_sq - n_f * mean * mean) / (n_f - 1.0)).max(0.0);
            (variance / n_f).sqrt()
        };
        vec![vec![mean, stderr]]
    }

    pub fn path_count(&self) -> u64 {
        self.n.load(Ordering::Relaxed)
    }
}

impl Gatherer for StatisticsMeanLockFree {
    fn observe(&mut self, x: f64) {
        self.record(x);
    }

    fn results(&self) -> Vec<Vec<f64>> {
        self.snapshot()
    }
}

impl SyncGatherer for StatisticsMeanLockFree {
    fn observe_shared(&self, x: f64) {
        self.record(x);
    }

    fn results(&self) -> Vec<Vec<f64>> {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn n_identical_observations_give_zero_stderr() {
        let mut g = StatisticsMean::new();
        for _ in 0..50 {
            g.observe(3.5);
        }
        let results = g.results();
        assert!((results[0][0] - 3.5).abs() < 1e-12);
        assert_eq!(results[0][1], 0.0);
    }

    #[test]
    fn zero_observations_yield_zero_zero() {
        let g = StatisticsMean::new();
        assert_eq!(g.results(), vec![vec![0.0, 0.0]]);
    }

    #[test]
    fn single_observation_has_zero_stderr() {
        let mut g = StatisticsMean::new();
        g.observe(7.0);
        assert_eq!(g.results(), vec![vec![7.0, 0.0]]);
    }

    #[test]
    fn convergence_logs_at_exact_stopping_points() {
        let mut g = StatisticsConvergence::new(StatisticsMean::new(), vec![2, 4]);
        for i in 1..=5u64 {
            g.observe(i as f64);
        }
        let results = g.results();
        // Logged rows at n=2 and n=4, plus a trailing row for the current n=5.
        assert_eq!(results.len(), 3);
        assert_eq!(results[0][0] as u64, 2);
        assert_eq!(results[1][0] as u64, 4);
        assert_eq!(results[2][0] as u64, 5);
    }

    #[test]
    fn convergence_does_not_duplicate_a_row_already_on_a_stopping_point() {
        let mut g = StatisticsConvergence::new(StatisticsMean::new(), vec![3]);
        for i in 1..=3u64 {
            g.observe(i as f64);
        }
        assert_eq!(g.results().len(), 1);
    }

    #[test]
    fn thread_safe_decorator_linearizes_concurrent_observers() {
        let gatherer = Arc::new(StatisticsThreadSafe::new(StatisticsMean::new()));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let g = Arc::clone(&gatherer);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        g.observe_shared(1.0);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        let results = SyncGatherer::results(&*gatherer);
        assert!((results[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lock_free_gatherer_under_k_threads_times_m_observations() {
        let gatherer = Arc::new(StatisticsMeanLockFree::new());
        let k = 8;
        let m = 2000;
        let threads: Vec<_> = (0..k)
            .map(|_| {
                let g = Arc::clone(&gatherer);
                thread::spawn(move || {
                    for _ in 0..m {
                        g.observe_shared(2.0);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(gatherer.path_count(), (k * m) as u64);
        let results = SyncGatherer::results(&*gatherer);
        assert!((results[0][0] - 2.0).abs() < 1e-9);
    }
}
