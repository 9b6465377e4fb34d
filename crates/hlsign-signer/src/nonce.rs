//! Nonce generation with monotonic guarantees.
//!
//! A nonce tracks wall-clock milliseconds while calls are sparse and falls
//! back to `last + 1` under bursts, so it never repeats or decreases even if
//! the clock regresses.

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;

/// Trait for obtaining current time, enabling testability.
pub trait Clock: Send + Sync {
    /// Returns current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        // A clock before the epoch reads as 0; the counter then just increments.
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Anything that hands out nonces.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> u64;
}

/// Lock-free nonce counter.
///
/// # Guarantees
/// - Strictly increasing across all callers
/// - Never below the clock reading at construction
/// - Thread-safe via a CAS loop on a single atomic
pub struct NonceManager<C: Clock> {
    /// Last issued nonce.
    counter: AtomicU64,
    clock: C,
}

impl<C: Clock> NonceManager<C> {
    /// Creates a new `NonceManager` seeded with the current clock reading.
    #[must_use]
    pub fn new(clock: C) -> Self {
        let now = clock.now_ms();
        Self {
            counter: AtomicU64::new(now),
            clock,
        }
    }

    /// Generates the next nonce.
    ///
    /// If the counter lags the clock it jumps to `now`, otherwise it
    /// increments. A lost CAS re-reads both the clock and the counter.
    pub fn next(&self) -> u64 {
        loop {
            let now = self.clock.now_ms();
            let current = self.counter.load(Ordering::Acquire);
            let next_val = if current < now {
                now
            } else {
                current.saturating_add(1)
            };

            if self
                .counter
                .compare_exchange_weak(current, next_val, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return next_val;
            }
        }
    }

    /// Last issued nonce (or the seed if none was issued).
    #[must_use]
    pub fn last(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }
}

impl NonceManager<SystemClock> {
    #[must_use]
    pub fn with_system_clock() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> NonceSource for NonceManager<C> {
    fn next_nonce(&self) -> u64 {
        self.next()
    }
}

static GLOBAL_NONCE: Lazy<NonceManager<SystemClock>> = Lazy::new(NonceManager::with_system_clock);

/// Process-wide nonce. Seeded on first use.
pub fn next_nonce() -> u64 {
    GLOBAL_NONCE.next()
}

/// [`NonceSource`] backed by the process-wide counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalNonce;

impl NonceSource for GlobalNonce {
    fn next_nonce(&self) -> u64 {
        next_nonce()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    const T0: u64 = 1_700_000_000_000;

    /// Clock whose reading is shared with the test body.
    #[derive(Clone)]
    struct ManualClock(Arc<AtomicU64>);

    impl ManualClock {
        fn at(ms: u64) -> Self {
            Self(Arc::new(AtomicU64::new(ms)))
        }

        fn tick(&self, ms: u64) {
            self.0.fetch_add(ms, Ordering::SeqCst);
        }

        fn rewind_to(&self, ms: u64) {
            self.0.store(ms, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_seeded_from_clock() {
        let nonces = NonceManager::new(ManualClock::at(T0));
        assert_eq!(nonces.last(), T0);
    }

    #[test]
    fn test_same_millisecond_increments() {
        let nonces = NonceManager::new(ManualClock::at(T0));
        let issued: Vec<u64> = (0..3).map(|_| nonces.next()).collect();
        assert_eq!(issued, vec![T0 + 1, T0 + 2, T0 + 3]);
    }

    #[test]
    fn test_jumps_to_clock_after_gap() {
        let clock = ManualClock::at(T0);
        let nonces = NonceManager::new(clock.clone());

        nonces.next();
        clock.tick(500);
        assert_eq!(nonces.next(), T0 + 500);
        assert_eq!(nonces.next(), T0 + 501);
    }

    #[test]
    fn test_rewound_clock_keeps_increasing() {
        let clock = ManualClock::at(T0);
        let nonces = NonceManager::new(clock.clone());

        let before = nonces.next();
        clock.rewind_to(T0 - 10_000);
        let after: Vec<u64> = (0..5).map(|_| nonces.next()).collect();

        assert_eq!(after[0], before + 1);
        assert!(after.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn test_threads_never_share_a_nonce() {
        let clock = ManualClock::at(T0);
        let nonces = Arc::new(NonceManager::new(clock.clone()));

        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let nonces = Arc::clone(&nonces);
                let clock = clock.clone();
                thread::spawn(move || {
                    (0..1000)
                        .map(|i| {
                            if worker == 0 && i % 100 == 0 {
                                clock.tick(1);
                            }
                            nonces.next()
                        })
                        .collect::<Vec<u64>>()
                })
            })
            .collect();

        let mut seen = std::collections::HashSet::new();
        for worker in workers {
            let issued = worker.join().unwrap();
            assert!(issued.windows(2).all(|w| w[0] < w[1]));
            for nonce in issued {
                assert!(nonce > T0);
                assert!(seen.insert(nonce), "duplicate nonce {nonce}");
            }
        }
        assert_eq!(seen.len(), 8000);
    }

    #[test]
    fn test_global_nonce_not_below_wall_clock() {
        let before = SystemClock.now_ms();
        let first = next_nonce();
        let second = GlobalNonce.next_nonce();

        assert!(first >= before);
        assert!(second > first);
    }
}
