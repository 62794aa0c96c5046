use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Trailing window over which submissions are counted
const WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window cap on order submissions
///
/// Gates *attempts*: `try_admit` prunes and checks on every call, but a
/// timestamp is recorded only after the gateway reports a successful
/// submission. Callers sharing a limiter across tasks wrap it in a `Mutex`
/// so the prune-and-check is atomic against concurrent attempts.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_minute: usize,
    accepted: VecDeque<Instant>,
}

impl RateLimiter {
    pub fn new(max_per_minute: usize) -> Self {
        Self {
            max_per_minute,
            accepted: VecDeque::new(),
        }
    }

    /// Prune entries at least 60 seconds old, then report whether another
    /// submission may be attempted right now
    pub fn try_admit(&mut self, now: Instant) -> bool {
        self.prune(now);
        self.accepted.len() < self.max_per_minute
    }

    /// Record a submission that the gateway accepted
    pub fn record(&mut self, now: Instant) {
        self.accepted.push_back(now);
    }

    /// Submissions still inside the trailing window
    pub fn in_flight(&self) -> usize {
        self.accepted.len()
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.accepted.front() {
            if now.duration_since(oldest) >= WINDOW {
                self.accepted.pop_front();
            } else {
                break;
            }
        }
    }
}
