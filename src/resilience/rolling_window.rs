//! Rolling outcome window used to compute the breaker's failure rate.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Most recent call outcomes, bounded by age and by count
#[derive(Debug, Clone)]
pub struct RollingWindow {
    outcomes: VecDeque<(Instant, bool)>,
    max_age: Duration,
    max_samples: usize,
}

impl RollingWindow {
    pub fn new(max_age: Duration, max_samples: usize) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(max_samples.min(64)),
            max_age,
            max_samples: max_samples.max(1),
        }
    }

    /// Record an outcome observed at `now`
    pub fn record(&mut self, now: Instant, success: bool) {
        if self.outcomes.len() == self.max_samples {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back((now, success));
        self.prune(now);
    }

    /// Drop outcomes older than the window age
    pub fn prune(&mut self, now: Instant) {
        while let Some((at, _)) = self.outcomes.front() {
            if now.saturating_duration_since(*at) > self.max_age {
                self.outcomes.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|(_, success)| !success).count()
    }

    /// Failure percentage (0.0 to 100.0); 0.0 for an empty window
    pub fn failure_percentage(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.failures() as f64 * 100.0 / self.outcomes.len() as f64
    }
}
