use std::time::{Duration, Instant};

/// Wall-clock allowance for one pass, polled between loop iterations.
///
/// Exhaustion is not an error: callers stop where they are and leave the
/// rest of the work for the next frame.
#[derive(Clone, Copy, Debug)]
pub struct StepBudget {
    started: Instant,
    limit: Option<Duration>,
}

impl StepBudget {
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn unlimited() -> Self {
        Self::start(None)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn exhausted(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.started.elapsed() > limit)
    }
}
