//! Trailing-edge debouncer driven by explicit timestamps

use std::time::{Duration, Instant};

/// Holds the latest value until `delay` passes without a newer one
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Buffer a value, restarting the quiet period
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// When the buffered value becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the value if its quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|at| now >= at) {
            self.pending.take().map(|(v, _)| v)
        } else {
            None
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Sleep until the buffered value is due and take it
    pub async fn settled(&mut self) -> Option<T> {
        let deadline = self.deadline()?;
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        self.poll(Instant::now())
    }
}
