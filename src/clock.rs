//! Millisecond tick source and wraparound-safe periods

/// A free-running millisecond counter.
///
/// The counter is expected to overflow on long uptimes (a `u32` of
/// milliseconds wraps after ~49.7 days), so it must only ever be compared
/// through [`Period`] or `wrapping_sub`, never against an absolute deadline.
pub trait TickSource {
    /// Current value of the counter in milliseconds.
    fn now_ms(&self) -> u32;
}

/// A repeating interval measured on a wrapping [`TickSource`].
///
/// The interval is due once strictly more than `period_ms` has elapsed since
/// it was last armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    period_ms: u32,
    last_ms: u32,
}

impl Period {
    /// Create a period armed at `start_ms`.
    pub const fn new(period_ms: u32, start_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: start_ms,
        }
    }

    pub const fn period_ms(&self) -> u32 {
        self.period_ms
    }

    /// Milliseconds since the period was last armed.
    pub const fn elapsed(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_ms)
    }

    pub const fn is_due(&self, now_ms: u32) -> bool {
        self.elapsed(now_ms) > self.period_ms
    }

    /// Re-arm the period at `now_ms`.
    pub fn rearm(&mut self, now_ms: u32) {
        self.last_ms = now_ms;
    }

    /// Returns `true` (and re-arms) when the period is due.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if self.is_due(now_ms) {
            self.rearm(now_ms);
            true
        } else {
            false
        }
    }
}
