use std::time::Duration;

/// Reconnect delay policy: multiplicative growth capped at a maximum.
///
/// The policy is pure computation; the connection manager keeps the current
/// delay itself and resets it to [`initial_delay`](Self::initial_delay) after
/// every successful connection. No jitter is applied, so a delay sequence is
/// fully determined by the parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    initial: Duration,
    max: Duration,
    factor: f64,
}

impl BackoffPolicy {
    /// Create a policy. `factor` values below 1.0 are clamped to 1.0 so the
    /// delay sequence is monotonically non-decreasing.
    pub fn new(initial: Duration, max: Duration, factor: f64) -> Self {
        Self {
            initial,
            max: max.max(initial),
            factor: factor.max(1.0),
        }
    }

    /// The delay before the very first retry, and the value the sequence
    /// resets to after a successful connection.
    pub fn initial_delay(&self) -> Duration {
        self.initial
    }

    /// The next delay in the sequence: `min(previous * factor, max)`.
    pub fn next_delay(&self, previous: Duration) -> Duration {
        previous.mul_f64(self.factor).min(self.max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(30000), 1.5)
    }
}
