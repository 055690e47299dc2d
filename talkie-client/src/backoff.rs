use std::time::Duration;

const DEFAULT_BASE: Duration = Duration::from_secs(2);
const DEFAULT_CAP: Duration = Duration::from_secs(5);
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Bounded exponential backoff for signaling reconnects. Delays grow
/// multiplicatively from `base` up to `cap`; after `max_attempts` draws,
/// `next_delay` returns `None` and the caller gives up.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    base: Duration,
    cap: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl ReconnectBackoff {
    pub fn new(base: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            cap,
            max_attempts,
            attempt: 0,
        }
    }

    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }

        let factor = 1u32 << self.attempt.min(16);
        let delay = self.base.saturating_mul(factor).min(self.cap);
        self.attempt += 1;
        Some(delay)
    }

    /// Called on a successful rejoin so the next outage starts fresh.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_BASE, DEFAULT_CAP, DEFAULT_MAX_ATTEMPTS)
    }
}
