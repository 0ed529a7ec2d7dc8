use crate::types::constants::{MAX_RECONNECT_ATTEMPTS, RECONNECT_BASE_DELAY};
use std::time::Duration;

/// Exponential backoff for reconnection: `base * 2^(attempt - 1)`, capped by attempt count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base_delay: Duration,
    max_attempts: u32,
}

impl Backoff {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
        }
    }

    /// Delay before the given 1-indexed attempt, or `None` once attempts are exhausted
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(attempt - 1)?;
        self.base_delay.checked_mul(factor)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(RECONNECT_BASE_DELAY),
            MAX_RECONNECT_ATTEMPTS,
        )
    }
}

/// Timer that walks a [`Backoff`] schedule one attempt at a time
pub struct Timer {
    attempts: u32,
    backoff: Backoff,
}

impl Timer {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            attempts: 0,
            backoff,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Advance to the next attempt and return its delay.
    ///
    /// Returns `None` without advancing once the maximum is reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        let delay = self.backoff.delay_for(self.attempts + 1)?;
        self.attempts += 1;
        Some(delay)
    }

    /// Reset the timer after a successful connection
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(Backoff::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_schedule() {
        let backoff = Backoff::default();
        let delays: Vec<u128> = (1..=5)
            .map(|n| backoff.delay_for(n).unwrap().as_millis())
            .collect();
        assert_eq!(delays, vec![3000, 6000, 12000, 24000, 48000]);
        assert_eq!(backoff.delay_for(6), None);
        assert_eq!(backoff.delay_for(0), None);
    }

    #[test]
    fn test_delay_formula_holds_for_every_attempt() {
        let backoff = Backoff::default();
        for n in 1..=5u32 {
            assert_eq!(
                backoff.delay_for(n),
                Some(Duration::from_millis(3000 * 2u64.pow(n - 1)))
            );
        }
    }

    #[test]
    fn test_timer_stops_at_max_attempts() {
        let mut timer = Timer::default();
        for _ in 0..5 {
            assert!(timer.next_delay().is_some());
        }
        assert_eq!(timer.next_delay(), None);
        assert_eq!(timer.attempts(), 5);

        timer.reset();
        assert_eq!(timer.next_delay(), Some(Duration::from_millis(3000)));
    }

    #[test]
    fn test_huge_attempt_counts_do_not_overflow() {
        let backoff = Backoff::new(Duration::from_secs(1), u32::MAX);
        assert_eq!(backoff.delay_for(40), None);
    }
}
