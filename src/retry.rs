//! Bounded retry with linear backoff.
//!
//! Attempt `n` (1-based) that fails with a transient error waits
//! `base_delay * n` plus up to `jitter` of that, then tries again, until
//! `max_attempts` is reached.

use crate::constants::{RETRY_ATTEMPTS, RETRY_DELAY_MS};
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Extra random delay as a fraction of the backoff (0.0 disables).
    pub jitter: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_ATTEMPTS,
            base_delay: Duration::from_millis(RETRY_DELAY_MS),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            jitter: 0.0,
        }
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay * attempt;
        if self.jitter <= 0.0 || backoff.is_zero() {
            return backoff;
        }
        let extra = rand::rng().random_range(0.0..=self.jitter);
        backoff + backoff.mul_f32(extra)
    }
}

#[derive(Debug)]
pub struct RetryFailure<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Runs `op` until it succeeds, fails with an error `is_transient` rejects,
/// or the policy runs out of attempts. `sleep` performs the backoff wait.
pub fn with_retry<T, E>(
    policy: &RetryPolicy,
    mut op: impl FnMut(u32) -> Result<T, E>,
    is_transient: impl Fn(&E) -> bool,
    mut sleep: impl FnMut(Duration),
) -> Result<T, RetryFailure<E>> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_transient(&e) => {
                log::debug!("attempt {attempt}/{max_attempts} failed, retrying");
                sleep(policy.delay_for(attempt));
                attempt += 1;
            }
            Err(e) => {
                return Err(RetryFailure {
                    attempts: attempt,
                    last_error: e,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(100),
            jitter: 0.0,
        }
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let mut waits = Vec::new();
        let result = with_retry(
            &policy(3),
            |attempt| if attempt < 3 { Err("busy") } else { Ok(attempt) },
            |_| true,
            |d| waits.push(d),
        );
        assert_eq!(result.unwrap(), 3);
        assert_eq!(waits, vec![Duration::from_millis(100), Duration::from_millis(200)]);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), _> = with_retry(
            &policy(3),
            |_| {
                calls += 1;
                Err("busy")
            },
            |_| true,
            |_| {},
        );
        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.last_error, "busy");
        assert_eq!(calls, 3);
    }

    #[test]
    fn permanent_error_stops_immediately() {
        let mut waits = 0;
        let result: Result<(), _> = with_retry(&policy(5), |_| Err("missing"), |_| false, |_| waits += 1);
        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(waits, 0);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let result = with_retry(&policy(0), |_| Ok::<_, ()>(7), |_| true, |_| {});
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let p = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            jitter: 0.5,
        };
        for _ in 0..50 {
            let d = p.delay_for(2);
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(300));
        }
    }

    #[test]
    fn no_retry_policy() {
        assert_eq!(RetryPolicy::none().delay_for(1), Duration::ZERO);
    }
}
