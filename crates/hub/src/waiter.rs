//! Readiness waiter
//!
//! Device enumeration finishes some time after the connection is up, and the
//! attach events arrive on the dispatcher thread. The waiter polls the role
//! slots from the calling thread until the expected set is populated, the
//! attempt budget or deadline runs out, or the wait is cancelled. Running out
//! is not an error: the caller continues with whatever is present.

use crate::cancel::CancellationToken;
use crate::resolver::format_roles;
use protocol::Role;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default number of polls before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Default pause between polls
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Polling budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub max_attempts: u32,
    pub interval: Duration,
    /// Optional wall-clock limit on top of the attempt budget
    pub deadline: Option<Duration>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
            deadline: None,
        }
    }
}

/// How a wait ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Every role was populated at poll number `attempts`
    Ready { attempts: u32 },
    /// Budget or deadline exhausted with roles still missing
    TimedOut { attempts: u32, missing: Vec<Role> },
    /// The cancellation token fired
    Cancelled { attempts: u32 },
}

impl WaitOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, WaitOutcome::Ready { .. })
    }

    /// Number of polls performed
    pub fn attempts(&self) -> u32 {
        match self {
            WaitOutcome::Ready { attempts }
            | WaitOutcome::TimedOut { attempts, .. }
            | WaitOutcome::Cancelled { attempts } => *attempts,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadinessWaiter {
    config: WaitConfig,
    cancel: CancellationToken,
}

impl ReadinessWaiter {
    pub fn new(config: WaitConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    /// Poll `check` until every role it reports is populated
    ///
    /// `check` returns the presence of each expected role. It is called
    /// once per attempt, at most `max_attempts` times, with `interval`
    /// between calls and no pause after the last one.
    pub fn wait_until<F>(&self, mut check: F) -> WaitOutcome
    where
        F: FnMut() -> Vec<(Role, bool)>,
    {
        let start = Instant::now();
        let max_attempts = self.config.max_attempts.max(1);
        let mut missing = Vec::new();
        let mut attempts = 0;

        while attempts < max_attempts {
            if self.cancel.is_cancelled() {
                debug!("Device wait cancelled after {} attempts", attempts);
                return WaitOutcome::Cancelled { attempts };
            }

            attempts += 1;
            let presence = check();
            missing = presence
                .iter()
                .filter(|(_, present)| !present)
                .map(|(role, _)| *role)
                .collect();

            if missing.is_empty() {
                debug!(
                    "All devices are present after {} attempts: {}",
                    attempts,
                    format_roles(&presence.iter().map(|(r, _)| *r).collect::<Vec<_>>())
                );
                return WaitOutcome::Ready { attempts };
            }

            debug!("Waiting for devices to appear: {}", format_roles(&missing));

            if attempts == max_attempts {
                break;
            }

            let mut pause = self.config.interval;
            if let Some(deadline) = self.config.deadline {
                let elapsed = start.elapsed();
                if elapsed >= deadline {
                    warn!(
                        "Device wait deadline of {:?} passed, missing: {}",
                        deadline,
                        format_roles(&missing)
                    );
                    return WaitOutcome::TimedOut { attempts, missing };
                }
                pause = pause.min(deadline - elapsed);
            }

            if !self.cancel.sleep(pause) {
                debug!("Device wait cancelled after {} attempts", attempts);
                return WaitOutcome::Cancelled { attempts };
            }
        }

        warn!(
            "Got only some devices after {} attempts, missing: {}",
            attempts,
            format_roles(&missing)
        );
        WaitOutcome::TimedOut { attempts, missing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast(max_attempts: u32) -> WaitConfig {
        WaitConfig {
            max_attempts,
            interval: Duration::from_millis(1),
            deadline: None,
        }
    }

    #[test]
    fn test_default_budget() {
        let config = WaitConfig::default();
        assert_eq!(config.max_attempts, 100);
        assert_eq!(config.interval, Duration::from_millis(100));
        assert!(config.deadline.is_none());
    }

    #[test]
    fn test_ready_on_first_attempt() {
        let waiter = ReadinessWaiter::new(fast(100), CancellationToken::new());
        let outcome = waiter.wait_until(|| vec![(Role::Led, true), (Role::Voltage, true)]);
        assert_eq!(outcome, WaitOutcome::Ready { attempts: 1 });
    }

    #[test]
    fn test_empty_set_is_ready() {
        let waiter = ReadinessWaiter::new(fast(100), CancellationToken::new());
        assert!(waiter.wait_until(Vec::new).is_ready());
    }

    #[test]
    fn test_ready_at_exact_attempt() {
        let waiter = ReadinessWaiter::new(fast(100), CancellationToken::new());
        let mut calls = 0;
        let outcome = waiter.wait_until(|| {
            calls += 1;
            vec![(Role::Led, true), (Role::MotorA, calls >= 7)]
        });
        assert_eq!(outcome, WaitOutcome::Ready { attempts: 7 });
        assert_eq!(calls, 7);
    }

    #[test]
    fn test_never_ready_uses_whole_budget() {
        let waiter = ReadinessWaiter::new(fast(100), CancellationToken::new());
        let mut calls = 0;
        let outcome = waiter.wait_until(|| {
            calls += 1;
            vec![(Role::Led, true), (Role::MotorExternal, false)]
        });
        assert_eq!(
            outcome,
            WaitOutcome::TimedOut {
                attempts: 100,
                missing: vec![Role::MotorExternal]
            }
        );
        assert_eq!(calls, 100);
    }

    #[test]
    fn test_deadline_stops_early() {
        let config = WaitConfig {
            max_attempts: 100,
            interval: Duration::from_millis(10),
            deadline: Some(Duration::from_millis(30)),
        };
        let waiter = ReadinessWaiter::new(config, CancellationToken::new());
        let outcome = waiter.wait_until(|| vec![(Role::Voltage, false)]);

        match outcome {
            WaitOutcome::TimedOut { attempts, missing } => {
                assert!(attempts < 100);
                assert_eq!(missing, vec![Role::Voltage]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_cancel_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let waiter = ReadinessWaiter::new(fast(100), token);
        let outcome = waiter.wait_until(|| vec![(Role::Led, true)]);
        assert_eq!(outcome, WaitOutcome::Cancelled { attempts: 0 });
    }

    #[test]
    fn test_cancel_during_wait() {
        let token = CancellationToken::new();
        let config = WaitConfig {
            max_attempts: 100,
            interval: Duration::from_secs(1),
            deadline: None,
        };
        let waiter = ReadinessWaiter::new(config, token.clone());

        let handle = std::thread::spawn(move || waiter.wait_until(|| vec![(Role::Led, false)]));
        std::thread::sleep(Duration::from_millis(20));
        token.cancel();

        let outcome = handle.join().unwrap();
        assert!(matches!(outcome, WaitOutcome::Cancelled { attempts } if attempts <= 1));
    }
}
