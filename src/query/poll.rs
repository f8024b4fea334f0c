//! Visibility polling with an interruptible wait.

use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::{ScreenMatchError, ScreenMatchResult};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Interval policy between polls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollSchedule {
    /// Wait before the second poll.
    pub interval: Duration,
    /// Multiplier applied to the wait after every poll; `1.0` keeps it fixed.
    pub backoff: f64,
    /// Upper bound for the wait once backoff applies.
    pub max_interval: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1))
    }
}

impl PollSchedule {
    /// Polls at a constant interval.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            backoff: 1.0,
            max_interval: interval,
        }
    }

    /// Grows the wait by `factor` after every poll, up to `max_interval`.
    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff = factor;
        self.max_interval = max_interval;
        self
    }

    fn next_interval(&self, current: Duration) -> Duration {
        let cap = self.max_interval.max(self.interval);
        // Non-finite or overflowing products saturate at the cap.
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff.max(1.0))
            .map_or(cap, |grown| grown.min(cap))
    }
}

/// Shared flag that interrupts a visibility wait.
///
/// Clones share the same flag; cancelling wakes every waiter immediately.
/// The flag stays set until [`reset`](Self::reset), so every wait started
/// in between fails with `Cancelled`.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    /// Clears the flag so later waits run normally again.
    pub fn reset(&self) {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner) = false;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleeps for `timeout` unless cancelled first. Returns true if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Condition a wait is polling for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    NotVisible,
}

/// States of one visibility wait. `Found` and `TimedOut` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Found,
    TimedOut,
}

/// Re-runs a probe until it reports the wanted visibility or time runs out.
#[derive(Clone, Debug, Default)]
pub struct VisibilityPoller {
    schedule: PollSchedule,
    cancel: CancelToken,
}

impl VisibilityPoller {
    pub fn new(schedule: PollSchedule) -> Self {
        Self {
            schedule,
            cancel: CancelToken::new(),
        }
    }

    /// Shares `token` so another thread can interrupt the wait.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn schedule(&self) -> &PollSchedule {
        &self.schedule
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Polls `probe` (which reports current visibility) until it equals
    /// `target`. Returns the elapsed time on success.
    ///
    /// The probe runs at least once. Each wait is clamped to the remaining
    /// budget, so a timeout fires at most one probe after `timeout` elapses.
    pub fn wait_for<P>(
        &self,
        name: &str,
        target: Visibility,
        timeout: Duration,
        mut probe: P,
    ) -> ScreenMatchResult<Duration>
    where
        P: FnMut() -> ScreenMatchResult<bool>,
    {
        let _span = trace_span!("visibility_wait", element = name).entered();
        let want_visible = target == Visibility::Visible;
        let start = Instant::now();
        let mut interval = self.schedule.interval;
        let mut polls = 0usize;

        loop {
            let visible = probe()?;
            polls += 1;
            let elapsed = start.elapsed();
            let state = if visible == want_visible {
                PollState::Found
            } else if elapsed >= timeout {
                PollState::TimedOut
            } else {
                PollState::Polling
            };
            trace_debug!("poll_tick", polls = polls, visible = visible);

            match state {
                PollState::Found => {
                    trace_event!(
                        "visibility_reached",
                        polls = polls,
                        elapsed_ms = elapsed.as_millis() as u64
                    );
                    return Ok(elapsed);
                }
                PollState::TimedOut => {
                    let name = name.to_owned();
                    return Err(match target {
                        Visibility::Visible => ScreenMatchError::NotFoundTimeout { name, timeout },
                        Visibility::NotVisible => {
                            ScreenMatchError::StillPresentTimeout { name, timeout }
                        }
                    });
                }
                PollState::Polling => {
                    let wait = interval.min(timeout.saturating_sub(elapsed));
                    if self.cancel.wait_timeout(wait) {
                        return Err(ScreenMatchError::Cancelled {
                            name: name.to_owned(),
                        });
                    }
                    interval = self.schedule.next_interval(interval);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelToken, PollSchedule, Visibility, VisibilityPoller};
    use crate::ScreenMatchError;
    use std::thread;
    use std::time::{Duration, Instant};

    fn poller(ms: u64) -> VisibilityPoller {
        VisibilityPoller::new(PollSchedule::fixed(Duration::from_millis(ms)))
    }

    #[test]
    fn found_on_first_poll_does_not_sleep() {
        let start = Instant::now();
        poller(500)
            .wait_for("x", Visibility::Visible, Duration::from_secs(5), || Ok(true))
            .unwrap();
        assert!(start.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn becomes_visible_after_a_few_polls() {
        let mut calls = 0;
        poller(5)
            .wait_for("x", Visibility::Visible, Duration::from_secs(5), || {
                calls += 1;
                Ok(calls >= 3)
            })
            .unwrap();
        assert_eq!(calls, 3);
    }

    #[test]
    fn timeout_fires_within_one_interval_of_the_budget() {
        let start = Instant::now();
        let err = poller(100)
            .wait_for("spinner", Visibility::Visible, Duration::from_millis(200), || {
                Ok(false)
            })
            .unwrap_err();
        let elapsed = start.elapsed();
        assert_eq!(
            err,
            ScreenMatchError::NotFoundTimeout {
                name: "spinner".into(),
                timeout: Duration::from_millis(200),
            }
        );
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300), "took {elapsed:?}");
    }

    #[test]
    fn still_present_timeout_names_the_element() {
        let err = poller(10)
            .wait_for("banner", Visibility::NotVisible, Duration::from_millis(30), || {
                Ok(true)
            })
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("banner"));
    }

    #[test]
    fn probe_errors_propagate_immediately() {
        let mut calls = 0;
        let err = poller(10)
            .wait_for("x", Visibility::Visible, Duration::from_secs(1), || {
                calls += 1;
                Err(ScreenMatchError::Capture {
                    reason: "device gone".into(),
                })
            })
            .unwrap_err();
        assert_eq!(calls, 1);
        assert!(matches!(err, ScreenMatchError::Capture { .. }));
    }

    #[test]
    fn cancel_interrupts_a_long_wait() {
        let token = CancelToken::new();
        let poller = poller(10_000).with_cancel_token(token.clone());
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            token.cancel();
        });

        let start = Instant::now();
        let err = poller
            .wait_for("x", Visibility::Visible, Duration::from_secs(30), || Ok(false))
            .unwrap_err();
        canceller.join().unwrap();
        assert_eq!(err, ScreenMatchError::Cancelled { name: "x".into() });
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(poller.cancel_token().is_cancelled());
    }

    #[test]
    fn backoff_grows_up_to_the_cap() {
        let schedule = PollSchedule::fixed(Duration::from_millis(100))
            .with_backoff(2.0, Duration::from_millis(300));
        let second = schedule.next_interval(schedule.interval);
        let third = schedule.next_interval(second);
        assert_eq!(second, Duration::from_millis(200));
        assert_eq!(third, Duration::from_millis(300));
        assert_eq!(
            PollSchedule::default().next_interval(Duration::from_secs(1)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn huge_backoff_saturates_at_the_cap() {
        let cap = Duration::from_secs(2);
        for factor in [f64::INFINITY, 1e300, f64::NAN] {
            let schedule = PollSchedule::fixed(Duration::from_millis(100)).with_backoff(factor, cap);
            let next = schedule.next_interval(Duration::from_secs(u64::MAX / 2));
            assert_eq!(next, cap, "factor {factor}");
        }
        let unbounded =
            PollSchedule::fixed(Duration::from_millis(100)).with_backoff(f64::INFINITY, cap);
        assert_eq!(unbounded.next_interval(Duration::from_millis(100)), cap);
    }

    #[test]
    fn reset_token_allows_waiting_again() {
        let token = CancelToken::new();
        let poller = poller(5).with_cancel_token(token.clone());
        token.cancel();
        let err = poller
            .wait_for("dialog", Visibility::Visible, Duration::from_millis(50), || Ok(false))
            .unwrap_err();
        assert_eq!(
            err,
            ScreenMatchError::Cancelled {
                name: "dialog".into()
            }
        );

        token.reset();
        assert!(!token.is_cancelled());
        assert!(!token.wait_timeout(Duration::from_millis(1)));
        let mut polls = 0;
        poller
            .wait_for("dialog", Visibility::Visible, Duration::from_secs(1), || {
                polls += 1;
                Ok(polls == 2)
            })
            .unwrap();
        assert_eq!(polls, 2);
    }
}
