//! Deadline-bounded polling for "wait until ready" conditions.
//!
//! The poller knows nothing about what it polls: a check reports `Some(value)`
//! when the resource is ready, `None` when it is not yet, or an error that is
//! remembered and treated as "not yet". The loop is an explicit state machine
//! so each transition is visible in one place.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Successful poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ready<T> {
    pub value: T,
    /// 1-based attempt that produced the value.
    pub attempt: u32,
}

/// Deadline passed without the check reporting readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTimeout<E> {
    pub attempts: u32,
    /// Most recent check error, if any attempt failed.
    pub last_error: Option<E>,
}

#[derive(Debug)]
enum PollState<T> {
    Polling { attempt: u32 },
    Found { value: T, attempt: u32 },
    TimedOut { attempts: u32 },
}

/// Fixed-interval poller with an absolute deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    budget: Duration,
    interval: Duration,
}

impl Poller {
    pub fn new(budget: Duration, interval: Duration) -> Self {
        Self { budget, interval }
    }

    /// Run `check` until it yields a value or the budget is spent.
    ///
    /// The deadline is checked before every attempt, so a zero budget makes no
    /// attempt at all. A ready check returns immediately without sleeping.
    pub async fn run<T, E, F, Fut>(&self, mut check: F) -> Result<Ready<T>, PollTimeout<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let deadline = Instant::now() + self.budget;
        let mut last_error = None;
        let mut state = PollState::Polling { attempt: 1 };

        loop {
            state = match state {
                PollState::Polling { attempt } if Instant::now() >= deadline => {
                    PollState::TimedOut {
                        attempts: attempt - 1,
                    }
                }
                PollState::Polling { attempt } => match check(attempt).await {
                    Ok(Some(value)) => PollState::Found { value, attempt },
                    Ok(None) => {
                        sleep(self.interval).await;
                        PollState::Polling {
                            attempt: attempt + 1,
                        }
                    }
                    Err(err) => {
                        last_error = Some(err);
                        sleep(self.interval).await;
                        PollState::Polling {
                            attempt: attempt + 1,
                        }
                    }
                },
                PollState::Found { value, attempt } => return Ok(Ready { value, attempt }),
                PollState::TimedOut { attempts } => {
                    return Err(PollTimeout {
                        attempts,
                        last_error,
                    })
                }
            };
        }
    }
}
