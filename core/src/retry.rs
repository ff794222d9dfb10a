//! The retry controller: drives launch attempts to conclusion.
//!
//! One attempt in flight at a time, a fixed cancellable wait between
//! attempts, and exactly one [`LaunchEvent`] per state transition. Capacity
//! failures are retried unconditionally and indefinitely; anything else ends
//! the run. The wait is a fixed interval with no escalation and no attempt
//! cap.

use std::time::{Duration, Instant};

use armgrab_protocol::{LaunchEvent, LaunchedInstance};
use tokio_util::sync::CancellationToken;

use crate::oci::{AttemptOutcome, LaunchApi, LaunchRequest};

/// Controller knobs. Exactly one: the wait between attempts.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// How a run ended. `Interrupted` is a clean operator-requested stop, not an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Succeeded {
        attempts: u64,
        instance: LaunchedInstance,
    },
    Failed {
        attempts: u64,
        reason: String,
    },
    Interrupted {
        attempts: u64,
    },
}

/// Mutable state owned by the controller for the duration of one run.
/// `started_at` is captured once at loop entry and never reset; `attempts`
/// only ever grows.
struct ControllerState {
    attempts: u64,
    started_at: Instant,
}

pub struct RetryController<C> {
    client: C,
    interval: Duration,
}

impl<C: LaunchApi> RetryController<C> {
    pub fn new(client: C, config: RetryConfig) -> Self {
        Self {
            client,
            interval: config.interval,
        }
    }

    /// Run attempts until success, a fatal failure, or cancellation.
    ///
    /// `on_event` receives exactly one event per transition; rendering is the
    /// caller's concern. Cancellation is observed both while an attempt is
    /// outstanding and during the wait, and is checked again before each new
    /// attempt. A cancelled wait never proceeds to the queued attempt.
    pub async fn run<F>(
        &self,
        request: &LaunchRequest,
        cancel: &CancellationToken,
        mut on_event: F,
    ) -> RunOutcome
    where
        F: FnMut(LaunchEvent),
    {
        let mut state = ControllerState {
            attempts: 0,
            started_at: Instant::now(),
        };

        loop {
            if cancel.is_cancelled() {
                return interrupted(&state, &mut on_event);
            }

            state.attempts += 1;
            on_event(LaunchEvent::AttemptStarted {
                attempt: state.attempts,
            });

            let outcome = tokio::select! {
                outcome = self.client.launch(request) => outcome,
                _ = cancel.cancelled() => return interrupted(&state, &mut on_event),
            };

            match outcome {
                AttemptOutcome::Success(instance) => {
                    tracing::info!(attempts = state.attempts, id = %instance.id, "launch accepted");
                    on_event(LaunchEvent::Succeeded {
                        attempt: state.attempts,
                        elapsed: state.started_at.elapsed(),
                        instance: instance.clone(),
                    });
                    return RunOutcome::Succeeded {
                        attempts: state.attempts,
                        instance,
                    };
                }
                AttemptOutcome::Fatal { reason } => {
                    tracing::warn!(attempts = state.attempts, %reason, "fatal launch failure");
                    on_event(LaunchEvent::Failed {
                        attempt: state.attempts,
                        reason: reason.clone(),
                    });
                    return RunOutcome::Failed {
                        attempts: state.attempts,
                        reason,
                    };
                }
                AttemptOutcome::Retryable { reason } => {
                    tracing::debug!(attempts = state.attempts, %reason, "capacity exhausted, will retry");
                    on_event(LaunchEvent::AttemptRetryable {
                        attempt: state.attempts,
                        elapsed: state.started_at.elapsed(),
                        reason,
                    });
                    if wait_cancelled(cancel, self.interval).await {
                        return interrupted(&state, &mut on_event);
                    }
                }
            }
        }
    }
}

fn interrupted<F: FnMut(LaunchEvent)>(state: &ControllerState, on_event: &mut F) -> RunOutcome {
    on_event(LaunchEvent::Interrupted {
        attempts: state.attempts,
        elapsed: state.started_at.elapsed(),
    });
    RunOutcome::Interrupted {
        attempts: state.attempts,
    }
}

/// Sleep for the fixed interval unless cancelled first. Returns true when the
/// wait was cancelled.
async fn wait_cancelled(cancel: &CancellationToken, interval: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(interval) => false,
    }
}
