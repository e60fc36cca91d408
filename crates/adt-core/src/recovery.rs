// ── Failure recovery ──
//
// Any failed scrape flips the client into `Recovering` and starts one
// loop that logs in again and re-scrapes until it succeeds. Failures
// reported while a loop is already running are folded into it.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CoreError;

/// Health of the portal connection, observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecoveryState {
    Healthy,
    /// `attempt` counts from 1 once the first retry has started.
    Recovering { attempt: u32 },
}

/// Shared recovery state plus the single-flight guard.
pub(crate) struct RecoveryMonitor {
    state: watch::Sender<RecoveryState>,
}

impl RecoveryMonitor {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(RecoveryState::Healthy);
        Self { state }
    }

    pub(crate) fn current(&self) -> RecoveryState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<RecoveryState> {
        self.state.subscribe()
    }

    pub(crate) fn is_recovering(&self) -> bool {
        matches!(self.current(), RecoveryState::Recovering { .. })
    }

    /// Enter `Recovering`. Returns `true` if the caller must start the
    /// loop, `false` if one is already running.
    pub(crate) fn begin(&self, cause: &CoreError) -> bool {
        let started = self.state.send_if_modified(|state| {
            if *state == RecoveryState::Healthy {
                *state = RecoveryState::Recovering { attempt: 0 };
                true
            } else {
                false
            }
        });
        if started {
            warn!(error = %cause, "portal scrape failed, starting recovery");
        } else {
            warn!(error = %cause, "portal scrape failed while already recovering");
        }
        started
    }

    /// Run attempts until one succeeds or `cancel` fires.
    ///
    /// `attempt` must log in, scrape once and commit the result. Between
    /// failures the loop waits `backoff`; it never gives up on its own.
    pub(crate) async fn run<F, Fut>(
        &self,
        backoff: Duration,
        cancel: &CancellationToken,
        mut attempt: F,
    ) where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<(), CoreError>>,
    {
        let mut n: u32 = 0;
        loop {
            n = n.saturating_add(1);
            self.state.send_replace(RecoveryState::Recovering { attempt: n });

            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                outcome = attempt(n) => outcome,
            };

            match outcome {
                Ok(()) => {
                    self.state.send_replace(RecoveryState::Healthy);
                    info!(attempts = n, "portal connection recovered");
                    return;
                }
                Err(e) => {
                    warn!(attempt = n, error = %e, "recovery attempt failed, retrying in {}s", backoff.as_secs());
                }
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(backoff) => {}
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    const BACKOFF: Duration = Duration::from_secs(3);

    fn network_error() -> CoreError {
        CoreError::Network {
            message: "connection refused".into(),
        }
    }

    #[test]
    fn concurrent_failures_start_one_loop() {
        let monitor = RecoveryMonitor::new();
        assert!(monitor.begin(&network_error()));
        assert!(!monitor.begin(&network_error()));
        assert!(!monitor.begin(&CoreError::SessionExpired));
        assert!(monitor.is_recovering());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_then_healthy() {
        let monitor = Arc::new(RecoveryMonitor::new());
        let cancel = CancellationToken::new();
        let attempts = Arc::new(AtomicU32::new(0));
        let mut observed = monitor.subscribe();

        assert!(monitor.begin(&network_error()));

        let started = tokio::time::Instant::now();
        let counter = attempts.clone();
        monitor
            .run(BACKOFF, &cancel, move |n| {
                counter.store(n, Ordering::SeqCst);
                async move {
                    if n <= 3 { Err(network_error()) } else { Ok(()) }
                }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(started.elapsed(), BACKOFF * 3);
        assert_eq!(monitor.current(), RecoveryState::Healthy);
        assert!(observed.has_changed().unwrap());
        assert_eq!(*observed.borrow_and_update(), RecoveryState::Healthy);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_backoff() {
        let monitor = Arc::new(RecoveryMonitor::new());
        let cancel = CancellationToken::new();
        monitor.begin(&network_error());

        let looping = monitor.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            looping
                .run(BACKOFF, &token, |_| async { Err(network_error()) })
                .await;
        });

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(monitor.current(), RecoveryState::Recovering { attempt: 4 });

        cancel.cancel();
        handle.await.unwrap();
    }
}
