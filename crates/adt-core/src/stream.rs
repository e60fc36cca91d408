// ── State change subscriptions ──
//
// Wraps the cache's broadcast channel. A subscriber that falls behind
// skips the states it missed and keeps going from the newest one.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;

use crate::model::SystemState;

/// A subscription to accepted state updates.
///
/// Only states committed after the subscription was created are
/// delivered.
pub struct StateStream {
    receiver: broadcast::Receiver<SystemState>,
}

impl StateStream {
    pub(crate) fn new(receiver: broadcast::Receiver<SystemState>) -> Self {
        Self { receiver }
    }

    /// Wait for the next state. Returns `None` once the client is gone.
    pub async fn next(&mut self) -> Option<SystemState> {
        loop {
            match self.receiver.recv().await {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "state subscriber lagging, skipping ahead");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> StateUpdates {
        StateUpdates {
            inner: BroadcastStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter over a [`StateStream`].
pub struct StateUpdates {
    inner: BroadcastStream<SystemState>,
}

impl Stream for StateUpdates {
    type Item = SystemState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(state))) => return Poll::Ready(Some(state)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "state subscriber lagging, skipping ahead");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use adt_api::ActionHandles;
    use futures_util::StreamExt;

    use super::*;
    use crate::model::ArmingState;
    use crate::store::StateCache;

    fn push(cache: &StateCache, arming_state: ArmingState) {
        cache.set(
            SystemState {
                arming_state,
                fault_status: false,
                battery_level: 50,
                low_battery_status: false,
                target_state: arming_state,
                contact_sensors: Vec::new(),
            },
            ActionHandles {
                view_state: "1".into(),
                home_action: "h".into(),
                away_action: "a".into(),
                disarm_action: "d".into(),
            },
        );
    }

    #[tokio::test]
    async fn stream_yields_commits_in_order() {
        let cache = StateCache::new(Duration::from_secs(5));
        let stream = StateStream::new(cache.subscribe()).into_stream();

        push(&cache, ArmingState::Home);
        push(&cache, ArmingState::Away);
        drop(cache);

        let states: Vec<ArmingState> = stream.map(|s| s.arming_state).collect().await;
        assert_eq!(states, vec![ArmingState::Home, ArmingState::Away]);
    }

    #[tokio::test]
    async fn lagging_subscriber_resumes_with_newest_states() {
        let cache = StateCache::new(Duration::from_secs(5));
        let mut stream = StateStream::new(cache.subscribe());

        for _ in 0..100 {
            push(&cache, ArmingState::Disarmed);
        }
        push(&cache, ArmingState::Away);
        drop(cache);

        let mut last = None;
        while let Some(state) = stream.next().await {
            last = Some(state.arming_state);
        }
        assert_eq!(last, Some(ArmingState::Away));
    }
}
