// ── Target-state reconciliation ──
//
// A command only changes the panel a few seconds later, after the next
// scrape picks it up. Until then the requested mode masks the scraped
// one as `target_state`, so a UI does not bounce back to the old state.
// The mask lifts when a scrape shows the requested state, when a newer
// request replaces it, or when the timer runs out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use adt_api::ActionHandles;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{ArmingMode, ArmingState, SystemState};
use crate::store::StateCache;

/// Validate `mode` against `state`, mask the cache with it, then run
/// `submit` with the handles from the same scrape.
///
/// Returns [`CoreError::NotReady`] without calling `submit` when the
/// panel is faulted and `mode` would arm it. When `submit` fails the
/// mask is lifted at once and no timer is started.
pub(crate) async fn request_change<F, Fut>(
    cache: &Arc<StateCache>,
    state: &SystemState,
    handles: ActionHandles,
    mode: ArmingMode,
    timeout: Duration,
    submit: F,
) -> Result<(), CoreError>
where
    F: FnOnce(ActionHandles) -> Fut,
    Fut: Future<Output = Result<(), CoreError>>,
{
    if !state.accepts(mode) {
        debug!(%mode, "rejecting request, panel not ready");
        return Err(CoreError::NotReady);
    }

    let target = ArmingState::from(mode);
    let (id, timer) = cache.set_pending(target);
    debug!(%target, id, "target state pending");

    if let Err(e) = submit(handles).await {
        warn!(%target, error = %e, "command submission failed");
        cache.clear_pending(id);
        return Err(e);
    }

    let cache = Arc::clone(cache);
    tokio::spawn(async move {
        tokio::select! {
            () = timer.cancelled() => {}
            () = tokio::time::sleep(timeout) => {
                if cache.clear_pending(id) {
                    info!(%target, "target state not confirmed in time, reverting");
                }
            }
        }
    });

    Ok(())
}
