// ── Cache expiry driver ──
//
// Sleeps until the cache's deadline and fires the refresh hook once per
// deadline. The deadline is disarmed when it fires; only the next
// accepted commit arms it again, so a failing refresh does not loop here.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::StateCache;

/// Run until `cancel` fires. `on_expiry` is spawned, never awaited, so a
/// slow refresh cannot hold back the next deadline.
pub(crate) async fn expiry_task<F, Fut>(
    cache: Arc<StateCache>,
    cancel: CancellationToken,
    on_expiry: F,
) where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut deadline = cache.deadline();

    loop {
        let armed = *deadline.borrow_and_update();
        match armed {
            None => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    changed = deadline.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            Some(at) => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    changed = deadline.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    () = tokio::time::sleep_until(at) => {
                        if cache.take_expiry(at) {
                            trace!("cache expired, refreshing");
                            tokio::spawn(on_expiry());
                        }
                    }
                }
            }
        }
    }

    debug!("expiry task stopped");
}
