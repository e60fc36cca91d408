// ── Panel state cache ──
//
// Single-slot store for the latest scrape. Every accepted write bumps a
// generation counter, re-arms the expiry deadline and is broadcast to
// subscribers while the slot lock is held, so subscribers see commits in
// order. The pending target lives under the same lock and is overlaid on
// every read and every publish; lifting it publishes too.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use adt_api::ActionHandles;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::model::{ArmingState, SystemState};

const UPDATE_CHANNEL_SIZE: usize = 64;

/// Ordering token for one scrape. Taken before the network round trip,
/// handed back on commit; a commit older than the last accepted one is
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Outcome of [`StateCache::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Accepted { generation: u64 },
    Stale,
}

struct Entry {
    state: SystemState,
    handles: ActionHandles,
}

struct PendingTarget {
    id: u64,
    target: ArmingState,
    timer: CancellationToken,
}

#[derive(Default)]
struct Slot {
    entry: Option<Entry>,
    issued: u64,
    committed: u64,
    pending: Option<PendingTarget>,
    pending_seq: u64,
}

impl Slot {
    fn pending_target(&self) -> Option<ArmingState> {
        self.pending.as_ref().map(|p| p.target)
    }

    fn overlaid(&self) -> Option<SystemState> {
        let entry = self.entry.as_ref()?;
        Some(entry.state.clone().with_target(self.pending_target()))
    }
}

/// The most recent `SystemState` / `ActionHandles` pair.
pub struct StateCache {
    slot: Mutex<Slot>,
    ttl: Duration,
    updates: broadcast::Sender<SystemState>,
    generation: watch::Sender<u64>,
    deadline: watch::Sender<Option<Instant>>,
}

impl StateCache {
    pub fn new(ttl: Duration) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        let (generation, _) = watch::channel(0);
        let (deadline, _) = watch::channel(None);
        Self {
            slot: Mutex::new(Slot::default()),
            ttl,
            updates,
            generation,
            deadline,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// The cached state with the pending target overlaid, or `None`
    /// before the first scrape has landed.
    pub fn get(&self) -> Option<SystemState> {
        self.lock().overlaid()
    }

    /// State and handles from the same scrape.
    pub fn entry(&self) -> Option<(SystemState, ActionHandles)> {
        let slot = self.lock();
        let state = slot.overlaid()?;
        let handles = slot.entry.as_ref()?.handles.clone();
        Some((state, handles))
    }

    /// Wait until the first scrape lands, up to `timeout`.
    pub async fn wait_ready(&self, timeout: Duration) -> Option<SystemState> {
        if let Some(state) = self.get() {
            return Some(state);
        }
        let mut rx = self.generation.subscribe();
        let ready = tokio::time::timeout(timeout, rx.wait_for(|generation| *generation > 0))
            .await
            .is_ok_and(|landed| landed.is_ok());
        if ready { self.get() } else { None }
    }

    /// Generation of the last accepted commit (0 before the first).
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Reserve a ticket for a scrape that is about to start.
    pub fn ticket(&self) -> Ticket {
        let mut slot = self.lock();
        slot.issued += 1;
        Ticket(slot.issued)
    }

    /// Replace the cached pair unconditionally.
    pub fn set(&self, state: SystemState, handles: ActionHandles) -> Commit {
        let ticket = self.ticket();
        self.commit(ticket, state, handles)
    }

    /// Replace the cached pair unless a newer scrape already committed.
    ///
    /// An accepted commit re-arms expiry and publishes exactly once. A
    /// scrape that shows the pending target clears it.
    pub fn commit(&self, ticket: Ticket, state: SystemState, handles: ActionHandles) -> Commit {
        let mut slot = self.lock();
        if ticket.0 <= slot.committed {
            debug!(
                ticket = ticket.0,
                committed = slot.committed,
                "discarding stale scrape"
            );
            return Commit::Stale;
        }

        if let Some(pending) = slot
            .pending
            .take_if(|pending| pending.target == state.arming_state)
        {
            debug!(target = %pending.target, "panel reached requested state");
            pending.timer.cancel();
        }

        slot.committed = ticket.0;
        slot.entry = Some(Entry { state, handles });

        let published = slot.overlaid();
        let generation = ticket.0;
        self.generation.send_replace(generation);
        self.deadline.send_replace(Some(Instant::now() + self.ttl));
        if let Some(state) = published {
            // No receivers is fine.
            let _ = self.updates.send(state);
        }
        trace!(generation, "state committed");

        Commit::Accepted { generation }
    }

    // ── Pending target ───────────────────────────────────────────────

    /// Record a requested mode. Any earlier pending target is replaced
    /// and its timer cancelled.
    pub(crate) fn set_pending(&self, target: ArmingState) -> (u64, CancellationToken) {
        let mut slot = self.lock();
        slot.pending_seq += 1;
        let id = slot.pending_seq;
        let timer = CancellationToken::new();
        if let Some(previous) = slot.pending.replace(PendingTarget {
            id,
            target,
            timer: timer.clone(),
        }) {
            previous.timer.cancel();
        }
        (id, timer)
    }

    /// Clear the pending target if it is still the one identified by `id`.
    ///
    /// A lifted mask is published so subscribers drop the stale target.
    pub(crate) fn clear_pending(&self, id: u64) -> bool {
        let mut slot = self.lock();
        let Some(pending) = slot.pending.take_if(|pending| pending.id == id) else {
            return false;
        };
        pending.timer.cancel();
        if let Some(state) = slot.overlaid() {
            let _ = self.updates.send(state);
        }
        true
    }

    /// The requested mode currently masking the scraped one.
    pub fn pending_target(&self) -> Option<ArmingState> {
        self.lock().pending_target()
    }

    // ── Subscriptions & expiry ───────────────────────────────────────

    /// Receive every future accepted commit.
    pub fn subscribe(&self) -> broadcast::Receiver<SystemState> {
        self.updates.subscribe()
    }

    pub(crate) fn deadline(&self) -> watch::Receiver<Option<Instant>> {
        self.deadline.subscribe()
    }

    /// Disarm the expiry deadline if it is still `at`. Returns `true`
    /// when the caller now owns the refresh for that expiry.
    pub(crate) fn take_expiry(&self, at: Instant) -> bool {
        self.deadline.send_if_modified(|deadline| {
            if *deadline == Some(at) {
                *deadline = None;
                true
            } else {
                false
            }
        })
    }

    /// Disarm expiry entirely.
    pub(crate) fn stop_expiry(&self) {
        self.deadline.send_replace(None);
    }
}
