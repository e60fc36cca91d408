// ── Reactive state store ──
//
// Latest-scrape storage with push-based change notification and a
// self-driven expiry timer.

mod cache;
pub(crate) mod expiry;

pub use cache::{Commit, StateCache, Ticket};
