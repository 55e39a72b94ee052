//! Bounded-concurrency runner for flushed macro-batches.

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use std::panic::AssertUnwindSafe;
use tracing::{debug, error};

/// A deferred piece of work: one collection post or one individual save.
/// Nothing runs until the runner polls it.
pub type DispatchUnit = BoxFuture<'static, ()>;

/// Runs `units` in groups of at most `limit`, front to back.
///
/// Each group is started in order and fully awaited before the next one
/// begins. Unit outcomes are not inspected; a unit that panics is logged and
/// does not stop its siblings or later groups. Release builds are compiled
/// with `panic = "abort"`, so there a panicking unit ends the process instead.
pub async fn run_bounded(mut units: Vec<DispatchUnit>, limit: usize) {
    let limit = limit.max(1);
    while !units.is_empty() {
        let take = limit.min(units.len());
        let group: Vec<_> = units
            .drain(..take)
            .map(|unit| AssertUnwindSafe(unit).catch_unwind())
            .collect();

        debug!("running {take} dispatch units ({} queued behind)", units.len());
        let panicked = join_all(group).await.iter().filter(|r| r.is_err()).count();
        if panicked > 0 {
            error!("{panicked} dispatch units panicked");
        }
    }
}
