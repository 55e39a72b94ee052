//! Debounced macro-batching of dispatch units.
//!
//! Units submitted while the window is open join the same macro-batch, and
//! every arrival pushes the flush back by the full delay. On flush the
//! collected units are handed to [`run_bounded`] in a task of their own, so
//! the next window starts collecting immediately.

use crate::runner::{DispatchUnit, run_bounded};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// Handle for submitting units to the debounce loop.
///
/// The loop runs until every handle is dropped; units still collecting at
/// that point are flushed before it exits.
#[derive(Clone)]
pub struct MacroBatcher {
    tx: mpsc::UnboundedSender<DispatchUnit>,
}

impl MacroBatcher {
    /// Starts the debounce loop on the current tokio runtime.
    pub fn spawn(delay: Duration, max_instances: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_debounce(rx, delay, max_instances));
        Self { tx }
    }

    pub fn submit(&self, unit: DispatchUnit) {
        if self.tx.send(unit).is_err() {
            warn!("debounce loop has stopped, dropping dispatch unit");
        }
    }
}

async fn run_debounce(
    mut rx: mpsc::UnboundedReceiver<DispatchUnit>,
    delay: Duration,
    max_instances: usize,
) {
    // idle: wait for the first unit since the last flush
    while let Some(first) = rx.recv().await {
        let mut collecting = vec![first];
        let timer = sleep(delay);
        tokio::pin!(timer);

        let closed = loop {
            tokio::select! {
                unit = rx.recv() => match unit {
                    Some(unit) => {
                        collecting.push(unit);
                        timer.as_mut().reset(Instant::now() + delay);
                    }
                    None => break true,
                },
                () = &mut timer => break false,
            }
        };

        debug!("flushing macro-batch of {} units", collecting.len());
        tokio::spawn(run_bounded(collecting, max_instances));

        if closed {
            break;
        }
    }
    info!("debounce loop stopped");
}
