//! Background reconciliation for one player session.
//!
//! Other sessions write the same documents without coordination. The
//! reconciler re-runs the rules whenever the store reports a change to this
//! player's documents, and on a fixed interval for stores without a change
//! feed (or in case a notification was lost).

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use questline_core::store::DocumentKey;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::application::engine::ProgressionEngine;
use crate::domain::commands::Reconcile;

/// Default safety-net interval.
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(5);

/// Spawns the reconciliation loop for `engine`. Abort the handle to stop it.
///
/// Must be called from within a tokio runtime.
pub fn spawn_reconciler(engine: Arc<Mutex<ProgressionEngine>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(run(engine, interval))
}

async fn run(engine: Arc<Mutex<ProgressionEngine>>, interval: Duration) {
    let (player_id, mut feed) = {
        let engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
        (engine.player_id().to_owned(), engine.store().subscribe())
    };
    tracing::info!(
        player_id = %player_id,
        interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        change_feed = feed.is_some(),
        "reconciler started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => reconcile(&engine),
            changed = next_change(&mut feed) => match changed {
                Ok(key) => {
                    if key.player_id == player_id {
                        reconcile(&engine);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(player_id = %player_id, skipped, "change feed lagged; reconciling");
                    reconcile(&engine);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!(player_id = %player_id, "change feed closed; falling back to the timer");
                    feed = None;
                }
            },
        }
    }
}

async fn next_change(
    feed: &mut Option<broadcast::Receiver<DocumentKey>>,
) -> Result<DocumentKey, broadcast::error::RecvError> {
    match feed {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn reconcile(engine: &Mutex<ProgressionEngine>) {
    let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
    engine.handle_reconcile(&Reconcile::new());
}
