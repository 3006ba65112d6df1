//! Periodic tick for an editor shared with the host UI

use crate::cancel::CancelToken;
use crate::codec::DocumentCodec;
use crate::editor::Editor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Tick `editor` every `period` until `stop` is cancelled. Returns the
/// number of ticks run.
///
/// Late ticks are skipped rather than bunched up, so a stalled host never
/// sees a burst of catch-up ticks.
pub async fn run_ticker<C>(editor: Arc<Mutex<Editor<C>>>, period: Duration, stop: CancelToken) -> u64
where
    C: DocumentCodec + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks = 0u64;

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = interval.tick() => {
                editor.lock().await.tick();
                ticks += 1;
            }
        }
    }

    debug!(ticks, "ticker stopped");
    ticks
}

/// Spawn [`run_ticker`] using the editor's configured interval.
pub async fn spawn_ticker<C>(editor: Arc<Mutex<Editor<C>>>, stop: CancelToken) -> JoinHandle<u64>
where
    C: DocumentCodec + 'static,
{
    let period = editor.lock().await.config().tick_interval();
    tokio::spawn(run_ticker(editor, period, stop))
}
