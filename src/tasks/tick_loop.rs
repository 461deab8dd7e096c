//! Scheduler tick loop background task

use std::sync::Arc;
use tokio::{sync::watch, time::sleep};
use tracing::{debug, info, trace};

use crate::scheduler::Shared;

/// Background task that advances running timers once per tick interval
/// until `alive` flips to `false` or its sender is dropped.
pub(crate) async fn tick_loop(shared: Arc<Shared>, mut alive: watch::Receiver<bool>) {
    info!("Starting tick loop ({:?} interval)", shared.tick_interval);

    loop {
        if !*alive.borrow_and_update() {
            break;
        }

        let advanced = shared.tick();
        if advanced > 0 {
            trace!("Tick advanced {} timers", advanced);
        }

        // No compensation for time spent in the pass
        tokio::select! {
            _ = sleep(shared.tick_interval) => {}
            changed = alive.changed() => {
                if changed.is_err() {
                    debug!("Tick loop control dropped");
                    break;
                }
            }
        }
    }

    info!("Tick loop stopped");
}
