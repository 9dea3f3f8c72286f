//! Idle Trigger Task
//!
//! Dispatches whatever is awaiting once no new page was enqueued for the
//! configured idle interval. Every enqueue re-arms the countdown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::DispatchTrigger;
use crate::dispatch::BatchDispatcher;

/// Spawns the idle trigger for `dispatcher`.
///
/// The countdown starts on the first `arm_idle_timer` call and restarts on
/// every later one. When it runs out the awaiting items are dispatched on a
/// separate task, so a slow remote call never delays the next countdown.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let dispatcher = Arc::new(BatchDispatcher::new(config, client, session));
/// let idle_handle = spawn_idle_trigger(dispatcher.clone());
/// // Later, during shutdown:
/// idle_handle.abort();
/// ```
pub fn spawn_idle_trigger(dispatcher: Arc<BatchDispatcher>) -> JoinHandle<()> {
    let interval = dispatcher.config().idle_interval;

    tokio::spawn(async move {
        info!("Starting idle trigger with interval of {:?}", interval);

        loop {
            dispatcher.idle_armed().await;

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => break,
                    _ = dispatcher.idle_armed() => continue,
                }
            }

            debug!("TRIGGER: idle");
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher.process_query(DispatchTrigger::Idle).await;
            });
        }
    })
}
