//! Bounded wait for lookup results.
//!
//! Lets a read-facing lookup behave like a blocking call while the remote I/O
//! stays batched. Each round waits for the next batch to settle, but never
//! longer than the poll interval, and there are at most `max_iterations`
//! rounds. Running out of rounds is not an error: the caller gets whatever is
//! cached at that point.

use tokio::time::timeout;
use tracing::debug;

use crate::config::WaitConfig;
use crate::dispatch::{BatchDispatcher, PageRequest};
use crate::remote::Part;

/// Pages through `raw_key` until `satisfied` accepts the cached parts.
///
/// Stops early when the key errors, is exhausted, or has no page left to
/// fetch. Returns the parts cached when it stopped.
pub async fn wait_for_result<F>(
    dispatcher: &BatchDispatcher,
    raw_key: &str,
    config: WaitConfig,
    satisfied: F,
) -> Vec<Part>
where
    F: Fn(&[Part]) -> bool,
{
    if dispatcher.get_last_error(raw_key).await.is_some() {
        dispatcher.request_next_page(raw_key).await;
    }

    for iteration in 0..config.max_iterations {
        let settled = dispatcher.settled();

        if dispatcher.is_exhausted(raw_key).await {
            break;
        }

        let parts = dispatcher.get_parts(raw_key).await;
        if satisfied(&parts) {
            return parts;
        }
        if dispatcher.get_last_error(raw_key).await.is_some() {
            break;
        }

        let request = dispatcher.request_next_page(raw_key).await;
        if request == PageRequest::Unchanged && !dispatcher.is_pending(raw_key).await {
            debug!("{}: nothing left to fetch after {} rounds", raw_key, iteration);
            break;
        }

        let _ = timeout(config.poll_interval, settled).await;
    }

    dispatcher.get_parts(raw_key).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use crate::config::DispatchConfig;
    use crate::credentials::Session;
    use crate::remote::testing::{found, part, ScriptedClient};
    use crate::remote::RemoteError;
    use crate::tasks::spawn_idle_trigger;

    fn dispatcher(client: Arc<ScriptedClient>) -> Arc<BatchDispatcher> {
        let config = DispatchConfig {
            count_trigger: 10,
            idle_interval: Duration::from_millis(20),
            record_limit: 1,
            record_start_max: 80,
            http_timeout: Duration::from_secs(2),
        };
        Arc::new(BatchDispatcher::new(
            config,
            client,
            Arc::new(Session::with_token("token")),
        ))
    }

    fn wait_config(max_iterations: u32) -> WaitConfig {
        WaitConfig {
            poll_interval: Duration::from_millis(10),
            max_iterations,
        }
    }

    #[tokio::test]
    async fn test_wait_returns_first_page() {
        let d = dispatcher(Arc::new(ScriptedClient::one_part_each(5)));
        let idle = spawn_idle_trigger(d.clone());

        let parts = wait_for_result(&d, "LM317", wait_config(200), |p| !p.is_empty()).await;
        assert_eq!(parts.len(), 1);
        assert_eq!(d.pages("lm317").await.len(), 1, "satisfied after one page");

        idle.abort();
    }

    #[tokio::test]
    async fn test_wait_pages_until_manufacturer_found() {
        let client = Arc::new(ScriptedClient::new(|q| {
            let manufacturer = if q.start == 2 { "Texas Instruments" } else { "ON Semi" };
            found(q, vec![part(&q.mpn, manufacturer)], 10)
        }));
        let d = dispatcher(client);
        let idle = spawn_idle_trigger(d.clone());

        let parts = wait_for_result(&d, "lm317", wait_config(500), |parts| {
            parts.iter().any(|p| p.manufacturer.name.starts_with("Texas"))
        })
        .await;

        assert_eq!(parts.len(), 3);
        assert_eq!(d.pages("lm317").await.len(), 3);

        idle.abort();
    }

    #[tokio::test]
    async fn test_wait_stops_when_exhausted() {
        let d = dispatcher(Arc::new(ScriptedClient::one_part_each(2)));
        let idle = spawn_idle_trigger(d.clone());

        let parts = wait_for_result(&d, "lm317", wait_config(500), |_| false).await;
        assert_eq!(parts.len(), 2);
        assert!(d.is_exhausted("lm317").await);

        idle.abort();
    }

    #[tokio::test]
    async fn test_wait_stops_on_error() {
        let client = Arc::new(ScriptedClient::failing(RemoteError::Api("Bad query".into())));
        let d = dispatcher(client.clone());
        let idle = spawn_idle_trigger(d.clone());

        let parts = wait_for_result(&d, "lm317", wait_config(500), |p| !p.is_empty()).await;
        assert!(parts.is_empty());
        assert_eq!(d.get_last_error("lm317").await.as_deref(), Some("Bad query"));
        assert_eq!(client.batch_count(), 1);

        idle.abort();
    }

    #[tokio::test]
    async fn test_wait_retries_errored_key_first() {
        let client = Arc::new(ScriptedClient::failing(RemoteError::Timeout));
        let d = dispatcher(client.clone());
        let idle = spawn_idle_trigger(d.clone());

        wait_for_result(&d, "lm317", wait_config(500), |p| !p.is_empty()).await;
        assert_eq!(client.batch_count(), 1);

        wait_for_result(&d, "lm317", wait_config(500), |p| !p.is_empty()).await;
        assert_eq!(client.batch_count(), 2, "errored key is retried on the next wait");

        idle.abort();
    }

    #[tokio::test]
    async fn test_wait_is_bounded_without_dispatch() {
        // No idle task: nothing ever gets dispatched
        let d = dispatcher(Arc::new(ScriptedClient::one_part_each(1)));

        let started = Instant::now();
        let parts = wait_for_result(&d, "lm317", wait_config(5), |p| !p.is_empty()).await;

        assert!(parts.is_empty());
        assert!(d.is_pending("lm317").await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
