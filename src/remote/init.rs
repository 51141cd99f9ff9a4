//! Remote Initializer Module
//!
//! Builds the sink client at startup and announces readiness through a
//! one-shot watch-channel signal that consumers await instead of polling.
//! Construction is retried indefinitely at a fixed interval; the one-shot
//! read probe is logged but never blocks readiness.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::remote::{HttpSink, SharedSink};

/// Receiving side of the readiness signal. Holds `None` until the sink is
/// constructed, then `Some(sink)` for the rest of the process lifetime.
pub type ReadyReceiver = watch::Receiver<Option<SharedSink>>;

/// Sending side of the readiness signal.
pub type ReadySender = watch::Sender<Option<SharedSink>>;

/// Creates the readiness channel in its unready state.
pub fn ready_channel() -> (ReadySender, ReadyReceiver) {
    watch::channel(None)
}

/// Awaits the readiness signal; resolves to the sink once announced, or
/// `None` if the sender was dropped while still unready.
pub async fn await_ready(mut rx: ReadyReceiver) -> Option<SharedSink> {
    loop {
        if let Some(sink) = rx.borrow().clone() {
            return Some(sink);
        }
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
    }
}

/// Spawns the initializer task.
///
/// With the connection secrets absent, readiness is never announced and the
/// process degrades to remote-features-disabled. Otherwise the client is
/// constructed (retrying at `init_retry_ms` until it succeeds), probed once
/// against the log table, and announced on the channel.
pub fn spawn_remote_init(config: &Config, tx: ReadySender) -> JoinHandle<()> {
    let url = config.remote_url.clone();
    let key = config.remote_api_key.clone();
    let log_table = config.log_table.clone();
    let retry = Duration::from_millis(config.init_retry_ms.max(1));

    tokio::spawn(async move {
        let (url, key) = match (url, key) {
            (Some(url), Some(key)) => (url, key),
            _ => {
                warn!("remote connection secrets not set; remote features disabled");
                return;
            }
        };

        let sink: SharedSink = loop {
            match HttpSink::new(&url, &key) {
                Ok(sink) => break Arc::new(sink),
                Err(err) => {
                    warn!(%err, "remote client not yet available, retrying");
                    tokio::time::sleep(retry).await;
                }
            }
        };

        match sink.select_count(&log_table).await {
            Ok(count) => info!(table = %log_table, rows = count, "remote read probe succeeded"),
            Err(err) => warn!(table = %log_table, %err, "remote read probe failed"),
        }

        // Probe outcome does not block readiness; the orchestrator re-probes
        // before every write.
        if tx.send(Some(sink)).is_ok() {
            info!("remote sink ready");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::remote::RemoteSink;
    use async_trait::async_trait;
    use serde_json::Value;

    struct NullSink;

    #[async_trait]
    impl RemoteSink for NullSink {
        async fn insert(&self, _table: &str, _rows: Vec<Value>) -> Result<()> {
            Ok(())
        }

        async fn select_count(&self, _table: &str) -> Result<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_channel_starts_unready() {
        let (_tx, rx) = ready_channel();
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_await_ready_resolves_after_announce() {
        let (tx, rx) = ready_channel();
        let waiter = tokio::spawn(await_ready(rx));

        tx.send(Some(Arc::new(NullSink) as SharedSink)).unwrap();
        let sink = waiter.await.unwrap();
        assert!(sink.is_some());
    }

    #[tokio::test]
    async fn test_await_ready_sees_prior_announce() {
        let (tx, rx) = ready_channel();
        tx.send(Some(Arc::new(NullSink) as SharedSink)).unwrap();

        assert!(await_ready(rx).await.is_some());
    }

    #[tokio::test]
    async fn test_await_ready_none_when_sender_dropped() {
        let (tx, rx) = ready_channel();
        drop(tx);

        assert!(await_ready(rx).await.is_none());
    }

    #[tokio::test]
    async fn test_init_without_secrets_never_announces() {
        let config = Config::default();
        let (tx, rx) = ready_channel();

        spawn_remote_init(&config, tx).await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
