//! Background write scheduling.
//!
//! Hooks never await the network: each accepted event is handed to a
//! spawned task that owns its own registration in the in-flight set.
//! Shutdown drains that set within a bounded window, then tears the
//! connection down in data-plane-first order.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use analytics_schema::encode_row;
use tokio::sync::Notify;
use tokio::time::timeout;

use crate::client::Connection;
use crate::event::EventRow;

/// Registry of outstanding background writes.
///
/// Registration happens before the task is spawned, so shutdown observes
/// every accepted event even if its task has not started running yet.
pub struct InflightSet {
    ids: Mutex<HashSet<u64>>,
    next_id: AtomicU64,
    drained: Notify,
}

impl InflightSet {
    pub fn new() -> Self {
        Self {
            ids: Mutex::new(HashSet::new()),
            next_id: AtomicU64::new(0),
            drained: Notify::new(),
        }
    }

    /// Register a write; the guard deregisters on drop.
    pub fn register(self: &Arc<Self>) -> InflightGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.ids.lock().unwrap_or_else(|e| e.into_inner()).insert(id);
        InflightGuard {
            set: self.clone(),
            id,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until no writes are registered.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            // Arm before checking, otherwise a drop between the check and
            // the await is a missed wakeup.
            notified.as_mut().enable();
            if self.is_empty() {
                return;
            }
            notified.await;
        }
    }

    fn deregister(&self, id: u64) {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        ids.remove(&id);
        if ids.is_empty() {
            drop(ids);
            self.drained.notify_waiters();
        }
    }
}

impl Default for InflightSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregisters its write on drop, however the task ends.
pub struct InflightGuard {
    set: Arc<InflightSet>,
    id: u64,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.set.deregister(self.id);
    }
}

/// Schedules one background write per accepted event.
pub struct WriteScheduler {
    connection: Arc<Connection>,
    inflight: Arc<InflightSet>,
    flush_timeout: Duration,
    close_timeout: Duration,
}

impl WriteScheduler {
    pub fn new(connection: Arc<Connection>, flush_timeout: Duration, close_timeout: Duration) -> Self {
        Self {
            connection,
            inflight: Arc::new(InflightSet::new()),
            flush_timeout,
            close_timeout,
        }
    }

    #[cfg(test)]
    pub fn inflight(&self) -> &Arc<InflightSet> {
        &self.inflight
    }

    /// Hand a row to a background task and return immediately.
    ///
    /// The task owns its work: cancelling the caller does not cancel the
    /// write.
    pub fn schedule(&self, row: EventRow) {
        let guard = self.inflight.register();
        let connection = self.connection.clone();
        tokio::spawn(async move {
            let _guard = guard;
            Self::perform_write(&connection, row).await;
        });
    }

    async fn perform_write(connection: &Connection, row: EventRow) {
        let channels = match connection.ensure_ready().await {
            Ok(channels) => channels,
            Err(e) => {
                tracing::debug!(error = %e, "dropping event, connection unavailable");
                return;
            }
        };

        let cells = row.cells(&channels.schema);
        let payload = match encode_row(&channels.schema, &cells) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, event_type = %row.event_type, "failed to encode event row");
                return;
            }
        };

        if let Err(e) = channels.write.append_rows(payload).await {
            tracing::error!(error = %e, event_type = %row.event_type, "failed to append event row");
        }
    }

    /// Drain outstanding writes and close the connection.
    ///
    /// Bounded: waits up to the flush window for in-flight writes, then up
    /// to the close window for the data plane. Safe to call repeatedly;
    /// writes scheduled afterwards lazily reconnect.
    pub async fn shutdown(&self) {
        let pending = self.inflight.len();
        if pending > 0 {
            tracing::info!(pending, "waiting for in-flight analytics writes");
            if timeout(self.flush_timeout, self.inflight.wait_idle())
                .await
                .is_err()
            {
                tracing::warn!(
                    dropped = self.inflight.len(),
                    "flush window elapsed, abandoning in-flight writes"
                );
            }
        }

        let Some(channels) = self.connection.take_ready().await else {
            return;
        };

        match timeout(self.close_timeout, channels.write.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "write transport close failed"),
            Err(_) => tracing::warn!("write transport close timed out"),
        }
        if let Err(e) = channels.control.close().await {
            tracing::warn!(error = %e, "control client close failed");
        }
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod tests;
