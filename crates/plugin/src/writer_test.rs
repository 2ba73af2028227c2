use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use analytics_schema::{event_table_schema, SchemaField};
use async_trait::async_trait;

use super::*;
use crate::client::{Channels, ClientFactory, Connection, ControlClient, WriteClient};
use crate::config::TableCoordinates;
use crate::error::ClientError;
use crate::event::{EventRow, EventType};

#[derive(Default)]
struct FakeState {
    appends: Mutex<Vec<Vec<u8>>>,
    append_delay: Option<Duration>,
    fail_appends: AtomicBool,
    provision_count: AtomicUsize,
    write_closed: AtomicBool,
    control_closed: AtomicBool,
}

struct FakeControl(Arc<FakeState>);

#[async_trait]
impl ControlClient for FakeControl {
    async fn ensure_dataset(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn ensure_table(&self, _fields: &[SchemaField]) -> Result<(), ClientError> {
        self.0.provision_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.0.control_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeWrite(Arc<FakeState>);

#[async_trait]
impl WriteClient for FakeWrite {
    async fn append_rows(&self, payload: Vec<u8>) -> Result<(), ClientError> {
        if let Some(delay) = self.0.append_delay {
            tokio::time::sleep(delay).await;
        }
        if self.0.fail_appends.load(Ordering::SeqCst) {
            return Err(ClientError::Append {
                code: 13,
                message: "internal".into(),
            });
        }
        self.0.appends.lock().unwrap().push(payload);
        Ok(())
    }

    async fn close(&self) -> Result<(), ClientError> {
        self.0.write_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeFactory(Arc<FakeState>);

#[async_trait]
impl ClientFactory for FakeFactory {
    async fn control_client(
        &self,
        _table: &TableCoordinates,
    ) -> Result<Arc<dyn ControlClient>, ClientError> {
        Ok(Arc::new(FakeControl(self.0.clone())))
    }

    async fn write_client(
        &self,
        _table: &TableCoordinates,
    ) -> Result<Arc<dyn WriteClient>, ClientError> {
        Ok(Arc::new(FakeWrite(self.0.clone())))
    }
}

fn scheduler_with(state: Arc<FakeState>, flush: Duration, close: Duration) -> WriteScheduler {
    let connection = Arc::new(Connection::new(
        Arc::new(FakeFactory(state)),
        TableCoordinates::new("proj", "ds"),
        event_table_schema(),
    ));
    WriteScheduler::new(connection, flush, close)
}

#[tokio::test]
async fn test_schedule_returns_before_write_completes() {
    let state = Arc::new(FakeState {
        append_delay: Some(Duration::from_millis(200)),
        ..Default::default()
    });
    let scheduler = scheduler_with(state.clone(), Duration::from_secs(2), Duration::from_secs(1));

    let start = Instant::now();
    scheduler.schedule(EventRow::new(EventType::System));
    assert!(start.elapsed() < Duration::from_millis(50));
    assert_eq!(scheduler.inflight().len(), 1);

    scheduler.shutdown().await;
    assert_eq!(state.appends.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_write_still_deregisters() {
    let state = Arc::new(FakeState::default());
    state.fail_appends.store(true, Ordering::SeqCst);
    let scheduler = scheduler_with(state.clone(), Duration::from_secs(2), Duration::from_secs(1));

    scheduler.schedule(EventRow::new(EventType::System));
    scheduler.inflight().wait_idle().await;

    assert!(state.appends.lock().unwrap().is_empty());
    assert!(scheduler.inflight().is_empty());
}

#[tokio::test]
async fn test_shutdown_drains_pending_writes() {
    let state = Arc::new(FakeState {
        append_delay: Some(Duration::from_millis(20)),
        ..Default::default()
    });
    let scheduler = scheduler_with(state.clone(), Duration::from_secs(2), Duration::from_secs(1));

    for _ in 0..10 {
        scheduler.schedule(EventRow::new(EventType::ToolStarting).content("Tool Name: t"));
    }
    scheduler.shutdown().await;

    assert_eq!(state.appends.lock().unwrap().len(), 10);
    assert!(state.write_closed.load(Ordering::SeqCst));
    assert!(state.control_closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_shutdown_bounded_by_flush_window() {
    let state = Arc::new(FakeState {
        append_delay: Some(Duration::from_secs(30)),
        ..Default::default()
    });
    let scheduler = scheduler_with(
        state.clone(),
        Duration::from_millis(50),
        Duration::from_millis(50),
    );

    scheduler.schedule(EventRow::new(EventType::System));
    // Let the task reach its slow append before shutting down.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let start = Instant::now();
    scheduler.shutdown().await;
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(state.appends.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_shutdown_is_idempotent() {
    let state = Arc::new(FakeState::default());
    let scheduler = scheduler_with(state.clone(), Duration::from_secs(2), Duration::from_secs(1));

    scheduler.schedule(EventRow::new(EventType::System));
    scheduler.shutdown().await;
    scheduler.shutdown().await;

    assert_eq!(state.appends.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_writes_after_shutdown_reconnect() {
    let state = Arc::new(FakeState::default());
    let scheduler = scheduler_with(state.clone(), Duration::from_secs(2), Duration::from_secs(1));

    scheduler.schedule(EventRow::new(EventType::System));
    scheduler.shutdown().await;

    scheduler.schedule(EventRow::new(EventType::System));
    scheduler.shutdown().await;

    assert_eq!(state.appends.lock().unwrap().len(), 2);
    assert_eq!(state.provision_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_wait_idle_returns_immediately_when_empty() {
    let set = Arc::new(InflightSet::new());
    tokio::time::timeout(Duration::from_millis(50), set.wait_idle())
        .await
        .expect("idle set should not block");
}

#[tokio::test]
async fn test_guard_drop_wakes_waiter() {
    let set = Arc::new(InflightSet::new());
    let guard = set.register();
    assert_eq!(set.len(), 1);

    let waiter = {
        let set = set.clone();
        tokio::spawn(async move { set.wait_idle().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    drop(guard);

    tokio::time::timeout(Duration::from_millis(100), waiter)
        .await
        .expect("waiter should wake on drain")
        .unwrap();
}
