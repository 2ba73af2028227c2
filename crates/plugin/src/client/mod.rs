//! Remote analytics clients and connection lifecycle.
//!
//! The control plane provisions the dataset and table; the data plane
//! streams encoded rows. Both sit behind traits so tests can substitute
//! in-memory fakes, and the connection manager owns the one place where
//! lazy initialization happens.

use std::sync::Arc;

use analytics_schema::{resolve_schema, SchemaField};
use arrow::datatypes::SchemaRef;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::TableCoordinates;
use crate::error::ClientError;

pub mod http;

pub use http::HttpClientFactory;

/// Control-plane operations: idempotent provisioning and teardown.
#[async_trait]
pub trait ControlClient: Send + Sync {
    /// Create the dataset if it does not exist.
    async fn ensure_dataset(&self) -> Result<(), ClientError>;

    /// Create the table with the given deployment schema if it does not
    /// exist.
    async fn ensure_table(&self, fields: &[SchemaField]) -> Result<(), ClientError>;

    /// Release control-plane resources.
    async fn close(&self) -> Result<(), ClientError>;
}

/// Data-plane operations: streaming appends of encoded row batches.
#[async_trait]
pub trait WriteClient: Send + Sync {
    /// Append one encoded batch to the default stream.
    async fn append_rows(&self, payload: Vec<u8>) -> Result<(), ClientError>;

    /// Flush and close the write transport.
    async fn close(&self) -> Result<(), ClientError>;
}

/// Builds the two clients. Split so initialization can provision the table
/// before the data plane exists.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn control_client(
        &self,
        table: &TableCoordinates,
    ) -> Result<Arc<dyn ControlClient>, ClientError>;

    async fn write_client(
        &self,
        table: &TableCoordinates,
    ) -> Result<Arc<dyn WriteClient>, ClientError>;
}

/// Everything a write needs once the connection is up.
pub struct Channels {
    pub control: Arc<dyn ControlClient>,
    pub write: Arc<dyn WriteClient>,
    pub schema: SchemaRef,
}

/// Connection lifecycle.
///
/// `Failed` is retryable: the next write attempts initialization again
/// rather than wedging ingestion on one transient outage.
enum ConnectionState {
    Uninitialized,
    Failed,
    Ready(Arc<Channels>),
}

/// Lazily-initialized connection to the analytics store.
///
/// The first write triggers initialization; concurrent writes that arrive
/// while it runs wait on the write lock and then observe the result, so
/// provisioning happens at most once per attempt.
pub struct Connection {
    factory: Arc<dyn ClientFactory>,
    table: TableCoordinates,
    fields: Vec<SchemaField>,
    state: RwLock<ConnectionState>,
}

impl Connection {
    pub fn new(
        factory: Arc<dyn ClientFactory>,
        table: TableCoordinates,
        fields: Vec<SchemaField>,
    ) -> Self {
        Self {
            factory,
            table,
            fields,
            state: RwLock::new(ConnectionState::Uninitialized),
        }
    }

    /// Channels for a write, initializing on first use.
    pub async fn ensure_ready(&self) -> Result<Arc<Channels>, ClientError> {
        {
            let state = self.state.read().await;
            if let ConnectionState::Ready(channels) = &*state {
                return Ok(channels.clone());
            }
        }

        let mut state = self.state.write().await;
        // Another writer may have initialized while we waited for the lock.
        if let ConnectionState::Ready(channels) = &*state {
            return Ok(channels.clone());
        }

        match self.initialize().await {
            Ok(channels) => {
                let channels = Arc::new(channels);
                *state = ConnectionState::Ready(channels.clone());
                tracing::info!(table = %self.table.path(), "analytics connection ready");
                Ok(channels)
            }
            Err(e) => {
                *state = ConnectionState::Failed;
                Err(e)
            }
        }
    }

    async fn initialize(&self) -> Result<Channels, ClientError> {
        let control = self.factory.control_client(&self.table).await?;
        control.ensure_dataset().await?;
        control.ensure_table(&self.fields).await?;
        let write = self.factory.write_client(&self.table).await?;
        let schema = resolve_schema(&self.fields)
            .map(Arc::new)
            .ok_or(ClientError::SchemaUnavailable)?;
        Ok(Channels {
            control,
            write,
            schema,
        })
    }

    /// Take the ready channels for teardown, resetting to `Uninitialized`
    /// so a later write can bring the connection back up.
    pub async fn take_ready(&self) -> Option<Arc<Channels>> {
        let mut state = self.state.write().await;
        match std::mem::replace(&mut *state, ConnectionState::Uninitialized) {
            ConnectionState::Ready(channels) => Some(channels),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
