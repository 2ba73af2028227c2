//! Plugin configuration.
//!
//! Builder-style configuration for the analytics plugin: destination
//! coordinates, remote endpoints, filtering lists, and the shutdown
//! timeouts. Everything has a sensible default; tests point the endpoints
//! at a local mock server.

use std::sync::Arc;
use std::time::Duration;

use crate::context::Content;

// =============================================================================
// Constants
// =============================================================================

/// Default destination table name.
pub const DEFAULT_TABLE_ID: &str = "agent_events";

/// Best-effort flush window for in-flight writes at shutdown.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout for closing the data-plane transport at shutdown.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout for individual HTTP requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Truncation limit for free-form text in content summaries.
pub const MAX_TEXT_LEN: usize = 500;

/// Truncation limit for serialized tool arguments and results.
pub const MAX_ARGS_LEN: usize = 1000;

/// Default control-plane base URL.
pub const DEFAULT_CONTROL_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Default data-plane (storage write) base URL.
pub const DEFAULT_WRITE_BASE_URL: &str = "https://bigquerystorage.googleapis.com/v1";

/// Caller-supplied content formatter override.
///
/// The override runs inside a panic guard; a panicking formatter yields a
/// literal failure marker instead of breaking ingestion.
pub type ContentFormatter = Arc<dyn Fn(&Content) -> String + Send + Sync>;

// =============================================================================
// Configuration
// =============================================================================

/// Destination table coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCoordinates {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableCoordinates {
    /// Coordinate with the default table name.
    pub fn new(project_id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: DEFAULT_TABLE_ID.into(),
        }
    }

    /// Override the table name.
    pub fn with_table(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = table_id.into();
        self
    }

    /// Resource path of the table.
    pub fn path(&self) -> String {
        format!(
            "projects/{}/datasets/{}/tables/{}",
            self.project_id, self.dataset_id, self.table_id
        )
    }
}

/// Remote endpoints and credentials.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Control-plane base URL (dataset/table provisioning).
    pub control_base_url: String,

    /// Data-plane base URL (streaming appends).
    pub write_base_url: String,

    /// Bearer token; falls back to the environment when unset.
    pub token: Option<String>,

    /// Per-request timeout for both planes.
    pub request_timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            control_base_url: DEFAULT_CONTROL_BASE_URL.into(),
            write_base_url: DEFAULT_WRITE_BASE_URL.into(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl EndpointConfig {
    /// Point both planes at the same base URL (mock servers, emulators).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.control_base_url = url.clone();
        self.write_base_url = url;
        self
    }

    /// Set the control-plane base URL.
    pub fn with_control_base_url(mut self, url: impl Into<String>) -> Self {
        self.control_base_url = url.into();
        self
    }

    /// Set the data-plane base URL.
    pub fn with_write_base_url(mut self, url: impl Into<String>) -> Self {
        self.write_base_url = url.into();
        self
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Plugin configuration.
#[derive(Clone)]
pub struct AnalyticsConfig {
    /// Whether ingestion is enabled at all.
    pub enabled: bool,

    /// If set, only listed event types are ingested.
    pub event_allowlist: Option<Vec<String>>,

    /// If set, listed event types are rejected. Evaluated in addition to
    /// the allow-list; deny wins for a kind present in both.
    pub event_denylist: Option<Vec<String>>,

    /// Optional content-formatting override.
    pub content_formatter: Option<ContentFormatter>,

    /// Shutdown flush window for outstanding writes.
    pub flush_timeout: Duration,

    /// Shutdown close window for the data-plane transport.
    pub close_timeout: Duration,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            event_allowlist: None,
            event_denylist: None,
            content_formatter: None,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

impl AnalyticsConfig {
    /// Enable or disable ingestion.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Restrict ingestion to the listed event types.
    pub fn with_allowlist(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.event_allowlist = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Reject the listed event types.
    pub fn with_denylist(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.event_denylist = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Override the default content formatter.
    pub fn with_content_formatter(mut self, formatter: ContentFormatter) -> Self {
        self.content_formatter = Some(formatter);
        self
    }

    /// Set the shutdown flush window.
    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// Set the transport close window.
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for AnalyticsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsConfig")
            .field("enabled", &self.enabled)
            .field("event_allowlist", &self.event_allowlist)
            .field("event_denylist", &self.event_denylist)
            .field("content_formatter", &self.content_formatter.is_some())
            .field("flush_timeout", &self.flush_timeout)
            .field("close_timeout", &self.close_timeout)
            .finish()
    }
}
