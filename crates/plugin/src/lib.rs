//! Non-blocking agent lifecycle telemetry.
//!
//! Observes runtime lifecycle moments (user messages, agent and invocation
//! boundaries, model calls, tool calls, errors) and streams each as one
//! structured row into a remote columnar analytics table. Hooks are cheap
//! and synchronous at their core; every network interaction runs on a
//! background task, and no ingestion failure ever reaches the host.
//!
//! ```no_run
//! use analytics_plugin::{AnalyticsConfig, AnalyticsPlugin, TableCoordinates};
//!
//! # async fn run() {
//! let plugin = AnalyticsPlugin::new(
//!     TableCoordinates::new("my-project", "agent_analytics"),
//!     AnalyticsConfig::default().with_denylist(["LLM_REQUEST"]),
//! );
//!
//! // ... hand the plugin to the agent runtime ...
//!
//! plugin.shutdown().await;
//! # }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod filter;
pub mod format;
pub mod plugin;
pub mod writer;

pub use client::{ClientFactory, ControlClient, HttpClientFactory, WriteClient};
pub use config::{AnalyticsConfig, ContentFormatter, EndpointConfig, TableCoordinates};
pub use context::{
    AgentEvent, CallbackContext, Content, LlmRequestInfo, LlmResponseInfo, Part, TokenUsage,
    ToolInfo,
};
pub use error::ClientError;
pub use event::{derive_event_type, EventRow, EventType};
pub use plugin::AnalyticsPlugin;
