//! The lifecycle plugin surface.
//!
//! One hook per observable runtime moment. Every hook does the same cheap
//! synchronous work (filter, summarize, build a row) and hands the result
//! to the background scheduler; none of them awaits the network or lets an
//! ingestion failure reach the host.

use std::sync::Arc;

use analytics_schema::event_table_schema;
use serde_json::Value;

use crate::client::{ClientFactory, Connection, HttpClientFactory};
use crate::config::{AnalyticsConfig, EndpointConfig, TableCoordinates};
use crate::context::{
    AgentEvent, CallbackContext, Content, LlmRequestInfo, LlmResponseInfo, ToolInfo,
};
use crate::event::{derive_event_type, EventRow, EventType};
use crate::filter::EventFilter;
use crate::format::{
    content_json, format_args, format_content_safely, format_llm_request, format_llm_response,
};
use crate::writer::WriteScheduler;

/// Streams agent lifecycle events to a columnar analytics table.
pub struct AnalyticsPlugin {
    config: AnalyticsConfig,
    filter: EventFilter,
    scheduler: WriteScheduler,
}

impl AnalyticsPlugin {
    /// Plugin against the production endpoints.
    pub fn new(table: TableCoordinates, config: AnalyticsConfig) -> Self {
        Self::with_endpoints(table, config, EndpointConfig::default())
    }

    /// Plugin against explicit endpoints (emulators, mock servers).
    pub fn with_endpoints(
        table: TableCoordinates,
        config: AnalyticsConfig,
        endpoints: EndpointConfig,
    ) -> Self {
        Self::with_factory(table, config, Arc::new(HttpClientFactory::new(endpoints)))
    }

    /// Plugin with a caller-supplied client factory.
    pub fn with_factory(
        table: TableCoordinates,
        config: AnalyticsConfig,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        let filter = EventFilter::new(
            config.event_allowlist.clone(),
            config.event_denylist.clone(),
        );
        let connection = Arc::new(Connection::new(factory, table, event_table_schema()));
        let scheduler = WriteScheduler::new(connection, config.flush_timeout, config.close_timeout);
        Self {
            config,
            filter,
            scheduler,
        }
    }

    /// Filter and enqueue one row. Synchronous; never blocks the hook.
    fn schedule(&self, row: EventRow) {
        if !self.config.enabled {
            return;
        }
        if !self.filter.accept(row.event_type) {
            tracing::debug!(event_type = %row.event_type, "event rejected by filter");
            return;
        }
        self.scheduler.schedule(row);
    }

    fn summarize(&self, content: &Content) -> String {
        format_content_safely(content, self.config.content_formatter.as_ref())
    }

    // =========================================================================
    // Lifecycle hooks
    // =========================================================================

    /// A user message arrived, before the invocation starts.
    pub async fn on_user_message(&self, ctx: &CallbackContext, content: &Content) {
        self.schedule(
            EventRow::new(EventType::UserMessageReceived)
                .context(ctx)
                .content(format!("User Content: {}", self.summarize(content))),
        );
    }

    /// The invocation is about to run.
    pub async fn before_run(&self, ctx: &CallbackContext) {
        self.schedule(EventRow::new(EventType::InvocationStarting).context(ctx));
    }

    /// A raw event surfaced mid-invocation; its type is derived from its
    /// shape and its author is recorded as the agent.
    pub async fn on_event(&self, ctx: &CallbackContext, event: &AgentEvent) {
        let mut row = EventRow::new(derive_event_type(event))
            .context(ctx)
            .agent(event.author.clone())
            .error_opt(event.error_message.clone());
        if let Some(timestamp) = event.timestamp {
            row = row.at(timestamp);
        }
        if let Some(content) = &event.content {
            row = row.content(content_json(content));
        }
        self.schedule(row);
    }

    /// The invocation finished.
    pub async fn after_run(&self, ctx: &CallbackContext) {
        self.schedule(EventRow::new(EventType::InvocationCompleted).context(ctx));
    }

    /// An agent is about to execute.
    pub async fn before_agent(&self, ctx: &CallbackContext) {
        self.schedule(
            EventRow::new(EventType::AgentStarting)
                .context(ctx)
                .content(format!("Agent Name: {}", ctx.agent_name)),
        );
    }

    /// An agent finished executing.
    pub async fn after_agent(&self, ctx: &CallbackContext) {
        self.schedule(
            EventRow::new(EventType::AgentCompleted)
                .context(ctx)
                .content(format!("Agent Name: {}", ctx.agent_name)),
        );
    }

    /// A model call is about to be issued.
    pub async fn before_model(&self, ctx: &CallbackContext, request: &LlmRequestInfo) {
        self.schedule(
            EventRow::new(EventType::LlmRequest)
                .context(ctx)
                .content(format_llm_request(request)),
        );
    }

    /// A model response arrived.
    pub async fn after_model(&self, ctx: &CallbackContext, response: &LlmResponseInfo) {
        self.schedule(
            EventRow::new(EventType::LlmResponse)
                .context(ctx)
                .content(format_llm_response(response))
                .error_opt(response.error_message.clone()),
        );
    }

    /// A model call failed.
    pub async fn on_model_error(&self, ctx: &CallbackContext, error: &str) {
        self.schedule(
            EventRow::new(EventType::LlmError)
                .context(ctx)
                .error_message(error),
        );
    }

    /// A tool is about to run.
    pub async fn before_tool(&self, ctx: &CallbackContext, tool: &ToolInfo, args: &Value) {
        self.schedule(
            EventRow::new(EventType::ToolStarting)
                .context(ctx)
                .content(format!(
                    "Tool Name: {}, Description: {}, Arguments: {}",
                    tool.name,
                    tool.description,
                    format_args(args)
                )),
        );
    }

    /// A tool returned.
    pub async fn after_tool(&self, ctx: &CallbackContext, tool: &ToolInfo, result: &Value) {
        self.schedule(
            EventRow::new(EventType::ToolCompleted)
                .context(ctx)
                .content(format!(
                    "Tool Name: {}, Result: {}",
                    tool.name,
                    format_args(result)
                )),
        );
    }

    /// A tool failed.
    pub async fn on_tool_error(
        &self,
        ctx: &CallbackContext,
        tool: &ToolInfo,
        args: &Value,
        error: &str,
    ) {
        self.schedule(
            EventRow::new(EventType::ToolError)
                .context(ctx)
                .content(format!(
                    "Tool Name: {}, Arguments: {}",
                    tool.name,
                    format_args(args)
                ))
                .error_message(error),
        );
    }

    /// Drain in-flight writes and close the connection, within the
    /// configured windows. The plugin stays usable afterwards.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}
