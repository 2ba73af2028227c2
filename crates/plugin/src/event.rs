//! Event taxonomy and row assembly.
//!
//! [`EventType`] is the fixed taxonomy exposed in the `event_type` column.
//! [`EventRow`] is one observed occurrence: built synchronously inside a
//! lifecycle hook, immutable once built, consumed by exactly one
//! background write and then discarded.

use std::fmt;

use analytics_schema::CellValue;
use arrow::datatypes::Schema;
use chrono::{DateTime, Utc};

use crate::context::{AgentEvent, CallbackContext};

/// Fixed taxonomy of observable lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    UserMessageReceived,
    InvocationStarting,
    InvocationCompleted,
    AgentStarting,
    AgentCompleted,
    LlmRequest,
    LlmResponse,
    LlmError,
    ToolStarting,
    ToolCompleted,
    ToolError,
    // Derived generically from a raw event's shape:
    UserInput,
    ToolCall,
    ToolResult,
    ModelResponse,
    Error,
    System,
}

impl EventType {
    /// The wire name stored in the `event_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::UserMessageReceived => "USER_MESSAGE_RECEIVED",
            EventType::InvocationStarting => "INVOCATION_STARTING",
            EventType::InvocationCompleted => "INVOCATION_COMPLETED",
            EventType::AgentStarting => "AGENT_STARTING",
            EventType::AgentCompleted => "AGENT_COMPLETED",
            EventType::LlmRequest => "LLM_REQUEST",
            EventType::LlmResponse => "LLM_RESPONSE",
            EventType::LlmError => "LLM_ERROR",
            EventType::ToolStarting => "TOOL_STARTING",
            EventType::ToolCompleted => "TOOL_COMPLETED",
            EventType::ToolError => "TOOL_ERROR",
            EventType::UserInput => "USER_INPUT",
            EventType::ToolCall => "TOOL_CALL",
            EventType::ToolResult => "TOOL_RESULT",
            EventType::ModelResponse => "MODEL_RESPONSE",
            EventType::Error => "ERROR",
            EventType::System => "SYSTEM",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the taxonomy entry for a raw mid-invocation event from its shape.
pub fn derive_event_type(event: &AgentEvent) -> EventType {
    if event.author == "user" {
        return EventType::UserInput;
    }
    if event.has_function_calls() {
        return EventType::ToolCall;
    }
    if event.has_function_responses() {
        return EventType::ToolResult;
    }
    if event.has_parts() {
        return EventType::ModelResponse;
    }
    if event.error_message.is_some() {
        return EventType::Error;
    }
    EventType::System
}

/// One observed occurrence, fully normalized.
///
/// `new` captures the current time and defaults every optional column to
/// null; hook-supplied fields overwrite the defaults. The event type is a
/// constructor argument: a row without one cannot exist.
#[derive(Debug, Clone)]
pub struct EventRow {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub agent: Option<String>,
    pub session_id: Option<String>,
    pub invocation_id: Option<String>,
    pub user_id: Option<String>,
    pub content: Option<String>,
    pub error_message: Option<String>,
}

impl EventRow {
    /// A row at capture time with all optional columns null.
    pub fn new(event_type: EventType) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            agent: None,
            session_id: None,
            invocation_id: None,
            user_id: None,
            content: None,
            error_message: None,
        }
    }

    /// Override the capture timestamp (hooks that carry their own).
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Fill the identifier columns from a callback context.
    pub fn context(mut self, ctx: &CallbackContext) -> Self {
        self.agent = Some(ctx.agent_name.clone());
        self.session_id = Some(ctx.session_id.clone());
        self.invocation_id = Some(ctx.invocation_id.clone());
        self.user_id = Some(ctx.user_id.clone());
        self
    }

    pub fn agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn content_opt(mut self, content: Option<String>) -> Self {
        self.content = content;
        self
    }

    pub fn error_message(mut self, error: impl Into<String>) -> Self {
        self.error_message = Some(error.into());
        self
    }

    pub fn error_opt(mut self, error: Option<String>) -> Self {
        self.error_message = error;
        self
    }

    /// Map the row onto a resolved wire schema, by column name.
    ///
    /// Columns the row does not know become null; the scheduler's encoder
    /// rejects nulls in required columns.
    pub fn cells(&self, schema: &Schema) -> Vec<CellValue> {
        schema
            .fields()
            .iter()
            .map(|field| match field.name().as_str() {
                "timestamp" => CellValue::TimestampMicros(self.timestamp.timestamp_micros()),
                "event_type" => CellValue::Str(self.event_type.as_str().to_string()),
                "agent" => opt_str(&self.agent),
                "session_id" => opt_str(&self.session_id),
                "invocation_id" => opt_str(&self.invocation_id),
                "user_id" => opt_str(&self.user_id),
                "content" => opt_str(&self.content),
                "error_message" => opt_str(&self.error_message),
                _ => CellValue::Null,
            })
            .collect()
    }
}

fn opt_str(value: &Option<String>) -> CellValue {
    match value {
        Some(v) => CellValue::Str(v.clone()),
        None => CellValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Part;
    use analytics_schema::{event_table_schema, resolve_schema};

    fn event_with(author: &str, parts: Option<Vec<Part>>, error: Option<&str>) -> AgentEvent {
        AgentEvent {
            author: author.into(),
            content: parts,
            error_message: error.map(Into::into),
            timestamp: None,
        }
    }

    #[test]
    fn test_derive_user_input() {
        let event = event_with("user", Some(vec![Part::Text("hi".into())]), None);
        assert_eq!(derive_event_type(&event), EventType::UserInput);
    }

    #[test]
    fn test_derive_tool_call_beats_model_response() {
        let event = event_with(
            "root_agent",
            Some(vec![
                Part::Text("calling".into()),
                Part::FunctionCall {
                    name: "search".into(),
                    args: serde_json::json!({}),
                },
            ]),
            None,
        );
        assert_eq!(derive_event_type(&event), EventType::ToolCall);
    }

    #[test]
    fn test_derive_tool_result() {
        let event = event_with(
            "root_agent",
            Some(vec![Part::FunctionResponse {
                name: "search".into(),
                response: serde_json::json!({"hits": 3}),
            }]),
            None,
        );
        assert_eq!(derive_event_type(&event), EventType::ToolResult);
    }

    #[test]
    fn test_derive_model_response() {
        let event = event_with("root_agent", Some(vec![Part::Text("answer".into())]), None);
        assert_eq!(derive_event_type(&event), EventType::ModelResponse);
    }

    #[test]
    fn test_derive_error_then_system() {
        let error = event_with("root_agent", None, Some("boom"));
        assert_eq!(derive_event_type(&error), EventType::Error);

        let system = event_with("root_agent", None, None);
        assert_eq!(derive_event_type(&system), EventType::System);
    }

    #[test]
    fn test_row_defaults_and_merge() {
        let ctx = CallbackContext {
            agent_name: "root".into(),
            session_id: "s1".into(),
            invocation_id: "i1".into(),
            user_id: "u1".into(),
        };
        let row = EventRow::new(EventType::ToolStarting)
            .context(&ctx)
            .content("Tool Name: search");

        assert_eq!(row.event_type, EventType::ToolStarting);
        assert_eq!(row.agent.as_deref(), Some("root"));
        assert_eq!(row.user_id.as_deref(), Some("u1"));
        assert!(row.error_message.is_none());
    }

    #[test]
    fn test_cells_follow_schema_order() {
        let schema = resolve_schema(&event_table_schema()).unwrap();
        let row = EventRow::new(EventType::LlmError).error_message("timeout");
        let cells = row.cells(&schema);

        assert_eq!(cells.len(), 8);
        assert!(matches!(cells[0], CellValue::TimestampMicros(_)));
        assert_eq!(cells[1], CellValue::Str("LLM_ERROR".into()));
        assert_eq!(cells[6], CellValue::Null); // content
        assert_eq!(cells[7], CellValue::Str("timeout".into()));
    }
}
