//! Host-runtime boundary types.
//!
//! The agent runtime invokes lifecycle hooks with these lightweight data
//! carriers. They mirror what the runtime knows at each point and are the
//! only coupling between the host and this pipeline.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Identifiers the runtime carries through one invocation.
#[derive(Debug, Clone, Default)]
pub struct CallbackContext {
    pub agent_name: String,
    pub session_id: String,
    pub invocation_id: String,
    pub user_id: String,
}

/// One part of a message's content.
#[derive(Debug, Clone)]
pub enum Part {
    Text(String),
    FunctionCall { name: String, args: Value },
    FunctionResponse { name: String, response: Value },
}

/// Ordered message content.
pub type Content = Vec<Part>;

/// A raw event observed mid-invocation; its taxonomy entry is derived
/// from its shape (see [`crate::event::derive_event_type`]).
#[derive(Debug, Clone, Default)]
pub struct AgentEvent {
    pub author: String,
    pub content: Option<Content>,
    pub error_message: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl AgentEvent {
    pub fn has_function_calls(&self) -> bool {
        self.parts()
            .any(|p| matches!(p, Part::FunctionCall { .. }))
    }

    pub fn has_function_responses(&self) -> bool {
        self.parts()
            .any(|p| matches!(p, Part::FunctionResponse { .. }))
    }

    pub fn has_parts(&self) -> bool {
        self.parts().next().is_some()
    }

    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.content.iter().flatten()
    }
}

/// What is known about a model call before it is issued.
#[derive(Debug, Clone, Default)]
pub struct LlmRequestInfo {
    pub model: Option<String>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub tool_names: Vec<String>,
}

/// Token accounting reported with a model response.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt: Option<u64>,
    pub candidates: Option<u64>,
    pub total: Option<u64>,
}

/// A model response as handed to the after-model hook.
#[derive(Debug, Clone, Default)]
pub struct LlmResponseInfo {
    pub content: Option<Content>,
    pub error_message: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// Static description of a tool about to run.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

impl ToolInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}
