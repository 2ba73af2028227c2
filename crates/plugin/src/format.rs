//! Content summarization.
//!
//! Hooks hand over arbitrarily large payloads; these helpers reduce them to
//! bounded human-readable summaries for the `content` column. Formatting is
//! best-effort: a panicking caller-supplied formatter degrades to a literal
//! failure marker, never to a lost row.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;

use crate::config::{ContentFormatter, MAX_ARGS_LEN, MAX_TEXT_LEN};
use crate::context::{Content, LlmRequestInfo, LlmResponseInfo, Part, TokenUsage};

/// Literal stored when a content formatter panics.
pub const FORMATTING_FAILED: &str = "[FORMATTING FAILED]";

/// Truncate to `max` characters, appending `...` when anything was cut.
///
/// Character-based, so multi-byte text never splits inside a code point.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Default summary of message content: one clause per part, joined with
/// `" | "`. Text parts are truncated; calls and responses reduce to the
/// function name.
pub fn format_content(content: &Content) -> String {
    if content.is_empty() {
        return "None".to_string();
    }
    let clauses: Vec<String> = content
        .iter()
        .map(|part| match part {
            Part::Text(text) => format!("text: '{}'", truncate(text, MAX_TEXT_LEN)),
            Part::FunctionCall { name, .. } => format!("call: {name}"),
            Part::FunctionResponse { name, .. } => format!("resp: {name}"),
        })
        .collect();
    clauses.join(" | ")
}

/// Serialize tool arguments or results, truncated to the argument limit.
pub fn format_args(value: &Value) -> String {
    if value.is_null() {
        return "{}".to_string();
    }
    truncate(&value.to_string(), MAX_ARGS_LEN)
}

/// Run the configured formatter (or the default) under a panic guard.
pub fn format_content_safely(content: &Content, formatter: Option<&ContentFormatter>) -> String {
    let result = match formatter {
        Some(f) => catch_unwind(AssertUnwindSafe(|| f(content))),
        None => catch_unwind(AssertUnwindSafe(|| format_content(content))),
    };
    match result {
        Ok(text) => text,
        Err(_) => {
            tracing::warn!("content formatter panicked, storing failure marker");
            FORMATTING_FAILED.to_string()
        }
    }
}

/// Summary of an outgoing model request: model, system prompt, generation
/// parameters, and the tool surface offered to the model.
pub fn format_llm_request(request: &LlmRequestInfo) -> String {
    let mut sections = Vec::new();

    if let Some(model) = &request.model {
        sections.push(format!("Model: {model}"));
    }
    if let Some(system) = &request.system_instruction {
        sections.push(format!("System Prompt: {}", truncate(system, MAX_TEXT_LEN)));
    }

    let mut params = Vec::new();
    if let Some(t) = request.temperature {
        params.push(format!("temperature: {t}"));
    }
    if let Some(p) = request.top_p {
        params.push(format!("top_p: {p}"));
    }
    if let Some(k) = request.top_k {
        params.push(format!("top_k: {k}"));
    }
    if let Some(m) = request.max_output_tokens {
        params.push(format!("max_output_tokens: {m}"));
    }
    if !params.is_empty() {
        sections.push(format!("Params: {{{}}}", params.join(", ")));
    }

    if !request.tool_names.is_empty() {
        sections.push(format!("Available Tools: {}", request.tool_names.join(", ")));
    }

    if sections.is_empty() {
        return "None".to_string();
    }
    sections.join(" | ")
}

/// Summary of a model response: function calls by name, or truncated text,
/// plus token accounting when the runtime reported it.
pub fn format_llm_response(response: &LlmResponseInfo) -> String {
    let mut sections = Vec::new();

    if let Some(content) = &response.content {
        let calls: Vec<&str> = content
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        if !calls.is_empty() {
            sections.push(format!("Tool Name: {}", calls.join(", ")));
        } else {
            let text: Vec<String> = content
                .iter()
                .filter_map(|p| match p {
                    Part::Text(t) => Some(truncate(t, MAX_TEXT_LEN)),
                    _ => None,
                })
                .collect();
            if !text.is_empty() {
                sections.push(format!("Tool Name: text_response, {}", text.join(" ")));
            }
        }
    }

    if let Some(usage) = &response.usage {
        sections.push(format!(
            "Token Usage: {{prompt: {}, candidates: {}, total: {}}}",
            count_or_na(usage.prompt),
            count_or_na(usage.candidates),
            count_or_na(usage.total)
        ));
    }

    if sections.is_empty() {
        return "None".to_string();
    }
    sections.join(" | ")
}

fn count_or_na(count: Option<u64>) -> String {
    match count {
        Some(n) => n.to_string(),
        None => "N/A".to_string(),
    }
}

/// JSON dump of raw event content, for generically-derived events.
pub fn content_json(content: &Content) -> String {
    let parts: Vec<Value> = content
        .iter()
        .map(|part| match part {
            Part::Text(text) => {
                serde_json::json!({"text": truncate(text, MAX_TEXT_LEN)})
            }
            Part::FunctionCall { name, args } => {
                serde_json::json!({"function_call": {"name": name, "args": args}})
            }
            Part::FunctionResponse { name, response } => {
                serde_json::json!({"function_response": {"name": name, "response": response}})
            }
        })
        .collect();
    truncate(&Value::Array(parts).to_string(), MAX_ARGS_LEN)
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
