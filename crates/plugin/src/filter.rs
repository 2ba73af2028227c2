//! Event-type filtering.
//!
//! The filter decides synchronously, before any work is scheduled, whether
//! an event type is ingested. The deny-list is evaluated in addition to the
//! allow-list, and wins for a type present in both.

use std::collections::HashSet;

use crate::event::EventType;

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    allow: Option<HashSet<String>>,
    deny: Option<HashSet<String>>,
}

impl EventFilter {
    pub fn new(allow: Option<Vec<String>>, deny: Option<Vec<String>>) -> Self {
        Self {
            allow: allow.map(|list| list.into_iter().collect()),
            deny: deny.map(|list| list.into_iter().collect()),
        }
    }

    /// Whether an event of this type should be ingested.
    pub fn accept(&self, event_type: EventType) -> bool {
        let name = event_type.as_str();
        if let Some(deny) = &self.deny {
            if deny.contains(name) {
                return false;
            }
        }
        if let Some(allow) = &self.allow {
            return allow.contains(name);
        }
        true
    }
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
