//! Caller-owned, append-only record of processed requests (the REPL keeps one per session).
use chrono::{DateTime, Local};

use crate::dispatch::operation::OperationTag;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub input: String,
    pub operation: Option<OperationTag>,
    /// rendered result or error message
    pub outcome: String,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    pub fn push(&mut self, input: &str, operation: Option<OperationTag>, outcome: impl Into<String>) {
        self.entries.push(HistoryEntry {
            timestamp: Local::now(),
            input: input.to_string(),
            operation,
            outcome: outcome.into(),
        });
    }

    /// up to `n` entries, newest first
    pub fn recent(&self, n: usize) -> Vec<&HistoryEntry> {
        self.entries.iter().rev().take(n).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
