//! Trace spans: named phases grouping events within a run

use crate::canonical::{hash_domain_value, Domain};
use crate::event::Visibility;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status shared by runs and spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TraceStatus {
    /// True for every status except `running`
    pub fn is_terminal(self) -> bool {
        !matches!(self, TraceStatus::Running)
    }
}

/// Terminal outcome for closing a span or finishing a run
///
/// A separate type so "close to running" is unrepresentable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Outcome {
    #[default]
    Completed,
    Failed,
    Cancelled,
}

impl From<Outcome> for TraceStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Completed => TraceStatus::Completed,
            Outcome::Failed => TraceStatus::Failed,
            Outcome::Cancelled => TraceStatus::Cancelled,
        }
    }
}

/// One span of a run
///
/// `parent_span_id` is a lookup key, never an owning reference; the span
/// hierarchy is reconstructed by id lookup, which makes cycles impossible
/// to express through the ledger API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSpan {
    /// Unique span id
    pub id: String,
    /// 0-based run-scoped span sequence number, contiguous
    pub span_seq: u64,
    /// Human-readable span name
    pub name: String,
    /// Weak reference to the parent span, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub status: TraceStatus,
    pub visibility: Visibility,
    /// RFC 3339 timestamp set at creation
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    /// Ordered references into the run's event list
    pub event_ids: Vec<String>,
    pub child_span_ids: Vec<String>,
    /// Span-domain digest over member event hashes, populated on close
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Span-domain digest over the span's member event hashes in seq order
pub fn span_hash(event_hashes: &[String]) -> String {
    let value = Value::Array(
        event_hashes
            .iter()
            .map(|h| Value::String(h.clone()))
            .collect(),
    );
    hash_domain_value(Domain::Span, &value)
}

/// Input for opening a span on a run
#[derive(Debug, Clone)]
pub struct SpanInput {
    pub name: String,
    /// Defaults to `private` when unset
    pub visibility: Option<Visibility>,
    pub parent_span_id: Option<String>,
    pub metadata: Option<Value>,
}

impl SpanInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: None,
            parent_span_id: None,
            metadata: None,
        }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn parent(mut self, parent_span_id: impl Into<String>) -> Self {
        self.parent_span_id = Some(parent_span_id.into());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
