//! The append-only span/event ledger for a single run
//!
//! A `TraceRun` is a single-owner value: mutating operations take
//! `&mut self`, and finalization (`TraceRun::finalize`, bundle.rs) consumes
//! the run, so post-finalization mutation is a compile error rather than a
//! runtime check. Callers that share a run across tasks must serialize
//! access externally; sequence counters are not atomic.

use crate::chain::{HashChain, GENESIS_HASH};
use crate::error::{Result, TraceError};
use crate::event::{EventInput, TraceEvent, Visibility};
use crate::span::{span_hash, Outcome, SpanInput, TraceSpan, TraceStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version stamped on every run
pub const SCHEMA_VERSION: &str = "1.0";

/// One run's complete private record, mutable while `running`
///
/// The run owns all of its events and spans exclusively; spans reference
/// events by id only. Fields are public for verification and interchange
/// but should be treated as read-only outside this module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceRun {
    pub id: String,
    pub schema_version: String,
    pub agent_id: String,
    pub status: TraceStatus,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    pub events: Vec<TraceEvent>,
    pub spans: Vec<TraceSpan>,
    /// Current rolling chain digest over all appended events
    pub rolling_hash: String,
    /// Merkle root, populated by finalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merkle_root: Option<String>,
    /// Top-level commitment, populated by finalization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_hash: Option<String>,
    pub next_seq: u64,
    pub next_span_seq: u64,
}

impl TraceRun {
    /// Open a new run for `agent_id` with an empty ledger
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            id: format!("run-{}", Uuid::new_v4()),
            schema_version: SCHEMA_VERSION.to_string(),
            agent_id: agent_id.into(),
            status: TraceStatus::Running,
            started_at: Utc::now().to_rfc3339(),
            ended_at: None,
            events: Vec::new(),
            spans: Vec::new(),
            rolling_hash: GENESIS_HASH.to_string(),
            merkle_root: None,
            root_hash: None,
            next_seq: 0,
            next_span_seq: 0,
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.status != TraceStatus::Running {
            return Err(TraceError::AlreadyFinalized);
        }
        Ok(())
    }

    /// Look up a span by id
    pub fn span(&self, span_id: &str) -> Option<&TraceSpan> {
        self.spans.iter().find(|s| s.id == span_id)
    }

    /// Look up an event by id
    pub fn event(&self, event_id: &str) -> Option<&TraceEvent> {
        self.events.iter().find(|e| e.id == event_id)
    }

    /// All event hashes in seq order
    pub fn event_hashes(&self) -> Vec<String> {
        self.events.iter().map(|e| e.hash.clone()).collect()
    }

    /// Hashes of the given span's member events, in seq order
    pub(crate) fn span_event_hashes(&self, span: &TraceSpan) -> Vec<String> {
        self.events
            .iter()
            .filter(|e| span.event_ids.contains(&e.id))
            .map(|e| e.hash.clone())
            .collect()
    }

    /// Open a new span, returning its id
    ///
    /// Fails with `InvalidParent` if `parent_span_id` does not resolve to an
    /// existing span in this run.
    pub fn add_span(&mut self, input: SpanInput) -> Result<String> {
        self.ensure_running()?;

        let parent_index = match &input.parent_span_id {
            Some(parent_id) => Some(
                self.spans
                    .iter()
                    .position(|s| &s.id == parent_id)
                    .ok_or_else(|| TraceError::InvalidParent(parent_id.clone()))?,
            ),
            None => None,
        };

        let id = format!("span-{}", Uuid::new_v4());
        let span = TraceSpan {
            id: id.clone(),
            span_seq: self.next_span_seq,
            name: input.name,
            parent_span_id: input.parent_span_id,
            status: TraceStatus::Running,
            visibility: input.visibility.unwrap_or(Visibility::Private),
            started_at: Utc::now().to_rfc3339(),
            ended_at: None,
            duration_ms: None,
            event_ids: Vec::new(),
            child_span_ids: Vec::new(),
            hash: None,
            metadata: input.metadata,
        };

        if let Some(index) = parent_index {
            self.spans[index].child_span_ids.push(id.clone());
        }
        self.next_span_seq += 1;
        self.spans.push(span);
        Ok(id)
    }

    /// Append an event to the given span, returning the event id
    ///
    /// Assigns the next sequence number, resolves the kind's default
    /// visibility unless overridden, computes the event hash, and advances
    /// the rolling chain. All fallible work happens before any state is
    /// touched, so a failed call leaves the run unchanged.
    pub fn add_event(&mut self, span_id: &str, input: EventInput) -> Result<String> {
        self.ensure_running()?;

        let span_index = self
            .spans
            .iter()
            .position(|s| s.id == span_id)
            .ok_or_else(|| TraceError::UnknownSpan(span_id.to_string()))?;
        if self.spans[span_index].status != TraceStatus::Running {
            return Err(TraceError::SpanClosed(span_id.to_string()));
        }

        let visibility = input
            .visibility
            .unwrap_or_else(|| input.payload.default_visibility());
        let mut event = TraceEvent {
            id: format!("evt-{}", Uuid::new_v4()),
            seq: self.next_seq,
            timestamp: Utc::now().to_rfc3339(),
            visibility,
            hash: String::new(),
            payload: input.payload,
        };
        event.hash = event.compute_hash()?;
        let next_rolling = HashChain::step(&self.rolling_hash, &event.hash, self.next_seq);

        let id = event.id.clone();
        self.rolling_hash = next_rolling;
        self.next_seq += 1;
        self.spans[span_index].event_ids.push(id.clone());
        self.events.push(event);
        Ok(id)
    }

    /// Close a span with the given terminal outcome
    ///
    /// Sets `ended_at` and `duration_ms`, and populates the span hash over
    /// its member event hashes in seq order.
    pub fn close_span(&mut self, span_id: &str, outcome: Outcome) -> Result<()> {
        self.ensure_running()?;

        let span_index = self
            .spans
            .iter()
            .position(|s| s.id == span_id)
            .ok_or_else(|| TraceError::UnknownSpan(span_id.to_string()))?;
        if self.spans[span_index].status != TraceStatus::Running {
            return Err(TraceError::SpanClosed(span_id.to_string()));
        }

        let hash = span_hash(&self.span_event_hashes(&self.spans[span_index]));
        let ended = Utc::now();
        let started = chrono::DateTime::parse_from_rfc3339(&self.spans[span_index].started_at)
            .map_err(|e| TraceError::SerializationError(e.to_string()))?;
        let duration_ms = ended.signed_duration_since(started).num_milliseconds();

        let span = &mut self.spans[span_index];
        span.status = outcome.into();
        span.ended_at = Some(ended.to_rfc3339());
        span.duration_ms = Some(duration_ms);
        span.hash = Some(hash);
        Ok(())
    }

    /// Move the run to a terminal status, stamping `ended_at`
    pub fn finish(&mut self, outcome: Outcome) -> Result<()> {
        self.ensure_running()?;
        self.status = outcome.into();
        self.ended_at = Some(Utc::now().to_rfc3339());
        Ok(())
    }
}
