//! Trace events: the tagged union of recordable actions
//!
//! Events are immutable once appended. The `kind` tag is closed so adding a
//! new kind forces every match site to handle it.

use crate::canonical::{hash_domain_value, to_value_without, Domain};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Disclosure level governing redaction in the public view
///
/// Visibility never encrypts anything; it only controls what the public view
/// carries. `private` and `secret` currently redact identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Disclosed in the public view
    Public,
    /// Redacted to a hash in the public view
    Private,
    /// Redacted to a hash in the public view
    Secret,
}

/// Kind-specific payload of a trace event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EventPayload {
    /// A command issued by the agent or process
    Command {
        command: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        args: Option<Vec<String>>,
    },
    /// Output produced by a command or tool
    Output {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stream: Option<String>,
    },
    /// A decision taken by the agent
    Decision {
        description: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        rationale: Option<String>,
    },
    /// Something the agent observed in its environment
    Observation { content: String },
    /// An error encountered during execution
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },
    /// Application-defined event
    Custom {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
}

impl EventPayload {
    /// Tag string as it appears in serialized form
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::Command { .. } => "command",
            EventPayload::Output { .. } => "output",
            EventPayload::Decision { .. } => "decision",
            EventPayload::Observation { .. } => "observation",
            EventPayload::Error { .. } => "error",
            EventPayload::Custom { .. } => "custom",
        }
    }

    /// Visibility applied when the caller does not override it
    pub fn default_visibility(&self) -> Visibility {
        match self {
            EventPayload::Command { .. } | EventPayload::Observation { .. } => Visibility::Public,
            EventPayload::Output { .. }
            | EventPayload::Decision { .. }
            | EventPayload::Error { .. }
            | EventPayload::Custom { .. } => Visibility::Private,
        }
    }
}

/// One recorded event, immutable once appended to a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    /// Unique event id
    pub id: String,
    /// 0-based run-scoped sequence number, strictly contiguous
    pub seq: u64,
    /// RFC 3339 timestamp assigned at append time
    pub timestamp: String,
    /// Disclosure level
    pub visibility: Visibility,
    /// Event-domain digest of the event with this field excluded
    pub hash: String,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl TraceEvent {
    /// Recompute the event-domain digest (hash field excluded)
    pub fn compute_hash(&self) -> Result<String> {
        let value = to_value_without(self, &["hash"])?;
        Ok(hash_domain_value(Domain::Event, &value))
    }
}

/// Input for appending an event to a run
#[derive(Debug, Clone)]
pub struct EventInput {
    pub payload: EventPayload,
    /// Overrides the kind default when set
    pub visibility: Option<Visibility>,
}

impl EventInput {
    /// Create an input from a payload, using the kind's default visibility
    pub fn new(payload: EventPayload) -> Self {
        Self {
            payload,
            visibility: None,
        }
    }

    /// Override the default visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    /// A command event
    pub fn command(command: impl Into<String>) -> Self {
        Self::new(EventPayload::Command {
            command: command.into(),
            args: None,
        })
    }

    /// An output event
    pub fn output(content: impl Into<String>) -> Self {
        Self::new(EventPayload::Output {
            content: content.into(),
            stream: None,
        })
    }

    /// A decision event
    pub fn decision(description: impl Into<String>) -> Self {
        Self::new(EventPayload::Decision {
            description: description.into(),
            rationale: None,
        })
    }

    /// An observation event
    pub fn observation(content: impl Into<String>) -> Self {
        Self::new(EventPayload::Observation {
            content: content.into(),
        })
    }

    /// An error event
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventPayload::Error {
            message: message.into(),
            details: None,
        })
    }

    /// A custom event
    pub fn custom(name: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self::new(EventPayload::Custom {
            name: name.into(),
            data,
        })
    }
}
