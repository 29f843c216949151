//! Bundle assembly: finalization and the visibility-partitioned public view

use crate::canonical::{hash_domain_value, Domain};
use crate::error::{Result, TraceError};
use crate::event::{TraceEvent, Visibility};
use crate::merkle::TraceMerkleTree;
use crate::run::TraceRun;
use crate::span::{TraceSpan, TraceStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Bundle format version
pub const FORMAT_VERSION: &str = "1.0";

/// Hash-only stand-in for a non-public span
///
/// `hash` is absent for a span that was still running at finalization,
/// mirroring the span's own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactedSpanHash {
    pub span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// A public span as disclosed in the public view
///
/// Carries the span's own fields plus its `public`-visibility events inline;
/// non-public events are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSpan {
    pub id: String,
    pub span_seq: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub status: TraceStatus,
    pub visibility: Visibility,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Children that are themselves public, so the disclosed hierarchy is
    /// reconstructible from the view alone
    pub child_span_ids: Vec<String>,
    pub events: Vec<TraceEvent>,
}

/// The redacted, disclosable view of a finalized run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceBundlePublicView {
    pub run_id: String,
    pub agent_id: String,
    pub schema_version: String,
    pub status: TraceStatus,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    pub total_events: u64,
    pub total_spans: u64,
    pub root_hash: String,
    pub merkle_root: String,
    /// Public spans with their public events, sorted by spanSeq
    pub public_spans: Vec<PublicSpan>,
    /// Every non-public span, hash only; `private` and `secret` redact alike
    pub redacted_span_hashes: Vec<RedactedSpanHash>,
}

/// The finalized, immutable trace artifact
///
/// Never mutated after creation; derived operations (signing) return new
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceBundle {
    pub format_version: String,
    pub public_view: TraceBundlePublicView,
    pub private_run: TraceRun,
    pub merkle_root: String,
    pub root_hash: String,
    /// Hex-encoded provider signature, set by `sign_bundle`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_id: Option<String>,
}

/// Top-level commitment binding the rolling chain and the Merkle root
pub(crate) fn root_commitment(rolling_hash: &str, merkle_root: &str) -> String {
    hash_domain_value(
        Domain::Root,
        &json!({
            "rollingHash": rolling_hash,
            "merkleRoot": merkle_root,
        }),
    )
}

impl TraceRun {
    /// Finalize this run into an immutable `TraceBundle`
    ///
    /// Fails with `InvalidRunStatus` if the run is still `running`; the
    /// caller must set a terminal status first (`finish`). Consuming `self`
    /// guarantees no mutation can follow finalization.
    pub fn finalize(mut self) -> Result<TraceBundle> {
        if self.status == TraceStatus::Running {
            return Err(TraceError::InvalidRunStatus);
        }

        let tree = TraceMerkleTree::build(&self.event_hashes());
        let merkle_root = tree.root_hash;
        let root_hash = root_commitment(&self.rolling_hash, &merkle_root);
        self.merkle_root = Some(merkle_root.clone());
        self.root_hash = Some(root_hash.clone());

        let public_view = build_public_view(&self, &merkle_root, &root_hash);
        Ok(TraceBundle {
            format_version: FORMAT_VERSION.to_string(),
            public_view,
            private_run: self,
            merkle_root,
            root_hash,
            signature: None,
            signer_id: None,
        })
    }
}

fn public_span(run: &TraceRun, span: &TraceSpan) -> PublicSpan {
    let events = run
        .events
        .iter()
        .filter(|e| span.event_ids.contains(&e.id) && e.visibility == Visibility::Public)
        .cloned()
        .collect();
    let child_span_ids = span
        .child_span_ids
        .iter()
        .filter(|id| {
            run.span(id)
                .is_some_and(|child| child.visibility == Visibility::Public)
        })
        .cloned()
        .collect();
    PublicSpan {
        id: span.id.clone(),
        span_seq: span.span_seq,
        name: span.name.clone(),
        parent_span_id: span.parent_span_id.clone(),
        status: span.status,
        visibility: span.visibility,
        started_at: span.started_at.clone(),
        ended_at: span.ended_at.clone(),
        duration_ms: span.duration_ms,
        hash: span.hash.clone(),
        metadata: span.metadata.clone(),
        child_span_ids,
        events,
    }
}

fn build_public_view(run: &TraceRun, merkle_root: &str, root_hash: &str) -> TraceBundlePublicView {
    let mut public_spans = Vec::new();
    let mut redacted_span_hashes = Vec::new();
    // run.spans is already in spanSeq order
    for span in &run.spans {
        if span.visibility == Visibility::Public {
            public_spans.push(public_span(run, span));
        } else {
            redacted_span_hashes.push(RedactedSpanHash {
                span_id: span.id.clone(),
                hash: span.hash.clone(),
            });
        }
    }

    TraceBundlePublicView {
        run_id: run.id.clone(),
        agent_id: run.agent_id.clone(),
        schema_version: run.schema_version.clone(),
        status: run.status,
        started_at: run.started_at.clone(),
        ended_at: run.ended_at.clone(),
        total_events: run.events.len() as u64,
        total_spans: run.spans.len() as u64,
        root_hash: root_hash.to_string(),
        merkle_root: merkle_root.to_string(),
        public_spans,
        redacted_span_hashes,
    }
}

impl TraceBundle {
    /// The public view derived at finalization (pure accessor)
    pub fn public_view(&self) -> &TraceBundlePublicView {
        &self.public_view
    }

    /// Merkle tree over this bundle's events, for proof generation
    pub fn merkle_tree(&self) -> TraceMerkleTree {
        TraceMerkleTree::build(&self.private_run.event_hashes())
    }

    /// Serialize to interchange JSON bytes
    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(TraceError::from)
    }

    /// Decode interchange JSON bytes, failing fast on malformed input
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| TraceError::MalformedBundle(e.to_string()))
    }
}
