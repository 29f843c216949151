//! Independent re-verification of a finalized bundle
//!
//! Every check recomputes its digests from scratch and all checks run even
//! when earlier ones fail, so one inspection yields the full diagnostic.

use crate::bundle::{root_commitment, TraceBundle};
use crate::chain::HashChain;
use crate::merkle::TraceMerkleTree;
use crate::span::{span_hash, TraceStatus};
use serde::{Deserialize, Serialize};

/// Outcome of each of the six verification checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationChecks {
    pub event_hashes_valid: bool,
    pub span_hashes_valid: bool,
    pub rolling_hash_valid: bool,
    pub merkle_root_valid: bool,
    pub root_hash_valid: bool,
    pub sequence_valid: bool,
}

impl VerificationChecks {
    fn all(&self) -> bool {
        self.event_hashes_valid
            && self.span_hashes_valid
            && self.rolling_hash_valid
            && self.merkle_root_valid
            && self.root_hash_valid
            && self.sequence_valid
    }
}

/// Structured verification result; never an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub checks: VerificationChecks,
}

/// Recompute every hash and sequence invariant of a bundle
pub fn verify_bundle(bundle: &TraceBundle) -> VerificationReport {
    let run = &bundle.private_run;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Each event's domain hash
    let mut event_hashes_valid = true;
    for event in &run.events {
        let matches = match event.compute_hash() {
            Ok(recomputed) => recomputed == event.hash,
            Err(_) => false,
        };
        if !matches {
            event_hashes_valid = false;
            errors.push(format!("Event hash mismatch at seq {}", event.seq));
        }
    }

    // Each closed span's digest over its member event hashes; a span hash
    // is defined iff the span left the running state
    let mut span_hashes_valid = true;
    for span in &run.spans {
        if span.status == TraceStatus::Running {
            if span.hash.is_some() {
                span_hashes_valid = false;
                errors.push(format!("Unexpected hash on running span {}", span.id));
            }
            continue;
        }
        let recomputed = span_hash(&run.span_event_hashes(span));
        if span.hash.as_deref() != Some(recomputed.as_str()) {
            span_hashes_valid = false;
            errors.push(format!("Span hash mismatch for span {}", span.id));
        }
    }

    // Replay the rolling chain over the stored event hashes
    let mut chain = HashChain::new();
    for event in &run.events {
        chain.absorb(&event.hash);
    }
    let rolling_hash_valid = chain.current() == run.rolling_hash;
    if !rolling_hash_valid {
        errors.push("Rolling hash mismatch".to_string());
    }

    // Rebuild the Merkle tree; the copies finalization stamps on the run
    // record and the public view must agree with the bundle-level value
    let tree = TraceMerkleTree::build(&run.event_hashes());
    let mut merkle_root_valid = tree.root_hash == bundle.merkle_root;
    if !merkle_root_valid {
        errors.push("Merkle root mismatch".to_string());
    }
    if run.merkle_root.as_deref() != Some(bundle.merkle_root.as_str()) {
        merkle_root_valid = false;
        errors.push("Merkle root mismatch on run record".to_string());
    }
    if bundle.public_view.merkle_root != bundle.merkle_root {
        merkle_root_valid = false;
        errors.push("Merkle root mismatch on public view".to_string());
    }

    // Recompute the top-level commitment from the stored inputs, then hold
    // the stored copies to the bundle-level value as above
    let mut root_hash_valid =
        root_commitment(&run.rolling_hash, &bundle.merkle_root) == bundle.root_hash;
    if !root_hash_valid {
        errors.push("Root hash mismatch".to_string());
    }
    if run.root_hash.as_deref() != Some(bundle.root_hash.as_str()) {
        root_hash_valid = false;
        errors.push("Root hash mismatch on run record".to_string());
    }
    if bundle.public_view.root_hash != bundle.root_hash {
        root_hash_valid = false;
        errors.push("Root hash mismatch on public view".to_string());
    }

    // Sequence contiguity for events and spans
    let mut sequence_valid = true;
    for (i, event) in run.events.iter().enumerate() {
        if event.seq != i as u64 {
            sequence_valid = false;
            errors.push(format!("Event sequence gap at {i}"));
        }
    }
    for (i, span) in run.spans.iter().enumerate() {
        if span.span_seq != i as u64 {
            sequence_valid = false;
            errors.push(format!("Span sequence gap at {i}"));
        }
    }

    if bundle.public_view.public_spans.is_empty() {
        warnings.push("No public spans present".to_string());
    }

    let checks = VerificationChecks {
        event_hashes_valid,
        span_hashes_valid,
        rolling_hash_valid,
        merkle_root_valid,
        root_hash_valid,
        sequence_valid,
    };
    VerificationReport {
        valid: checks.all(),
        errors,
        warnings,
        checks,
    }
}
