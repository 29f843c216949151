//! # PoI Trace Core
//!
//! Provenance core of the PoI SDK: a tamper-evident, selectively-disclosable
//! record of agent/process execution, packaged into a signed, offline-
//! verifiable trace bundle.
//!
//! ## Key Concepts
//!
//! - **TraceRun**: the single-writer, append-only ledger of one run's spans
//!   and events
//! - **HashChain**: rolling digest over the ordered event history
//! - **TraceMerkleTree**: Merkle commitment over event hashes with
//!   per-position inclusion proofs
//! - **TraceBundle**: the finalized artifact combining the private record,
//!   its redacted public view, and the top-level root commitment
//!
//! ## Invariants
//!
//! 1. **Contiguity**: `events[i].seq == i` and `spans[i].spanSeq == i`
//! 2. **Chaining**: the rolling hash is a function of the full ordered
//!    event history
//! 3. **Immutability**: finalization consumes the run; a bundle is never
//!    mutated, and signing returns a new value
//!
//! All digests are SHA-256 over `poi-trace:<domain>:v1|` prefixed canonical
//! JSON, so independent implementations can reproduce them byte-for-byte.

pub mod bundle;
pub mod canonical;
pub mod chain;
pub mod error;
pub mod event;
pub mod merkle;
pub mod run;
pub mod signature;
pub mod span;
pub mod verify;

pub use bundle::{
    PublicSpan, RedactedSpanHash, TraceBundle, TraceBundlePublicView, FORMAT_VERSION,
};
pub use canonical::{canonical_bytes, canonical_json, hash_domain, hash_domain_value, Domain};
pub use chain::{HashChain, GENESIS_HASH};
pub use error::{Result, TraceError};
pub use event::{EventInput, EventPayload, TraceEvent, Visibility};
pub use merkle::{
    empty_tree_hash, verify_merkle_proof, MerkleProof, ProofSibling, SiblingPosition,
    TraceMerkleTree,
};
pub use run::{TraceRun, SCHEMA_VERSION};
pub use signature::{
    sign_bundle, signing_bytes, verify_bundle_signature, Ed25519Signer, SignatureProvider,
};
pub use span::{span_hash, Outcome, SpanInput, TraceSpan, TraceStatus};
pub use verify::{verify_bundle, VerificationChecks, VerificationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the library version
pub fn version() -> &'static str {
    VERSION
}
