//! Domain-separated hashing over canonical JSON
//!
//! Every digest in this crate is `SHA256("poi-trace:<domain>:v1|" ++ bytes)`
//! where `bytes` is the canonical JSON encoding of the hashed value. The
//! canonical form is the cross-language interchange contract: sorted object
//! keys, null members removed, compact separators, UTF-8 with non-ASCII
//! characters unescaped. Downstream packages (anchoring, storage, proving)
//! must reproduce these bytes exactly to recompute identical digests.

use crate::error::Result;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Hash domains recognized by the `poi-trace:<domain>:v1|` prefix table
///
/// The core itself uses `event`, `roll`, `span`, `leaf`, `node` and `root`;
/// `manifest`, `safety` and `safetyReport` are reserved for sibling packages
/// that share the prefix table (bundle manifests, safety reports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Single trace event
    Event,
    /// Rolling hash chain step
    Roll,
    /// Span digest over member event hashes
    Span,
    /// Merkle leaf
    Leaf,
    /// Merkle internal node
    Node,
    /// Bundle manifest (reserved for storage adapters)
    Manifest,
    /// Top-level root commitment
    Root,
    /// Safety attestation (reserved)
    Safety,
    /// Safety report (reserved)
    SafetyReport,
}

impl Domain {
    /// Literal domain string as it appears inside the hash prefix
    pub const fn as_str(self) -> &'static str {
        match self {
            Domain::Event => "event",
            Domain::Roll => "roll",
            Domain::Span => "span",
            Domain::Leaf => "leaf",
            Domain::Node => "node",
            Domain::Manifest => "manifest",
            Domain::Root => "root",
            Domain::Safety => "safety",
            Domain::SafetyReport => "safetyReport",
        }
    }

    /// Full prefix bytes for this domain, e.g. `poi-trace:event:v1|`
    pub fn prefix(self) -> String {
        format!("poi-trace:{}:v1|", self.as_str())
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recursively sort object keys and drop null members
///
/// Arrays keep element order; nulls inside arrays are preserved. Object keys
/// compare by UTF-8 bytes, which matches Unicode code point order.
fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> =
                map.iter().filter(|(_, v)| !v.is_null()).collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = Map::new();
            for (key, inner) in entries {
                out.insert(key.clone(), normalize(inner));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}

/// Canonical JSON string for a value
pub fn canonical_json(value: &Value) -> String {
    normalize(value).to_string()
}

/// Canonical JSON bytes of any serializable value
pub fn canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    Ok(canonical_json(&value).into_bytes())
}

/// Domain-separated digest of a JSON value, lowercase hex
pub fn hash_domain_value(domain: Domain, value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain.prefix().as_bytes());
    hasher.update(canonical_json(value).as_bytes());
    hex::encode(hasher.finalize())
}

/// Domain-separated digest of any serializable value, lowercase hex
pub fn hash_domain<T: Serialize>(domain: Domain, value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(hash_domain_value(domain, &value))
}

/// Serialize a value and strip the named top-level members
///
/// Used wherever a stored hash or signature must be excluded from the bytes
/// that produced it (event hashes, bundle signing bytes).
pub fn to_value_without<T: Serialize>(value: &T, exclude: &[&str]) -> Result<Value> {
    let mut value = serde_json::to_value(value)?;
    if let Value::Object(map) = &mut value {
        for field in exclude {
            map.remove(*field);
        }
    }
    Ok(value)
}
