//! Binary Merkle tree over event hashes with inclusion proofs
//!
//! Pairing rule: adjacent nodes left-to-right, an odd trailing node is
//! promoted unchanged to the next level (no self-duplication). This matches
//! the batch-root computation used by downstream anchoring packages and must
//! not change.

use crate::canonical::{hash_domain_value, Domain};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Merkle leaf: `leaf(eventHash)`
pub fn leaf_hash(event_hash: &str) -> String {
    hash_domain_value(Domain::Leaf, &Value::String(event_hash.to_string()))
}

/// Merkle internal node: `node(left ++ right)`
pub fn node_hash(left: &str, right: &str) -> String {
    hash_domain_value(Domain::Node, &Value::String(format!("{left}{right}")))
}

/// Root of a tree with no leaves
pub fn empty_tree_hash() -> String {
    hash_domain_value(Domain::Leaf, &Value::String("empty".to_string()))
}

/// Side of a proof sibling relative to the running hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingPosition {
    Left,
    Right,
}

/// One step of an inclusion proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofSibling {
    pub hash: String,
    pub position: SiblingPosition,
}

/// Inclusion proof for one leaf position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    /// The leaf-level hash being proven
    pub leaf_hash: String,
    pub leaf_index: u64,
    /// Sibling hashes from leaf level up to the root
    pub siblings: Vec<ProofSibling>,
    pub root_hash: String,
}

/// Merkle commitment over a run's events, leaf position = event seq
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceMerkleTree {
    pub root_hash: String,
    pub leaf_count: u64,
    /// Number of pairing rounds from leaves to root
    pub depth: u32,
    /// Ordered leaf hashes; position doubles as the proof index
    pub leaf_hashes: Vec<String>,
}

impl TraceMerkleTree {
    /// Build the tree over event hashes in seq order
    pub fn build(event_hashes: &[String]) -> Self {
        if event_hashes.is_empty() {
            return Self {
                root_hash: empty_tree_hash(),
                leaf_count: 0,
                depth: 0,
                leaf_hashes: Vec::new(),
            };
        }

        let leaves: Vec<String> = event_hashes.iter().map(|h| leaf_hash(h)).collect();
        let mut level = leaves.clone();
        let mut depth = 0u32;
        while level.len() > 1 {
            level = next_level(&level);
            depth += 1;
        }

        Self {
            root_hash: level[0].clone(),
            leaf_count: leaves.len() as u64,
            depth,
            leaf_hashes: leaves,
        }
    }

    /// Inclusion proof for the leaf at `leaf_index`, if in range
    pub fn proof(&self, leaf_index: usize) -> Option<MerkleProof> {
        if leaf_index >= self.leaf_hashes.len() {
            return None;
        }

        let mut level = self.leaf_hashes.clone();
        let mut position = leaf_index;
        let mut siblings = Vec::new();
        while level.len() > 1 {
            let sibling = position ^ 1;
            if sibling < level.len() {
                siblings.push(ProofSibling {
                    hash: level[sibling].clone(),
                    position: if sibling < position {
                        SiblingPosition::Left
                    } else {
                        SiblingPosition::Right
                    },
                });
            }
            // An odd trailing node has no sibling at this level; it is
            // promoted, so the proof simply records nothing here.
            level = next_level(&level);
            position /= 2;
        }

        Some(MerkleProof {
            leaf_hash: self.leaf_hashes[leaf_index].clone(),
            leaf_index: leaf_index as u64,
            siblings,
            root_hash: self.root_hash.clone(),
        })
    }
}

fn next_level(level: &[String]) -> Vec<String> {
    let mut next = Vec::with_capacity(level.len().div_ceil(2));
    for pair in level.chunks(2) {
        match pair {
            [left, right] => next.push(node_hash(left, right)),
            [odd] => next.push(odd.clone()),
            _ => unreachable!("chunks(2) yields one or two elements"),
        }
    }
    next
}

/// Recompute the proof chain and compare against its root
pub fn verify_merkle_proof(proof: &MerkleProof) -> bool {
    let mut current = proof.leaf_hash.clone();
    for sibling in &proof.siblings {
        current = match sibling.position {
            SiblingPosition::Left => node_hash(&sibling.hash, &current),
            SiblingPosition::Right => node_hash(&current, &sibling.hash),
        };
    }
    current == proof.root_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = TraceMerkleTree::build(&[]);
        assert_eq!(tree.root_hash, empty_tree_hash());
        assert_eq!(tree.leaf_count, 0);
        assert_eq!(tree.depth, 0);
        assert!(tree.proof(0).is_none());
    }

    #[test]
    fn test_single_leaf_is_root() {
        let tree = TraceMerkleTree::build(&hashes(&["a1"]));
        assert_eq!(tree.root_hash, leaf_hash("a1"));
        assert_eq!(tree.depth, 0);
        assert_eq!(tree.leaf_count, 1);

        let proof = tree.proof(0).unwrap();
        assert!(proof.siblings.is_empty());
        assert!(verify_merkle_proof(&proof));
    }

    #[test]
    fn test_two_leaves() {
        let tree = TraceMerkleTree::build(&hashes(&["a1", "b2"]));
        assert_eq!(tree.depth, 1);
        assert_eq!(
            tree.root_hash,
            node_hash(&leaf_hash("a1"), &leaf_hash("b2"))
        );
    }

    #[test]
    fn test_odd_leaf_promoted_unchanged() {
        let tree = TraceMerkleTree::build(&hashes(&["a1", "b2", "c3"]));
        let expected = node_hash(
            &node_hash(&leaf_hash("a1"), &leaf_hash("b2")),
            &leaf_hash("c3"),
        );
        assert_eq!(tree.root_hash, expected);
        assert_eq!(tree.depth, 2);

        // The promoted leaf's proof skips the level it had no sibling on
        let proof = tree.proof(2).unwrap();
        assert_eq!(proof.siblings.len(), 1);
        assert!(verify_merkle_proof(&proof));
    }

    #[test]
    fn test_proof_roundtrip_all_indices() {
        for n in 1..=9 {
            let event_hashes: Vec<String> = (0..n).map(|i| format!("h{i}")).collect();
            let tree = TraceMerkleTree::build(&event_hashes);
            for i in 0..n {
                let proof = tree.proof(i).unwrap();
                assert!(verify_merkle_proof(&proof), "n={n} i={i}");
                assert_eq!(proof.leaf_index, i as u64);
            }
        }
    }

    #[test]
    fn test_proof_out_of_range() {
        let tree = TraceMerkleTree::build(&hashes(&["a1", "b2"]));
        assert!(tree.proof(2).is_none());
    }

    #[test]
    fn test_tampered_proof_fails() {
        let tree = TraceMerkleTree::build(&hashes(&["a1", "b2", "c3", "d4"]));
        let mut proof = tree.proof(1).unwrap();
        assert!(verify_merkle_proof(&proof));

        proof.leaf_hash = leaf_hash("x9");
        assert!(!verify_merkle_proof(&proof));

        let mut wrong_side = tree.proof(1).unwrap();
        wrong_side.siblings[0].position = SiblingPosition::Right;
        assert!(!verify_merkle_proof(&wrong_side));
    }

    #[test]
    fn test_root_changes_with_any_leaf() {
        let base = TraceMerkleTree::build(&hashes(&["a1", "b2", "c3"]));
        let changed = TraceMerkleTree::build(&hashes(&["a1", "b2", "c4"]));
        assert_ne!(base.root_hash, changed.root_hash);
    }
}
