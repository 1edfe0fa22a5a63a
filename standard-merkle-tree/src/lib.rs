//! Sorted-pair Merkle tree with typed leaf encoding.
//!
//! Leaves are double-hashed (`hash(hash(encoding))`) so their value domain is
//! disjoint from internal nodes, and child pairs are hashed in ascending byte
//! order so a proof never has to record left/right position. A level with an
//! odd node count promotes its last node unchanged; the promoted level
//! contributes no proof entry.
//!
//! The hash function is injected through [`MerkleHasher`]; [`Keccak256Hasher`]
//! is the default scheme and [`Blake3Hasher`] is also provided. Trees are
//! built once from a finalized leaf list and are immutable afterwards; proofs
//! and multiproofs are standalone values, and verification never needs a tree
//! instance.
//!
//! [`StandardMerkleTree`] pairs the hash-level engine with the typed leaf
//! encoding from `merkle-leaf-encoding` and adds lookup by leaf content plus
//! a versioned serialized dump.

#![warn(missing_docs)]

mod dump;
mod error;
mod hash;
mod proof;
mod standard;
mod tree;
mod verify;

#[cfg(test)]
pub(crate) mod test_utils;

pub use dump::{DUMP_FORMAT_VERSION, TreeDump};
pub use error::{MerkleError, Result};
pub use hash::{
    Blake3Hasher, Keccak256Hasher, MerkleHasher, NodeHash, combine_sorted, leaf_hash, parse_hash,
    to_hex,
};
pub use merkle_leaf_encoding::{EncodingError, FieldType, FieldValue, LeafEncoding};
pub use proof::{MultiProof, Proof};
pub use standard::StandardMerkleTree;
pub use tree::{MerkleTree, TreeOptions};
pub use verify::{verify_many, verify_one};
