//! Hash primitives: the injectable hasher trait, the two shipped
//! implementations, and the leaf/pair hashing rules.

use sha3::{Digest, Keccak256};

use crate::{MerkleError, Result};

/// A 32-byte node hash.
pub type NodeHash = [u8; 32];

/// A stateless 256-bit hash over byte strings.
///
/// Implementations are zero-sized markers dispatched statically; the tree,
/// proof generation and verification are all generic over this trait so the
/// same scheme is guaranteed on both sides.
pub trait MerkleHasher {
    /// Hash an arbitrary byte string to 32 bytes.
    fn hash(data: &[u8]) -> NodeHash;
}

/// Keccak-256, the scheme used by the ABI-encoding ecosystem this library
/// interoperates with. The default hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256Hasher;

impl MerkleHasher for Keccak256Hasher {
    fn hash(data: &[u8]) -> NodeHash {
        let mut hasher = Keccak256::new();
        hasher.update(data);
        hasher.finalize().into()
    }
}

/// Blake3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl MerkleHasher for Blake3Hasher {
    fn hash(data: &[u8]) -> NodeHash {
        *blake3::hash(data).as_bytes()
    }
}

/// Double-hash of a leaf's canonical encoding.
///
/// Leaves hash twice while internal nodes hash once, so the two value
/// domains stay disjoint and an internal node can never be presented as a
/// leaf.
pub fn leaf_hash<H: MerkleHasher>(encoded: &[u8]) -> NodeHash {
    H::hash(&H::hash(encoded))
}

/// Combine two child hashes into their parent.
///
/// The children are concatenated in ascending lexicographic byte order
/// before hashing, so `combine_sorted(a, b) == combine_sorted(b, a)` and a
/// proof does not need to record which side a sibling was on.
pub fn combine_sorted<H: MerkleHasher>(a: &NodeHash, b: &NodeHash) -> NodeHash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo);
    buf[32..].copy_from_slice(hi);
    H::hash(&buf)
}

/// Render a hash as lowercase hex without a prefix.
pub fn to_hex(hash: &NodeHash) -> String {
    hex::encode(hash)
}

/// Parse a 32-byte hash from hex, accepting an optional `0x` prefix.
pub fn parse_hash(s: &str) -> Result<NodeHash> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped)
        .map_err(|e| MerkleError::InvalidData(format!("bad hash hex: {}", e)))?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        MerkleError::InvalidData(format!("hash must be 32 bytes, got {}", v.len()))
    })
}
