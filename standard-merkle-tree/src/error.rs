use merkle_leaf_encoding::EncodingError;
use thiserror::Error;

/// Alias for results carrying a [`MerkleError`].
pub type Result<T> = core::result::Result<T, MerkleError>;

/// Errors from tree construction, proof generation and dump handling.
///
/// A mismatched root during verification is never an error; it is the
/// `false` result of a well-formed call. [`MerkleError::MalformedProof`]
/// marks the distinct case where a proof cannot be evaluated at all.
#[derive(Debug, Error)]
pub enum MerkleError {
    /// A leaf's values could not be encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// A tree was requested over an empty leaf list.
    #[error("cannot build a tree from an empty leaf list")]
    EmptyTree,
    /// A multiproof was requested for an empty index set.
    #[error("no leaf indices were requested")]
    EmptyLeafSet,
    /// Two leaves hash identically, which would break proof indexability.
    #[error("duplicate leaf hash at positions {first} and {second}")]
    DuplicateLeaf {
        /// Position of the earlier occurrence, in supplied order.
        first: u64,
        /// Position of the later occurrence, in supplied order.
        second: u64,
    },
    /// A leaf index beyond the tree's leaf count.
    #[error("leaf index {index} out of range for {leaf_count} leaves")]
    IndexOutOfRange {
        /// The requested index.
        index: u64,
        /// Number of leaves in the tree.
        leaf_count: u64,
    },
    /// A proof or multiproof is structurally inconsistent and cannot be
    /// evaluated.
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    /// A serialized dump carries a format version this build does not read.
    #[error("unsupported dump format version {got}, expected {expected}")]
    UnsupportedFormat {
        /// Version this build writes and reads.
        expected: u16,
        /// Version found in the dump.
        got: u16,
    },
    /// Bytes that do not decode to the expected structure.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
