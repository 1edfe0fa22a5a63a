//! Shared helpers for the test modules.

use merkle_leaf_encoding::{FieldValue, LeafEncoding};

use crate::{
    Keccak256Hasher, MerkleHasher, MerkleTree, NodeHash, StandardMerkleTree, TreeOptions,
};

/// The hasher all non-parameterized tests run with.
pub(crate) type TestTree = StandardMerkleTree<Keccak256Hasher>;

/// Distinct deterministic leaf hashes.
pub(crate) fn seq_leaves(count: u64) -> Vec<NodeHash> {
    (0..count)
        .map(|i| Keccak256Hasher::hash(&i.to_be_bytes()))
        .collect()
}

/// Leaf hashes with every byte set to the given fill values.
pub(crate) fn const_leaves(fills: &[u8]) -> Vec<NodeHash> {
    fills.iter().map(|fill| [*fill; 32]).collect()
}

/// Hash-level tree with default options.
pub(crate) fn build_tree(leaves: Vec<NodeHash>) -> MerkleTree<Keccak256Hasher> {
    MerkleTree::from_leaf_hashes(leaves, TreeOptions::default()).unwrap()
}

/// `(index, hash)` verification entries for a subset of leaves.
pub(crate) fn entries_for(leaves: &[NodeHash], indices: &[u64]) -> Vec<(u64, NodeHash)> {
    indices
        .iter()
        .map(|&index| (index, leaves[index as usize]))
        .collect()
}

/// Typed values for an `["address", "uint256"]` leaf.
pub(crate) fn addr_uint_values(seed: u8) -> Vec<FieldValue> {
    vec![
        FieldValue::Address([seed; 20]),
        FieldValue::Uint(u128::from(seed) * 100),
    ]
}

/// Typed tree over `["address", "uint256"]` leaves with seeds `1..=count`.
pub(crate) fn standard_tree_addr_uint(count: u8) -> TestTree {
    let values: Vec<Vec<FieldValue>> = (1..=count).map(addr_uint_values).collect();
    let encoding = LeafEncoding::parse(&["address", "uint256"]).unwrap();
    TestTree::new(&values, encoding, TreeOptions::default()).unwrap()
}
