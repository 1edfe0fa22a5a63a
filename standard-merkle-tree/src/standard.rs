//! The typed tree most callers use: canonical leaf encoding on the way in,
//! hash-level engine underneath, lookup by leaf content on top.

use std::collections::BTreeMap;

use merkle_leaf_encoding::{FieldValue, LeafEncoding};

use crate::{
    Keccak256Hasher, MerkleHasher, MerkleTree, MultiProof, NodeHash, Proof, Result, TreeOptions,
    hash::{leaf_hash, to_hex},
    verify,
};

/// One leaf's canonical bytes and its position in the tree.
#[derive(Debug, Clone)]
pub(crate) struct LeafEntry {
    pub(crate) encoded: Vec<u8>,
    pub(crate) position: u64,
}

/// A Merkle tree over typed leaves.
///
/// Each leaf is an ordered sequence of [`FieldValue`]s encoded by one shared
/// [`LeafEncoding`]; the double-hash of the encoding becomes the tree leaf.
/// Proof methods address leaves by their **input order**; when
/// [`TreeOptions::sort_leaves`] is set, input indices are translated to the
/// sorted tree positions internally. Verification is exposed as associated
/// functions because a verifier never holds a tree.
#[derive(Debug, Clone)]
pub struct StandardMerkleTree<H: MerkleHasher = Keccak256Hasher> {
    pub(crate) core: MerkleTree<H>,
    pub(crate) encoding: LeafEncoding,
    /// In input order.
    pub(crate) entries: Vec<LeafEntry>,
    /// Leaf hash to input index.
    pub(crate) by_hash: BTreeMap<NodeHash, u64>,
}

impl<H: MerkleHasher> StandardMerkleTree<H> {
    /// Encode and double-hash every leaf, then build the tree.
    ///
    /// Fails on an encoding problem, an empty leaf list, or two leaves with
    /// identical encodings (their positions in the error are input-order).
    pub fn new(
        values: &[Vec<FieldValue>],
        encoding: LeafEncoding,
        options: TreeOptions,
    ) -> Result<Self> {
        let mut encoded_leaves = Vec::with_capacity(values.len());
        let mut hashes = Vec::with_capacity(values.len());
        for leaf_values in values {
            let encoded = encoding.encode(leaf_values)?;
            hashes.push(leaf_hash::<H>(&encoded));
            encoded_leaves.push(encoded);
        }
        let core = MerkleTree::from_leaf_hashes(hashes.clone(), options)?;
        let mut entries = Vec::with_capacity(encoded_leaves.len());
        let mut by_hash = BTreeMap::new();
        for (input_index, (encoded, hash)) in encoded_leaves.into_iter().zip(&hashes).enumerate() {
            let position = core.position_of(hash).expect("checked");
            entries.push(LeafEntry { encoded, position });
            by_hash.insert(*hash, input_index as u64);
        }
        Ok(StandardMerkleTree {
            core,
            encoding,
            entries,
            by_hash,
        })
    }

    /// The root hash.
    pub fn root(&self) -> NodeHash {
        self.core.root()
    }

    /// The root as lowercase hex.
    pub fn root_hex(&self) -> String {
        to_hex(&self.root())
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.core.leaf_count()
    }

    /// The shared leaf encoding.
    pub fn encoding(&self) -> &LeafEncoding {
        &self.encoding
    }

    /// The hash-level tree.
    pub fn tree(&self) -> &MerkleTree<H> {
        &self.core
    }

    /// The leaf hash a set of values would get under this tree's encoding.
    pub fn leaf_hash_of(&self, values: &[FieldValue]) -> Result<NodeHash> {
        Ok(leaf_hash::<H>(&self.encoding.encode(values)?))
    }

    /// Input index of the leaf with this logical content, if present.
    pub fn index_of(&self, values: &[FieldValue]) -> Result<Option<u64>> {
        let hash = self.leaf_hash_of(values)?;
        Ok(self.by_hash.get(&hash).copied())
    }

    /// Tree position of the leaf supplied at `input_index`. Identical to the
    /// input index unless the tree was built with sorted leaves.
    pub fn tree_position(&self, input_index: u64) -> Result<u64> {
        self.core.check_leaf_index(input_index)?;
        Ok(self.entries[input_index as usize].position)
    }

    /// Inclusion proof for the leaf supplied at `input_index`.
    pub fn prove_one(&self, input_index: u64) -> Result<Proof> {
        self.core.prove_one(self.tree_position(input_index)?)
    }

    /// Inclusion proof for the leaves supplied at `input_indices`.
    pub fn prove_many(&self, input_indices: &[u64]) -> Result<MultiProof> {
        let positions = input_indices
            .iter()
            .map(|&index| self.tree_position(index))
            .collect::<Result<Vec<_>>>()?;
        self.core.prove_many(&positions)
    }

    /// Verify one leaf's values against a root. Standalone; needs no tree.
    ///
    /// A mismatched root is `Ok(false)`; only an encoding problem is an
    /// error.
    pub fn verify_one(
        root: &NodeHash,
        encoding: &LeafEncoding,
        values: &[FieldValue],
        proof: &Proof,
    ) -> Result<bool> {
        let hash = leaf_hash::<H>(&encoding.encode(values)?);
        Ok(verify::verify_one::<H>(root, &hash, proof))
    }

    /// Verify several leaves' values against a root. Standalone; needs no
    /// tree. Entries pair each leaf's **tree position** with its values.
    pub fn verify_many(
        root: &NodeHash,
        encoding: &LeafEncoding,
        entries: &[(u64, Vec<FieldValue>)],
        proof: &MultiProof,
    ) -> Result<bool> {
        let mut hashed = Vec::with_capacity(entries.len());
        for (position, values) in entries {
            hashed.push((*position, leaf_hash::<H>(&encoding.encode(values)?)));
        }
        verify::verify_many::<H>(root, &hashed, proof)
    }
}
