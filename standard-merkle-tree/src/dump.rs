//! Serialized form of a typed tree, for regenerating proofs across process
//! runs without redoing the leaf encoding and hashing.

use bincode::{Decode, Encode};
use merkle_leaf_encoding::LeafEncoding;

use crate::{
    MerkleError, MerkleHasher, MerkleTree, NodeHash, Result, StandardMerkleTree,
    standard::LeafEntry,
};

/// Version written into every dump. Loading rejects any other value.
pub const DUMP_FORMAT_VERSION: u16 = 1;

/// Serialized form of a [`StandardMerkleTree`].
///
/// Carries the format version, the leaf encoding's type tags, the full node
/// array (root first, leaves in the final block) and, in original input
/// order, each leaf's canonical bytes with its tree position.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TreeDump {
    pub(crate) format_version: u16,
    pub(crate) type_tags: Vec<String>,
    pub(crate) leaf_count: u64,
    pub(crate) nodes: Vec<NodeHash>,
    pub(crate) entries: Vec<(Vec<u8>, u64)>,
}

impl TreeDump {
    /// The dump's format version.
    pub fn format_version(&self) -> u16 {
        self.format_version
    }

    /// The leaf encoding's canonical type tags.
    pub fn type_tags(&self) -> &[String] {
        &self.type_tags
    }

    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard().with_big_endian().with_no_limit();
        bincode::encode_to_vec(self, config)
            .map_err(|e| MerkleError::InvalidData(format!("encode error: {}", e)))
    }

    /// Decode from bytes using bincode.
    ///
    /// The version is read first and gated on its own, so a dump written by
    /// a newer layout fails with
    /// [`UnsupportedFormat`](MerkleError::UnsupportedFormat) instead of a
    /// decode error.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<{ 100 * 1024 * 1024 }>();
        let (version, _): (u16, usize) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| MerkleError::InvalidData(format!("decode error: {}", e)))?;
        if version != DUMP_FORMAT_VERSION {
            return Err(MerkleError::UnsupportedFormat {
                expected: DUMP_FORMAT_VERSION,
                got: version,
            });
        }
        let (dump, _): (Self, _) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| MerkleError::InvalidData(format!("decode error: {}", e)))?;
        Ok(dump)
    }
}

impl<H: MerkleHasher> StandardMerkleTree<H> {
    /// Serialize this tree.
    pub fn dump(&self) -> TreeDump {
        TreeDump {
            format_version: DUMP_FORMAT_VERSION,
            type_tags: self.encoding.type_tags(),
            leaf_count: self.leaf_count(),
            nodes: self.core.nodes().to_vec(),
            entries: self
                .entries
                .iter()
                .map(|entry| (entry.encoded.clone(), entry.position))
                .collect(),
        }
    }

    /// Rebuild a tree from a dump without re-encoding or re-hashing leaves.
    ///
    /// Validates the node array against the level structure implied by the
    /// leaf count, and the entry list against the leaf block: one entry per
    /// leaf, every position in range, no two entries sharing a position.
    /// Node hashes themselves are trusted; a dump with corrupted-but-
    /// well-formed content yields proofs that fail verification downstream.
    pub fn load(dump: TreeDump) -> Result<Self> {
        if dump.format_version != DUMP_FORMAT_VERSION {
            return Err(MerkleError::UnsupportedFormat {
                expected: DUMP_FORMAT_VERSION,
                got: dump.format_version,
            });
        }
        let encoding = LeafEncoding::parse(&dump.type_tags)?;
        let core = MerkleTree::from_parts(dump.nodes, dump.leaf_count)?;
        if dump.entries.len() as u64 != dump.leaf_count {
            return Err(MerkleError::InvalidData(format!(
                "{} leaf entries for {} leaves",
                dump.entries.len(),
                dump.leaf_count
            )));
        }
        let mut entries = Vec::with_capacity(dump.entries.len());
        let mut by_hash = std::collections::BTreeMap::new();
        for (input_index, (encoded, position)) in dump.entries.into_iter().enumerate() {
            let hash = core.leaf_hash_at(position).map_err(|_| {
                MerkleError::InvalidData(format!(
                    "entry {} points at leaf position {} of {}",
                    input_index,
                    position,
                    core.leaf_count()
                ))
            })?;
            if by_hash.insert(hash, input_index as u64).is_some() {
                return Err(MerkleError::InvalidData(format!(
                    "two entries point at leaf position {}",
                    position
                )));
            }
            entries.push(LeafEntry { encoded, position });
        }
        Ok(StandardMerkleTree {
            core,
            encoding,
            entries,
            by_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::test_utils::{TestTree, standard_tree_addr_uint};

    #[test]
    fn dump_round_trips_through_bytes() {
        let tree = standard_tree_addr_uint(7);
        let dump = tree.dump();
        assert_eq!(dump.format_version(), DUMP_FORMAT_VERSION);
        assert_eq!(dump.type_tags(), ["address", "uint256"]);
        let bytes = dump.encode_to_vec().unwrap();
        let decoded = TreeDump::decode_from_slice(&bytes).unwrap();
        assert_eq!(decoded, dump);
    }

    #[test]
    fn loaded_tree_matches_the_original() {
        let tree = standard_tree_addr_uint(7);
        let loaded = TestTree::load(tree.dump()).unwrap();
        assert_eq!(loaded.root(), tree.root());
        assert_eq!(loaded.leaf_count(), tree.leaf_count());
        assert_eq!(loaded.encoding(), tree.encoding());
        for index in 0..tree.leaf_count() {
            assert_eq!(
                loaded.prove_one(index).unwrap(),
                tree.prove_one(index).unwrap()
            );
        }
        assert_eq!(
            loaded.prove_many(&[0, 3, 6]).unwrap(),
            tree.prove_many(&[0, 3, 6]).unwrap()
        );
    }

    #[test]
    fn version_mismatch_rejected_before_decode() {
        let tree = standard_tree_addr_uint(3);
        let mut dump = tree.dump();
        dump.format_version = 2;
        let bytes = dump.encode_to_vec().unwrap();
        assert_matches!(
            TreeDump::decode_from_slice(&bytes),
            Err(MerkleError::UnsupportedFormat {
                expected: DUMP_FORMAT_VERSION,
                got: 2
            })
        );
        assert_matches!(
            TestTree::load(dump),
            Err(MerkleError::UnsupportedFormat { .. })
        );
    }

    #[test]
    fn junk_bytes_rejected() {
        assert_matches!(
            TreeDump::decode_from_slice(&[]),
            Err(MerkleError::InvalidData(_))
        );
    }

    #[test]
    fn structural_problems_rejected_on_load() {
        let tree = standard_tree_addr_uint(4);

        let mut missing_entry = tree.dump();
        missing_entry.entries.pop();
        assert_matches!(
            TestTree::load(missing_entry),
            Err(MerkleError::InvalidData(_))
        );

        let mut bad_position = tree.dump();
        bad_position.entries[0].1 = 9;
        assert_matches!(
            TestTree::load(bad_position),
            Err(MerkleError::InvalidData(_))
        );

        let mut shared_position = tree.dump();
        shared_position.entries[0].1 = shared_position.entries[1].1;
        assert_matches!(
            TestTree::load(shared_position),
            Err(MerkleError::InvalidData(_))
        );

        let mut truncated_nodes = tree.dump();
        truncated_nodes.nodes.pop();
        assert_matches!(
            TestTree::load(truncated_nodes),
            Err(MerkleError::InvalidData(_))
        );

        let mut bad_tags = tree.dump();
        bad_tags.type_tags[0] = "sock".to_string();
        assert_matches!(
            TestTree::load(bad_tags),
            Err(MerkleError::Encoding(_))
        );
    }
}
