//! Inclusion proofs: the single-leaf sibling walk and the multiproof.
//!
//! A multiproof covers several leaves at once. Evaluation replays the
//! tree's pair-combination steps bottom-up, left-to-right, keeping the
//! intermediate values of the requested paths in a FIFO queue. Each
//! combining step takes its second operand either from that queue (the
//! sibling is itself on a requested path, flag `true`) or from the proof's
//! sibling list (flag `false`). A step whose node is promoted unchanged
//! consumes neither a flag nor a sibling. The schedule of steps is a pure
//! function of the tree's leaf count and the requested indices, which is
//! why the multiproof carries `leaf_count`. For every well-formed
//! multiproof, `entries + siblings == flags + 1`.

use std::collections::VecDeque;

use bincode::{Decode, Encode};

use crate::{
    MerkleError, MerkleHasher, MerkleTree, NodeHash, Result,
    hash::to_hex,
    tree::is_promoted,
};

/// Hard cap on decoded sibling lists. A tree cannot be deeper than the bit
/// width of its leaf indices.
const MAX_PROOF_DEPTH: usize = 64;

/// Inclusion proof for a single leaf: sibling hashes in leaf-to-root order.
///
/// Fields are `pub(crate)` so proofs are built by
/// [`MerkleTree::prove_one`], received over the wire via
/// [`decode_from_slice`](Proof::decode_from_slice), or assembled from bare
/// hashes with [`from_siblings`](Proof::from_siblings).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Proof {
    pub(crate) siblings: Vec<NodeHash>,
}

impl Proof {
    /// Wrap sibling hashes received from elsewhere, leaf-to-root order.
    pub fn from_siblings(siblings: Vec<NodeHash>) -> Self {
        Proof { siblings }
    }

    /// The sibling hashes, leaf-to-root.
    pub fn siblings(&self) -> &[NodeHash] {
        &self.siblings
    }

    /// Sibling hashes as lowercase hex.
    pub fn to_hex(&self) -> Vec<String> {
        self.siblings.iter().map(to_hex).collect()
    }

    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard().with_big_endian().with_no_limit();
        bincode::encode_to_vec(self, config)
            .map_err(|e| MerkleError::InvalidData(format!("encode error: {}", e)))
    }

    /// Decode from bytes using bincode.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<{ 100 * 1024 * 1024 }>();
        let (proof, _): (Self, _) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| MerkleError::InvalidData(format!("decode error: {}", e)))?;
        if proof.siblings.len() > MAX_PROOF_DEPTH {
            return Err(MerkleError::MalformedProof(format!(
                "{} siblings exceeds the maximum tree depth {}",
                proof.siblings.len(),
                MAX_PROOF_DEPTH
            )));
        }
        Ok(proof)
    }
}

/// Inclusion proof for a set of leaves.
///
/// Carries the tree's leaf count so a verifier can re-derive the combining
/// schedule, the sibling hashes for path nodes outside the requested set,
/// and one boolean flag per combining step (`true`: second operand comes
/// from the running queue, `false`: from the sibling list).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct MultiProof {
    pub(crate) leaf_count: u64,
    pub(crate) siblings: Vec<NodeHash>,
    pub(crate) flags: Vec<bool>,
}

impl MultiProof {
    /// Assemble a multiproof received from elsewhere.
    pub fn from_parts(leaf_count: u64, siblings: Vec<NodeHash>, flags: Vec<bool>) -> Self {
        MultiProof {
            leaf_count,
            siblings,
            flags,
        }
    }

    /// Leaf count of the tree this proof was generated from.
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// Sibling hashes for path nodes outside the requested set, in
    /// consumption order.
    pub fn siblings(&self) -> &[NodeHash] {
        &self.siblings
    }

    /// One flag per combining step, bottom-up left-to-right.
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// Sibling hashes as lowercase hex.
    pub fn siblings_hex(&self) -> Vec<String> {
        self.siblings.iter().map(to_hex).collect()
    }

    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard().with_big_endian().with_no_limit();
        bincode::encode_to_vec(self, config)
            .map_err(|e| MerkleError::InvalidData(format!("encode error: {}", e)))
    }

    /// Decode from bytes using bincode.
    ///
    /// Checks the count relations that hold for every generated multiproof:
    /// a tree over `n` leaves performs at most `n - 1` combining steps, and
    /// each sibling is consumed by exactly one `false` flag.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<{ 100 * 1024 * 1024 }>();
        let (proof, _): (Self, _) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| MerkleError::InvalidData(format!("decode error: {}", e)))?;
        if proof.leaf_count == 0 {
            return Err(MerkleError::MalformedProof(
                "zero leaf count".to_string(),
            ));
        }
        if proof.flags.len() as u64 >= proof.leaf_count {
            return Err(MerkleError::MalformedProof(format!(
                "{} flags is too many for {} leaves",
                proof.flags.len(),
                proof.leaf_count
            )));
        }
        if proof.siblings.len() > proof.flags.len() {
            return Err(MerkleError::MalformedProof(format!(
                "{} siblings but only {} flags",
                proof.siblings.len(),
                proof.flags.len()
            )));
        }
        Ok(proof)
    }
}

/// One step of a multiproof evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PairStep {
    /// Combine the queue front with the next queue value; both operands lie
    /// on requested paths.
    CombineKnown,
    /// Combine the queue front with a sibling outside the requested paths.
    /// The coordinate locates that sibling for the generator.
    CombineSibling {
        /// Level counted from the bottom.
        level: usize,
        /// Position of the sibling within its level.
        pos: u64,
    },
    /// The queue front is the unpaired last node of an odd level; it moves
    /// up unchanged.
    Promote,
}

/// The evaluation schedule for a set of leaf indices in a tree over
/// `leaf_count` leaves.
///
/// `sorted_indices` must be ascending, deduplicated, non-empty and within
/// range; generation and verification both validate before calling. The
/// walk mirrors construction: per level, requested positions are processed
/// in ascending order, and each position's partner is either the next
/// requested position (one combined step), a sibling to record, or nothing
/// when the position is promoted.
pub(crate) fn pairing_schedule(leaf_count: u64, sorted_indices: &[u64]) -> Vec<PairStep> {
    debug_assert!(!sorted_indices.is_empty());
    debug_assert!(sorted_indices.windows(2).all(|w| w[0] < w[1]));
    debug_assert!(sorted_indices.last().is_none_or(|last| *last < leaf_count));

    let mut steps = Vec::new();
    let mut known: VecDeque<u64> = sorted_indices.iter().copied().collect();
    let mut size = leaf_count;
    let mut level = 0usize;
    while size > 1 {
        let mut next_known = VecDeque::with_capacity(known.len());
        while let Some(pos) = known.pop_front() {
            if is_promoted(pos, size) {
                steps.push(PairStep::Promote);
            } else if known.front() == Some(&(pos ^ 1)) {
                known.pop_front();
                steps.push(PairStep::CombineKnown);
            } else {
                steps.push(PairStep::CombineSibling {
                    level,
                    pos: pos ^ 1,
                });
            }
            next_known.push_back(pos / 2);
        }
        known = next_known;
        size = size.div_ceil(2);
        level += 1;
    }
    steps
}

impl<H: MerkleHasher> MerkleTree<H> {
    /// Inclusion proof for the leaf at `leaf_index`.
    ///
    /// Walks from the leaf to the root recording each level's sibling hash.
    /// A level where the node is promoted unchanged contributes no entry.
    pub fn prove_one(&self, leaf_index: u64) -> Result<Proof> {
        self.check_leaf_index(leaf_index)?;
        let mut siblings = Vec::with_capacity(self.level_count() - 1);
        let mut pos = leaf_index;
        for level in 0..self.level_count() - 1 {
            let size = self.level_size(level);
            if !is_promoted(pos, size) {
                siblings.push(self.node_at(level, pos ^ 1));
            }
            pos /= 2;
        }
        Ok(Proof { siblings })
    }

    /// Inclusion proof for the set of leaves at `leaf_indices`.
    ///
    /// Indices are deduplicated and sorted ascending; the proof is
    /// therefore identical no matter what order they are supplied in. Every
    /// shared ancestor is computed once during verification rather than
    /// carried per path.
    pub fn prove_many(&self, leaf_indices: &[u64]) -> Result<MultiProof> {
        if leaf_indices.is_empty() {
            return Err(MerkleError::EmptyLeafSet);
        }
        let mut indices = leaf_indices.to_vec();
        indices.sort_unstable();
        indices.dedup();
        for &index in &indices {
            self.check_leaf_index(index)?;
        }
        let mut siblings = Vec::new();
        let mut flags = Vec::new();
        for step in pairing_schedule(self.leaf_count(), &indices) {
            match step {
                PairStep::CombineKnown => flags.push(true),
                PairStep::CombineSibling { level, pos } => {
                    flags.push(false);
                    siblings.push(self.node_at(level, pos));
                }
                PairStep::Promote => {}
            }
        }
        Ok(MultiProof {
            leaf_count: self.leaf_count(),
            siblings,
            flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::test_utils::{build_tree, seq_leaves};

    #[test]
    fn schedule_for_adjacent_pair_is_one_known_combine() {
        assert_eq!(
            pairing_schedule(2, &[0, 1]),
            vec![PairStep::CombineKnown]
        );
    }

    #[test]
    fn schedule_walks_promotions_without_flags() {
        // Five leaves, indices 3 and 4: leaf 3 needs its sibling, leaf 4 is
        // promoted twice, and the paths meet at the last combine.
        assert_eq!(
            pairing_schedule(5, &[3, 4]),
            vec![
                PairStep::CombineSibling { level: 0, pos: 2 },
                PairStep::Promote,
                PairStep::CombineSibling { level: 1, pos: 0 },
                PairStep::Promote,
                PairStep::CombineKnown,
            ]
        );
    }

    #[test]
    fn schedule_single_leaf_tree_is_empty() {
        assert_eq!(pairing_schedule(1, &[0]), vec![]);
    }

    #[test]
    fn multiproof_count_invariant_holds() {
        let tree = build_tree(seq_leaves(12));
        for indices in [vec![0], vec![3, 4], vec![0, 5, 11], (0..12).collect()] {
            let proof = tree.prove_many(&indices).unwrap();
            assert_eq!(
                indices.len() + proof.siblings().len(),
                proof.flags().len() + 1,
                "count invariant for {:?}",
                indices
            );
        }
    }

    #[test]
    fn prove_many_is_order_and_duplicate_insensitive() {
        let tree = build_tree(seq_leaves(9));
        let canonical = tree.prove_many(&[1, 4, 7]).unwrap();
        assert_eq!(tree.prove_many(&[7, 1, 4]).unwrap(), canonical);
        assert_eq!(tree.prove_many(&[4, 7, 1, 4, 1]).unwrap(), canonical);
    }

    #[test]
    fn prove_one_bounds_checked() {
        let tree = build_tree(seq_leaves(4));
        assert_matches!(
            tree.prove_one(4),
            Err(MerkleError::IndexOutOfRange {
                index: 4,
                leaf_count: 4
            })
        );
    }

    #[test]
    fn prove_many_rejects_empty_and_out_of_range() {
        let tree = build_tree(seq_leaves(4));
        assert_matches!(tree.prove_many(&[]), Err(MerkleError::EmptyLeafSet));
        assert_matches!(
            tree.prove_many(&[1, 9]),
            Err(MerkleError::IndexOutOfRange { index: 9, .. })
        );
    }

    #[test]
    fn proof_wire_round_trip() {
        let tree = build_tree(seq_leaves(7));
        let proof = tree.prove_one(2).unwrap();
        let bytes = proof.encode_to_vec().unwrap();
        assert_eq!(Proof::decode_from_slice(&bytes).unwrap(), proof);

        let multi = tree.prove_many(&[0, 3, 6]).unwrap();
        let bytes = multi.encode_to_vec().unwrap();
        assert_eq!(MultiProof::decode_from_slice(&bytes).unwrap(), multi);
    }

    #[test]
    fn proof_decode_rejects_junk_and_oversized() {
        assert_matches!(
            Proof::decode_from_slice(&[0xff, 0xff, 0xff, 0xff]),
            Err(MerkleError::InvalidData(_))
        );
        let oversized = Proof::from_siblings(vec![[0u8; 32]; MAX_PROOF_DEPTH + 1]);
        let bytes = oversized.encode_to_vec().unwrap();
        assert_matches!(
            Proof::decode_from_slice(&bytes),
            Err(MerkleError::MalformedProof(_))
        );
    }

    #[test]
    fn multiproof_decode_rejects_inconsistent_counts() {
        let junk = MultiProof::from_parts(0, vec![], vec![]);
        let bytes = junk.encode_to_vec().unwrap();
        assert_matches!(
            MultiProof::decode_from_slice(&bytes),
            Err(MerkleError::MalformedProof(_))
        );

        // More flags than a 3-leaf tree can ever evaluate.
        let junk = MultiProof::from_parts(3, vec![], vec![true; 3]);
        let bytes = junk.encode_to_vec().unwrap();
        assert_matches!(
            MultiProof::decode_from_slice(&bytes),
            Err(MerkleError::MalformedProof(_))
        );

        // Siblings without flags to consume them.
        let junk = MultiProof::from_parts(8, vec![[0u8; 32]; 3], vec![true, false]);
        let bytes = junk.encode_to_vec().unwrap();
        assert_matches!(
            MultiProof::decode_from_slice(&bytes),
            Err(MerkleError::MalformedProof(_))
        );
    }
}
