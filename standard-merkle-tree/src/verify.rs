//! Stateless proof verification. Neither function needs a tree instance;
//! each call is an independent evaluation over (root, leaves, proof).

use std::collections::VecDeque;

use crate::{
    MerkleError, MerkleHasher, MultiProof, NodeHash, Proof, Result,
    hash::combine_sorted,
    proof::{PairStep, pairing_schedule},
};

/// Verify a single leaf hash against a root.
///
/// Folds the sibling hashes over the leaf with the sorted-pair rule and
/// compares the result with `root`. A level where the builder promoted the
/// node unchanged has no sibling entry, so the fold simply skips it. A
/// mismatched root is `false`, never an error.
pub fn verify_one<H: MerkleHasher>(root: &NodeHash, leaf_hash: &NodeHash, proof: &Proof) -> bool {
    let mut current = *leaf_hash;
    for sibling in proof.siblings() {
        current = combine_sorted::<H>(&current, sibling);
    }
    current == *root
}

/// Verify a set of `(leaf_index, leaf_hash)` entries against a root.
///
/// Re-derives the combining schedule from the proof's leaf count and the
/// entry indices, checks the proof's flags and sibling count against it,
/// then replays the evaluation and requires exactly one final value.
///
/// Returns `Ok(false)` when the recomputed root differs from `root`, and
/// [`MerkleError::MalformedProof`] when the proof cannot be evaluated at
/// all: empty entries, an index at or beyond the leaf count, two entries
/// claiming one index with different hashes, or flag/sibling sequences that
/// disagree with the schedule. Entry supply order does not matter.
pub fn verify_many<H: MerkleHasher>(
    root: &NodeHash,
    entries: &[(u64, NodeHash)],
    proof: &MultiProof,
) -> Result<bool> {
    if entries.is_empty() {
        return Err(MerkleError::MalformedProof(
            "no leaf entries".to_string(),
        ));
    }
    if proof.leaf_count == 0 {
        return Err(MerkleError::MalformedProof(
            "zero leaf count".to_string(),
        ));
    }
    let mut entries = entries.to_vec();
    entries.sort_by_key(|(index, _)| *index);
    entries.dedup();
    for pair in entries.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(MerkleError::MalformedProof(format!(
                "conflicting hashes for leaf index {}",
                pair[0].0
            )));
        }
    }
    if let Some(&(last_index, _)) = entries.last() {
        if last_index >= proof.leaf_count {
            return Err(MerkleError::MalformedProof(format!(
                "leaf index {} out of range for {} leaves",
                last_index, proof.leaf_count
            )));
        }
    }

    let indices: Vec<u64> = entries.iter().map(|(index, _)| *index).collect();
    let schedule = pairing_schedule(proof.leaf_count, &indices);
    let needed_flags = schedule
        .iter()
        .filter(|step| !matches!(step, PairStep::Promote))
        .count();
    if proof.flags.len() != needed_flags {
        return Err(MerkleError::MalformedProof(format!(
            "{} flags where the schedule has {} combining steps",
            proof.flags.len(),
            needed_flags
        )));
    }
    let needed_siblings = schedule
        .iter()
        .filter(|step| matches!(step, PairStep::CombineSibling { .. }))
        .count();
    if proof.siblings.len() != needed_siblings {
        return Err(MerkleError::MalformedProof(format!(
            "{} siblings where the schedule needs {}",
            proof.siblings.len(),
            needed_siblings
        )));
    }

    let mut queue: VecDeque<NodeHash> = entries.iter().map(|(_, hash)| *hash).collect();
    let mut flags = proof.flags.iter();
    let mut siblings = proof.siblings.iter();
    for step in schedule {
        match step {
            PairStep::Promote => {
                let Some(value) = queue.pop_front() else {
                    return Err(MerkleError::MalformedProof(
                        "evaluation queue ran dry".to_string(),
                    ));
                };
                queue.push_back(value);
            }
            PairStep::CombineKnown => {
                if flags.next() != Some(&true) {
                    return Err(MerkleError::MalformedProof(
                        "flag claims a proof sibling where the schedule pairs two entries"
                            .to_string(),
                    ));
                }
                let (Some(a), Some(b)) = (queue.pop_front(), queue.pop_front()) else {
                    return Err(MerkleError::MalformedProof(
                        "evaluation queue ran dry".to_string(),
                    ));
                };
                queue.push_back(combine_sorted::<H>(&a, &b));
            }
            PairStep::CombineSibling { .. } => {
                if flags.next() != Some(&false) {
                    return Err(MerkleError::MalformedProof(
                        "flag claims an entry pair where the schedule needs a proof sibling"
                            .to_string(),
                    ));
                }
                let (Some(a), Some(b)) = (queue.pop_front(), siblings.next()) else {
                    return Err(MerkleError::MalformedProof(
                        "evaluation queue ran dry".to_string(),
                    ));
                };
                queue.push_back(combine_sorted::<H>(&a, b));
            }
        }
    }
    if queue.len() != 1 {
        return Err(MerkleError::MalformedProof(format!(
            "evaluation left {} values instead of one",
            queue.len()
        )));
    }
    Ok(queue[0] == *root)
}
