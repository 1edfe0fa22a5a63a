//! Bottom-up construction of the sorted-pair tree and its flat node layout.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::{
    MerkleError, MerkleHasher, NodeHash, Result,
    hash::combine_sorted,
};

/// Below this level width the parallel path costs more than it saves.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_LEVEL_WIDTH: usize = 256;

/// Build-time options. `Default` gives order-sensitive, sequential
/// construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeOptions {
    /// Sort leaf hashes ascending before placement. Makes the root
    /// independent of leaf supply order; leaf positions then follow the
    /// sorted order, not the input order.
    pub sort_leaves: bool,
    /// Hash each level's pairs across threads. Levels are still strictly
    /// sequential: one level is fully computed before the next starts.
    /// Ignored unless the `parallel` feature is enabled.
    pub parallel: bool,
}

/// An immutable binary hash tree over 32-byte leaf hashes.
///
/// Nodes are stored in one flat array, root first, each level contiguous,
/// leaves in the final block. A level with an odd node count promotes its
/// last node unchanged to the next level; no node is ever paired with
/// itself.
#[derive(Debug, Clone)]
pub struct MerkleTree<H: MerkleHasher> {
    /// Every node hash, root level first.
    nodes: Vec<NodeHash>,
    /// Flat offset of each level's first node, root level first.
    level_offsets: Vec<usize>,
    /// Node count per level, root level first.
    level_sizes: Vec<u64>,
    leaf_count: u64,
    /// Leaf hash to leaf position. Filled during construction, where it also
    /// acts as the duplicate detector.
    positions: BTreeMap<NodeHash, u64>,
    _hasher: PhantomData<H>,
}

impl<H: MerkleHasher> MerkleTree<H> {
    /// Build a tree over the given leaf hashes.
    ///
    /// Requires at least one leaf and rejects duplicate hashes: a duplicate
    /// would make two positions indistinguishable to a proof. Construction
    /// is deterministic and has no side effects.
    pub fn from_leaf_hashes(leaf_hashes: Vec<NodeHash>, options: TreeOptions) -> Result<Self> {
        if leaf_hashes.is_empty() {
            return Err(MerkleError::EmptyTree);
        }
        let mut positions = BTreeMap::new();
        for (pos, hash) in leaf_hashes.iter().enumerate() {
            if let Some(first) = positions.insert(*hash, pos as u64) {
                return Err(MerkleError::DuplicateLeaf {
                    first,
                    second: pos as u64,
                });
            }
        }
        let mut leaves = leaf_hashes;
        if options.sort_leaves {
            leaves.sort_unstable();
            for (pos, hash) in leaves.iter().enumerate() {
                positions.insert(*hash, pos as u64);
            }
        }

        let leaf_count = leaves.len() as u64;
        let mut bottom_up: Vec<Vec<NodeHash>> = Vec::new();
        let mut current = leaves;
        while current.len() > 1 {
            let next = next_level::<H>(&current, options.parallel);
            bottom_up.push(current);
            current = next;
        }
        bottom_up.push(current);

        let mut nodes = Vec::with_capacity(bottom_up.iter().map(Vec::len).sum());
        let mut level_offsets = Vec::with_capacity(bottom_up.len());
        let mut level_sizes = Vec::with_capacity(bottom_up.len());
        for level in bottom_up.iter().rev() {
            level_offsets.push(nodes.len());
            level_sizes.push(level.len() as u64);
            nodes.extend_from_slice(level);
        }

        Ok(MerkleTree {
            nodes,
            level_offsets,
            level_sizes,
            leaf_count,
            positions,
            _hasher: PhantomData,
        })
    }

    /// Rebuild a tree from a dumped node array without re-hashing anything.
    ///
    /// Validates that the array length matches the level structure implied
    /// by `leaf_count` and that the leaf block holds no duplicates.
    pub(crate) fn from_parts(nodes: Vec<NodeHash>, leaf_count: u64) -> Result<Self> {
        if leaf_count == 0 {
            return Err(MerkleError::InvalidData(
                "node array for zero leaves".to_string(),
            ));
        }
        // Keeps the level-size sum below overflow range for any count that
        // could describe this array.
        if leaf_count > nodes.len() as u64 {
            return Err(MerkleError::InvalidData(format!(
                "leaf count {} exceeds node array length {}",
                leaf_count,
                nodes.len()
            )));
        }
        let level_sizes = level_sizes_for(leaf_count);
        let expected: u64 = level_sizes.iter().sum();
        if nodes.len() as u64 != expected {
            return Err(MerkleError::InvalidData(format!(
                "node array length {} does not match {} levels over {} leaves (expected {})",
                nodes.len(),
                level_sizes.len(),
                leaf_count,
                expected
            )));
        }
        let mut level_offsets = Vec::with_capacity(level_sizes.len());
        let mut offset = 0usize;
        for size in &level_sizes {
            level_offsets.push(offset);
            offset += *size as usize;
        }
        let leaf_block = &nodes[nodes.len() - leaf_count as usize..];
        let mut positions = BTreeMap::new();
        for (pos, hash) in leaf_block.iter().enumerate() {
            if let Some(first) = positions.insert(*hash, pos as u64) {
                return Err(MerkleError::DuplicateLeaf {
                    first,
                    second: pos as u64,
                });
            }
        }
        Ok(MerkleTree {
            nodes,
            level_offsets,
            level_sizes,
            leaf_count,
            positions,
            _hasher: PhantomData,
        })
    }

    /// The root hash. The tree's node at flat index 0.
    pub fn root(&self) -> NodeHash {
        self.nodes[0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// Number of levels, including the leaf level and the root level. A
    /// single-leaf tree has one level and its root is the leaf hash itself.
    pub fn level_count(&self) -> usize {
        self.level_sizes.len()
    }

    /// Every node hash, root level first, leaves in the final block.
    pub fn nodes(&self) -> &[NodeHash] {
        &self.nodes
    }

    /// The leaf-level block of the node array.
    pub fn leaf_hashes(&self) -> &[NodeHash] {
        &self.nodes[self.nodes.len() - self.leaf_count as usize..]
    }

    /// The hash of the leaf at `index`.
    pub fn leaf_hash_at(&self, index: u64) -> Result<NodeHash> {
        self.check_leaf_index(index)?;
        Ok(self.leaf_hashes()[index as usize])
    }

    /// The position of a leaf hash, if it is in the tree.
    pub fn position_of(&self, leaf_hash: &NodeHash) -> Option<u64> {
        self.positions.get(leaf_hash).copied()
    }

    pub(crate) fn check_leaf_index(&self, index: u64) -> Result<()> {
        if index >= self.leaf_count {
            return Err(MerkleError::IndexOutOfRange {
                index,
                leaf_count: self.leaf_count,
            });
        }
        Ok(())
    }

    /// Node hash at a (level, position) coordinate, levels counted from the
    /// bottom: level 0 is the leaf level.
    pub(crate) fn node_at(&self, level_from_bottom: usize, pos: u64) -> NodeHash {
        let depth = self.level_sizes.len() - 1 - level_from_bottom;
        self.nodes[self.level_offsets[depth] + pos as usize]
    }

    /// Node count of a level counted from the bottom.
    pub(crate) fn level_size(&self, level_from_bottom: usize) -> u64 {
        let depth = self.level_sizes.len() - 1 - level_from_bottom;
        self.level_sizes[depth]
    }
}

/// Whether the node at `pos` in a level of `size` nodes is carried up
/// unchanged instead of being paired.
pub(crate) fn is_promoted(pos: u64, size: u64) -> bool {
    pos == size - 1 && size % 2 == 1
}

/// Node count per level for a tree over `leaf_count` leaves, root level
/// first.
pub(crate) fn level_sizes_for(leaf_count: u64) -> Vec<u64> {
    let mut sizes = vec![leaf_count];
    let mut size = leaf_count;
    while size > 1 {
        size = size.div_ceil(2);
        sizes.push(size);
    }
    sizes.reverse();
    sizes
}

fn next_level<H: MerkleHasher>(level: &[NodeHash], parallel: bool) -> Vec<NodeHash> {
    #[cfg(feature = "parallel")]
    if parallel && level.len() >= PARALLEL_MIN_LEVEL_WIDTH {
        use rayon::prelude::*;
        return level.par_chunks(2).map(combine_pair::<H>).collect();
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;
    level.chunks(2).map(combine_pair::<H>).collect()
}

fn combine_pair<H: MerkleHasher>(pair: &[NodeHash]) -> NodeHash {
    match *pair {
        [a, b] => combine_sorted::<H>(&a, &b),
        // chunks(2) leaves a lone trailing node when the level is odd; it is
        // promoted unchanged.
        [a] => a,
        _ => unreachable!("chunks(2) yields one or two nodes"),
    }
}
