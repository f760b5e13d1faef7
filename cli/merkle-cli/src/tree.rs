//! Merkle tree over 32-byte leaves with sorted-pair hashing.
//!
//! Leaves are double hashed ([`hash_leaf`]) and internal nodes single hashed
//! ([`hash_pair`]), so a leaf can never be passed off as an internal node.
//! Proofs produced here verify with OpenZeppelin's `MerkleProof.verify`.

use crate::common::{hash_pair, keccak256, Hash, ZERO_HASH};
use crate::error::{Error, Result};

/// Hashes an encoded record into a leaf: `keccak256(keccak256(encoded))`.
pub fn hash_leaf(encoded: &[u8]) -> Hash {
    keccak256(keccak256(encoded))
}

/// Shape of the tree built over the leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// Pairs left to right, level by level. An unpaired last node moves up
    /// unchanged.
    #[default]
    Levels,
    /// Complete binary tree stored as an array of `2n - 1` nodes with the
    /// leaves reversed at the tail, as in `@openzeppelin/merkle-tree`.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeOptions {
    pub layout: Layout,
    /// Sort leaf hashes ascending before building.
    pub sort_leaves: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            layout: Layout::Levels,
            sort_leaves: true,
        }
    }
}

impl TreeOptions {
    /// Options reproducing `StandardMerkleTree.of` from `@openzeppelin/merkle-tree`.
    pub fn openzeppelin() -> Self {
        Self {
            layout: Layout::Complete,
            sort_leaves: true,
        }
    }
}

#[derive(Debug, Clone)]
enum Nodes {
    Levels(Vec<Vec<Hash>>),
    Complete(Vec<Hash>),
}

/// A built Merkle tree.
///
/// Leaf indices always refer to the order the leaves were supplied in, even
/// when the tree sorts them internally.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    nodes: Nodes,
    leaves: Vec<Hash>,
    positions: Vec<usize>,
}

impl MerkleTree {
    /// Builds a tree with [`TreeOptions::default`].
    pub fn build(leaves: Vec<Hash>) -> Self {
        Self::build_with(leaves, TreeOptions::default())
    }

    pub fn build_with(leaves: Vec<Hash>, options: TreeOptions) -> Self {
        let mut order: Vec<usize> = (0..leaves.len()).collect();
        if options.sort_leaves {
            order.sort_by_key(|&i| leaves[i]);
        }

        let mut positions = vec![0usize; leaves.len()];
        for (position, &index) in order.iter().enumerate() {
            positions[index] = position;
        }
        let ordered: Vec<Hash> = order.iter().map(|&i| leaves[i]).collect();

        let nodes = match options.layout {
            Layout::Levels => Nodes::Levels(build_levels(ordered)),
            Layout::Complete => Nodes::Complete(build_complete(&ordered)),
        };

        let tree = Self {
            nodes,
            leaves,
            positions,
        };
        tracing::debug!(
            leaves = tree.len(),
            layout = ?options.layout,
            sorted = options.sort_leaves,
            root = %hex::encode(tree.root()),
            "built merkle tree"
        );
        tree
    }

    /// Root of the tree, [`ZERO_HASH`] when there are no leaves.
    pub fn root(&self) -> Hash {
        match &self.nodes {
            Nodes::Levels(levels) => levels
                .last()
                .and_then(|level| level.first())
                .copied()
                .unwrap_or(ZERO_HASH),
            Nodes::Complete(nodes) => nodes.first().copied().unwrap_or(ZERO_HASH),
        }
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Leaf hashes in the order they were supplied.
    pub fn leaves(&self) -> &[Hash] {
        &self.leaves
    }

    pub fn leaf(&self, index: usize) -> Option<Hash> {
        self.leaves.get(index).copied()
    }

    /// Sibling hashes from the leaf at `index` up to the root.
    ///
    /// # Errors
    /// Returns [`Error::Index`] if `index` is not a leaf of this tree.
    pub fn proof(&self, index: usize) -> Result<Vec<Hash>> {
        let position = *self.positions.get(index).ok_or(Error::Index {
            index,
            len: self.len(),
        })?;

        let mut proof = Vec::new();
        match &self.nodes {
            Nodes::Levels(levels) => {
                let mut current = position;
                for level in &levels[..levels.len() - 1] {
                    if let Some(sibling) = level.get(current ^ 1) {
                        proof.push(*sibling);
                    }
                    current /= 2;
                }
            }
            Nodes::Complete(nodes) => {
                let mut current = nodes.len() - 1 - position;
                while current > 0 {
                    let sibling = if current % 2 == 1 { current + 1 } else { current - 1 };
                    proof.push(nodes[sibling]);
                    current = (current - 1) / 2;
                }
            }
        }
        Ok(proof)
    }
}

fn build_levels(leaves: Vec<Hash>) -> Vec<Vec<Hash>> {
    let mut tree = vec![leaves];

    while let Some(level) = tree.last().filter(|level| level.len() > 1) {
        let next_level: Vec<Hash> = level
            .chunks(2)
            .map(|chunk| match chunk {
                [left, right] => hash_pair(*left, *right),
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two nodes"),
            })
            .collect();
        tree.push(next_level);
    }

    tree
}

fn build_complete(leaves: &[Hash]) -> Vec<Hash> {
    if leaves.is_empty() {
        return Vec::new();
    }

    let mut nodes = vec![ZERO_HASH; 2 * leaves.len() - 1];
    let last = nodes.len() - 1;
    for (i, leaf) in leaves.iter().enumerate() {
        nodes[last - i] = *leaf;
    }
    for i in (0..leaves.len() - 1).rev() {
        nodes[i] = hash_pair(nodes[2 * i + 1], nodes[2 * i + 2]);
    }
    nodes
}

/// Recomputes the root from a leaf and its proof.
pub fn process_proof(leaf: Hash, proof: &[Hash]) -> Hash {
    proof.iter().fold(leaf, |acc, sibling| hash_pair(acc, *sibling))
}

/// Returns whether `proof` links `leaf` to `root`.
pub fn verify_proof(root: Hash, leaf: Hash, proof: &[Hash]) -> bool {
    process_proof(leaf, proof) == root
}
