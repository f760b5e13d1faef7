use crate::abi::{encode, Schema, Value};
use crate::common::Hash;
use crate::error::Result;
use crate::tree::{hash_leaf, verify_proof, MerkleTree, TreeOptions};

/// Merkle tree over typed records sharing one schema.
///
/// Every record is encoded before the first leaf is hashed, so a malformed
/// record fails the whole build without doing any hashing work.
#[derive(Debug, Clone)]
pub struct StandardTree {
    schema: Schema,
    records: Vec<Vec<Value>>,
    tree: MerkleTree,
}

impl StandardTree {
    pub fn of(records: Vec<Vec<Value>>, schema: Schema, options: TreeOptions) -> Result<Self> {
        let encoded = records
            .iter()
            .map(|record| encode(record, &schema))
            .collect::<Result<Vec<_>>>()?;

        let leaves = encoded.iter().map(|bytes| hash_leaf(bytes)).collect();
        let tree = MerkleTree::build_with(leaves, options);

        Ok(Self {
            schema,
            records,
            tree,
        })
    }

    pub fn root(&self) -> Hash {
        self.tree.root()
    }

    /// Proof for the record at `index` in the order records were supplied.
    pub fn proof(&self, index: usize) -> Result<Vec<Hash>> {
        self.tree.proof(index)
    }

    pub fn leaf_hash(&self, index: usize) -> Option<Hash> {
        self.tree.leaf(index)
    }

    /// Checks `proof` for the record at `index` against this tree's root.
    pub fn verify(&self, index: usize, proof: &[Hash]) -> bool {
        self.leaf_hash(index)
            .is_some_and(|leaf| verify_proof(self.root(), leaf, proof))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Vec<Value>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
