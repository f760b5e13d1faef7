pub mod abi;
pub mod catalog;
pub mod common;
pub mod error;
pub mod instruction;
pub mod output;
pub mod standard;
pub mod tree;

pub use abi::{encode, encode_packed, FieldType, Schema, Value};
pub use catalog::{Deployment, InstructionSet, InstructionTree, NamedInstruction};
pub use common::{
    address_to_word, hash_pair, hex_encode, keccak256, parse_address, parse_hash, parse_uint,
    write_file_atomic, Address, Hash, ZERO_HASH,
};
pub use error::{Error, Result};
pub use instruction::{Command, Instruction, InstructionType, RecordFormat};
pub use output::TreeData;
pub use standard::StandardTree;
pub use tree::{hash_leaf, process_proof, verify_proof, Layout, MerkleTree, TreeOptions};
