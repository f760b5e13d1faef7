//! Typed caliber instructions and their leaf records.
//!
//! An instruction bundles the weiroll commands a caliber may execute with
//! the state they expect, and is committed to as one leaf of the tree.

use num_bigint::BigUint;

use crate::abi::{FieldType, Schema, Value};
use crate::common::{address_to_word, keccak256, Address, Hash, ZERO_HASH};

/// Command flag for a regular call.
pub const FLAG_CALL: u8 = 0x01;
/// Command flag for a static call.
pub const FLAG_STATICCALL: u8 = 0x02;
/// Marks an unused input slot or a discarded output.
pub const UNUSED_SLOT: u8 = 0xff;

/// Fills the leading input slots and marks the rest unused.
pub fn slots(used: &[u8]) -> [u8; 6] {
    let mut slots = [UNUSED_SLOT; 6];
    for (slot, index) in slots.iter_mut().zip(used) {
        *slot = *index;
    }
    slots
}

/// One weiroll command word.
///
/// Layout: `selector(4) | flags(1) | inputs(6) | output(1) | target(20)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub selector: [u8; 4],
    pub flags: u8,
    pub inputs: [u8; 6],
    pub output: u8,
    pub target: Address,
}

impl Command {
    pub fn new(selector: [u8; 4], flags: u8, inputs: [u8; 6], output: u8, target: Address) -> Self {
        Self {
            selector,
            flags,
            inputs,
            output,
            target,
        }
    }

    /// A state-changing call whose return value is discarded.
    pub fn call(selector: [u8; 4], inputs: &[u8], target: Address) -> Self {
        Self::new(selector, FLAG_CALL, slots(inputs), UNUSED_SLOT, target)
    }

    /// A static call writing its return value to state slot `output`.
    pub fn static_call(selector: [u8; 4], inputs: &[u8], output: u8, target: Address) -> Self {
        Self::new(selector, FLAG_STATICCALL, slots(inputs), output, target)
    }

    pub fn encode(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[..4].copy_from_slice(&self.selector);
        word[4] = self.flags;
        word[5..11].copy_from_slice(&self.inputs);
        word[11] = self.output;
        word[12..].copy_from_slice(&self.target);
        word
    }
}

/// How the caliber treats an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionType {
    Management = 0,
    Accounting = 1,
    Harvest = 2,
}

/// Field layout of a leaf record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// `[commandsHash, stateHash, stateBitmap, positionId, instructionType]`
    Script,
    /// `[commandsHash, stateHash, stateBitmap, positionId, isDebt, affectedTokensHash, instructionType]`
    Instruction,
}

impl RecordFormat {
    pub fn schema(&self) -> Schema {
        let fields = match self {
            RecordFormat::Script => vec![
                FieldType::Bytes32,
                FieldType::Bytes32,
                FieldType::Uint(128),
                FieldType::Uint(256),
                FieldType::Uint(256),
            ],
            RecordFormat::Instruction => vec![
                FieldType::Bytes32,
                FieldType::Bytes32,
                FieldType::Uint(128),
                FieldType::Uint(256),
                FieldType::Bool,
                FieldType::Bytes32,
                FieldType::Uint(256),
            ],
        };
        Schema::new(fields)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub commands: Vec<Command>,
    /// Expected state words, usually addresses padded to 32 bytes.
    pub state: Vec<Hash>,
    pub state_bitmap: u128,
    pub position_id: BigUint,
    pub is_debt: bool,
    pub affected_tokens: Vec<Address>,
    pub kind: InstructionType,
}

impl Instruction {
    /// `keccak256` over the concatenated command words.
    pub fn commands_hash(&self) -> Hash {
        let words: Vec<u8> = self.commands.iter().flat_map(|c| c.encode()).collect();
        keccak256(words)
    }

    /// `keccak256` over the concatenated state words, or [`ZERO_HASH`] when
    /// the instruction expects no state.
    pub fn state_hash(&self) -> Hash {
        if self.state.is_empty() {
            return ZERO_HASH;
        }
        keccak256(self.state.concat())
    }

    /// `keccak256` over the padded token addresses. No tokens hash the empty
    /// string.
    pub fn affected_tokens_hash(&self) -> Hash {
        let words: Vec<u8> = self
            .affected_tokens
            .iter()
            .flat_map(address_to_word)
            .collect();
        keccak256(words)
    }

    /// Field values of this instruction's leaf record.
    pub fn to_record(&self, format: RecordFormat) -> Vec<Value> {
        let kind = Value::from(self.kind as u128);
        match format {
            RecordFormat::Script => vec![
                Value::from(self.commands_hash()),
                Value::from(self.state_hash()),
                Value::from(self.state_bitmap),
                Value::from(self.position_id.clone()),
                kind,
            ],
            RecordFormat::Instruction => vec![
                Value::from(self.commands_hash()),
                Value::from(self.state_hash()),
                Value::from(self.state_bitmap),
                Value::from(self.position_id.clone()),
                Value::from(self.is_debt),
                Value::from(self.affected_tokens_hash()),
                kind,
            ],
        }
    }
}

/// Pads each address to a state word.
pub fn state_of(addresses: &[Address]) -> Vec<Hash> {
    addresses.iter().map(address_to_word).collect()
}
