//! The fixed instruction sets committed to by the caliber test scripts.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::common::{parse_address, parse_uint, Address};
use crate::error::{Error, Result};
use crate::instruction::{state_of, Command, Instruction, InstructionType, RecordFormat};
use crate::output::TreeData;
use crate::standard::StandardTree;
use crate::tree::TreeOptions;

const APPROVE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];
const MINT: [u8; 4] = [0x40, 0xc1, 0x0f, 0x19];
const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
const VAULT_DEPOSIT: [u8; 4] = [0x6e, 0x55, 0x3f, 0x65];
const VAULT_REDEEM: [u8; 4] = [0xba, 0x08, 0x76, 0x52];
const VAULT_ASSET: [u8; 4] = [0x38, 0xd5, 0x2e, 0x0f];
const VAULT_PREVIEW_REDEEM: [u8; 4] = [0x4c, 0xda, 0xd5, 0x06];
const BORROW: [u8; 4] = [0xc5, 0xeb, 0xea, 0xec];
const REPAY: [u8; 4] = [0x37, 0x1f, 0xd8, 0xe6];
const BORROW_DEBT: [u8; 4] = [0xd2, 0x83, 0xe7, 0x5f];
const POOL_ADD_LIQUIDITY: [u8; 4] = [0x9c, 0xd4, 0x41, 0xda];
const POOL_ADD_LIQUIDITY_ONE_SIDE: [u8; 4] = [0x8e, 0x02, 0x23, 0x64];
const POOL_REMOVE_LIQUIDITY_ONE_SIDE: [u8; 4] = [0xdf, 0x7a, 0xeb, 0xb9];
const POOL_PREVIEW_REMOVE_LIQUIDITY_ONE_SIDE: [u8; 4] = [0xee, 0xb4, 0x71, 0x44];

/// Which fixed set of instructions to commit to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionSet {
    /// Deposit, redeem and accounting against a single ERC4626 vault.
    Vault4626,
    /// The full mock deployment: vault, borrow module, pool and harvest.
    Mock,
}

impl InstructionSet {
    /// Names of the positional arguments, in order.
    pub fn arg_names(&self) -> &'static [&'static str] {
        match self {
            InstructionSet::Vault4626 => &[
                "caliber",
                "base-token",
                "erc4626-vault",
                "erc4626-position-id",
            ],
            InstructionSet::Mock => &[
                "caliber",
                "accounting-token",
                "base-token",
                "erc4626-vault",
                "erc4626-position-id",
                "borrow-module",
                "borrow-module-position-id",
                "pool",
                "pool-position-id",
            ],
        }
    }

    pub fn format(&self) -> RecordFormat {
        match self {
            InstructionSet::Vault4626 => RecordFormat::Script,
            InstructionSet::Mock => RecordFormat::Instruction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vault4626Deployment {
    pub caliber: Address,
    pub base_token: Address,
    pub vault: Address,
    pub vault_position_id: BigUint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockDeployment {
    pub caliber: Address,
    pub accounting_token: Address,
    pub base_token: Address,
    pub vault: Address,
    pub vault_position_id: BigUint,
    pub borrow_module: Address,
    pub borrow_position_id: BigUint,
    pub pool: Address,
    pub pool_position_id: BigUint,
}

/// Addresses and position ids an instruction set is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Vault4626(Vault4626Deployment),
    Mock(MockDeployment),
}

/// An instruction with the name its proof is published under.
#[derive(Debug, Clone)]
pub struct NamedInstruction {
    pub name: &'static str,
    pub instruction: Instruction,
}

impl Deployment {
    /// Reads a deployment from positional arguments.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] if the argument count does not match the
    /// set or an address or position id cannot be parsed.
    pub fn from_args(set: InstructionSet, args: &[String]) -> Result<Self> {
        let names = set.arg_names();
        if args.len() != names.len() {
            return Err(Error::Argument(format!(
                "expected {} arguments ({}), got {}",
                names.len(),
                names.join(" "),
                args.len()
            )));
        }

        let deployment = match set {
            InstructionSet::Vault4626 => Deployment::Vault4626(Vault4626Deployment {
                caliber: parse_address(&args[0])?,
                base_token: parse_address(&args[1])?,
                vault: parse_address(&args[2])?,
                vault_position_id: parse_uint(&args[3])?,
            }),
            InstructionSet::Mock => Deployment::Mock(MockDeployment {
                caliber: parse_address(&args[0])?,
                accounting_token: parse_address(&args[1])?,
                base_token: parse_address(&args[2])?,
                vault: parse_address(&args[3])?,
                vault_position_id: parse_uint(&args[4])?,
                borrow_module: parse_address(&args[5])?,
                borrow_position_id: parse_uint(&args[6])?,
                pool: parse_address(&args[7])?,
                pool_position_id: parse_uint(&args[8])?,
            }),
        };
        Ok(deployment)
    }

    pub fn set(&self) -> InstructionSet {
        match self {
            Deployment::Vault4626(_) => InstructionSet::Vault4626,
            Deployment::Mock(_) => InstructionSet::Mock,
        }
    }

    /// The instructions of this deployment, in leaf order.
    pub fn instructions(&self) -> Vec<NamedInstruction> {
        match self {
            Deployment::Vault4626(d) => vault4626_instructions(d),
            Deployment::Mock(d) => mock_instructions(d),
        }
    }
}

fn named(name: &'static str, instruction: Instruction) -> NamedInstruction {
    NamedInstruction { name, instruction }
}

fn vault4626_instructions(d: &Vault4626Deployment) -> Vec<NamedInstruction> {
    let management = |commands, state, state_bitmap| Instruction {
        commands,
        state,
        state_bitmap,
        position_id: d.vault_position_id.clone(),
        is_debt: false,
        affected_tokens: Vec::new(),
        kind: InstructionType::Management,
    };

    let deposit = management(
        vec![
            Command::call(APPROVE, &[0, 1], d.base_token),
            Command::call(VAULT_DEPOSIT, &[1, 2], d.vault),
        ],
        state_of(&[d.vault, d.caliber]),
        0xa000_0000_0000_0000_0000_0000_0000_0000,
    );
    let redeem = management(
        vec![Command::call(VAULT_REDEEM, &[0, 1, 2], d.vault)],
        state_of(&[d.caliber, d.caliber]),
        0x6000_0000_0000_0000_0000_0000_0000_0000,
    );
    let accounting = Instruction {
        kind: InstructionType::Accounting,
        ..management(
            vec![
                Command::static_call(VAULT_ASSET, &[], 0, d.vault),
                Command::static_call(BALANCE_OF, &[1], 1, d.vault),
                Command::static_call(VAULT_PREVIEW_REDEEM, &[1], 1, d.vault),
            ],
            state_of(&[d.caliber]),
            0x4000_0000_0000_0000_0000_0000_0000_0000,
        )
    };

    vec![
        named("DepositMock4626", deposit),
        named("RedeemMock4626", redeem),
        named("AccountingMock4626", accounting),
    ]
}

struct Draft {
    commands: Vec<Command>,
    state: Vec<Address>,
    state_bitmap: u128,
    position_id: BigUint,
    is_debt: bool,
    affected_tokens: Vec<Address>,
    kind: InstructionType,
}

impl From<Draft> for Instruction {
    fn from(draft: Draft) -> Self {
        Instruction {
            commands: draft.commands,
            state: state_of(&draft.state),
            state_bitmap: draft.state_bitmap,
            position_id: draft.position_id,
            is_debt: draft.is_debt,
            affected_tokens: draft.affected_tokens,
            kind: draft.kind,
        }
    }
}

fn mock_instructions(d: &MockDeployment) -> Vec<NamedInstruction> {
    use InstructionType::{Accounting, Harvest, Management};

    let vault = |commands, state, state_bitmap, kind| Draft {
        commands,
        state,
        state_bitmap,
        position_id: d.vault_position_id.clone(),
        is_debt: false,
        affected_tokens: vec![d.base_token],
        kind,
    };
    let borrow = |commands, state, state_bitmap, kind| Draft {
        commands,
        state,
        state_bitmap,
        position_id: d.borrow_position_id.clone(),
        is_debt: true,
        affected_tokens: vec![d.base_token],
        kind,
    };
    let pool = |commands, state, state_bitmap, affected_tokens, kind| Draft {
        commands,
        state,
        state_bitmap,
        position_id: d.pool_position_id.clone(),
        is_debt: false,
        affected_tokens,
        kind,
    };

    let drafts = vec![
        (
            "DepositMock4626",
            vault(
                vec![
                    Command::call(APPROVE, &[0, 1], d.base_token),
                    Command::call(VAULT_DEPOSIT, &[1, 2], d.vault),
                ],
                vec![d.vault, d.caliber],
                0xa000_0000_0000_0000_0000_0000_0000_0000,
                Management,
            ),
        ),
        (
            "RedeemMock4626",
            vault(
                vec![Command::call(VAULT_REDEEM, &[0, 1, 2], d.vault)],
                vec![d.caliber, d.caliber],
                0x6000_0000_0000_0000_0000_0000_0000_0000,
                Management,
            ),
        ),
        (
            "AccountingMock4626",
            vault(
                vec![
                    Command::static_call(VAULT_ASSET, &[], 0, d.vault),
                    Command::static_call(BALANCE_OF, &[2], 2, d.vault),
                    Command::static_call(VAULT_PREVIEW_REDEEM, &[2], 0, d.vault),
                ],
                vec![d.caliber],
                0x2000_0000_0000_0000_0000_0000_0000_0000,
                Accounting,
            ),
        ),
        (
            "BorrowMockBorrowModule",
            borrow(
                vec![Command::call(BORROW, &[0], d.borrow_module)],
                Vec::new(),
                0,
                Management,
            ),
        ),
        (
            "RepayMockBorrowModule",
            borrow(
                vec![
                    Command::call(APPROVE, &[0, 1], d.base_token),
                    Command::call(REPAY, &[1], d.borrow_module),
                ],
                vec![d.borrow_module],
                0x8000_0000_0000_0000_0000_0000_0000_0000,
                Management,
            ),
        ),
        (
            "AccountingMockBorrowModule",
            borrow(
                vec![Command::static_call(BORROW_DEBT, &[0], 0, d.borrow_module)],
                vec![d.caliber],
                0x8000_0000_0000_0000_0000_0000_0000_0000,
                Accounting,
            ),
        ),
        (
            "AddLiquidityMockPool",
            pool(
                vec![
                    Command::call(APPROVE, &[0, 1], d.accounting_token),
                    Command::call(APPROVE, &[0, 2], d.base_token),
                    Command::call(POOL_ADD_LIQUIDITY, &[1, 2], d.pool),
                ],
                vec![d.pool],
                0x8000_0000_0000_0000_0000_0000_0000_0000,
                vec![d.accounting_token, d.base_token],
                Management,
            ),
        ),
        (
            "AddLiquidityOneSide0MockPool",
            pool(
                vec![
                    Command::call(APPROVE, &[0, 1], d.accounting_token),
                    Command::call(POOL_ADD_LIQUIDITY_ONE_SIDE, &[1, 2], d.pool),
                ],
                vec![d.pool, d.accounting_token],
                0xa000_0000_0000_0000_0000_0000_0000_0000,
                vec![d.accounting_token],
                Management,
            ),
        ),
        (
            "AddLiquidityOneSide1MockPool",
            pool(
                vec![
                    Command::call(APPROVE, &[0, 1], d.base_token),
                    Command::call(POOL_ADD_LIQUIDITY_ONE_SIDE, &[1, 2], d.pool),
                ],
                vec![d.pool, d.base_token],
                0xa000_0000_0000_0000_0000_0000_0000_0000,
                vec![d.base_token],
                Management,
            ),
        ),
        (
            "RemoveLiquidityOneSide0MockPool",
            pool(
                vec![Command::call(POOL_REMOVE_LIQUIDITY_ONE_SIDE, &[0, 1], d.pool)],
                vec![d.accounting_token],
                0x4000_0000_0000_0000_0000_0000_0000_0000,
                vec![d.accounting_token],
                Management,
            ),
        ),
        (
            "RemoveLiquidityOneSide1MockPool",
            pool(
                vec![Command::call(POOL_REMOVE_LIQUIDITY_ONE_SIDE, &[0, 1], d.pool)],
                vec![d.base_token],
                0x4000_0000_0000_0000_0000_0000_0000_0000,
                vec![d.base_token],
                Management,
            ),
        ),
        (
            "AccountingMockPool",
            pool(
                vec![
                    Command::static_call(BALANCE_OF, &[2], 2, d.pool),
                    Command::static_call(POOL_PREVIEW_REMOVE_LIQUIDITY_ONE_SIDE, &[2, 0], 0, d.pool),
                ],
                vec![d.base_token, d.caliber],
                0xa000_0000_0000_0000_0000_0000_0000_0000,
                vec![d.base_token],
                Accounting,
            ),
        ),
        (
            "HarvestMockBaseToken",
            Draft {
                commands: vec![Command::call(MINT, &[0, 1], d.base_token)],
                state: vec![d.caliber],
                state_bitmap: 0x8000_0000_0000_0000_0000_0000_0000_0000,
                position_id: BigUint::zero(),
                is_debt: false,
                affected_tokens: Vec::new(),
                kind: Harvest,
            },
        ),
    ];

    drafts
        .into_iter()
        .map(|(name, draft)| named(name, draft.into()))
        .collect()
}

/// The instructions of a deployment committed to in one tree.
#[derive(Debug, Clone)]
pub struct InstructionTree {
    names: Vec<&'static str>,
    tree: StandardTree,
}

impl InstructionTree {
    /// Encodes every instruction of `deployment` and builds the tree.
    pub fn build(deployment: &Deployment, options: TreeOptions) -> Result<Self> {
        let format = deployment.set().format();
        let instructions = deployment.instructions();

        let names = instructions.iter().map(|named| named.name).collect();
        let records = instructions
            .iter()
            .map(|named| {
                tracing::debug!(
                    name = named.name,
                    commands = named.instruction.commands.len(),
                    "encoding instruction"
                );
                named.instruction.to_record(format)
            })
            .collect();
        let tree = StandardTree::of(records, format.schema(), options)?;

        Ok(Self { names, tree })
    }

    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn tree(&self) -> &StandardTree {
        &self.tree
    }

    /// Root plus one named proof per instruction, in leaf order.
    pub fn tree_data(&self) -> Result<TreeData> {
        let mut data = TreeData::new(self.tree.root());
        for (index, name) in self.names.iter().enumerate() {
            data.push_proof(name, self.tree.proof(index)?);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{hex_encode, keccak256};
    use crate::tree::verify_proof;

    const CALIBER: &str = "0x5615dEB798BB3E4dFa0139dFa1b3D433Cc23b72f";
    const ACCOUNTING_TOKEN: &str = "0x2e234DAe75C793f67A35089C9d99245E1C58470b";
    const BASE_TOKEN: &str = "0xF62849F9A0B5Bf2913b396098F7c7019b51A820a";
    const VAULT: &str = "0xc7183455a4C133Ae270771860664b6B7ec320bB1";
    const BORROW_MODULE: &str = "0xa0Cb889707d426A7A386870A03bc70d1b0697598";
    const POOL: &str = "0x1d1499e622D69689cdf9004d05Ec547d650Ff211";

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn vault_deployment() -> Deployment {
        Deployment::from_args(
            InstructionSet::Vault4626,
            &args(&[CALIBER, BASE_TOKEN, VAULT, "1"]),
        )
        .unwrap()
    }

    fn mock_deployment() -> Deployment {
        Deployment::from_args(
            InstructionSet::Mock,
            &args(&[
                CALIBER,
                ACCOUNTING_TOKEN,
                BASE_TOKEN,
                VAULT,
                "1",
                BORROW_MODULE,
                "2",
                POOL,
                "3",
            ]),
        )
        .unwrap()
    }

    #[test]
    fn test_from_args_wrong_count() {
        let result = Deployment::from_args(InstructionSet::Vault4626, &args(&[CALIBER]));
        assert!(matches!(result, Err(Error::Argument(_))));

        let result = Deployment::from_args(
            InstructionSet::Mock,
            &args(&[CALIBER, BASE_TOKEN, VAULT, "1"]),
        );
        assert!(matches!(result, Err(Error::Argument(_))));
    }

    #[test]
    fn test_from_args_bad_values() {
        let result = Deployment::from_args(
            InstructionSet::Vault4626,
            &args(&[CALIBER, BASE_TOKEN, VAULT, "one"]),
        );
        assert!(matches!(result, Err(Error::Argument(_))));

        let result = Deployment::from_args(
            InstructionSet::Vault4626,
            &args(&[CALIBER, "0x1234", VAULT, "1"]),
        );
        assert!(matches!(result, Err(Error::Argument(_))));
    }

    #[test]
    fn test_vault4626_deposit_record() {
        let deployment = vault_deployment();
        let Deployment::Vault4626(d) = &deployment else {
            panic!("expected vault deployment");
        };
        let instructions = deployment.instructions();
        let deposit = &instructions[0].instruction;

        let mut commands = hex::decode("095ea7b3010001ffffffffff").unwrap();
        commands.extend_from_slice(&d.base_token);
        commands.extend_from_slice(&hex::decode("6e553f65010102ffffffffff").unwrap());
        commands.extend_from_slice(&d.vault);
        assert_eq!(deposit.commands_hash(), keccak256(&commands));

        let mut state = vec![0u8; 12];
        state.extend_from_slice(&d.vault);
        state.extend_from_slice(&[0u8; 12]);
        state.extend_from_slice(&d.caliber);
        assert_eq!(deposit.state_hash(), keccak256(&state));
    }

    #[test]
    fn test_vault4626_tree_is_deterministic() {
        let first = InstructionTree::build(&vault_deployment(), TreeOptions::default()).unwrap();
        let second = InstructionTree::build(&vault_deployment(), TreeOptions::default()).unwrap();

        let first_data = first.tree_data().unwrap();
        assert_eq!(first_data, second.tree_data().unwrap());
        assert_eq!(
            first.names(),
            &["DepositMock4626", "RedeemMock4626", "AccountingMock4626"]
        );

        for (index, (name, proof)) in first_data.proofs().iter().enumerate() {
            assert!(name.starts_with("proof"));
            let leaf = first.tree().leaf_hash(index).unwrap();
            assert!(verify_proof(first_data.root(), leaf, proof));
        }
        assert_ne!(hex_encode(first_data.root()), hex_encode([0u8; 32]));
    }

    #[test]
    fn test_vault4626_golden_root_and_proofs() {
        let deposit_leaf = "0x01b0937bb85d043a5b2de193dac6cf1bcd1e649193b01a1dca5b5f4c484c9d76";
        let redeem_leaf = "0x40d785725296250e228709a743e45c0a8729c9adc224cc7f9f837ea9c6b70e7d";
        let accounting_leaf = "0x3c2aa5f0065c5f458c048933b8b75b3e2f23b3b15aabd60766e415c087d45e0f";
        let sibling = "0x5e6f43e0b9fffdd92ae21bcec5184beea06805a56385e5de554e68764762dc5e";

        for options in [TreeOptions::default(), TreeOptions::openzeppelin()] {
            let tree = InstructionTree::build(&vault_deployment(), options).unwrap();
            let data = tree.tree_data().unwrap();
            let hex = |proof: &[[u8; 32]]| proof.iter().map(hex_encode).collect::<Vec<_>>();

            assert_eq!(
                hex_encode(data.root()),
                "0x25fb41f2af710dfe3256ce41240c2fe92c73d8a87e62d75cf6dd03301dd9b587"
            );
            assert_eq!(hex_encode(tree.tree().leaf_hash(0).unwrap()), deposit_leaf);
            assert_eq!(
                hex(data.proof("DepositMock4626").unwrap()),
                vec![accounting_leaf, redeem_leaf]
            );
            assert_eq!(hex(data.proof("RedeemMock4626").unwrap()), vec![sibling]);
            assert_eq!(
                hex(data.proof("AccountingMock4626").unwrap()),
                vec![deposit_leaf, redeem_leaf]
            );
        }
    }

    #[test]
    fn test_mock_golden_roots() {
        let deployment = mock_deployment();

        let complete = InstructionTree::build(&deployment, TreeOptions::openzeppelin()).unwrap();
        assert_eq!(
            hex_encode(complete.tree().root()),
            "0x31fac039485033b2e2760e49455c93089d7ace412a8b344aac178ecaf7d7e177"
        );
        let harvest: Vec<String> = complete
            .tree()
            .proof(12)
            .unwrap()
            .iter()
            .map(hex_encode)
            .collect();
        assert_eq!(
            harvest,
            vec![
                "0x44a07288295a7ad878fd90b6291c1a812cdfd4511d417051cd36f67aec6febaf",
                "0x1cbeef84b09e3d7af6ac1cbe75d40079e15ac4bee222abcb6e8ea33e1eaa3245",
                "0x96f4979e42d617f816e2cf00eef159852dad5253f49cd771fbc4d0f72916c534",
                "0x81ee597d052b2658c9309f03bf2fd408972c08ce3e5ee062328283890819c6aa",
            ]
        );

        let levels = InstructionTree::build(&deployment, TreeOptions::default()).unwrap();
        assert_eq!(
            hex_encode(levels.tree().root()),
            "0x8c6a112eb46b94ed264562cc749f5558f752d6de8b55db46b51b7fdb3f2d405d"
        );
    }

    #[test]
    fn test_mock_set_builds_thirteen_leaves() {
        let deployment = mock_deployment();
        for options in [TreeOptions::default(), TreeOptions::openzeppelin()] {
            let tree = InstructionTree::build(&deployment, options).unwrap();
            assert_eq!(tree.tree().len(), 13);

            let data = tree.tree_data().unwrap();
            assert_eq!(data.proofs().len(), 13);
            assert_eq!(data.proofs()[12].0, "proofHarvestMockBaseToken");
            for index in 0..13 {
                assert!(tree.tree().verify(index, &data.proofs()[index].1));
            }
        }
    }

    #[test]
    fn test_mock_harvest_and_borrow_records() {
        let instructions = mock_deployment().instructions();

        let borrow = &instructions[3].instruction;
        assert!(borrow.is_debt);
        assert_eq!(borrow.state_hash(), [0u8; 32]);
        assert_eq!(borrow.position_id, BigUint::from(2u32));

        let harvest = &instructions[12].instruction;
        assert_eq!(harvest.kind, InstructionType::Harvest);
        assert!(harvest.position_id.is_zero());
        assert_eq!(harvest.affected_tokens_hash(), keccak256([]));
    }

    #[test]
    fn test_oversized_position_id_is_encoding_error() {
        let too_big = format!("0x1{}", "0".repeat(64));
        let deployment = Deployment::from_args(
            InstructionSet::Vault4626,
            &args(&[CALIBER, BASE_TOKEN, VAULT, &too_big]),
        )
        .unwrap();

        let result = InstructionTree::build(&deployment, TreeOptions::default());
        assert!(matches!(result, Err(Error::Encoding { field: 3, .. })));
    }
}
