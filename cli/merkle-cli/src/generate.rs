use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use merkle_cli::{
    hex_encode, write_file_atomic, Deployment, InstructionSet, InstructionTree, Layout,
    TreeOptions,
};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SetArg {
    /// Deposit, redeem and accounting on one ERC4626 vault (4 arguments)
    Vault4626,
    /// Full mock deployment with borrow module, pool and harvest (9 arguments)
    Mock,
}

impl From<SetArg> for InstructionSet {
    fn from(arg: SetArg) -> Self {
        match arg {
            SetArg::Vault4626 => InstructionSet::Vault4626,
            SetArg::Mock => InstructionSet::Mock,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LayoutArg {
    /// Pair nodes level by level, promoting an unpaired last node
    Levels,
    /// Array-backed complete tree, as built by @openzeppelin/merkle-tree
    Complete,
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Levels => Layout::Levels,
            LayoutArg::Complete => Layout::Complete,
        }
    }
}

/// Arguments selecting the instruction set and how its tree is built.
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Instruction set to commit to
    #[arg(short, long, value_enum, default_value_t = SetArg::Vault4626)]
    pub set: SetArg,

    /// Tree layout. `levels` roots differ from @openzeppelin/merkle-tree for
    /// some leaf counts (the 13-leaf mock set among them); pass
    /// `--layout complete` to reproduce its output
    #[arg(long, value_enum, default_value_t = LayoutArg::Levels)]
    pub layout: LayoutArg,

    /// Keep leaves in argument order instead of sorting them by hash
    #[arg(long)]
    pub no_sort_leaves: bool,

    /// Addresses and position ids, in the order the instruction set expects
    #[arg(required = true, num_args = 1..)]
    pub values: Vec<String>,
}

impl TreeArgs {
    pub fn deployment(&self) -> Result<Deployment> {
        Deployment::from_args(self.set.into(), &self.values).context("Invalid deployment arguments")
    }

    pub fn options(&self) -> TreeOptions {
        TreeOptions {
            layout: self.layout.into(),
            sort_leaves: !self.no_sort_leaves,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(about = "Build the instruction Merkle tree and write its root and proofs", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Output JSON file for the root and proofs
    #[arg(
        short,
        long,
        env = "MERKLE_TREE_OUTPUT",
        default_value = "script/merkle/merkleTreeData.json"
    )]
    pub output: PathBuf,
}

pub fn run(cli: Cli) -> Result<()> {
    let deployment = cli.tree.deployment()?;
    let options = cli.tree.options();

    println!("Building {:?} instruction tree...", deployment.set());
    let tree = InstructionTree::build(&deployment, options)
        .context("Failed to build instruction tree")?;
    let data = tree.tree_data().context("Failed to collect proofs")?;

    println!("Merkle root: {}", hex_encode(data.root()));
    for (name, proof) in data.proofs() {
        tracing::debug!(%name, nodes = proof.len(), "generated proof");
    }

    let json = data.to_json_pretty().context("Failed to serialize tree data")?;
    println!("Writing tree data to {:?}...", cli.output);
    write_file_atomic(&cli.output, &json).context("Failed to write tree data file")?;

    tracing::info!(
        leaves = tree.names().len(),
        output = %cli.output.display(),
        "tree data written"
    );
    println!("Done!");
    Ok(())
}
