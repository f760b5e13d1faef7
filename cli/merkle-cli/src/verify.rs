use anyhow::{Context, Result};
use clap::Parser;
use merkle_cli::{hex_encode, verify_proof, InstructionTree, TreeData};
use std::fs;
use std::path::PathBuf;

use crate::generate::TreeArgs;

#[derive(Parser, Debug)]
#[command(name = "verify")]
#[command(about = "Check an existing tree data file against the instruction set", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Tree data JSON file to check
    #[arg(
        short,
        long,
        env = "MERKLE_TREE_OUTPUT",
        default_value = "script/merkle/merkleTreeData.json"
    )]
    pub input: PathBuf,
}

pub fn run(cli: Cli) -> Result<()> {
    println!("Reading tree data from {:?}...", cli.input);
    let json = fs::read_to_string(&cli.input).context("Failed to read tree data file")?;
    let data = TreeData::from_json(&json).context("Failed to parse tree data file")?;

    let deployment = cli.tree.deployment()?;
    let tree = InstructionTree::build(&deployment, cli.tree.options())
        .context("Failed to build instruction tree")?;

    let expected_root = tree.tree().root();
    if data.root() != expected_root {
        anyhow::bail!(
            "Root mismatch: file has {}, instructions give {}",
            hex_encode(data.root()),
            hex_encode(expected_root)
        );
    }

    let unknown: Vec<&str> = data
        .proofs()
        .iter()
        .map(|(key, _)| key.as_str())
        .filter(|key| {
            !tree
                .names()
                .iter()
                .any(|name| key.strip_prefix("proof") == Some(*name))
        })
        .collect();
    if !unknown.is_empty() {
        anyhow::bail!(
            "Tree data holds proofs the instruction set does not name: {}",
            unknown.join(", ")
        );
    }

    for (index, name) in tree.names().iter().enumerate() {
        let proof = data
            .proof(name)
            .with_context(|| format!("Missing proof for {name}"))?;
        let leaf = tree
            .tree()
            .leaf_hash(index)
            .with_context(|| format!("Missing leaf for {name}"))?;
        if !verify_proof(data.root(), leaf, proof) {
            anyhow::bail!("Proof for {} does not verify against the root", name);
        }
        tracing::debug!(%name, nodes = proof.len(), "proof verified");
    }

    println!(
        "All {} proofs verify against root {}",
        tree.names().len(),
        hex_encode(data.root())
    );
    Ok(())
}
