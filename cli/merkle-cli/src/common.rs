use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use num_bigint::BigUint;
use sha3::{Digest, Keccak256};

use crate::error::{Error, Result};

/// A 32-byte keccak digest, also used for ABI words.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum address.
pub type Address = [u8; 20];

/// Root of a tree without leaves, and the hash of an empty state.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Computes the Keccak256 digest of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> Hash {
    Keccak256::digest(data.as_ref()).into()
}

/// Hashes two nodes into their parent.
///
/// The pair is sorted before hashing so the parent does not depend on which
/// child sits on the left. This matches `MerkleProof.sol` from OpenZeppelin.
pub fn hash_pair(a: Hash, b: Hash) -> Hash {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let hash = Keccak256::new().chain_update(lo).chain_update(hi).finalize();
    hash.into()
}

/// Parses an Ethereum address from a hex string.
///
/// # Arguments
/// * `addr_str` - The address string, with or without "0x" prefix
///
/// # Errors
/// Returns [`Error::Argument`] if the address is not 40 hex characters,
/// contains invalid hex, or is the zero address.
pub fn parse_address(addr_str: &str) -> Result<Address> {
    let trimmed = addr_str.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if cleaned.len() != 40 {
        return Err(Error::Argument(format!(
            "invalid address length for '{}': expected 40 hex chars, got {}",
            trimmed,
            cleaned.len()
        )));
    }
    let mut address = [0u8; 20];
    hex::decode_to_slice(cleaned, &mut address)
        .map_err(|e| Error::Argument(format!("invalid hex in address '{}': {}", trimmed, e)))?;
    if address == [0u8; 20] {
        return Err(Error::Argument("zero address not allowed".to_string()));
    }
    Ok(address)
}

/// Parses a 32-byte hash from a hex string, with or without "0x" prefix.
pub fn parse_hash(hash_str: &str) -> Result<Hash> {
    let trimmed = hash_str.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if cleaned.len() != 64 {
        return Err(Error::Format(format!(
            "invalid hash length for '{}': expected 64 hex chars, got {}",
            trimmed,
            cleaned.len()
        )));
    }
    let mut hash = [0u8; 32];
    hex::decode_to_slice(cleaned, &mut hash)
        .map_err(|e| Error::Format(format!("invalid hex in hash '{}': {}", trimmed, e)))?;
    Ok(hash)
}

/// Parses an unsigned integer given in decimal or as "0x"-prefixed hex.
///
/// Position ids are passed this way on the command line.
pub fn parse_uint(value: &str) -> Result<BigUint> {
    let trimmed = value.trim();
    let parsed = match trimmed.strip_prefix("0x") {
        Some(digits) if !digits.is_empty() => BigUint::parse_bytes(digits.as_bytes(), 16),
        Some(_) => None,
        None => BigUint::parse_bytes(trimmed.as_bytes(), 10),
    };
    parsed.ok_or_else(|| Error::Argument(format!("invalid unsigned integer '{}'", trimmed)))
}

/// Left-pads an address to a 32-byte word (12 zero bytes + address).
pub fn address_to_word(address: &Address) -> Hash {
    let mut word = [0u8; 32];
    word[12..32].copy_from_slice(address);
    word
}

/// Encodes bytes as lowercase hex with a "0x" prefix.
pub fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Writes `contents` to `path` through a temporary sibling file.
///
/// The temporary file is flushed and then renamed over `path`, so readers
/// never observe a partially written file. On failure the temporary file is
/// removed and `path` is left untouched.
pub fn write_file_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let written = (|| -> std::io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err.into());
    }
    Ok(())
}
