//! Hash derivation for claim references
//!
//! The release contract does not take the raw origin-chain transaction hash
//! string; it expects keccak256 over the string's UTF-8 bytes. This
//! derivation is a boundary contract with the deployed release contract and
//! must not change.

use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash of arbitrary data.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Derive the 32-byte claim reference from the user-supplied origin-chain
/// transaction hash string.
pub fn claim_reference(origin_tx: &str) -> [u8; 32] {
    keccak256(origin_tx.as_bytes())
}

/// Convert 32 bytes to a 0x-prefixed hex string.
pub fn bytes32_to_hex(bytes: &[u8; 32]) -> String {
    format!("0x{}", hex::encode(bytes))
}
