// Paw Agent Engine — DEX Wallet
// Owns the secp256k1 signing key for one connector. The key never leaves
// this type: it signs transactions and exposes only the address.

use super::primitives::{address_from_pubkey, format_address, hex_decode};
use super::tx::LegacyTransaction;
use crate::atoms::error::{EngineError, EngineResult};
use k256::ecdsa::SigningKey;
use std::fmt;
use zeroize::Zeroizing;

pub struct Wallet {
    signing_key: SigningKey,
    address: [u8; 20],
    checksum: String,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet").field("address", &self.checksum).finish_non_exhaustive()
    }
}

/// Trim whitespace, drop an optional 0x prefix, lowercase, require 64 hex chars.
pub(crate) fn normalize_private_key(raw: &str) -> EngineResult<Zeroizing<String>> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if body.len() != 64 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EngineError::config("signing key must be 32 bytes of hex (64 characters, optional 0x)"));
    }
    Ok(Zeroizing::new(body.to_ascii_lowercase()))
}

impl Wallet {
    pub fn from_private_key(raw: &str) -> EngineResult<Self> {
        let normalized = normalize_private_key(raw)?;
        let bytes = Zeroizing::new(hex_decode(&normalized).map_err(EngineError::Config)?);
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|_| EngineError::config("signing key is not a valid secp256k1 scalar"))?;
        let pubkey = signing_key.verifying_key().to_encoded_point(false);
        let address = address_from_pubkey(pubkey.as_bytes());
        Ok(Self { signing_key, address, checksum: format_address(&address) })
    }

    /// EIP-55 checksummed address
    pub fn address(&self) -> &str {
        &self.checksum
    }

    pub fn address_bytes(&self) -> &[u8; 20] {
        &self.address
    }

    pub(crate) fn sign_transaction(&self, tx: &LegacyTransaction) -> EngineResult<Vec<u8>> {
        tx.sign(&self.signing_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test key from the web3 documentation.
    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";

    #[test]
    fn derives_checksummed_address() {
        let wallet = Wallet::from_private_key(KEY).unwrap();
        assert_eq!(wallet.address(), ADDRESS);
    }

    #[test]
    fn normalizes_prefix_case_and_whitespace() {
        let bare = Wallet::from_private_key(&format!("  {}\n", KEY.trim_start_matches("0x").to_uppercase())).unwrap();
        assert_eq!(bare.address(), ADDRESS);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(matches!(Wallet::from_private_key("0x1234"), Err(EngineError::Config(_))));
        assert!(matches!(Wallet::from_private_key(&"zz".repeat(32)), Err(EngineError::Config(_))));
        assert!(matches!(Wallet::from_private_key(&"00".repeat(32)), Err(EngineError::Config(_))));
    }

    #[test]
    fn debug_hides_key() {
        let wallet = Wallet::from_private_key(KEY).unwrap();
        let rendered = format!("{:?}", wallet);
        assert!(rendered.contains(ADDRESS));
        assert!(!rendered.contains("4c0883a6"));
    }
}
