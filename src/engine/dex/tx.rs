// Paw Agent Engine — DEX Transaction Signing
// Legacy (gasPrice) transactions with EIP-155 replay protection. Both
// supported chains accept them and the gas policy prices in gasPrice.

use super::primitives::{hex_encode, keccak256};
use super::rlp::{rlp_encode_bytes, rlp_encode_list, strip_leading_zeros, u256_to_minimal_be, u64_to_minimal_be};
use crate::atoms::error::{EngineError, EngineResult};
use alloy_primitives::U256;
use k256::ecdsa::SigningKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LegacyTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: [u8; 20],
    pub value: U256,
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    fn base_items(&self) -> Vec<Vec<u8>> {
        vec![
            rlp_encode_bytes(&u64_to_minimal_be(self.nonce)),
            rlp_encode_bytes(&u256_to_minimal_be(self.gas_price)),
            rlp_encode_bytes(&u64_to_minimal_be(self.gas_limit)),
            rlp_encode_bytes(&self.to),
            rlp_encode_bytes(&u256_to_minimal_be(self.value)),
            rlp_encode_bytes(&self.data),
        ]
    }

    /// RLP([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])
    pub(crate) fn signing_payload(&self) -> Vec<u8> {
        let mut items = self.base_items();
        items.push(rlp_encode_bytes(&u64_to_minimal_be(self.chain_id)));
        items.push(rlp_encode_bytes(&[]));
        items.push(rlp_encode_bytes(&[]));
        rlp_encode_list(&items)
    }

    pub(crate) fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    /// Sign and return the raw bytes for eth_sendRawTransaction.
    pub(crate) fn sign(&self, key: &SigningKey) -> EngineResult<Vec<u8>> {
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&self.signing_hash())
            .map_err(|e| EngineError::Other(format!("Signing failed: {}", e)))?;

        // v = recid + chainId * 2 + 35
        let v = self
            .chain_id
            .checked_mul(2)
            .and_then(|c| c.checked_add(35 + recovery_id.to_byte() as u64))
            .ok_or_else(|| EngineError::config(format!("Chain id {} too large for EIP-155", self.chain_id)))?;

        let sig_bytes = signature.to_bytes();
        let mut items = self.base_items();
        items.push(rlp_encode_bytes(&u64_to_minimal_be(v)));
        items.push(rlp_encode_bytes(&strip_leading_zeros(&sig_bytes[..32])));
        items.push(rlp_encode_bytes(&strip_leading_zeros(&sig_bytes[32..])));
        Ok(rlp_encode_list(&items))
    }
}

/// Transaction hash of a signed legacy transaction: keccak256(raw)
pub(crate) fn transaction_hash(raw: &[u8]) -> String {
    hex_encode(&keccak256(raw))
}
