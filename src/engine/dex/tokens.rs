// Paw Agent Engine — DEX Token Registry
//
// ERC-20 metadata (decimals, symbol) is immutable for a deployed contract,
// so successful lookups are cached for the life of the connector. The
// configured stable tokens are seeded up front and never hit the chain.

use super::abi::{decode_abi_string, decode_uint8, encode_decimals, encode_symbol};
use super::config::StableToken;
use super::primitives::{format_address, parse_address};
use super::rpc::RpcClient;
use crate::atoms::constants::{NATIVE_DECIMALS, UNKNOWN_SYMBOL};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::TokenDescriptor;
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct TokenRegistry {
    cache: RwLock<HashMap<[u8; 20], TokenDescriptor>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with known tokens. Entries with a malformed
    /// address are skipped (config validation rejects them earlier).
    pub fn with_known(tokens: &[StableToken]) -> Self {
        let registry = Self::new();
        for token in tokens {
            if let Ok(address) = parse_address(&token.address) {
                registry.insert(
                    address,
                    TokenDescriptor {
                        address: format_address(&address),
                        decimals: token.decimals,
                        symbol: token.symbol.clone(),
                    },
                );
            }
        }
        registry
    }

    pub fn insert(&self, address: [u8; 20], descriptor: TokenDescriptor) {
        self.cache.write().insert(address, descriptor);
    }

    pub fn cached(&self, address: &[u8; 20]) -> Option<TokenDescriptor> {
        self.cache.read().get(address).cloned()
    }

    /// Read decimals and symbol from the token contract.
    ///
    /// Decimals are required: without them no amount can be interpreted, so
    /// a failure is `UnknownToken`. A missing or garbled symbol degrades to
    /// "UNKNOWN" and that descriptor is not cached, so a later call retries.
    pub async fn describe(&self, rpc: &RpcClient, token: &[u8; 20]) -> EngineResult<TokenDescriptor> {
        if let Some(hit) = self.cached(token) {
            return Ok(hit);
        }

        let address = format_address(token);
        let decimals_call = encode_decimals();
        let symbol_call = encode_symbol();
        let (decimals, symbol) = tokio::join!(
            rpc.eth_call(&address, &decimals_call),
            rpc.eth_call(&address, &symbol_call),
        );

        let decimals = decimals.and_then(|hex| decode_uint8(&hex)).map_err(|e| EngineError::UnknownToken {
            token: address.clone(),
            reason: format!("decimals() failed: {}", e),
        })?;

        let symbol = symbol
            .and_then(|hex| decode_abi_string(&hex))
            .map(|s| s.trim().to_string())
            .ok()
            .filter(|s| !s.is_empty());

        match symbol {
            Some(symbol) => {
                let descriptor = TokenDescriptor { address, decimals, symbol };
                debug!("[dex] Cached token {} ({} decimals)", descriptor.symbol, decimals);
                self.insert(*token, descriptor.clone());
                Ok(descriptor)
            }
            None => {
                warn!("[dex] symbol() unreadable for {}, using {}", address, UNKNOWN_SYMBOL);
                Ok(TokenDescriptor { address, decimals, symbol: UNKNOWN_SYMBOL.into() })
            }
        }
    }

    /// Like `describe`, but never fails: used where metadata only feeds
    /// display fields of an otherwise successful trade.
    pub async fn describe_or_placeholder(&self, rpc: &RpcClient, token: &[u8; 20]) -> TokenDescriptor {
        match self.describe(rpc, token).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!("[dex] {}", e);
                TokenDescriptor {
                    address: format_address(token),
                    decimals: NATIVE_DECIMALS,
                    symbol: UNKNOWN_SYMBOL.into(),
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dex::abi::{SIG_DECIMALS, SIG_SYMBOL};
    use crate::engine::dex::mock::{abi_string, word, MockRpc, TOKEN};
    use alloy_primitives::U256;
    use std::sync::Arc;
    use std::time::Duration;

    fn client(mock: &Arc<MockRpc>) -> RpcClient {
        RpcClient::new(mock.clone(), Duration::from_secs(1))
    }

    fn token() -> [u8; 20] {
        parse_address(TOKEN).unwrap()
    }

    #[tokio::test]
    async fn caches_successful_lookup() {
        let mock = Arc::new(MockRpc::new());
        mock.on_call(TOKEN, SIG_DECIMALS, word(U256::from(9u64)));
        mock.on_call(TOKEN, SIG_SYMBOL, abi_string("PEPE"));
        let registry = TokenRegistry::new();
        let rpc = client(&mock);

        let first = registry.describe(&rpc, &token()).await.unwrap();
        let second = registry.describe(&rpc, &token()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.symbol, "PEPE");
        assert_eq!(first.decimals, 9);
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn unreadable_symbol_is_not_cached() {
        let mock = Arc::new(MockRpc::new());
        mock.on_call(TOKEN, SIG_DECIMALS, word(U256::from(18u64)));
        mock.fail_call(TOKEN, SIG_SYMBOL, "execution reverted");
        let registry = TokenRegistry::new();

        let descriptor = registry.describe(&client(&mock), &token()).await.unwrap();
        assert_eq!(descriptor.symbol, UNKNOWN_SYMBOL);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn unreadable_decimals_is_unknown_token() {
        let mock = Arc::new(MockRpc::new());
        mock.fail_call(TOKEN, SIG_DECIMALS, "execution reverted");
        mock.on_call(TOKEN, SIG_SYMBOL, abi_string("PEPE"));
        let registry = TokenRegistry::new();
        let rpc = client(&mock);

        let err = registry.describe(&rpc, &token()).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownToken { .. }));

        let placeholder = registry.describe_or_placeholder(&rpc, &token()).await;
        assert_eq!(placeholder.symbol, UNKNOWN_SYMBOL);
        assert_eq!(placeholder.decimals, NATIVE_DECIMALS);
    }

    #[tokio::test]
    async fn known_tokens_skip_the_chain() {
        let mock = Arc::new(MockRpc::new());
        let usdc = StableToken {
            symbol: "USDC".into(),
            address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".into(),
            decimals: 6,
        };
        let registry = TokenRegistry::with_known(&[usdc.clone()]);
        let address = parse_address(&usdc.address).unwrap();

        let descriptor = registry.describe(&client(&mock), &address).await.unwrap();
        assert_eq!(descriptor.decimals, 6);
        assert!(mock.calls().is_empty());
    }
}
