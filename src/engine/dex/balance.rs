// Paw Agent Engine — DEX Balance Reader
// Native and ERC-20 balances for the connector's wallet.

use super::abi::{decode_uint256, encode_allowance, encode_balance_of};
use super::primitives::format_address;
use super::rpc::RpcClient;
use super::tokens::TokenRegistry;
use crate::atoms::error::EngineResult;
use crate::atoms::types::{TokenBalance, TokenDescriptor, WalletBalances};
use alloy_primitives::U256;
use futures::future::join_all;
use log::warn;
use std::sync::Arc;

#[derive(Clone)]
pub struct BalanceReader {
    rpc: RpcClient,
    owner: [u8; 20],
    native_symbol: String,
    tracked: Vec<[u8; 20]>,
    tokens: Arc<TokenRegistry>,
}

impl BalanceReader {
    pub fn new(
        rpc: RpcClient,
        owner: [u8; 20],
        native_symbol: impl Into<String>,
        tracked: Vec<[u8; 20]>,
        tokens: Arc<TokenRegistry>,
    ) -> Self {
        Self { rpc, owner, native_symbol: native_symbol.into(), tracked, tokens }
    }

    pub async fn native_balance(&self) -> EngineResult<U256> {
        self.rpc.get_balance(&format_address(&self.owner)).await
    }

    pub async fn token_balance(&self, token: &[u8; 20]) -> EngineResult<U256> {
        let result = self.rpc.eth_call(&format_address(token), &encode_balance_of(&self.owner)).await?;
        decode_uint256(&result)
    }

    /// token.allowance(owner, spender)
    pub async fn allowance(&self, token: &[u8; 20], spender: &[u8; 20]) -> EngineResult<U256> {
        let result = self
            .rpc
            .eth_call(&format_address(token), &encode_allowance(&self.owner, spender))
            .await?;
        decode_uint256(&result)
    }

    /// Native balance plus every tracked token. The native read must
    /// succeed; a failing token read is reported as zero.
    pub async fn wallet_balances(&self) -> EngineResult<WalletBalances> {
        let native = self.native_balance().await?;

        let reads = self.tracked.iter().map(|token| self.tracked_balance(token));
        let tokens = join_all(reads).await;

        Ok(WalletBalances {
            address: format_address(&self.owner),
            native_symbol: self.native_symbol.clone(),
            native,
            tokens,
        })
    }

    async fn tracked_balance(&self, token: &[u8; 20]) -> TokenBalance {
        let descriptor = self.tokens.describe_or_placeholder(&self.rpc, token).await;
        let amount = match self.token_balance(token).await {
            Ok(amount) => amount,
            Err(e) => {
                warn!("[dex] balanceOf {} failed, reporting zero: {}", descriptor.symbol, e);
                U256::ZERO
            }
        };
        let TokenDescriptor { address, decimals, symbol } = descriptor;
        TokenBalance { symbol, address, decimals, amount }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dex::abi::SIG_BALANCE_OF;
    use crate::engine::dex::config::StableToken;
    use crate::engine::dex::mock::{ether, word, MockRpc, TEST_ADDRESS};
    use crate::engine::dex::primitives::parse_address;
    use std::time::Duration;

    const USDT: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    fn reader(mock: &Arc<MockRpc>) -> BalanceReader {
        let stables = vec![
            StableToken { symbol: "USDT".into(), address: USDT.into(), decimals: 6 },
            StableToken { symbol: "USDC".into(), address: USDC.into(), decimals: 6 },
        ];
        let tracked = stables.iter().map(|s| parse_address(&s.address).unwrap()).collect();
        BalanceReader::new(
            RpcClient::new(mock.clone(), Duration::from_secs(1)),
            parse_address(TEST_ADDRESS).unwrap(),
            "ETH",
            tracked,
            Arc::new(TokenRegistry::with_known(&stables)),
        )
    }

    #[tokio::test]
    async fn failing_token_reports_zero() {
        let mock = Arc::new(MockRpc::new());
        mock.on("eth_getBalance", serde_json::json!("0xde0b6b3a7640000"));
        mock.on_call(USDT, SIG_BALANCE_OF, word(U256::from(25_000_000u64)));
        mock.fail_call(USDC, SIG_BALANCE_OF, "execution reverted");

        let balances = reader(&mock).wallet_balances().await.unwrap();
        assert_eq!(balances.native, ether(1));
        assert_eq!(balances.native_symbol, "ETH");
        assert_eq!(balances.tokens.len(), 2);
        assert_eq!(balances.tokens[0].symbol, "USDT");
        assert_eq!(balances.tokens[0].amount, U256::from(25_000_000u64));
        assert_eq!(balances.tokens[1].symbol, "USDC");
        assert_eq!(balances.tokens[1].amount, U256::ZERO);
    }

    #[tokio::test]
    async fn native_failure_propagates() {
        let mock = Arc::new(MockRpc::new());
        mock.fail("eth_getBalance", "header not found");
        assert!(reader(&mock).wallet_balances().await.is_err());
    }
}
