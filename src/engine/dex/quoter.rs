// Paw Agent Engine — DEX Price Quoter
//
// Pool discovery and pricing against the network's wrapped-native asset:
//   factory.getPair(token, wrapped)        → pair (null = no pool)
//   pair.getReserves() + pair.token0()     → oriented spot price
//   router.getAmountsOut(amountIn, path)   → expected swap output
//
// Reserves are read fresh on every quote; they change every block.

use super::abi::{
    decode_address, decode_reserves, decode_uint256_array, encode_get_amounts_out, encode_get_pair,
    encode_get_reserves, encode_token0,
};
use super::primitives::{format_address, parse_address, units_to_f64};
use super::rpc::RpcClient;
use super::tokens::TokenRegistry;
use crate::atoms::constants::{NATIVE_DECIMALS, NULL_ADDRESS};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{PoolReserves, TokenPrice};
use alloy_primitives::U256;
use log::debug;
use std::sync::Arc;

#[derive(Clone)]
pub struct PriceQuoter {
    rpc: RpcClient,
    router: [u8; 20],
    factory: [u8; 20],
    wrapped_native: [u8; 20],
    tokens: Arc<TokenRegistry>,
}

impl PriceQuoter {
    pub fn new(
        rpc: RpcClient,
        router: [u8; 20],
        factory: [u8; 20],
        wrapped_native: [u8; 20],
        tokens: Arc<TokenRegistry>,
    ) -> Self {
        Self { rpc, router, factory, wrapped_native, tokens }
    }

    /// [wrapped native, token]
    pub fn buy_path(&self, token: &[u8; 20]) -> Vec<[u8; 20]> {
        vec![self.wrapped_native, *token]
    }

    /// [token, wrapped native]
    pub fn sell_path(&self, token: &[u8; 20]) -> Vec<[u8; 20]> {
        vec![*token, self.wrapped_native]
    }

    /// Pair address for (token, wrapped native). The factory returns the
    /// null address when no pool exists.
    pub async fn resolve_pair(&self, token: &[u8; 20]) -> EngineResult<[u8; 20]> {
        let result = self
            .rpc
            .eth_call(&format_address(&self.factory), &encode_get_pair(token, &self.wrapped_native))
            .await?;
        let pair = decode_address(&result)?;
        if pair == NULL_ADDRESS {
            return Err(EngineError::NoLiquidity { token: format_address(token) });
        }
        debug!("[dex] pair for {} is {}", format_address(token), format_address(&pair));
        Ok(pair)
    }

    pub async fn read_reserves(&self, pair: &[u8; 20]) -> EngineResult<PoolReserves> {
        let pair_address = format_address(pair);
        let reserves_call = encode_get_reserves();
        let token0_call = encode_token0();
        let (reserves, token0) = futures::try_join!(
            self.rpc.eth_call(&pair_address, &reserves_call),
            self.rpc.eth_call(&pair_address, &token0_call),
        )?;
        let (reserve0, reserve1) = decode_reserves(&reserves)?;
        let token0 = decode_address(&token0)?;
        Ok(PoolReserves { pair: pair_address, reserve0, reserve1, token0: format_address(&token0) })
    }

    /// Spot price of `token` in native units, plus an approximate USD figure
    /// when a reference rate is known. The USD value is an estimate only.
    pub async fn quote_price(&self, token: &[u8; 20], reference_rate: Option<f64>) -> EngineResult<TokenPrice> {
        let pair = self.resolve_pair(token).await?;
        let reserves = self.read_reserves(&pair).await?;
        let descriptor = self.tokens.describe(&self.rpc, token).await?;
        let price_native = oriented_price(&reserves, token, descriptor.decimals)?;
        Ok(TokenPrice {
            token: descriptor.address,
            symbol: descriptor.symbol,
            price_native,
            price_usd: reference_rate.map(|rate| price_native * rate),
        })
    }

    /// Expected output of the last hop of `path` for `amount_in`, from the
    /// router's constant-product formula.
    ///
    /// Fee-on-transfer and rebasing tokens deliver less than this figure;
    /// the router quote does not model them, and neither does this call.
    pub async fn quote_amount_out(&self, amount_in: U256, path: &[[u8; 20]]) -> EngineResult<U256> {
        let result = self
            .rpc
            .eth_call(&format_address(&self.router), &encode_get_amounts_out(amount_in, path))
            .await?;
        let amounts = decode_uint256_array(&result)?;
        let out = amounts
            .last()
            .copied()
            .ok_or_else(|| EngineError::decode("getAmountsOut returned an empty array"))?;
        if out.is_zero() {
            let token = path.last().map(format_address).unwrap_or_default();
            return Err(EngineError::NoLiquidity { token });
        }
        Ok(out)
    }
}

/// Native-per-token spot price from pool reserves, oriented by which side
/// of the pair `token` sits on. Display-only: each reserve is scaled to
/// whole units before the division, so dust-priced tokens keep their
/// significant digits.
pub fn oriented_price(reserves: &PoolReserves, token: &[u8; 20], token_decimals: u8) -> EngineResult<f64> {
    let token0 = parse_address(&reserves.token0).map_err(EngineError::Decode)?;
    let (token_reserve, native_reserve) = if token0 == *token {
        (reserves.reserve0, reserves.reserve1)
    } else {
        (reserves.reserve1, reserves.reserve0)
    };
    if token_reserve.is_zero() || native_reserve.is_zero() {
        return Err(EngineError::NoLiquidity { token: format_address(token) });
    }

    let native = units_to_f64(native_reserve, NATIVE_DECIMALS);
    let tokens = units_to_f64(token_reserve, token_decimals);
    Ok(native / tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dex::abi::{SIG_DECIMALS, SIG_GET_AMOUNTS_OUT, SIG_GET_PAIR, SIG_GET_RESERVES, SIG_SYMBOL, SIG_TOKEN0};
    use crate::engine::dex::constants::{UNISWAP_V2_FACTORY, UNISWAP_V2_ROUTER, WETH_ADDRESS};
    use crate::engine::dex::mock::{abi_string, address_word, ether, uint_array, word, words, MockRpc, PAIR, TOKEN};
    use std::time::Duration;

    fn quoter(mock: &Arc<MockRpc>) -> PriceQuoter {
        PriceQuoter::new(
            RpcClient::new(mock.clone(), Duration::from_secs(1)),
            parse_address(UNISWAP_V2_ROUTER).unwrap(),
            parse_address(UNISWAP_V2_FACTORY).unwrap(),
            parse_address(WETH_ADDRESS).unwrap(),
            Arc::new(TokenRegistry::new()),
        )
    }

    fn token() -> [u8; 20] {
        parse_address(TOKEN).unwrap()
    }

    fn reserves(token0: &str) -> PoolReserves {
        PoolReserves {
            pair: PAIR.into(),
            reserve0: ether(1000),
            reserve1: ether(2000),
            token0: token0.into(),
        }
    }

    #[test]
    fn orientation_is_symmetric() {
        assert_eq!(oriented_price(&reserves(TOKEN), &token(), 18).unwrap(), 2.0);
        assert_eq!(oriented_price(&reserves(WETH_ADDRESS), &token(), 18).unwrap(), 0.5);
    }

    #[test]
    fn orientation_respects_token_decimals() {
        // 1 native against 2,000,000 units of a 6-decimal token
        let r = PoolReserves {
            pair: PAIR.into(),
            reserve0: U256::from(2_000_000_000_000u64),
            reserve1: ether(1),
            token0: TOKEN.into(),
        };
        let price = oriented_price(&r, &token(), 6).unwrap();
        assert!((price - 0.000_000_5).abs() < 1e-15);
    }

    #[test]
    fn dust_prices_keep_precision() {
        // 3 native against 7e15 whole tokens: about 4.2857e-16 native each
        let r = PoolReserves {
            pair: PAIR.into(),
            reserve0: U256::from(7u64) * U256::from(10u64).pow(U256::from(33u64)),
            reserve1: ether(3),
            token0: TOKEN.into(),
        };
        let price = oriented_price(&r, &token(), 18).unwrap();
        let expected = 3.0 / 7e15;
        assert!(((price - expected) / expected).abs() < 1e-12);
    }

    #[test]
    fn empty_reserves_are_no_liquidity() {
        let mut r = reserves(TOKEN);
        r.reserve0 = U256::ZERO;
        assert!(matches!(oriented_price(&r, &token(), 18), Err(EngineError::NoLiquidity { .. })));
    }

    #[tokio::test]
    async fn null_pair_is_no_liquidity() {
        let mock = Arc::new(MockRpc::new());
        mock.on_call(UNISWAP_V2_FACTORY, SIG_GET_PAIR, word(U256::ZERO));
        let err = quoter(&mock).resolve_pair(&token()).await.unwrap_err();
        assert!(matches!(err, EngineError::NoLiquidity { .. }));
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn quote_price_reads_pool() {
        let mock = Arc::new(MockRpc::new());
        mock.on_call(UNISWAP_V2_FACTORY, SIG_GET_PAIR, address_word(PAIR));
        mock.on_call(PAIR, SIG_GET_RESERVES, words(&[ether(1000), ether(2000), U256::from(1u64)]));
        mock.on_call(PAIR, SIG_TOKEN0, address_word(TOKEN));
        mock.on_call(TOKEN, SIG_DECIMALS, word(U256::from(18u64)));
        mock.on_call(TOKEN, SIG_SYMBOL, abi_string("PEPE"));

        let price = quoter(&mock).quote_price(&token(), Some(3000.0)).await.unwrap();
        assert_eq!(price.symbol, "PEPE");
        assert_eq!(price.price_native, 2.0);
        assert_eq!(price.price_usd, Some(6000.0));

        let no_rate = quoter(&mock).quote_price(&token(), None).await.unwrap();
        assert_eq!(no_rate.price_usd, None);
    }

    #[tokio::test]
    async fn amount_out_is_last_hop() {
        let mock = Arc::new(MockRpc::new());
        mock.on_call(UNISWAP_V2_ROUTER, SIG_GET_AMOUNTS_OUT, uint_array(&[ether(1), ether(100)]));
        let q = quoter(&mock);
        let out = q.quote_amount_out(ether(1), &q.buy_path(&token())).await.unwrap();
        assert_eq!(out, ether(100));
    }

    #[tokio::test]
    async fn zero_quote_is_no_liquidity() {
        let mock = Arc::new(MockRpc::new());
        mock.on_call(UNISWAP_V2_ROUTER, SIG_GET_AMOUNTS_OUT, uint_array(&[ether(1), U256::ZERO]));
        let q = quoter(&mock);
        let err = q.quote_amount_out(ether(1), &q.buy_path(&token())).await.unwrap_err();
        assert!(matches!(err, EngineError::NoLiquidity { .. }));
    }
}
