// End-to-end tests through the public API, against a scripted chain that
// answers JSON-RPC the way a V2 router, factory, pair and ERC-20 would.

use alloy_primitives::U256;
use async_trait::async_trait;
use parking_lot::Mutex;
use paw_dex::engine::dex::function_selector;
use paw_dex::{
    compute_min_out, compute_spend_amount, DexConfig, EngineError, EngineResult, NetworkConfig, NetworkConnector,
    RpcTransport, SlippageTolerance, SwapState,
};
use serde_json::{json, Value};
use std::sync::Arc;

const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const TOKEN: &str = "0x6982508145454ce325ddbe47a25d4ec3d2311933";
const PAIR: &str = "0xa43fe16908251ee70ef74718545e4fe6c5ccec9f";
const WALLET: &str = "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23";
const TRANSFER_TOPIC: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(1_000_000_000_000_000_000u64)
}

fn hex(bytes: &[u8]) -> String {
    format!("0x{}", bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>())
}

fn selector(sig: &str) -> String {
    hex(&function_selector(sig))
}

fn words(values: &[U256]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes::<32>()).collect();
    hex(&bytes)
}

fn address_word(address: &str) -> String {
    format!("0x{:0>64}", address.trim_start_matches("0x"))
}

fn abi_string(text: &str) -> String {
    let mut data = text.as_bytes().to_vec();
    data.resize(32, 0);
    let mut bytes = U256::from(32u64).to_be_bytes::<32>().to_vec();
    bytes.extend_from_slice(&U256::from(text.len()).to_be_bytes::<32>());
    bytes.extend_from_slice(&data);
    hex(&bytes)
}

/// A single-pool chain. Token balance reads walk `token_balances` and stick
/// on the last entry. A successful receipt carries a Transfer of
/// `amount_out` tokens from the pair to the wallet.
struct ScriptedChain {
    chain_id: u64,
    reachable: bool,
    has_pool: bool,
    native_balance: U256,
    token_balances: Mutex<Vec<U256>>,
    amount_out: U256,
    receipt_status: &'static str,
    calls: Mutex<Vec<String>>,
}

impl ScriptedChain {
    fn ethereum() -> Self {
        Self {
            chain_id: 1,
            reachable: true,
            has_pool: true,
            native_balance: ether(1),
            token_balances: Mutex::new(vec![ether(100)]),
            amount_out: ether(100),
            receipt_status: "0x1",
            calls: Mutex::new(Vec::new()),
        }
    }

    fn called(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == name).count()
    }

    fn next_token_balance(&self) -> U256 {
        let mut balances = self.token_balances.lock();
        if balances.len() > 1 {
            balances.remove(0)
        } else {
            balances.first().copied().unwrap_or(U256::ZERO)
        }
    }

    fn contract_call(&self, data: &str) -> EngineResult<Value> {
        let sel = &data[..10];
        let name = if sel == selector("getPair(address,address)") {
            "getPair"
        } else if sel == selector("getReserves()") {
            "getReserves"
        } else if sel == selector("token0()") {
            "token0"
        } else if sel == selector("getAmountsOut(uint256,address[])") {
            "getAmountsOut"
        } else if sel == selector("balanceOf(address)") {
            "balanceOf"
        } else if sel == selector("allowance(address,address)") {
            "allowance"
        } else if sel == selector("decimals()") {
            "decimals"
        } else if sel == selector("symbol()") {
            "symbol"
        } else {
            return Err(EngineError::Rpc(format!("unexpected call {}", sel)));
        };
        self.calls.lock().push(name.to_string());

        let result = match name {
            "getPair" if self.has_pool => address_word(PAIR),
            "getPair" => words(&[U256::ZERO]),
            "getReserves" => words(&[ether(1000), ether(2000), U256::from(1u64)]),
            "token0" => address_word(TOKEN),
            "getAmountsOut" => words(&[U256::from(32u64), U256::from(2u64), ether(1), self.amount_out]),
            "balanceOf" => words(&[self.next_token_balance()]),
            "allowance" => words(&[U256::ZERO]),
            "decimals" => words(&[U256::from(18u64)]),
            _ => abi_string("MEME"),
        };
        Ok(Value::String(result))
    }
}

#[async_trait]
impl RpcTransport for ScriptedChain {
    async fn request(&self, method: &str, params: Value) -> EngineResult<Value> {
        if !self.reachable {
            return Err(EngineError::Rpc("connection refused".into()));
        }
        if method == "eth_call" {
            let data = params[0]["data"].as_str().unwrap_or_default().to_string();
            return self.contract_call(&data);
        }
        self.calls.lock().push(method.to_string());
        Ok(match method {
            "eth_chainId" => json!(format!("0x{:x}", self.chain_id)),
            "eth_getBalance" => json!(format!("0x{:x}", self.native_balance)),
            "eth_gasPrice" => json!("0x3b9aca00"),
            "eth_getTransactionCount" => json!("0x0"),
            "eth_sendRawTransaction" => json!("0x7e57"),
            "eth_getTransactionReceipt" => json!({
                "status": self.receipt_status,
                "logs": [{
                    "address": TOKEN,
                    "topics": [TRANSFER_TOPIC, address_word(PAIR), address_word(WALLET)],
                    "data": words(&[self.amount_out]),
                }],
            }),
            other => return Err(EngineError::Rpc(format!("unexpected method {}", other))),
        })
    }
}

fn config() -> NetworkConfig {
    let mut cfg = NetworkConfig::ethereum(None).with_signing_key(KEY);
    cfg.rpc_url = Some("http://scripted".into());
    cfg.timeouts.receipt_secs = 1;
    cfg.timeouts.poll_interval_ms = 1;
    cfg
}

async fn connect(chain: &Arc<ScriptedChain>) -> NetworkConnector {
    NetworkConnector::with_transport(config(), chain.clone()).await.unwrap()
}

#[tokio::test]
async fn buy_with_half_the_wallet() {
    let chain = Arc::new(ScriptedChain::ethereum());
    let connector = connect(&chain).await;

    let result = connector.execute_buy(TOKEN, 50.0).await.unwrap();
    assert_eq!(result.amount_in, U256::from(495_000_000_000_000_000u64));
    assert_eq!(result.expected_out, ether(100));
    assert_eq!(result.min_out, ether(95));
    assert_eq!(result.amount_out, ether(100));
    assert_eq!(result.status, SwapState::Confirmed);
    assert_eq!(result.token.symbol, "MEME");
    assert_eq!(result.tx_hash, "0x7e57");
    assert_eq!(chain.called("eth_sendRawTransaction"), 1);
    assert_eq!(chain.called("balanceOf"), 0);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["direction"], "buy");
    assert_eq!(json["status"], "confirmed");
}

#[tokio::test]
async fn reverting_router_yields_no_result() {
    let chain = Arc::new(ScriptedChain { receipt_status: "0x0", ..ScriptedChain::ethereum() });
    let connector = connect(&chain).await;

    let err = connector.execute_buy(TOKEN, 50.0).await.unwrap_err();
    assert!(matches!(err, EngineError::Reverted { .. }));
    assert!(err.is_post_submission());
}

#[tokio::test]
async fn no_pool_means_no_balance_or_gas_reads() {
    let chain = Arc::new(ScriptedChain { has_pool: false, ..ScriptedChain::ethereum() });
    let connector = connect(&chain).await;

    let err = connector.execute_buy(TOKEN, 50.0).await.unwrap_err();
    assert!(matches!(err, EngineError::NoLiquidity { .. }));
    assert_eq!(chain.called("eth_getBalance"), 0);
    assert_eq!(chain.called("eth_gasPrice"), 0);
    assert!(connector.get_token_price(TOKEN).await.is_none());
}

#[tokio::test]
async fn selling_nothing_stops_before_approval() {
    let chain = Arc::new(ScriptedChain {
        token_balances: Mutex::new(vec![U256::ZERO]),
        ..ScriptedChain::ethereum()
    });
    let connector = connect(&chain).await;

    let err = connector.execute_sell(TOKEN).await.unwrap_err();
    assert!(matches!(err, EngineError::NothingToSell { .. }));
    assert_eq!(chain.called("allowance"), 0);
    assert_eq!(chain.called("eth_sendRawTransaction"), 0);
}

#[tokio::test]
async fn sell_approves_exact_balance_then_swaps() {
    let chain = Arc::new(ScriptedChain {
        token_balances: Mutex::new(vec![ether(40)]),
        amount_out: ether(2),
        ..ScriptedChain::ethereum()
    });
    let connector = connect(&chain).await;

    let result = connector.execute_sell(TOKEN).await.unwrap();
    assert_eq!(chain.called("eth_sendRawTransaction"), 2);
    assert_eq!(result.amount_in, ether(40));
    assert_eq!(result.amount_out, U256::from(1_900_000_000_000_000_000u64));
    assert_eq!(result.states.first(), Some(&SwapState::Quoting));
    assert!(result.states.contains(&SwapState::Approving));
}

#[tokio::test]
async fn spot_price_and_reference_rate() {
    let chain = Arc::new(ScriptedChain::ethereum());
    let connector = connect(&chain).await;

    let price = connector.get_token_price(TOKEN).await.unwrap();
    assert_eq!(price.price_native, 2.0);
    assert_eq!(price.price_usd, None);

    connector.set_reference_rate(Some(2500.0));
    let price = connector.get_token_price(TOKEN).await.unwrap();
    assert_eq!(price.price_usd, Some(5000.0));
}

#[tokio::test]
async fn missing_signing_key_is_config_error() {
    let mut cfg = config();
    cfg.signing_key = None;
    let chain = Arc::new(ScriptedChain::ethereum());
    let err = NetworkConnector::with_transport(cfg, chain.clone()).await.unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
    assert!(chain.calls.lock().is_empty());
}

#[tokio::test]
async fn unreachable_provider_is_connection_error() {
    let chain = Arc::new(ScriptedChain { reachable: false, ..ScriptedChain::ethereum() });
    let err = NetworkConnector::with_transport(config(), chain).await.unwrap_err();
    assert!(matches!(err, EngineError::Connection(_)));
}

#[tokio::test]
async fn networks_are_independent() {
    let source = r#"
        [[networks]]
        name = "bsc"
        chain_id = 56
        rpc_url = "http://scripted-bsc"
        router_address = "0x10ED43C718714eb63d5aA57B58B43cEF1aB4F3c6"
        factory_address = "0xcA143Ce32Fe78f1f7019d7d551a6402fC5350c73"
        wrapped_native_address = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"
        native_symbol = "BNB"
    "#;
    let file = DexConfig::from_toml_str(source).unwrap();
    let bsc_cfg = file.network("bsc").unwrap().clone().with_signing_key(KEY);

    let eth_chain = Arc::new(ScriptedChain::ethereum());
    let bsc_chain = Arc::new(ScriptedChain { chain_id: 56, native_balance: ether(3), ..ScriptedChain::ethereum() });

    let eth = connect(&eth_chain).await;
    let bsc = NetworkConnector::with_transport(bsc_cfg, bsc_chain.clone()).await.unwrap();

    let (eth_balances, bsc_balances) = tokio::join!(eth.get_balances(), bsc.get_balances());
    let eth_balances = eth_balances.unwrap();
    let bsc_balances = bsc_balances.unwrap();
    assert_eq!(eth_balances.native, ether(1));
    assert_eq!(eth_balances.native_symbol, "ETH");
    assert_eq!(bsc_balances.native, ether(3));
    assert_eq!(bsc_balances.native_symbol, "BNB");
    assert!(bsc_balances.tokens.is_empty());
    assert_eq!(eth.get_wallet().address(), bsc.get_wallet().address());
}

#[test]
fn sizing_and_slippage_figures() {
    let spend = compute_spend_amount(ether(1), U256::from(10_000_000_000_000_000u64), 50.0).unwrap();
    assert_eq!(spend, U256::from(495_000_000_000_000_000u64));

    let tolerance = SlippageTolerance::from_fraction(0.05).unwrap();
    assert_eq!(compute_min_out(ether(100), tolerance), ether(95));

    let err = compute_spend_amount(U256::from(5u64), U256::from(5u64), 50.0).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance { .. }));
}
