// Paw Agent Engine — DEX scripted chain for unit tests
//
// Responses are keyed by method name, or by `eth_call:<to>:<selector>` for
// contract reads. A `<method>:<first param>` key (e.g. a receipt for one
// hash) wins over the bare method. Each key holds a queue: calls pop until
// one response is left, which then repeats. Every request is recorded in
// order. Stalled methods never answer.

use super::abi::{function_selector, SIG_TRANSFER_EVENT};
use super::config::{NetworkConfig, TimeoutConfig};
use super::primitives::{hex_encode, keccak256};
use super::rpc::RpcTransport;
use crate::atoms::error::{EngineError, EngineResult};
use alloy_primitives::U256;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

pub(crate) const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub(crate) const TEST_ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";
pub(crate) const TOKEN: &str = "0x6982508145454Ce325dDbE47a25d4ec3d2311933";
pub(crate) const PAIR: &str = "0xA43fe16908251ee70EF74718545e4FE6C5cCEc9f";

#[derive(Default)]
pub(crate) struct MockRpc {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, String>>>>,
    calls: Mutex<Vec<String>>,
    stalled: Mutex<HashSet<String>>,
}

pub(crate) fn call_key(to: &str, signature: &str) -> String {
    format!("eth_call:{}:{}", to.to_lowercase(), hex_encode(&function_selector(signature)))
}

impl MockRpc {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, key: String, response: Result<Value, String>) {
        self.responses.lock().entry(key).or_default().push_back(response);
    }

    pub fn on(&self, method: &str, result: Value) {
        self.push(method.to_string(), Ok(result));
    }

    pub fn fail(&self, method: &str, message: &str) {
        self.push(method.to_string(), Err(message.to_string()));
    }

    pub fn on_call(&self, to: &str, signature: &str, result: String) {
        self.push(call_key(to, signature), Ok(Value::String(result)));
    }

    pub fn fail_call(&self, to: &str, signature: &str, message: &str) {
        self.push(call_key(to, signature), Err(message.to_string()));
    }

    /// Receipt for one transaction hash.
    pub fn on_receipt(&self, tx_hash: &str, receipt: Value) {
        self.push(format!("eth_getTransactionReceipt:{}", tx_hash), Ok(receipt));
    }

    pub fn stall(&self, method: &str) {
        self.stalled.lock().insert(method.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, key: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == key).count()
    }
}

#[async_trait]
impl RpcTransport for MockRpc {
    async fn request(&self, method: &str, params: Value) -> EngineResult<Value> {
        // Give concurrent callers a chance to interleave.
        tokio::task::yield_now().await;

        let key = if method == "eth_call" {
            let to = params[0]["to"].as_str().unwrap_or_default().to_lowercase();
            let data = params[0]["data"].as_str().unwrap_or_default();
            format!("eth_call:{}:{}", to, &data[..data.len().min(10)])
        } else {
            method.to_string()
        };
        self.calls.lock().push(key.clone());

        let stalled = self.stalled.lock().contains(&key);
        if stalled {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return Err(EngineError::Rpc(format!("{} stalled", key)));
        }

        let mut responses = self.responses.lock();
        let scoped = params[0].as_str().map(|first| format!("{}:{}", key, first));
        let key = match scoped {
            Some(scoped) if responses.contains_key(&scoped) => scoped,
            _ => key,
        };
        let queue = responses
            .get_mut(&key)
            .ok_or_else(|| EngineError::Rpc(format!("unmocked request {}", key)))?;
        let response = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
        match response {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(EngineError::Rpc(message)),
            None => Err(EngineError::Rpc(format!("empty script for {}", key))),
        }
    }
}

// ── ABI return builders ────────────────────────────────────────────────────

pub(crate) fn word(value: U256) -> String {
    hex_encode(&value.to_be_bytes::<32>())
}

pub(crate) fn words(values: &[U256]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes::<32>()).collect();
    hex_encode(&bytes)
}

pub(crate) fn address_word(address: &str) -> String {
    let bytes = super::primitives::parse_address(address).expect("test address");
    let mut out = vec![0u8; 12];
    out.extend_from_slice(&bytes);
    hex_encode(&out)
}

pub(crate) fn uint_array(values: &[U256]) -> String {
    let mut all = vec![U256::from(32u64), U256::from(values.len())];
    all.extend_from_slice(values);
    words(&all)
}

pub(crate) fn abi_string(text: &str) -> String {
    let mut bytes = U256::from(32u64).to_be_bytes::<32>().to_vec();
    bytes.extend_from_slice(&U256::from(text.len()).to_be_bytes::<32>());
    let mut data = text.as_bytes().to_vec();
    data.resize(data.len().div_ceil(32).max(1) * 32, 0);
    bytes.extend_from_slice(&data);
    hex_encode(&bytes)
}

pub(crate) fn receipt(status: &str) -> Value {
    serde_json::json!({ "status": status, "blockNumber": "0x10", "logs": [] })
}

/// Successful receipt carrying one ERC-20 Transfer of `amount` from the
/// pair to `to`.
pub(crate) fn transfer_receipt(token: &str, to: &str, amount: U256) -> Value {
    serde_json::json!({
        "status": "0x1",
        "blockNumber": "0x10",
        "logs": [{
            "address": token.to_lowercase(),
            "topics": [
                hex_encode(&keccak256(SIG_TRANSFER_EVENT.as_bytes())),
                address_word(PAIR),
                address_word(to),
            ],
            "data": word(amount),
        }]
    })
}

pub(crate) fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(1_000_000_000_000_000_000u64)
}

/// Ethereum preset pointed at the mock with a test key and fast timeouts.
pub(crate) fn test_config() -> NetworkConfig {
    let mut cfg = NetworkConfig::ethereum(None).with_signing_key(TEST_KEY);
    cfg.rpc_url = Some("http://mock".into());
    cfg.native_usd_rate = Some(2000.0);
    cfg.timeouts = TimeoutConfig { rpc_secs: 1, receipt_secs: 1, poll_interval_ms: 1 };
    cfg
}
