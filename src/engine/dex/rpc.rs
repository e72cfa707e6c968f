// Paw Agent Engine — DEX JSON-RPC Helpers
//
// `RpcTransport` is the seam between the swap core and the node: the HTTP
// implementation talks JSON-RPC 2.0 over reqwest, tests plug in scripted
// chains. `RpcClient` adds the client-side timeout and typed eth_* calls.

use super::primitives::{hex_encode, parse_quantity};
use crate::atoms::error::{EngineError, EngineResult};
use alloy_primitives::U256;
use async_trait::async_trait;
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Issue one JSON-RPC request and return its `result` member.
    async fn request(&self, method: &str, params: serde_json::Value) -> EngineResult<serde_json::Value>;
}

/// JSON-RPC over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> EngineResult<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, url: url.into(), next_id: AtomicU64::new(1) })
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn request(&self, method: &str, params: serde_json::Value) -> EngineResult<serde_json::Value> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let resp = self.client.post(&self.url).json(&body).send().await?;
        let result: serde_json::Value = resp.json().await?;

        if let Some(error) = result.get("error") {
            return Err(EngineError::Rpc(error.to_string()));
        }

        result
            .get("result")
            .cloned()
            .ok_or_else(|| EngineError::Rpc("RPC response missing 'result' field".into()))
    }
}

/// Typed eth_* calls with a per-call client-side timeout.
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn RpcTransport>,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn RpcTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Low-level call bounded by the client timeout
    pub async fn call(&self, method: &str, params: serde_json::Value) -> EngineResult<serde_json::Value> {
        debug!("[dex] rpc {}", method);
        match tokio::time::timeout(self.timeout, self.transport.request(method, params)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout { operation: method.to_string(), secs: self.timeout.as_secs() }),
        }
    }

    async fn call_str(&self, method: &str, params: serde_json::Value) -> EngineResult<String> {
        let result = self.call(method, params).await?;
        result
            .as_str()
            .map(String::from)
            .ok_or_else(|| EngineError::Rpc(format!("{}: expected string result, got {}", method, result)))
    }

    async fn call_quantity(&self, method: &str, params: serde_json::Value) -> EngineResult<U256> {
        let hex = self.call_str(method, params).await?;
        Ok(parse_quantity(&hex)?)
    }

    pub async fn chain_id(&self) -> EngineResult<u64> {
        let id = self.call_quantity("eth_chainId", serde_json::json!([])).await?;
        u64::try_from(id).map_err(|_| EngineError::Rpc(format!("Chain id out of range: {}", id)))
    }

    /// Native balance of an address
    pub async fn get_balance(&self, address: &str) -> EngineResult<U256> {
        self.call_quantity("eth_getBalance", serde_json::json!([address, "latest"])).await
    }

    /// Call a contract (read-only); returns the raw hex result
    pub async fn eth_call(&self, to: &str, data: &[u8]) -> EngineResult<String> {
        self.call_str("eth_call", serde_json::json!([
            { "to": to, "data": hex_encode(data) },
            "latest"
        ]))
        .await
    }

    pub async fn gas_price(&self) -> EngineResult<U256> {
        self.call_quantity("eth_gasPrice", serde_json::json!([])).await
    }

    /// Next nonce, counting transactions still in the mempool
    pub async fn transaction_count(&self, address: &str) -> EngineResult<u64> {
        let count = self.call_quantity("eth_getTransactionCount", serde_json::json!([address, "pending"])).await?;
        u64::try_from(count).map_err(|_| EngineError::Rpc(format!("Nonce out of range: {}", count)))
    }

    /// Broadcast a signed transaction; returns the tx hash
    pub async fn send_raw_transaction(&self, signed_tx: &[u8]) -> EngineResult<String> {
        self.call_str("eth_sendRawTransaction", serde_json::json!([hex_encode(signed_tx)])).await
    }

    /// Receipt of a mined transaction, `None` while pending
    pub async fn transaction_receipt(&self, tx_hash: &str) -> EngineResult<Option<serde_json::Value>> {
        let result = self.call("eth_getTransactionReceipt", serde_json::json!([tx_hash])).await?;
        if result.is_null() { Ok(None) } else { Ok(Some(result)) }
    }
}
