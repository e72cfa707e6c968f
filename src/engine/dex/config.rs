// Paw Agent Engine — DEX Network Configuration
//
// One `NetworkConfig` per chain, immutable once a connector is built.
// Loaded from TOML (`[[networks]]` tables in a `DexConfig` file) or built
// from the Ethereum / BSC presets, with credentials layered on top from the
// skill credential map (DEX_PRIVATE_KEY, DEX_RPC_URL, DEX_PROVIDER_KEY).

use super::constants::{
    BSC_CHAIN_ID, BSC_PUBLIC_RPC, BSC_STABLES, DEFAULT_GAS_MULTIPLIER, DEFAULT_GAS_RESERVE,
    DEFAULT_SLIPPAGE_TOLERANCE, ETHEREUM_CHAIN_ID, ETHEREUM_STABLES, INFURA_MAINNET_URL, KnownToken,
    PANCAKE_V2_FACTORY, PANCAKE_V2_ROUTER, UNISWAP_V2_FACTORY, UNISWAP_V2_ROUTER, WBNB_ADDRESS, WETH_ADDRESS,
};
use super::primitives::{parse_address, parse_units};
use super::slippage::SlippageTolerance;
use crate::atoms::constants::{
    DEFAULT_APPROVE_GAS_LIMIT, DEFAULT_RECEIPT_POLL_MS, DEFAULT_RECEIPT_TIMEOUT_SECS, DEFAULT_RPC_TIMEOUT_SECS,
    DEFAULT_SWAP_GAS_LIMIT, NATIVE_DECIMALS,
};
use crate::atoms::error::{EngineError, EngineResult};
use alloy_primitives::U256;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use zeroize::Zeroize;

pub const CRED_PRIVATE_KEY: &str = "DEX_PRIVATE_KEY";
pub const CRED_RPC_URL: &str = "DEX_RPC_URL";
pub const CRED_PROVIDER_KEY: &str = "DEX_PROVIDER_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StableToken {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub rpc_secs: u64,
    pub receipt_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            rpc_secs: DEFAULT_RPC_TIMEOUT_SECS,
            receipt_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_RECEIPT_POLL_MS,
        }
    }
}

impl TimeoutConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_secs)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_native_symbol() -> String {
    "ETH".into()
}
fn default_gas_reserve() -> String {
    DEFAULT_GAS_RESERVE.into()
}
fn default_slippage() -> f64 {
    DEFAULT_SLIPPAGE_TOLERANCE
}
fn default_multiplier() -> f64 {
    DEFAULT_GAS_MULTIPLIER
}
fn default_swap_gas_limit() -> u64 {
    DEFAULT_SWAP_GAS_LIMIT
}
fn default_approve_gas_limit() -> u64 {
    DEFAULT_APPROVE_GAS_LIMIT
}

#[derive(Clone, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    /// Full endpoint. Takes precedence over the provider template.
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Hosted-node URL with a `{key}` placeholder.
    #[serde(default)]
    pub provider_url_template: Option<String>,
    #[serde(default)]
    pub provider_key: Option<String>,
    #[serde(default)]
    pub signing_key: Option<String>,
    pub router_address: String,
    pub factory_address: String,
    pub wrapped_native_address: String,
    #[serde(default = "default_native_symbol")]
    pub native_symbol: String,
    /// Native amount (decimal string, e.g. "0.01") kept back for gas.
    #[serde(default = "default_gas_reserve")]
    pub gas_reserve: String,
    #[serde(default = "default_slippage")]
    pub slippage_tolerance: f64,
    #[serde(default = "default_multiplier")]
    pub gas_priority_multiplier: f64,
    #[serde(default = "default_swap_gas_limit")]
    pub swap_gas_limit: u64,
    #[serde(default = "default_approve_gas_limit")]
    pub approve_gas_limit: u64,
    /// Approximate native→USD rate for display. Not authoritative.
    #[serde(default)]
    pub native_usd_rate: Option<f64>,
    #[serde(default)]
    pub stable_tokens: Vec<StableToken>,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("name", &self.name)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url)
            .field("provider_url_template", &self.provider_url_template)
            .field("provider_key", &self.provider_key.as_ref().map(|_| "<redacted>"))
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field("router_address", &self.router_address)
            .field("factory_address", &self.factory_address)
            .field("wrapped_native_address", &self.wrapped_native_address)
            .field("native_symbol", &self.native_symbol)
            .field("gas_reserve", &self.gas_reserve)
            .field("slippage_tolerance", &self.slippage_tolerance)
            .field("gas_priority_multiplier", &self.gas_priority_multiplier)
            .field("swap_gas_limit", &self.swap_gas_limit)
            .field("approve_gas_limit", &self.approve_gas_limit)
            .field("native_usd_rate", &self.native_usd_rate)
            .field("stable_tokens", &self.stable_tokens)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl Drop for NetworkConfig {
    fn drop(&mut self) {
        if let Some(key) = self.signing_key.as_mut() {
            key.zeroize();
        }
        if let Some(key) = self.provider_key.as_mut() {
            key.zeroize();
        }
    }
}

fn stables(list: &[KnownToken]) -> Vec<StableToken> {
    list.iter()
        .map(|(symbol, address, decimals)| StableToken {
            symbol: symbol.to_string(),
            address: address.to_string(),
            decimals: *decimals,
        })
        .collect()
}

impl NetworkConfig {
    fn preset(name: &str, chain_id: u64, router: &str, factory: &str, wrapped: &str, native_symbol: &str) -> Self {
        Self {
            name: name.into(),
            chain_id,
            rpc_url: None,
            provider_url_template: None,
            provider_key: None,
            signing_key: None,
            router_address: router.into(),
            factory_address: factory.into(),
            wrapped_native_address: wrapped.into(),
            native_symbol: native_symbol.into(),
            gas_reserve: default_gas_reserve(),
            slippage_tolerance: default_slippage(),
            gas_priority_multiplier: default_multiplier(),
            swap_gas_limit: default_swap_gas_limit(),
            approve_gas_limit: default_approve_gas_limit(),
            native_usd_rate: None,
            stable_tokens: Vec::new(),
            timeouts: TimeoutConfig::default(),
        }
    }

    /// Ethereum mainnet on Uniswap V2, reached through a hosted node.
    pub fn ethereum(provider_key: Option<String>) -> Self {
        let mut cfg = Self::preset("ethereum", ETHEREUM_CHAIN_ID, UNISWAP_V2_ROUTER, UNISWAP_V2_FACTORY, WETH_ADDRESS, "ETH");
        cfg.provider_url_template = Some(INFURA_MAINNET_URL.into());
        cfg.provider_key = provider_key;
        cfg.stable_tokens = stables(ETHEREUM_STABLES);
        cfg
    }

    /// BNB Smart Chain on PancakeSwap V2, public endpoint.
    pub fn bsc() -> Self {
        let mut cfg = Self::preset("bsc", BSC_CHAIN_ID, PANCAKE_V2_ROUTER, PANCAKE_V2_FACTORY, WBNB_ADDRESS, "BNB");
        cfg.rpc_url = Some(BSC_PUBLIC_RPC.into());
        cfg.gas_reserve = "0.005".into();
        cfg.stable_tokens = stables(BSC_STABLES);
        cfg
    }

    pub fn from_toml_str(source: &str) -> EngineResult<Self> {
        let cfg: Self = toml::from_str(source)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn with_signing_key(mut self, key: impl Into<String>) -> Self {
        self.signing_key = Some(key.into());
        self
    }

    /// Layer skill credentials over the file/preset values.
    pub fn with_credentials(mut self, creds: &HashMap<String, String>) -> Self {
        if let Some(key) = creds.get(CRED_PRIVATE_KEY) {
            self.signing_key = Some(key.clone());
        }
        if let Some(url) = creds.get(CRED_RPC_URL) {
            self.rpc_url = Some(url.clone());
        }
        if let Some(key) = creds.get(CRED_PROVIDER_KEY) {
            self.provider_key = Some(key.clone());
        }
        self
    }

    /// Resolve the JSON-RPC endpoint: explicit URL first, otherwise the
    /// hosted-node template, which needs a provider key.
    pub fn rpc_endpoint(&self) -> EngineResult<String> {
        if let Some(url) = self.rpc_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }
        let template = self
            .provider_url_template
            .as_deref()
            .ok_or_else(|| EngineError::config(format!("{}: no rpc_url or provider template configured", self.name)))?;
        let key = self
            .provider_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EngineError::config(format!("{}: hosted node requires a provider API key ({})", self.name, CRED_PROVIDER_KEY)))?;
        Ok(template.replace("{key}", key))
    }

    pub fn router(&self) -> EngineResult<[u8; 20]> {
        parse_address(&self.router_address).map_err(|e| EngineError::config(format!("router_address: {}", e)))
    }

    pub fn factory(&self) -> EngineResult<[u8; 20]> {
        parse_address(&self.factory_address).map_err(|e| EngineError::config(format!("factory_address: {}", e)))
    }

    pub fn wrapped_native(&self) -> EngineResult<[u8; 20]> {
        parse_address(&self.wrapped_native_address)
            .map_err(|e| EngineError::config(format!("wrapped_native_address: {}", e)))
    }

    pub fn gas_reserve_wei(&self) -> EngineResult<U256> {
        parse_units(&self.gas_reserve, NATIVE_DECIMALS).map_err(|e| EngineError::config(format!("gas_reserve: {}", e)))
    }

    pub fn slippage(&self) -> EngineResult<SlippageTolerance> {
        SlippageTolerance::from_fraction(self.slippage_tolerance)
            .map_err(|e| EngineError::config(format!("slippage_tolerance: {}", e)))
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.chain_id == 0 {
            return Err(EngineError::config(format!("{}: chain_id must be non-zero", self.name)));
        }
        self.router()?;
        self.factory()?;
        self.wrapped_native()?;
        self.gas_reserve_wei()?;
        self.slippage()?;
        if !self.gas_priority_multiplier.is_finite() || self.gas_priority_multiplier <= 0.0 {
            return Err(EngineError::config(format!(
                "{}: gas_priority_multiplier must be positive, got {}",
                self.name, self.gas_priority_multiplier
            )));
        }
        if self.swap_gas_limit == 0 || self.approve_gas_limit == 0 {
            return Err(EngineError::config(format!("{}: gas limits must be positive", self.name)));
        }
        if let Some(rate) = self.native_usd_rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(EngineError::config(format!("{}: native_usd_rate must be positive", self.name)));
            }
        }
        for token in &self.stable_tokens {
            parse_address(&token.address)
                .map_err(|e| EngineError::config(format!("stable token {}: {}", token.symbol, e)))?;
        }
        let t = &self.timeouts;
        if t.rpc_secs == 0 || t.receipt_secs == 0 || t.poll_interval_ms == 0 {
            return Err(EngineError::config(format!("{}: timeouts must be positive", self.name)));
        }
        Ok(())
    }
}

/// Multi-network file: a list of `[[networks]]` tables.
#[derive(Debug, Clone, Deserialize)]
pub struct DexConfig {
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
}

impl DexConfig {
    pub fn from_toml_str(source: &str) -> EngineResult<Self> {
        let cfg: Self = toml::from_str(source)?;
        for network in &cfg.networks {
            network.validate()?;
        }
        Ok(cfg)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn network(&self, name: &str) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.name.eq_ignore_ascii_case(name))
    }
}
