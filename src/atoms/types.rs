// ── Paw Atoms: Pure Data Types ────────────────────────────────────────────────
// Plain struct/enum definitions shared by the DEX engine.
// Atoms layer rule: no I/O, no side effects, no imports from engine/.
//
// Every on-chain amount is a raw `U256` in the token's smallest unit.
// `f64` fields are display-only estimates and never reach a transaction.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ERC-20 metadata. Immutable for a deployed contract, so safe to cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub address: String,
    pub decimals: u8,
    pub symbol: String,
}

/// Snapshot of a constant-product pair. Never cached: reserves move every block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub pair: String,
    pub reserve0: U256,
    pub reserve1: U256,
    pub token0: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapDirection {
    Buy,
    Sell,
}

/// Lifecycle of one swap. `Confirmed`, `Reverted` and `TimedOut` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapState {
    Quoting,
    Approving,
    Submitted,
    Confirmed,
    Reverted,
    TimedOut,
}

impl SwapState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SwapState::Confirmed | SwapState::Reverted | SwapState::TimedOut)
    }
}

/// Result of a confirmed buy or sell.
///
/// Buy: `amount_in` is native spent, `amount_out` tokens received,
/// `price` the entry price (native per token).
/// Sell: `amount_in` is tokens sold, `amount_out` the minOut-guaranteed
/// native proceeds, `price` the exit price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapResult {
    pub direction: SwapDirection,
    /// e.g. "PEPE/ETH"
    pub pair: String,
    pub token: TokenDescriptor,
    pub amount_in: U256,
    pub amount_out: U256,
    pub expected_out: U256,
    pub min_out: U256,
    pub price: f64,
    /// Approximate, derived from the configured reference rate.
    pub price_usd: Option<f64>,
    pub gas_price: U256,
    pub tx_hash: String,
    pub explorer_url: String,
    pub status: SwapState,
    pub states: Vec<SwapState>,
    pub executed_at: DateTime<Utc>,
}

/// Spot price read from pool reserves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub token: String,
    pub symbol: String,
    pub price_native: f64,
    /// Approximate: native price × reference rate. Not authoritative.
    pub price_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
    pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalances {
    pub address: String,
    pub native_symbol: String,
    pub native: U256,
    pub tokens: Vec<TokenBalance>,
}

/// Gas settings resolved for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasPolicy {
    pub base_gas_price: U256,
    pub multiplier: f64,
    pub gas_price: U256,
    pub gas_limit: u64,
}
