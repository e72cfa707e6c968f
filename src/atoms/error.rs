// ── Paw Atoms: Error Types ─────────────────────────────────────────────────
// Single canonical error enum for the DEX core, built with `thiserror`.
//
// Design rules:
//   • Pre-submission variants (Config, Connection, NoLiquidity, sizing…)
//     guarantee that nothing was broadcast.
//   • Post-submission variants (Reverted, ConfirmationTimeout, AfterApproval)
//     mean gas and possibly allowance were already spent; see
//     `is_post_submission`.
//   • No variant carries secret material (private keys, provider keys).

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or malformed credentials / network settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The JSON-RPC provider could not be reached.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The factory has no pair for (token, wrapped native).
    #[error("No liquidity: no pool for token {token}")]
    NoLiquidity { token: String },

    /// Native balance does not cover the gas reserve.
    #[error("Insufficient balance: have {balance} wei, gas reserve is {reserve} wei")]
    InsufficientBalance { balance: String, reserve: String },

    /// Token balance is zero, nothing to sell.
    #[error("Nothing to sell: zero balance of {token}")]
    NothingToSell { token: String },

    /// The provider rejected the transaction before it was mined.
    #[error("Execution error: {0}")]
    Execution(String),

    /// The transaction was mined but reverted (gas was consumed).
    #[error("Transaction reverted: {tx_hash}")]
    Reverted { tx_hash: String },

    /// The transaction was broadcast but no receipt arrived in time.
    #[error("Confirmation timed out after {secs}s: {tx_hash}")]
    ConfirmationTimeout { tx_hash: String, secs: u64 },

    /// A sell failed after its approval was mined, so the router already
    /// holds an allowance for the balance.
    #[error("Failed after approval {approval_tx}: {source}")]
    AfterApproval { approval_tx: String, source: Box<EngineError> },

    /// Token metadata could not be read. Non-fatal for trades.
    #[error("Unknown token {token}: {reason}")]
    UnknownToken { token: String, reason: String },

    /// A remote call exceeded the client-side timeout.
    #[error("Timed out after {secs}s: {operation}")]
    Timeout { operation: String, secs: u64 },

    /// The provider answered with a JSON-RPC error object.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A contract returned data that does not match the expected ABI.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A caller-supplied argument is out of range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML configuration parse failure.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Filesystem failure while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for errors that do not yet have a dedicated variant.
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// True when the failure happened after a transaction was broadcast,
    /// so the caller must not assume a clean rollback.
    pub fn is_post_submission(&self) -> bool {
        matches!(self, Self::Reverted { .. } | Self::ConfirmationTimeout { .. } | Self::AfterApproval { .. })
    }
}

// ── String bridge ──────────────────────────────────────────────────────────
// Lets `ok_or("…")?` and the hex helpers (which return `Result<_, String>`)
// flow into `EngineResult`.

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All DEX operations return this type.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}
