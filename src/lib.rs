// OpenPawz DEX core
//
// Multi-chain AMM swap execution for the trading agent: quote a token
// against its wrapped-native pool, size a trade from the wallet balance,
// bound it with an on-chain minOut, price gas, then sign, submit and
// confirm the swap.
//
//   atoms  — shared constants, data types and the error enum
//   engine — chain-facing code (engine::dex for EVM V2 routers)
//
// Logging goes through the `log` facade; the host installs the logger.

pub mod atoms;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::types::{
    GasPolicy, PoolReserves, SwapDirection, SwapResult, SwapState, TokenBalance, TokenDescriptor, TokenPrice,
    WalletBalances,
};
pub use engine::dex::{
    apply_multiplier, compute_min_out, compute_spend_amount, DexConfig, GasPricingPolicy, HttpTransport,
    NetworkConfig, NetworkConnector, PriceQuoter, RpcTransport, SlippageTolerance, SubmissionQueue, SwapLifecycle,
    Wallet,
};
