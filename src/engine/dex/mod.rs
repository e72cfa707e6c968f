// Paw Agent Engine — DEX Swap Core (Uniswap V2 / PancakeSwap V2, EVM)
//
// One `NetworkConnector` per chain, built from a `NetworkConfig`:
//   constants  — router / factory / wrapped-native addresses, stable lists
//   config     — NetworkConfig / DexConfig (TOML + credential layering)
//   primitives — keccak256, hex, EIP-55 addresses, unit conversion
//   abi        — V2 router / factory / pair / ERC-20 call encoding + decoding
//   rlp        — RLP encoding for transaction serialisation
//   tx         — legacy EIP-155 transaction signing
//   rpc        — RpcTransport seam, HTTP JSON-RPC, timeout-bounded client
//   wallet     — signing key + address
//   tokens     — ERC-20 metadata cache
//   balance    — native / token balances and allowances
//   quoter     — pair lookup, reserves, spot price, expected output
//   slippage   — minOut bound
//   gas        — gas price × priority multiplier
//   sizing     — spend amount from balance, reserve and percentage
//   executor   — swap lifecycle, submission queue, buy / sell
//   connector  — per-network entry point

pub(crate) mod constants;
pub mod config;
pub(crate) mod primitives;
pub mod abi;
pub(crate) mod rlp;
pub(crate) mod tx;
pub mod rpc;
pub mod wallet;
pub mod tokens;
pub mod balance;
pub mod quoter;
pub mod slippage;
pub mod gas;
pub mod sizing;
pub mod executor;
pub mod connector;

#[cfg(test)]
pub(crate) mod mock;

pub use abi::function_selector;
pub use balance::BalanceReader;
pub use config::{DexConfig, NetworkConfig, StableToken, TimeoutConfig};
pub use connector::NetworkConnector;
pub use executor::{SubmissionQueue, SubmissionSlot, SwapExecutor, SwapLifecycle};
pub use gas::{apply_multiplier, GasPricingPolicy};
pub use quoter::{oriented_price, PriceQuoter};
pub use rpc::{HttpTransport, RpcClient, RpcTransport};
pub use sizing::compute_spend_amount;
pub use slippage::{compute_min_out, SlippageTolerance};
pub use tokens::TokenRegistry;
pub use wallet::Wallet;
