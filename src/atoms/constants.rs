// ── Paw Atoms: Constants ───────────────────────────────────────────────────
// Named constants for the swap core. Contract addresses and per-chain
// presets live in engine/dex/constants.rs; this file holds the numeric
// rules every chain shares.

// ── Swap timing ───────────────────────────────────────────────────────────
// The router rejects a mined swap whose deadline has passed. The deadline
// is recomputed for every submission and never reused.
pub const DEADLINE_WINDOW_SECS: u64 = 600;

// ── Gas budgets ───────────────────────────────────────────────────────────
pub const DEFAULT_SWAP_GAS_LIMIT: u64 = 300_000;
pub const DEFAULT_APPROVE_GAS_LIMIT: u64 = 100_000;

// ── Client-side timeouts ─────────────────────────────────────────────────
// Independent of the on-chain deadline: these bound how long we wait on
// the provider, not how long a mined tx may sit in the mempool.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 2_000;

// ── Fixed-point scales ───────────────────────────────────────────────────
/// Slippage tolerance is held in parts-per-million.
pub const SLIPPAGE_SCALE: u64 = 1_000_000;
/// Gas multiplier: multiply by round(m × 100), divide by 100.
pub const GAS_MULTIPLIER_SCALE: u64 = 100;
/// Wallet percentage is held in hundredths of a percent (50% → 5000).
pub const PERCENT_SCALE: u64 = 10_000;

// ── Token defaults ───────────────────────────────────────────────────────
pub const NATIVE_DECIMALS: u8 = 18;
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";
pub const NULL_ADDRESS: [u8; 20] = [0u8; 20];
