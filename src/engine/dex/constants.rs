// Paw Agent Engine — DEX Constants
// Contract addresses and stable-token lists for the preset networks.

/// (symbol, address, decimals)
pub(crate) type KnownToken = (&'static str, &'static str, u8);

// ── Ethereum mainnet (Uniswap V2) ──────────────────────────────────────────
pub(crate) const ETHEREUM_CHAIN_ID: u64 = 1;
pub(crate) const UNISWAP_V2_ROUTER: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";
pub(crate) const UNISWAP_V2_FACTORY: &str = "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f";
pub(crate) const WETH_ADDRESS: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
/// Hosted-node endpoint; the provider key is appended.
pub(crate) const INFURA_MAINNET_URL: &str = "https://mainnet.infura.io/v3/{key}";

pub(crate) const ETHEREUM_STABLES: &[KnownToken] = &[
    ("USDT", "0xdAC17F958D2ee523a2206206994597C13D831ec7", 6),
    ("USDC", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6),
];

// ── BNB Smart Chain (PancakeSwap V2) ───────────────────────────────────────
pub(crate) const BSC_CHAIN_ID: u64 = 56;
pub(crate) const PANCAKE_V2_ROUTER: &str = "0x10ED43C718714eb63d5aA57B58B43cEF1aB4F3c6";
pub(crate) const PANCAKE_V2_FACTORY: &str = "0xcA143Ce32Fe78f1f7019d7d551a6402fC5350c73";
pub(crate) const WBNB_ADDRESS: &str = "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c";
pub(crate) const BSC_PUBLIC_RPC: &str = "https://bsc-dataseed.binance.org/";

pub(crate) const BSC_STABLES: &[KnownToken] = &[
    ("USDT", "0x55d398326f99059fF775485246999027B3197955", 18),
    ("BUSD", "0xe9e7CEA3DedcA5984780Bafc599bD69ADd087D56", 18),
];

// ── Preset trading defaults ───────────────────────────────────────────────
pub(crate) const DEFAULT_GAS_RESERVE: &str = "0.01";
pub(crate) const DEFAULT_SLIPPAGE_TOLERANCE: f64 = 0.05;
pub(crate) const DEFAULT_GAS_MULTIPLIER: f64 = 1.1;

/// Returns the block explorer base TX URL for a given EVM chain ID.
pub(crate) fn explorer_tx_url(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "https://etherscan.io/tx/",
        11155111 => "https://sepolia.etherscan.io/tx/",
        56 => "https://bscscan.com/tx/",
        97 => "https://testnet.bscscan.com/tx/",
        137 => "https://polygonscan.com/tx/",
        42161 => "https://arbiscan.io/tx/",
        10 => "https://optimistic.etherscan.io/tx/",
        8453 => "https://basescan.org/tx/",
        _ => "https://etherscan.io/tx/",
    }
}

/// Returns a human-readable network name for a given EVM chain ID.
pub(crate) fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "Ethereum Mainnet",
        11155111 => "Sepolia Testnet",
        56 => "BNB Smart Chain",
        97 => "BSC Testnet",
        137 => "Polygon",
        42161 => "Arbitrum One",
        10 => "Optimism",
        8453 => "Base",
        _ => "Unknown",
    }
}
