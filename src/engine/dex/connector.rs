// Paw Agent Engine — DEX Network Connector
//
// One connector per chain, constructed explicitly by the caller. It owns
// the wallet, the RPC client, and the per-wallet submission queue, and
// hands out balance, price and swap operations. Connectors share nothing,
// so different chains trade fully in parallel.

use super::balance::BalanceReader;
use super::config::{NetworkConfig, CRED_PRIVATE_KEY};
use super::constants::chain_name;
use super::executor::{SubmissionQueue, SwapExecutor};
use super::primitives::parse_address;
use super::quoter::PriceQuoter;
use super::rpc::{HttpTransport, RpcClient, RpcTransport};
use super::tokens::TokenRegistry;
use super::wallet::Wallet;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{SwapResult, TokenPrice, WalletBalances};
use log::{info, warn};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct NetworkConnector {
    config: Arc<NetworkConfig>,
    wallet: Arc<Wallet>,
    balances: BalanceReader,
    quoter: PriceQuoter,
    executor: SwapExecutor,
    queue: SubmissionQueue,
    reference_rate: Arc<RwLock<Option<f64>>>,
}

impl std::fmt::Debug for NetworkConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkConnector")
            .field("network", &self.config.name)
            .field("chain_id", &self.config.chain_id)
            .field("wallet", &self.wallet.address())
            .finish_non_exhaustive()
    }
}

impl NetworkConnector {
    /// Connect over HTTP JSON-RPC to the configured endpoint.
    pub async fn initialize(config: NetworkConfig) -> EngineResult<Self> {
        let wallet = Self::prepare(&config)?;
        let endpoint = config.rpc_endpoint()?;
        let transport = HttpTransport::new(endpoint)
            .map_err(|e| EngineError::Connection(format!("{}: cannot build HTTP client: {}", config.name, e)))?;
        Self::connect(config, wallet, Arc::new(transport)).await
    }

    /// Connect through a caller-supplied transport.
    pub async fn with_transport(config: NetworkConfig, transport: Arc<dyn RpcTransport>) -> EngineResult<Self> {
        let wallet = Self::prepare(&config)?;
        Self::connect(config, wallet, transport).await
    }

    /// Offline checks: settings are well-formed and a usable key is present.
    fn prepare(config: &NetworkConfig) -> EngineResult<Wallet> {
        let key = config
            .signing_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| EngineError::config(format!("{}: no signing key ({})", config.name, CRED_PRIVATE_KEY)))?;
        config.validate()?;
        Wallet::from_private_key(key)
    }

    async fn connect(config: NetworkConfig, wallet: Wallet, transport: Arc<dyn RpcTransport>) -> EngineResult<Self> {
        let rpc = RpcClient::new(transport, config.timeouts.rpc_timeout());

        let chain_id = rpc
            .chain_id()
            .await
            .map_err(|e| EngineError::Connection(format!("{}: provider unreachable: {}", config.name, e)))?;
        if chain_id != config.chain_id {
            return Err(EngineError::config(format!(
                "{}: provider reports chain {} but config expects {}",
                config.name, chain_id, config.chain_id
            )));
        }

        let wallet = Arc::new(wallet);
        let tokens = Arc::new(TokenRegistry::with_known(&config.stable_tokens));
        let tracked = config
            .stable_tokens
            .iter()
            .filter_map(|t| parse_address(&t.address).ok())
            .collect();
        let balances = BalanceReader::new(
            rpc.clone(),
            *wallet.address_bytes(),
            config.native_symbol.clone(),
            tracked,
            tokens.clone(),
        );
        let quoter = PriceQuoter::new(
            rpc.clone(),
            config.router()?,
            config.factory()?,
            config.wrapped_native()?,
            tokens.clone(),
        );
        let queue = SubmissionQueue::new();
        let reference_rate = Arc::new(RwLock::new(config.native_usd_rate));
        let executor = SwapExecutor::new(
            &config,
            rpc,
            wallet.clone(),
            balances.clone(),
            quoter.clone(),
            tokens,
            queue.clone(),
            reference_rate.clone(),
        )?;

        info!(
            "[dex] Connected to {} (chain {}) as {}",
            chain_name(chain_id),
            chain_id,
            wallet.address()
        );

        Ok(Self { config: Arc::new(config), wallet, balances, quoter, executor, queue, reference_rate })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Signer handle for downstream operations.
    pub fn get_wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn quoter(&self) -> &PriceQuoter {
        &self.quoter
    }

    pub fn submission_queue(&self) -> &SubmissionQueue {
        &self.queue
    }

    /// Replace the approximate native→USD rate used for display figures.
    pub fn set_reference_rate(&self, rate: Option<f64>) {
        *self.reference_rate.write() = rate.filter(|r| r.is_finite() && *r > 0.0);
    }

    pub fn reference_rate(&self) -> Option<f64> {
        *self.reference_rate.read()
    }

    /// Native balance plus the configured stable tokens. A token that cannot
    /// be read shows up as zero.
    pub async fn get_balances(&self) -> EngineResult<WalletBalances> {
        self.balances.wallet_balances().await
    }

    /// Spot price of a token, or `None` if it cannot be quoted. Failures are
    /// logged, not returned.
    pub async fn get_token_price(&self, token_address: &str) -> Option<TokenPrice> {
        let token = match parse_address(token_address) {
            Ok(t) => t,
            Err(e) => {
                warn!("[dex] Price lookup for '{}' skipped: {}", token_address, e);
                return None;
            }
        };
        match self.quoter.quote_price(&token, self.reference_rate()).await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!("[dex] Price lookup for {} failed: {}", token_address, e);
                None
            }
        }
    }

    pub async fn execute_buy(&self, token_address: &str, wallet_percentage: f64) -> EngineResult<SwapResult> {
        self.executor.execute_buy(token_address, wallet_percentage).await
    }

    pub async fn execute_sell(&self, token_address: &str) -> EngineResult<SwapResult> {
        self.executor.execute_sell(token_address).await
    }
}
