// Paw Agent Engine — DEX Swap Executor
//
// Buy:  Quoting → Submitted → Confirmed | Reverted | TimedOut
// Sell: Quoting → Approving → Submitted → Confirmed | Reverted | TimedOut
//
// Quotes, balances and gas are read concurrently with other trades. The
// nonce → sign → broadcast step (and a sell's approval, which the swap
// depends on) runs under the wallet's `SubmissionQueue`, one at a time.
// Nothing here retries a failed submission: a retry needs a fresh quote
// and a fresh deadline, which is the caller's decision.

use super::abi::{encode_approve, encode_swap_exact_eth_for_tokens, encode_swap_exact_tokens_for_eth, transferred_to};
use super::balance::BalanceReader;
use super::config::{NetworkConfig, TimeoutConfig};
use super::constants::explorer_tx_url;
use super::gas::GasPricingPolicy;
use super::primitives::{format_address, format_units, parse_address, parse_quantity, units_to_f64};
use super::quoter::PriceQuoter;
use super::rpc::RpcClient;
use super::sizing::compute_spend_amount;
use super::slippage::{compute_min_out, SlippageTolerance};
use super::tokens::TokenRegistry;
use super::tx::{transaction_hash, LegacyTransaction};
use super::wallet::Wallet;
use crate::atoms::constants::{DEADLINE_WINDOW_SECS, NATIVE_DECIMALS};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{GasPolicy, SwapDirection, SwapResult, SwapState, TokenDescriptor};
use alloy_primitives::U256;
use chrono::Utc;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

// ── Submission queue ───────────────────────────────────────────────────────

/// Single-flight queue for one wallet's transactions. Waiters are served
/// in arrival order.
#[derive(Clone)]
pub struct SubmissionQueue {
    permits: Arc<Semaphore>,
}

/// Held while a transaction is being sequenced; dropping it lets the next
/// submission through.
pub struct SubmissionSlot {
    _permit: OwnedSemaphorePermit,
}

impl Default for SubmissionQueue {
    fn default() -> Self {
        Self { permits: Arc::new(Semaphore::new(1)) }
    }
}

impl SubmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self) -> EngineResult<SubmissionSlot> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EngineError::Other("submission queue closed".into()))?;
        Ok(SubmissionSlot { _permit: permit })
    }

    pub fn is_idle(&self) -> bool {
        self.permits.available_permits() == 1
    }
}

// ── Lifecycle ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SwapLifecycle {
    history: Vec<SwapState>,
}

impl Default for SwapLifecycle {
    fn default() -> Self {
        Self { history: vec![SwapState::Quoting] }
    }
}

impl SwapLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SwapState {
        self.history.last().copied().unwrap_or(SwapState::Quoting)
    }

    pub fn history(&self) -> &[SwapState] {
        &self.history
    }

    pub fn advance(&mut self, next: SwapState) -> EngineResult<()> {
        use SwapState::*;
        let from = self.state();
        let allowed = matches!(
            (from, next),
            (Quoting, Approving)
                | (Quoting, Submitted)
                | (Approving, Submitted)
                | (Approving, Reverted)
                | (Approving, TimedOut)
                | (Submitted, Confirmed)
                | (Submitted, Reverted)
                | (Submitted, TimedOut)
        );
        if !allowed {
            return Err(EngineError::Other(format!("illegal swap transition {:?} → {:?}", from, next)));
        }
        self.history.push(next);
        Ok(())
    }

    /// Move to the terminal state matching a post-submission error and
    /// hand the error back.
    fn fail(&mut self, err: EngineError) -> EngineError {
        let terminal = match &err {
            EngineError::Reverted { .. } => Some(SwapState::Reverted),
            EngineError::ConfirmationTimeout { .. } => Some(SwapState::TimedOut),
            _ => None,
        };
        if let Some(state) = terminal {
            if let Err(e) = self.advance(state) {
                warn!("[dex] {}", e);
            }
        }
        warn!("[dex] Swap failed in state {:?}: {}", self.state(), err);
        err
    }
}

fn enter(lifecycle: &mut SwapLifecycle, stage: SwapState) -> EngineResult<()> {
    if lifecycle.state() == stage {
        return Ok(());
    }
    lifecycle.advance(stage)
}

/// Router deadline for a transaction signed now.
pub(crate) fn swap_deadline() -> u64 {
    Utc::now().timestamp().max(0) as u64 + DEADLINE_WINDOW_SECS
}

fn parse_token(token_address: &str) -> EngineResult<[u8; 20]> {
    parse_address(token_address).map_err(|e| EngineError::InvalidInput(format!("token address: {}", e)))
}

/// Once an approval is mined, a later pre-broadcast failure still leaves
/// the allowance granted, so it is reported as post-submission.
fn after_approval(approval_tx: Option<&str>, err: EngineError) -> EngineError {
    match approval_tx {
        Some(tx) if !err.is_post_submission() => {
            EngineError::AfterApproval { approval_tx: tx.to_string(), source: Box::new(err) }
        }
        _ => err,
    }
}

// ── Executor ───────────────────────────────────────────────────────────────

pub struct SwapExecutor {
    rpc: RpcClient,
    wallet: Arc<Wallet>,
    chain_id: u64,
    native_symbol: String,
    router: [u8; 20],
    gas_reserve: U256,
    slippage: SlippageTolerance,
    swap_gas_limit: u64,
    approve_gas_limit: u64,
    timeouts: TimeoutConfig,
    balances: BalanceReader,
    quoter: PriceQuoter,
    gas: GasPricingPolicy,
    tokens: Arc<TokenRegistry>,
    queue: SubmissionQueue,
    reference_rate: Arc<RwLock<Option<f64>>>,
}

impl SwapExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &NetworkConfig,
        rpc: RpcClient,
        wallet: Arc<Wallet>,
        balances: BalanceReader,
        quoter: PriceQuoter,
        tokens: Arc<TokenRegistry>,
        queue: SubmissionQueue,
        reference_rate: Arc<RwLock<Option<f64>>>,
    ) -> EngineResult<Self> {
        Ok(Self {
            gas: GasPricingPolicy::new(rpc.clone(), config.gas_priority_multiplier),
            rpc,
            wallet,
            chain_id: config.chain_id,
            native_symbol: config.native_symbol.clone(),
            router: config.router()?,
            gas_reserve: config.gas_reserve_wei()?,
            slippage: config.slippage()?,
            swap_gas_limit: config.swap_gas_limit,
            approve_gas_limit: config.approve_gas_limit,
            timeouts: config.timeouts,
            balances,
            quoter,
            tokens,
            queue,
            reference_rate,
        })
    }

    /// Spend `wallet_percentage` of (native balance − gas reserve) on `token`.
    pub async fn execute_buy(&self, token_address: &str, wallet_percentage: f64) -> EngineResult<SwapResult> {
        let token = parse_token(token_address)?;
        let mut lifecycle = SwapLifecycle::new();

        // Quoting. A missing pool aborts before any balance or gas read.
        self.quoter.resolve_pair(&token).await?;
        let native_balance = self.balances.native_balance().await?;
        let spend = compute_spend_amount(native_balance, self.gas_reserve, wallet_percentage)?;
        if spend.is_zero() {
            return Err(EngineError::InvalidInput(format!("{}% of available balance rounds to zero", wallet_percentage)));
        }
        let path = self.quoter.buy_path(&token);
        let expected_out = self.quoter.quote_amount_out(spend, &path).await?;
        let min_out = compute_min_out(expected_out, self.slippage);
        let gas = self.gas.resolve(self.swap_gas_limit).await?;

        info!(
            "[dex] Buy {}: spend {} {} ({}% of available), quoted {} raw, min {} raw",
            format_address(&token),
            format_units(spend, NATIVE_DECIMALS),
            self.native_symbol,
            wallet_percentage,
            expected_out,
            min_out
        );

        let submitted = {
            let _slot = self.queue.acquire().await?;
            let data = encode_swap_exact_eth_for_tokens(min_out, &path, self.wallet.address_bytes(), swap_deadline());
            self.submit(self.router, spend, data, &gas, &mut lifecycle, SwapState::Submitted).await
        };
        let tx_hash = submitted.map_err(|e| lifecycle.fail(e))?;
        let receipt = self.confirm(&tx_hash, &mut lifecycle).await?;

        // Confirmed. The receipt's own Transfer logs are the amount received;
        // the wallet balance may include other trades in flight.
        let descriptor = self.tokens.describe_or_placeholder(&self.rpc, &token).await;
        let received = match transferred_to(&receipt, &token, self.wallet.address_bytes()) {
            Some(amount) => amount,
            None => {
                warn!("[dex] No Transfer to wallet in receipt {}, reporting minOut", tx_hash);
                min_out
            }
        };
        let spent = units_to_f64(spend, NATIVE_DECIMALS);
        let got = units_to_f64(received, descriptor.decimals);
        let entry_price = if got > 0.0 { spent / got } else { 0.0 };

        info!(
            "[dex] Bought {} {} for {} {} (tx {})",
            format_units(received, descriptor.decimals),
            descriptor.symbol,
            format_units(spend, NATIVE_DECIMALS),
            self.native_symbol,
            tx_hash
        );

        Ok(SwapResult {
            direction: SwapDirection::Buy,
            pair: self.pair_label(&descriptor),
            amount_in: spend,
            amount_out: received,
            expected_out,
            min_out,
            price: entry_price,
            price_usd: self.usd(entry_price),
            gas_price: gas.gas_price,
            explorer_url: self.explorer_url(&tx_hash),
            tx_hash,
            status: lifecycle.state(),
            states: lifecycle.history().to_vec(),
            executed_at: Utc::now(),
            token: descriptor,
        })
    }

    /// Sell the wallet's entire balance of `token` for native.
    pub async fn execute_sell(&self, token_address: &str) -> EngineResult<SwapResult> {
        let token = parse_token(token_address)?;
        let mut lifecycle = SwapLifecycle::new();

        // Quoting. An empty balance aborts before anything touches the chain.
        let amount = self.balances.token_balance(&token).await?;
        if amount.is_zero() {
            return Err(EngineError::NothingToSell { token: format_address(&token) });
        }
        self.quoter.resolve_pair(&token).await?;
        let descriptor = self.tokens.describe_or_placeholder(&self.rpc, &token).await;
        let path = self.quoter.sell_path(&token);

        info!("[dex] Sell {} {}", format_units(amount, descriptor.decimals), descriptor.symbol);

        let (tx_hash, expected_out, min_out, gas) = {
            let _slot = self.queue.acquire().await?;
            lifecycle.advance(SwapState::Approving)?;
            let approval_tx = match self.ensure_allowance(&token, amount, &mut lifecycle).await {
                Ok(approval_tx) => approval_tx,
                Err(e) => return Err(lifecycle.fail(e)),
            };

            let swap = async {
                let expected_out = self.quoter.quote_amount_out(amount, &path).await?;
                let min_out = compute_min_out(expected_out, self.slippage);
                let gas = self.gas.resolve(self.swap_gas_limit).await?;
                let data = encode_swap_exact_tokens_for_eth(
                    amount,
                    min_out,
                    &path,
                    self.wallet.address_bytes(),
                    swap_deadline(),
                );
                let tx_hash = self
                    .submit(self.router, U256::ZERO, data, &gas, &mut lifecycle, SwapState::Submitted)
                    .await?;
                Ok::<_, EngineError>((tx_hash, expected_out, min_out, gas))
            }
            .await;
            swap.map_err(|e| lifecycle.fail(after_approval(approval_tx.as_deref(), e)))?
        };
        self.confirm(&tx_hash, &mut lifecycle).await?;

        // The router guarantees at least minOut, so report that.
        let sold = units_to_f64(amount, descriptor.decimals);
        let proceeds = units_to_f64(min_out, NATIVE_DECIMALS);
        let exit_price = if sold > 0.0 { proceeds / sold } else { 0.0 };

        info!(
            "[dex] Sold {} {} for ≥{} {} (tx {})",
            format_units(amount, descriptor.decimals),
            descriptor.symbol,
            format_units(min_out, NATIVE_DECIMALS),
            self.native_symbol,
            tx_hash
        );

        Ok(SwapResult {
            direction: SwapDirection::Sell,
            pair: self.pair_label(&descriptor),
            amount_in: amount,
            amount_out: min_out,
            expected_out,
            min_out,
            price: exit_price,
            price_usd: self.usd(exit_price),
            gas_price: gas.gas_price,
            explorer_url: self.explorer_url(&tx_hash),
            tx_hash,
            status: lifecycle.state(),
            states: lifecycle.history().to_vec(),
            executed_at: Utc::now(),
            token: descriptor,
        })
    }

    /// Approve the router for exactly `amount` unless the current allowance
    /// already covers it, and wait for the approval to be mined. Returns the
    /// approval hash when one was sent.
    async fn ensure_allowance(
        &self,
        token: &[u8; 20],
        amount: U256,
        lifecycle: &mut SwapLifecycle,
    ) -> EngineResult<Option<String>> {
        let allowance = self.balances.allowance(token, &self.router).await?;
        if allowance >= amount {
            debug!("[dex] Existing allowance {} covers {}", allowance, amount);
            return Ok(None);
        }

        info!("[dex] Approving router for {} raw units of {}", amount, format_address(token));
        let gas = self.gas.resolve(self.approve_gas_limit).await?;
        let data = encode_approve(&self.router, amount);
        let approve_hash = self.submit(*token, U256::ZERO, data, &gas, lifecycle, SwapState::Approving).await?;
        info!("[dex] Approval tx: {}", approve_hash);
        self.wait_for_receipt(&approve_hash).await?;
        info!("[dex] Token approval confirmed");
        Ok(Some(approve_hash))
    }

    /// Nonce → sign → broadcast. Call with the submission slot held.
    ///
    /// A provider rejection is `Execution` (nothing was mined). A broadcast
    /// that times out may still have reached the mempool, so it is reported
    /// as `ConfirmationTimeout` with the locally computed hash.
    async fn submit(
        &self,
        to: [u8; 20],
        value: U256,
        data: Vec<u8>,
        gas: &GasPolicy,
        lifecycle: &mut SwapLifecycle,
        stage: SwapState,
    ) -> EngineResult<String> {
        let nonce = self.rpc.transaction_count(self.wallet.address()).await?;
        let tx = LegacyTransaction {
            chain_id: self.chain_id,
            nonce,
            gas_price: gas.gas_price,
            gas_limit: gas.gas_limit,
            to,
            value,
            data,
        };
        let raw = self.wallet.sign_transaction(&tx)?;
        let local_hash = transaction_hash(&raw);

        match self.rpc.send_raw_transaction(&raw).await {
            Ok(hash) => {
                enter(lifecycle, stage)?;
                info!("[dex] Broadcast {} (nonce {})", hash, nonce);
                Ok(hash)
            }
            Err(EngineError::Timeout { secs, .. }) => {
                enter(lifecycle, stage)?;
                warn!("[dex] Broadcast of {} timed out; it may still be mined", local_hash);
                Err(EngineError::ConfirmationTimeout { tx_hash: local_hash, secs })
            }
            Err(e) => Err(EngineError::Execution(e.to_string())),
        }
    }

    async fn confirm(&self, tx_hash: &str, lifecycle: &mut SwapLifecycle) -> EngineResult<Value> {
        match self.wait_for_receipt(tx_hash).await {
            Ok(receipt) => {
                lifecycle.advance(SwapState::Confirmed)?;
                Ok(receipt)
            }
            Err(e) => Err(lifecycle.fail(e)),
        }
    }

    /// Poll for the receipt for at most `receipt_secs`, in-flight polls
    /// included. Status 0x1 is success; any other status is a revert.
    async fn wait_for_receipt(&self, tx_hash: &str) -> EngineResult<Value> {
        let limit = self.timeouts.receipt_timeout();
        let poll = async {
            loop {
                match self.rpc.transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => {
                        let status = receipt
                            .get("status")
                            .and_then(|v| v.as_str())
                            .and_then(|s| parse_quantity(s).ok())
                            .unwrap_or(U256::ZERO);
                        return if status == U256::from(1u64) {
                            Ok(receipt)
                        } else {
                            Err(EngineError::Reverted { tx_hash: tx_hash.to_string() })
                        };
                    }
                    Ok(None) => {}
                    Err(e) => debug!("[dex] Receipt poll for {} failed: {}", tx_hash, e),
                }
                tokio::time::sleep(self.timeouts.poll_interval()).await;
            }
        };
        match tokio::time::timeout(limit, poll).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::ConfirmationTimeout { tx_hash: tx_hash.to_string(), secs: limit.as_secs() }),
        }
    }

    fn pair_label(&self, token: &TokenDescriptor) -> String {
        format!("{}/{}", token.symbol, self.native_symbol)
    }

    fn explorer_url(&self, tx_hash: &str) -> String {
        format!("{}{}", explorer_tx_url(self.chain_id), tx_hash)
    }

    fn usd(&self, price_native: f64) -> Option<f64> {
        (*self.reference_rate.read()).map(|rate| price_native * rate)
    }
}
