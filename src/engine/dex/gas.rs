// Paw Agent Engine — DEX Gas Pricing Policy
//
// Reads the chain's gasPrice and scales it by the configured priority
// multiplier in integer space: × round(multiplier × 100) / 100.

use super::primitives::mul_frac_floor;
use super::rpc::RpcClient;
use crate::atoms::constants::GAS_MULTIPLIER_SCALE;
use crate::atoms::error::EngineResult;
use crate::atoms::types::GasPolicy;
use alloy_primitives::U256;
use log::debug;

/// base × round(multiplier × 100) / 100
pub fn apply_multiplier(base: U256, multiplier: f64) -> U256 {
    let scaled = (multiplier * GAS_MULTIPLIER_SCALE as f64).round().max(0.0) as u64;
    mul_frac_floor(base, scaled, GAS_MULTIPLIER_SCALE)
}

#[derive(Clone)]
pub struct GasPricingPolicy {
    rpc: RpcClient,
    multiplier: f64,
}

impl GasPricingPolicy {
    pub fn new(rpc: RpcClient, multiplier: f64) -> Self {
        Self { rpc, multiplier }
    }

    pub async fn fetch_base_gas_price(&self) -> EngineResult<U256> {
        self.rpc.gas_price().await
    }

    /// Resolve the gas settings for one submission with the given limit.
    pub async fn resolve(&self, gas_limit: u64) -> EngineResult<GasPolicy> {
        let base = self.fetch_base_gas_price().await?;
        let gas_price = apply_multiplier(base, self.multiplier);
        debug!("[dex] gas price {} → {} (×{})", base, gas_price, self.multiplier);
        Ok(GasPolicy { base_gas_price: base, multiplier: self.multiplier, gas_price, gas_limit })
    }
}
