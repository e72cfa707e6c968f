// Paw Agent Engine — DEX Position Sizer

use super::primitives::mul_frac_floor;
use crate::atoms::constants::PERCENT_SCALE;
use crate::atoms::error::{EngineError, EngineResult};
use alloy_primitives::U256;

/// spend = floor((balance − gas_reserve) × percentage / 100)
///
/// Percentages are resolved to hundredths of a percent before the integer
/// multiply, so whole-number inputs are exact.
pub fn compute_spend_amount(native_balance: U256, gas_reserve: U256, wallet_percentage: f64) -> EngineResult<U256> {
    if !wallet_percentage.is_finite() || wallet_percentage <= 0.0 || wallet_percentage > 100.0 {
        return Err(EngineError::InvalidInput(format!(
            "wallet percentage must be in (0, 100], got {}",
            wallet_percentage
        )));
    }
    if native_balance <= gas_reserve {
        return Err(EngineError::InsufficientBalance {
            balance: native_balance.to_string(),
            reserve: gas_reserve.to_string(),
        });
    }
    let available = native_balance - gas_reserve;
    let scaled = (wallet_percentage * 100.0).round() as u64;
    Ok(mul_frac_floor(available, scaled, PERCENT_SCALE))
}
