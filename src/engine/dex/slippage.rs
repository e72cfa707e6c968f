// Paw Agent Engine — DEX Slippage Guard
//
// Turns a quoted output into the amountOutMin passed to the router, so the
// chain itself reverts a swap that would fill below the bound.

use super::primitives::mul_frac_floor;
use crate::atoms::constants::SLIPPAGE_SCALE;
use alloy_primitives::U256;

/// Slippage tolerance as a fraction in (0, 1), held in parts-per-million.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlippageTolerance {
    ppm: u64,
}

impl SlippageTolerance {
    pub fn from_fraction(fraction: f64) -> Result<Self, String> {
        if !fraction.is_finite() || fraction <= 0.0 || fraction >= 1.0 {
            return Err(format!("tolerance must be in (0, 1), got {}", fraction));
        }
        let ppm = (fraction * SLIPPAGE_SCALE as f64).round() as u64;
        Ok(Self { ppm: ppm.min(SLIPPAGE_SCALE - 1) })
    }

    pub fn ppm(&self) -> u64 {
        self.ppm
    }

    pub fn as_fraction(&self) -> f64 {
        self.ppm as f64 / SLIPPAGE_SCALE as f64
    }
}

/// minOut = floor(quoted × (1 − tolerance)), always ≤ quoted.
pub fn compute_min_out(quoted_out: U256, tolerance: SlippageTolerance) -> U256 {
    mul_frac_floor(quoted_out, SLIPPAGE_SCALE - tolerance.ppm, SLIPPAGE_SCALE)
}
