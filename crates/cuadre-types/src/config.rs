//! Engine configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{constants, money, CuadreError, Result};

/// Tunables for the settlement engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// A tranche becomes eligible when remaining/delivered is at or below
    /// this ratio.
    pub depletion_threshold: Decimal,
    /// Seller share of gross profit under the flat (tier-2) split.
    pub flat_seller_pct: Decimal,
    /// Per-hop retention ratio under the cascade (tier ≥ 3) split.
    pub cascade_ratio: Decimal,
    /// Maximum ancestor-chain length tolerated before the chain is treated
    /// as corrupt.
    pub max_chain_depth: usize,
    /// Decimal places of the smallest currency unit.
    pub currency_scale: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depletion_threshold: money::ratio_from_bps(constants::DEFAULT_DEPLETION_THRESHOLD_BPS),
            flat_seller_pct: money::ratio_from_bps(constants::DEFAULT_FLAT_SELLER_PCT_BPS),
            cascade_ratio: money::ratio_from_bps(constants::DEFAULT_CASCADE_RATIO_BPS),
            max_chain_depth: constants::MAX_CHAIN_DEPTH,
            currency_scale: constants::CURRENCY_SCALE,
        }
    }
}

impl EngineConfig {
    /// Validate ranges: ratios strictly inside (0, 1), threshold in [0, 1],
    /// a chain depth that admits at least seller and root.
    pub fn validate(&self) -> Result<()> {
        if self.depletion_threshold < Decimal::ZERO || self.depletion_threshold > Decimal::ONE {
            return Err(CuadreError::InvalidConfig {
                reason: format!(
                    "depletion_threshold {} outside [0, 1]",
                    self.depletion_threshold
                ),
            });
        }
        for (name, ratio) in [
            ("flat_seller_pct", self.flat_seller_pct),
            ("cascade_ratio", self.cascade_ratio),
        ] {
            if ratio <= Decimal::ZERO || ratio >= Decimal::ONE {
                return Err(CuadreError::InvalidConfig {
                    reason: format!("{name} {ratio} outside (0, 1)"),
                });
            }
        }
        if self.max_chain_depth < 2 {
            return Err(CuadreError::InvalidConfig {
                reason: format!("max_chain_depth {} below 2", self.max_chain_depth),
            });
        }
        Ok(())
    }
}
