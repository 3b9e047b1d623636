//! Carried surplus balance between a seller and the house.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{SellerId, SettlementId};

/// The carried balance for one seller across settlement cycles.
///
/// Negative means the seller owes the house (a shortfall carried as debt).
/// `last_applied` keys the idempotent apply: a settlement id that matches
/// it has already been folded into `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurplusBalance {
    /// The seller this balance belongs to.
    pub seller_id: SellerId,
    /// Signed carried amount (negative = debt).
    pub amount: Decimal,
    /// The settlement whose delta was applied last.
    pub last_applied: Option<SettlementId>,
}

impl SurplusBalance {
    /// A zero balance for a seller with no prior cycle.
    #[must_use]
    pub fn zero(seller_id: SellerId) -> Self {
        Self {
            seller_id,
            amount: Decimal::ZERO,
            last_applied: None,
        }
    }

    /// Whether the carried amount is a debt.
    #[must_use]
    pub fn is_debt(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}
