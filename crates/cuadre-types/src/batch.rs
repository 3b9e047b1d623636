//! Batch and investment-split types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::BatchId;

/// How a batch's total investment is split between the house and the seller.
///
/// The house share is what a settlement recoups before any profit is
/// distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentSplit {
    /// The house's share of the batch investment.
    pub house_amount: Decimal,
    /// The seller's share of the batch investment.
    pub seller_amount: Decimal,
}

impl InvestmentSplit {
    #[must_use]
    pub fn new(house_amount: Decimal, seller_amount: Decimal) -> Self {
        Self {
            house_amount,
            seller_amount,
        }
    }

    /// Total investment (house + seller).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.house_amount + self.seller_amount
    }
}

/// A production batch with its investment split and unit count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Globally unique batch identifier.
    pub id: BatchId,
    /// Investment split between house and seller.
    pub investment: InvestmentSplit,
    /// Number of units produced in this batch.
    pub unit_count: u32,
}

impl Batch {
    #[must_use]
    pub fn new(id: BatchId, investment: InvestmentSplit, unit_count: u32) -> Self {
        Self {
            id,
            investment,
            unit_count,
        }
    }
}
