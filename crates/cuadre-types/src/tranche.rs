//! Tranche lifecycle and stock-depletion types.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐ release  ┌──────────┐ settlement  ┌──────────────┐ confirm ┌─────────┐
//!   │ PENDING ├─────────▶│ RELEASED ├────────────▶│ IN_SETTLEMENT├────────▶│ SETTLED │
//!   └─────────┘          └──────────┘   created   └──────┬───────┘         └─────────┘
//!                              ▲                         │ settlement voided
//!                              └─────────────────────────┘
//! ```
//!
//! Stock counts and the lifecycle state are owned by the tranche and mutated
//! only through the transitions below; there is no back door.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BatchId, CuadreError, Result, SellerId, TrancheId};

/// The lifecycle state of a tranche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrancheState {
    /// Created, stock not yet handed to the seller.
    Pending,
    /// Stock delivered; selling (and depletion) in progress.
    Released,
    /// An open settlement exists for this tranche.
    InSettlement,
    /// The settlement was confirmed. Terminal.
    Settled,
}

impl TrancheState {
    /// Can this tranche transition to the given target state?
    ///
    /// `InSettlement → Released` is the void path: a forced regeneration
    /// voids the open settlement and returns the tranche to `Released`
    /// before the replacement is computed.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Released)
                | (Self::Released, Self::InSettlement)
                | (Self::InSettlement, Self::Settled | Self::Released)
        )
    }
}

impl std::fmt::Display for TrancheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Released => write!(f, "RELEASED"),
            Self::InSettlement => write!(f, "IN_SETTLEMENT"),
            Self::Settled => write!(f, "SETTLED"),
        }
    }
}

/// A released portion of a batch's stock assigned to one seller, tracked
/// for depletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tranche {
    /// Globally unique tranche identifier.
    pub id: TrancheId,
    /// The batch this tranche draws from.
    pub batch_id: BatchId,
    /// The seller holding this tranche's stock.
    pub seller_id: SellerId,
    /// Units delivered to the seller.
    pub delivered: u32,
    /// Units still unsold.
    pub remaining: u32,
    /// Current lifecycle state.
    pub state: TrancheState,
}

impl Tranche {
    /// Create a tranche in `Pending` with all delivered units remaining.
    #[must_use]
    pub fn new(id: TrancheId, batch_id: BatchId, seller_id: SellerId, delivered: u32) -> Self {
        Self {
            id,
            batch_id,
            seller_id,
            delivered,
            remaining: delivered,
            state: TrancheState::Pending,
        }
    }

    /// remaining / delivered. Zero delivered counts as fully depleted.
    #[must_use]
    pub fn depletion_ratio(&self) -> Decimal {
        if self.delivered == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.remaining) / Decimal::from(self.delivered)
    }

    /// Record a stock reading from the feed. Remaining can only shrink and
    /// never exceeds delivered.
    pub fn record_stock(&mut self, remaining: u32) -> Result<()> {
        if remaining > self.delivered {
            return Err(CuadreError::InvalidInput {
                reason: format!(
                    "remaining {remaining} exceeds delivered {} on tranche {}",
                    self.delivered, self.id
                ),
            });
        }
        if remaining > self.remaining {
            return Err(CuadreError::InvalidInput {
                reason: format!(
                    "remaining cannot grow ({} -> {remaining}) on tranche {}",
                    self.remaining, self.id
                ),
            });
        }
        self.remaining = remaining;
        Ok(())
    }

    fn transition(&mut self, target: TrancheState) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(CuadreError::InvalidTrancheTransition {
                tranche: self.id,
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        Ok(())
    }

    /// Hand the stock to the seller: `Pending → Released`.
    pub fn mark_released(&mut self) -> Result<()> {
        self.transition(TrancheState::Released)
    }

    /// An open settlement now exists: `Released → InSettlement`.
    pub fn mark_in_settlement(&mut self) -> Result<()> {
        self.transition(TrancheState::InSettlement)
    }

    /// The open settlement was voided: `InSettlement → Released`.
    pub fn mark_settlement_voided(&mut self) -> Result<()> {
        self.transition(TrancheState::Released)
    }

    /// The settlement was confirmed: `InSettlement → Settled`.
    pub fn mark_settled(&mut self) -> Result<()> {
        self.transition(TrancheState::Settled)
    }
}
