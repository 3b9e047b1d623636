//! Surplus ledger — the carried balance between each seller and the house.
//!
//! The sole piece of mutable shared state in the engine. Each confirmed
//! settlement applies its delta exactly once: the apply is keyed by
//! settlement id, so a retried confirmation can never double-apply.

use std::collections::HashMap;

use cuadre_types::{SellerId, SettlementId, SurplusBalance};
use rust_decimal::Decimal;

/// Per-seller carried balance across settlement cycles.
#[derive(Debug, Default)]
pub struct SurplusLedger {
    balances: HashMap<SellerId, SurplusBalance>,
}

impl SurplusLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
        }
    }

    /// The carried amount for a seller; zero if the seller has no prior
    /// cycle.
    #[must_use]
    pub fn read(&self, seller_id: SellerId) -> Decimal {
        self.balances
            .get(&seller_id)
            .map_or(Decimal::ZERO, |b| b.amount)
    }

    /// The full balance record, if one exists.
    #[must_use]
    pub fn balance(&self, seller_id: SellerId) -> Option<&SurplusBalance> {
        self.balances.get(&seller_id)
    }

    /// Apply a confirmed settlement's surplus delta.
    ///
    /// Returns `true` if the delta was applied, `false` if this settlement
    /// id was already applied (idempotent replay — the balance is left
    /// untouched).
    pub fn apply(
        &mut self,
        seller_id: SellerId,
        settlement_id: SettlementId,
        delta: Decimal,
    ) -> bool {
        let entry = self
            .balances
            .entry(seller_id)
            .or_insert_with(|| SurplusBalance::zero(seller_id));
        if entry.last_applied == Some(settlement_id) {
            return false;
        }
        entry.amount += delta;
        entry.last_applied = Some(settlement_id);
        true
    }

    /// Sum of all carried balances (net position of the seller base).
    #[must_use]
    pub fn total_outstanding(&self) -> Decimal {
        self.balances.values().map(|b| b.amount).sum()
    }

    /// Number of sellers with a balance record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}
