//! Provider interfaces for the data the engine consumes but does not own.
//!
//! The recruitment chain, investment splits, and stock readings come from
//! outside the engine. Each is behind a small trait so the workflow reads a
//! fresh snapshot per operation; the in-memory implementations back the test
//! suites and double as reference implementations.

use std::collections::HashMap;
use std::sync::RwLock;

use cuadre_types::{
    BatchId, ChainHop, CuadreError, InvestmentSplit, Result, SellerId, TrancheId,
};
use rust_decimal::Decimal;

/// A sales reading for one tranche: depletion counts plus the money the
/// seller has collected for the units sold so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    /// Units delivered to the seller.
    pub delivered: u32,
    /// Units still unsold.
    pub remaining: u32,
    /// Money collected for the sold units.
    pub collected: Decimal,
}

impl StockLevel {
    /// remaining / delivered. Zero delivered counts as fully depleted.
    #[must_use]
    pub fn ratio(&self) -> Decimal {
        if self.delivered == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.remaining) / Decimal::from(self.delivered)
    }
}

/// Supplies the pre-computed seller→root ancestor chain.
pub trait ChainProvider: Send + Sync {
    /// The ordered chain for a seller, seller first, root last.
    ///
    /// # Errors
    /// [`CuadreError::ChainUnavailable`] when no chain can be supplied.
    fn chain_of(&self, seller_id: SellerId) -> Result<Vec<ChainHop>>;
}

/// Supplies the house/seller investment split for a batch.
pub trait InvestmentProvider: Send + Sync {
    /// # Errors
    /// [`CuadreError::MissingInvestment`] when the batch has no split.
    fn investment_of(&self, batch_id: BatchId) -> Result<InvestmentSplit>;
}

/// Supplies stock-depletion readings.
pub trait StockFeed: Send + Sync {
    /// Current stock for one tranche.
    ///
    /// # Errors
    /// [`CuadreError::TrancheNotFound`] when the feed has no reading.
    fn stock(&self, tranche_id: TrancheId) -> Result<StockLevel>;

    /// Tranches whose depletion ratio is at or below `threshold`.
    fn list_below(&self, threshold: Decimal) -> Vec<TrancheId>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// In-memory chain provider.
#[derive(Debug, Default)]
pub struct InMemoryChains {
    chains: RwLock<HashMap<SellerId, Vec<ChainHop>>>,
}

impl InMemoryChains {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a seller's chain (seller first, root last).
    pub fn insert(&self, seller_id: SellerId, chain: Vec<ChainHop>) {
        self.chains
            .write()
            .expect("chain map poisoned")
            .insert(seller_id, chain);
    }
}

impl ChainProvider for InMemoryChains {
    fn chain_of(&self, seller_id: SellerId) -> Result<Vec<ChainHop>> {
        self.chains
            .read()
            .expect("chain map poisoned")
            .get(&seller_id)
            .cloned()
            .ok_or_else(|| CuadreError::ChainUnavailable {
                seller: seller_id,
                reason: "no chain registered".to_string(),
            })
    }
}

/// In-memory investment provider.
#[derive(Debug, Default)]
pub struct InMemoryInvestments {
    splits: RwLock<HashMap<BatchId, InvestmentSplit>>,
}

impl InMemoryInvestments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, batch_id: BatchId, split: InvestmentSplit) {
        self.splits
            .write()
            .expect("investment map poisoned")
            .insert(batch_id, split);
    }
}

impl InvestmentProvider for InMemoryInvestments {
    fn investment_of(&self, batch_id: BatchId) -> Result<InvestmentSplit> {
        self.splits
            .read()
            .expect("investment map poisoned")
            .get(&batch_id)
            .copied()
            .ok_or(CuadreError::MissingInvestment(batch_id))
    }
}

/// In-memory stock feed.
#[derive(Debug, Default)]
pub struct InMemoryStock {
    levels: RwLock<HashMap<TrancheId, StockLevel>>,
}

impl InMemoryStock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest reading for a tranche.
    pub fn set(&self, tranche_id: TrancheId, delivered: u32, remaining: u32, collected: Decimal) {
        self.levels.write().expect("stock map poisoned").insert(
            tranche_id,
            StockLevel {
                delivered,
                remaining,
                collected,
            },
        );
    }
}

impl StockFeed for InMemoryStock {
    fn stock(&self, tranche_id: TrancheId) -> Result<StockLevel> {
        self.levels
            .read()
            .expect("stock map poisoned")
            .get(&tranche_id)
            .copied()
            .ok_or(CuadreError::TrancheNotFound(tranche_id))
    }

    fn list_below(&self, threshold: Decimal) -> Vec<TrancheId> {
        let mut ids: Vec<TrancheId> = self
            .levels
            .read()
            .expect("stock map poisoned")
            .iter()
            .filter(|(_, level)| level.ratio() <= threshold)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_ratio() {
        let level = StockLevel {
            delivered: 100,
            remaining: 20,
            collected: Decimal::new(80_000, 0),
        };
        assert_eq!(level.ratio(), Decimal::new(2, 1));

        let empty = StockLevel {
            delivered: 0,
            remaining: 0,
            collected: Decimal::ZERO,
        };
        assert_eq!(empty.ratio(), Decimal::ZERO);
    }

    #[test]
    fn missing_chain_errors() {
        let chains = InMemoryChains::new();
        let err = chains.chain_of(SellerId::new()).unwrap_err();
        assert!(matches!(err, CuadreError::ChainUnavailable { .. }));
    }

    #[test]
    fn registered_chain_returned() {
        let chains = InMemoryChains::new();
        let seller = SellerId::new();
        let chain = vec![ChainHop::new(seller, 2), ChainHop::new(SellerId::new(), 1)];
        chains.insert(seller, chain.clone());
        assert_eq!(chains.chain_of(seller).unwrap(), chain);
    }

    #[test]
    fn missing_investment_errors() {
        let investments = InMemoryInvestments::new();
        let batch = BatchId::new();
        let err = investments.investment_of(batch).unwrap_err();
        assert!(matches!(err, CuadreError::MissingInvestment(b) if b == batch));
    }

    #[test]
    fn list_below_filters_on_ratio() {
        let stock = InMemoryStock::new();
        let depleted = TrancheId::new();
        let full = TrancheId::new();
        stock.set(depleted, 100, 15, Decimal::new(85_000, 0));
        stock.set(full, 100, 80, Decimal::new(20_000, 0));

        let eligible = stock.list_below(Decimal::new(2, 1));
        assert_eq!(eligible, vec![depleted]);
    }

    #[test]
    fn list_below_threshold_is_inclusive() {
        let stock = InMemoryStock::new();
        let at_threshold = TrancheId::new();
        stock.set(at_threshold, 100, 20, Decimal::new(80_000, 0));
        assert_eq!(stock.list_below(Decimal::new(2, 1)), vec![at_threshold]);
    }
}
