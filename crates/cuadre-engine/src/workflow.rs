//! The settlement workflow: generation and confirmation.
//!
//! All writes go through the store's write guard, so generation is
//! serialized per tranche and confirmation per seller; the conditional
//! tranche-state transition inside [`EngineStore::begin_settlement`] keeps
//! the one-open-settlement invariant independent of lock granularity.
//! Reads share the guard and never block each other.
//!
//! The workflow performs no internal retries: every `create` assembles a
//! fresh snapshot of chain, investment, and surplus, so a caller that
//! retries a transient provider failure recomputes from current data.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cuadre_calc::{compute, SettlementInputs};
use cuadre_types::{
    CuadreError, EngineConfig, ErrorKind, Result, SellerId, Settlement, SettlementId,
    Tranche, TrancheId, TrancheState,
};
use rust_decimal::Decimal;

use crate::ports::{ChainProvider, InvestmentProvider, StockFeed};
use crate::store::EngineStore;
use crate::summary::Summary;

/// The stateful settlement engine.
pub struct SettlementWorkflow {
    config: EngineConfig,
    chains: Arc<dyn ChainProvider>,
    investments: Arc<dyn InvestmentProvider>,
    stock: Arc<dyn StockFeed>,
    store: RwLock<EngineStore>,
}

impl SettlementWorkflow {
    /// Create a workflow over the given providers.
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration is out of range.
    pub fn new(
        config: EngineConfig,
        chains: Arc<dyn ChainProvider>,
        investments: Arc<dyn InvestmentProvider>,
        stock: Arc<dyn StockFeed>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            chains,
            investments,
            stock,
            store: RwLock::new(EngineStore::new()),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn read_store(&self) -> RwLockReadGuard<'_, EngineStore> {
        self.store.read().expect("engine store poisoned")
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, EngineStore> {
        self.store.write().expect("engine store poisoned")
    }

    // -- tranche administration --------------------------------------------

    /// Register a tranche with the engine.
    pub fn register_tranche(&self, tranche: Tranche) -> Result<()> {
        self.write_store().register_tranche(tranche)
    }

    /// Hand a tranche's stock to its seller.
    pub fn release_tranche(&self, tranche_id: TrancheId) -> Result<()> {
        self.write_store().release_tranche(tranche_id)
    }

    /// Snapshot of one tranche.
    pub fn tranche(&self, tranche_id: TrancheId) -> Result<Tranche> {
        self.read_store().tranche(tranche_id).cloned()
    }

    // -- generation --------------------------------------------------------

    /// Generate a settlement for a tranche.
    ///
    /// Pulls a fresh stock reading, the seller's chain, the batch's
    /// investment split, and the carried surplus; computes the settlement;
    /// persists it Pending and moves the tranche to `InSettlement` in one
    /// atomic step. With `force`, an existing Pending settlement is voided
    /// first and the eligibility threshold is bypassed.
    ///
    /// # Errors
    /// - `TrancheNotFound` / `TrancheNotReleased`
    /// - `OpenSettlementExists` without `force`
    /// - `NoEligibleStock` above the threshold without `force`
    /// - chain/investment integrity errors; nothing is persisted
    pub fn create(&self, tranche_id: TrancheId, force: bool) -> Result<Settlement> {
        let mut store = self.write_store();

        // Validate the pre-state: a Released tranche with nothing open, or
        // (with force) an InSettlement tranche whose open settlement will
        // be voided below.
        let tranche = store.tranche(tranche_id)?.clone();
        let open = store.open_settlement(tranche_id).map(|s| s.id);
        if open.is_some() && !force {
            return Err(CuadreError::OpenSettlementExists(tranche_id));
        }
        match (tranche.state, open) {
            (TrancheState::Released, None) => {}
            (TrancheState::InSettlement, Some(_)) if force => {}
            (state, _) => {
                return Err(CuadreError::TrancheNotReleased {
                    tranche: tranche_id,
                    state,
                });
            }
        }

        // Fresh sales reading for the eligibility check and the collected
        // amount.
        let reading = self.stock.stock(tranche_id)?;
        let ratio = reading.ratio();
        if ratio > self.config.depletion_threshold && !force {
            return Err(CuadreError::NoEligibleStock {
                tranche: tranche_id,
                ratio,
                threshold: self.config.depletion_threshold,
            });
        }

        let seller_id = tranche.seller_id;
        let batch_id = tranche.batch_id;

        // Snapshot the remaining inputs and compute. Any integrity failure
        // aborts here with the store untouched.
        let chain = self.chains.chain_of(seller_id).inspect_err(|err| {
            tracing::error!(seller = %seller_id, %err, "chain fetch failed, aborting generation");
        })?;
        let investment = self.investments.investment_of(batch_id)?;
        let inputs = SettlementInputs {
            tranche_id,
            seller_id,
            collected: reading.collected,
            prior_surplus: store.prior_surplus(seller_id),
            investment_owed: investment.house_amount,
            chain,
            generation: store.next_generation(tranche_id),
        };
        let settlement = compute(&inputs, &self.config).inspect_err(|err| {
            if err.kind() == ErrorKind::DataIntegrity {
                tracing::error!(
                    tranche = %tranche_id,
                    seller = %seller_id,
                    %err,
                    "integrity failure during settlement computation"
                );
            }
        })?;

        // Mutations begin here, under the same write guard: sync the stock
        // reading, void the superseded settlement, persist the new one.
        store.record_stock(tranche_id, reading.remaining)?;
        if force {
            if let Some(voided) = store.void_open(tranche_id)? {
                tracing::warn!(
                    tranche = %tranche_id,
                    settlement = %voided,
                    "voided open settlement for forced regeneration"
                );
            }
        }
        store.begin_settlement(settlement.clone())?;

        tracing::info!(
            settlement = %settlement.id,
            tranche = %tranche_id,
            seller = %seller_id,
            model = %settlement.model,
            transfer_due = %settlement.transfer_due,
            "settlement generated"
        );
        Ok(settlement)
    }

    // -- confirmation ------------------------------------------------------

    /// Record the operator confirmation of a settlement.
    ///
    /// Computes the resulting surplus, applies it to the seller's ledger
    /// entry, and settles the tranche, all under one write guard; no
    /// intermediate state is ever observable and a validation failure
    /// leaves everything untouched.
    ///
    /// # Errors
    /// - `NegativeAmount` for a negative actual amount
    /// - `SettlementNotFound` / `AlreadyConfirmed` / `AlreadyVoided`
    pub fn confirm(
        &self,
        settlement_id: SettlementId,
        actual_amount: Decimal,
        note: Option<String>,
    ) -> Result<Settlement> {
        if actual_amount < Decimal::ZERO {
            return Err(CuadreError::NegativeAmount {
                field: "actual_amount",
                amount: actual_amount,
            });
        }
        let confirmed =
            self.write_store()
                .confirm_settlement(settlement_id, actual_amount, note)?;

        tracing::info!(
            settlement = %settlement_id,
            seller = %confirmed.seller_id,
            actual = %actual_amount,
            resulting_surplus = %confirmed
                .resulting_surplus
                .unwrap_or(Decimal::ZERO),
            "settlement confirmed"
        );
        Ok(confirmed)
    }

    // -- queries -----------------------------------------------------------

    /// One settlement by id.
    pub fn settlement(&self, settlement_id: SettlementId) -> Result<Settlement> {
        self.read_store().settlement(settlement_id).cloned()
    }

    /// All Pending settlements.
    #[must_use]
    pub fn list_pending(&self) -> Vec<Settlement> {
        self.read_store()
            .list_pending()
            .into_iter()
            .cloned()
            .collect()
    }

    /// All settlements for one seller, any state.
    #[must_use]
    pub fn list_by_seller(&self, seller_id: SellerId) -> Vec<Settlement> {
        self.read_store()
            .list_by_seller(seller_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Aggregate counts and totals.
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.read_store().summary()
    }

    /// Carried surplus for one seller.
    #[must_use]
    pub fn surplus_of(&self, seller_id: SellerId) -> Decimal {
        self.read_store().prior_surplus(seller_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{InMemoryChains, InMemoryInvestments, InMemoryStock};
    use cuadre_types::{BatchId, ChainHop, InvestmentSplit, SettlementState};

    struct Fixture {
        workflow: Arc<SettlementWorkflow>,
        chains: Arc<InMemoryChains>,
        investments: Arc<InMemoryInvestments>,
        stock: Arc<InMemoryStock>,
    }

    fn fixture() -> Fixture {
        let chains = Arc::new(InMemoryChains::new());
        let investments = Arc::new(InMemoryInvestments::new());
        let stock = Arc::new(InMemoryStock::new());
        let workflow = Arc::new(
            SettlementWorkflow::new(
                EngineConfig::default(),
                chains.clone(),
                investments.clone(),
                stock.clone(),
            )
            .unwrap(),
        );
        Fixture {
            workflow,
            chains,
            investments,
            stock,
        }
    }

    fn seed(f: &Fixture, tiers: &[u8], remaining: u32, collected: i64) -> Tranche {
        let seller = SellerId::new();
        let batch = BatchId::new();
        let tranche = Tranche::new(TrancheId::new(), batch, seller, 100);

        let mut chain: Vec<ChainHop> = tiers
            .iter()
            .map(|&t| ChainHop::new(SellerId::new(), t))
            .collect();
        chain[0].id = seller;
        f.chains.insert(seller, chain);
        f.investments.insert(
            batch,
            InvestmentSplit::new(Decimal::new(40_000, 0), Decimal::new(20_000, 0)),
        );
        f.stock
            .set(tranche.id, 100, remaining, Decimal::new(collected, 0));

        f.workflow.register_tranche(tranche.clone()).unwrap();
        f.workflow.release_tranche(tranche.id).unwrap();
        tranche
    }

    #[test]
    fn create_produces_pending_settlement() {
        let f = fixture();
        let tranche = seed(&f, &[2, 1], 10, 100_000);

        let settlement = f.workflow.create(tranche.id, false).unwrap();
        assert_eq!(settlement.state, SettlementState::Pending);
        assert_eq!(settlement.collected, Decimal::new(100_000, 0));
        assert_eq!(settlement.transfer_due, Decimal::new(64_000, 0));
        assert_eq!(
            f.workflow.tranche(tranche.id).unwrap().state,
            TrancheState::InSettlement
        );
        assert_eq!(f.workflow.list_pending().len(), 1);
    }

    #[test]
    fn create_unknown_tranche_fails() {
        let f = fixture();
        let err = f.workflow.create(TrancheId::new(), false).unwrap_err();
        assert!(matches!(err, CuadreError::TrancheNotFound(_)));
    }

    #[test]
    fn create_above_threshold_needs_force() {
        let f = fixture();
        let tranche = seed(&f, &[2, 1], 80, 20_000);

        let err = f.workflow.create(tranche.id, false).unwrap_err();
        assert!(matches!(err, CuadreError::NoEligibleStock { .. }));

        let settlement = f.workflow.create(tranche.id, true).unwrap();
        assert_eq!(settlement.state, SettlementState::Pending);
    }

    #[test]
    fn create_conflicts_without_force() {
        let f = fixture();
        let tranche = seed(&f, &[2, 1], 10, 100_000);
        f.workflow.create(tranche.id, false).unwrap();

        let err = f.workflow.create(tranche.id, false).unwrap_err();
        assert!(matches!(err, CuadreError::OpenSettlementExists(t) if t == tranche.id));
    }

    #[test]
    fn forced_regeneration_voids_predecessor() {
        let f = fixture();
        let tranche = seed(&f, &[2, 1], 10, 100_000);
        let first = f.workflow.create(tranche.id, false).unwrap();

        // More sales arrive before the regeneration.
        f.stock.set(tranche.id, 100, 5, Decimal::new(105_000, 0));
        let second = f.workflow.create(tranche.id, true).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(second.collected, Decimal::new(105_000, 0));
        assert_eq!(
            f.workflow.settlement(first.id).unwrap().state,
            SettlementState::Void
        );
        assert_eq!(f.workflow.list_pending().len(), 1);
    }

    #[test]
    fn chain_failure_aborts_without_persisting() {
        let f = fixture();
        let tranche = seed(&f, &[4, 3, 2, 1], 10, 100_000);
        // Corrupt the chain: depth over the cap.
        let over_depth: Vec<ChainHop> = std::iter::once(ChainHop::new(tranche.seller_id, 20))
            .chain((0..20u8).map(|i| ChainHop::new(SellerId::new(), 19 - i)))
            .collect();
        f.chains.insert(tranche.seller_id, over_depth);

        let err = f.workflow.create(tranche.id, false).unwrap_err();
        assert!(matches!(err, CuadreError::ChainDepthExceeded { .. }));
        assert_eq!(
            f.workflow.tranche(tranche.id).unwrap().state,
            TrancheState::Released
        );
        assert!(f.workflow.list_pending().is_empty());
    }

    #[test]
    fn confirm_negative_amount_rejected() {
        let f = fixture();
        let tranche = seed(&f, &[2, 1], 10, 100_000);
        let settlement = f.workflow.create(tranche.id, false).unwrap();

        let err = f
            .workflow
            .confirm(settlement.id, Decimal::new(-1, 0), None)
            .unwrap_err();
        assert!(matches!(
            err,
            CuadreError::NegativeAmount {
                field: "actual_amount",
                ..
            }
        ));
        // Untouched.
        assert_eq!(
            f.workflow.settlement(settlement.id).unwrap().state,
            SettlementState::Pending
        );
        assert_eq!(f.workflow.surplus_of(tranche.seller_id), Decimal::ZERO);
    }

    #[test]
    fn confirm_applies_surplus_once() {
        let f = fixture();
        let tranche = seed(&f, &[2, 1], 10, 100_000);
        let settlement = f.workflow.create(tranche.id, false).unwrap();

        let confirmed = f
            .workflow
            .confirm(settlement.id, Decimal::new(60_000, 0), None)
            .unwrap();
        assert_eq!(confirmed.resulting_surplus, Some(Decimal::new(-4_000, 0)));
        assert_eq!(
            f.workflow.surplus_of(tranche.seller_id),
            Decimal::new(-4_000, 0)
        );

        let err = f
            .workflow
            .confirm(settlement.id, Decimal::new(60_000, 0), None)
            .unwrap_err();
        assert!(matches!(err, CuadreError::AlreadyConfirmed(_)));
        assert_eq!(
            f.workflow.surplus_of(tranche.seller_id),
            Decimal::new(-4_000, 0),
            "ledger changed only on the first confirm"
        );
    }

    #[test]
    fn concurrent_creates_produce_one_settlement() {
        let f = fixture();
        let tranche = seed(&f, &[2, 1], 10, 100_000);

        let workflow = f.workflow.clone();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let workflow = workflow.clone();
                let tranche_id = tranche.id;
                std::thread::spawn(move || workflow.create(tranche_id, false))
            })
            .collect();

        let results: Vec<Result<Settlement>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one racing create may land");
        assert_eq!(f.workflow.list_pending().len(), 1);
        for r in results {
            if let Err(err) = r {
                assert!(matches!(err, CuadreError::OpenSettlementExists(_)));
            }
        }
    }

    #[test]
    fn list_by_seller_spans_states() {
        let f = fixture();
        let tranche = seed(&f, &[2, 1], 10, 100_000);
        let first = f.workflow.create(tranche.id, false).unwrap();
        let second = f.workflow.create(tranche.id, true).unwrap();
        f.workflow
            .confirm(second.id, Decimal::new(64_000, 0), None)
            .unwrap();

        let all = f.workflow.list_by_seller(tranche.seller_id);
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|s| s.id == first.id));
        assert!(all.iter().any(|s| s.state == SettlementState::Confirmed));
    }
}
