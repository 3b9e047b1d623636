//! Engine state: tranches, settlements, and the surplus ledger.
//!
//! `EngineStore` is the strongly consistent record the workflow operates
//! on. It owns every lifecycle transition; the one-open-settlement-per-
//! tranche invariant is enforced here by the conditional tranche-state
//! transition in [`EngineStore::begin_settlement`], not by callers
//! remembering to check first. All methods validate before mutating, so a
//! failed call leaves the store untouched.

use std::collections::HashMap;

use cuadre_types::{
    CuadreError, Result, SellerId, Settlement, SettlementId, SettlementState, Tranche,
    TrancheId, TrancheState,
};
use rust_decimal::Decimal;

use crate::ledger::SurplusLedger;
use crate::summary::Summary;

/// In-memory store for tranche state, settlements, and carried surpluses.
#[derive(Debug, Default)]
pub struct EngineStore {
    tranches: HashMap<TrancheId, Tranche>,
    settlements: HashMap<SettlementId, Settlement>,
    /// The open (Pending) settlement per tranche, if any.
    open_by_tranche: HashMap<TrancheId, SettlementId>,
    /// How many settlements have been generated per tranche (void included).
    generations: HashMap<TrancheId, u32>,
    ledger: SurplusLedger,
}

impl EngineStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- tranches ----------------------------------------------------------

    /// Register a new tranche.
    pub fn register_tranche(&mut self, tranche: Tranche) -> Result<()> {
        if self.tranches.contains_key(&tranche.id) {
            return Err(CuadreError::InvalidInput {
                reason: format!("tranche {} already registered", tranche.id),
            });
        }
        self.tranches.insert(tranche.id, tranche);
        Ok(())
    }

    /// Hand a tranche's stock to its seller.
    pub fn release_tranche(&mut self, tranche_id: TrancheId) -> Result<()> {
        self.tranche_mut(tranche_id)?.mark_released()
    }

    /// Record a stock reading.
    pub fn record_stock(&mut self, tranche_id: TrancheId, remaining: u32) -> Result<()> {
        self.tranche_mut(tranche_id)?.record_stock(remaining)
    }

    pub fn tranche(&self, tranche_id: TrancheId) -> Result<&Tranche> {
        self.tranches
            .get(&tranche_id)
            .ok_or(CuadreError::TrancheNotFound(tranche_id))
    }

    fn tranche_mut(&mut self, tranche_id: TrancheId) -> Result<&mut Tranche> {
        self.tranches
            .get_mut(&tranche_id)
            .ok_or(CuadreError::TrancheNotFound(tranche_id))
    }

    // -- settlements -------------------------------------------------------

    /// The generation counter for the next settlement of this tranche.
    #[must_use]
    pub fn next_generation(&self, tranche_id: TrancheId) -> u32 {
        self.generations.get(&tranche_id).copied().unwrap_or(0)
    }

    /// The open (Pending) settlement for a tranche, if any.
    #[must_use]
    pub fn open_settlement(&self, tranche_id: TrancheId) -> Option<&Settlement> {
        self.open_by_tranche
            .get(&tranche_id)
            .and_then(|id| self.settlements.get(id))
    }

    /// Persist a freshly computed Pending settlement and move its tranche
    /// to `InSettlement`.
    ///
    /// The tranche-state transition is the compare-and-swap that enforces
    /// the single-open-settlement invariant: a tranche that is not
    /// `Released` rejects the move, so two racing generations cannot both
    /// land.
    pub fn begin_settlement(&mut self, settlement: Settlement) -> Result<()> {
        if self.open_by_tranche.contains_key(&settlement.tranche_id) {
            return Err(CuadreError::OpenSettlementExists(settlement.tranche_id));
        }
        if settlement.state != SettlementState::Pending {
            return Err(CuadreError::Internal(format!(
                "begin_settlement with non-pending settlement {}",
                settlement.id
            )));
        }
        // Conditional transition: only a Released tranche admits a new
        // settlement. Fails before anything is persisted.
        self.tranche_mut(settlement.tranche_id)?.mark_in_settlement()?;

        *self.generations.entry(settlement.tranche_id).or_insert(0) += 1;
        self.open_by_tranche
            .insert(settlement.tranche_id, settlement.id);
        self.settlements.insert(settlement.id, settlement);
        Ok(())
    }

    /// Void the open settlement of a tranche, returning its id, or `None`
    /// if the tranche has no open settlement. The tranche returns to
    /// `Released`.
    pub fn void_open(&mut self, tranche_id: TrancheId) -> Result<Option<SettlementId>> {
        let Some(&open_id) = self.open_by_tranche.get(&tranche_id) else {
            return Ok(None);
        };
        // Validate both transitions before mutating either record.
        let tranche = self.tranche(tranche_id)?;
        if !tranche.state.can_transition_to(TrancheState::Released) {
            return Err(CuadreError::InvalidTrancheTransition {
                tranche: tranche_id,
                from: tranche.state,
                to: TrancheState::Released,
            });
        }
        self.settlements
            .get_mut(&open_id)
            .ok_or(CuadreError::SettlementNotFound(open_id))?
            .mark_void()?;
        self.tranche_mut(tranche_id)?.mark_settlement_voided()?;
        self.open_by_tranche.remove(&tranche_id);
        Ok(Some(open_id))
    }

    /// Confirm a Pending settlement: record the actual transfer, apply the
    /// surplus delta to the ledger, and settle the tranche — atomically.
    ///
    /// Every precondition is checked before the first mutation, so a
    /// failure leaves settlement, tranche, and ledger exactly as they were.
    pub fn confirm_settlement(
        &mut self,
        settlement_id: SettlementId,
        actual_amount: Decimal,
        note: Option<String>,
    ) -> Result<Settlement> {
        let settlement = self
            .settlements
            .get(&settlement_id)
            .ok_or(CuadreError::SettlementNotFound(settlement_id))?;
        match settlement.state {
            SettlementState::Pending => {}
            SettlementState::Confirmed => {
                return Err(CuadreError::AlreadyConfirmed(settlement_id));
            }
            SettlementState::Void => return Err(CuadreError::AlreadyVoided(settlement_id)),
        }
        let tranche_id = settlement.tranche_id;
        let seller_id = settlement.seller_id;
        let resulting = cuadre_calc::resulting_surplus(settlement, actual_amount);

        let tranche = self.tranche(tranche_id)?;
        if !tranche.state.can_transition_to(TrancheState::Settled) {
            return Err(CuadreError::InvalidTrancheTransition {
                tranche: tranche_id,
                from: tranche.state,
                to: TrancheState::Settled,
            });
        }

        // All checks passed; none of the transitions below can refuse.
        let settlement = self
            .settlements
            .get_mut(&settlement_id)
            .ok_or(CuadreError::SettlementNotFound(settlement_id))?;
        settlement.mark_confirmed(actual_amount, resulting, note)?;
        let confirmed = settlement.clone();

        self.tranche_mut(tranche_id)?.mark_settled()?;
        self.ledger.apply(seller_id, settlement_id, resulting);
        self.open_by_tranche.remove(&tranche_id);

        Ok(confirmed)
    }

    pub fn settlement(&self, settlement_id: SettlementId) -> Result<&Settlement> {
        self.settlements
            .get(&settlement_id)
            .ok_or(CuadreError::SettlementNotFound(settlement_id))
    }

    /// All Pending settlements, oldest first.
    #[must_use]
    pub fn list_pending(&self) -> Vec<&Settlement> {
        let mut out: Vec<&Settlement> = self
            .settlements
            .values()
            .filter(|s| s.state == SettlementState::Pending)
            .collect();
        out.sort_unstable_by_key(|s| (s.created_at, s.id));
        out
    }

    /// All settlements for a seller, any state, oldest first.
    #[must_use]
    pub fn list_by_seller(&self, seller_id: SellerId) -> Vec<&Settlement> {
        let mut out: Vec<&Settlement> = self
            .settlements
            .values()
            .filter(|s| s.seller_id == seller_id)
            .collect();
        out.sort_unstable_by_key(|s| (s.created_at, s.id));
        out
    }

    // -- ledger ------------------------------------------------------------

    /// The carried surplus for a seller (zero without a prior cycle).
    #[must_use]
    pub fn prior_surplus(&self, seller_id: SellerId) -> Decimal {
        self.ledger.read(seller_id)
    }

    #[must_use]
    pub fn ledger(&self) -> &SurplusLedger {
        &self.ledger
    }

    // -- summary -----------------------------------------------------------

    /// Aggregate counts and totals across settlement states.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for s in self.settlements.values() {
            match s.state {
                SettlementState::Pending => {
                    summary.pending += 1;
                    summary.total_due_pending += s.transfer_due;
                }
                SettlementState::Confirmed => {
                    summary.confirmed += 1;
                    summary.total_collected += s.collected;
                    summary.total_transferred +=
                        s.actual_transferred.unwrap_or(Decimal::ZERO);
                }
                SettlementState::Void => summary.voided += 1,
            }
        }
        summary.total_outstanding_surplus = self.ledger.total_outstanding();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuadre_calc::{compute, SettlementInputs};
    use cuadre_types::{BatchId, ChainHop, EngineConfig};

    fn released_tranche(store: &mut EngineStore) -> Tranche {
        let tranche = Tranche::new(TrancheId::new(), BatchId::new(), SellerId::new(), 100);
        store.register_tranche(tranche.clone()).unwrap();
        store.release_tranche(tranche.id).unwrap();
        store.tranche(tranche.id).unwrap().clone()
    }

    fn pending_settlement(tranche: &Tranche, generation: u32) -> Settlement {
        let chain = vec![
            ChainHop::new(tranche.seller_id, 2),
            ChainHop::new(SellerId::new(), 1),
        ];
        compute(
            &SettlementInputs {
                tranche_id: tranche.id,
                seller_id: tranche.seller_id,
                collected: Decimal::new(100_000, 0),
                prior_surplus: Decimal::ZERO,
                investment_owed: Decimal::new(40_000, 0),
                chain,
                generation,
            },
            &EngineConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn begin_settlement_flips_tranche() {
        let mut store = EngineStore::new();
        let tranche = released_tranche(&mut store);
        let settlement = pending_settlement(&tranche, 0);
        let id = settlement.id;

        store.begin_settlement(settlement).unwrap();
        assert_eq!(
            store.tranche(tranche.id).unwrap().state,
            TrancheState::InSettlement
        );
        assert_eq!(store.open_settlement(tranche.id).unwrap().id, id);
        assert_eq!(store.next_generation(tranche.id), 1);
    }

    #[test]
    fn second_open_settlement_rejected() {
        let mut store = EngineStore::new();
        let tranche = released_tranche(&mut store);
        store.begin_settlement(pending_settlement(&tranche, 0)).unwrap();

        let err = store
            .begin_settlement(pending_settlement(&tranche, 1))
            .unwrap_err();
        assert!(matches!(err, CuadreError::OpenSettlementExists(t) if t == tranche.id));
    }

    #[test]
    fn begin_on_unreleased_tranche_rejected() {
        let mut store = EngineStore::new();
        let tranche = Tranche::new(TrancheId::new(), BatchId::new(), SellerId::new(), 100);
        store.register_tranche(tranche.clone()).unwrap();
        // Still Pending — the conditional transition must refuse.
        let err = store
            .begin_settlement(pending_settlement(&tranche, 0))
            .unwrap_err();
        assert!(matches!(err, CuadreError::InvalidTrancheTransition { .. }));
        assert!(store.open_settlement(tranche.id).is_none());
    }

    #[test]
    fn void_open_returns_tranche_to_released() {
        let mut store = EngineStore::new();
        let tranche = released_tranche(&mut store);
        let settlement = pending_settlement(&tranche, 0);
        let id = settlement.id;
        store.begin_settlement(settlement).unwrap();

        let voided = store.void_open(tranche.id).unwrap();
        assert_eq!(voided, Some(id));
        assert_eq!(
            store.tranche(tranche.id).unwrap().state,
            TrancheState::Released
        );
        assert_eq!(
            store.settlement(id).unwrap().state,
            SettlementState::Void
        );
        assert!(store.open_settlement(tranche.id).is_none());
    }

    #[test]
    fn void_without_open_is_none() {
        let mut store = EngineStore::new();
        let tranche = released_tranche(&mut store);
        assert_eq!(store.void_open(tranche.id).unwrap(), None);
    }

    #[test]
    fn confirm_settles_and_applies_ledger() {
        let mut store = EngineStore::new();
        let tranche = released_tranche(&mut store);
        let settlement = pending_settlement(&tranche, 0);
        let id = settlement.id;
        store.begin_settlement(settlement).unwrap();

        let confirmed = store
            .confirm_settlement(id, Decimal::new(60_000, 0), Some("short".into()))
            .unwrap();
        assert_eq!(confirmed.state, SettlementState::Confirmed);
        assert_eq!(confirmed.resulting_surplus, Some(Decimal::new(-4_000, 0)));
        assert_eq!(
            store.tranche(tranche.id).unwrap().state,
            TrancheState::Settled
        );
        assert_eq!(
            store.prior_surplus(tranche.seller_id),
            Decimal::new(-4_000, 0)
        );
    }

    #[test]
    fn double_confirm_leaves_ledger_unchanged() {
        let mut store = EngineStore::new();
        let tranche = released_tranche(&mut store);
        let settlement = pending_settlement(&tranche, 0);
        let id = settlement.id;
        store.begin_settlement(settlement).unwrap();
        store
            .confirm_settlement(id, Decimal::new(64_000, 0), None)
            .unwrap();
        let before = store.prior_surplus(tranche.seller_id);

        let err = store
            .confirm_settlement(id, Decimal::new(64_000, 0), None)
            .unwrap_err();
        assert!(matches!(err, CuadreError::AlreadyConfirmed(s) if s == id));
        assert_eq!(store.prior_surplus(tranche.seller_id), before);
    }

    #[test]
    fn confirm_missing_settlement_touches_nothing() {
        let mut store = EngineStore::new();
        let tranche = released_tranche(&mut store);
        let err = store
            .confirm_settlement(SettlementId::new(), Decimal::ZERO, None)
            .unwrap_err();
        assert!(matches!(err, CuadreError::SettlementNotFound(_)));
        assert_eq!(
            store.tranche(tranche.id).unwrap().state,
            TrancheState::Released
        );
        assert!(store.ledger().is_empty());
    }

    #[test]
    fn summary_counts_states() {
        let mut store = EngineStore::new();

        let t1 = released_tranche(&mut store);
        let s1 = pending_settlement(&t1, 0);
        let s1_id = s1.id;
        store.begin_settlement(s1).unwrap();
        store
            .confirm_settlement(s1_id, Decimal::new(64_000, 0), None)
            .unwrap();

        let t2 = released_tranche(&mut store);
        store.begin_settlement(pending_settlement(&t2, 0)).unwrap();

        let summary = store.summary();
        assert_eq!(summary.confirmed, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.voided, 0);
        assert_eq!(summary.total_collected, Decimal::new(100_000, 0));
        assert_eq!(summary.total_transferred, Decimal::new(64_000, 0));
        assert_eq!(summary.total_due_pending, Decimal::new(64_000, 0));
    }
}
