//! Settlement records and their lifecycle.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  confirm   ┌───────────┐
//!   │ PENDING ├───────────▶│ CONFIRMED │
//!   └───┬─────┘            └───────────┘
//!       │ forced regeneration
//!       ▼
//!   ┌──────┐
//!   │ VOID │
//!   └──────┘
//! ```
//!
//! Both terminal states are irreversible. A settlement is fully computed at
//! creation time; confirmation only records the actual transfer and the
//! resulting surplus.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AuditTrail, CuadreError, ProfitModel, Result, SellerId, SettlementId, TrancheId,
};

/// The lifecycle state of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementState {
    /// Computed, awaiting operator confirmation.
    Pending,
    /// The operator recorded the actual transfer. Terminal.
    Confirmed,
    /// Superseded by a forced regeneration of the same tranche. Terminal.
    Void,
}

impl SettlementState {
    /// Can this settlement transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Confirmed | Self::Void)
        )
    }
}

impl std::fmt::Display for SettlementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Confirmed => write!(f, "CONFIRMED"),
            Self::Void => write!(f, "VOID"),
        }
    }
}

/// One hop of the profit cascade: who receives what, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeEntry {
    /// Hop index counted from the seller (1 = first upline).
    pub level: u8,
    /// Human-readable hop label ("upline 1", "root", ...).
    pub label: String,
    /// Who receives this amount.
    pub beneficiary: SellerId,
    /// The percentage applied at this hop (full-precision ratio).
    pub percentage: Decimal,
    /// The materialized (rounded) monetary amount.
    pub amount: Decimal,
    /// Why this entry exists, for the distribution message.
    pub rationale: String,
}

/// The computed money-reconciliation record tied to one tranche's depletion.
///
/// All monetary fields are fixed at creation; `actual_transferred`,
/// `resulting_surplus`, and `note` are filled in at confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    /// Globally unique settlement identifier.
    pub id: SettlementId,
    /// The tranche being settled.
    pub tranche_id: TrancheId,
    /// The seller being reconciled.
    pub seller_id: SellerId,
    /// Current lifecycle state.
    pub state: SettlementState,
    /// Which distribution model was applied.
    pub model: ProfitModel,
    /// Money the seller collected this cycle.
    pub collected: Decimal,
    /// Carried balance from prior cycles (negative = debt).
    pub prior_surplus: Decimal,
    /// collected + prior surplus.
    pub available: Decimal,
    /// House investment owed for the tranche's batch.
    pub investment_owed: Decimal,
    /// Investment actually recouped (clamped to what was available).
    pub investment_recoup: Decimal,
    /// Profit left after recoup (never negative).
    pub gross_profit: Decimal,
    /// Negative remainder after recoup, carried as debt (never positive).
    pub shortfall: Decimal,
    /// The seller-share percentage applied (flat split) or per-hop ratio
    /// (cascade).
    pub applied_ratio: Decimal,
    /// Upline and root entries, in hop order. The seller's own retained
    /// share is `seller_share`, not an entry.
    pub cascade: Vec<CascadeEntry>,
    /// Amount the seller owes upward: recoup + all cascade entries.
    pub transfer_due: Decimal,
    /// Amount the seller retains.
    pub seller_share: Decimal,
    /// What the operator recorded as actually received.
    pub actual_transferred: Option<Decimal>,
    /// actual − transfer_due + shortfall; applied to the surplus ledger.
    pub resulting_surplus: Option<Decimal>,
    /// Operator note recorded at confirmation.
    pub note: Option<String>,
    /// Ordered computation trail.
    pub audit: AuditTrail,
    /// When the settlement was computed.
    pub created_at: DateTime<Utc>,
    /// When the settlement was confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When the settlement was voided.
    pub voided_at: Option<DateTime<Utc>>,
}

impl Settlement {
    /// Whether this settlement still blocks its tranche.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == SettlementState::Pending
    }

    /// Sum of all cascade entry amounts (the seller's share excluded).
    #[must_use]
    pub fn cascade_total(&self) -> Decimal {
        self.cascade.iter().map(|e| e.amount).sum()
    }

    /// Record the operator confirmation: `Pending → Confirmed`.
    ///
    /// # Errors
    /// `AlreadyConfirmed` / `AlreadyVoided` if the settlement is terminal.
    pub fn mark_confirmed(
        &mut self,
        actual_transferred: Decimal,
        resulting_surplus: Decimal,
        note: Option<String>,
    ) -> Result<()> {
        match self.state {
            SettlementState::Pending => {
                self.state = SettlementState::Confirmed;
                self.actual_transferred = Some(actual_transferred);
                self.resulting_surplus = Some(resulting_surplus);
                self.note = note;
                self.confirmed_at = Some(Utc::now());
                Ok(())
            }
            SettlementState::Confirmed => Err(CuadreError::AlreadyConfirmed(self.id)),
            SettlementState::Void => Err(CuadreError::AlreadyVoided(self.id)),
        }
    }

    /// Void this settlement: `Pending → Void`. Only a forced regeneration
    /// of the same tranche takes this path; a confirmed settlement is never
    /// voided.
    pub fn mark_void(&mut self) -> Result<()> {
        match self.state {
            SettlementState::Pending => {
                self.state = SettlementState::Void;
                self.voided_at = Some(Utc::now());
                Ok(())
            }
            SettlementState::Confirmed => Err(CuadreError::AlreadyConfirmed(self.id)),
            SettlementState::Void => Err(CuadreError::AlreadyVoided(self.id)),
        }
    }
}

impl std::fmt::Display for Settlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Settlement[{}] {} tranche={} due={} seller_share={}",
            self.id, self.state, self.tranche_id, self.transfer_due, self.seller_share,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_settlement() -> Settlement {
        Settlement {
            id: SettlementId::new(),
            tranche_id: TrancheId::new(),
            seller_id: SellerId::new(),
            state: SettlementState::Pending,
            model: ProfitModel::FlatSplit,
            collected: Decimal::new(100_000, 0),
            prior_surplus: Decimal::ZERO,
            available: Decimal::new(100_000, 0),
            investment_owed: Decimal::new(40_000, 0),
            investment_recoup: Decimal::new(40_000, 0),
            gross_profit: Decimal::new(60_000, 0),
            shortfall: Decimal::ZERO,
            applied_ratio: Decimal::new(6, 1),
            cascade: vec![CascadeEntry {
                level: 1,
                label: "root".into(),
                beneficiary: SellerId::new(),
                percentage: Decimal::new(4, 1),
                amount: Decimal::new(24_000, 0),
                rationale: "flat split remainder to root".into(),
            }],
            transfer_due: Decimal::new(64_000, 0),
            seller_share: Decimal::new(36_000, 0),
            actual_transferred: None,
            resulting_surplus: None,
            note: None,
            audit: AuditTrail::new(),
            created_at: Utc::now(),
            confirmed_at: None,
            voided_at: None,
        }
    }

    #[test]
    fn state_transitions_valid() {
        assert!(SettlementState::Pending.can_transition_to(SettlementState::Confirmed));
        assert!(SettlementState::Pending.can_transition_to(SettlementState::Void));
    }

    #[test]
    fn state_transitions_invalid() {
        assert!(!SettlementState::Confirmed.can_transition_to(SettlementState::Void));
        assert!(!SettlementState::Confirmed.can_transition_to(SettlementState::Pending));
        assert!(!SettlementState::Void.can_transition_to(SettlementState::Confirmed));
    }

    #[test]
    fn confirm_records_fields() {
        let mut s = make_settlement();
        s.mark_confirmed(
            Decimal::new(64_000, 0),
            Decimal::ZERO,
            Some("paid in full".into()),
        )
        .unwrap();
        assert_eq!(s.state, SettlementState::Confirmed);
        assert_eq!(s.actual_transferred, Some(Decimal::new(64_000, 0)));
        assert_eq!(s.resulting_surplus, Some(Decimal::ZERO));
        assert!(s.confirmed_at.is_some());
        assert!(!s.is_open());
    }

    #[test]
    fn double_confirm_blocked() {
        let mut s = make_settlement();
        s.mark_confirmed(Decimal::new(64_000, 0), Decimal::ZERO, None)
            .unwrap();
        let err = s
            .mark_confirmed(Decimal::new(64_000, 0), Decimal::ZERO, None)
            .unwrap_err();
        assert!(matches!(err, CuadreError::AlreadyConfirmed(_)));
    }

    #[test]
    fn confirmed_cannot_be_voided() {
        let mut s = make_settlement();
        s.mark_confirmed(Decimal::new(64_000, 0), Decimal::ZERO, None)
            .unwrap();
        let err = s.mark_void().unwrap_err();
        assert!(matches!(err, CuadreError::AlreadyConfirmed(_)));
    }

    #[test]
    fn void_from_pending() {
        let mut s = make_settlement();
        s.mark_void().unwrap();
        assert_eq!(s.state, SettlementState::Void);
        assert!(s.voided_at.is_some());

        let err = s
            .mark_confirmed(Decimal::new(64_000, 0), Decimal::ZERO, None)
            .unwrap_err();
        assert!(matches!(err, CuadreError::AlreadyVoided(_)));
    }

    #[test]
    fn cascade_total_sums_entries() {
        let s = make_settlement();
        assert_eq!(s.cascade_total(), Decimal::new(24_000, 0));
    }

    #[test]
    fn settlement_serde_roundtrip() {
        let s = make_settlement();
        let json = serde_json::to_string(&s).unwrap();
        let back: Settlement = serde_json::from_str(&json).unwrap();
        assert_eq!(s.id, back.id);
        assert_eq!(s.transfer_due, back.transfer_due);
        assert_eq!(s.cascade, back.cascade);
        assert_eq!(s.state, back.state);
    }
}
