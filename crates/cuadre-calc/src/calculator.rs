//! The settlement calculator.
//!
//! A pure function from a snapshot of inputs (collected money, carried
//! surplus, investment owed, the pre-fetched ancestor chain) to a fully
//! computed Pending [`Settlement`]. Given identical inputs it produces
//! identical amounts, cascade entries, and audit trail — the engine can
//! always recompute from a fresh snapshot instead of retrying.
//!
//! Each numbered computation step records exactly one audit-trail entry,
//! in order:
//!
//! 1. `available = collected + prior_surplus`
//! 2. `recoup = clamp(available, 0, investment_owed)`
//! 3. `gross_profit = max(available − recoup, 0)`; a negative remainder is
//!    carried as shortfall (debt) into the resulting surplus
//! 4. distribution by model (flat split or cascade)
//! 5. `transfer_due = recoup + Σ(cascade entries)`
//! 6. `seller_share` = the seller's retained share from step 4

use chrono::Utc;
use cuadre_types::money::{round_half_up, within_one_cent};
use cuadre_types::{
    AuditStepKind, AuditTrail, ChainHop, CuadreError, EngineConfig, ProfitModel, Result,
    SellerId, Settlement, SettlementId, SettlementState, TrancheId,
};
use rust_decimal::Decimal;

use crate::cascade::{cascade_split, flat_split, Distribution};
use crate::chain::validate_chain;

/// Snapshot of everything one settlement computation consumes.
///
/// The workflow assembles this from the providers and the surplus ledger;
/// nothing here is read again during computation.
#[derive(Debug, Clone)]
pub struct SettlementInputs {
    /// The tranche being settled.
    pub tranche_id: TrancheId,
    /// The seller being reconciled.
    pub seller_id: SellerId,
    /// Money the seller collected this cycle.
    pub collected: Decimal,
    /// Carried balance from prior cycles (negative = debt).
    pub prior_surplus: Decimal,
    /// House investment owed for the tranche's batch.
    pub investment_owed: Decimal,
    /// Pre-fetched ancestor chain, seller first, root last.
    pub chain: Vec<ChainHop>,
    /// Regeneration counter for this tranche (0 for the first settlement).
    pub generation: u32,
}

/// Compute one settlement from a snapshot of inputs.
///
/// # Errors
/// - `NegativeAmount` for negative collected or investment owed
/// - chain-integrity errors from [`validate_chain`] — the abort is total,
///   no settlement object is produced
/// - `ConservationViolation` if the computed amounts fail the conservation
///   check (unreachable under valid inputs)
pub fn compute(inputs: &SettlementInputs, config: &EngineConfig) -> Result<Settlement> {
    if inputs.collected < Decimal::ZERO {
        return Err(CuadreError::NegativeAmount {
            field: "collected",
            amount: inputs.collected,
        });
    }
    if inputs.investment_owed < Decimal::ZERO {
        return Err(CuadreError::NegativeAmount {
            field: "investment_owed",
            amount: inputs.investment_owed,
        });
    }
    validate_chain(inputs.seller_id, &inputs.chain, config.max_chain_depth)?;

    let seller_tier = inputs.chain[0].tier;
    let model = ProfitModel::for_tier(seller_tier);
    let scale = config.currency_scale;
    let mut audit = AuditTrail::new();

    // 1. Money on the table this cycle.
    let available = inputs.collected + inputs.prior_surplus;
    audit.record(
        AuditStepKind::AvailableFunds,
        vec![
            ("collected".into(), inputs.collected),
            ("prior_surplus".into(), inputs.prior_surplus),
        ],
        available,
    );

    // 2. Investment comes off the top, clamped to what is actually there.
    let recoup = available.clamp(Decimal::ZERO, inputs.investment_owed);
    audit.record(
        AuditStepKind::InvestmentRecoup,
        vec![
            ("available".into(), available),
            ("investment_owed".into(), inputs.investment_owed),
        ],
        recoup,
    );
    let after_recoup = available - recoup;

    // 3. Profit, or debt carried forward when the cycle fell short.
    let gross_profit = after_recoup.max(Decimal::ZERO);
    let shortfall = after_recoup.min(Decimal::ZERO);
    audit.record(
        AuditStepKind::GrossProfit,
        vec![("after_recoup".into(), after_recoup)],
        gross_profit,
    );

    // 4. Distribution by model.
    let (applied_ratio, distribution): (Decimal, Distribution) = match model {
        ProfitModel::FlatSplit => {
            let root = &inputs.chain[inputs.chain.len() - 1];
            (
                config.flat_seller_pct,
                flat_split(gross_profit, config.flat_seller_pct, root, scale),
            )
        }
        ProfitModel::CascadeSplit => (
            config.cascade_ratio,
            cascade_split(gross_profit, config.cascade_ratio, &inputs.chain, scale),
        ),
    };
    audit.record(
        AuditStepKind::Distribution,
        vec![
            ("gross_profit".into(), gross_profit),
            ("ratio".into(), applied_ratio),
            ("hops".into(), Decimal::from(inputs.chain.len())),
        ],
        gross_profit,
    );

    // 5. What the seller owes upward.
    let cascade_total = distribution.cascade_total();
    let transfer_due = round_half_up(recoup + cascade_total, scale);
    audit.record(
        AuditStepKind::TransferDue,
        vec![
            ("investment_recoup".into(), recoup),
            ("cascade_total".into(), cascade_total),
        ],
        transfer_due,
    );

    // 6. What the seller keeps.
    let seller_share = distribution.seller_share;
    audit.record(AuditStepKind::SellerShare, Vec::new(), seller_share);

    // Everything that came in must be accounted for, to the cent.
    let accounted = recoup + cascade_total + seller_share + shortfall;
    if !within_one_cent(accounted, available) {
        return Err(CuadreError::ConservationViolation {
            reason: format!(
                "tranche {}: accounted {accounted} != available {available} \
                 (recoup={recoup}, cascade={cascade_total}, seller={seller_share}, \
                 shortfall={shortfall})",
                inputs.tranche_id,
            ),
        });
    }

    tracing::debug!(
        tranche = %inputs.tranche_id,
        %model,
        %transfer_due,
        %seller_share,
        "settlement computed"
    );

    Ok(Settlement {
        id: SettlementId::deterministic(inputs.tranche_id, inputs.generation),
        tranche_id: inputs.tranche_id,
        seller_id: inputs.seller_id,
        state: SettlementState::Pending,
        model,
        collected: inputs.collected,
        prior_surplus: inputs.prior_surplus,
        available,
        investment_owed: inputs.investment_owed,
        investment_recoup: recoup,
        gross_profit,
        shortfall,
        applied_ratio,
        cascade: distribution.entries,
        transfer_due,
        seller_share,
        actual_transferred: None,
        resulting_surplus: None,
        note: None,
        audit,
        created_at: Utc::now(),
        confirmed_at: None,
        voided_at: None,
    })
}

/// The surplus delta a confirmation applies to the seller's ledger entry:
/// what actually arrived, minus what was due, plus any shortfall carried
/// out of this cycle as debt.
#[must_use]
pub fn resulting_surplus(settlement: &Settlement, actual_amount: Decimal) -> Decimal {
    actual_amount - settlement.transfer_due + settlement.shortfall
}
