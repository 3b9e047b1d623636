//! Profit distribution across the recruitment chain.
//!
//! Two models, selected by the seller's tier:
//!
//! - **Flat split** (tier 2): the seller retains a fixed share of gross
//!   profit; the remainder goes straight to the root as a single entry.
//! - **Cascade split** (tier ≥ 3): profit halves hop by hop up the chain.
//!   The holder at each hop retains `ratio × remaining` and passes the rest
//!   onward; the root absorbs everything left after the last non-root hop.
//!
//! `remaining` is carried at full precision between hops; each entry is
//! rounded half-up only when materialized. The root's entry is computed as
//! gross minus all materialized shares, so the rounded entries always
//! conserve gross exactly — rounding residue lands on the root.

use cuadre_types::money::round_half_up;
use cuadre_types::{CascadeEntry, ChainHop};
use rust_decimal::Decimal;

/// The outcome of one distribution: what the seller keeps, and the ordered
/// upline/root entries.
#[derive(Debug, Clone)]
pub struct Distribution {
    /// The seller's own retained share (not a cascade entry).
    pub seller_share: Decimal,
    /// Upline and root entries, in hop order.
    pub entries: Vec<CascadeEntry>,
}

impl Distribution {
    /// Sum of all entry amounts.
    #[must_use]
    pub fn cascade_total(&self) -> Decimal {
        self.entries.iter().map(|e| e.amount).sum()
    }
}

/// Tier-2 flat split: seller retains `seller_pct × gross`, the root gets
/// the exact remainder as a single entry.
#[must_use]
pub fn flat_split(
    gross: Decimal,
    seller_pct: Decimal,
    root: &ChainHop,
    scale: u32,
) -> Distribution {
    let seller_share = round_half_up(gross * seller_pct, scale);
    let root_amount = gross - seller_share;
    let entries = vec![CascadeEntry {
        level: 1,
        label: "root".to_string(),
        beneficiary: root.id,
        percentage: Decimal::ONE - seller_pct,
        amount: root_amount,
        rationale: format!("flat split remainder after seller share of {seller_pct}"),
    }];
    Distribution {
        seller_share,
        entries,
    }
}

/// Tier ≥ 3 cascade: walk the chain seller→root, halving at each hop.
///
/// `chain[0]` is the settling seller (their retained share), each
/// intermediate hop emits one entry, and the last hop (the root) absorbs
/// the entire remainder rather than splitting again.
#[must_use]
pub fn cascade_split(
    gross: Decimal,
    ratio: Decimal,
    chain: &[ChainHop],
    scale: u32,
) -> Distribution {
    if chain.len() < 2 {
        // Degenerate chain: nobody above the seller, nothing cascades.
        return Distribution {
            seller_share: round_half_up(gross, scale),
            entries: Vec::new(),
        };
    }

    let pass_on = Decimal::ONE - ratio;
    let mut remaining = gross;

    let seller_share = round_half_up(remaining * ratio, scale);
    remaining *= pass_on;

    let mut entries = Vec::with_capacity(chain.len() - 1);
    let mut materialized = seller_share;

    // Intermediate hops: each retains ratio × remaining and passes the rest.
    for (idx, hop) in chain[1..chain.len() - 1].iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let level = (idx + 1) as u8;
        let amount = round_half_up(remaining * ratio, scale);
        entries.push(CascadeEntry {
            level,
            label: format!("upline {level}"),
            beneficiary: hop.id,
            percentage: ratio,
            amount,
            rationale: format!("retains {ratio} of the amount cascading past hop {level}"),
        });
        materialized += amount;
        remaining *= pass_on;
    }

    // The root absorbs all of the remainder, not a further split. Computed
    // from the materialized shares so the rounded entries conserve gross.
    let root = &chain[chain.len() - 1];
    #[allow(clippy::cast_possible_truncation)]
    let root_level = (chain.len() - 1) as u8;
    entries.push(CascadeEntry {
        level: root_level,
        label: "root".to_string(),
        beneficiary: root.id,
        percentage: Decimal::ONE,
        amount: gross - materialized,
        rationale: "root absorbs the full remainder after the last hop".to_string(),
    });

    Distribution {
        seller_share,
        entries,
    }
}
