//! Settlement message rendering.
//!
//! Renders a settlement into the text that goes out to the seller and the
//! upline. Every numeric quoted here is the stored computed field printed
//! verbatim; the renderer derives nothing and rounds nothing, so the
//! message can never disagree with the record.

use std::fmt::Write as _;

use cuadre_types::{AuditStep, Settlement, SettlementState};

/// Render the distribution message for a settlement.
///
/// Byte-stable for a given settlement: two calls produce identical text.
#[must_use]
pub fn render_message(settlement: &Settlement) -> String {
    let mut out = String::with_capacity(512);

    let _ = writeln!(out, "SETTLEMENT {}", settlement.id);
    let _ = writeln!(out, "state: {}", settlement.state);
    let _ = writeln!(out, "tranche: {}", settlement.tranche_id);
    let _ = writeln!(out, "seller: {}", settlement.seller_id);
    let _ = writeln!(out, "model: {}", settlement.model);
    let _ = writeln!(
        out,
        "created: {}",
        settlement.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out.push('\n');

    let _ = writeln!(out, "collected: {}", settlement.collected);
    let _ = writeln!(out, "prior surplus: {}", settlement.prior_surplus);
    let _ = writeln!(out, "available: {}", settlement.available);
    let _ = writeln!(
        out,
        "investment recoup: {} (owed {})",
        settlement.investment_recoup, settlement.investment_owed
    );
    let _ = writeln!(out, "gross profit: {}", settlement.gross_profit);
    if !settlement.shortfall.is_zero() {
        let _ = writeln!(out, "shortfall carried: {}", settlement.shortfall);
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "seller share (ratio {}): {}",
        settlement.applied_ratio, settlement.seller_share
    );
    for entry in &settlement.cascade {
        let _ = writeln!(
            out,
            "{} -> {}: {}",
            entry.label, entry.beneficiary, entry.amount
        );
    }
    out.push('\n');

    let _ = writeln!(out, "TRANSFER DUE: {}", settlement.transfer_due);

    if settlement.state == SettlementState::Confirmed {
        if let Some(actual) = settlement.actual_transferred {
            let _ = writeln!(out, "transferred: {actual}");
        }
        if let Some(resulting) = settlement.resulting_surplus {
            let _ = writeln!(out, "resulting surplus: {resulting}");
        }
        if let Some(note) = &settlement.note {
            let _ = writeln!(out, "note: {note}");
        }
    }

    out
}

/// Render the audit trail, one line per step, in computation order.
#[must_use]
pub fn render_audit(settlement: &Settlement) -> String {
    let mut out = String::with_capacity(256);
    for step in settlement.audit.steps() {
        out.push_str(&render_step(step));
        out.push('\n');
    }
    out
}

fn render_step(step: &AuditStep) -> String {
    let inputs = step
        .inputs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(", ");
    if inputs.is_empty() {
        format!("{}: => {}", step.kind, step.result)
    } else {
        format!("{}: {} => {}", step.kind, inputs, step.result)
    }
}
