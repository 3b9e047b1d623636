//! Aggregate view across settlement states.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Counts and totals across all settlements plus the ledger's net position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Settlements awaiting confirmation.
    pub pending: usize,
    /// Confirmed settlements.
    pub confirmed: usize,
    /// Voided settlements.
    pub voided: usize,
    /// Sum of collected amounts over confirmed settlements.
    pub total_collected: Decimal,
    /// Sum of actually received transfers over confirmed settlements.
    pub total_transferred: Decimal,
    /// Sum of transfer_due over still-pending settlements.
    pub total_due_pending: Decimal,
    /// Net carried surplus across all sellers (negative = net debt).
    pub total_outstanding_surplus: Decimal,
}
