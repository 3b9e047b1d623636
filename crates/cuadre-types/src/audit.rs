//! Structured audit trail for settlement computation.
//!
//! Every computation step is recorded as one ordered `{step, inputs,
//! result}` entry rather than free text. Human-readable rendering is
//! derived from the structure (cuadre-report), which keeps the trail
//! queryable while still supporting message generation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The computation step an audit entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditStepKind {
    /// collected + prior surplus.
    AvailableFunds,
    /// Investment recoup clamped to what is available.
    InvestmentRecoup,
    /// Profit (or carried shortfall) left after recoup.
    GrossProfit,
    /// One distribution hop (seller share, upline entry, or root entry).
    Distribution,
    /// Amount the seller owes upward.
    TransferDue,
    /// Amount the seller retains.
    SellerShare,
}

impl std::fmt::Display for AuditStepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AvailableFunds => write!(f, "AVAILABLE_FUNDS"),
            Self::InvestmentRecoup => write!(f, "INVESTMENT_RECOUP"),
            Self::GrossProfit => write!(f, "GROSS_PROFIT"),
            Self::Distribution => write!(f, "DISTRIBUTION"),
            Self::TransferDue => write!(f, "TRANSFER_DUE"),
            Self::SellerShare => write!(f, "SELLER_SHARE"),
        }
    }
}

/// One ordered audit entry: which step ran, its named inputs, its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The computation step.
    pub kind: AuditStepKind,
    /// Named decimal inputs, in the order the step consumed them.
    pub inputs: Vec<(String, Decimal)>,
    /// The step's result.
    pub result: Decimal,
}

/// The ordered audit trail of one settlement computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    steps: Vec<AuditStep>,
}

impl AuditTrail {
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append one step. Order of calls is the order of the trail.
    pub fn record(
        &mut self,
        kind: AuditStepKind,
        inputs: Vec<(String, Decimal)>,
        result: Decimal,
    ) {
        self.steps.push(AuditStep {
            kind,
            inputs,
            result,
        });
    }

    /// The ordered steps.
    #[must_use]
    pub fn steps(&self) -> &[AuditStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
