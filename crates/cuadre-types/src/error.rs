//! Error types for the Cuadre settlement engine.
//!
//! All errors use the `CU_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors
//! - 2xx: Conflict errors (lifecycle / single-writer violations)
//! - 3xx: Data-integrity errors (chain / investment data)
//! - 4xx: Lookup errors
//! - 5xx: Eligibility errors
//! - 9xx: Computation / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{BatchId, SellerId, SettlementId, SettlementState, TrancheId, TrancheState};

/// Coarse classification of an error, used by callers that route on the
/// taxonomy rather than the concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// A lifecycle or single-writer invariant rejected the operation.
    Conflict,
    /// Upstream data is corrupt or unavailable. Alert-worthy; never
    /// downgraded to a partial result.
    DataIntegrity,
    /// The referenced entity does not exist.
    NotFound,
    /// The tranche does not qualify for settlement generation.
    Eligibility,
    /// Unreachable under valid inputs; indicates an implementation bug.
    Computation,
}

/// Central error enum for all Cuadre operations.
#[derive(Debug, Error)]
pub enum CuadreError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// The input failed validation (missing fields, bad values, etc.).
    #[error("CU_ERR_100: Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A monetary amount that must be non-negative was negative.
    #[error("CU_ERR_101: Negative amount for {field}: {amount}")]
    NegativeAmount { field: &'static str, amount: Decimal },

    /// Engine configuration is out of range (ratios, depth, scale).
    #[error("CU_ERR_102: Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // =================================================================
    // Conflict Errors (2xx)
    // =================================================================
    /// The tranche already has an open (Pending) settlement.
    #[error("CU_ERR_200: Tranche {0} already has an open settlement")]
    OpenSettlementExists(TrancheId),

    /// The settlement has already been confirmed (terminal).
    #[error("CU_ERR_201: Settlement {0} is already confirmed")]
    AlreadyConfirmed(SettlementId),

    /// The settlement has already been voided (terminal).
    #[error("CU_ERR_202: Settlement {0} is already void")]
    AlreadyVoided(SettlementId),

    /// The tranche cannot move to the requested lifecycle state.
    #[error("CU_ERR_203: Tranche {tranche} cannot transition from {from} to {to}")]
    InvalidTrancheTransition {
        tranche: TrancheId,
        from: TrancheState,
        to: TrancheState,
    },

    /// The settlement cannot move to the requested lifecycle state.
    #[error("CU_ERR_204: Settlement {settlement} cannot transition from {from} to {to}")]
    InvalidSettlementTransition {
        settlement: SettlementId,
        from: SettlementState,
        to: SettlementState,
    },

    /// The tranche is not in a state that admits settlement generation.
    #[error("CU_ERR_205: Tranche {tranche} is {state}, not RELEASED")]
    TrancheNotReleased {
        tranche: TrancheId,
        state: TrancheState,
    },

    /// A depletion sweep is already running.
    #[error("CU_ERR_206: Sweep already in progress")]
    SweepInProgress,

    // =================================================================
    // Data-Integrity Errors (3xx)
    // =================================================================
    /// The recruitment-chain provider could not supply a chain.
    #[error("CU_ERR_300: Chain unavailable for seller {seller}: {reason}")]
    ChainUnavailable { seller: SellerId, reason: String },

    /// The ancestor chain contains a duplicate node (cycle in upline data).
    #[error("CU_ERR_301: Cyclic ancestor chain for seller {seller}")]
    ChainCycle { seller: SellerId },

    /// The ancestor chain exceeds the configured maximum depth.
    #[error("CU_ERR_302: Chain depth {depth} exceeds maximum {max}")]
    ChainDepthExceeded { depth: usize, max: usize },

    /// The first hop of the chain is not the settling seller.
    #[error("CU_ERR_303: Chain not anchored at seller {expected} (found {found})")]
    ChainNotAnchored { expected: SellerId, found: SellerId },

    /// The ancestor chain is empty.
    #[error("CU_ERR_304: Empty ancestor chain for seller {0}")]
    EmptyChain(SellerId),

    /// The batch's investment split is missing.
    #[error("CU_ERR_305: Missing investment data for batch {0}")]
    MissingInvestment(BatchId),

    // =================================================================
    // Lookup Errors (4xx)
    // =================================================================
    /// The requested tranche was not found.
    #[error("CU_ERR_400: Tranche not found: {0}")]
    TrancheNotFound(TrancheId),

    /// The requested settlement was not found.
    #[error("CU_ERR_401: Settlement not found: {0}")]
    SettlementNotFound(SettlementId),

    // =================================================================
    // Eligibility Errors (5xx)
    // =================================================================
    /// The tranche's depletion ratio is still above the threshold.
    #[error("CU_ERR_500: No eligible stock on tranche {tranche}: ratio {ratio} above threshold {threshold}")]
    NoEligibleStock {
        tranche: TrancheId,
        ratio: Decimal,
        threshold: Decimal,
    },

    // =================================================================
    // Computation / Internal (9xx)
    // =================================================================
    /// The conservation invariant failed after computation — critical alert.
    #[error("CU_ERR_900: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    /// Unrecoverable internal error.
    #[error("CU_ERR_901: Internal error: {0}")]
    Internal(String),
}

impl CuadreError {
    /// Map the concrete variant onto the taxonomy in [`ErrorKind`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } | Self::NegativeAmount { .. } | Self::InvalidConfig { .. } => {
                ErrorKind::Validation
            }
            Self::OpenSettlementExists(_)
            | Self::AlreadyConfirmed(_)
            | Self::AlreadyVoided(_)
            | Self::InvalidTrancheTransition { .. }
            | Self::InvalidSettlementTransition { .. }
            | Self::TrancheNotReleased { .. }
            | Self::SweepInProgress => ErrorKind::Conflict,
            Self::ChainUnavailable { .. }
            | Self::ChainCycle { .. }
            | Self::ChainDepthExceeded { .. }
            | Self::ChainNotAnchored { .. }
            | Self::EmptyChain(_)
            | Self::MissingInvestment(_) => ErrorKind::DataIntegrity,
            Self::TrancheNotFound(_) | Self::SettlementNotFound(_) => ErrorKind::NotFound,
            Self::NoEligibleStock { .. } => ErrorKind::Eligibility,
            Self::ConservationViolation { .. } | Self::Internal(_) => ErrorKind::Computation,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CuadreError>;
