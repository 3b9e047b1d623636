//! # cuadre-types
//!
//! Shared types, errors, and configuration for the **Cuadre** settlement
//! engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`SellerId`], [`BatchId`], [`TrancheId`], [`SettlementId`]
//! - **Chain model**: [`Seller`], [`ChainHop`], [`ProfitModel`]
//! - **Stock model**: [`Batch`], [`InvestmentSplit`], [`Tranche`], [`TrancheState`]
//! - **Settlement model**: [`Settlement`], [`SettlementState`], [`CascadeEntry`]
//! - **Audit model**: [`AuditTrail`], [`AuditStep`], [`AuditStepKind`]
//! - **Surplus model**: [`SurplusBalance`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`CuadreError`] with `CU_ERR_` prefix codes, [`ErrorKind`]
//! - **Money helpers**: half-up rounding at the currency scale
//! - **Constants**: system-wide limits and defaults

pub mod audit;
pub mod batch;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod money;
pub mod seller;
pub mod settlement;
pub mod surplus;
pub mod tranche;

// Re-export all primary types at crate root for ergonomic imports:
//   use cuadre_types::{Settlement, Tranche, CuadreError, ...};

pub use audit::*;
pub use batch::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use seller::*;
pub use settlement::*;
pub use surplus::*;
pub use tranche::*;

// Constants and money helpers are accessed via their modules
// (`cuadre_types::constants::FOO`, `cuadre_types::money::round_currency`)
// to avoid name collisions.
