//! # cuadre-calc
//!
//! **Pure settlement computation for Cuadre.**
//!
//! This is the compute plane — it takes a snapshot of inputs (collected
//! money, carried surplus, investment owed, the pre-fetched ancestor chain)
//! and produces a fully computed Pending settlement. It has:
//!
//! - **Zero side effects**: no store writes, no ledger mutation, no I/O
//! - **Deterministic output**: same snapshot -> same amounts, same audit trail
//! - **Bounded chain walk**: the cascade iterates a pre-fetched list under a
//!   depth cap, so corrupt upline data can never loop
//! - **Exact conservation**: rounding residue is absorbed by the root entry,
//!   and the conservation invariant is verified before anything is returned

pub mod calculator;
pub mod cascade;
pub mod chain;

pub use calculator::{compute, resulting_surplus, SettlementInputs};
pub use cascade::{cascade_split, flat_split, Distribution};
pub use chain::validate_chain;
