//! # cuadre-report
//!
//! **Derived output plane**: deterministic rendering of settlements for
//! external distribution (messaging, operator review).
//!
//! Rendering is a pure function of the stored record. Every numeric in the
//! output equals the stored computed field exactly; the human-readable
//! audit text is derived from the structured trail, never stored.

pub mod message;

pub use message::{render_audit, render_message};
