//! Pre-flight validation of the pre-fetched ancestor chain.
//!
//! The cascade walks a pre-fetched ordered list, never a live graph, so a
//! corrupted (possibly cyclic) upline reference in the source data cannot
//! send the engine into an unbounded traversal. Any violation here aborts
//! settlement creation entirely — no settlement is ever persisted from a
//! broken chain.

use std::collections::HashSet;

use cuadre_types::{ChainHop, CuadreError, Result, SellerId};

/// Validate a seller→root chain before computation.
///
/// # Errors
/// - [`CuadreError::EmptyChain`] — nothing to walk
/// - [`CuadreError::ChainNotAnchored`] — first hop is not the settling seller
/// - [`CuadreError::ChainDepthExceeded`] — longer than `max_depth`
/// - [`CuadreError::ChainCycle`] — the same entity appears twice
pub fn validate_chain(seller_id: SellerId, chain: &[ChainHop], max_depth: usize) -> Result<()> {
    let Some(first) = chain.first() else {
        return Err(CuadreError::EmptyChain(seller_id));
    };
    if first.id != seller_id {
        return Err(CuadreError::ChainNotAnchored {
            expected: seller_id,
            found: first.id,
        });
    }
    if chain.len() > max_depth {
        return Err(CuadreError::ChainDepthExceeded {
            depth: chain.len(),
            max: max_depth,
        });
    }
    let mut seen = HashSet::with_capacity(chain.len());
    for hop in chain {
        if !seen.insert(hop.id) {
            return Err(CuadreError::ChainCycle { seller: seller_id });
        }
    }
    Ok(())
}
