//! System-wide constants for the Cuadre settlement engine.

/// Decimal places of the smallest currency unit.
pub const CURRENCY_SCALE: u32 = 2;

/// Default depletion threshold in basis points: a tranche becomes eligible
/// for settlement when remaining/delivered falls to 20.00% or below.
pub const DEFAULT_DEPLETION_THRESHOLD_BPS: u32 = 2000;

/// Default seller share for the flat 60/40 split (tier-2 sellers), in bps.
pub const DEFAULT_FLAT_SELLER_PCT_BPS: u32 = 6000;

/// Default per-hop retention ratio for the 50/50 cascade (tier ≥ 3), in bps.
pub const DEFAULT_CASCADE_RATIO_BPS: u32 = 5000;

/// Maximum ancestor-chain depth tolerated before the chain is treated as
/// corrupt. Real chains are a handful of hops; the cap bounds the walk.
pub const MAX_CHAIN_DEPTH: usize = 16;

/// Lowest tier a seller can occupy (the root sits above tier 2).
pub const MIN_SELLER_TIER: u8 = 2;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Cuadre";
