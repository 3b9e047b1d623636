//! Seller and recruitment-chain types.
//!
//! A seller sits at an ordinal tier in the recruitment chain (the root is
//! above tier 2). The tier alone decides which profit model applies to the
//! seller's settlements.

use serde::{Deserialize, Serialize};

use crate::{constants, CuadreError, Result, SellerId};

/// Which profit-distribution model applies to a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfitModel {
    /// Tier-2 seller: retains a flat share, the remainder goes straight to
    /// the root as a single cascade entry.
    FlatSplit,
    /// Tier ≥ 3 seller: profit halves hop by hop up the ancestor chain,
    /// the root absorbing whatever remains after the last hop.
    CascadeSplit,
}

impl ProfitModel {
    /// Derive the model from a seller's tier.
    #[must_use]
    pub fn for_tier(tier: u8) -> Self {
        if tier <= constants::MIN_SELLER_TIER {
            Self::FlatSplit
        } else {
            Self::CascadeSplit
        }
    }
}

impl std::fmt::Display for ProfitModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FlatSplit => write!(f, "FLAT_SPLIT"),
            Self::CascadeSplit => write!(f, "CASCADE_SPLIT"),
        }
    }
}

/// A seller record as the engine sees it.
///
/// Membership management (who recruited whom) lives outside the engine;
/// only the upline reference and tier are consumed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    /// Globally unique seller identifier.
    pub id: SellerId,
    /// Direct upline, `None` at the root.
    pub upline: Option<SellerId>,
    /// Ordinal depth in the recruitment chain (≥ 2 for sellers).
    pub tier: u8,
}

impl Seller {
    /// Create a seller, rejecting tiers below the minimum.
    pub fn new(id: SellerId, upline: Option<SellerId>, tier: u8) -> Result<Self> {
        if tier < constants::MIN_SELLER_TIER {
            return Err(CuadreError::InvalidInput {
                reason: format!("seller tier {tier} below minimum {}", constants::MIN_SELLER_TIER),
            });
        }
        Ok(Self { id, upline, tier })
    }

    /// The profit model this seller's settlements use.
    #[must_use]
    pub fn model(&self) -> ProfitModel {
        ProfitModel::for_tier(self.tier)
    }
}

/// One element of a pre-fetched seller→root ancestor chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHop {
    /// The entity at this hop (seller, upline, or root).
    pub id: SellerId,
    /// Ordinal tier of the entity (1 at the root).
    pub tier: u8,
}

impl ChainHop {
    #[must_use]
    pub fn new(id: SellerId, tier: u8) -> Self {
        Self { id, tier }
    }
}
