use {
    crate::Side,
    braid_math::{IsZero, Uint128},
    serde::{Deserialize, Serialize},
};

/// One user's scaled balances on one market.
///
/// All five counters are non-negative and index-scaled; multiplying by the
/// corresponding index yields the underlying amount. Decreases are
/// zero-floored, never negative. Collateral lives pool-side only and is
/// never matched peer-to-peer.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketBalances {
    pub scaled_pool_supply: Uint128,
    pub scaled_p2p_supply: Uint128,
    pub scaled_pool_borrow: Uint128,
    pub scaled_p2p_borrow: Uint128,
    pub scaled_collateral: Uint128,
}

impl MarketBalances {
    pub fn scaled_pool(&self, side: Side) -> Uint128 {
        match side {
            Side::Supply => self.scaled_pool_supply,
            Side::Borrow => self.scaled_pool_borrow,
        }
    }

    pub fn scaled_p2p(&self, side: Side) -> Uint128 {
        match side {
            Side::Supply => self.scaled_p2p_supply,
            Side::Borrow => self.scaled_p2p_borrow,
        }
    }

    pub fn scaled_pool_mut(&mut self, side: Side) -> &mut Uint128 {
        match side {
            Side::Supply => &mut self.scaled_pool_supply,
            Side::Borrow => &mut self.scaled_pool_borrow,
        }
    }

    pub fn scaled_p2p_mut(&mut self, side: Side) -> &mut Uint128 {
        match side {
            Side::Supply => &mut self.scaled_p2p_supply,
            Side::Borrow => &mut self.scaled_p2p_borrow,
        }
    }

    /// True when every counter is zero, i.e. the entry has returned to the
    /// implicit default and can be dropped from storage.
    pub fn is_empty(&self) -> bool {
        self.scaled_pool_supply.is_zero()
            && self.scaled_p2p_supply.is_zero()
            && self.scaled_pool_borrow.is_zero()
            && self.scaled_p2p_borrow.is_zero()
            && self.scaled_collateral.is_zero()
    }
}
