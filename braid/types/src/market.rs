use {
    crate::Denom,
    braid_math::{NumberConst, Ray, Uint128},
    serde::{Deserialize, Serialize},
};

/// Fraction of a borrower's debt a liquidator may cover in one call when the
/// position is between the two liquidation thresholds.
pub const DEFAULT_CLOSE_FACTOR: Ray = Ray::new_percent(50);

/// Close factor applied to severely undercollateralized positions and to
/// positions on deprecated markets.
pub const MAX_CLOSE_FACTOR: Ray = Ray::new_percent(100);

/// Health factor at or above which a position cannot be liquidated.
pub const DEFAULT_LIQUIDATION_THRESHOLD: Ray = Ray::new_percent(100);

/// Health factor below which the maximum close factor applies.
pub const BAD_DEBT_LIQUIDATION_THRESHOLD: Ray = Ray::new_percent(95);

/// The two sides of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Supply,
    Borrow,
}

/// The pool and peer-to-peer indexes for one side of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSideIndexes {
    pub pool_index: Ray,
    pub p2p_index: Ray,
}

impl MarketSideIndexes {
    pub const ONE: Self = Self {
        pool_index: Ray::ONE,
        p2p_index: Ray::ONE,
    };
}

/// The full index state of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indexes {
    pub supply: MarketSideIndexes,
    pub borrow: MarketSideIndexes,
}

impl Indexes {
    pub const ONE: Self = Self {
        supply: MarketSideIndexes::ONE,
        borrow: MarketSideIndexes::ONE,
    };

    pub fn side(&self, side: Side) -> MarketSideIndexes {
        match side {
            Side::Supply => self.supply,
            Side::Borrow => self.borrow,
        }
    }
}

/// Delta bookkeeping for one side of a market.
///
/// `scaled_delta` is the outstanding mismatch between pool-side and
/// peer-to-peer-side accounting, in pool-index-scaled units. It is created
/// when a match is broken faster than it can be rebuilt, and consumed with
/// priority by incoming flow on the opposite side. `scaled_p2p_total` is the
/// side's global peer-to-peer volume in p2p-index-scaled units, used for
/// solvency bookkeeping; it is distinct from per-user balances.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSideDelta {
    pub scaled_delta: Uint128,
    pub scaled_p2p_total: Uint128,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deltas {
    pub supply: MarketSideDelta,
    pub borrow: MarketSideDelta,
}

impl Deltas {
    pub fn side(&self, side: Side) -> &MarketSideDelta {
        match side {
            Side::Supply => &self.supply,
            Side::Borrow => &self.borrow,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut MarketSideDelta {
        match side {
            Side::Supply => &mut self.supply,
            Side::Borrow => &mut self.borrow,
        }
    }
}

/// Independent pause flags, one per user-facing action.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseStatuses {
    pub supply_paused: bool,
    pub borrow_paused: bool,
    pub repay_paused: bool,
    pub withdraw_paused: bool,
    pub supply_collateral_paused: bool,
    pub withdraw_collateral_paused: bool,
    pub liquidate_collateral_paused: bool,
    pub liquidate_borrow_paused: bool,
}

/// Governance-settable parameters fixed at market creation (and updatable
/// through the admin surface).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Fraction of the peer-to-peer spread kept by the protocol.
    pub reserve_factor: Ray,
    /// Position of the peer-to-peer rate between the pool supply rate (0)
    /// and the pool borrow rate (1).
    pub p2p_index_cursor: Ray,
    /// Whether the asset may be used as collateral.
    pub is_collateral: bool,
}

/// Per-asset ledger: indexes, deltas, idle supply, and status flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub denom: Denom,
    pub indexes: Indexes,
    pub deltas: Deltas,
    /// Supply that could not be deposited into the pool (supply cap reached)
    /// and is parked unmatched until room frees up or a borrower takes it.
    pub idle_supply: Uint128,
    pub reserve_factor: Ray,
    pub p2p_index_cursor: Ray,
    pub is_collateral: bool,
    pub is_p2p_disabled: bool,
    /// Terminal risk state: only full liquidation is allowed.
    pub is_deprecated: bool,
    pub pause: PauseStatuses,
}

impl Market {
    pub fn new(denom: Denom, params: MarketParams) -> Self {
        Self {
            denom,
            indexes: Indexes::ONE,
            deltas: Deltas::default(),
            idle_supply: Uint128::ZERO,
            reserve_factor: params.reserve_factor,
            p2p_index_cursor: params.p2p_index_cursor,
            is_collateral: params.is_collateral,
            is_p2p_disabled: false,
            is_deprecated: false,
            pause: PauseStatuses::default(),
        }
    }
}
