use {
    crate::{Addr, Denom},
    braid_math::Uint128,
    serde::{Deserialize, Serialize},
};

/// An event indicating a market has been created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCreated {
    pub denom: Denom,
}

/// An event indicating a user has supplied assets to be lent out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplied {
    pub from: Addr,
    pub on_behalf: Addr,
    pub denom: Denom,
    pub amount: Uint128,
    pub scaled_on_pool: Uint128,
    pub scaled_in_p2p: Uint128,
}

/// An event indicating a user has borrowed assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrowed {
    pub caller: Addr,
    pub on_behalf: Addr,
    pub receiver: Addr,
    pub denom: Denom,
    pub amount: Uint128,
    pub scaled_on_pool: Uint128,
    pub scaled_in_p2p: Uint128,
}

/// An event indicating a user's debt has been repaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repaid {
    pub repayer: Addr,
    pub on_behalf: Addr,
    pub denom: Denom,
    pub amount: Uint128,
    pub scaled_on_pool: Uint128,
    pub scaled_in_p2p: Uint128,
}

/// An event indicating a user has withdrawn supplied assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawn {
    pub caller: Addr,
    pub on_behalf: Addr,
    pub receiver: Addr,
    pub denom: Denom,
    pub amount: Uint128,
    pub scaled_on_pool: Uint128,
    pub scaled_in_p2p: Uint128,
}

/// An event indicating a user has deposited collateral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralSupplied {
    pub from: Addr,
    pub on_behalf: Addr,
    pub denom: Denom,
    pub amount: Uint128,
    pub scaled_collateral: Uint128,
}

/// An event indicating a user has withdrawn collateral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralWithdrawn {
    pub caller: Addr,
    pub on_behalf: Addr,
    pub receiver: Addr,
    pub denom: Denom,
    pub amount: Uint128,
    pub scaled_collateral: Uint128,
}

/// An event indicating a borrower has been liquidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liquidated {
    pub liquidator: Addr,
    pub borrower: Addr,
    pub borrow_denom: Denom,
    pub repaid: Uint128,
    pub collateral_denom: Denom,
    pub seized: Uint128,
}

/// An event indicating one side's delta has changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2PSupplyDeltaUpdated {
    pub denom: Denom,
    pub scaled_delta: Uint128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2PBorrowDeltaUpdated {
    pub denom: Denom,
    pub scaled_delta: Uint128,
}

/// An event indicating the global peer-to-peer totals have changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2PTotalsUpdated {
    pub denom: Denom,
    pub scaled_supply_total: Uint128,
    pub scaled_borrow_total: Uint128,
}

/// An event indicating the idle supply of a market has changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleSupplyUpdated {
    pub denom: Denom,
    pub idle_supply: Uint128,
}

/// Any domain event emitted by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    MarketCreated(MarketCreated),
    Supplied(Supplied),
    Borrowed(Borrowed),
    Repaid(Repaid),
    Withdrawn(Withdrawn),
    CollateralSupplied(CollateralSupplied),
    CollateralWithdrawn(CollateralWithdrawn),
    Liquidated(Liquidated),
    P2PSupplyDeltaUpdated(P2PSupplyDeltaUpdated),
    P2PBorrowDeltaUpdated(P2PBorrowDeltaUpdated),
    P2PTotalsUpdated(P2PTotalsUpdated),
    IdleSupplyUpdated(IdleSupplyUpdated),
}

macro_rules! impl_from_event {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl From<$variant> for Event {
                fn from(event: $variant) -> Self {
                    Self::$variant(event)
                }
            }
        )+
    };
}

impl_from_event! {
    MarketCreated,
    Supplied,
    Borrowed,
    Repaid,
    Withdrawn,
    CollateralSupplied,
    CollateralWithdrawn,
    Liquidated,
    P2PSupplyDeltaUpdated,
    P2PBorrowDeltaUpdated,
    P2PTotalsUpdated,
    IdleSupplyUpdated,
}
