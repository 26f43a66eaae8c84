use {
    crate::{Addr, Denom},
    braid_math::MathError,
};

pub type Result<T> = core::result::Result<T, Error>;

/// The operation error taxonomy.
///
/// Every failure reports exactly one reason and aborts the whole operation;
/// there is no partial success. The four classes are distinguishable so
/// callers can branch: validation and policy failures are permanent for the
/// given request, authorization failures may be retried with different
/// parameters, and collaborator failures are propagated unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ------------------------------ validation -------------------------------
    #[error("user address is zero")]
    AddressIsZero,

    #[error("amount is zero")]
    AmountIsZero,

    #[error("market `{0}` is not created")]
    MarketNotCreated(Denom),

    #[error("invalid address `{input}`: {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("invalid denom `{input}`: {reason}")]
    InvalidDenom { input: String, reason: String },

    #[error("`{user}` has no debt to repay on market `{denom}`")]
    DebtIsZero { user: Addr, denom: Denom },

    #[error("`{user}` has no supply to withdraw on market `{denom}`")]
    SupplyIsZero { user: Addr, denom: Denom },

    #[error("`{user}` has no collateral to withdraw on market `{denom}`")]
    CollateralIsZero { user: Addr, denom: Denom },

    // -------------------------------- policy ---------------------------------
    #[error("supply is paused on market `{0}`")]
    SupplyIsPaused(Denom),

    #[error("borrow is paused on market `{0}`")]
    BorrowIsPaused(Denom),

    #[error("repay is paused on market `{0}`")]
    RepayIsPaused(Denom),

    #[error("withdraw is paused on market `{0}`")]
    WithdrawIsPaused(Denom),

    #[error("supplying collateral is paused on market `{0}`")]
    SupplyCollateralIsPaused(Denom),

    #[error("withdrawing collateral is paused on market `{0}`")]
    WithdrawCollateralIsPaused(Denom),

    #[error("liquidating collateral is paused on market `{0}`")]
    LiquidateCollateralIsPaused(Denom),

    #[error("liquidating borrows is paused on market `{0}`")]
    LiquidateBorrowIsPaused(Denom),

    #[error("market `{0}` is deprecated; only liquidation is allowed")]
    MarketIsDeprecated(Denom),

    #[error("borrowing is not enabled on market `{0}`")]
    BorrowNotEnabled(Denom),

    #[error("market `{0}` is not usable as collateral")]
    AssetNotCollateral(Denom),

    #[error("market `{0}` cannot be deprecated while borrowing is not paused")]
    BorrowNotPaused(Denom),

    // ----------------------------- authorization -----------------------------
    #[error("`{manager}` is not approved to manage positions of `{owner}`")]
    PermissionDenied { owner: Addr, manager: Addr },

    #[error("borrow would leave `{user}` undercollateralized")]
    UnauthorizedBorrow { user: Addr },

    #[error("collateral withdrawal would leave `{user}` undercollateralized")]
    UnauthorizedWithdraw { user: Addr },

    #[error("position of `{user}` is not liquidatable")]
    LiquidationNotAuthorized { user: Addr },

    #[error("liquidation is currently disallowed by the oracle sentinel")]
    SentinelDisallowsLiquidation,

    // ----------------------------- collaborator ------------------------------
    #[error("collaborator call failed: {0}")]
    Collaborator(#[from] anyhow::Error),

    // --------------------------------- math ----------------------------------
    #[error(transparent)]
    Math(#[from] MathError),
}
