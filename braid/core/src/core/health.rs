//! Position health and liquidation authorization.
//!
//! All values here are oracle-denominated: collateral is valued rounding
//! down and debt rounding up, so health is never overstated.

use {
    braid_math::{IsZero, MathResult, MultiplyFraction, NumberConst, Ray, Uint128},
    braid_types::{
        Addr, Error, Result, BAD_DEBT_LIQUIDATION_THRESHOLD, DEFAULT_CLOSE_FACTOR,
        DEFAULT_LIQUIDATION_THRESHOLD, MAX_CLOSE_FACTOR,
    },
};

/// One collateral position, pre-valued and paired with its risk parameters.
#[derive(Debug, Clone, Copy)]
pub struct CollateralInput {
    pub amount: Uint128,
    pub price: Ray,
    pub ltv: Ray,
    pub liquidation_threshold: Ray,
}

/// One debt position, pre-valued.
#[derive(Debug, Clone, Copy)]
pub struct DebtInput {
    pub amount: Uint128,
    pub price: Ray,
}

/// Aggregated position health, in oracle value terms.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityData {
    /// Maximum debt value new borrows may reach: collateral value weighted
    /// by loan-to-value.
    pub borrowable: Uint128,
    /// Debt value beyond which the position is liquidatable: collateral
    /// value weighted by liquidation threshold.
    pub max_debt: Uint128,
    /// Current debt value.
    pub debt: Uint128,
}

pub fn liquidity_data(
    collaterals: impl IntoIterator<Item = CollateralInput>,
    debts: impl IntoIterator<Item = DebtInput>,
) -> MathResult<LiquidityData> {
    let mut data = LiquidityData::default();

    for collateral in collaterals {
        let value = collateral.amount.checked_mul_ray_floor(collateral.price)?;
        data.borrowable = data
            .borrowable
            .checked_add(value.checked_mul_ray_floor(collateral.ltv)?)?;
        data.max_debt = data
            .max_debt
            .checked_add(value.checked_mul_ray_floor(collateral.liquidation_threshold)?)?;
    }

    for debt in debts {
        data.debt = data
            .debt
            .checked_add(debt.amount.checked_mul_ray_ceil(debt.price)?)?;
    }

    Ok(data)
}

/// `max_debt / debt`; a debt-free position is maximally healthy.
pub fn health_factor(data: &LiquidityData) -> MathResult<Ray> {
    if data.debt.is_zero() {
        return Ok(Ray::MAX);
    }

    Ray::checked_from_ratio(data.max_debt, data.debt)
}

/// A borrow is authorized while the resulting debt stays within the
/// loan-to-value budget.
pub fn authorize_borrow(user: Addr, data: &LiquidityData) -> Result<()> {
    if data.debt > data.borrowable {
        return Err(Error::UnauthorizedBorrow { user });
    }

    Ok(())
}

/// A collateral withdrawal is authorized while the position stays above the
/// liquidation threshold.
pub fn authorize_withdraw_collateral(user: Addr, data: &LiquidityData) -> Result<()> {
    if data.debt > data.max_debt {
        return Err(Error::UnauthorizedWithdraw { user });
    }

    Ok(())
}

/// Decide whether `user` may be liquidated and with what close factor.
///
/// A deprecated borrow market is liquidatable in full regardless of health.
/// Otherwise: healthy positions are rejected; mildly unhealthy ones may be
/// half-closed, subject to the sentinel; severely unhealthy ones may be
/// fully closed. The sentinel is only queried in the mild band, so an
/// unavailable sentinel cannot block the other regimes.
pub fn authorize_liquidation(
    user: Addr,
    health_factor: Ray,
    borrow_market_deprecated: bool,
    sentinel_allows: impl FnOnce() -> anyhow::Result<bool>,
) -> Result<Ray> {
    if borrow_market_deprecated {
        return Ok(MAX_CLOSE_FACTOR);
    }

    if health_factor >= DEFAULT_LIQUIDATION_THRESHOLD {
        return Err(Error::LiquidationNotAuthorized { user });
    }

    if health_factor >= BAD_DEBT_LIQUIDATION_THRESHOLD {
        if !sentinel_allows()? {
            return Err(Error::SentinelDisallowsLiquidation);
        }
        return Ok(DEFAULT_CLOSE_FACTOR);
    }

    Ok(MAX_CLOSE_FACTOR)
}

/// Compute how much collateral a liquidation seizes for a given repayment,
/// capping both at the available collateral.
///
/// Returns `(seized, repaid)`: when the bonus-adjusted seizure exceeds the
/// borrower's collateral, the seizure is capped there and the repayment
/// shrinks proportionally.
pub fn seize_amounts(
    repaid: Uint128,
    borrow_price: Ray,
    collateral_price: Ray,
    liquidation_bonus: Ray,
    collateral_balance: Uint128,
) -> MathResult<(Uint128, Uint128)> {
    let seized = repaid
        .checked_mul_ray_floor(borrow_price)?
        .checked_mul_ray_floor(liquidation_bonus)?
        .checked_div_ray_floor(collateral_price)?;

    if seized <= collateral_balance {
        return Ok((seized, repaid));
    }

    let repaid = collateral_balance
        .checked_mul_ray_floor(collateral_price)?
        .checked_div_ray_floor(liquidation_bonus)?
        .checked_div_ray_floor(borrow_price)?;

    Ok((collateral_balance, repaid))
}
