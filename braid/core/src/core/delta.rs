//! Pure delta and peer-to-peer total accounting.
//!
//! Deltas are consumed with priority by incoming flow on the opposite side,
//! before any matching. Consumption rounds the scaled decrease up and
//! creation rounds the scaled increase down; peer-to-peer totals grow with
//! floor division and shrink with ceiling division. Every decrease is
//! zero-floored.

use {
    braid_math::{IsZero, MathResult, MultiplyFraction, NumberConst, Ray, Uint128},
    braid_types::{Deltas, Indexes, MarketSideDelta, Side},
};

/// Consume one side's delta against incoming underlying flow.
///
/// Returns the underlying amount matched against the delta, at most
/// `amount`.
pub fn decrease_delta(
    delta: &mut MarketSideDelta,
    amount: Uint128,
    pool_index: Ray,
) -> MathResult<Uint128> {
    if delta.scaled_delta.is_zero() || amount.is_zero() {
        return Ok(Uint128::ZERO);
    }

    let available = delta.scaled_delta.checked_mul_ray_floor(pool_index)?;
    let matched = amount.min(available);

    delta.scaled_delta = delta
        .scaled_delta
        .zero_floor_sub(matched.checked_div_ray_ceil(pool_index)?);

    Ok(matched)
}

/// Record underlying that had to be parked on the pool while still counted
/// peer-to-peer.
pub fn increase_delta(
    delta: &mut MarketSideDelta,
    amount: Uint128,
    pool_index: Ray,
) -> MathResult<()> {
    if amount.is_zero() {
        return Ok(());
    }

    delta.scaled_delta = delta
        .scaled_delta
        .checked_add(amount.checked_div_ray_floor(pool_index)?)?;

    Ok(())
}

/// Record new peer-to-peer volume after a promotion.
///
/// `total` is the full underlying amount newly credited to the incoming
/// side; `promoted` is the part of it that was covered by promoting users on
/// `promoted_side` (the delta-consumed remainder is already counted in that
/// side's total).
pub fn increase_p2p(
    deltas: &mut Deltas,
    promoted_side: Side,
    promoted: Uint128,
    total: Uint128,
    indexes: &Indexes,
) -> MathResult<()> {
    if total.is_zero() {
        return Ok(());
    }

    let incoming_side = match promoted_side {
        Side::Supply => Side::Borrow,
        Side::Borrow => Side::Supply,
    };

    let incoming = deltas.side_mut(incoming_side);
    incoming.scaled_p2p_total = incoming
        .scaled_p2p_total
        .checked_add(total.checked_div_ray_floor(indexes.side(incoming_side).p2p_index)?)?;

    let promoted_total = deltas.side_mut(promoted_side);
    promoted_total.scaled_p2p_total = promoted_total
        .scaled_p2p_total
        .checked_add(promoted.checked_div_ray_floor(indexes.side(promoted_side).p2p_index)?)?;

    Ok(())
}

/// Shrink both peer-to-peer totals after a match is unwound.
pub fn decrease_p2p(
    deltas: &mut Deltas,
    supply_amount: Uint128,
    borrow_amount: Uint128,
    indexes: &Indexes,
) -> MathResult<()> {
    let supply = &mut deltas.supply;
    supply.scaled_p2p_total = supply
        .scaled_p2p_total
        .zero_floor_sub(supply_amount.checked_div_ray_ceil(indexes.supply.p2p_index)?);

    let borrow = &mut deltas.borrow;
    borrow.scaled_p2p_total = borrow
        .scaled_p2p_total
        .zero_floor_sub(borrow_amount.checked_div_ray_ceil(indexes.borrow.p2p_index)?);

    Ok(())
}

/// Deduct the protocol fee from a repayment and shrink the borrow total
/// accordingly.
///
/// The fee is the surplus of delta-adjusted peer-to-peer borrow volume over
/// delta-adjusted peer-to-peer supply volume: the spread the reserve factor
/// has accrued to the protocol. Returns the amount left to match after the
/// fee.
pub fn repay_fee(deltas: &mut Deltas, amount: Uint128, indexes: &Indexes) -> MathResult<Uint128> {
    if amount.is_zero() {
        return Ok(Uint128::ZERO);
    }

    let borrow_volume = deltas
        .borrow
        .scaled_p2p_total
        .checked_mul_ray_floor(indexes.borrow.p2p_index)?
        .zero_floor_sub(
            deltas
                .borrow
                .scaled_delta
                .checked_mul_ray_floor(indexes.borrow.pool_index)?,
        );
    let supply_volume = deltas
        .supply
        .scaled_p2p_total
        .checked_mul_ray_floor(indexes.supply.p2p_index)?
        .zero_floor_sub(
            deltas
                .supply
                .scaled_delta
                .checked_mul_ray_floor(indexes.supply.pool_index)?,
        );

    let fee = amount.min(borrow_volume.zero_floor_sub(supply_volume));
    if fee.is_zero() {
        return Ok(amount);
    }

    deltas.borrow.scaled_p2p_total = deltas
        .borrow
        .scaled_p2p_total
        .zero_floor_sub(fee.checked_div_ray_floor(indexes.borrow.p2p_index)?);

    Ok(amount.zero_floor_sub(fee))
}

#[cfg(test)]
mod tests {
    use {super::*, braid_math::Ray, test_case::test_case};

    fn indexes() -> Indexes {
        Indexes::ONE
    }

    #[test_case(100, 40, 40, 60; "partial consumption")]
    #[test_case(100, 250, 100, 0; "amount exceeds delta")]
    #[test_case(0, 50, 0, 0; "no delta to consume")]
    fn decrease_delta_consumes_up_to_amount(
        delta: u128,
        amount: u128,
        expect_matched: u128,
        expect_delta: u128,
    ) {
        let mut side = MarketSideDelta {
            scaled_delta: Uint128::new(delta),
            scaled_p2p_total: Uint128::ZERO,
        };

        let matched =
            decrease_delta(&mut side, Uint128::new(amount), Ray::ONE).unwrap();

        assert_eq!(matched, Uint128::new(expect_matched));
        assert_eq!(side.scaled_delta, Uint128::new(expect_delta));
    }

    #[test]
    fn decrease_delta_rounds_scaled_decrease_up() {
        // Index 2.0: 10 scaled = 20 underlying. Consuming 5 underlying must
        // remove ceil(5 / 2) = 3 scaled.
        let mut side = MarketSideDelta {
            scaled_delta: Uint128::new(10),
            scaled_p2p_total: Uint128::ZERO,
        };
        let index = Ray::checked_from_ratio(Uint128::new(2), Uint128::new(1)).unwrap();

        let matched = decrease_delta(&mut side, Uint128::new(5), index).unwrap();

        assert_eq!(matched, Uint128::new(5));
        assert_eq!(side.scaled_delta, Uint128::new(7));
    }

    #[test]
    fn increase_delta_rounds_scaled_increase_down() {
        let mut side = MarketSideDelta::default();
        let index = Ray::checked_from_ratio(Uint128::new(3), Uint128::new(1)).unwrap();

        increase_delta(&mut side, Uint128::new(10), index).unwrap();

        assert_eq!(side.scaled_delta, Uint128::new(3));
    }

    #[test]
    fn increase_p2p_splits_between_sides() {
        let mut deltas = Deltas::default();

        // 100 credited to the supply side, 70 of which came from promoting
        // borrowers (the other 30 consumed the borrow delta).
        increase_p2p(
            &mut deltas,
            Side::Borrow,
            Uint128::new(70),
            Uint128::new(100),
            &indexes(),
        )
        .unwrap();

        assert_eq!(deltas.supply.scaled_p2p_total, Uint128::new(100));
        assert_eq!(deltas.borrow.scaled_p2p_total, Uint128::new(70));
    }

    #[test]
    fn decrease_p2p_is_zero_floored() {
        let mut deltas = Deltas::default();
        deltas.supply.scaled_p2p_total = Uint128::new(50);
        deltas.borrow.scaled_p2p_total = Uint128::new(10);

        decrease_p2p(&mut deltas, Uint128::new(80), Uint128::new(80), &indexes()).unwrap();

        assert_eq!(deltas.supply.scaled_p2p_total, Uint128::ZERO);
        assert_eq!(deltas.borrow.scaled_p2p_total, Uint128::ZERO);
    }

    #[test]
    fn repay_fee_is_capped_by_unbacked_volume() {
        let mut deltas = Deltas::default();
        deltas.borrow.scaled_p2p_total = Uint128::new(100);
        deltas.borrow.scaled_delta = Uint128::new(60);

        // Unbacked volume is 100 - 60 = 40, so at most 40 of the repayment
        // is taken as fee.
        let remaining = repay_fee(&mut deltas, Uint128::new(100), &indexes()).unwrap();

        assert_eq!(remaining, Uint128::new(60));
        assert_eq!(deltas.borrow.scaled_p2p_total, Uint128::new(60));
    }

    #[test]
    fn repay_fee_is_reduced_by_matched_supply_volume() {
        let mut deltas = Deltas::default();
        deltas.borrow.scaled_p2p_total = Uint128::new(100);
        deltas.supply.scaled_p2p_total = Uint128::new(90);

        // Only the 10-unit spread surplus is taken as fee.
        let remaining = repay_fee(&mut deltas, Uint128::new(50), &indexes()).unwrap();

        assert_eq!(remaining, Uint128::new(40));
        assert_eq!(deltas.borrow.scaled_p2p_total, Uint128::new(90));
    }

    #[test]
    fn repay_fee_is_zero_when_delta_covers_volume() {
        let mut deltas = Deltas::default();
        deltas.borrow.scaled_p2p_total = Uint128::new(100);
        deltas.borrow.scaled_delta = Uint128::new(100);

        let remaining = repay_fee(&mut deltas, Uint128::new(50), &indexes()).unwrap();

        assert_eq!(remaining, Uint128::new(50));
        assert_eq!(deltas.borrow.scaled_p2p_total, Uint128::new(100));
    }
}
