//! The bounded matching engine.
//!
//! Promotion moves users from the pool into peer-to-peer matches; demotion
//! is the inverse. Both walk their ranking best-first under a
//! caller-supplied loop budget. A demotion cut short by the budget is fine:
//! the unwinding flow absorbs the shortfall into the deltas instead.

use {
    crate::state::Staged,
    braid_math::{IsZero, MathResult, MultiplyFraction, NumberConst, Uint128},
    braid_types::{Indexes, Side},
};

/// Which population a matching pass walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Suppliers,
    Borrowers,
}

impl MatchKind {
    fn side(self) -> Side {
        match self {
            MatchKind::Suppliers => Side::Supply,
            MatchKind::Borrowers => Side::Borrow,
        }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub matched: Uint128,
    pub loops_used: u64,
}

/// Move up to `amount` underlying of pool-side users into peer-to-peer,
/// best-ranked first. Visiting one candidate costs one loop; the pass stops
/// when the amount is filled, the budget is spent, or candidates run out.
///
/// No-op when matching is disabled on the market.
pub fn promote(
    staged: &mut Staged,
    kind: MatchKind,
    amount: Uint128,
    max_loops: u64,
    indexes: &Indexes,
) -> MathResult<MatchOutcome> {
    if staged.market.is_p2p_disabled || amount.is_zero() || max_loops == 0 {
        return Ok(MatchOutcome::default());
    }

    let side = kind.side();
    let side_indexes = indexes.side(side);
    let candidates = staged.vault().pool_tree(side).snapshot_descending();

    let mut remaining = amount;
    let mut loops_used = 0;

    for addr in candidates {
        if remaining.is_zero() || loops_used == max_loops {
            break;
        }
        loops_used += 1;

        let balances = staged.balance(addr);
        let scaled_on_pool = balances.scaled_pool(side);
        if scaled_on_pool.is_zero() {
            continue;
        }

        let available = scaled_on_pool.checked_mul_ray_floor(side_indexes.pool_index)?;
        let take = remaining.min(available);
        if take.is_zero() {
            continue;
        }

        let (new_on_pool, p2p_increment) = match side {
            // Suppliers: shrink pool credit aggressively, grant p2p credit
            // conservatively.
            Side::Supply => (
                if take == available {
                    Uint128::ZERO
                } else {
                    scaled_on_pool.zero_floor_sub(take.checked_div_ray_ceil(side_indexes.pool_index)?)
                },
                take.checked_div_ray_floor(side_indexes.p2p_index)?,
            ),
            // Borrowers: shrink pool debt conservatively, grow p2p debt
            // aggressively.
            Side::Borrow => (
                if take == available {
                    Uint128::ZERO
                } else {
                    scaled_on_pool.zero_floor_sub(take.checked_div_ray_floor(side_indexes.pool_index)?)
                },
                take.checked_div_ray_ceil(side_indexes.p2p_index)?,
            ),
        };

        let balances = staged.balance_mut(addr);
        *balances.scaled_pool_mut(side) = new_on_pool;
        let in_p2p = balances.scaled_p2p_mut(side);
        *in_p2p = in_p2p.checked_add(p2p_increment)?;

        remaining = remaining.zero_floor_sub(take);
    }

    Ok(MatchOutcome {
        matched: amount.zero_floor_sub(remaining),
        loops_used,
    })
}

/// Move up to `amount` underlying of peer-to-peer users back to the pool,
/// best-ranked first, under the same loop budget as promotion. Runs even
/// when matching is disabled, so a disabled market can still unwind.
pub fn demote(
    staged: &mut Staged,
    kind: MatchKind,
    amount: Uint128,
    max_loops: u64,
    indexes: &Indexes,
) -> MathResult<Uint128> {
    if amount.is_zero() || max_loops == 0 {
        return Ok(Uint128::ZERO);
    }

    let side = kind.side();
    let side_indexes = indexes.side(side);
    let candidates = staged.vault().p2p_tree(side).snapshot_descending();

    let mut remaining = amount;
    let mut loops_used = 0;

    for addr in candidates {
        if remaining.is_zero() || loops_used == max_loops {
            break;
        }
        loops_used += 1;

        let balances = staged.balance(addr);
        let scaled_in_p2p = balances.scaled_p2p(side);
        if scaled_in_p2p.is_zero() {
            continue;
        }

        let available = match side {
            Side::Supply => scaled_in_p2p.checked_mul_ray_floor(side_indexes.p2p_index)?,
            Side::Borrow => scaled_in_p2p.checked_mul_ray_ceil(side_indexes.p2p_index)?,
        };
        let take = remaining.min(available);
        if take.is_zero() {
            continue;
        }

        let (new_in_p2p, pool_increment) = match side {
            Side::Supply => (
                if take == available {
                    Uint128::ZERO
                } else {
                    scaled_in_p2p.zero_floor_sub(take.checked_div_ray_ceil(side_indexes.p2p_index)?)
                },
                take.checked_div_ray_floor(side_indexes.pool_index)?,
            ),
            Side::Borrow => (
                if take == available {
                    Uint128::ZERO
                } else {
                    scaled_in_p2p.zero_floor_sub(take.checked_div_ray_floor(side_indexes.p2p_index)?)
                },
                take.checked_div_ray_ceil(side_indexes.pool_index)?,
            ),
        };

        let balances = staged.balance_mut(addr);
        *balances.scaled_p2p_mut(side) = new_in_p2p;
        let on_pool = balances.scaled_pool_mut(side);
        *on_pool = on_pool.checked_add(pool_increment)?;

        remaining = remaining.zero_floor_sub(take);
    }

    Ok(amount.zero_floor_sub(remaining))
}
