//! The staged position flows.
//!
//! Each flow mutates a [`Staged`] operation built over the committed vault
//! (with freshly refreshed indexes on the market copy): updated ledger,
//! touched balances, and the net pool intents. Nothing is committed here;
//! the execution layer runs the pool calls and commits only if they all
//! succeed. Flows compose: liquidation runs a repayment and a collateral
//! seizure through the same staged state when both legs share a market.
//!
//! All flows share the same shape: consume the opposite delta first, then
//! match against ranked users under the loop budget, and let the pool absorb
//! whatever could not be matched. Unwinding flows (repay, withdraw) park
//! whatever the budget left undemoted in the deltas.

use {
    crate::{
        core::{
            delta,
            matching::{self, MatchKind},
        },
        state::Staged,
    },
    braid_math::{IsZero, MultiplyFraction, NumberConst, Uint128},
    braid_types::{
        Addr, Error, IdleSupplyUpdated, Market, P2PBorrowDeltaUpdated, P2PSupplyDeltaUpdated,
        P2PTotalsUpdated, Result, Side,
    },
};

/// Emit ledger-level events for whatever the flow changed.
fn emit_ledger_events(staged: &mut Staged, before: &Market) {
    let denom = staged.market.denom.clone();

    if staged.market.deltas.supply.scaled_delta != before.deltas.supply.scaled_delta {
        staged.push_event(P2PSupplyDeltaUpdated {
            denom: denom.clone(),
            scaled_delta: staged.market.deltas.supply.scaled_delta,
        });
    }

    if staged.market.deltas.borrow.scaled_delta != before.deltas.borrow.scaled_delta {
        staged.push_event(P2PBorrowDeltaUpdated {
            denom: denom.clone(),
            scaled_delta: staged.market.deltas.borrow.scaled_delta,
        });
    }

    if staged.market.deltas.supply.scaled_p2p_total != before.deltas.supply.scaled_p2p_total
        || staged.market.deltas.borrow.scaled_p2p_total != before.deltas.borrow.scaled_p2p_total
    {
        staged.push_event(P2PTotalsUpdated {
            denom: denom.clone(),
            scaled_supply_total: staged.market.deltas.supply.scaled_p2p_total,
            scaled_borrow_total: staged.market.deltas.borrow.scaled_p2p_total,
        });
    }

    if staged.market.idle_supply != before.idle_supply {
        staged.push_event(IdleSupplyUpdated {
            denom,
            idle_supply: staged.market.idle_supply,
        });
    }
}

/// Stage a supply: consume the borrow delta, promote pool borrowers, and
/// send the rest to the pool.
pub fn supply(
    staged: &mut Staged,
    on_behalf: Addr,
    amount: Uint128,
    max_loops: u64,
) -> Result<()> {
    let before = staged.market.clone();
    let indexes = staged.market.indexes;

    let mut remaining = amount;
    let mut to_repay = Uint128::ZERO;

    if !staged.market.is_p2p_disabled {
        let matched_delta = delta::decrease_delta(
            &mut staged.market.deltas.borrow,
            remaining,
            indexes.borrow.pool_index,
        )?;
        remaining = remaining.zero_floor_sub(matched_delta);
        to_repay = to_repay.checked_add(matched_delta)?;

        let outcome = matching::promote(
            staged,
            MatchKind::Borrowers,
            remaining,
            max_loops,
            &indexes,
        )?;
        remaining = remaining.zero_floor_sub(outcome.matched);
        to_repay = to_repay.checked_add(outcome.matched)?;

        if to_repay.is_non_zero() {
            delta::increase_p2p(
                &mut staged.market.deltas,
                Side::Borrow,
                outcome.matched,
                to_repay,
                &indexes,
            )?;

            let credit = to_repay.checked_div_ray_floor(indexes.supply.p2p_index)?;
            let balances = staged.balance_mut(on_behalf);
            balances.scaled_p2p_supply = balances.scaled_p2p_supply.checked_add(credit)?;
        }
    }

    if remaining.is_non_zero() {
        let credit = remaining.checked_div_ray_floor(indexes.supply.pool_index)?;
        let balances = staged.balance_mut(on_behalf);
        balances.scaled_pool_supply = balances.scaled_pool_supply.checked_add(credit)?;
    }

    staged.intents.repay = staged.intents.repay.checked_add(to_repay)?;
    staged.intents.supply = staged.intents.supply.checked_add(remaining)?;

    emit_ledger_events(staged, &before);

    Ok(())
}

/// Stage a borrow: draw on idle supply, consume the supply delta, promote
/// pool suppliers, and borrow the rest from the pool.
pub fn borrow(
    staged: &mut Staged,
    on_behalf: Addr,
    amount: Uint128,
    max_loops: u64,
) -> Result<()> {
    let before = staged.market.clone();
    let indexes = staged.market.indexes;

    let mut remaining = amount;
    let mut to_withdraw = Uint128::ZERO;

    if !staged.market.is_p2p_disabled {
        // Idle supply is already counted in the supply-side peer-to-peer
        // total, so taking it only grows the borrow side.
        let idle_take = staged.market.idle_supply.min(remaining);
        if idle_take.is_non_zero() {
            staged.market.idle_supply = staged.market.idle_supply.zero_floor_sub(idle_take);
            remaining = remaining.zero_floor_sub(idle_take);

            let debt = idle_take.checked_div_ray_ceil(indexes.borrow.p2p_index)?;
            let balances = staged.balance_mut(on_behalf);
            balances.scaled_p2p_borrow = balances.scaled_p2p_borrow.checked_add(debt)?;

            let total = &mut staged.market.deltas.borrow.scaled_p2p_total;
            *total =
                total.checked_add(idle_take.checked_div_ray_floor(indexes.borrow.p2p_index)?)?;
        }

        let matched_delta = delta::decrease_delta(
            &mut staged.market.deltas.supply,
            remaining,
            indexes.supply.pool_index,
        )?;
        remaining = remaining.zero_floor_sub(matched_delta);
        to_withdraw = to_withdraw.checked_add(matched_delta)?;

        let outcome = matching::promote(
            staged,
            MatchKind::Suppliers,
            remaining,
            max_loops,
            &indexes,
        )?;
        remaining = remaining.zero_floor_sub(outcome.matched);
        to_withdraw = to_withdraw.checked_add(outcome.matched)?;

        if to_withdraw.is_non_zero() {
            delta::increase_p2p(
                &mut staged.market.deltas,
                Side::Supply,
                outcome.matched,
                to_withdraw,
                &indexes,
            )?;

            let debt = to_withdraw.checked_div_ray_ceil(indexes.borrow.p2p_index)?;
            let balances = staged.balance_mut(on_behalf);
            balances.scaled_p2p_borrow = balances.scaled_p2p_borrow.checked_add(debt)?;
        }
    }

    if remaining.is_non_zero() {
        let debt = remaining.checked_div_ray_ceil(indexes.borrow.pool_index)?;
        let balances = staged.balance_mut(on_behalf);
        balances.scaled_pool_borrow = balances.scaled_pool_borrow.checked_add(debt)?;
    }

    staged.intents.withdraw = staged.intents.withdraw.checked_add(to_withdraw)?;
    staged.intents.borrow = staged.intents.borrow.checked_add(remaining)?;

    emit_ledger_events(staged, &before);

    Ok(())
}

/// Stage a repayment. Returns the amount actually repaid, which is the
/// request clamped to the outstanding debt.
///
/// `supply_headroom` is how much more the pool accepts before hitting its
/// supply cap; any re-supplied residual beyond it is parked as idle supply.
pub fn repay(
    staged: &mut Staged,
    on_behalf: Addr,
    amount: Uint128,
    max_loops: u64,
    supply_headroom: Uint128,
) -> Result<Uint128> {
    let before = staged.market.clone();
    let indexes = staged.market.indexes;

    let balances = staged.balance(on_behalf);
    let pool_debt = balances
        .scaled_pool_borrow
        .checked_mul_ray_ceil(indexes.borrow.pool_index)?;
    let p2p_debt = balances
        .scaled_p2p_borrow
        .checked_mul_ray_ceil(indexes.borrow.p2p_index)?;

    let repaid = amount.min(pool_debt.checked_add(p2p_debt)?);
    if repaid.is_zero() {
        return Err(Error::DebtIsZero {
            user: on_behalf,
            denom: staged.market.denom.clone(),
        });
    }

    let mut remaining = repaid;
    let mut to_repay = Uint128::ZERO;

    // Pool debt first.
    let pool_take = remaining.min(pool_debt);
    if pool_take.is_non_zero() {
        let balances = staged.balance_mut(on_behalf);
        balances.scaled_pool_borrow = if pool_take == pool_debt {
            Uint128::ZERO
        } else {
            balances
                .scaled_pool_borrow
                .zero_floor_sub(pool_take.checked_div_ray_floor(indexes.borrow.pool_index)?)
        };
        remaining = remaining.zero_floor_sub(pool_take);
        to_repay = to_repay.checked_add(pool_take)?;
    }

    if remaining.is_zero() {
        staged.intents.repay = staged.intents.repay.checked_add(to_repay)?;
        emit_ledger_events(staged, &before);
        return Ok(repaid);
    }

    // Peer-to-peer debt.
    let p2p_take = remaining.min(p2p_debt);
    {
        let balances = staged.balance_mut(on_behalf);
        balances.scaled_p2p_borrow = if p2p_take == p2p_debt {
            Uint128::ZERO
        } else {
            balances
                .scaled_p2p_borrow
                .zero_floor_sub(p2p_take.checked_div_ray_floor(indexes.borrow.p2p_index)?)
        };
    }

    // The delta-covered part of the match was already sitting on the pool.
    let matched_delta = delta::decrease_delta(
        &mut staged.market.deltas.borrow,
        p2p_take,
        indexes.borrow.pool_index,
    )?;
    to_repay = to_repay.checked_add(matched_delta)?;
    let after_delta = p2p_take.zero_floor_sub(matched_delta);

    let after_fee = delta::repay_fee(&mut staged.market.deltas, after_delta, &indexes)?;

    // Replace the leaving borrower with pool borrowers where possible.
    let outcome = matching::promote(
        staged,
        MatchKind::Borrowers,
        after_fee,
        max_loops,
        &indexes,
    )?;
    to_repay = to_repay.checked_add(outcome.matched)?;
    let unmatched = after_fee.zero_floor_sub(outcome.matched);

    // Unwind the suppliers that are left without a borrower.
    let demoted = matching::demote(staged, MatchKind::Suppliers, unmatched, max_loops, &indexes)?;
    if demoted < unmatched {
        delta::increase_delta(
            &mut staged.market.deltas.supply,
            unmatched.zero_floor_sub(demoted),
            indexes.supply.pool_index,
        )?;
    }

    delta::decrease_p2p(
        &mut staged.market.deltas,
        demoted,
        matched_delta.checked_add(unmatched)?,
        &indexes,
    )?;

    // The unwound money goes back to the pool, up to its supply cap; the
    // rest is parked idle.
    let to_supply = unmatched.min(supply_headroom);
    let to_idle = unmatched.zero_floor_sub(to_supply);
    if to_idle.is_non_zero() {
        staged.market.idle_supply = staged.market.idle_supply.checked_add(to_idle)?;
    }

    staged.intents.repay = staged.intents.repay.checked_add(to_repay)?;
    staged.intents.supply = staged.intents.supply.checked_add(to_supply)?;

    emit_ledger_events(staged, &before);

    Ok(repaid)
}

/// Stage a withdrawal. Returns the amount actually withdrawn, which is the
/// request clamped to the user's supply balance.
pub fn withdraw(
    staged: &mut Staged,
    on_behalf: Addr,
    amount: Uint128,
    max_loops: u64,
) -> Result<Uint128> {
    let before = staged.market.clone();
    let indexes = staged.market.indexes;

    let balances = staged.balance(on_behalf);
    let pool_supply = balances
        .scaled_pool_supply
        .checked_mul_ray_floor(indexes.supply.pool_index)?;
    let p2p_supply = balances
        .scaled_p2p_supply
        .checked_mul_ray_floor(indexes.supply.p2p_index)?;

    let withdrawn = amount.min(pool_supply.checked_add(p2p_supply)?);
    if withdrawn.is_zero() {
        return Err(Error::SupplyIsZero {
            user: on_behalf,
            denom: staged.market.denom.clone(),
        });
    }

    let mut remaining = withdrawn;
    let mut to_withdraw = Uint128::ZERO;

    // Pool supply first.
    let pool_take = remaining.min(pool_supply);
    if pool_take.is_non_zero() {
        let balances = staged.balance_mut(on_behalf);
        balances.scaled_pool_supply = if pool_take == pool_supply {
            Uint128::ZERO
        } else {
            balances
                .scaled_pool_supply
                .zero_floor_sub(pool_take.checked_div_ray_ceil(indexes.supply.pool_index)?)
        };
        remaining = remaining.zero_floor_sub(pool_take);
        to_withdraw = to_withdraw.checked_add(pool_take)?;
    }

    // Idle supply next: it is unlent cash, cheaper to hand out than
    // breaking a match.
    let idle_take = staged.market.idle_supply.min(remaining.min(p2p_supply));
    if idle_take.is_non_zero() {
        staged.market.idle_supply = staged.market.idle_supply.zero_floor_sub(idle_take);

        let scaled = idle_take.checked_div_ray_ceil(indexes.supply.p2p_index)?;
        let balances = staged.balance_mut(on_behalf);
        balances.scaled_p2p_supply = balances.scaled_p2p_supply.zero_floor_sub(scaled);

        let total = &mut staged.market.deltas.supply.scaled_p2p_total;
        *total = total.zero_floor_sub(scaled);

        remaining = remaining.zero_floor_sub(idle_take);
    }

    if remaining.is_zero() {
        staged.intents.withdraw = staged.intents.withdraw.checked_add(to_withdraw)?;
        emit_ledger_events(staged, &before);
        return Ok(withdrawn);
    }

    // Peer-to-peer supply.
    let p2p_take = remaining;
    {
        let balances = staged.balance_mut(on_behalf);
        balances.scaled_p2p_supply = if p2p_take == p2p_supply.zero_floor_sub(idle_take) {
            Uint128::ZERO
        } else {
            balances
                .scaled_p2p_supply
                .zero_floor_sub(p2p_take.checked_div_ray_floor(indexes.supply.p2p_index)?)
        };
    }

    // The delta-covered part of the match was already sitting on the pool.
    let matched_delta = delta::decrease_delta(
        &mut staged.market.deltas.supply,
        p2p_take,
        indexes.supply.pool_index,
    )?;
    to_withdraw = to_withdraw.checked_add(matched_delta)?;
    let after_delta = p2p_take.zero_floor_sub(matched_delta);

    // Replace the leaving supplier with pool suppliers where possible.
    let outcome = matching::promote(
        staged,
        MatchKind::Suppliers,
        after_delta,
        max_loops,
        &indexes,
    )?;
    to_withdraw = to_withdraw.checked_add(outcome.matched)?;
    let unmatched = after_delta.zero_floor_sub(outcome.matched);

    // Unwind the borrowers that are left without a supplier.
    let demoted = matching::demote(staged, MatchKind::Borrowers, unmatched, max_loops, &indexes)?;
    if demoted < unmatched {
        delta::increase_delta(
            &mut staged.market.deltas.borrow,
            unmatched.zero_floor_sub(demoted),
            indexes.borrow.pool_index,
        )?;
    }

    delta::decrease_p2p(
        &mut staged.market.deltas,
        matched_delta.checked_add(unmatched)?,
        demoted,
        &indexes,
    )?;

    staged.intents.withdraw = staged.intents.withdraw.checked_add(to_withdraw)?;
    staged.intents.borrow = staged.intents.borrow.checked_add(unmatched)?;

    emit_ledger_events(staged, &before);

    Ok(withdrawn)
}

/// Stage a collateral deposit. Collateral sits on the pool only and is
/// never matched.
pub fn supply_collateral(staged: &mut Staged, on_behalf: Addr, amount: Uint128) -> Result<()> {
    let indexes = staged.market.indexes;

    let credit = amount.checked_div_ray_floor(indexes.supply.pool_index)?;
    let balances = staged.balance_mut(on_behalf);
    balances.scaled_collateral = balances.scaled_collateral.checked_add(credit)?;

    staged.intents.supply = staged.intents.supply.checked_add(amount)?;

    Ok(())
}

/// Stage a collateral withdrawal. Returns the amount actually withdrawn.
pub fn withdraw_collateral(
    staged: &mut Staged,
    on_behalf: Addr,
    amount: Uint128,
) -> Result<Uint128> {
    let indexes = staged.market.indexes;

    let balances = staged.balance(on_behalf);
    let collateral = balances
        .scaled_collateral
        .checked_mul_ray_floor(indexes.supply.pool_index)?;

    let withdrawn = amount.min(collateral);
    if withdrawn.is_zero() {
        return Err(Error::CollateralIsZero {
            user: on_behalf,
            denom: staged.market.denom.clone(),
        });
    }

    let balances = staged.balance_mut(on_behalf);
    balances.scaled_collateral = if withdrawn == collateral {
        Uint128::ZERO
    } else {
        balances
            .scaled_collateral
            .zero_floor_sub(withdrawn.checked_div_ray_ceil(indexes.supply.pool_index)?)
    };

    staged.intents.withdraw = staged.intents.withdraw.checked_add(withdrawn)?;

    Ok(withdrawn)
}
