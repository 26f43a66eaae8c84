//! The public operation surface.
//!
//! Every operation follows the same sequence: validate the request, refresh
//! the market's indexes from the pool, stage the flow, check health where
//! required, execute the pool calls, and only then commit. A failure at any
//! step aborts the whole operation with the vault untouched.

use {
    crate::{
        core::{health, indexes, positions},
        state::{Braid, MarketVault, PoolIntents, Staged, StagedCommit},
        traits::{Oracle, Permissions, Pool},
    },
    braid_math::{IsZero, MultiplyFraction, NumberConst, Ray, Uint128},
    braid_types::{
        Addr, Borrowed, CollateralSupplied, CollateralWithdrawn, Denom, Error, Event, Liquidated,
        Market, MarketCreated, MarketParams, PauseStatuses, Repaid, Result, Supplied, Withdrawn,
    },
    tracing::{debug, info},
};

impl<P, O, A> Braid<P, O, A>
where
    P: Pool,
    O: Oracle,
    A: Permissions,
{
    /// Create a market for `denom`, seeding its indexes from the pool.
    /// Calling this again for an existing market is a no-op.
    pub fn create_market(&mut self, denom: Denom, params: MarketParams) -> Result<()> {
        if self.markets.contains_key(&denom) {
            return Ok(());
        }

        // Querying the configuration doubles as a check that the pool
        // actually lists this asset.
        self.pool.configuration(&denom)?;
        let pool_indexes = self.pool.reserve_indexes(&denom)?;

        let mut market = Market::new(denom.clone(), params);
        market.indexes.supply.pool_index = pool_indexes.supply_index;
        market.indexes.supply.p2p_index = pool_indexes.supply_index;
        market.indexes.borrow.pool_index = pool_indexes.borrow_index;
        market.indexes.borrow.p2p_index = pool_indexes.borrow_index;

        let vault = MarketVault::new(market, self.max_sorted_users);
        self.markets.insert(denom.clone(), vault);

        info!(%denom, "created market");
        self.events.push(MarketCreated { denom }.into());

        Ok(())
    }

    /// Pull fresh pool indexes and advance the peer-to-peer indexes.
    pub fn accrue(&mut self, denom: &Denom) -> Result<()> {
        let pool_indexes = self.pool.reserve_indexes(denom)?;
        let vault = self.vault_mut(denom)?;
        let market = &mut vault.market;

        market.indexes = indexes::refresh(
            &market.indexes,
            &pool_indexes,
            market.reserve_factor,
            market.p2p_index_cursor,
        )?;

        Ok(())
    }

    /// Supply `amount` to be lent out, credited to `on_behalf`. `max_loops`
    /// bounds this call's matching work; `None` uses the stored default.
    pub fn supply(
        &mut self,
        from: Addr,
        on_behalf: Addr,
        denom: &Denom,
        amount: Uint128,
        max_loops: Option<u64>,
    ) -> Result<()> {
        validate_actors(&[from, on_behalf])?;
        validate_amount(amount)?;

        let market = &self.vault(denom)?.market;
        if market.pause.supply_paused {
            return Err(Error::SupplyIsPaused(denom.clone()));
        }

        self.accrue(denom)?;

        let max_loops = max_loops.unwrap_or(self.max_loops);
        let mut staged = Staged::new(self.vault(denom)?);
        positions::supply(&mut staged, on_behalf, amount, max_loops)?;
        let resulting = staged.balance(on_behalf);
        let commit = staged.into_commit();

        self.run_intents(denom, commit.intents)?;
        self.finish(denom, commit, Supplied {
            from,
            on_behalf,
            denom: denom.clone(),
            amount,
            scaled_on_pool: resulting.scaled_pool_supply,
            scaled_in_p2p: resulting.scaled_p2p_supply,
        })?;

        debug!(%from, %on_behalf, %denom, %amount, "supplied");

        Ok(())
    }

    /// Borrow `amount` for `on_behalf`, sending the funds to `receiver`.
    /// The caller must be `on_behalf` or approved to manage them.
    pub fn borrow(
        &mut self,
        caller: Addr,
        on_behalf: Addr,
        receiver: Addr,
        denom: &Denom,
        amount: Uint128,
        max_loops: Option<u64>,
    ) -> Result<()> {
        validate_actors(&[caller, on_behalf, receiver])?;
        validate_amount(amount)?;
        self.validate_permission(on_behalf, caller)?;

        let market = &self.vault(denom)?.market;
        if market.pause.borrow_paused {
            return Err(Error::BorrowIsPaused(denom.clone()));
        }
        if market.is_deprecated {
            return Err(Error::MarketIsDeprecated(denom.clone()));
        }
        if !self.pool.configuration(denom)?.borrowing_enabled {
            return Err(Error::BorrowNotEnabled(denom.clone()));
        }

        self.accrue(denom)?;

        // The new debt must fit in the loan-to-value budget.
        let mut data = self.liquidity_data(on_behalf)?;
        let price = self.oracle.price(denom)?;
        data.debt = data.debt.checked_add(amount.checked_mul_ray_ceil(price)?)?;
        health::authorize_borrow(on_behalf, &data)?;

        let max_loops = max_loops.unwrap_or(self.max_loops);
        let mut staged = Staged::new(self.vault(denom)?);
        positions::borrow(&mut staged, on_behalf, amount, max_loops)?;
        let resulting = staged.balance(on_behalf);
        let commit = staged.into_commit();

        self.run_intents(denom, commit.intents)?;
        self.finish(denom, commit, Borrowed {
            caller,
            on_behalf,
            receiver,
            denom: denom.clone(),
            amount,
            scaled_on_pool: resulting.scaled_pool_borrow,
            scaled_in_p2p: resulting.scaled_p2p_borrow,
        })?;

        debug!(%caller, %on_behalf, %receiver, %denom, %amount, "borrowed");

        Ok(())
    }

    /// Repay up to `amount` of `on_behalf`'s debt. Returns the amount
    /// actually repaid.
    pub fn repay(
        &mut self,
        repayer: Addr,
        on_behalf: Addr,
        denom: &Denom,
        amount: Uint128,
        max_loops: Option<u64>,
    ) -> Result<Uint128> {
        validate_actors(&[repayer, on_behalf])?;
        validate_amount(amount)?;

        let market = &self.vault(denom)?.market;
        if market.pause.repay_paused {
            return Err(Error::RepayIsPaused(denom.clone()));
        }

        self.accrue(denom)?;

        let max_loops = max_loops.unwrap_or(self.max_loops);
        let headroom = self.supply_headroom(denom)?;
        let mut staged = Staged::new(self.vault(denom)?);
        let repaid = positions::repay(&mut staged, on_behalf, amount, max_loops, headroom)?;
        let resulting = staged.balance(on_behalf);
        let commit = staged.into_commit();

        self.run_intents(denom, commit.intents)?;
        self.finish(denom, commit, Repaid {
            repayer,
            on_behalf,
            denom: denom.clone(),
            amount: repaid,
            scaled_on_pool: resulting.scaled_pool_borrow,
            scaled_in_p2p: resulting.scaled_p2p_borrow,
        })?;

        debug!(%repayer, %on_behalf, %denom, %repaid, "repaid");

        Ok(repaid)
    }

    /// Withdraw up to `amount` of `on_behalf`'s supply, sending the funds to
    /// `receiver`. Returns the amount actually withdrawn.
    pub fn withdraw(
        &mut self,
        caller: Addr,
        on_behalf: Addr,
        receiver: Addr,
        denom: &Denom,
        amount: Uint128,
        max_loops: Option<u64>,
    ) -> Result<Uint128> {
        validate_actors(&[caller, on_behalf, receiver])?;
        validate_amount(amount)?;
        self.validate_permission(on_behalf, caller)?;

        let market = &self.vault(denom)?.market;
        if market.pause.withdraw_paused {
            return Err(Error::WithdrawIsPaused(denom.clone()));
        }

        self.accrue(denom)?;

        let max_loops = max_loops.unwrap_or(self.max_loops);
        let mut staged = Staged::new(self.vault(denom)?);
        let withdrawn = positions::withdraw(&mut staged, on_behalf, amount, max_loops)?;
        let resulting = staged.balance(on_behalf);
        let commit = staged.into_commit();

        self.run_intents(denom, commit.intents)?;
        self.finish(denom, commit, Withdrawn {
            caller,
            on_behalf,
            receiver,
            denom: denom.clone(),
            amount: withdrawn,
            scaled_on_pool: resulting.scaled_pool_supply,
            scaled_in_p2p: resulting.scaled_p2p_supply,
        })?;

        debug!(%caller, %on_behalf, %receiver, %denom, %withdrawn, "withdrawn");

        Ok(withdrawn)
    }

    /// Deposit `amount` as collateral for `on_behalf`.
    pub fn supply_collateral(
        &mut self,
        from: Addr,
        on_behalf: Addr,
        denom: &Denom,
        amount: Uint128,
    ) -> Result<()> {
        validate_actors(&[from, on_behalf])?;
        validate_amount(amount)?;

        let market = &self.vault(denom)?.market;
        if market.pause.supply_collateral_paused {
            return Err(Error::SupplyCollateralIsPaused(denom.clone()));
        }
        if !market.is_collateral {
            return Err(Error::AssetNotCollateral(denom.clone()));
        }

        self.accrue(denom)?;

        let mut staged = Staged::new(self.vault(denom)?);
        positions::supply_collateral(&mut staged, on_behalf, amount)?;
        let resulting = staged.balance(on_behalf);
        let commit = staged.into_commit();

        self.run_intents(denom, commit.intents)?;
        self.finish(denom, commit, CollateralSupplied {
            from,
            on_behalf,
            denom: denom.clone(),
            amount,
            scaled_collateral: resulting.scaled_collateral,
        })?;
        self.set_collateral_membership(on_behalf, denom, resulting.scaled_collateral.is_non_zero());

        debug!(%from, %on_behalf, %denom, %amount, "supplied collateral");

        Ok(())
    }

    /// Withdraw up to `amount` of `on_behalf`'s collateral, sending the
    /// funds to `receiver`. Returns the amount actually withdrawn.
    pub fn withdraw_collateral(
        &mut self,
        caller: Addr,
        on_behalf: Addr,
        receiver: Addr,
        denom: &Denom,
        amount: Uint128,
    ) -> Result<Uint128> {
        validate_actors(&[caller, on_behalf, receiver])?;
        validate_amount(amount)?;
        self.validate_permission(on_behalf, caller)?;

        let market = &self.vault(denom)?.market;
        if market.pause.withdraw_collateral_paused {
            return Err(Error::WithdrawCollateralIsPaused(denom.clone()));
        }

        self.accrue(denom)?;

        let mut staged = Staged::new(self.vault(denom)?);
        let withdrawn = positions::withdraw_collateral(&mut staged, on_behalf, amount)?;
        let resulting = staged.balance(on_behalf);
        let commit = staged.into_commit();

        // The position must stay above its liquidation threshold with this
        // collateral gone.
        let mut data = self.liquidity_data(on_behalf)?;
        let price = self.oracle.price(denom)?;
        let config = self.pool.configuration(denom)?;
        let removed = withdrawn
            .checked_mul_ray_ceil(price)?
            .checked_mul_ray_ceil(config.liquidation_threshold)?;
        data.max_debt = data.max_debt.zero_floor_sub(removed);
        health::authorize_withdraw_collateral(on_behalf, &data)?;

        self.run_intents(denom, commit.intents)?;
        self.finish(denom, commit, CollateralWithdrawn {
            caller,
            on_behalf,
            receiver,
            denom: denom.clone(),
            amount: withdrawn,
            scaled_collateral: resulting.scaled_collateral,
        })?;
        self.set_collateral_membership(on_behalf, denom, resulting.scaled_collateral.is_non_zero());

        debug!(%caller, %on_behalf, %receiver, %denom, %withdrawn, "withdrew collateral");

        Ok(withdrawn)
    }

    /// Liquidate `borrower`: repay up to `amount` of their `borrow_denom`
    /// debt and seize `collateral_denom` collateral with a bonus. Returns
    /// `(repaid, seized)`.
    pub fn liquidate(
        &mut self,
        liquidator: Addr,
        borrower: Addr,
        borrow_denom: &Denom,
        collateral_denom: &Denom,
        amount: Uint128,
    ) -> Result<(Uint128, Uint128)> {
        validate_actors(&[liquidator, borrower])?;
        validate_amount(amount)?;

        let borrow_market = &self.vault(borrow_denom)?.market;
        if borrow_market.pause.liquidate_borrow_paused {
            return Err(Error::LiquidateBorrowIsPaused(borrow_denom.clone()));
        }
        let deprecated = borrow_market.is_deprecated;

        let collateral_market = &self.vault(collateral_denom)?.market;
        if collateral_market.pause.liquidate_collateral_paused {
            return Err(Error::LiquidateCollateralIsPaused(collateral_denom.clone()));
        }
        if !collateral_market.is_collateral {
            return Err(Error::AssetNotCollateral(collateral_denom.clone()));
        }

        self.accrue(borrow_denom)?;
        if collateral_denom != borrow_denom {
            self.accrue(collateral_denom)?;
        }

        let data = self.liquidity_data(borrower)?;
        let health_factor = health::health_factor(&data)?;
        let close_factor = health::authorize_liquidation(borrower, health_factor, deprecated, || {
            self.oracle.is_liquidation_allowed()
        })?;

        // Cap the repayment by the close factor, then by the seizable
        // collateral.
        let borrow_vault = self.vault(borrow_denom)?;
        let borrow_indexes = borrow_vault.market.indexes;
        let balances = borrow_vault.balance(borrower);
        let debt = balances
            .scaled_pool_borrow
            .checked_mul_ray_ceil(borrow_indexes.borrow.pool_index)?
            .checked_add(
                balances
                    .scaled_p2p_borrow
                    .checked_mul_ray_ceil(borrow_indexes.borrow.p2p_index)?,
            )?;
        if debt.is_zero() {
            return Err(Error::DebtIsZero {
                user: borrower,
                denom: borrow_denom.clone(),
            });
        }
        let max_repay = debt.checked_mul_ray_floor(close_factor)?;

        let collateral_vault = self.vault(collateral_denom)?;
        let collateral_balance = collateral_vault
            .balance(borrower)
            .scaled_collateral
            .checked_mul_ray_floor(collateral_vault.market.indexes.supply.pool_index)?;

        let borrow_price = self.oracle.price(borrow_denom)?;
        let collateral_price = self.oracle.price(collateral_denom)?;
        let bonus = self.pool.configuration(collateral_denom)?.liquidation_bonus;

        let (seized, repaid) = health::seize_amounts(
            amount.min(max_repay),
            borrow_price,
            collateral_price,
            bonus,
            collateral_balance,
        )?;
        if repaid.is_zero() || seized.is_zero() {
            return Err(Error::CollateralIsZero {
                user: borrower,
                denom: collateral_denom.clone(),
            });
        }

        let headroom = self.supply_headroom(borrow_denom)?;

        if collateral_denom == borrow_denom {
            // Both legs share one staged state so the second sees the
            // first's changes and a single commit applies both.
            let mut staged = Staged::new(self.vault(borrow_denom)?);
            positions::repay(&mut staged, borrower, repaid, self.max_loops, headroom)?;
            positions::withdraw_collateral(&mut staged, borrower, seized)?;
            let resulting = staged.balance(borrower);
            let commit = staged.into_commit();

            self.run_intents(borrow_denom, commit.intents)?;
            self.finish(borrow_denom, commit, Liquidated {
                liquidator,
                borrower,
                borrow_denom: borrow_denom.clone(),
                repaid,
                collateral_denom: collateral_denom.clone(),
                seized,
            })?;
            self.set_collateral_membership(
                borrower,
                collateral_denom,
                resulting.scaled_collateral.is_non_zero(),
            );
        } else {
            let mut repay_staged = Staged::new(self.vault(borrow_denom)?);
            positions::repay(&mut repay_staged, borrower, repaid, self.max_loops, headroom)?;
            let repay_commit = repay_staged.into_commit();

            let mut seize_staged = Staged::new(self.vault(collateral_denom)?);
            positions::withdraw_collateral(&mut seize_staged, borrower, seized)?;
            let resulting = seize_staged.balance(borrower);
            let seize_commit = seize_staged.into_commit();

            self.run_intents(borrow_denom, repay_commit.intents)?;
            self.run_intents(collateral_denom, seize_commit.intents)?;

            self.apply(borrow_denom, repay_commit)?;
            self.apply(collateral_denom, seize_commit)?;
            self.events.push(
                Liquidated {
                    liquidator,
                    borrower,
                    borrow_denom: borrow_denom.clone(),
                    repaid,
                    collateral_denom: collateral_denom.clone(),
                    seized,
                }
                .into(),
            );
            self.set_collateral_membership(
                borrower,
                collateral_denom,
                resulting.scaled_collateral.is_non_zero(),
            );
        }

        info!(%liquidator, %borrower, %borrow_denom, %collateral_denom, %repaid, %seized, "liquidated");

        Ok((repaid, seized))
    }

    // ------------------------------- admin -----------------------------------

    pub fn set_pause_statuses(&mut self, denom: &Denom, statuses: PauseStatuses) -> Result<()> {
        self.vault_mut(denom)?.market.pause = statuses;
        Ok(())
    }

    pub fn set_is_p2p_disabled(&mut self, denom: &Denom, disabled: bool) -> Result<()> {
        self.vault_mut(denom)?.market.is_p2p_disabled = disabled;
        Ok(())
    }

    /// Deprecating a market requires its borrowing to already be paused.
    pub fn set_is_deprecated(&mut self, denom: &Denom, deprecated: bool) -> Result<()> {
        let market = &mut self.vault_mut(denom)?.market;

        if deprecated && !market.pause.borrow_paused {
            return Err(Error::BorrowNotPaused(denom.clone()));
        }

        market.is_deprecated = deprecated;
        Ok(())
    }

    pub fn set_is_collateral(&mut self, denom: &Denom, is_collateral: bool) -> Result<()> {
        self.vault_mut(denom)?.market.is_collateral = is_collateral;
        Ok(())
    }

    pub fn set_max_sorted_users(&mut self, max_sorted_users: usize) {
        self.max_sorted_users = max_sorted_users;
        for vault in self.markets.values_mut() {
            vault.set_max_sorted_users(max_sorted_users);
        }
    }

    /// Set the default matching loop budget, used by calls that do not carry
    /// their own.
    pub fn set_max_loops(&mut self, max_loops: u64) {
        self.max_loops = max_loops;
    }

    // ------------------------------ internals ---------------------------------

    fn validate_permission(&self, owner: Addr, manager: Addr) -> Result<()> {
        if owner == manager {
            return Ok(());
        }

        if self.permissions.is_approved(owner, manager)? {
            Ok(())
        } else {
            Err(Error::PermissionDenied { owner, manager })
        }
    }

    fn run_intents(&mut self, denom: &Denom, intents: PoolIntents) -> Result<()> {
        if intents.repay.is_non_zero() {
            self.pool.repay(denom, intents.repay)?;
        }
        if intents.supply.is_non_zero() {
            self.pool.supply(denom, intents.supply)?;
        }
        if intents.withdraw.is_non_zero() {
            self.pool.withdraw(denom, intents.withdraw)?;
        }
        if intents.borrow.is_non_zero() {
            self.pool.borrow(denom, intents.borrow)?;
        }
        Ok(())
    }

    /// Commit a staged operation and record its events.
    fn apply(&mut self, denom: &Denom, commit: StagedCommit) -> Result<()> {
        let StagedCommit {
            market,
            balances,
            events,
            ..
        } = commit;

        self.vault_mut(denom)?.commit(market, balances);
        self.events.extend(events);

        Ok(())
    }

    /// Commit a staged operation, then record its events and the top-level
    /// operation event.
    fn finish(&mut self, denom: &Denom, commit: StagedCommit, event: impl Into<Event>) -> Result<()> {
        self.apply(denom, commit)?;
        self.events.push(event.into());
        Ok(())
    }

    fn supply_headroom(&self, denom: &Denom) -> Result<Uint128> {
        let config = self.pool.configuration(denom)?;

        if config.supply_cap == Uint128::MAX {
            return Ok(Uint128::MAX);
        }

        let supplied = self.pool.total_supplied(denom)?;
        Ok(config.supply_cap.zero_floor_sub(supplied))
    }

    /// Aggregate a user's health inputs across all markets, from committed
    /// state.
    pub(crate) fn liquidity_data(&self, user: Addr) -> Result<health::LiquidityData> {
        let mut collaterals = Vec::new();
        for denom in self.collateral_denoms(user) {
            let vault = self.vault(&denom)?;
            if !vault.market.is_collateral {
                continue;
            }

            let amount = vault
                .balance(user)
                .scaled_collateral
                .checked_mul_ray_floor(vault.market.indexes.supply.pool_index)?;
            if amount.is_zero() {
                continue;
            }

            let config = self.pool.configuration(&denom)?;
            collaterals.push(health::CollateralInput {
                amount,
                price: self.oracle.price(&denom)?,
                ltv: config.ltv,
                liquidation_threshold: config.liquidation_threshold,
            });
        }

        let mut debts = Vec::new();
        for denom in self.borrowed_denoms(user) {
            let vault = self.vault(&denom)?;
            let indexes = vault.market.indexes;
            let balances = vault.balance(user);

            let amount = balances
                .scaled_pool_borrow
                .checked_mul_ray_ceil(indexes.borrow.pool_index)?
                .checked_add(
                    balances
                        .scaled_p2p_borrow
                        .checked_mul_ray_ceil(indexes.borrow.p2p_index)?,
                )?;

            debts.push(health::DebtInput {
                amount,
                price: self.oracle.price(&denom)?,
            });
        }

        Ok(health::liquidity_data(collaterals, debts)?)
    }

    /// A user's current health factor.
    pub fn health_factor(&self, user: Addr) -> Result<Ray> {
        let data = self.liquidity_data(user)?;
        Ok(health::health_factor(&data)?)
    }
}

fn validate_actors(actors: &[Addr]) -> Result<()> {
    if actors.iter().any(Addr::is_zero) {
        return Err(Error::AddressIsZero);
    }
    Ok(())
}

fn validate_amount(amount: Uint128) -> Result<()> {
    if amount.is_zero() {
        return Err(Error::AmountIsZero);
    }
    Ok(())
}
