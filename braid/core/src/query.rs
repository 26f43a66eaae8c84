use {
    crate::{
        state::Braid,
        traits::{Oracle, Permissions, Pool},
    },
    braid_math::{MultiplyFraction, Uint128},
    braid_types::{Addr, Denom, Market, MarketBalances, Result},
};

impl<P, O, A> Braid<P, O, A>
where
    P: Pool,
    O: Oracle,
    A: Permissions,
{
    pub fn market(&self, denom: &Denom) -> Result<&Market> {
        Ok(&self.vault(denom)?.market)
    }

    pub fn markets(&self) -> impl Iterator<Item = &Market> {
        self.markets.values().map(|vault| &vault.market)
    }

    /// A user's raw scaled balances on one market.
    pub fn position(&self, denom: &Denom, user: Addr) -> Result<MarketBalances> {
        Ok(self.vault(denom)?.balance(user))
    }

    /// A user's supply in underlying terms, pool side plus matched side.
    pub fn supply_balance(&self, denom: &Denom, user: Addr) -> Result<Uint128> {
        let vault = self.vault(denom)?;
        let indexes = vault.market.indexes;
        let balances = vault.balance(user);

        let amount = balances
            .scaled_pool_supply
            .checked_mul_ray_floor(indexes.supply.pool_index)?
            .checked_add(
                balances
                    .scaled_p2p_supply
                    .checked_mul_ray_floor(indexes.supply.p2p_index)?,
            )?;

        Ok(amount)
    }

    /// A user's debt in underlying terms, pool side plus matched side.
    pub fn borrow_balance(&self, denom: &Denom, user: Addr) -> Result<Uint128> {
        let vault = self.vault(denom)?;
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

        Ok(amount)
    }

    /// A user's collateral in underlying terms.
    pub fn collateral_balance(&self, denom: &Denom, user: Addr) -> Result<Uint128> {
        let vault = self.vault(denom)?;

        let amount = vault
            .balance(user)
            .scaled_collateral
            .checked_mul_ray_floor(vault.market.indexes.supply.pool_index)?;

        Ok(amount)
    }

    /// Denoms the user has collateral in, as tracked for health checks.
    pub fn user_collaterals(&self, user: Addr) -> Vec<Denom> {
        self.collateral_denoms(user)
    }
}
