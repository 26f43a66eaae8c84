//! Mock collaborators and setup helpers for exercising the braid matching
//! layer end to end without a real pool.

use {
    braid_core::{AssetConfig, Braid, Oracle, Permissions, Pool, PoolIndexes},
    braid_math::{NumberConst, Ray, Uint128},
    braid_types::{Addr, Denom, MarketParams},
    std::{
        collections::{BTreeMap, BTreeSet},
        str::FromStr,
    },
};

/// Shorthand for a validated denom in tests.
pub fn denom(s: &str) -> Denom {
    Denom::new(s).unwrap()
}

/// Shorthand for a ray from its decimal representation.
pub fn ray(s: &str) -> Ray {
    Ray::from_str(s).unwrap()
}

/// A sensible reserve configuration: borrowable, uncapped, 80% loan-to-value,
/// 90% liquidation threshold, 5% liquidation bonus.
pub fn default_config() -> AssetConfig {
    AssetConfig {
        borrowing_enabled: true,
        supply_cap: Uint128::MAX,
        ltv: Ray::new_percent(80),
        liquidation_threshold: Ray::new_percent(90),
        liquidation_bonus: ray("1.05"),
    }
}

#[derive(Debug, Clone)]
struct MockReserve {
    config: AssetConfig,
    indexes: PoolIndexes,
    supplied: Uint128,
    borrowed: Uint128,
}

/// An in-memory pool that tracks aggregate positions per reserve and fails
/// on the operations a real pool would reject.
#[derive(Default, Debug, Clone)]
pub struct MockPool {
    reserves: BTreeMap<Denom, MockReserve>,
}

impl MockPool {
    pub fn with_reserve(mut self, denom: Denom, config: AssetConfig) -> Self {
        self.reserves.insert(denom, MockReserve {
            config,
            indexes: PoolIndexes {
                supply_index: Ray::ONE,
                borrow_index: Ray::ONE,
            },
            supplied: Uint128::ZERO,
            borrowed: Uint128::ZERO,
        });
        self
    }

    /// Overwrite a reserve's growth indexes, simulating interest accrual.
    pub fn set_indexes(&mut self, denom: &Denom, supply_index: Ray, borrow_index: Ray) {
        if let Some(reserve) = self.reserves.get_mut(denom) {
            reserve.indexes = PoolIndexes {
                supply_index,
                borrow_index,
            };
        }
    }

    pub fn set_supply_cap(&mut self, denom: &Denom, supply_cap: Uint128) {
        if let Some(reserve) = self.reserves.get_mut(denom) {
            reserve.config.supply_cap = supply_cap;
        }
    }

    pub fn supplied(&self, denom: &Denom) -> Uint128 {
        self.reserves
            .get(denom)
            .map(|reserve| reserve.supplied)
            .unwrap_or(Uint128::ZERO)
    }

    pub fn borrowed(&self, denom: &Denom) -> Uint128 {
        self.reserves
            .get(denom)
            .map(|reserve| reserve.borrowed)
            .unwrap_or(Uint128::ZERO)
    }

    fn reserve_mut(&mut self, denom: &Denom) -> anyhow::Result<&mut MockReserve> {
        self.reserves
            .get_mut(denom)
            .ok_or_else(|| anyhow::anyhow!("no reserve for `{denom}`"))
    }

    fn reserve(&self, denom: &Denom) -> anyhow::Result<&MockReserve> {
        self.reserves
            .get(denom)
            .ok_or_else(|| anyhow::anyhow!("no reserve for `{denom}`"))
    }
}

impl Pool for MockPool {
    fn supply(&mut self, denom: &Denom, amount: Uint128) -> anyhow::Result<()> {
        let reserve = self.reserve_mut(denom)?;

        let supplied = reserve.supplied.checked_add(amount)?;
        anyhow::ensure!(
            supplied <= reserve.config.supply_cap,
            "supply cap exceeded on `{denom}`"
        );

        reserve.supplied = supplied;
        Ok(())
    }

    fn withdraw(&mut self, denom: &Denom, amount: Uint128) -> anyhow::Result<()> {
        let reserve = self.reserve_mut(denom)?;

        anyhow::ensure!(
            amount <= reserve.supplied,
            "withdrawing more than supplied on `{denom}`"
        );

        reserve.supplied = reserve.supplied.zero_floor_sub(amount);
        Ok(())
    }

    fn borrow(&mut self, denom: &Denom, amount: Uint128) -> anyhow::Result<()> {
        let reserve = self.reserve_mut(denom)?;
        reserve.borrowed = reserve.borrowed.checked_add(amount)?;
        Ok(())
    }

    fn repay(&mut self, denom: &Denom, amount: Uint128) -> anyhow::Result<()> {
        let reserve = self.reserve_mut(denom)?;

        anyhow::ensure!(
            amount <= reserve.borrowed,
            "repaying more than borrowed on `{denom}`"
        );

        reserve.borrowed = reserve.borrowed.zero_floor_sub(amount);
        Ok(())
    }

    fn configuration(&self, denom: &Denom) -> anyhow::Result<AssetConfig> {
        Ok(self.reserve(denom)?.config)
    }

    fn total_supplied(&self, denom: &Denom) -> anyhow::Result<Uint128> {
        Ok(self.reserve(denom)?.supplied)
    }

    fn reserve_indexes(&self, denom: &Denom) -> anyhow::Result<PoolIndexes> {
        Ok(self.reserve(denom)?.indexes)
    }
}

/// A price source with settable prices and a settable sentinel. The
/// sentinel can also be made to fail outright, like a real one going
/// offline.
#[derive(Debug, Clone)]
pub struct MockOracle {
    prices: BTreeMap<Denom, Ray>,
    pub liquidation_allowed: bool,
    pub sentinel_unavailable: bool,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self {
            prices: BTreeMap::new(),
            liquidation_allowed: true,
            sentinel_unavailable: false,
        }
    }
}

impl MockOracle {
    pub fn with_price(mut self, denom: Denom, price: Ray) -> Self {
        self.prices.insert(denom, price);
        self
    }

    pub fn set_price(&mut self, denom: &Denom, price: Ray) {
        self.prices.insert(denom.clone(), price);
    }
}

impl Oracle for MockOracle {
    fn price(&self, denom: &Denom) -> anyhow::Result<Ray> {
        self.prices
            .get(denom)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no price for `{denom}`"))
    }

    fn is_liquidation_allowed(&self) -> anyhow::Result<bool> {
        anyhow::ensure!(!self.sentinel_unavailable, "sentinel unavailable");
        Ok(self.liquidation_allowed)
    }
}

/// A delegation registry with explicit approvals only.
#[derive(Default, Debug, Clone)]
pub struct MockPermissions {
    approvals: BTreeSet<(Addr, Addr)>,
}

impl MockPermissions {
    pub fn approve(&mut self, owner: Addr, manager: Addr) {
        self.approvals.insert((owner, manager));
    }
}

impl Permissions for MockPermissions {
    fn is_approved(&self, owner: Addr, manager: Addr) -> anyhow::Result<bool> {
        Ok(self.approvals.contains(&(owner, manager)))
    }
}

pub type TestBraid = Braid<MockPool, MockOracle, MockPermissions>;

/// Build an optimizer with one created market per denom: default reserve
/// configuration, unit prices and indexes, collateral enabled.
pub fn setup(denoms: &[&str]) -> TestBraid {
    let mut pool = MockPool::default();
    let mut oracle = MockOracle::default();

    for d in denoms {
        let d = denom(d);
        pool = pool.with_reserve(d.clone(), default_config());
        oracle = oracle.with_price(d, Ray::ONE);
    }

    let mut braid = Braid::new(pool, oracle, MockPermissions::default());

    for d in denoms {
        braid
            .create_market(denom(d), MarketParams {
                reserve_factor: Ray::ZERO,
                p2p_index_cursor: Ray::new_percent(50),
                is_collateral: true,
            })
            .unwrap();
    }

    braid
}
