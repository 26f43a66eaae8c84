use {
    crate::{
        core::ranking::RankingTree,
        traits::{Oracle, Permissions, Pool},
    },
    braid_math::{IsZero, Uint128},
    braid_types::{Addr, Denom, Error, Event, Market, MarketBalances, Result, Side},
    std::collections::{BTreeMap, BTreeSet},
};

/// Default bound on the sorted region of each ranking structure.
pub const DEFAULT_MAX_SORTED_USERS: usize = 16;

/// Default loop budget for promotion matching.
pub const DEFAULT_MAX_LOOPS: u64 = 64;

/// Everything stored for one market: the ledger, per-user balances, and the
/// four ranking structures the matching engine walks.
#[derive(Debug, Clone)]
pub struct MarketVault {
    pub market: Market,
    pub balances: BTreeMap<Addr, MarketBalances>,
    pub pool_suppliers: RankingTree,
    pub p2p_suppliers: RankingTree,
    pub pool_borrowers: RankingTree,
    pub p2p_borrowers: RankingTree,
}

impl MarketVault {
    pub fn new(market: Market, max_sorted_users: usize) -> Self {
        Self {
            market,
            balances: BTreeMap::new(),
            pool_suppliers: RankingTree::new(max_sorted_users),
            p2p_suppliers: RankingTree::new(max_sorted_users),
            pool_borrowers: RankingTree::new(max_sorted_users),
            p2p_borrowers: RankingTree::new(max_sorted_users),
        }
    }

    /// A user's balances, defaulting to all-zero if absent.
    pub fn balance(&self, addr: Addr) -> MarketBalances {
        self.balances.get(&addr).copied().unwrap_or_default()
    }

    pub fn pool_tree(&self, side: Side) -> &RankingTree {
        match side {
            Side::Supply => &self.pool_suppliers,
            Side::Borrow => &self.pool_borrowers,
        }
    }

    pub fn p2p_tree(&self, side: Side) -> &RankingTree {
        match side {
            Side::Supply => &self.p2p_suppliers,
            Side::Borrow => &self.p2p_borrowers,
        }
    }

    pub fn set_max_sorted_users(&mut self, max_sorted_users: usize) {
        self.pool_suppliers.set_max_sorted_size(max_sorted_users);
        self.p2p_suppliers.set_max_sorted_size(max_sorted_users);
        self.pool_borrowers.set_max_sorted_size(max_sorted_users);
        self.p2p_borrowers.set_max_sorted_size(max_sorted_users);
    }

    /// Apply a staged operation: overwrite the ledger, merge the touched
    /// balances, and re-rank every touched user from their final balances.
    /// This step is infallible; all arithmetic happened during staging.
    pub fn commit(&mut self, market: Market, touched: BTreeMap<Addr, MarketBalances>) {
        self.market = market;

        for (addr, balances) in touched {
            self.pool_suppliers.update(addr, balances.scaled_pool_supply);
            self.p2p_suppliers.update(addr, balances.scaled_p2p_supply);
            self.pool_borrowers.update(addr, balances.scaled_pool_borrow);
            self.p2p_borrowers.update(addr, balances.scaled_p2p_borrow);

            if balances.is_empty() {
                self.balances.remove(&addr);
            } else {
                self.balances.insert(addr, balances);
            }
        }
    }
}

/// Net pool interactions a staged operation requires, executed in this
/// order: repay, supply, withdraw, borrow.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolIntents {
    pub repay: Uint128,
    pub supply: Uint128,
    pub withdraw: Uint128,
    pub borrow: Uint128,
}

/// The not-yet-committed result of one operation on one market.
///
/// Flows mutate a copy of the ledger and an overlay of touched balances;
/// nothing reaches the vault until [`MarketVault::commit`], so a failure at
/// any point during staging or during the pool calls leaves the vault
/// untouched.
#[derive(Debug)]
pub struct Staged<'a> {
    vault: &'a MarketVault,
    pub market: Market,
    pub balances: BTreeMap<Addr, MarketBalances>,
    pub intents: PoolIntents,
    pub events: Vec<Event>,
}

/// The owned parts of a staged operation, ready to commit.
#[derive(Debug)]
pub struct StagedCommit {
    pub market: Market,
    pub balances: BTreeMap<Addr, MarketBalances>,
    pub intents: PoolIntents,
    pub events: Vec<Event>,
}

impl<'a> Staged<'a> {
    pub fn new(vault: &'a MarketVault) -> Self {
        Self {
            vault,
            market: vault.market.clone(),
            balances: BTreeMap::new(),
            intents: PoolIntents::default(),
            events: Vec::new(),
        }
    }

    pub fn vault(&self) -> &'a MarketVault {
        self.vault
    }

    /// A user's balances as staged: the overlay if touched, otherwise the
    /// committed value.
    pub fn balance(&self, addr: Addr) -> MarketBalances {
        self.balances
            .get(&addr)
            .copied()
            .unwrap_or_else(|| self.vault.balance(addr))
    }

    pub fn balance_mut(&mut self, addr: Addr) -> &mut MarketBalances {
        let seed = self.vault.balance(addr);
        self.balances.entry(addr).or_insert(seed)
    }

    pub fn push_event(&mut self, event: impl Into<Event>) {
        self.events.push(event.into());
    }

    pub fn into_commit(self) -> StagedCommit {
        StagedCommit {
            market: self.market,
            balances: self.balances,
            intents: self.intents,
            events: self.events,
        }
    }
}

/// The optimizer itself: per-market vaults layered over a pool, an oracle,
/// and a delegation registry.
#[derive(Debug)]
pub struct Braid<P, O, A> {
    pub pool: P,
    pub oracle: O,
    pub permissions: A,
    pub(crate) markets: BTreeMap<Denom, MarketVault>,
    /// Which markets each user has enabled as collateral.
    pub(crate) collaterals: BTreeMap<Addr, BTreeSet<Denom>>,
    pub(crate) events: Vec<Event>,
    pub(crate) max_sorted_users: usize,
    pub(crate) max_loops: u64,
}

impl<P, O, A> Braid<P, O, A>
where
    P: Pool,
    O: Oracle,
    A: Permissions,
{
    pub fn new(pool: P, oracle: O, permissions: A) -> Self {
        Self {
            pool,
            oracle,
            permissions,
            markets: BTreeMap::new(),
            collaterals: BTreeMap::new(),
            events: Vec::new(),
            max_sorted_users: DEFAULT_MAX_SORTED_USERS,
            max_loops: DEFAULT_MAX_LOOPS,
        }
    }

    /// Events recorded so far, in emission order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn vault(&self, denom: &Denom) -> Result<&MarketVault> {
        self.markets
            .get(denom)
            .ok_or_else(|| Error::MarketNotCreated(denom.clone()))
    }

    pub(crate) fn vault_mut(&mut self, denom: &Denom) -> Result<&mut MarketVault> {
        self.markets
            .get_mut(denom)
            .ok_or_else(|| Error::MarketNotCreated(denom.clone()))
    }

    /// Record which denoms `user` has non-zero collateral in.
    pub(crate) fn set_collateral_membership(&mut self, user: Addr, denom: &Denom, active: bool) {
        let set = self.collaterals.entry(user).or_default();

        if active {
            set.insert(denom.clone());
        } else {
            set.remove(denom);
            if set.is_empty() {
                self.collaterals.remove(&user);
            }
        }
    }

    pub(crate) fn collateral_denoms(&self, user: Addr) -> Vec<Denom> {
        self.collaterals
            .get(&user)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Denoms the user currently borrows in, derived from balances.
    pub(crate) fn borrowed_denoms(&self, user: Addr) -> Vec<Denom> {
        self.markets
            .iter()
            .filter(|(_, vault)| {
                let balances = vault.balance(user);
                balances.scaled_pool_borrow.is_non_zero()
                    || balances.scaled_p2p_borrow.is_non_zero()
            })
            .map(|(denom, _)| denom.clone())
            .collect()
    }
}
