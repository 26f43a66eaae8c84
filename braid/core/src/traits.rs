use {
    braid_math::{Ray, Uint128},
    braid_types::{Addr, Denom},
};

/// Risk parameters and caps reported by the pool for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetConfig {
    pub borrowing_enabled: bool,
    /// Maximum underlying the pool accepts as deposits for this asset.
    /// `Uint128::MAX` means uncapped.
    pub supply_cap: Uint128,
    /// Maximum borrow value per unit of collateral value.
    pub ltv: Ray,
    /// Collateral discount at which a position becomes liquidatable.
    pub liquidation_threshold: Ray,
    /// Multiplier applied to seized collateral, e.g. 1.05 for a 5% bonus.
    pub liquidation_bonus: Ray,
}

/// The pool's growth indexes for one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolIndexes {
    pub supply_index: Ray,
    pub borrow_index: Ray,
}

/// The underlying pooled lending protocol.
///
/// Mutating calls move real funds; they are only invoked after the staged
/// state for an operation has been computed, so a failure here aborts the
/// operation before anything is committed.
pub trait Pool {
    fn supply(&mut self, denom: &Denom, amount: Uint128) -> anyhow::Result<()>;

    fn withdraw(&mut self, denom: &Denom, amount: Uint128) -> anyhow::Result<()>;

    fn borrow(&mut self, denom: &Denom, amount: Uint128) -> anyhow::Result<()>;

    fn repay(&mut self, denom: &Denom, amount: Uint128) -> anyhow::Result<()>;

    fn configuration(&self, denom: &Denom) -> anyhow::Result<AssetConfig>;

    /// Total underlying currently deposited in the pool for this asset, by
    /// everyone, used to measure headroom under the supply cap.
    fn total_supplied(&self, denom: &Denom) -> anyhow::Result<Uint128>;

    fn reserve_indexes(&self, denom: &Denom) -> anyhow::Result<PoolIndexes>;
}

/// Price source and liquidation sentinel.
pub trait Oracle {
    /// Value of one whole unit of the asset, as a ray.
    fn price(&self, denom: &Denom) -> anyhow::Result<Ray>;

    /// Whether the sentinel currently allows liquidating positions that are
    /// only mildly undercollateralized.
    fn is_liquidation_allowed(&self) -> anyhow::Result<bool>;
}

/// Delegation registry: who may manage whose positions.
pub trait Permissions {
    fn is_approved(&self, owner: Addr, manager: Addr) -> anyhow::Result<bool>;
}
