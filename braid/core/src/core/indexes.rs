//! Peer-to-peer index refresh.
//!
//! Pool indexes are taken from the pool verbatim. The peer-to-peer indexes
//! grow by a rate sitting between the pool supply and borrow growth, placed
//! by the market's index cursor, with the reserve factor diverting part of
//! the borrower-side spread to the protocol.

use {
    crate::traits::PoolIndexes,
    braid_math::{MathResult, Ray},
    braid_types::{Indexes, MarketSideIndexes},
};

pub fn refresh(
    current: &Indexes,
    pool: &PoolIndexes,
    reserve_factor: Ray,
    p2p_index_cursor: Ray,
) -> MathResult<Indexes> {
    let supply_growth = pool.supply_index.checked_div(current.supply.pool_index)?;
    let borrow_growth = pool.borrow_index.checked_div(current.borrow.pool_index)?;

    // The mid-rate growth. When the pool inverts (supply outgrowing borrow)
    // both peer-to-peer sides are clamped to the borrow growth, so matched
    // suppliers never earn more than matched borrowers pay.
    let (p2p_supply_growth, p2p_borrow_growth) = if supply_growth <= borrow_growth {
        let mid = supply_growth.checked_add(
            p2p_index_cursor.checked_mul(borrow_growth.zero_floor_sub(supply_growth))?,
        )?;
        let with_reserve =
            mid.checked_add(reserve_factor.checked_mul(borrow_growth.zero_floor_sub(mid))?)?;
        (mid, with_reserve)
    } else {
        (borrow_growth, borrow_growth)
    };

    Ok(Indexes {
        supply: MarketSideIndexes {
            pool_index: pool.supply_index,
            p2p_index: current.supply.p2p_index.checked_mul(p2p_supply_growth)?,
        },
        borrow: MarketSideIndexes {
            pool_index: pool.borrow_index,
            p2p_index: current.borrow.p2p_index.checked_mul(p2p_borrow_growth)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use {super::*, braid_math::NumberConst, std::str::FromStr};

    fn ray(s: &str) -> Ray {
        Ray::from_str(s).unwrap()
    }

    #[test]
    fn neutral_growth_leaves_indexes_unchanged() {
        let next = refresh(
            &Indexes::ONE,
            &PoolIndexes {
                supply_index: Ray::ONE,
                borrow_index: Ray::ONE,
            },
            Ray::ZERO,
            Ray::new_percent(50),
        )
        .unwrap();

        assert_eq!(next, Indexes::ONE);
    }

    #[test]
    fn cursor_places_the_mid_rate() {
        let next = refresh(
            &Indexes::ONE,
            &PoolIndexes {
                supply_index: ray("1.02"),
                borrow_index: ray("1.06"),
            },
            Ray::ZERO,
            Ray::new_percent(50),
        )
        .unwrap();

        assert_eq!(next.supply.pool_index, ray("1.02"));
        assert_eq!(next.borrow.pool_index, ray("1.06"));
        assert_eq!(next.supply.p2p_index, ray("1.04"));
        assert_eq!(next.borrow.p2p_index, ray("1.04"));
    }

    #[test]
    fn reserve_factor_raises_the_borrower_side() {
        let next = refresh(
            &Indexes::ONE,
            &PoolIndexes {
                supply_index: ray("1.02"),
                borrow_index: ray("1.06"),
            },
            Ray::new_percent(10),
            Ray::new_percent(50),
        )
        .unwrap();

        assert_eq!(next.supply.p2p_index, ray("1.04"));
        assert_eq!(next.borrow.p2p_index, ray("1.042"));
    }

    #[test]
    fn inverted_growth_is_clamped_to_borrow() {
        let next = refresh(
            &Indexes::ONE,
            &PoolIndexes {
                supply_index: ray("1.08"),
                borrow_index: ray("1.03"),
            },
            Ray::new_percent(10),
            Ray::new_percent(50),
        )
        .unwrap();

        assert_eq!(next.supply.p2p_index, ray("1.03"));
        assert_eq!(next.borrow.p2p_index, ray("1.03"));
    }

    #[test]
    fn growth_compounds_on_existing_p2p_indexes() {
        let current = Indexes {
            supply: MarketSideIndexes {
                pool_index: ray("2"),
                p2p_index: ray("1.5"),
            },
            borrow: MarketSideIndexes {
                pool_index: ray("2"),
                p2p_index: ray("1.5"),
            },
        };

        let next = refresh(
            &current,
            &PoolIndexes {
                supply_index: ray("4"),
                borrow_index: ray("4"),
            },
            Ray::ZERO,
            Ray::new_percent(50),
        )
        .unwrap();

        assert_eq!(next.supply.p2p_index, ray("3"));
        assert_eq!(next.borrow.p2p_index, ray("3"));
    }
}
