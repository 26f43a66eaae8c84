use {
    braid_math::{NumberConst, Uint128},
    braid_testing::{denom, ray, setup, TestBraid},
    braid_types::{Addr, Error, PauseStatuses},
};

const BOB: Addr = Addr::mock(2);
const LIQUIDATOR: Addr = Addr::mock(9);

/// Bob posts 1000 of eth collateral and borrows 500 of usdc, both priced
/// at 1. With a 90% liquidation threshold his health factor starts at 1.8.
fn setup_borrower() -> TestBraid {
    let mut braid = setup(&["usdc", "eth"]);
    let usdc = denom("usdc");
    let eth = denom("eth");

    braid.supply_collateral(BOB, BOB, &eth, Uint128::new(1_000)).unwrap();
    braid.borrow(BOB, BOB, BOB, &usdc, Uint128::new(500), None).unwrap();

    braid
}

#[test]
fn healthy_positions_cannot_be_liquidated() {
    let mut braid = setup_borrower();

    assert_eq!(braid.health_factor(BOB).unwrap(), ray("1.8"));

    let err = braid
        .liquidate(LIQUIDATOR, BOB, &denom("usdc"), &denom("eth"), Uint128::MAX)
        .unwrap_err();
    assert!(matches!(err, Error::LiquidationNotAuthorized { .. }));
}

#[test]
fn mild_shortfall_is_half_closed() {
    let mut braid = setup_borrower();
    let usdc = denom("usdc");
    let eth = denom("eth");

    // 1000 * 0.54 * 0.9 = 486 of threshold-weighted collateral against 500
    // of debt: health factor 0.972.
    braid.oracle.set_price(&eth, ray("0.54"));
    assert_eq!(braid.health_factor(BOB).unwrap(), ray("0.972"));

    let (repaid, seized) = braid
        .liquidate(LIQUIDATOR, BOB, &usdc, &eth, Uint128::MAX)
        .unwrap();

    // Half the debt may be covered; 250 * 1.05 / 0.54 of collateral is
    // seized, rounding down.
    assert_eq!(repaid, Uint128::new(250));
    assert_eq!(seized, Uint128::new(485));

    assert_eq!(braid.borrow_balance(&usdc, BOB).unwrap(), Uint128::new(250));
    assert_eq!(braid.collateral_balance(&eth, BOB).unwrap(), Uint128::new(515));
}

#[test]
fn mild_shortfall_respects_the_sentinel() {
    let mut braid = setup_borrower();

    braid.oracle.set_price(&denom("eth"), ray("0.54"));
    braid.oracle.liquidation_allowed = false;

    let err = braid
        .liquidate(LIQUIDATOR, BOB, &denom("usdc"), &denom("eth"), Uint128::MAX)
        .unwrap_err();
    assert!(matches!(err, Error::SentinelDisallowsLiquidation));
}

#[test]
fn deep_shortfall_is_fully_closed_and_capped_by_collateral() {
    let mut braid = setup_borrower();
    let usdc = denom("usdc");
    let eth = denom("eth");

    // Health factor 0.9: the whole debt may be covered and the sentinel is
    // not consulted.
    braid.oracle.set_price(&eth, ray("0.5"));
    braid.oracle.liquidation_allowed = false;
    assert_eq!(braid.health_factor(BOB).unwrap(), ray("0.9"));

    let (repaid, seized) = braid
        .liquidate(LIQUIDATOR, BOB, &usdc, &eth, Uint128::MAX)
        .unwrap();

    // Covering 500 would seize 500 * 1.05 / 0.5 = 1050, more than Bob has.
    // The seizure is capped at his 1000 and the repayment shrinks to
    // 1000 * 0.5 / 1.05 = 476.
    assert_eq!(seized, Uint128::new(1_000));
    assert_eq!(repaid, Uint128::new(476));

    assert_eq!(braid.borrow_balance(&usdc, BOB).unwrap(), Uint128::new(24));
    assert_eq!(braid.collateral_balance(&eth, BOB).unwrap(), Uint128::ZERO);
    assert!(braid.user_collaterals(BOB).is_empty());
}

#[test]
fn deep_shortfall_liquidation_survives_an_offline_sentinel() {
    let mut braid = setup_borrower();
    let usdc = denom("usdc");
    let eth = denom("eth");

    // Below the bad-debt threshold the sentinel is never queried, so even
    // an erroring one cannot block the liquidation.
    braid.oracle.set_price(&eth, ray("0.5"));
    braid.oracle.sentinel_unavailable = true;

    let (repaid, seized) = braid
        .liquidate(LIQUIDATOR, BOB, &usdc, &eth, Uint128::MAX)
        .unwrap();

    assert_eq!(seized, Uint128::new(1_000));
    assert_eq!(repaid, Uint128::new(476));
}

#[test]
fn deprecated_market_allows_full_liquidation_while_healthy() {
    let mut braid = setup_borrower();
    let usdc = denom("usdc");
    let eth = denom("eth");

    braid
        .set_pause_statuses(&usdc, PauseStatuses {
            borrow_paused: true,
            ..Default::default()
        })
        .unwrap();
    braid.set_is_deprecated(&usdc, true).unwrap();

    let (repaid, seized) = braid
        .liquidate(LIQUIDATOR, BOB, &usdc, &eth, Uint128::MAX)
        .unwrap();

    assert_eq!(repaid, Uint128::new(500));
    assert_eq!(seized, Uint128::new(525));
    assert_eq!(braid.borrow_balance(&usdc, BOB).unwrap(), Uint128::ZERO);
}

#[test]
fn same_denom_liquidation_settles_both_legs() {
    let mut braid = setup(&["usdc"]);
    let usdc = denom("usdc");

    braid.supply_collateral(BOB, BOB, &usdc, Uint128::new(1_000)).unwrap();
    braid.borrow(BOB, BOB, BOB, &usdc, Uint128::new(500), None).unwrap();

    // Deprecation is the one route to liquidating a position whose
    // collateral and debt are the same asset, since a price move cannot
    // push its health factor below one.
    braid
        .set_pause_statuses(&usdc, PauseStatuses {
            borrow_paused: true,
            ..Default::default()
        })
        .unwrap();
    braid.set_is_deprecated(&usdc, true).unwrap();

    let (repaid, seized) = braid
        .liquidate(LIQUIDATOR, BOB, &usdc, &usdc, Uint128::MAX)
        .unwrap();

    assert_eq!(repaid, Uint128::new(500));
    assert_eq!(seized, Uint128::new(525));
    assert_eq!(braid.borrow_balance(&usdc, BOB).unwrap(), Uint128::ZERO);
    assert_eq!(braid.collateral_balance(&usdc, BOB).unwrap(), Uint128::new(475));
}

#[test]
fn liquidating_a_debt_free_user_is_rejected() {
    let mut braid = setup(&["usdc", "eth"]);
    let eth = denom("eth");

    braid.supply_collateral(BOB, BOB, &eth, Uint128::new(1_000)).unwrap();

    let err = braid
        .liquidate(LIQUIDATOR, BOB, &denom("usdc"), &eth, Uint128::MAX)
        .unwrap_err();
    assert!(matches!(err, Error::LiquidationNotAuthorized { .. }));
}
