use {
    braid_math::{NumberConst, Uint128},
    braid_testing::{denom, setup},
    braid_types::{Addr, Error, Event, MarketParams, PauseStatuses},
};

#[test]
fn supply_without_borrowers_sits_on_the_pool() {
    let mut braid = setup(&["usdc"]);
    let usdc = denom("usdc");
    let alice = Addr::mock(1);

    braid.supply(alice, alice, &usdc, Uint128::new(1_000), None).unwrap();

    assert_eq!(braid.pool.supplied(&usdc), Uint128::new(1_000));

    let position = braid.position(&usdc, alice).unwrap();
    assert_eq!(position.scaled_pool_supply, Uint128::new(1_000));
    assert_eq!(position.scaled_p2p_supply, Uint128::ZERO);
    assert_eq!(braid.supply_balance(&usdc, alice).unwrap(), Uint128::new(1_000));

    // The market ledger is untouched: no match, no delta, no idle.
    let market = braid.market(&usdc).unwrap();
    assert_eq!(market.deltas.supply.scaled_p2p_total, Uint128::ZERO);
    assert_eq!(market.idle_supply, Uint128::ZERO);
}

#[test]
fn supply_matches_an_existing_pool_borrower() {
    let mut braid = setup(&["usdc", "eth"]);
    let usdc = denom("usdc");
    let eth = denom("eth");
    let alice = Addr::mock(1);
    let bob = Addr::mock(2);

    braid.supply_collateral(bob, bob, &eth, Uint128::new(1_000)).unwrap();
    braid.borrow(bob, bob, bob, &usdc, Uint128::new(500), None).unwrap();
    assert_eq!(braid.pool.borrowed(&usdc), Uint128::new(500));

    braid.supply(alice, alice, &usdc, Uint128::new(800), None).unwrap();

    // Bob's pool debt is promoted into the match and repaid to the pool;
    // Alice's residual 300 is deposited.
    assert_eq!(braid.pool.borrowed(&usdc), Uint128::ZERO);
    assert_eq!(braid.pool.supplied(&usdc), Uint128::new(300));

    let alice_position = braid.position(&usdc, alice).unwrap();
    assert_eq!(alice_position.scaled_p2p_supply, Uint128::new(500));
    assert_eq!(alice_position.scaled_pool_supply, Uint128::new(300));

    let bob_position = braid.position(&usdc, bob).unwrap();
    assert_eq!(bob_position.scaled_pool_borrow, Uint128::ZERO);
    assert_eq!(bob_position.scaled_p2p_borrow, Uint128::new(500));

    let market = braid.market(&usdc).unwrap();
    assert_eq!(market.deltas.supply.scaled_p2p_total, Uint128::new(500));
    assert_eq!(market.deltas.borrow.scaled_p2p_total, Uint128::new(500));
}

#[test]
fn repay_unwinds_the_match_transparently() {
    let mut braid = setup(&["usdc", "eth"]);
    let usdc = denom("usdc");
    let eth = denom("eth");
    let alice = Addr::mock(1);
    let bob = Addr::mock(2);

    braid.supply_collateral(bob, bob, &eth, Uint128::new(1_000)).unwrap();
    braid.borrow(bob, bob, bob, &usdc, Uint128::new(500), None).unwrap();
    braid.supply(alice, alice, &usdc, Uint128::new(800), None).unwrap();

    let repaid = braid.repay(bob, bob, &usdc, Uint128::new(500), None).unwrap();
    assert_eq!(repaid, Uint128::new(500));

    // Bob is debt-free; Alice is fully demoted back to the pool, whole.
    assert_eq!(braid.borrow_balance(&usdc, bob).unwrap(), Uint128::ZERO);
    assert_eq!(braid.supply_balance(&usdc, alice).unwrap(), Uint128::new(800));

    let alice_position = braid.position(&usdc, alice).unwrap();
    assert_eq!(alice_position.scaled_p2p_supply, Uint128::ZERO);
    assert_eq!(alice_position.scaled_pool_supply, Uint128::new(800));

    assert_eq!(braid.pool.supplied(&usdc), Uint128::new(800));
    assert_eq!(braid.pool.borrowed(&usdc), Uint128::ZERO);

    let market = braid.market(&usdc).unwrap();
    assert_eq!(market.deltas.supply.scaled_p2p_total, Uint128::ZERO);
    assert_eq!(market.deltas.borrow.scaled_p2p_total, Uint128::ZERO);
}

#[test]
fn full_withdrawal_leaves_no_residue() {
    let mut braid = setup(&["usdc"]);
    let usdc = denom("usdc");
    let alice = Addr::mock(1);

    braid.supply(alice, alice, &usdc, Uint128::new(1_000), None).unwrap();
    let withdrawn = braid
        .withdraw(alice, alice, alice, &usdc, Uint128::MAX, None)
        .unwrap();

    assert_eq!(withdrawn, Uint128::new(1_000));
    assert!(braid.position(&usdc, alice).unwrap().is_empty());
    assert_eq!(braid.pool.supplied(&usdc), Uint128::ZERO);
}

#[test]
fn borrow_requires_collateral() {
    let mut braid = setup(&["usdc"]);
    let usdc = denom("usdc");
    let alice = Addr::mock(1);

    let err = braid
        .borrow(alice, alice, alice, &usdc, Uint128::new(100), None)
        .unwrap_err();

    assert!(matches!(err, Error::UnauthorizedBorrow { .. }));
}

#[test]
fn borrow_is_limited_by_loan_to_value() {
    let mut braid = setup(&["usdc", "eth"]);
    let usdc = denom("usdc");
    let eth = denom("eth");
    let bob = Addr::mock(2);

    // 1000 of collateral at 80% loan-to-value allows exactly 800 of debt.
    braid.supply_collateral(bob, bob, &eth, Uint128::new(1_000)).unwrap();
    braid.borrow(bob, bob, bob, &usdc, Uint128::new(800), None).unwrap();

    let err = braid
        .borrow(bob, bob, bob, &usdc, Uint128::new(1), None)
        .unwrap_err();
    assert!(matches!(err, Error::UnauthorizedBorrow { .. }));
}

#[test]
fn collateral_withdrawal_is_limited_by_the_liquidation_threshold() {
    let mut braid = setup(&["usdc", "eth"]);
    let usdc = denom("usdc");
    let eth = denom("eth");
    let bob = Addr::mock(2);

    braid.supply_collateral(bob, bob, &eth, Uint128::new(1_000)).unwrap();
    braid.borrow(bob, bob, bob, &usdc, Uint128::new(500), None).unwrap();

    // With 600 of collateral left the threshold-weighted budget is 540,
    // still above the 500 debt.
    braid
        .withdraw_collateral(bob, bob, bob, &eth, Uint128::new(400))
        .unwrap();

    let err = braid
        .withdraw_collateral(bob, bob, bob, &eth, Uint128::new(100))
        .unwrap_err();
    assert!(matches!(err, Error::UnauthorizedWithdraw { .. }));
}

#[test]
fn managing_another_position_requires_approval() {
    let mut braid = setup(&["usdc"]);
    let usdc = denom("usdc");
    let alice = Addr::mock(1);
    let bob = Addr::mock(2);

    braid.supply(alice, alice, &usdc, Uint128::new(1_000), None).unwrap();

    let err = braid
        .withdraw(bob, alice, bob, &usdc, Uint128::new(100), None)
        .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied { .. }));

    braid.permissions.approve(alice, bob);
    braid.withdraw(bob, alice, bob, &usdc, Uint128::new(100), None).unwrap();
}

#[test]
fn paused_actions_are_rejected() {
    let mut braid = setup(&["usdc"]);
    let usdc = denom("usdc");
    let alice = Addr::mock(1);

    braid
        .set_pause_statuses(&usdc, PauseStatuses {
            supply_paused: true,
            ..Default::default()
        })
        .unwrap();

    let err = braid
        .supply(alice, alice, &usdc, Uint128::new(100), None)
        .unwrap_err();
    assert!(matches!(err, Error::SupplyIsPaused(_)));
}

#[test]
fn deprecation_requires_borrowing_to_be_paused() {
    let mut braid = setup(&["usdc", "eth"]);
    let usdc = denom("usdc");
    let eth = denom("eth");
    let bob = Addr::mock(2);

    let err = braid.set_is_deprecated(&usdc, true).unwrap_err();
    assert!(matches!(err, Error::BorrowNotPaused(_)));

    braid
        .set_pause_statuses(&usdc, PauseStatuses {
            borrow_paused: true,
            ..Default::default()
        })
        .unwrap();
    braid.set_is_deprecated(&usdc, true).unwrap();

    // Borrowing on a deprecated market is rejected before the pause check
    // even matters.
    braid.supply_collateral(bob, bob, &eth, Uint128::new(1_000)).unwrap();
    let err = braid
        .borrow(bob, bob, bob, &usdc, Uint128::new(100), None)
        .unwrap_err();
    assert!(matches!(err, Error::BorrowIsPaused(_)));
}

#[test]
fn create_market_is_idempotent() {
    let mut braid = setup(&["usdc"]);
    let events_before = braid.events().len();

    braid
        .create_market(denom("usdc"), MarketParams::default())
        .unwrap();

    assert_eq!(braid.events().len(), events_before);
}

#[test]
fn unknown_market_is_rejected() {
    let mut braid = setup(&["usdc"]);
    let alice = Addr::mock(1);

    let err = braid
        .supply(alice, alice, &denom("dai"), Uint128::new(100), None)
        .unwrap_err();
    assert!(matches!(err, Error::MarketNotCreated(_)));
}

#[test]
fn zero_inputs_are_rejected() {
    let mut braid = setup(&["usdc"]);
    let usdc = denom("usdc");
    let alice = Addr::mock(1);

    assert!(matches!(
        braid.supply(Addr::ZERO, alice, &usdc, Uint128::new(100), None),
        Err(Error::AddressIsZero)
    ));
    assert!(matches!(
        braid.supply(alice, alice, &usdc, Uint128::ZERO, None),
        Err(Error::AmountIsZero)
    ));
}

#[test]
fn operations_emit_typed_events() {
    let mut braid = setup(&["usdc"]);
    let usdc = denom("usdc");
    let alice = Addr::mock(1);

    braid.supply(alice, alice, &usdc, Uint128::new(1_000), None).unwrap();

    let event = braid.events().last().unwrap();
    match event {
        Event::Supplied(supplied) => {
            assert_eq!(supplied.from, alice);
            assert_eq!(supplied.on_behalf, alice);
            assert_eq!(supplied.denom, usdc);
            assert_eq!(supplied.amount, Uint128::new(1_000));
            assert_eq!(supplied.scaled_on_pool, Uint128::new(1_000));
            assert_eq!(supplied.scaled_in_p2p, Uint128::ZERO);
        },
        other => panic!("expected a supply event, got {other:?}"),
    }

    // Events serialize to a stable, readable shape.
    let json = serde_json::to_value(event).unwrap();
    assert_eq!(json["supplied"]["denom"], "usdc");
    assert_eq!(json["supplied"]["amount"], "1000");
}
