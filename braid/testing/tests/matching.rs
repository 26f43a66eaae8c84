use {
    braid_math::{NumberConst, Uint128},
    braid_testing::{denom, setup, TestBraid},
    braid_types::Addr,
};

const ALICE: Addr = Addr::mock(1);

/// Give `user` enough eth collateral to borrow freely in these scenarios.
fn fund(braid: &mut TestBraid, user: Addr) {
    braid
        .supply_collateral(user, user, &denom("eth"), Uint128::new(10_000))
        .unwrap();
}

#[test]
fn matching_is_bounded_by_the_loop_budget() {
    let mut braid = setup(&["usdc", "eth"]);
    let usdc = denom("usdc");

    for i in 2..5 {
        let borrower = Addr::mock(i);
        fund(&mut braid, borrower);
        braid
            .borrow(borrower, borrower, borrower, &usdc, Uint128::new(100), None)
            .unwrap();
    }

    // A budget of 2 on this call alone visits two of the three borrowers
    // and leaves the third on the pool.
    braid.supply(ALICE, ALICE, &usdc, Uint128::new(300), Some(2)).unwrap();

    let position = braid.position(&usdc, ALICE).unwrap();
    assert_eq!(position.scaled_p2p_supply, Uint128::new(200));
    assert_eq!(position.scaled_pool_supply, Uint128::new(100));

    assert_eq!(braid.pool.borrowed(&usdc), Uint128::new(100));
    assert_eq!(braid.pool.supplied(&usdc), Uint128::new(100));

    // The budget bound that one call only: the next supply falls back to
    // the stored default and picks up the remaining borrower.
    braid.supply(ALICE, ALICE, &usdc, Uint128::new(100), None).unwrap();

    let position = braid.position(&usdc, ALICE).unwrap();
    assert_eq!(position.scaled_p2p_supply, Uint128::new(300));
    assert_eq!(position.scaled_pool_supply, Uint128::new(100));
    assert_eq!(braid.pool.borrowed(&usdc), Uint128::ZERO);
}

#[test]
fn largest_positions_are_matched_first() {
    let mut braid = setup(&["usdc", "eth"]);
    let usdc = denom("usdc");
    let small = Addr::mock(2);
    let large = Addr::mock(3);

    braid.supply(small, small, &usdc, Uint128::new(100), None).unwrap();
    braid.supply(large, large, &usdc, Uint128::new(300), None).unwrap();

    let borrower = Addr::mock(4);
    fund(&mut braid, borrower);
    braid
        .borrow(borrower, borrower, borrower, &usdc, Uint128::new(250), Some(1))
        .unwrap();

    // Only the larger supplier is visited.
    assert_eq!(
        braid.position(&usdc, large).unwrap().scaled_p2p_supply,
        Uint128::new(250)
    );
    assert_eq!(
        braid.position(&usdc, small).unwrap().scaled_p2p_supply,
        Uint128::ZERO
    );
}

#[test]
fn disabling_p2p_routes_everything_through_the_pool() {
    let mut braid = setup(&["usdc", "eth"]);
    let usdc = denom("usdc");
    let borrower = Addr::mock(2);

    fund(&mut braid, borrower);
    braid
        .borrow(borrower, borrower, borrower, &usdc, Uint128::new(500), None)
        .unwrap();

    braid.set_is_p2p_disabled(&usdc, true).unwrap();
    braid.supply(ALICE, ALICE, &usdc, Uint128::new(500), None).unwrap();

    let position = braid.position(&usdc, ALICE).unwrap();
    assert_eq!(position.scaled_pool_supply, Uint128::new(500));
    assert_eq!(position.scaled_p2p_supply, Uint128::ZERO);

    // The borrower's pool debt is untouched.
    assert_eq!(braid.pool.borrowed(&usdc), Uint128::new(500));
    assert_eq!(braid.pool.supplied(&usdc), Uint128::new(500));
}

#[test]
fn capped_pool_parks_repaid_matches_idle_and_lends_them_out_again() {
    let mut braid = setup(&["usdc", "eth"]);
    let usdc = denom("usdc");
    let bob = Addr::mock(2);
    let charlie = Addr::mock(3);

    // Build a 500 match between Alice and Bob.
    fund(&mut braid, bob);
    braid.borrow(bob, bob, bob, &usdc, Uint128::new(500), None).unwrap();
    braid.supply(ALICE, ALICE, &usdc, Uint128::new(500), None).unwrap();
    assert_eq!(braid.pool.borrowed(&usdc), Uint128::ZERO);

    // The pool stops accepting deposits, so unwinding the match on repay
    // has nowhere to put the money but the idle bucket.
    braid.pool.set_supply_cap(&usdc, Uint128::ZERO);
    braid.repay(bob, bob, &usdc, Uint128::new(500), None).unwrap();

    let market = braid.market(&usdc).unwrap();
    assert_eq!(market.idle_supply, Uint128::new(500));
    assert_eq!(braid.pool.supplied(&usdc), Uint128::ZERO);

    // A new borrower is served from idle cash without touching the pool.
    fund(&mut braid, charlie);
    braid
        .borrow(charlie, charlie, charlie, &usdc, Uint128::new(300), None)
        .unwrap();

    let market = braid.market(&usdc).unwrap();
    assert_eq!(market.idle_supply, Uint128::new(200));
    assert_eq!(braid.pool.borrowed(&usdc), Uint128::ZERO);
    assert_eq!(
        braid.position(&usdc, charlie).unwrap().scaled_p2p_borrow,
        Uint128::new(300)
    );
}
