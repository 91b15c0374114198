//! End-to-end vault flows against the simulator stack

use chrono::{Duration, TimeZone, Utc};
use parking_lot::RwLock;
use proptest::prelude::*;
use std::sync::Arc;
use vault_core::{
    ActionKind, Address, Amount, AssetId, CollabResult, Collaborators, CollateralStore, Config,
    EpochLockConfig, Error, OptionKind, OptionSeries, Procedure, SeriesId, StrategyAction,
    TradingVenue, Vault,
};
use venue_sim::{FlatOracle, InMemoryCollateral, ManualClock, RecordingRegistrar, SimRegistry,
    SimVenue};

struct Stack {
    vault: Arc<Vault>,
    collateral: Arc<InMemoryCollateral>,
    venue: Arc<SimVenue>,
    registry: Arc<SimRegistry>,
    registrar: Arc<RecordingRegistrar>,
    clock: Arc<ManualClock>,
}

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

fn stack_with(config: Config) -> Stack {
    let collateral = Arc::new(InMemoryCollateral::new(config.vault_address.clone()));
    let venue = Arc::new(SimVenue::new());
    let registry = Arc::new(SimRegistry::new());
    let registrar = Arc::new(RecordingRegistrar::new());
    let clock = Arc::new(ManualClock::at(t0()));

    let vault = Arc::new(
        Vault::new(
            config,
            Collaborators {
                collateral: collateral.clone(),
                venue: venue.clone(),
                registry: registry.clone(),
                oracle: Arc::new(FlatOracle::default()),
                registrar: registrar.clone(),
                clock: clock.clone(),
            },
        )
        .unwrap(),
    );

    Stack {
        vault,
        collateral,
        venue,
        registry,
        registrar,
        clock,
    }
}

fn stack() -> Stack {
    stack_with(Config::default())
}

fn addr(name: &str) -> Address {
    Address::new(name)
}

fn operator() -> Address {
    addr("operator")
}

fn series(days_out: i64) -> OptionSeries {
    OptionSeries {
        expiration: t0() + Duration::days(days_out),
        strike: 65_000,
        kind: OptionKind::Call,
        underlying: AssetId::new("WBTC"),
        strike_asset: AssetId::new("USDC"),
        collateral_asset: AssetId::new("WBTC"),
    }
}

fn issue_batch(amount: Amount) -> Vec<Procedure> {
    vec![Procedure::Strategy {
        actions: vec![StrategyAction {
            kind: ActionKind::Issue,
            series: series(7),
            amount,
            premium_cap: 0,
        }],
    }]
}

#[test]
fn bootstrap_deposit_mints_one_to_one() {
    let s = stack();
    let alice = addr("alice");
    s.collateral.fund(&alice, 2000);

    let shares = s.vault.deposit(&alice, 2000, &alice).unwrap();
    assert_eq!(shares, 2000);
    assert_eq!(s.vault.total_shares(), 2000);
    assert_eq!(s.vault.total_reserve(), 2000);
    assert_eq!(s.collateral.balance_of(s.vault.address()), 2000);
    assert_eq!(s.registrar.registered(), vec![addr("vault")]);
}

#[test]
fn yield_accrues_proportionally_to_all_holders() {
    let s = stack();
    let (alice, bob) = (addr("alice"), addr("bob"));
    s.collateral.fund(&alice, 2000);
    s.collateral.fund(&bob, 4000);

    s.vault.deposit(&alice, 2000, &alice).unwrap();
    s.vault.deposit(&bob, 4000, &bob).unwrap();

    // A written series expires worthless and its collateral plus premium
    // comes home: 3000 lands in custody and is booked through redeem.
    let id = SeriesId::new("call-65000-aug");
    s.collateral.fund(s.vault.address(), 3000);
    s.registry.expect_payout(id.clone(), 3000);
    s.vault.redeem(&operator(), &id).unwrap();

    assert_eq!(s.vault.total_shares(), 6000);
    assert_eq!(s.vault.total_reserve(), 9000);
    assert_eq!(s.vault.convert_to_assets(2000).unwrap(), 3000);
    assert_eq!(s.vault.convert_to_assets(4000).unwrap(), 6000);

    // Settling both claims pays out the grown amounts
    s.vault.initiate_withdraw(&alice, 2000, &alice).unwrap();
    s.vault.initiate_withdraw(&bob, 4000, &bob).unwrap();
    let (receiver, amount) = s.vault.complete_withdrawal(&operator()).unwrap();
    assert_eq!((receiver, amount), (bob.clone(), 6000));
    let (receiver, amount) = s.vault.complete_withdrawal(&operator()).unwrap();
    assert_eq!((receiver, amount), (alice.clone(), 3000));

    assert_eq!(s.collateral.balance_of(&alice), 3000);
    assert_eq!(s.collateral.balance_of(&bob), 6000);
    assert_eq!(s.vault.total_shares(), 0);
    assert_eq!(s.vault.total_reserve(), 0);
    s.vault.verify_accounting().unwrap();
}

#[test]
fn settlement_is_lifo_and_repriced_at_settlement() {
    let s = stack();
    let (alice, bob) = (addr("alice"), addr("bob"));
    s.collateral.fund(&alice, 5000);
    s.collateral.fund(&bob, 5000);
    s.vault.deposit(&alice, 5000, &alice).unwrap();
    s.vault.deposit(&bob, 5000, &bob).unwrap();

    s.vault.initiate_withdraw(&alice, 1333, &alice).unwrap();
    s.vault.initiate_withdraw(&bob, 2929, &bob).unwrap();

    // Rate doubles between initiation and settlement
    let id = SeriesId::new("windfall");
    s.collateral.fund(s.vault.address(), 10_000);
    s.registry.expect_payout(id.clone(), 10_000);
    s.vault.redeem(&operator(), &id).unwrap();

    // bob initiated last, settles first, at the doubled rate
    let (receiver, amount) = s.vault.complete_withdrawal(&operator()).unwrap();
    assert_eq!((receiver, amount), (bob, 5858));

    let (receiver, _) = s.vault.complete_withdrawal(&operator()).unwrap();
    assert_eq!(receiver, alice);

    assert!(matches!(
        s.vault.complete_withdrawal(&operator()).unwrap_err(),
        Error::NoPendingWithdrawals
    ));
    s.vault.verify_accounting().unwrap();
}

#[test]
fn receiver_uniqueness_holds_across_owners() {
    let s = stack();
    let (alice, bob) = (addr("alice"), addr("bob"));
    s.collateral.fund(&alice, 1000);
    s.collateral.fund(&bob, 1000);
    s.vault.deposit(&alice, 1000, &alice).unwrap();
    s.vault.deposit(&bob, 1000, &bob).unwrap();

    let dest = addr("treasury");
    s.vault.initiate_withdraw(&alice, 100, &dest).unwrap();
    assert!(matches!(
        s.vault.initiate_withdraw(&bob, 100, &dest).unwrap_err(),
        Error::PendingWithdrawalAddress(_)
    ));

    // The slot frees on settlement and the receiver becomes usable again
    s.vault.complete_withdrawal(&operator()).unwrap();
    s.vault.initiate_withdraw(&bob, 100, &dest).unwrap();
    assert_eq!(s.vault.pending_claim(&dest), 100);
}

#[test]
fn operation_batch_commits_reserve_and_records() {
    let s = stack();
    let alice = addr("alice");
    s.collateral.fund(&alice, 10_000);
    s.vault.deposit(&alice, 10_000, &alice).unwrap();

    let counters = s.vault.execute(&operator(), &issue_batch(4000)).unwrap();
    assert_eq!(counters.calls, 1);
    assert_eq!(counters.issued, 1);
    assert_eq!(s.vault.total_reserve(), 6000);
    assert_eq!(s.venue.accepted().len(), 1);

    // A settlement at the shrunk reserve pays out less per share
    s.vault.initiate_withdraw(&alice, 5000, &alice).unwrap();
    let (_, amount) = s.vault.complete_withdrawal(&operator()).unwrap();
    assert_eq!(amount, 3000);
}

#[test]
fn venue_rejection_rolls_back_execute() {
    let s = stack();
    let alice = addr("alice");
    s.collateral.fund(&alice, 1000);
    s.vault.deposit(&alice, 1000, &alice).unwrap();

    s.venue.reject_next("circuit breaker");
    let err = s.vault.execute(&operator(), &issue_batch(500)).unwrap_err();
    assert!(matches!(err, Error::Venue(_)));
    assert_eq!(s.vault.total_reserve(), 1000);
    assert_eq!(s.vault.execution_counters().calls, 0);
    assert!(s.venue.accepted().is_empty());
}

#[test]
fn collateral_failure_rolls_back_deposit_and_settlement() {
    let s = stack();
    let alice = addr("alice");
    s.collateral.fund(&alice, 2000);
    s.vault.deposit(&alice, 1000, &alice).unwrap();

    s.collateral.fail_next_transfer();
    assert!(matches!(
        s.vault.deposit(&alice, 500, &alice).unwrap_err(),
        Error::Collateral(_)
    ));
    assert_eq!(s.vault.total_shares(), 1000);
    assert_eq!(s.vault.total_reserve(), 1000);

    s.vault.initiate_withdraw(&alice, 400, &alice).unwrap();
    s.collateral.fail_next_transfer();
    assert!(matches!(
        s.vault.complete_withdrawal(&operator()).unwrap_err(),
        Error::Collateral(_)
    ));
    // Claim stays queued and balances untouched; a retry succeeds
    assert_eq!(s.vault.queue_depth(), 1);
    assert_eq!(s.vault.balance_of(&alice), 1000);
    s.vault.complete_withdrawal(&operator()).unwrap();
    assert_eq!(s.vault.balance_of(&alice), 600);
    s.vault.verify_accounting().unwrap();
}

struct ReentrantVenue {
    target: RwLock<Option<Arc<Vault>>>,
    observed: RwLock<Option<Error>>,
}

impl TradingVenue for ReentrantVenue {
    fn operate(&self, _batch: &[Procedure]) -> CollabResult<()> {
        let target = self.target.read().clone();
        if let Some(vault) = target {
            let nested = vault.deposit(&addr("alice"), 1, &addr("alice"));
            *self.observed.write() = nested.err();
        }
        Ok(())
    }
}

#[test]
fn nested_call_from_collaborator_is_rejected() {
    let venue = Arc::new(ReentrantVenue {
        target: RwLock::new(None),
        observed: RwLock::new(None),
    });
    let collateral = Arc::new(InMemoryCollateral::new("vault"));
    let vault = Arc::new(
        Vault::new(
            Config::default(),
            Collaborators {
                collateral: collateral.clone(),
                venue: venue.clone(),
                registry: Arc::new(SimRegistry::new()),
                oracle: Arc::new(FlatOracle::default()),
                registrar: Arc::new(RecordingRegistrar::new()),
                clock: Arc::new(ManualClock::at(t0())),
            },
        )
        .unwrap(),
    );
    *venue.target.write() = Some(vault.clone());

    let alice = addr("alice");
    collateral.fund(&alice, 1000);
    vault.deposit(&alice, 1000, &alice).unwrap();

    vault.execute(&operator(), &issue_batch(100)).unwrap();
    assert!(matches!(
        venue.observed.read().as_ref(),
        Some(Error::Reentrancy)
    ));
    // The outer call completed normally despite the rejected nested one
    assert_eq!(vault.total_reserve(), 900);
    assert_eq!(vault.total_shares(), 1000);
}

#[test]
fn epoch_lock_gates_liquidity_but_not_settlement() {
    let s = stack_with(Config {
        epoch_lock: Some(EpochLockConfig {
            start_time: t0(),
            lock_period_secs: 3600,
            unlock_period_secs: 3600,
        }),
        ..Config::default()
    });
    let alice = addr("alice");
    s.collateral.fund(&alice, 10_000);

    // Cycle boundary itself is open
    s.vault.deposit(&alice, 1000, &alice).unwrap();
    s.vault.initiate_withdraw(&alice, 100, &alice).unwrap();

    s.clock.advance_secs(1800);
    assert!(matches!(
        s.vault.deposit(&alice, 1000, &alice).unwrap_err(),
        Error::LiquidityLocked { .. }
    ));
    assert!(matches!(
        s.vault.mint(&alice, 10, &alice).unwrap_err(),
        Error::LiquidityLocked { .. }
    ));
    assert!(matches!(
        s.vault.initiate_withdraw(&alice, 100, &addr("bob")).unwrap_err(),
        Error::LiquidityLocked { .. }
    ));
    // Operator settlement runs regardless of the window
    s.vault.complete_withdrawal(&operator()).unwrap();

    // Unlock window reopens liquidity
    s.clock.advance_secs(3600);
    s.vault.deposit(&alice, 1000, &alice).unwrap();
}

#[test]
fn drained_events_serialize() {
    let s = stack();
    let alice = addr("alice");
    s.collateral.fund(&alice, 1000);
    s.vault.deposit(&alice, 1000, &alice).unwrap();
    s.vault.execute(&operator(), &issue_batch(250)).unwrap();

    let events = s.vault.drain_events();
    assert_eq!(events.len(), 2);
    let json = serde_json::to_string(&events).unwrap();
    assert!(json.contains("Deposited"));
    assert!(json.contains("ActionExecuted"));
}

proptest! {
    /// Reserve always mirrors custody, shares stay conserved, and the queue
    /// links stay intact under arbitrary deposit/initiate/settle interleaving
    #[test]
    fn prop_accounting_holds_under_random_flows(
        steps in proptest::collection::vec((0u8..3, 1u128..1_000_000), 1..40)
    ) {
        let s = stack();
        let users: Vec<Address> = (0..4).map(|i| addr(&format!("user-{}", i))).collect();
        for user in &users {
            s.collateral.fund(user, 10_000_000);
        }

        for (i, (op, amount)) in steps.into_iter().enumerate() {
            let user = &users[i % users.len()];
            match op {
                0 => {
                    let _ = s.vault.deposit(user, amount, user);
                }
                1 => {
                    let balance = s.vault.balance_of(user);
                    if balance > 0 {
                        let _ = s.vault.initiate_withdraw(user, amount.min(balance), user);
                    }
                }
                _ => {
                    let _ = s.vault.complete_withdrawal(&operator());
                }
            }

            s.vault.verify_accounting().unwrap();
            prop_assert_eq!(
                s.vault.total_reserve(),
                s.collateral.balance_of(s.vault.address())
            );
        }
    }

    /// Converting assets to shares and back never manufactures value
    #[test]
    fn prop_round_trip_never_gains(
        seed_assets in 1u128..1_000_000,
        bonus in 0u128..1_000_000,
        probe in 1u128..1_000_000,
    ) {
        let s = stack();
        let alice = addr("alice");
        s.collateral.fund(&alice, seed_assets);
        s.vault.deposit(&alice, seed_assets, &alice).unwrap();

        if bonus > 0 {
            let id = SeriesId::new("bonus");
            s.collateral.fund(s.vault.address(), bonus);
            s.registry.expect_payout(id.clone(), bonus);
            s.vault.redeem(&operator(), &id).unwrap();
        }

        let shares = s.vault.convert_to_shares(probe).unwrap();
        let back = s.vault.convert_to_assets(shares).unwrap();
        prop_assert!(back <= probe);
    }
}
