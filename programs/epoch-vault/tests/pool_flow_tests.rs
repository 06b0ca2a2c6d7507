/// Pool flow tests
///
/// Drive whole epochs through the simulated pool: immediate and scheduled
/// flows, strategy utilization, rebalance settlement, fees and rage quit.
mod common;

use anchor_lang::prelude::*;
use common::{At, SimulatedPool, EPOCH_LENGTH, START, UNIT};
use epoch_vault::{
    constants::*,
    errors::{ErrorKind, VaultError},
    state::Phase,
};

fn maintenance_fee(base: u64) -> u64 {
    (base as u128 * DEFAULT_ANNUAL_MAINTENANCE_FEE as u128 * EPOCH_LENGTH as u128
        / (SECONDS_PER_YEAR as u128 * BASE)) as u64
}

// =============================================================================
// Immediate flows and utilization
// =============================================================================

#[test]
fn test_end_to_end_epoch() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000 * UNIT);

    pool.warp(At::Staking);
    assert_eq!(pool.deposit(alice, 200 * UNIT).unwrap(), 200 * UNIT);
    assert_eq!(pool.withdraw(alice, 100 * UNIT).unwrap(), 100 * UNIT);
    assert_eq!(pool.accounting.total_liquidity, 100 * UNIT);

    // Strategy sells options with 20, collects 10 premium
    pool.warp(At::Trading);
    pool.deploy(20 * UNIT);
    pool.receive(10 * UNIT);
    assert_eq!(pool.accounting.available_liquidity(pool.vault_balance), 90 * UNIT);
    assert_eq!(pool.accounting.utilized_liquidity(pool.vault_balance), 10 * UNIT);
    assert_eq!(
        pool.accounting
            .liquidity_utilization_ratio(pool.vault_balance)
            .unwrap(),
        (BASE / 10) as u64
    );
    // Utilization does not move the share price
    assert_eq!(
        pool.staking
            .convert_to_assets(UNIT, pool.accounting.total_liquidity)
            .unwrap(),
        UNIT
    );

    pool.recall(20 * UNIT);
    pool.warp(At::EpochEnd);
    let outcome = pool.rebalance().unwrap();

    let profit_fee = UNIT;
    let maintenance = maintenance_fee(100 * UNIT);
    assert_eq!(outcome.profit, 10 * UNIT);
    assert_eq!(outcome.loss, 0);
    assert_eq!(outcome.profit_fee, profit_fee);
    assert_eq!(outcome.maintenance_fee, maintenance);
    assert_eq!(pool.accounting.accumulated_fees, profit_fee + maintenance);
    assert_eq!(
        pool.accounting.total_liquidity,
        100 * UNIT + 10 * UNIT - profit_fee - maintenance
    );

    assert_eq!(pool.lifecycle.epoch_id, 1);
    assert_eq!(pool.lifecycle.current_epoch_start(), START + EPOCH_LENGTH);
    assert_eq!(pool.lifecycle.phase(pool.now), Phase::Staking);
    pool.assert_vault_backs_liquidity();
    pool.assert_share_supply();
}

#[test]
fn test_phase_gating_of_immediate_flows() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000 * UNIT);

    pool.now = START - TIME_DELTA - 1;
    assert_eq!(
        pool.deposit(alice, UNIT).unwrap_err(),
        error!(VaultError::DepositNotAllowed)
    );
    pool.now = START - TIME_DELTA;
    pool.deposit(alice, UNIT).unwrap();

    pool.warp(At::Trading);
    assert_eq!(pool.mint(alice, UNIT).unwrap(), UNIT);
    let err = pool.redeem(alice, UNIT).unwrap_err();
    assert_eq!(err, error!(VaultError::WithdrawalNotAllowed));

    pool.warp(At::Idle);
    assert_eq!(
        pool.deposit(alice, UNIT).unwrap_err(),
        error!(VaultError::DepositNotAllowed)
    );
    assert_eq!(
        pool.withdraw(alice, UNIT).unwrap_err(),
        error!(VaultError::WithdrawalNotAllowed)
    );
    assert_eq!(VaultError::DepositNotAllowed.kind(), ErrorKind::PhaseNotAllowed);

    pool.assert_vault_backs_liquidity();
    pool.assert_share_supply();
}

#[test]
fn test_withdraw_capped_by_utilization() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000 * UNIT);
    pool.deposit(alice, 1_000 * UNIT).unwrap();

    pool.deploy(700 * UNIT);
    assert_eq!(
        pool.withdraw(alice, 301 * UNIT).unwrap_err(),
        error!(VaultError::InsufficientLiquidity)
    );
    pool.withdraw(alice, 300 * UNIT).unwrap();
    assert_eq!(pool.accounting.total_liquidity, 700 * UNIT);
    assert_eq!(pool.accounting.available_liquidity(pool.vault_balance), 0);
}

// =============================================================================
// Scheduled flows
// =============================================================================

#[test]
fn test_scheduled_deposit_settles_at_epoch_price() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(10_000 * UNIT);
    let bob = pool.user(1_000 * UNIT);

    pool.deposit(alice, 1_000 * UNIT).unwrap();

    pool.warp(At::Trading);
    assert_eq!(
        pool.schedule_deposit(bob, 200 * UNIT).unwrap_err(),
        error!(VaultError::SchedulingNotAllowed)
    );

    pool.warp(At::Idle);
    pool.schedule_deposit(bob, 200 * UNIT).unwrap();
    pool.unschedule_deposit(bob, 100 * UNIT).unwrap();
    assert_eq!(pool.staking.total_scheduled_deposits, 100 * UNIT);
    assert_eq!(pool.escrow_assets, 100 * UNIT);
    assert_eq!(pool.wallet(&bob), 900 * UNIT);
    assert_eq!(
        pool.unschedule_deposit(bob, 101 * UNIT).unwrap_err(),
        error!(VaultError::InsufficientScheduledAssets)
    );

    // Profit during the epoch
    pool.warp(At::EpochEnd);
    pool.receive(50 * UNIT);
    let outcome = pool.rebalance().unwrap();

    let price = outcome.settlement.share_price;
    let expected = (100 * UNIT as u128 * price / BASE) as u64;
    assert_eq!(outcome.settlement.minted_shares, expected);
    assert_eq!(pool.staking.total_scheduled_deposits, 0);
    assert_eq!(pool.escrow_assets, 0);

    // Profit made existing shares worth more than one unit each
    assert!(expected < 100 * UNIT);

    assert_eq!(pool.claim_shares(bob, 0, true).unwrap(), expected);
    let err = pool.claim_shares(bob, 0, true).unwrap_err();
    assert_eq!(err, error!(VaultError::InsufficientClaimable));
    assert_eq!(
        VaultError::InsufficientClaimable.kind(),
        ErrorKind::InsufficientBalance
    );

    assert_eq!(pool.shares_of(&bob), expected);
    assert_eq!(pool.escrow_shares, 0);
    pool.assert_vault_backs_liquidity();
    pool.assert_share_supply();
}

#[test]
fn test_scheduled_withdrawal_reserves_assets() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000 * UNIT);
    pool.deposit(alice, 1_000 * UNIT).unwrap();

    pool.warp(At::Idle);
    assert_eq!(
        pool.schedule_withdrawal(alice, 1_001 * UNIT).unwrap_err(),
        error!(VaultError::InsufficientShares)
    );
    pool.schedule_withdrawal(alice, 500 * UNIT).unwrap();
    pool.unschedule_withdrawal(alice, 100 * UNIT).unwrap();
    assert_eq!(pool.escrow_shares, 400 * UNIT);
    assert_eq!(pool.shares_of(&alice), 600 * UNIT);

    pool.warp(At::EpochEnd);
    let outcome = pool.rebalance().unwrap();
    let price = outcome.settlement.share_price;
    let expected = (400 * UNIT as u128 * BASE / price) as u64;
    assert_eq!(outcome.settlement.burned_shares, 400 * UNIT);
    assert_eq!(outcome.settlement.reserved_assets, expected);
    assert_eq!(pool.staking.total_shares, 600 * UNIT);

    // Claims are open in any phase
    pool.warp(At::Trading);
    assert_eq!(pool.claim_assets(alice, 0, true).unwrap(), expected);
    assert_eq!(pool.escrow_assets, 0);
    assert_eq!(pool.wallet(&alice), expected);

    pool.assert_vault_backs_liquidity();
    pool.assert_share_supply();
}

#[test]
fn test_lazy_settlement_across_epochs() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000 * UNIT);
    let bob = pool.user(1_000 * UNIT);
    pool.deposit(alice, 1_000 * UNIT).unwrap();

    pool.warp(At::Idle);
    pool.schedule_deposit(bob, 100 * UNIT).unwrap();
    pool.warp(At::EpochEnd);
    let first = pool.rebalance().unwrap();

    // Bob does nothing during epoch 1
    pool.warp(At::EpochEnd);
    let second = pool.rebalance().unwrap();
    assert_ne!(first.settlement.share_price, second.settlement.share_price);
    assert_eq!(second.settlement.minted_shares, 0);

    // Next touch settles epoch 0 at epoch 0's price
    pool.warp(At::Idle);
    pool.schedule_deposit(bob, 50 * UNIT).unwrap();
    let schedule = pool.schedules[&bob].clone();
    assert_eq!(schedule.deposit.updated_at_epoch, 2);
    assert_eq!(schedule.deposit.deposited_assets, 50 * UNIT);
    assert_eq!(
        schedule.deposit.scheduled_shares,
        first.settlement.minted_shares
    );

    // Partial claim, then the rest
    let claimable = schedule.deposit.scheduled_shares;
    assert_eq!(pool.claim_shares(bob, 10, false).unwrap(), 10);
    assert_eq!(pool.claim_shares(bob, 0, false).unwrap(), 0);
    assert_eq!(
        pool.claim_shares(bob, claimable, false).unwrap_err(),
        error!(VaultError::InsufficientClaimable)
    );
    assert_eq!(pool.claim_shares(bob, 0, true).unwrap(), claimable - 10);

    pool.assert_vault_backs_liquidity();
    pool.assert_share_supply();
}

#[test]
fn test_zero_scheduling_is_noop() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000 * UNIT);
    pool.deposit(alice, 1_000 * UNIT).unwrap();

    pool.warp(At::Idle);
    pool.schedule_deposit(alice, 0).unwrap();
    pool.schedule_withdrawal(alice, 0).unwrap();
    pool.unschedule_deposit(alice, 0).unwrap();
    assert_eq!(pool.staking.total_scheduled_deposits, 0);
    assert_eq!(pool.staking.total_scheduled_withdrawals, 0);
    assert_eq!(pool.escrow_assets, 0);
    assert_eq!(pool.escrow_shares, 0);
}

// =============================================================================
// Rebalance
// =============================================================================

#[test]
fn test_rebalance_authorization_and_timing() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000 * UNIT);
    pool.deposit(alice, 1_000 * UNIT).unwrap();

    pool.warp(At::Idle);
    assert_eq!(
        pool.rebalance().unwrap_err(),
        error!(VaultError::RebalanceTooEarly)
    );

    pool.warp(At::EpochEnd);
    let stranger = Pubkey::new_unique();
    assert_eq!(
        pool.rebalance_as(stranger).unwrap_err(),
        error!(VaultError::StrategyNotEnabled)
    );
    assert_eq!(pool.lifecycle.epoch_id, 0);
    assert_eq!(pool.accounting.accumulated_fees, 0);

    // A second enabled strategy may close the epoch too
    let owner = pool.owner;
    let extra = Pubkey::new_unique();
    pool.registry.enable_strategy(&owner, extra).unwrap();
    pool.rebalance_as(extra).unwrap();
    assert_eq!(pool.lifecycle.epoch_id, 1);
}

#[test]
fn test_rebalance_realizes_loss() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000 * UNIT);
    pool.deposit(alice, 1_000 * UNIT).unwrap();

    pool.warp(At::Trading);
    pool.deploy(900 * UNIT);
    pool.lose(100 * UNIT);
    pool.recall(800 * UNIT);

    pool.warp(At::EpochEnd);
    let outcome = pool.rebalance().unwrap();
    assert_eq!(outcome.profit, 0);
    assert_eq!(outcome.profit_fee, 0);
    assert_eq!(outcome.loss, 100 * UNIT);
    assert_eq!(outcome.maintenance_fee, maintenance_fee(900 * UNIT));
    assert_eq!(
        pool.accounting.total_liquidity,
        900 * UNIT - maintenance_fee(900 * UNIT)
    );

    // Shares now redeem for less
    pool.warp(At::Staking);
    let assets = pool.redeem(alice, 100 * UNIT).unwrap();
    assert!(assets < 90 * UNIT);
    pool.assert_vault_backs_liquidity();
}

#[test]
fn test_collect_fees() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000 * UNIT);
    pool.deposit(alice, 1_000 * UNIT).unwrap();
    pool.warp(At::EpochEnd);
    pool.receive(100 * UNIT);
    pool.rebalance().unwrap();

    let fees = pool.accounting.accumulated_fees;
    assert_eq!(fees, 10 * UNIT + maintenance_fee(1_000 * UNIT));

    assert_eq!(
        pool.collect_fees(alice).unwrap_err(),
        error!(VaultError::NotFeeCollector)
    );
    let collector = pool.fee_collector;
    assert_eq!(pool.collect_fees(collector).unwrap(), fees);
    assert_eq!(pool.accounting.accumulated_fees, 0);
    assert_eq!(pool.collect_fees(collector).unwrap(), 0);
    pool.assert_vault_backs_liquidity();
}

#[test]
fn test_total_loss_blocks_new_shares() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(100 * UNIT);
    let bob = pool.user(200 * UNIT);
    pool.deposit(alice, 100 * UNIT).unwrap();

    pool.warp(At::Trading);
    pool.deploy(100 * UNIT);
    pool.lose(100 * UNIT);

    pool.warp(At::Idle);
    pool.schedule_deposit(bob, 50 * UNIT).unwrap();

    pool.warp(At::EpochEnd);
    let outcome = pool.rebalance().unwrap();
    assert_eq!(outcome.loss, 100 * UNIT);
    assert_eq!(outcome.settlement.share_price, 0);
    assert_eq!(outcome.settlement.minted_shares, 0);
    assert_eq!(outcome.settlement.refunded_assets, 50 * UNIT);
    assert_eq!(pool.accounting.total_liquidity, 0);
    assert_eq!(pool.staking.total_shares, 100 * UNIT);
    assert!(pool.staking.is_insolvent(pool.accounting.total_liquidity));

    // Wiped-out shares must not absorb new money
    pool.warp(At::Staking);
    assert_eq!(
        pool.deposit(bob, 100 * UNIT).unwrap_err(),
        error!(VaultError::PoolInsolvent)
    );
    assert_eq!(
        pool.mint(bob, 100 * UNIT).unwrap_err(),
        error!(VaultError::PoolInsolvent)
    );
    assert_eq!(pool.wallet(&bob), 150 * UNIT);

    // The scheduled deposit comes back as claimable assets
    assert_eq!(
        pool.claim_shares(bob, 0, true).unwrap_err(),
        error!(VaultError::InsufficientClaimable)
    );
    assert_eq!(pool.claim_assets(bob, 0, true).unwrap(), 50 * UNIT);
    assert_eq!(pool.wallet(&bob), 200 * UNIT);
    assert_eq!(pool.escrow_assets, 0);

    // Once the worthless shares are gone the pool bootstraps again
    assert_eq!(pool.redeem(alice, 100 * UNIT).unwrap(), 0);
    assert_eq!(pool.staking.total_shares, 0);
    assert_eq!(pool.deposit(bob, 100 * UNIT).unwrap(), 100 * UNIT);
    assert_eq!(
        pool.staking
            .convert_to_assets(100 * UNIT, pool.accounting.total_liquidity)
            .unwrap(),
        100 * UNIT
    );
    pool.assert_vault_backs_liquidity();
    pool.assert_share_supply();
}

#[test]
fn test_premium_restores_insolvent_pool() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(100 * UNIT);
    let bob = pool.user(100 * UNIT);
    pool.deposit(alice, 100 * UNIT).unwrap();
    pool.deploy(100 * UNIT);
    pool.lose(100 * UNIT);
    pool.warp(At::EpochEnd);
    pool.rebalance().unwrap();

    // Premium lands during the insolvent epoch
    pool.receive(10 * UNIT);
    pool.warp(At::EpochEnd);
    let outcome = pool.rebalance().unwrap();
    assert_eq!(outcome.profit, 10 * UNIT);
    assert_eq!(pool.accounting.total_liquidity, 9 * UNIT);
    assert!(outcome.settlement.share_price > 0);

    // Alice owns the recovered liquidity, bob buys in at the new price
    pool.warp(At::Staking);
    let shares = pool.deposit(bob, 9 * UNIT).unwrap();
    assert_eq!(shares, 100 * UNIT);
    pool.assert_vault_backs_liquidity();
    pool.assert_share_supply();
}

// =============================================================================
// Rage quit
// =============================================================================

#[test]
fn test_rage_quit_is_proportional() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000);
    pool.deposit(alice, 1_000).unwrap();

    let option_token = Pubkey::new_unique();
    pool.open_position(option_token, 500).unwrap();

    // No phase gating
    pool.warp(At::Idle);
    let payouts = pool.rage_quit(alice, 100).unwrap();
    for (token, amount) in payouts {
        if token == pool.underlying_mint {
            assert_eq!(amount, 100);
        } else {
            assert_eq!(token, option_token);
            assert_eq!(amount, 50);
        }
    }
    assert_eq!(pool.staking.total_shares, 900);
    assert_eq!(pool.accounting.total_liquidity, 900);
    assert_eq!(pool.vault_positions[&option_token], 450);
    pool.assert_vault_backs_liquidity();
    pool.assert_share_supply();
}

#[test]
fn test_rage_quit_rejects_bad_token_lists() {
    let mut pool = SimulatedPool::new();
    let alice = pool.user(1_000);
    pool.deposit(alice, 1_000).unwrap();
    let option_token = Pubkey::new_unique();
    pool.open_position(option_token, 500).unwrap();

    let held = pool.held_tokens();
    let underlying = pool.underlying_mint;

    let mut unregistered = held.clone();
    unregistered.push(Pubkey::new_unique());
    unregistered.sort();
    assert_eq!(
        pool.rage_quit_with(alice, 100, unregistered).unwrap_err(),
        error!(VaultError::UnregisteredPosition)
    );

    let mut reversed = held.clone();
    reversed.reverse();
    assert_eq!(
        pool.rage_quit_with(alice, 100, reversed).unwrap_err(),
        error!(VaultError::UnsortedOrDuplicate)
    );

    assert_eq!(
        pool.rage_quit_with(alice, 100, vec![underlying, underlying])
            .unwrap_err(),
        error!(VaultError::UnsortedOrDuplicate)
    );

    assert_eq!(
        pool.rage_quit_with(alice, 100, vec![underlying]).unwrap_err(),
        error!(VaultError::IncompletePositionList)
    );

    // Nothing moved
    assert_eq!(pool.staking.total_shares, 1_000);
    assert_eq!(pool.accounting.total_liquidity, 1_000);
    assert_eq!(pool.shares_of(&alice), 1_000);
}
