use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use super::scheduled_deposits::share_price_snapshot;
use crate::{constants::*, errors::*, events::*, state::*, token_ops};

/// Queue shares for redemption at the next epoch boundary (idle phase only)
#[derive(Accounts)]
pub struct ScheduleWithdrawal<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

    /// CHECK: any account may receive the redeemed assets
    pub receiver: UncheckedAccount<'info>,

    #[account(
        seeds = [REGISTRY_SEED, registry.underlying_mint.as_ref()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        seeds = [LIFECYCLE_SEED, registry.key().as_ref()],
        bump = lifecycle.bump,
    )]
    pub lifecycle: Box<Account<'info, Lifecycle>>,

    #[account(
        mut,
        seeds = [STAKING_SEED, registry.key().as_ref()],
        bump = staking.bump,
    )]
    pub staking: Box<Account<'info, Staking>>,

    #[account(
        init_if_needed,
        payer = user,
        space = STAKER_SCHEDULE_SIZE,
        seeds = [SCHEDULE_SEED, staking.key().as_ref(), receiver.key().as_ref()],
        bump
    )]
    pub schedule: Box<Account<'info, StakerSchedule>>,

    pub share_price: Option<Account<'info, EpochSharePrice>>,

    #[account(
        mut,
        constraint = user_share_account.mint == staking.share_mint @ VaultError::InvalidMint,
        constraint = user_share_account.owner == user.key() @ VaultError::InvalidTokenAccount,
    )]
    pub user_share_account: Box<Account<'info, TokenAccount>>,

    /// CHECK: PDA validated by seeds
    #[account(
        seeds = [ESCROW_AUTHORITY_SEED, registry.key().as_ref()],
        bump = registry.escrow_authority_bump,
    )]
    pub escrow_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = share_escrow_account.mint == staking.share_mint @ VaultError::InvalidMint,
        address = crate::token_ops::pool_token_account(&escrow_authority.key(), &staking.share_mint)
            @ VaultError::InvalidTokenAccount,
    )]
    pub share_escrow_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

pub fn schedule_handler(ctx: Context<ScheduleWithdrawal>, shares: u64) -> Result<()> {
    let accounts = ctx.accounts;
    let staking_key = accounts.staking.key();
    let receiver = accounts.receiver.key();
    accounts
        .schedule
        .bind(staking_key, receiver, ctx.bumps.schedule);

    let owner_shares = accounts.user_share_account.amount;
    let price = share_price_snapshot(&accounts.share_price, &staking_key)?;
    let env = PoolEnv {
        registry: &accounts.registry,
        lifecycle: &accounts.lifecycle,
        staking_key,
        now: Clock::get()?.unix_timestamp,
    };

    let scheduled = accounts.staking.schedule_withdrawal(
        &env,
        &mut accounts.schedule,
        price,
        shares,
        owner_shares,
    )?;
    if !scheduled {
        return Ok(());
    }

    // Shares wait in escrow and stay part of total supply until rebalance
    token_ops::transfer(
        accounts.token_program.to_account_info(),
        accounts.user_share_account.to_account_info(),
        accounts.share_escrow_account.to_account_info(),
        accounts.user.to_account_info(),
        &[],
        shares,
    )?;

    emit!(WithdrawalScheduled {
        registry: accounts.registry.key(),
        receiver,
        epoch_id: accounts.lifecycle.epoch_id,
        shares,
        scheduled: true,
        total_scheduled_withdrawals: accounts.staking.total_scheduled_withdrawals,
        timestamp: env.now,
    });

    Ok(())
}

/// Reverse part of a withdrawal scheduled in the current epoch
#[derive(Accounts)]
pub struct UnscheduleWithdrawal<'info> {
    pub user: Signer<'info>,

    #[account(
        seeds = [REGISTRY_SEED, registry.underlying_mint.as_ref()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        seeds = [LIFECYCLE_SEED, registry.key().as_ref()],
        bump = lifecycle.bump,
    )]
    pub lifecycle: Box<Account<'info, Lifecycle>>,

    #[account(
        mut,
        seeds = [STAKING_SEED, registry.key().as_ref()],
        bump = staking.bump,
    )]
    pub staking: Box<Account<'info, Staking>>,

    #[account(
        mut,
        seeds = [SCHEDULE_SEED, staking.key().as_ref(), user.key().as_ref()],
        bump = schedule.bump,
    )]
    pub schedule: Box<Account<'info, StakerSchedule>>,

    pub share_price: Option<Account<'info, EpochSharePrice>>,

    #[account(
        mut,
        constraint = user_share_account.mint == staking.share_mint @ VaultError::InvalidMint,
    )]
    pub user_share_account: Box<Account<'info, TokenAccount>>,

    /// CHECK: PDA validated by seeds
    #[account(
        seeds = [ESCROW_AUTHORITY_SEED, registry.key().as_ref()],
        bump = registry.escrow_authority_bump,
    )]
    pub escrow_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = share_escrow_account.mint == staking.share_mint @ VaultError::InvalidMint,
        address = crate::token_ops::pool_token_account(&escrow_authority.key(), &staking.share_mint)
            @ VaultError::InvalidTokenAccount,
    )]
    pub share_escrow_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn unschedule_handler(ctx: Context<UnscheduleWithdrawal>, shares: u64) -> Result<()> {
    let accounts = ctx.accounts;
    let staking_key = accounts.staking.key();
    let price = share_price_snapshot(&accounts.share_price, &staking_key)?;
    let env = PoolEnv {
        registry: &accounts.registry,
        lifecycle: &accounts.lifecycle,
        staking_key,
        now: Clock::get()?.unix_timestamp,
    };

    let unscheduled = accounts
        .staking
        .unschedule_withdrawal(&env, &mut accounts.schedule, price, shares)?;
    if !unscheduled {
        return Ok(());
    }

    let registry_key = accounts.registry.key();
    let escrow_bump = accounts.registry.escrow_authority_bump;
    let escrow_seeds: &[&[u8]] = &[ESCROW_AUTHORITY_SEED, registry_key.as_ref(), &[escrow_bump]];
    token_ops::transfer(
        accounts.token_program.to_account_info(),
        accounts.share_escrow_account.to_account_info(),
        accounts.user_share_account.to_account_info(),
        accounts.escrow_authority.to_account_info(),
        &[escrow_seeds],
        shares,
    )?;

    emit!(WithdrawalScheduled {
        registry: registry_key,
        receiver: accounts.user.key(),
        epoch_id: accounts.lifecycle.epoch_id,
        shares,
        scheduled: false,
        total_scheduled_withdrawals: accounts.staking.total_scheduled_withdrawals,
        timestamp: env.now,
    });

    Ok(())
}

/// Claim underlying from settled scheduled withdrawals (any phase)
#[derive(Accounts)]
pub struct ClaimScheduledAssets<'info> {
    pub user: Signer<'info>,

    #[account(
        seeds = [REGISTRY_SEED, registry.underlying_mint.as_ref()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        seeds = [LIFECYCLE_SEED, registry.key().as_ref()],
        bump = lifecycle.bump,
    )]
    pub lifecycle: Box<Account<'info, Lifecycle>>,

    #[account(
        seeds = [STAKING_SEED, registry.key().as_ref()],
        bump = staking.bump,
    )]
    pub staking: Box<Account<'info, Staking>>,

    #[account(
        mut,
        seeds = [SCHEDULE_SEED, staking.key().as_ref(), user.key().as_ref()],
        bump = schedule.bump,
    )]
    pub schedule: Box<Account<'info, StakerSchedule>>,

    pub share_price: Option<Account<'info, EpochSharePrice>>,

    /// CHECK: PDA validated by seeds
    #[account(
        seeds = [ESCROW_AUTHORITY_SEED, registry.key().as_ref()],
        bump = registry.escrow_authority_bump,
    )]
    pub escrow_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = escrow_token_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
        address = crate::token_ops::pool_token_account(&escrow_authority.key(), &registry.underlying_mint)
            @ VaultError::InvalidTokenAccount,
    )]
    pub escrow_token_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = user_asset_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
    )]
    pub user_asset_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn claim_handler(ctx: Context<ClaimScheduledAssets>, assets: u64, claim_all: bool) -> Result<()> {
    let accounts = ctx.accounts;
    let staking_key = accounts.staking.key();
    let price = share_price_snapshot(&accounts.share_price, &staking_key)?;
    let env = PoolEnv {
        registry: &accounts.registry,
        lifecycle: &accounts.lifecycle,
        staking_key,
        now: Clock::get()?.unix_timestamp,
    };

    let claimed = accounts.staking.claim_scheduled_assets(
        &env,
        &mut accounts.schedule,
        price,
        assets,
        claim_all,
    )?;
    if claimed == 0 {
        return Ok(());
    }

    let registry_key = accounts.registry.key();
    let escrow_bump = accounts.registry.escrow_authority_bump;
    let escrow_seeds: &[&[u8]] = &[ESCROW_AUTHORITY_SEED, registry_key.as_ref(), &[escrow_bump]];
    token_ops::transfer(
        accounts.token_program.to_account_info(),
        accounts.escrow_token_account.to_account_info(),
        accounts.user_asset_account.to_account_info(),
        accounts.escrow_authority.to_account_info(),
        &[escrow_seeds],
        claimed,
    )?;

    emit!(ScheduledClaimed {
        registry: registry_key,
        user: accounts.user.key(),
        shares: 0,
        assets: claimed,
        timestamp: env.now,
    });

    Ok(())
}
