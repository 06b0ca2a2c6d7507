use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, TokenAccount};

use crate::{constants::*, errors::*, state::*};

/// Read-only pool snapshot, returned through program return data
#[derive(Accounts)]
pub struct GetPoolData<'info> {
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
        seeds = [ACCOUNTING_SEED, registry.key().as_ref()],
        bump = accounting.bump,
    )]
    pub accounting: Box<Account<'info, Accounting>>,

    #[account(
        seeds = [STAKING_SEED, registry.key().as_ref()],
        bump = staking.bump,
    )]
    pub staking: Box<Account<'info, Staking>>,

    #[account(address = registry.underlying_mint @ VaultError::InvalidMint)]
    pub underlying_mint: Box<Account<'info, Mint>>,

    #[account(
        constraint = vault_token_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
        address = crate::token_ops::pool_token_account(&registry.vault, &registry.underlying_mint)
            @ VaultError::InvalidTokenAccount,
    )]
    pub vault_token_account: Box<Account<'info, TokenAccount>>,
}

pub fn pool_data_handler(ctx: Context<GetPoolData>) -> Result<PoolData> {
    let accounts = &ctx.accounts;
    PoolData::build(
        &accounts.registry,
        &accounts.lifecycle,
        &accounts.accounting,
        &accounts.staking,
        accounts.vault_token_account.amount,
        accounts.underlying_mint.decimals,
        Clock::get()?.unix_timestamp,
    )
}

/// Read-only view of one user's position and scheduled flows
#[derive(Accounts)]
pub struct GetStakingData<'info> {
    /// CHECK: only used as a key
    pub user: UncheckedAccount<'info>,

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
        seeds = [ACCOUNTING_SEED, registry.key().as_ref()],
        bump = accounting.bump,
    )]
    pub accounting: Box<Account<'info, Accounting>>,

    #[account(
        seeds = [STAKING_SEED, registry.key().as_ref()],
        bump = staking.bump,
    )]
    pub staking: Box<Account<'info, Staking>>,

    #[account(
        constraint = user_share_account.mint == staking.share_mint @ VaultError::InvalidMint,
        constraint = user_share_account.owner == user.key() @ VaultError::InvalidTokenAccount,
    )]
    pub user_share_account: Option<Box<Account<'info, TokenAccount>>>,

    #[account(
        seeds = [SCHEDULE_SEED, staking.key().as_ref(), user.key().as_ref()],
        bump = schedule.bump,
    )]
    pub schedule: Option<Box<Account<'info, StakerSchedule>>>,

    pub share_price: Option<Account<'info, EpochSharePrice>>,
}

pub fn staking_data_handler(ctx: Context<GetStakingData>) -> Result<StakingData> {
    let accounts = &ctx.accounts;
    let staking_key = accounts.staking.key();
    let price = super::scheduled_deposits::share_price_snapshot(&accounts.share_price, &staking_key)?;
    let user_shares = accounts
        .user_share_account
        .as_ref()
        .map_or(0, |account| account.amount);
    let schedule = accounts.schedule.as_deref().map(|schedule| &**schedule);

    StakingData::build(
        accounts.user.key(),
        user_shares,
        &accounts.staking,
        &accounts.lifecycle,
        &accounts.accounting,
        schedule,
        price,
    )
}
