use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{constants::*, errors::*, events::*, state::*, token_ops};

/// Deposit underlying into the pool and receive shares immediately
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: User must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Pool state PDAs validated with seeds
/// ✅ 4. PHASE GATING: Staking or trading phase only
/// ✅ 6. MATH SAFETY: Share conversion in u128 with explicit rounding
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Validates mint and owner
/// ✅ 8. BUSINESS LOGIC: Checks-effects-interactions pattern
/// ✅ 10. EVENTS: Emits Deposited event
#[derive(Accounts)]
pub struct Deposit<'info> {
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
        seeds = [ACCOUNTING_SEED, registry.key().as_ref()],
        bump = accounting.bump,
    )]
    pub accounting: Box<Account<'info, Accounting>>,

    #[account(
        mut,
        seeds = [STAKING_SEED, registry.key().as_ref()],
        bump = staking.bump,
    )]
    pub staking: Box<Account<'info, Staking>>,

    #[account(
        mut,
        address = staking.share_mint @ VaultError::InvalidMint,
    )]
    pub share_mint: Box<Account<'info, Mint>>,

    /// CHECK: PDA used as mint authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, registry.key().as_ref()],
        bump = registry.vault_authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// User's underlying token account (source)
    #[account(
        mut,
        constraint = user_asset_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
        constraint = user_asset_account.owner == user.key() @ VaultError::InvalidTokenAccount,
    )]
    pub user_asset_account: Box<Account<'info, TokenAccount>>,

    /// Receiver's share token account (destination)
    #[account(
        mut,
        constraint = receiver_share_account.mint == staking.share_mint @ VaultError::InvalidMint,
    )]
    pub receiver_share_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = vault_token_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
        address = crate::token_ops::pool_token_account(&vault_authority.key(), &registry.underlying_mint)
            @ VaultError::InvalidTokenAccount,
    )]
    pub vault_token_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

impl<'info> Deposit<'info> {
    fn settle(&self, assets: u64, shares: u64) -> Result<()> {
        // Transfer underlying from user to vault
        token_ops::transfer(
            self.token_program.to_account_info(),
            self.user_asset_account.to_account_info(),
            self.vault_token_account.to_account_info(),
            self.user.to_account_info(),
            &[],
            assets,
        )?;

        // Mint shares to receiver
        let registry_key = self.registry.key();
        let authority_bump = self.registry.vault_authority_bump;
        let authority_seeds: &[&[u8]] = &[
            VAULT_AUTHORITY_SEED,
            registry_key.as_ref(),
            &[authority_bump],
        ];
        token_ops::mint_to(
            self.token_program.to_account_info(),
            self.share_mint.to_account_info(),
            self.receiver_share_account.to_account_info(),
            self.vault_authority.to_account_info(),
            &[authority_seeds],
            shares,
        )?;

        emit!(Deposited {
            registry: registry_key,
            user: self.user.key(),
            asset_amount: assets,
            shares_minted: shares,
            total_liquidity: self.accounting.total_liquidity,
            total_shares: self.staking.total_shares,
            timestamp: Clock::get()?.unix_timestamp,
        });
        Ok(())
    }
}

/// Deposit exactly `assets`, minting the previewed shares
pub fn deposit_handler(ctx: Context<Deposit>, assets: u64) -> Result<()> {
    let accounts = ctx.accounts;
    let env = PoolEnv {
        registry: &accounts.registry,
        lifecycle: &accounts.lifecycle,
        staking_key: accounts.staking.key(),
        now: Clock::get()?.unix_timestamp,
    };

    // CHECKS + EFFECTS: counters updated before any token movement
    let shares = accounts
        .staking
        .deposit(&env, &mut accounts.accounting, assets)?;

    // INTERACTIONS
    accounts.settle(assets, shares)
}

/// Mint exactly `shares`, pulling the previewed assets (rounded up)
pub fn mint_handler(ctx: Context<Deposit>, shares: u64) -> Result<()> {
    let accounts = ctx.accounts;
    let env = PoolEnv {
        registry: &accounts.registry,
        lifecycle: &accounts.lifecycle,
        staking_key: accounts.staking.key(),
        now: Clock::get()?.unix_timestamp,
    };

    let assets = accounts
        .staking
        .mint(&env, &mut accounts.accounting, shares)?;

    accounts.settle(assets, shares)
}
