use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{constants::*, errors::*, events::*, state::*, token_ops};

/// Burn shares and receive underlying immediately (staking phase only)
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Share owner must sign the burn
/// ✅ 4. PHASE GATING: Staking phase only
/// ✅ 6. MATH SAFETY: Shares burned round up, assets paid round down
/// ✅ 8. BUSINESS LOGIC: Limited by available (non-utilized) liquidity
#[derive(Accounts)]
pub struct Withdraw<'info> {
    pub owner: Signer<'info>,

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

    /// CHECK: PDA that owns the vault token account, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, registry.key().as_ref()],
        bump = registry.vault_authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = owner_share_account.mint == staking.share_mint @ VaultError::InvalidMint,
        constraint = owner_share_account.owner == owner.key() @ VaultError::InvalidTokenAccount,
    )]
    pub owner_share_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = receiver_asset_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
    )]
    pub receiver_asset_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = vault_token_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
        address = crate::token_ops::pool_token_account(&vault_authority.key(), &registry.underlying_mint)
            @ VaultError::InvalidTokenAccount,
    )]
    pub vault_token_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

impl<'info> Withdraw<'info> {
    fn settle(&self, assets: u64, shares: u64) -> Result<()> {
        token_ops::burn(
            self.token_program.to_account_info(),
            self.share_mint.to_account_info(),
            self.owner_share_account.to_account_info(),
            self.owner.to_account_info(),
            &[],
            shares,
        )?;

        let registry_key = self.registry.key();
        let authority_bump = self.registry.vault_authority_bump;
        let authority_seeds: &[&[u8]] = &[
            VAULT_AUTHORITY_SEED,
            registry_key.as_ref(),
            &[authority_bump],
        ];
        token_ops::transfer(
            self.token_program.to_account_info(),
            self.vault_token_account.to_account_info(),
            self.receiver_asset_account.to_account_info(),
            self.vault_authority.to_account_info(),
            &[authority_seeds],
            assets,
        )?;

        emit!(Withdrawn {
            registry: registry_key,
            user: self.owner.key(),
            asset_amount: assets,
            shares_burned: shares,
            total_liquidity: self.accounting.total_liquidity,
            total_shares: self.staking.total_shares,
            timestamp: Clock::get()?.unix_timestamp,
        });
        Ok(())
    }
}

/// Withdraw exactly `assets`, burning the previewed shares
pub fn withdraw_handler(ctx: Context<Withdraw>, assets: u64) -> Result<()> {
    let accounts = ctx.accounts;
    let owner_shares = accounts.owner_share_account.amount;
    let vault_balance = accounts.vault_token_account.amount;
    let env = PoolEnv {
        registry: &accounts.registry,
        lifecycle: &accounts.lifecycle,
        staking_key: accounts.staking.key(),
        now: Clock::get()?.unix_timestamp,
    };

    let shares = accounts.staking.withdraw(
        &env,
        &mut accounts.accounting,
        assets,
        owner_shares,
        vault_balance,
    )?;

    accounts.settle(assets, shares)
}

/// Redeem exactly `shares` for the previewed assets
pub fn redeem_handler(ctx: Context<Withdraw>, shares: u64) -> Result<()> {
    let accounts = ctx.accounts;
    let owner_shares = accounts.owner_share_account.amount;
    let vault_balance = accounts.vault_token_account.amount;
    let env = PoolEnv {
        registry: &accounts.registry,
        lifecycle: &accounts.lifecycle,
        staking_key: accounts.staking.key(),
        now: Clock::get()?.unix_timestamp,
    };

    let assets = accounts.staking.redeem(
        &env,
        &mut accounts.accounting,
        shares,
        owner_shares,
        vault_balance,
    )?;

    accounts.settle(assets, shares)
}
