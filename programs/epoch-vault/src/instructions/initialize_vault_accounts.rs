use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{constants::*, errors::*, events::*, state::*};

/// Second construction step: share ledger, share mint and pool token accounts
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Only the pool owner (has_one)
/// ✅ 2. ACCOUNT OWNERSHIP: Staking and share mint are PDAs of the registry
/// ✅ 5. AUTHORITIES: Share mint authority and token account owners are PDAs
#[derive(Accounts)]
pub struct InitializeVaultAccounts<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        seeds = [REGISTRY_SEED, registry.underlying_mint.as_ref()],
        bump = registry.bump,
        has_one = authority @ VaultError::Unauthorized,
        has_one = underlying_mint @ VaultError::InvalidMint,
    )]
    pub registry: Box<Account<'info, Registry>>,

    pub underlying_mint: Box<Account<'info, Mint>>,

    #[account(
        init,
        payer = authority,
        space = STAKING_SIZE,
        seeds = [STAKING_SEED, registry.key().as_ref()],
        bump
    )]
    pub staking: Box<Account<'info, Staking>>,

    /// Share mint, same decimals as the underlying
    #[account(
        init,
        payer = authority,
        seeds = [SHARE_MINT_SEED, registry.key().as_ref()],
        bump,
        mint::decimals = underlying_mint.decimals,
        mint::authority = vault_authority,
    )]
    pub share_mint: Box<Account<'info, Mint>>,

    /// CHECK: PDA validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, registry.key().as_ref()],
        bump = registry.vault_authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// CHECK: PDA validated by seeds
    #[account(
        seeds = [ESCROW_AUTHORITY_SEED, registry.key().as_ref()],
        bump = registry.escrow_authority_bump,
    )]
    pub escrow_authority: UncheckedAccount<'info>,

    /// Pool liquidity
    #[account(
        init,
        payer = authority,
        associated_token::mint = underlying_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_token_account: Box<Account<'info, TokenAccount>>,

    /// Scheduled deposits and reserved withdrawal assets
    #[account(
        init,
        payer = authority,
        associated_token::mint = underlying_mint,
        associated_token::authority = escrow_authority,
    )]
    pub escrow_token_account: Box<Account<'info, TokenAccount>>,

    /// Scheduled withdrawal shares and settled deposit shares
    #[account(
        init,
        payer = authority,
        associated_token::mint = share_mint,
        associated_token::authority = escrow_authority,
    )]
    pub share_escrow_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializeVaultAccounts>) -> Result<()> {
    let registry_key = ctx.accounts.registry.key();
    let staking_key = ctx.accounts.staking.key();

    // CHECKS: the registry was wired to this staking account at creation
    require_keys_eq!(
        ctx.accounts.registry.addresses.staking,
        staking_key,
        VaultError::NotStakingModule
    );

    // EFFECTS
    ctx.accounts.staking.init(
        registry_key,
        ctx.accounts.share_mint.key(),
        ctx.bumps.staking,
    )?;

    emit!(VaultAccountsInitialized {
        registry: registry_key,
        staking: staking_key,
        share_mint: ctx.accounts.share_mint.key(),
        vault_token_account: ctx.accounts.vault_token_account.key(),
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
