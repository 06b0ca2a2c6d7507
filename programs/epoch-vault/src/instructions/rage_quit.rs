use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{constants::*, errors::*, events::*, state::*, token_ops};

/// Emergency exit: burn shares for a pro-rata slice of every pool asset
///
/// `remaining_accounts` holds one `(vault token account, receiver token
/// account)` pair per asset, ordered by mint: the underlying plus every held
/// position, at most `2 * (MAX_POSITIONS + 1)` accounts. Vault accounts must
/// be the vault authority's associated token accounts. Available in every
/// phase.
///
/// The signer is the share owner or an SPL delegate approved for `shares`.
#[derive(Accounts)]
pub struct RageQuit<'info> {
    pub authority: Signer<'info>,

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

    #[account(
        mut,
        constraint = owner_share_account.mint == staking.share_mint @ VaultError::InvalidMint,
    )]
    pub owner_share_account: Box<Account<'info, TokenAccount>>,

    /// CHECK: PDA validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, registry.key().as_ref()],
        bump = registry.vault_authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, RageQuit<'info>>,
    shares: u64,
) -> Result<()> {
    let remaining = ctx.remaining_accounts;
    require!(
        remaining.len() % 2 == 0,
        VaultError::IncompletePositionList
    );

    let vault_authority = ctx.accounts.vault_authority.key();
    let mut tokens = Vec::with_capacity(remaining.len() / 2);
    let mut balances = Vec::with_capacity(remaining.len() / 2);
    for pair in remaining.chunks(2) {
        let vault_account = Account::<TokenAccount>::try_from(&pair[0])?;
        let receiver_account = Account::<TokenAccount>::try_from(&pair[1])?;
        require_keys_eq!(
            pair[0].key(),
            token_ops::pool_token_account(&vault_authority, &vault_account.mint),
            VaultError::InvalidTokenAccount
        );
        require_keys_eq!(
            receiver_account.mint,
            vault_account.mint,
            VaultError::InvalidMint
        );
        tokens.push(vault_account.mint);
        balances.push(vault_account.amount);
    }

    let accounts = ctx.accounts;
    require!(
        token_ops::can_spend(&accounts.owner_share_account, &accounts.authority.key(), shares),
        VaultError::Unauthorized
    );
    let owner_shares = accounts.owner_share_account.amount;
    let env = PoolEnv {
        registry: &accounts.registry,
        lifecycle: &accounts.lifecycle,
        staking_key: accounts.staking.key(),
        now: Clock::get()?.unix_timestamp,
    };

    // EFFECTS: payouts are computed against pre-burn supply
    let liquidity_before = accounts.accounting.total_liquidity;
    let payouts = accounts.staking.rage_quit(
        &env,
        &mut accounts.accounting,
        shares,
        owner_shares,
        &tokens,
        &balances,
    )?;
    let released_liquidity = liquidity_before - accounts.accounting.total_liquidity;

    // INTERACTIONS
    token_ops::burn(
        accounts.token_program.to_account_info(),
        accounts.share_mint.to_account_info(),
        accounts.owner_share_account.to_account_info(),
        accounts.authority.to_account_info(),
        &[],
        shares,
    )?;

    let registry_key = accounts.registry.key();
    let vault_bump = accounts.registry.vault_authority_bump;
    let vault_seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, registry_key.as_ref(), &[vault_bump]];
    for (pair, amount) in remaining.chunks(2).zip(&payouts) {
        token_ops::transfer(
            accounts.token_program.to_account_info(),
            pair[0].clone(),
            pair[1].clone(),
            accounts.vault_authority.to_account_info(),
            &[vault_seeds],
            *amount,
        )?;
    }

    emit!(RageQuitExecuted {
        registry: registry_key,
        owner: accounts.owner_share_account.owner,
        shares_burned: shares,
        released_liquidity,
        tokens,
        amounts: payouts,
        timestamp: env.now,
    });

    Ok(())
}
