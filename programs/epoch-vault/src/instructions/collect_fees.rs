use anchor_lang::prelude::*;
use anchor_spl::token::{Token, TokenAccount};

use crate::{constants::*, errors::*, events::*, state::*, token_ops};

/// Pay accumulated fees out of the vault to the fee collector
///
/// Security considerations:
/// - Fee collector only; fails while the collector is unset
/// - Fees are zeroed before the transfer
#[derive(Accounts)]
pub struct CollectFees<'info> {
    pub fee_collector: Signer<'info>,

    #[account(
        seeds = [REGISTRY_SEED, registry.underlying_mint.as_ref()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        mut,
        seeds = [ACCOUNTING_SEED, registry.key().as_ref()],
        bump = accounting.bump,
    )]
    pub accounting: Box<Account<'info, Accounting>>,

    /// CHECK: PDA validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, registry.key().as_ref()],
        bump = registry.vault_authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    #[account(
        mut,
        constraint = vault_token_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
        address = crate::token_ops::pool_token_account(&vault_authority.key(), &registry.underlying_mint)
            @ VaultError::InvalidTokenAccount,
    )]
    pub vault_token_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = fee_collector_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
    )]
    pub fee_collector_account: Box<Account<'info, TokenAccount>>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<CollectFees>) -> Result<()> {
    let accounts = ctx.accounts;
    let fee_collector = accounts.fee_collector.key();

    // CHECKS + EFFECTS
    let amount = accounts.accounting.collect_fees(&fee_collector)?;

    // INTERACTIONS
    let registry_key = accounts.registry.key();
    let vault_bump = accounts.registry.vault_authority_bump;
    let vault_seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, registry_key.as_ref(), &[vault_bump]];
    token_ops::transfer(
        accounts.token_program.to_account_info(),
        accounts.vault_token_account.to_account_info(),
        accounts.fee_collector_account.to_account_info(),
        accounts.vault_authority.to_account_info(),
        &[vault_seeds],
        amount,
    )?;

    emit!(FeesCollected {
        registry: registry_key,
        fee_collector,
        amount,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
