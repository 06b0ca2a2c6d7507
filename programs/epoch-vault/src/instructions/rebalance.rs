use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::{constants::*, errors::*, events::*, state::*, token_ops};

/// Close the current epoch
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Caller must be an enabled strategy
/// ✅ 2. ACCOUNT OWNERSHIP: Share price PDA is created once per epoch (`init`)
/// ✅ 4. PHASE GATING: Only once the current epoch has ended
/// ✅ 8. BUSINESS LOGIC: All counters settle before any token movement
/// ✅ 10. EVENTS: Emits Rebalanced event
#[derive(Accounts)]
pub struct Rebalance<'info> {
    /// Enabled strategy; pays for the share price snapshot
    #[account(mut)]
    pub strategy: Signer<'info>,

    #[account(
        seeds = [REGISTRY_SEED, registry.underlying_mint.as_ref()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        mut,
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

    /// Snapshot for the epoch being closed
    #[account(
        init,
        payer = strategy,
        space = EPOCH_SHARE_PRICE_SIZE,
        seeds = [
            SHARE_PRICE_SEED,
            staking.key().as_ref(),
            &lifecycle.epoch_id.to_le_bytes(),
        ],
        bump
    )]
    pub share_price: Box<Account<'info, EpochSharePrice>>,

    #[account(
        mut,
        address = staking.share_mint @ VaultError::InvalidMint,
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

    #[account(
        mut,
        constraint = vault_token_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
        address = crate::token_ops::pool_token_account(&vault_authority.key(), &registry.underlying_mint)
            @ VaultError::InvalidTokenAccount,
    )]
    pub vault_token_account: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = escrow_token_account.mint == registry.underlying_mint @ VaultError::InvalidMint,
        address = crate::token_ops::pool_token_account(&escrow_authority.key(), &registry.underlying_mint)
            @ VaultError::InvalidTokenAccount,
    )]
    pub escrow_token_account: Box<Account<'info, TokenAccount>>,

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

pub fn handler(ctx: Context<Rebalance>) -> Result<()> {
    let accounts = ctx.accounts;
    let now = Clock::get()?.unix_timestamp;
    let request = RebalanceRequest {
        caller: accounts.strategy.key(),
        accounting_key: accounts.accounting.key(),
        vault_balance: accounts.vault_token_account.amount,
        now,
    };

    // CHECKS + EFFECTS: computed in full before anything is written
    let outcome = accounts.accounting.rebalance(
        &accounts.registry,
        &mut accounts.lifecycle,
        &mut accounts.staking,
        &request,
    )?;
    let settlement = outcome.settlement;

    let share_price = &mut accounts.share_price;
    share_price.staking = accounts.staking.key();
    share_price.epoch_id = outcome.closed_epoch;
    share_price.share_price = settlement.share_price;
    share_price.bump = ctx.bumps.share_price;

    // INTERACTIONS
    let registry_key = accounts.registry.key();
    let vault_bump = accounts.registry.vault_authority_bump;
    let escrow_bump = accounts.registry.escrow_authority_bump;
    let vault_seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, registry_key.as_ref(), &[vault_bump]];
    let escrow_seeds: &[&[u8]] = &[ESCROW_AUTHORITY_SEED, registry_key.as_ref(), &[escrow_bump]];
    let token_program = accounts.token_program.to_account_info();

    // Scheduled deposits join pool liquidity
    token_ops::transfer(
        token_program.clone(),
        accounts.escrow_token_account.to_account_info(),
        accounts.vault_token_account.to_account_info(),
        accounts.escrow_authority.to_account_info(),
        &[escrow_seeds],
        settlement.deposited_assets,
    )?;

    // Their shares wait in escrow until claimed
    token_ops::mint_to(
        token_program.clone(),
        accounts.share_mint.to_account_info(),
        accounts.share_escrow_account.to_account_info(),
        accounts.vault_authority.to_account_info(),
        &[vault_seeds],
        settlement.minted_shares,
    )?;

    // Scheduled withdrawals leave the supply
    token_ops::burn(
        token_program.clone(),
        accounts.share_mint.to_account_info(),
        accounts.share_escrow_account.to_account_info(),
        accounts.escrow_authority.to_account_info(),
        &[escrow_seeds],
        settlement.burned_shares,
    )?;

    // and their assets are set aside for claims
    token_ops::transfer(
        token_program,
        accounts.vault_token_account.to_account_info(),
        accounts.escrow_token_account.to_account_info(),
        accounts.vault_authority.to_account_info(),
        &[vault_seeds],
        settlement.reserved_assets,
    )?;

    msg!(
        "Rebalanced epoch {}: profit {} loss {} fees {}",
        outcome.closed_epoch,
        outcome.profit,
        outcome.loss,
        outcome.profit_fee + outcome.maintenance_fee
    );

    emit!(Rebalanced {
        registry: registry_key,
        closed_epoch: outcome.closed_epoch,
        share_price: settlement.share_price,
        profit: outcome.profit,
        loss: outcome.loss,
        profit_fee: outcome.profit_fee,
        maintenance_fee: outcome.maintenance_fee,
        minted_shares: settlement.minted_shares,
        burned_shares: settlement.burned_shares,
        reserved_assets: settlement.reserved_assets,
        refunded_assets: settlement.refunded_assets,
        total_liquidity: accounts.accounting.total_liquidity,
        timestamp: now,
    });

    Ok(())
}
