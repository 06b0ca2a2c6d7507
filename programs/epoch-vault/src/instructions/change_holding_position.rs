use anchor_lang::prelude::*;

use crate::{constants::*, events::*, state::*};

/// Track a position mint the strategy opened or closed for the vault
#[derive(Accounts)]
pub struct ChangeHoldingPosition<'info> {
    pub strategy: Signer<'info>,

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
}

pub fn handler(ctx: Context<ChangeHoldingPosition>, token: Pubkey, is_add: bool) -> Result<()> {
    ctx.accounts.accounting.change_holding_position(
        &ctx.accounts.strategy.key(),
        &ctx.accounts.registry,
        token,
        is_add,
    )?;

    emit!(HoldingPositionChanged {
        registry: ctx.accounts.registry.key(),
        token,
        is_add,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
