use anchor_lang::prelude::*;

use crate::{constants::*, events::*, state::*};

/// Owner-controlled fee configuration
#[derive(Accounts)]
pub struct ConfigureFees<'info> {
    pub authority: Signer<'info>,

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

fn emit_update(registry: Pubkey, field: &str, value: u64) -> Result<()> {
    emit!(ConfigUpdated {
        registry,
        field: field.to_string(),
        value,
        timestamp: Clock::get()?.unix_timestamp,
    });
    Ok(())
}

pub fn set_fee_collector_handler(ctx: Context<ConfigureFees>, fee_collector: Pubkey) -> Result<()> {
    let caller = ctx.accounts.authority.key();
    ctx.accounts
        .accounting
        .set_fee_collector(&caller, &ctx.accounts.registry, fee_collector)?;
    msg!("Fee collector set to {}", fee_collector);
    emit_update(ctx.accounts.registry.key(), "fee_collector", 0)
}

pub fn set_immediate_profit_fee_handler(ctx: Context<ConfigureFees>, fee: u64) -> Result<()> {
    let caller = ctx.accounts.authority.key();
    ctx.accounts
        .accounting
        .set_immediate_profit_fee(&caller, &ctx.accounts.registry, fee)?;
    emit_update(ctx.accounts.registry.key(), "immediate_profit_fee", fee)
}

pub fn set_annual_maintenance_fee_handler(ctx: Context<ConfigureFees>, fee: u64) -> Result<()> {
    let caller = ctx.accounts.authority.key();
    ctx.accounts
        .accounting
        .set_annual_maintenance_fee(&caller, &ctx.accounts.registry, fee)?;
    emit_update(ctx.accounts.registry.key(), "annual_maintenance_fee", fee)
}
