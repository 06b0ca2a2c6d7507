use anchor_lang::prelude::*;

use crate::{constants::*, events::*, state::*};

/// Update epoch and phase lengths; applies from the current epoch on
#[derive(Accounts)]
pub struct SetEpochParams<'info> {
    pub authority: Signer<'info>,

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
}

pub fn handler(ctx: Context<SetEpochParams>, params: EpochParams) -> Result<()> {
    ctx.accounts.lifecycle.set_epoch_params(
        &ctx.accounts.authority.key(),
        &ctx.accounts.registry,
        params,
    )?;

    emit!(ConfigUpdated {
        registry: ctx.accounts.registry.key(),
        field: "epoch_length".to_string(),
        value: params.epoch_length as u64,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
