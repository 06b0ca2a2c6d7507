use anchor_lang::prelude::*;

use crate::{constants::*, events::*, state::*};

/// Enable or disable an additional strategy
///
/// Security considerations:
/// - Owner only (checked against registry state)
/// - The registered strategy cannot be disabled here; rewire the registry instead
#[derive(Accounts)]
pub struct ManageStrategy<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED, registry.underlying_mint.as_ref()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, Registry>>,
}

pub fn handler(ctx: Context<ManageStrategy>, strategy: Pubkey, enabled: bool) -> Result<()> {
    let caller = ctx.accounts.authority.key();
    let registry = &mut ctx.accounts.registry;

    if enabled {
        registry.enable_strategy(&caller, strategy)?;
    } else {
        registry.disable_strategy(&caller, &strategy)?;
    }

    emit!(StrategyToggled {
        registry: registry.key(),
        strategy,
        enabled,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
