use anchor_lang::prelude::*;

use crate::{constants::*, events::*, state::*};

/// Rewire the pool to a new set of module addresses
///
/// All four addresses are replaced together or not at all.
#[derive(Accounts)]
pub struct SetRegistryAddresses<'info> {
    pub authority: Signer<'info>,

    #[account(
        mut,
        seeds = [REGISTRY_SEED, registry.underlying_mint.as_ref()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, Registry>>,
}

pub fn handler(ctx: Context<SetRegistryAddresses>, addresses: RegistryAddresses) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.set_registry_addresses(&ctx.accounts.authority.key(), addresses)?;

    emit!(RegistryAddressesSet {
        registry: registry.key(),
        addresses,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
