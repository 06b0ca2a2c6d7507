use anchor_lang::prelude::*;
use anchor_spl::token::Mint;

use crate::{constants::*, events::*, state::*};

/// Pool configuration supplied once at creation
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct InitializePoolParams {
    /// Start of epoch 0 (unix seconds)
    pub epoch_start: i64,
    pub epoch_length: i64,
    pub staking_phase_length: i64,
    pub trading_phase_length: i64,
    /// Registered strategy signer
    pub strategy: Pubkey,
    /// May be default (unset) and configured later
    pub fee_collector: Pubkey,
}

impl InitializePoolParams {
    pub fn epoch_params(&self) -> EpochParams {
        EpochParams {
            epoch_length: self.epoch_length,
            staking_phase_length: self.staking_phase_length,
            trading_phase_length: self.trading_phase_length,
        }
    }
}

/// Create the registry, epoch clock and accounting state for a new pool
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Authority must sign and becomes pool owner
/// ✅ 2. ACCOUNT OWNERSHIP: Every state account is a PDA of this program
/// ✅ 3. INIT ONCE: `init` plus the per-account initialized flag
/// ✅ 10. EVENTS: Emits PoolInitialized and RegistryAddressesSet
#[derive(Accounts)]
pub struct InitializePool<'info> {
    /// Pool owner
    #[account(mut)]
    pub authority: Signer<'info>,

    /// Underlying (margin) token of the pool
    pub underlying_mint: Box<Account<'info, Mint>>,

    #[account(
        init,
        payer = authority,
        space = REGISTRY_SIZE,
        seeds = [REGISTRY_SEED, underlying_mint.key().as_ref()],
        bump
    )]
    pub registry: Box<Account<'info, Registry>>,

    #[account(
        init,
        payer = authority,
        space = LIFECYCLE_SIZE,
        seeds = [LIFECYCLE_SEED, registry.key().as_ref()],
        bump
    )]
    pub lifecycle: Box<Account<'info, Lifecycle>>,

    #[account(
        init,
        payer = authority,
        space = ACCOUNTING_SIZE,
        seeds = [ACCOUNTING_SEED, registry.key().as_ref()],
        bump
    )]
    pub accounting: Box<Account<'info, Accounting>>,

    /// CHECK: PDA that owns pool liquidity, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, registry.key().as_ref()],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// CHECK: PDA that owns scheduled flows in escrow, validated by seeds
    #[account(
        seeds = [ESCROW_AUTHORITY_SEED, registry.key().as_ref()],
        bump
    )]
    pub escrow_authority: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<InitializePool>, params: InitializePoolParams) -> Result<()> {
    // CHECKS
    let epoch_params = params.epoch_params();
    epoch_params.validate()?;

    let authority = ctx.accounts.authority.key();
    let registry_key = ctx.accounts.registry.key();
    let underlying_mint = ctx.accounts.underlying_mint.key();

    // The staking account is created by `initialize_vault_accounts`, its
    // address is already fixed by its seeds.
    let (staking, _) =
        Pubkey::find_program_address(&[STAKING_SEED, registry_key.as_ref()], ctx.program_id);
    let addresses = RegistryAddresses {
        accounting: ctx.accounts.accounting.key(),
        lifecycle: ctx.accounts.lifecycle.key(),
        staking,
        strategy: params.strategy,
    };

    // EFFECTS
    let registry = &mut ctx.accounts.registry;
    registry.init(
        authority,
        underlying_mint,
        ctx.accounts.vault_authority.key(),
        [
            ctx.bumps.registry,
            ctx.bumps.vault_authority,
            ctx.bumps.escrow_authority,
        ],
    )?;
    registry.set_registry_addresses(&authority, addresses)?;

    ctx.accounts.lifecycle.init(
        registry_key,
        params.epoch_start,
        epoch_params,
        ctx.bumps.lifecycle,
    )?;

    ctx.accounts.accounting.init(
        registry_key,
        underlying_mint,
        params.fee_collector,
        ctx.bumps.accounting,
    )?;

    let timestamp = Clock::get()?.unix_timestamp;
    emit!(PoolInitialized {
        registry: registry_key,
        authority,
        underlying_mint,
        epoch_start: params.epoch_start,
        epoch_length: params.epoch_length,
        timestamp,
    });
    emit!(RegistryAddressesSet {
        registry: registry_key,
        addresses,
        timestamp,
    });

    Ok(())
}
