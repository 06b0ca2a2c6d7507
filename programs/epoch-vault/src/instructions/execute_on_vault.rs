use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    instruction::{AccountMeta, Instruction},
    program::invoke_signed,
};

use crate::{constants::*, errors::*, events::*, state::*};

/// Invoke an arbitrary program with the vault authority as signer
///
/// The strategy uses this to open and close positions with pool liquidity.
/// `remaining_accounts` become the target instruction's accounts, in order.
#[derive(Accounts)]
pub struct ExecuteOnVault<'info> {
    /// Owner or an enabled strategy
    pub caller: Signer<'info>,

    #[account(
        seeds = [REGISTRY_SEED, registry.underlying_mint.as_ref()],
        bump = registry.bump,
    )]
    pub registry: Box<Account<'info, Registry>>,

    /// CHECK: PDA validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, registry.key().as_ref()],
        bump = registry.vault_authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// CHECK: any executable program other than this one
    #[account(
        executable,
        constraint = target_program.key() != crate::ID @ VaultError::InvalidTargetProgram,
    )]
    pub target_program: UncheckedAccount<'info>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, 'info, 'info, ExecuteOnVault<'info>>,
    data: Vec<u8>,
) -> Result<()> {
    let caller = ctx.accounts.caller.key();
    ctx.accounts.registry.only_vault_executor(&caller)?;

    let vault_authority = ctx.accounts.vault_authority.key();
    let metas = ctx
        .remaining_accounts
        .iter()
        .map(|account| AccountMeta {
            pubkey: account.key(),
            is_signer: account.is_signer || account.key() == vault_authority,
            is_writable: account.is_writable,
        })
        .collect();
    let target_program = ctx.accounts.target_program.key();
    let instruction = Instruction {
        program_id: target_program,
        accounts: metas,
        data,
    };

    let mut infos = ctx.remaining_accounts.to_vec();
    infos.push(ctx.accounts.vault_authority.to_account_info());
    infos.push(ctx.accounts.target_program.to_account_info());

    let registry_key = ctx.accounts.registry.key();
    let vault_bump = ctx.accounts.registry.vault_authority_bump;
    let vault_seeds: &[&[u8]] = &[VAULT_AUTHORITY_SEED, registry_key.as_ref(), &[vault_bump]];
    invoke_signed(&instruction, &infos, &[vault_seeds])?;

    msg!("Vault call to {} by {}", target_program, caller);
    emit!(VaultCallExecuted {
        registry: registry_key,
        caller,
        target_program,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
