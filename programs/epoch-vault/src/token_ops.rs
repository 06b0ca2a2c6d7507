// SPL token CPIs shared by the instruction handlers.
// Zero amounts are skipped.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::{
    associated_token::get_associated_token_address,
    token::{self, spl_token, Burn, MintTo, Transfer},
};

/// The associated token account of `authority` for `mint`. Pool-owned
/// vault and escrow accounts are only ever accepted at this address.
pub fn pool_token_account(authority: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(authority, mint)
}

/// True when `authority` may move `amount` out of `account`, as its owner
/// or as an approved SPL delegate.
pub fn can_spend(account: &spl_token::state::Account, authority: &Pubkey, amount: u64) -> bool {
    if account.owner == *authority {
        return true;
    }
    account.delegate == COption::Some(*authority) && account.delegated_amount >= amount
}

pub fn transfer<'info>(
    token_program: AccountInfo<'info>,
    from: AccountInfo<'info>,
    to: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let cpi_ctx = CpiContext::new_with_signer(
        token_program,
        Transfer {
            from,
            to,
            authority,
        },
        signer_seeds,
    );
    token::transfer(cpi_ctx, amount)
}

pub fn mint_to<'info>(
    token_program: AccountInfo<'info>,
    mint: AccountInfo<'info>,
    to: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let cpi_ctx = CpiContext::new_with_signer(
        token_program,
        MintTo {
            mint,
            to,
            authority,
        },
        signer_seeds,
    );
    token::mint_to(cpi_ctx, amount)
}

pub fn burn<'info>(
    token_program: AccountInfo<'info>,
    mint: AccountInfo<'info>,
    from: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    signer_seeds: &[&[&[u8]]],
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let cpi_ctx = CpiContext::new_with_signer(
        token_program,
        Burn {
            mint,
            from,
            authority,
        },
        signer_seeds,
    );
    token::burn(cpi_ctx, amount)
}
