use anchor_lang::prelude::*;

use crate::{
    constants::BASE,
    errors::VaultError,
    math::{checked_add, checked_sub, mul_div, to_u64, Rounding},
    state::{Accounting, EpochSharePrice, Lifecycle, Registry, StakerSchedule},
};

/// Share ledger of the pool
///
/// `total_shares` mirrors the share mint supply, escrowed shares included.
/// Scheduled totals are sums for the current epoch only and are folded in
/// by rebalance.
#[account]
pub struct Staking {
    pub registry: Pubkey,

    pub share_mint: Pubkey,

    pub total_shares: u64,

    pub total_scheduled_deposits: u64,

    pub total_scheduled_withdrawals: u64,

    pub initialized: bool,

    pub bump: u8,

    pub _reserved: [u8; 64],
}

/// Read-only pool context shared by the staking operations
#[derive(Clone, Copy)]
pub struct PoolEnv<'a> {
    pub registry: &'a Registry,
    pub lifecycle: &'a Lifecycle,
    /// Address of the staking account, as wired in the registry
    pub staking_key: Pubkey,
    pub now: i64,
}

/// Aggregate scheduled flows of one epoch priced at its snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EpochSettlement {
    pub share_price: u128,
    /// Escrowed assets moving into the vault
    pub deposited_assets: u64,
    /// Shares minted into the share escrow
    pub minted_shares: u64,
    /// Escrowed shares burned
    pub burned_shares: u64,
    /// Assets moving from the vault to the asset escrow
    pub reserved_assets: u64,
    /// Escrowed assets of an insolvent epoch, left for their depositors
    pub refunded_assets: u64,
    pub next_total_shares: u64,
}

impl Staking {
    pub fn init(&mut self, registry: Pubkey, share_mint: Pubkey, bump: u8) -> Result<()> {
        require!(!self.initialized, VaultError::AlreadyInitialized);

        self.registry = registry;
        self.share_mint = share_mint;
        self.total_shares = 0;
        self.total_scheduled_deposits = 0;
        self.total_scheduled_withdrawals = 0;
        self.bump = bump;
        self._reserved = [0; 64];
        self.initialized = true;
        Ok(())
    }

    /// BASE-scaled shares per asset; BASE for an empty pool and zero for an
    /// insolvent one
    pub fn share_price(total_shares: u64, total_liquidity: u64) -> Result<u128> {
        if total_shares == 0 {
            return Ok(BASE);
        }
        if total_liquidity == 0 {
            return Ok(0);
        }
        mul_div(
            total_shares as u128,
            BASE,
            total_liquidity as u128,
            Rounding::Down,
        )
    }

    /// Outstanding shares are backed by nothing
    pub fn is_insolvent(&self, total_liquidity: u64) -> bool {
        self.total_shares > 0 && total_liquidity == 0
    }

    fn to_shares(&self, assets: u64, total_liquidity: u64, rounding: Rounding) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(assets);
        }
        require!(
            !self.is_insolvent(total_liquidity),
            VaultError::PoolInsolvent
        );
        to_u64(mul_div(
            assets as u128,
            self.total_shares as u128,
            total_liquidity as u128,
            rounding,
        )?)
    }

    fn to_assets(&self, shares: u64, total_liquidity: u64, rounding: Rounding) -> Result<u64> {
        if self.total_shares == 0 {
            return Ok(shares);
        }
        to_u64(mul_div(
            shares as u128,
            total_liquidity as u128,
            self.total_shares as u128,
            rounding,
        )?)
    }

    pub fn convert_to_shares(&self, assets: u64, total_liquidity: u64) -> Result<u64> {
        self.to_shares(assets, total_liquidity, Rounding::Down)
    }

    pub fn convert_to_assets(&self, shares: u64, total_liquidity: u64) -> Result<u64> {
        self.to_assets(shares, total_liquidity, Rounding::Down)
    }

    pub fn preview_deposit(&self, assets: u64, total_liquidity: u64) -> Result<u64> {
        self.to_shares(assets, total_liquidity, Rounding::Down)
    }

    pub fn preview_mint(&self, shares: u64, total_liquidity: u64) -> Result<u64> {
        self.to_assets(shares, total_liquidity, Rounding::Up)
    }

    pub fn preview_withdraw(&self, assets: u64, total_liquidity: u64) -> Result<u64> {
        self.to_shares(assets, total_liquidity, Rounding::Up)
    }

    pub fn preview_redeem(&self, shares: u64, total_liquidity: u64) -> Result<u64> {
        self.to_assets(shares, total_liquidity, Rounding::Down)
    }

    pub fn max_deposit(&self) -> u64 {
        u64::MAX
    }

    pub fn max_mint(&self) -> u64 {
        u64::MAX
    }

    pub fn max_withdraw(&self, owner_shares: u64, total_liquidity: u64) -> Result<u64> {
        self.convert_to_assets(owner_shares, total_liquidity)
    }

    pub fn max_redeem(&self, owner_shares: u64) -> u64 {
        owner_shares
    }

    /// Returns the shares to mint for `assets`
    pub fn deposit(
        &mut self,
        env: &PoolEnv,
        accounting: &mut Accounting,
        assets: u64,
    ) -> Result<u64> {
        require!(
            env.lifecycle.can_deposit(env.now),
            VaultError::DepositNotAllowed
        );
        let shares = self.preview_deposit(assets, accounting.total_liquidity)?;
        self.record_deposit(env, accounting, assets, shares)?;
        Ok(shares)
    }

    /// Returns the assets to pull for `shares`
    pub fn mint(
        &mut self,
        env: &PoolEnv,
        accounting: &mut Accounting,
        shares: u64,
    ) -> Result<u64> {
        require!(
            env.lifecycle.can_deposit(env.now),
            VaultError::DepositNotAllowed
        );
        let assets = self.preview_mint(shares, accounting.total_liquidity)?;
        self.record_deposit(env, accounting, assets, shares)?;
        Ok(assets)
    }

    fn record_deposit(
        &mut self,
        env: &PoolEnv,
        accounting: &mut Accounting,
        assets: u64,
        shares: u64,
    ) -> Result<()> {
        require!(
            !self.is_insolvent(accounting.total_liquidity),
            VaultError::PoolInsolvent
        );
        let total_shares = checked_add(self.total_shares, shares)?;
        accounting.change_total_liquidity(&env.staking_key, env.registry, assets, true)?;
        self.total_shares = total_shares;
        Ok(())
    }

    /// Returns the shares to burn for `assets`
    pub fn withdraw(
        &mut self,
        env: &PoolEnv,
        accounting: &mut Accounting,
        assets: u64,
        owner_shares: u64,
        vault_balance: u64,
    ) -> Result<u64> {
        require!(
            env.lifecycle.can_withdraw(env.now),
            VaultError::WithdrawalNotAllowed
        );
        let shares = self.preview_withdraw(assets, accounting.total_liquidity)?;
        self.record_withdrawal(env, accounting, assets, shares, owner_shares, vault_balance)?;
        Ok(shares)
    }

    /// Returns the assets to pay out for `shares`
    pub fn redeem(
        &mut self,
        env: &PoolEnv,
        accounting: &mut Accounting,
        shares: u64,
        owner_shares: u64,
        vault_balance: u64,
    ) -> Result<u64> {
        require!(
            env.lifecycle.can_withdraw(env.now),
            VaultError::WithdrawalNotAllowed
        );
        let assets = self.preview_redeem(shares, accounting.total_liquidity)?;
        self.record_withdrawal(env, accounting, assets, shares, owner_shares, vault_balance)?;
        Ok(assets)
    }

    fn record_withdrawal(
        &mut self,
        env: &PoolEnv,
        accounting: &mut Accounting,
        assets: u64,
        shares: u64,
        owner_shares: u64,
        vault_balance: u64,
    ) -> Result<()> {
        require!(shares <= owner_shares, VaultError::InsufficientShares);
        require!(
            assets <= accounting.available_liquidity(vault_balance),
            VaultError::InsufficientLiquidity
        );
        let total_shares = checked_sub(self.total_shares, shares)?;
        accounting.change_total_liquidity(&env.staking_key, env.registry, assets, false)?;
        self.total_shares = total_shares;
        Ok(())
    }

    /// Queues `assets` for `schedule`'s owner; false when nothing changed
    pub fn schedule_deposit(
        &mut self,
        env: &PoolEnv,
        schedule: &mut StakerSchedule,
        price: Option<&EpochSharePrice>,
        assets: u64,
    ) -> Result<bool> {
        require!(
            env.lifecycle.can_schedule(env.now),
            VaultError::SchedulingNotAllowed
        );
        if assets == 0 {
            return Ok(false);
        }
        let epoch = env.lifecycle.epoch_id;
        let mut next = schedule.clone();
        next.settle(epoch, price)?;
        next.deposit.schedule(assets, epoch, price)?;
        let total = checked_add(self.total_scheduled_deposits, assets)?;

        *schedule = next;
        self.total_scheduled_deposits = total;
        Ok(true)
    }

    pub fn unschedule_deposit(
        &mut self,
        env: &PoolEnv,
        schedule: &mut StakerSchedule,
        price: Option<&EpochSharePrice>,
        assets: u64,
    ) -> Result<bool> {
        require!(
            env.lifecycle.can_schedule(env.now),
            VaultError::SchedulingNotAllowed
        );
        if assets == 0 {
            return Ok(false);
        }
        let epoch = env.lifecycle.epoch_id;
        let mut next = schedule.clone();
        next.settle(epoch, price)?;
        next.deposit.unschedule(assets, epoch, price)?;
        let total = checked_sub(self.total_scheduled_deposits, assets)?;

        *schedule = next;
        self.total_scheduled_deposits = total;
        Ok(true)
    }

    /// Returns the settled shares to release from the share escrow
    pub fn claim_scheduled_shares(
        &self,
        env: &PoolEnv,
        schedule: &mut StakerSchedule,
        price: Option<&EpochSharePrice>,
        shares: u64,
        claim_all: bool,
    ) -> Result<u64> {
        if !claim_all && shares == 0 {
            return Ok(0);
        }
        let epoch = env.lifecycle.epoch_id;
        let mut next = schedule.clone();
        next.settle(epoch, price)?;
        let claimed = next.deposit.claim(shares, claim_all, epoch, price)?;

        *schedule = next;
        Ok(claimed)
    }

    /// Queues `shares` of the caller for redemption at the epoch boundary
    pub fn schedule_withdrawal(
        &mut self,
        env: &PoolEnv,
        schedule: &mut StakerSchedule,
        price: Option<&EpochSharePrice>,
        shares: u64,
        owner_shares: u64,
    ) -> Result<bool> {
        require!(
            env.lifecycle.can_schedule(env.now),
            VaultError::SchedulingNotAllowed
        );
        if shares == 0 {
            return Ok(false);
        }
        require!(shares <= owner_shares, VaultError::InsufficientShares);
        let epoch = env.lifecycle.epoch_id;
        let mut next = schedule.clone();
        next.settle(epoch, price)?;
        next.withdrawal.schedule(shares, epoch, price)?;
        let total = checked_add(self.total_scheduled_withdrawals, shares)?;

        *schedule = next;
        self.total_scheduled_withdrawals = total;
        Ok(true)
    }

    pub fn unschedule_withdrawal(
        &mut self,
        env: &PoolEnv,
        schedule: &mut StakerSchedule,
        price: Option<&EpochSharePrice>,
        shares: u64,
    ) -> Result<bool> {
        require!(
            env.lifecycle.can_schedule(env.now),
            VaultError::SchedulingNotAllowed
        );
        if shares == 0 {
            return Ok(false);
        }
        let epoch = env.lifecycle.epoch_id;
        let mut next = schedule.clone();
        next.settle(epoch, price)?;
        next.withdrawal.unschedule(shares, epoch, price)?;
        let total = checked_sub(self.total_scheduled_withdrawals, shares)?;

        *schedule = next;
        self.total_scheduled_withdrawals = total;
        Ok(true)
    }

    /// Returns the settled assets to release from the asset escrow
    pub fn claim_scheduled_assets(
        &self,
        env: &PoolEnv,
        schedule: &mut StakerSchedule,
        price: Option<&EpochSharePrice>,
        assets: u64,
        claim_all: bool,
    ) -> Result<u64> {
        if !claim_all && assets == 0 {
            return Ok(0);
        }
        let epoch = env.lifecycle.epoch_id;
        let mut next = schedule.clone();
        next.settle(epoch, price)?;
        let claimed = next.withdrawal.claim(assets, claim_all, epoch, price)?;

        *schedule = next;
        Ok(claimed)
    }

    /// Claimable shares of a record without writing it
    pub fn scheduled_shares_of(
        &self,
        schedule: &StakerSchedule,
        current_epoch: u64,
        price: Option<&EpochSharePrice>,
    ) -> Result<u64> {
        Ok(schedule
            .settled(current_epoch, price)?
            .deposit
            .scheduled_shares)
    }

    /// Claimable assets of a record without writing it
    pub fn scheduled_assets_of(
        &self,
        schedule: &StakerSchedule,
        current_epoch: u64,
        price: Option<&EpochSharePrice>,
    ) -> Result<u64> {
        Ok(schedule
            .settled(current_epoch, price)?
            .withdrawal
            .scheduled_assets)
    }

    /// Prices the current epoch's scheduled flows
    pub fn plan_settlement(&self, share_price: u128) -> Result<EpochSettlement> {
        let burned_shares = self.total_scheduled_withdrawals;

        // Insolvent epoch: queued shares burn for nothing and queued assets
        // stay in escrow for their depositors
        if share_price == 0 {
            return Ok(EpochSettlement {
                share_price,
                burned_shares,
                refunded_assets: self.total_scheduled_deposits,
                next_total_shares: checked_sub(self.total_shares, burned_shares)?,
                ..Default::default()
            });
        }
        let deposited_assets = self.total_scheduled_deposits;

        let minted_shares = to_u64(mul_div(
            deposited_assets as u128,
            share_price,
            BASE,
            Rounding::Down,
        )?)?;
        let reserved_assets = to_u64(mul_div(
            burned_shares as u128,
            BASE,
            share_price,
            Rounding::Down,
        )?)?;
        let next_total_shares =
            checked_sub(checked_add(self.total_shares, minted_shares)?, burned_shares)?;

        Ok(EpochSettlement {
            share_price,
            deposited_assets,
            minted_shares,
            burned_shares,
            reserved_assets,
            refunded_assets: 0,
            next_total_shares,
        })
    }

    pub fn apply_settlement(&mut self, settlement: &EpochSettlement) {
        self.total_shares = settlement.next_total_shares;
        self.total_scheduled_deposits = 0;
        self.total_scheduled_withdrawals = 0;
    }

    /// Emergency pro-rata exit, available in every phase.
    ///
    /// `tokens` and `balances` are parallel: the underlying mint and every
    /// held position, strictly ascending, with the vault's balance of each.
    /// Returns the payout per token.
    pub fn rage_quit(
        &mut self,
        env: &PoolEnv,
        accounting: &mut Accounting,
        shares: u64,
        owner_shares: u64,
        tokens: &[Pubkey],
        balances: &[u64],
    ) -> Result<Vec<u64>> {
        accounting.validate_position_list(tokens)?;
        require!(
            tokens.len() == balances.len(),
            VaultError::IncompletePositionList
        );
        require!(shares <= owner_shares, VaultError::InsufficientShares);
        require!(shares <= self.total_shares, VaultError::InsufficientShares);
        if shares == 0 {
            return Ok(vec![0; tokens.len()]);
        }

        let payouts = tokens
            .iter()
            .zip(balances)
            .map(|(token, balance)| {
                let owned = if *token == accounting.underlying_mint {
                    accounting.net_vault_balance(*balance)
                } else {
                    *balance
                };
                to_u64(mul_div(
                    owned as u128,
                    shares as u128,
                    self.total_shares as u128,
                    Rounding::Down,
                )?)
            })
            .collect::<Result<Vec<u64>>>()?;

        let released = self
            .convert_to_assets(shares, accounting.total_liquidity)?
            .min(accounting.total_liquidity);
        let total_shares = checked_sub(self.total_shares, shares)?;
        accounting.change_total_liquidity(&env.staking_key, env.registry, released, false)?;
        self.total_shares = total_shares;

        Ok(payouts)
    }
}
