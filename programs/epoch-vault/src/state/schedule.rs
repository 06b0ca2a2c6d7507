use anchor_lang::prelude::*;

use crate::{
    constants::BASE,
    errors::VaultError,
    math::{checked_add, checked_sub, mul_div, to_u64, Rounding},
};

/// Share price recorded when an epoch closes. Written once by rebalance.
///
/// BASE-scaled shares per asset.
#[account]
pub struct EpochSharePrice {
    pub staking: Pubkey,
    pub epoch_id: u64,
    pub share_price: u128,
    pub bump: u8,
}

impl EpochSharePrice {
    /// The epoch closed with outstanding shares and no liquidity left
    pub fn is_insolvent(&self) -> bool {
        self.share_price == 0
    }

    /// Rejects snapshots recorded for another pool
    pub fn for_staking(&self, staking: &Pubkey) -> Result<&Self> {
        require_keys_eq!(self.staking, *staking, VaultError::SharePriceMismatch);
        Ok(self)
    }

    pub fn shares_for(&self, assets: u64) -> Result<u64> {
        require!(!self.is_insolvent(), VaultError::PoolInsolvent);
        to_u64(mul_div(
            assets as u128,
            self.share_price,
            BASE,
            Rounding::Down,
        )?)
    }

    /// Shares of an insolvent epoch redeem for nothing
    pub fn assets_for(&self, shares: u64) -> Result<u64> {
        if self.is_insolvent() {
            return Ok(0);
        }
        to_u64(mul_div(
            shares as u128,
            BASE,
            self.share_price,
            Rounding::Down,
        )?)
    }
}

/// Looks up the snapshot needed to settle a record last touched in `epoch_id`
fn snapshot_for(price: Option<&EpochSharePrice>, epoch_id: u64) -> Result<&EpochSharePrice> {
    let price = price.ok_or(error!(VaultError::MissingSharePrice))?;
    require!(price.epoch_id == epoch_id, VaultError::SharePriceMismatch);
    Ok(price)
}

/// Assets queued for the next epoch boundary and shares already priced
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduledDeposit {
    pub updated_at_epoch: u64,
    /// Unsettled assets of `updated_at_epoch`
    pub deposited_assets: u64,
    /// Settled shares waiting in the share escrow
    pub scheduled_shares: u64,
}

impl ScheduledDeposit {
    /// True when the record holds assets of an epoch that already closed
    pub fn needs_settlement(&self, current_epoch: u64) -> bool {
        self.deposited_assets > 0 && self.updated_at_epoch < current_epoch
    }

    /// The record as seen from `current_epoch`
    pub fn settled(&self, current_epoch: u64, price: Option<&EpochSharePrice>) -> Result<Self> {
        let mut next = *self;
        if self.needs_settlement(current_epoch) {
            let price = snapshot_for(price, self.updated_at_epoch)?;
            next.scheduled_shares =
                checked_add(next.scheduled_shares, price.shares_for(self.deposited_assets)?)?;
            next.deposited_assets = 0;
        }
        next.updated_at_epoch = current_epoch;
        Ok(next)
    }

    pub fn schedule(
        &mut self,
        assets: u64,
        current_epoch: u64,
        price: Option<&EpochSharePrice>,
    ) -> Result<()> {
        let mut next = self.settled(current_epoch, price)?;
        next.deposited_assets = checked_add(next.deposited_assets, assets)?;
        *self = next;
        Ok(())
    }

    pub fn unschedule(
        &mut self,
        assets: u64,
        current_epoch: u64,
        price: Option<&EpochSharePrice>,
    ) -> Result<()> {
        let mut next = self.settled(current_epoch, price)?;
        require!(
            assets <= next.deposited_assets,
            VaultError::InsufficientScheduledAssets
        );
        next.deposited_assets -= assets;
        *self = next;
        Ok(())
    }

    /// Returns the number of shares released from escrow
    pub fn claim(
        &mut self,
        shares: u64,
        claim_all: bool,
        current_epoch: u64,
        price: Option<&EpochSharePrice>,
    ) -> Result<u64> {
        if !claim_all && shares == 0 {
            return Ok(0);
        }
        let mut next = self.settled(current_epoch, price)?;
        let amount = if claim_all { next.scheduled_shares } else { shares };
        require!(
            amount > 0 && amount <= next.scheduled_shares,
            VaultError::InsufficientClaimable
        );
        next.scheduled_shares = checked_sub(next.scheduled_shares, amount)?;
        *self = next;
        Ok(amount)
    }
}

/// Shares queued for redemption at the next epoch boundary and assets
/// already priced
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScheduledWithdrawal {
    pub updated_at_epoch: u64,
    /// Unsettled shares of `updated_at_epoch`
    pub withdrawn_shares: u64,
    /// Settled assets waiting in the asset escrow
    pub scheduled_assets: u64,
}

impl ScheduledWithdrawal {
    pub fn needs_settlement(&self, current_epoch: u64) -> bool {
        self.withdrawn_shares > 0 && self.updated_at_epoch < current_epoch
    }

    pub fn settled(&self, current_epoch: u64, price: Option<&EpochSharePrice>) -> Result<Self> {
        let mut next = *self;
        if self.needs_settlement(current_epoch) {
            let price = snapshot_for(price, self.updated_at_epoch)?;
            next.scheduled_assets =
                checked_add(next.scheduled_assets, price.assets_for(self.withdrawn_shares)?)?;
            next.withdrawn_shares = 0;
        }
        next.updated_at_epoch = current_epoch;
        Ok(next)
    }

    pub fn schedule(
        &mut self,
        shares: u64,
        current_epoch: u64,
        price: Option<&EpochSharePrice>,
    ) -> Result<()> {
        let mut next = self.settled(current_epoch, price)?;
        next.withdrawn_shares = checked_add(next.withdrawn_shares, shares)?;
        *self = next;
        Ok(())
    }

    pub fn unschedule(
        &mut self,
        shares: u64,
        current_epoch: u64,
        price: Option<&EpochSharePrice>,
    ) -> Result<()> {
        let mut next = self.settled(current_epoch, price)?;
        require!(
            shares <= next.withdrawn_shares,
            VaultError::InsufficientScheduledShares
        );
        next.withdrawn_shares -= shares;
        *self = next;
        Ok(())
    }

    /// Returns the amount of assets released from escrow
    pub fn claim(
        &mut self,
        assets: u64,
        claim_all: bool,
        current_epoch: u64,
        price: Option<&EpochSharePrice>,
    ) -> Result<u64> {
        if !claim_all && assets == 0 {
            return Ok(0);
        }
        let mut next = self.settled(current_epoch, price)?;
        let amount = if claim_all { next.scheduled_assets } else { assets };
        require!(
            amount > 0 && amount <= next.scheduled_assets,
            VaultError::InsufficientClaimable
        );
        next.scheduled_assets = checked_sub(next.scheduled_assets, amount)?;
        *self = next;
        Ok(amount)
    }
}

/// Per-user scheduled flows
#[account]
pub struct StakerSchedule {
    pub staking: Pubkey,
    pub owner: Pubkey,
    pub deposit: ScheduledDeposit,
    pub withdrawal: ScheduledWithdrawal,
    pub bump: u8,
}

impl StakerSchedule {
    /// Fills in identity fields of a freshly created record
    pub fn bind(&mut self, staking: Pubkey, owner: Pubkey, bump: u8) {
        if self.owner == Pubkey::default() {
            self.staking = staking;
            self.owner = owner;
            self.bump = bump;
        }
    }

    /// The record as seen from `current_epoch`, both sides settled.
    ///
    /// Assets scheduled into an insolvent epoch were never converted; they
    /// become claimable assets again.
    pub fn settled(&self, current_epoch: u64, price: Option<&EpochSharePrice>) -> Result<Self> {
        let mut next = self.clone();
        if self.deposit.needs_settlement(current_epoch) {
            let snapshot = snapshot_for(price, self.deposit.updated_at_epoch)?;
            if snapshot.is_insolvent() {
                next.withdrawal.scheduled_assets = checked_add(
                    next.withdrawal.scheduled_assets,
                    next.deposit.deposited_assets,
                )?;
                next.deposit.deposited_assets = 0;
            }
        }
        next.deposit = next.deposit.settled(current_epoch, price)?;
        next.withdrawal = next.withdrawal.settled(current_epoch, price)?;
        Ok(next)
    }

    /// Settles both sides so they never point at different epochs
    pub fn settle(&mut self, current_epoch: u64, price: Option<&EpochSharePrice>) -> Result<()> {
        *self = self.settled(current_epoch, price)?;
        Ok(())
    }

    /// The price account a touch of this record needs, if any
    pub fn pending_epoch(&self, current_epoch: u64) -> Option<u64> {
        if self.deposit.needs_settlement(current_epoch) {
            Some(self.deposit.updated_at_epoch)
        } else if self.withdrawal.needs_settlement(current_epoch) {
            Some(self.withdrawal.updated_at_epoch)
        } else {
            None
        }
    }
}
