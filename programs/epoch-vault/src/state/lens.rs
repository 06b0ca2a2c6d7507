use anchor_lang::prelude::*;

use crate::state::{
    Accounting, EpochSharePrice, Lifecycle, Phase, Registry, RegistryAddresses, StakerSchedule,
    Staking,
};

/// Accounting snapshot returned by `get_pool_data`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct AccountingData {
    pub pool_size: u64,
    pub utilized_liquidity: u64,
    pub available_liquidity: u64,
    /// BASE-scaled
    pub utilization_ratio: u64,
    pub accumulated_fees: u64,
    pub fee_collector: Pubkey,
    pub immediate_profit_fee: u64,
    pub annual_maintenance_fee: u64,
    pub margin_mint: Pubkey,
    pub margin_decimals: u8,
    pub holding_positions: Vec<Pubkey>,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct LifecycleData {
    pub epoch_id: u64,
    pub phase: Phase,
    pub current_epoch_start: i64,
    pub current_epoch_end: i64,
    pub epoch_length: i64,
    pub staking_phase_length: i64,
    pub trading_phase_length: i64,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct PoolData {
    pub modules: RegistryAddresses,
    pub share_mint: Pubkey,
    pub total_shares: u64,
    pub total_scheduled_deposits: u64,
    pub total_scheduled_withdrawals: u64,
    pub accounting: AccountingData,
    pub lifecycle: LifecycleData,
}

/// Per-user view returned by `get_staking_data`
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct StakingData {
    pub user: Pubkey,
    pub staked_shares: u64,
    pub staked_assets: u64,
    /// Assets scheduled for the current epoch
    pub pending_stake: u64,
    pub claimable_shares: u64,
    /// Shares scheduled for the current epoch
    pub pending_withdrawal: u64,
    pub claimable_assets: u64,
}

impl AccountingData {
    pub fn build(accounting: &Accounting, vault_balance: u64, margin_decimals: u8) -> Result<Self> {
        Ok(AccountingData {
            pool_size: accounting.total_liquidity,
            utilized_liquidity: accounting.utilized_liquidity(vault_balance),
            available_liquidity: accounting.available_liquidity(vault_balance),
            utilization_ratio: accounting.liquidity_utilization_ratio(vault_balance)?,
            accumulated_fees: accounting.accumulated_fees,
            fee_collector: accounting.fee_collector,
            immediate_profit_fee: accounting.immediate_profit_fee,
            annual_maintenance_fee: accounting.annual_maintenance_fee,
            margin_mint: accounting.underlying_mint,
            margin_decimals,
            holding_positions: accounting.holding_positions.clone(),
        })
    }
}

impl LifecycleData {
    pub fn build(lifecycle: &Lifecycle, now: i64) -> Self {
        LifecycleData {
            epoch_id: lifecycle.epoch_id,
            phase: lifecycle.phase(now),
            current_epoch_start: lifecycle.current_epoch_start(),
            current_epoch_end: lifecycle.current_epoch_end(),
            epoch_length: lifecycle.epoch_length(),
            staking_phase_length: lifecycle.staking_phase_length(),
            trading_phase_length: lifecycle.trading_phase_length(),
        }
    }
}

impl PoolData {
    pub fn build(
        registry: &Registry,
        lifecycle: &Lifecycle,
        accounting: &Accounting,
        staking: &Staking,
        vault_balance: u64,
        margin_decimals: u8,
        now: i64,
    ) -> Result<Self> {
        Ok(PoolData {
            modules: registry.registry_addresses(),
            share_mint: staking.share_mint,
            total_shares: staking.total_shares,
            total_scheduled_deposits: staking.total_scheduled_deposits,
            total_scheduled_withdrawals: staking.total_scheduled_withdrawals,
            accounting: AccountingData::build(accounting, vault_balance, margin_decimals)?,
            lifecycle: LifecycleData::build(lifecycle, now),
        })
    }
}

impl StakingData {
    pub fn build(
        user: Pubkey,
        user_shares: u64,
        staking: &Staking,
        lifecycle: &Lifecycle,
        accounting: &Accounting,
        schedule: Option<&StakerSchedule>,
        price: Option<&EpochSharePrice>,
    ) -> Result<Self> {
        let mut data = StakingData {
            user,
            staked_shares: user_shares,
            staked_assets: staking.convert_to_assets(user_shares, accounting.total_liquidity)?,
            ..Default::default()
        };

        if let Some(schedule) = schedule {
            let view = schedule.settled(lifecycle.epoch_id, price)?;
            data.pending_stake = view.deposit.deposited_assets;
            data.claimable_shares = view.deposit.scheduled_shares;
            data.pending_withdrawal = view.withdrawal.withdrawn_shares;
            data.claimable_assets = view.withdrawal.scheduled_assets;
        }
        Ok(data)
    }
}
