// Epoch Vault - epoch-gated pooled liquidity for an options-selling strategy
// Architecture: Registry + Lifecycle + Accounting + Staking modules, one set of
// PDAs per underlying mint, driven by a registered strategy

use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;
pub mod token_ops;

use instructions::*;
use state::{EpochParams, PoolData, RegistryAddresses, StakingData};

declare_id!("9reVToKsLkKsWRHqWm6waBJzTcGDja5vpLzqB5Ku7qvV");

#[program]
pub mod epoch_vault {
    use super::*;

    /// Create registry, epoch clock and accounting state for a new pool
    ///
    /// Security considerations:
    /// - Signer becomes pool owner (stored in state)
    /// - Epoch parameters validated before anything is written
    /// - Registry is wired to all four modules at once
    pub fn initialize_pool(
        ctx: Context<InitializePool>,
        params: InitializePoolParams,
    ) -> Result<()> {
        instructions::initialize_pool::handler(ctx, params)
    }

    /// Create the share ledger, share mint, vault and escrow token accounts
    pub fn initialize_vault_accounts(ctx: Context<InitializeVaultAccounts>) -> Result<()> {
        instructions::initialize_vault_accounts::handler(ctx)
    }

    /// Owner only; all four module addresses must be set
    pub fn set_registry_addresses(
        ctx: Context<SetRegistryAddresses>,
        addresses: RegistryAddresses,
    ) -> Result<()> {
        instructions::set_registry_addresses::handler(ctx, addresses)
    }

    pub fn manage_strategy(
        ctx: Context<ManageStrategy>,
        strategy: Pubkey,
        enabled: bool,
    ) -> Result<()> {
        instructions::manage_strategy::handler(ctx, strategy, enabled)
    }

    pub fn set_epoch_params(ctx: Context<SetEpochParams>, params: EpochParams) -> Result<()> {
        instructions::set_epoch_params::handler(ctx, params)
    }

    pub fn set_fee_collector(ctx: Context<ConfigureFees>, fee_collector: Pubkey) -> Result<()> {
        instructions::configure_fees::set_fee_collector_handler(ctx, fee_collector)
    }

    /// BASE-scaled, at most 100%
    pub fn set_immediate_profit_fee(ctx: Context<ConfigureFees>, fee: u64) -> Result<()> {
        instructions::configure_fees::set_immediate_profit_fee_handler(ctx, fee)
    }

    /// BASE-scaled annual rate, at most 100%
    pub fn set_annual_maintenance_fee(ctx: Context<ConfigureFees>, fee: u64) -> Result<()> {
        instructions::configure_fees::set_annual_maintenance_fee_handler(ctx, fee)
    }

    /// Deposit underlying and receive shares immediately
    ///
    /// Security considerations:
    /// - Staking or trading phase only
    /// - Validates user token accounts (mint, owner)
    /// - Follows checks-effects-interactions pattern
    pub fn deposit(ctx: Context<Deposit>, assets: u64) -> Result<()> {
        instructions::deposit::deposit_handler(ctx, assets)
    }

    /// Mint an exact number of shares; assets round up
    pub fn mint(ctx: Context<Deposit>, shares: u64) -> Result<()> {
        instructions::deposit::mint_handler(ctx, shares)
    }

    /// Withdraw underlying during the staking phase
    ///
    /// Security considerations:
    /// - Staking phase only
    /// - Limited by liquidity not currently utilized by the strategy
    /// - Shares burned round up
    pub fn withdraw(ctx: Context<Withdraw>, assets: u64) -> Result<()> {
        instructions::withdraw::withdraw_handler(ctx, assets)
    }

    pub fn redeem(ctx: Context<Withdraw>, shares: u64) -> Result<()> {
        instructions::withdraw::redeem_handler(ctx, shares)
    }

    /// Queue underlying for the next epoch (idle phase only)
    pub fn schedule_deposit(ctx: Context<ScheduleDeposit>, assets: u64) -> Result<()> {
        instructions::scheduled_deposits::schedule_handler(ctx, assets)
    }

    pub fn unschedule_deposit(ctx: Context<UnscheduleDeposit>, assets: u64) -> Result<()> {
        instructions::scheduled_deposits::unschedule_handler(ctx, assets)
    }

    pub fn claim_scheduled_shares(
        ctx: Context<ClaimScheduledShares>,
        shares: u64,
        claim_all: bool,
    ) -> Result<()> {
        instructions::scheduled_deposits::claim_handler(ctx, shares, claim_all)
    }

    /// Queue shares for redemption at the next epoch (idle phase only)
    pub fn schedule_withdrawal(ctx: Context<ScheduleWithdrawal>, shares: u64) -> Result<()> {
        instructions::scheduled_withdrawals::schedule_handler(ctx, shares)
    }

    pub fn unschedule_withdrawal(ctx: Context<UnscheduleWithdrawal>, shares: u64) -> Result<()> {
        instructions::scheduled_withdrawals::unschedule_handler(ctx, shares)
    }

    pub fn claim_scheduled_assets(
        ctx: Context<ClaimScheduledAssets>,
        assets: u64,
        claim_all: bool,
    ) -> Result<()> {
        instructions::scheduled_withdrawals::claim_handler(ctx, assets, claim_all)
    }

    /// Burn shares for a pro-rata slice of the underlying and every held position
    ///
    /// Security considerations:
    /// - Available in every phase
    /// - Token list must be exactly the held set, strictly ascending by mint
    /// - Vault side of each pair must be the vault authority's associated account
    /// - Signer is the share owner or its approved delegate
    pub fn rage_quit<'info>(
        ctx: Context<'_, '_, 'info, 'info, RageQuit<'info>>,
        shares: u64,
    ) -> Result<()> {
        instructions::rage_quit::handler(ctx, shares)
    }

    /// Strategy only
    pub fn change_holding_position(
        ctx: Context<ChangeHoldingPosition>,
        token: Pubkey,
        is_add: bool,
    ) -> Result<()> {
        instructions::change_holding_position::handler(ctx, token, is_add)
    }

    /// Close the epoch: realize PnL, charge fees, snapshot the share price,
    /// advance the clock and settle scheduled flows
    ///
    /// Security considerations:
    /// - Enabled strategy only, never before the epoch ends
    /// - One epoch per call; the snapshot account can only be created once
    pub fn rebalance(ctx: Context<Rebalance>) -> Result<()> {
        instructions::rebalance::handler(ctx)
    }

    pub fn collect_fees(ctx: Context<CollectFees>) -> Result<()> {
        instructions::collect_fees::handler(ctx)
    }

    /// Owner or an enabled strategy acts as the vault authority
    pub fn execute_on_vault<'info>(
        ctx: Context<'_, '_, 'info, 'info, ExecuteOnVault<'info>>,
        data: Vec<u8>,
    ) -> Result<()> {
        instructions::execute_on_vault::handler(ctx, data)
    }

    pub fn get_pool_data(ctx: Context<GetPoolData>) -> Result<PoolData> {
        instructions::lens::pool_data_handler(ctx)
    }

    pub fn get_staking_data(ctx: Context<GetStakingData>) -> Result<StakingData> {
        instructions::lens::staking_data_handler(ctx)
    }
}
