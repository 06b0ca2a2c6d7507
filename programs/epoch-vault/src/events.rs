use anchor_lang::prelude::*;

use crate::state::RegistryAddresses;

/// Event emitted when pool state accounts are allocated and configured
#[event]
pub struct PoolInitialized {
    pub registry: Pubkey,
    pub authority: Pubkey,
    pub underlying_mint: Pubkey,
    pub epoch_start: i64,
    pub epoch_length: i64,
    pub timestamp: i64,
}

/// Event emitted when the registry is wired to its modules
#[event]
pub struct RegistryAddressesSet {
    pub registry: Pubkey,
    pub addresses: RegistryAddresses,
    pub timestamp: i64,
}

/// Event emitted when a strategy is enabled or disabled
#[event]
pub struct StrategyToggled {
    pub registry: Pubkey,
    pub strategy: Pubkey,
    pub enabled: bool,
    pub timestamp: i64,
}

/// Event emitted when owner-controlled configuration changes
#[event]
pub struct ConfigUpdated {
    pub registry: Pubkey,
    pub field: String,
    pub value: u64,
    pub timestamp: i64,
}

/// Event emitted when assets are deposited (deposit or mint)
#[event]
pub struct Deposited {
    pub registry: Pubkey,
    pub user: Pubkey,
    pub asset_amount: u64,
    pub shares_minted: u64,
    pub total_liquidity: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted when assets are withdrawn (withdraw or redeem)
#[event]
pub struct Withdrawn {
    pub registry: Pubkey,
    pub user: Pubkey,
    pub asset_amount: u64,
    pub shares_burned: u64,
    pub total_liquidity: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted when a deposit is queued or unqueued for the current epoch
#[event]
pub struct DepositScheduled {
    pub registry: Pubkey,
    pub receiver: Pubkey,
    pub epoch_id: u64,
    pub assets: u64,
    pub scheduled: bool,
    pub total_scheduled_deposits: u64,
    pub timestamp: i64,
}

/// Event emitted when a withdrawal is queued or unqueued for the current epoch
#[event]
pub struct WithdrawalScheduled {
    pub registry: Pubkey,
    pub receiver: Pubkey,
    pub epoch_id: u64,
    pub shares: u64,
    pub scheduled: bool,
    pub total_scheduled_withdrawals: u64,
    pub timestamp: i64,
}

/// Event emitted when settled scheduled flows are claimed
#[event]
pub struct ScheduledClaimed {
    pub registry: Pubkey,
    pub user: Pubkey,
    pub shares: u64,
    pub assets: u64,
    pub timestamp: i64,
}

/// Event emitted when the strategy toggles a held position
#[event]
pub struct HoldingPositionChanged {
    pub registry: Pubkey,
    pub token: Pubkey,
    pub is_add: bool,
    pub timestamp: i64,
}

/// Event emitted once per epoch boundary
#[event]
pub struct Rebalanced {
    pub registry: Pubkey,
    pub closed_epoch: u64,
    pub share_price: u128,
    pub profit: u64,
    pub loss: u64,
    pub profit_fee: u64,
    pub maintenance_fee: u64,
    pub minted_shares: u64,
    pub burned_shares: u64,
    pub reserved_assets: u64,
    pub refunded_assets: u64,
    pub total_liquidity: u64,
    pub timestamp: i64,
}

/// Event emitted when the fee collector pulls accumulated fees
#[event]
pub struct FeesCollected {
    pub registry: Pubkey,
    pub fee_collector: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Event emitted on emergency pro-rata exit
#[event]
pub struct RageQuitExecuted {
    pub registry: Pubkey,
    pub owner: Pubkey,
    pub shares_burned: u64,
    pub released_liquidity: u64,
    pub tokens: Vec<Pubkey>,
    pub amounts: Vec<u64>,
    pub timestamp: i64,
}

/// Event emitted when a privileged call is executed as the vault
#[event]
pub struct VaultCallExecuted {
    pub registry: Pubkey,
    pub caller: Pubkey,
    pub target_program: Pubkey,
    pub timestamp: i64,
}

/// Event emitted when the share mint and pool token accounts are created
#[event]
pub struct VaultAccountsInitialized {
    pub registry: Pubkey,
    pub staking: Pubkey,
    pub share_mint: Pubkey,
    pub vault_token_account: Pubkey,
    pub timestamp: i64,
}
