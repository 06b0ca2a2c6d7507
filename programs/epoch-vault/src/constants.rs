// Constants for the Epoch Vault program

/// Seed for registry PDA (one pool per underlying mint)
pub const REGISTRY_SEED: &[u8] = b"registry";

/// Seed for lifecycle (epoch clock) PDA
pub const LIFECYCLE_SEED: &[u8] = b"lifecycle";

/// Seed for accounting PDA
pub const ACCOUNTING_SEED: &[u8] = b"accounting";

/// Seed for staking (share ledger) PDA
pub const STAKING_SEED: &[u8] = b"staking";

/// Seed for share mint PDA
pub const SHARE_MINT_SEED: &[u8] = b"shares";

/// Seed for the vault authority PDA that owns pool liquidity
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

/// Seed for the escrow authority PDA that owns scheduled flows
pub const ESCROW_AUTHORITY_SEED: &[u8] = b"escrow_authority";

/// Seed for per-epoch share price snapshots
pub const SHARE_PRICE_SEED: &[u8] = b"share_price";

/// Seed for per-user scheduled deposit/withdrawal records
pub const SCHEDULE_SEED: &[u8] = b"schedule";

/// Fixed-point base for fees, ratios and share prices (1e18)
pub const BASE: u128 = 1_000_000_000_000_000_000;

/// Fee year used for maintenance fee accrual (360 days)
pub const SECONDS_PER_YEAR: i64 = 360 * 24 * 3600;

/// Grace window applied to the opening staking boundary only
pub const TIME_DELTA: i64 = 10;

/// Default immediate profit fee: 10%
pub const DEFAULT_IMMEDIATE_PROFIT_FEE: u64 = 100_000_000_000_000_000;

/// Default annual maintenance fee: 2%
pub const DEFAULT_ANNUAL_MAINTENANCE_FEE: u64 = 20_000_000_000_000_000;

/// Maximum number of position mints held at once
///
/// Rage quit passes two remaining accounts per pool asset, so a full pool
/// needs `2 * (MAX_POSITIONS + 1)` of them plus nine fixed accounts, which
/// still fits a legacy transaction.
pub const MAX_POSITIONS: usize = 8;

/// Maximum number of strategies enabled besides the registered one
pub const MAX_STRATEGIES: usize = 8;

/// Space for Registry account (8 discriminator + 32 authority + 32 underlying_mint +
/// 32 vault + 4 * 32 addresses + 4 + MAX_STRATEGIES * 32 enabled_strategies +
/// 1 initialized + 1 bump + 1 vault_authority_bump + 1 escrow_authority_bump + 64 padding)
pub const REGISTRY_SIZE: usize =
    8 + 32 + 32 + 32 + (4 * 32) + 4 + (MAX_STRATEGIES * 32) + 1 + 1 + 1 + 1 + 64;

/// Space for Lifecycle account (8 discriminator + 32 registry + 8 epoch_id +
/// 8 current_epoch_start + 3 * 8 params + 1 initialized + 1 bump + 64 padding)
pub const LIFECYCLE_SIZE: usize = 8 + 32 + 8 + 8 + (3 * 8) + 1 + 1 + 64;

/// Space for Accounting account (8 discriminator + 32 registry + 32 underlying_mint +
/// 8 total_liquidity + 8 accumulated_fees + 32 fee_collector + 8 immediate_profit_fee +
/// 8 annual_maintenance_fee + 4 + MAX_POSITIONS * 32 holding_positions +
/// 1 initialized + 1 bump + 64 padding)
pub const ACCOUNTING_SIZE: usize =
    8 + 32 + 32 + 8 + 8 + 32 + 8 + 8 + 4 + (MAX_POSITIONS * 32) + 1 + 1 + 64;

/// Space for Staking account (8 discriminator + 32 registry + 32 share_mint +
/// 8 total_shares + 8 total_scheduled_deposits + 8 total_scheduled_withdrawals +
/// 1 initialized + 1 bump + 64 padding)
pub const STAKING_SIZE: usize = 8 + 32 + 32 + 8 + 8 + 8 + 1 + 1 + 64;

/// Space for EpochSharePrice account (8 discriminator + 32 staking + 8 epoch_id +
/// 16 share_price + 1 bump)
pub const EPOCH_SHARE_PRICE_SIZE: usize = 8 + 32 + 8 + 16 + 1;

/// Space for StakerSchedule account (8 discriminator + 32 staking + 32 owner +
/// 3 * 8 deposit + 3 * 8 withdrawal + 1 bump)
pub const STAKER_SCHEDULE_SIZE: usize = 8 + 32 + 32 + (3 * 8) + (3 * 8) + 1;
