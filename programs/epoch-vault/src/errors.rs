use anchor_lang::prelude::*;

/// Custom error codes for the Epoch Vault program
///
/// Codes are stable: new variants are only ever appended.
#[error_code]
pub enum VaultError {
    // Authorization
    #[msg("Unauthorized - only the pool owner can perform this action")]
    Unauthorized,

    #[msg("Caller is not the registered accounting module")]
    NotAccountingModule,

    #[msg("Caller is not the registered staking module")]
    NotStakingModule,

    #[msg("Caller is not an enabled strategy")]
    StrategyNotEnabled,

    #[msg("Caller is not the fee collector")]
    NotFeeCollector,

    // Lifecycle gating
    #[msg("Deposits are only allowed during staking or trading phase")]
    DepositNotAllowed,

    #[msg("Withdrawals are only allowed during staking phase")]
    WithdrawalNotAllowed,

    #[msg("Scheduling is only allowed during idle phase")]
    SchedulingNotAllowed,

    #[msg("Rebalance is not allowed before the current epoch ends")]
    RebalanceTooEarly,

    // Structural violations
    #[msg("Pool module is already initialized")]
    AlreadyInitialized,

    #[msg("Registry addresses are not set")]
    RegistryNotWired,

    #[msg("Registry addresses: accounting module is missing")]
    MissingAccountingModule,

    #[msg("Registry addresses: lifecycle module is missing")]
    MissingLifecycleModule,

    #[msg("Registry addresses: staking module is missing")]
    MissingStakingModule,

    #[msg("Registry addresses: strategy module is missing")]
    MissingStrategyModule,

    #[msg("Strategy is already enabled")]
    StrategyAlreadyEnabled,

    #[msg("Strategy not found in enabled set")]
    StrategyNotFound,

    #[msg("Too many enabled strategies")]
    TooManyStrategies,

    #[msg("Invalid epoch parameters")]
    InvalidEpochParams,

    #[msg("Fee must not exceed 100%")]
    InvalidFee,

    #[msg("Fee collector is not set")]
    FeeCollectorNotSet,

    #[msg("Position is already held by the pool")]
    PositionAlreadyHeld,

    #[msg("Position is not held by the pool")]
    PositionNotHeld,

    #[msg("Underlying asset cannot be registered as a position")]
    UnderlyingAsPosition,

    #[msg("Too many held positions")]
    TooManyPositions,

    #[msg("Rage quit token is not a held position")]
    UnregisteredPosition,

    #[msg("Rage quit tokens must be strictly ascending without duplicates")]
    UnsortedOrDuplicate,

    #[msg("Rage quit tokens must cover the underlying and every held position")]
    IncompletePositionList,

    #[msg("Share price snapshot is required to settle scheduled flows")]
    MissingSharePrice,

    #[msg("Share price snapshot does not match the scheduled epoch")]
    SharePriceMismatch,

    #[msg("Invalid token mint")]
    InvalidMint,

    #[msg("Invalid token account")]
    InvalidTokenAccount,

    // Balances
    #[msg("Amount exceeds currently scheduled assets")]
    InsufficientScheduledAssets,

    #[msg("Amount exceeds currently scheduled shares")]
    InsufficientScheduledShares,

    #[msg("Amount exceeds claimable balance")]
    InsufficientClaimable,

    #[msg("Insufficient available liquidity")]
    InsufficientLiquidity,

    #[msg("Insufficient shares")]
    InsufficientShares,

    // Arithmetic
    #[msg("Subtraction would drive a counter below zero")]
    ArithmeticUnderflow,

    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Cannot divide by zero")]
    DivisionByZero,

    #[msg("Target is not an executable program")]
    InvalidTargetProgram,

    #[msg("Pool has outstanding shares but no liquidity")]
    PoolInsolvent,
}

/// Coarse failure classes for off-chain tooling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    PhaseNotAllowed,
    InvalidState,
    InsufficientBalance,
    ArithmeticUnderflow,
    ArithmeticOverflow,
}

impl VaultError {
    pub fn kind(&self) -> ErrorKind {
        use VaultError::*;
        match self {
            Unauthorized | NotAccountingModule | NotStakingModule | StrategyNotEnabled
            | NotFeeCollector => ErrorKind::Unauthorized,
            DepositNotAllowed | WithdrawalNotAllowed | SchedulingNotAllowed
            | RebalanceTooEarly => ErrorKind::PhaseNotAllowed,
            InsufficientScheduledAssets | InsufficientScheduledShares | InsufficientClaimable
            | InsufficientLiquidity | InsufficientShares => ErrorKind::InsufficientBalance,
            ArithmeticUnderflow => ErrorKind::ArithmeticUnderflow,
            MathOverflow | DivisionByZero => ErrorKind::ArithmeticOverflow,
            _ => ErrorKind::InvalidState,
        }
    }
}
