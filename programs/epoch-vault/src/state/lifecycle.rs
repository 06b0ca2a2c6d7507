use anchor_lang::prelude::*;

use crate::{constants::TIME_DELTA, errors::VaultError, state::Registry};

/// Pool phase derived from the clock; never stored
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NotInitialized,
    Staking,
    Trading,
    Idle,
}

/// Epoch lengths in seconds
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EpochParams {
    pub epoch_length: i64,
    pub staking_phase_length: i64,
    pub trading_phase_length: i64,
}

impl EpochParams {
    pub fn validate(&self) -> Result<()> {
        require!(
            self.epoch_length > 0
                && self.staking_phase_length > 0
                && self.trading_phase_length > 0,
            VaultError::InvalidEpochParams
        );
        let active = self
            .staking_phase_length
            .checked_add(self.trading_phase_length)
            .ok_or(error!(VaultError::InvalidEpochParams))?;
        require!(active <= self.epoch_length, VaultError::InvalidEpochParams);
        Ok(())
    }
}

/// Epoch clock
///
/// Phases: [start, start + staking) is Staking, then Trading for
/// `trading_phase_length`, then Idle until an authorized rebalance moves
/// `current_epoch_start` forward by exactly one `epoch_length`.
#[account]
pub struct Lifecycle {
    pub registry: Pubkey,

    /// Incremented exactly once per successful rebalance
    pub epoch_id: u64,

    pub current_epoch_start: i64,

    pub params: EpochParams,

    pub initialized: bool,

    pub bump: u8,

    pub _reserved: [u8; 64],
}

impl Lifecycle {
    pub fn init(
        &mut self,
        registry: Pubkey,
        epoch_start: i64,
        params: EpochParams,
        bump: u8,
    ) -> Result<()> {
        require!(!self.initialized, VaultError::AlreadyInitialized);
        params.validate()?;

        self.registry = registry;
        self.epoch_id = 0;
        self.current_epoch_start = epoch_start;
        self.params = params;
        self.bump = bump;
        self._reserved = [0; 64];
        self.initialized = true;
        Ok(())
    }

    pub fn current_epoch_start(&self) -> i64 {
        self.current_epoch_start
    }

    pub fn current_epoch_end(&self) -> i64 {
        self.current_epoch_start
            .saturating_add(self.params.epoch_length)
    }

    pub fn epoch_length(&self) -> i64 {
        self.params.epoch_length
    }

    pub fn staking_phase_length(&self) -> i64 {
        self.params.staking_phase_length
    }

    pub fn trading_phase_length(&self) -> i64 {
        self.params.trading_phase_length
    }

    pub fn phase(&self, now: i64) -> Phase {
        let start = self.current_epoch_start;
        let staking_end = start.saturating_add(self.params.staking_phase_length);
        let trading_end = staking_end.saturating_add(self.params.trading_phase_length);

        if now < start.saturating_sub(TIME_DELTA) {
            Phase::NotInitialized
        } else if now < staking_end {
            Phase::Staking
        } else if now < trading_end {
            Phase::Trading
        } else {
            Phase::Idle
        }
    }

    pub fn is_staking_phase(&self, now: i64) -> bool {
        self.phase(now) == Phase::Staking
    }

    pub fn is_trading_phase(&self, now: i64) -> bool {
        self.phase(now) == Phase::Trading
    }

    pub fn is_idle_phase(&self, now: i64) -> bool {
        self.phase(now) == Phase::Idle
    }

    pub fn can_deposit(&self, now: i64) -> bool {
        matches!(self.phase(now), Phase::Staking | Phase::Trading)
    }

    pub fn can_withdraw(&self, now: i64) -> bool {
        self.is_staking_phase(now)
    }

    pub fn can_trade(&self, now: i64) -> bool {
        self.is_trading_phase(now)
    }

    pub fn can_schedule(&self, now: i64) -> bool {
        self.is_idle_phase(now)
    }

    /// No grace tolerance here: rebalancing early would price the epoch
    /// before it closed.
    pub fn can_rebalance(&self, now: i64) -> bool {
        now >= self.current_epoch_end()
    }

    /// Advances exactly one epoch; only the registered accounting module
    pub fn progress_epoch(&mut self, caller: &Pubkey, registry: &Registry, now: i64) -> Result<()> {
        registry.only_accounting(caller)?;
        require!(self.can_rebalance(now), VaultError::RebalanceTooEarly);

        let next_start = self
            .current_epoch_start
            .checked_add(self.params.epoch_length)
            .ok_or(error!(VaultError::MathOverflow))?;
        let next_epoch = self
            .epoch_id
            .checked_add(1)
            .ok_or(error!(VaultError::MathOverflow))?;

        self.current_epoch_start = next_start;
        self.epoch_id = next_epoch;
        Ok(())
    }

    pub fn set_epoch_params(
        &mut self,
        caller: &Pubkey,
        registry: &Registry,
        params: EpochParams,
    ) -> Result<()> {
        registry.only_owner(caller)?;
        params.validate()?;
        self.params = params;
        Ok(())
    }
}
