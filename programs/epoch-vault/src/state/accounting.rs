use anchor_lang::prelude::*;

use crate::{
    constants::{
        BASE, DEFAULT_ANNUAL_MAINTENANCE_FEE, DEFAULT_IMMEDIATE_PROFIT_FEE, MAX_POSITIONS,
        SECONDS_PER_YEAR,
    },
    errors::VaultError,
    math::{checked_add, checked_sub, mul_div, to_u64, Rounding},
    state::{EpochSettlement, Lifecycle, Registry, Staking},
};

/// Liquidity and fee bookkeeping
///
/// Security considerations:
/// - `total_liquidity` only changes through the staking module, rebalance
///   and rage quit; utilization never touches it
/// - Accumulated fees stay in the vault token account until collected and
///   are excluded from every balance-derived figure
#[account]
pub struct Accounting {
    pub registry: Pubkey,

    /// Mint of the underlying asset (margin token)
    pub underlying_mint: Pubkey,

    /// Assets owned by depositors, in underlying units
    pub total_liquidity: u64,

    /// Fees owed to the fee collector
    pub accumulated_fees: u64,

    /// Default pubkey means unset
    pub fee_collector: Pubkey,

    /// Share of positive epoch PnL taken as fee, BASE-scaled
    pub immediate_profit_fee: u64,

    /// Annualized fee on liquidity under management, BASE-scaled
    pub annual_maintenance_fee: u64,

    /// Position mints currently held by the vault
    pub holding_positions: Vec<Pubkey>,

    pub initialized: bool,

    pub bump: u8,

    pub _reserved: [u8; 64],
}

/// Inputs of a rebalance read from outside the accounting state
#[derive(Clone, Copy, Debug)]
pub struct RebalanceRequest {
    /// Strategy signing the rebalance
    pub caller: Pubkey,
    /// Address of this accounting account, checked by the epoch clock
    pub accounting_key: Pubkey,
    /// Live underlying balance of the vault token account
    pub vault_balance: u64,
    pub now: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RebalanceOutcome {
    pub closed_epoch: u64,
    pub profit: u64,
    pub loss: u64,
    pub profit_fee: u64,
    pub maintenance_fee: u64,
    pub settlement: EpochSettlement,
}

impl Accounting {
    pub fn init(
        &mut self,
        registry: Pubkey,
        underlying_mint: Pubkey,
        fee_collector: Pubkey,
        bump: u8,
    ) -> Result<()> {
        require!(!self.initialized, VaultError::AlreadyInitialized);

        self.registry = registry;
        self.underlying_mint = underlying_mint;
        self.total_liquidity = 0;
        self.accumulated_fees = 0;
        self.fee_collector = fee_collector;
        self.immediate_profit_fee = DEFAULT_IMMEDIATE_PROFIT_FEE;
        self.annual_maintenance_fee = DEFAULT_ANNUAL_MAINTENANCE_FEE;
        self.holding_positions = Vec::new();
        self.bump = bump;
        self._reserved = [0; 64];
        self.initialized = true;
        Ok(())
    }

    /// Staking module only
    pub fn change_total_liquidity(
        &mut self,
        caller: &Pubkey,
        registry: &Registry,
        amount: u64,
        is_addition: bool,
    ) -> Result<()> {
        registry.only_staking(caller)?;
        self.total_liquidity = if is_addition {
            checked_add(self.total_liquidity, amount)?
        } else {
            checked_sub(self.total_liquidity, amount)?
        };
        Ok(())
    }

    /// Enabled strategies only
    pub fn change_holding_position(
        &mut self,
        caller: &Pubkey,
        registry: &Registry,
        token: Pubkey,
        is_add: bool,
    ) -> Result<()> {
        registry.only_strategy(caller)?;

        if is_add {
            require!(
                token != self.underlying_mint,
                VaultError::UnderlyingAsPosition
            );
            require!(!self.has_position(&token), VaultError::PositionAlreadyHeld);
            require!(
                self.holding_positions.len() < MAX_POSITIONS,
                VaultError::TooManyPositions
            );
            self.holding_positions.push(token);
        } else {
            let index = self
                .holding_positions
                .iter()
                .position(|p| *p == token)
                .ok_or(error!(VaultError::PositionNotHeld))?;
            self.holding_positions.remove(index);
        }
        Ok(())
    }

    pub fn has_position(&self, token: &Pubkey) -> bool {
        self.holding_positions.contains(token)
    }

    /// Vault balance that belongs to depositors (fees excluded)
    pub fn net_vault_balance(&self, vault_balance: u64) -> u64 {
        vault_balance.saturating_sub(self.accumulated_fees)
    }

    /// Liquidity that left the vault: anything the bookkeeping says the pool
    /// owns but the vault does not physically hold.
    pub fn utilized_liquidity(&self, vault_balance: u64) -> u64 {
        self.total_liquidity
            .saturating_sub(self.net_vault_balance(vault_balance))
    }

    pub fn available_liquidity(&self, vault_balance: u64) -> u64 {
        self.total_liquidity - self.utilized_liquidity(vault_balance)
    }

    /// BASE-scaled utilized / total, zero for an empty pool
    pub fn liquidity_utilization_ratio(&self, vault_balance: u64) -> Result<u64> {
        if self.total_liquidity == 0 {
            return Ok(0);
        }
        let ratio = mul_div(
            self.utilized_liquidity(vault_balance) as u128,
            BASE,
            self.total_liquidity as u128,
            Rounding::Down,
        )?;
        to_u64(ratio)
    }

    /// Fee collector only; returns the amount to transfer out of the vault
    pub fn collect_fees(&mut self, caller: &Pubkey) -> Result<u64> {
        require!(
            self.fee_collector != Pubkey::default(),
            VaultError::FeeCollectorNotSet
        );
        require_keys_eq!(*caller, self.fee_collector, VaultError::NotFeeCollector);

        let amount = self.accumulated_fees;
        self.accumulated_fees = 0;
        Ok(amount)
    }

    pub fn set_fee_collector(
        &mut self,
        caller: &Pubkey,
        registry: &Registry,
        fee_collector: Pubkey,
    ) -> Result<()> {
        registry.only_owner(caller)?;
        self.fee_collector = fee_collector;
        Ok(())
    }

    pub fn set_immediate_profit_fee(
        &mut self,
        caller: &Pubkey,
        registry: &Registry,
        fee: u64,
    ) -> Result<()> {
        registry.only_owner(caller)?;
        require!(fee as u128 <= BASE, VaultError::InvalidFee);
        self.immediate_profit_fee = fee;
        Ok(())
    }

    pub fn set_annual_maintenance_fee(
        &mut self,
        caller: &Pubkey,
        registry: &Registry,
        fee: u64,
    ) -> Result<()> {
        registry.only_owner(caller)?;
        require!(fee as u128 <= BASE, VaultError::InvalidFee);
        self.annual_maintenance_fee = fee;
        Ok(())
    }

    /// Maintenance fee for one epoch on `base` liquidity
    pub fn maintenance_fee(&self, base: u64, epoch_length: i64) -> Result<u64> {
        let epoch_length =
            u128::try_from(epoch_length).map_err(|_| error!(VaultError::InvalidEpochParams))?;
        let numerator = (base as u128)
            .checked_mul(self.annual_maintenance_fee as u128)
            .ok_or(error!(VaultError::MathOverflow))?;
        let fee = mul_div(
            numerator,
            epoch_length,
            SECONDS_PER_YEAR as u128 * BASE,
            Rounding::Down,
        )?;
        to_u64(fee)
    }

    /// Closes the current epoch.
    ///
    /// Order: realize PnL against the vault balance, charge the profit fee,
    /// charge the maintenance fee on pre-settlement liquidity, snapshot the
    /// share price, advance the epoch clock, then settle the epoch's
    /// scheduled flows at that price.
    ///
    /// Everything is computed on copies and committed at the end, so an
    /// error leaves accounting, lifecycle and staking untouched.
    pub fn rebalance(
        &mut self,
        registry: &Registry,
        lifecycle: &mut Lifecycle,
        staking: &mut Staking,
        request: &RebalanceRequest,
    ) -> Result<RebalanceOutcome> {
        // CHECKS
        registry.only_strategy(&request.caller)?;
        require!(
            lifecycle.can_rebalance(request.now),
            VaultError::RebalanceTooEarly
        );

        let mut liquidity = self.total_liquidity;
        let mut fees = self.accumulated_fees;
        let net_balance = self.net_vault_balance(request.vault_balance);

        // Realized PnL of the epoch
        let (profit, loss) = if net_balance > liquidity {
            (net_balance - liquidity, 0)
        } else {
            (0, liquidity - net_balance)
        };
        let fee_base = liquidity - loss;

        let profit_fee = to_u64(mul_div(
            profit as u128,
            self.immediate_profit_fee as u128,
            BASE,
            Rounding::Down,
        )?)?;
        liquidity = checked_add(fee_base, profit - profit_fee)?;
        fees = checked_add(fees, profit_fee)?;

        let maintenance_fee = self
            .maintenance_fee(fee_base, lifecycle.epoch_length())?
            .min(liquidity);
        liquidity -= maintenance_fee;
        fees = checked_add(fees, maintenance_fee)?;

        // Price for everything queued during the closing epoch
        let share_price = Staking::share_price(staking.total_shares, liquidity)?;
        let closed_epoch = lifecycle.epoch_id;

        let mut next_lifecycle = lifecycle.clone();
        next_lifecycle.progress_epoch(&request.accounting_key, registry, request.now)?;

        let settlement = staking.plan_settlement(share_price)?;

        // Assets reserved for claims leave the vault in this same instruction,
        // after the escrowed deposits have moved in.
        let vault_after_deposits =
            checked_add(request.vault_balance, settlement.deposited_assets)?;
        require!(
            settlement.reserved_assets <= vault_after_deposits.saturating_sub(fees),
            VaultError::InsufficientLiquidity
        );
        liquidity = checked_sub(
            checked_add(liquidity, settlement.deposited_assets)?,
            settlement.reserved_assets,
        )?;

        // EFFECTS
        self.total_liquidity = liquidity;
        self.accumulated_fees = fees;
        *lifecycle = next_lifecycle;
        staking.apply_settlement(&settlement);

        Ok(RebalanceOutcome {
            closed_epoch,
            profit,
            loss,
            profit_fee,
            maintenance_fee,
            settlement,
        })
    }

    /// Validates a rage quit token list: the underlying plus every held
    /// position, strictly ascending.
    pub fn validate_position_list(&self, tokens: &[Pubkey]) -> Result<()> {
        for (i, token) in tokens.iter().enumerate() {
            require!(
                *token == self.underlying_mint || self.has_position(token),
                VaultError::UnregisteredPosition
            );
            if i > 0 {
                require!(tokens[i - 1] < *token, VaultError::UnsortedOrDuplicate);
            }
        }
        require!(
            tokens.len() == self.holding_positions.len() + 1,
            VaultError::IncompletePositionList
        );
        Ok(())
    }
}
