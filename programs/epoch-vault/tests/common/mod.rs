//! Simulated pool driving the state engines the way the instruction
//! handlers do, with token balances kept in plain maps instead of an SVM.

#![allow(dead_code)]

use std::collections::HashMap;

use anchor_lang::prelude::*;
use epoch_vault::{
    constants::*,
    state::{
        Accounting, EpochParams, EpochSharePrice, Lifecycle, PoolEnv, RebalanceOutcome,
        RebalanceRequest, Registry, RegistryAddresses, StakerSchedule, Staking,
    },
};

pub const EPOCH_LENGTH: i64 = 7 * 24 * 3600;
pub const STAKING_LENGTH: i64 = 4 * 3600;
pub const TRADING_LENGTH: i64 = 2 * 24 * 3600;
pub const START: i64 = 1_700_000_000;

/// One token with 9 decimals
pub const UNIT: u64 = 1_000_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum At {
    Staking,
    Trading,
    Idle,
    EpochEnd,
}

pub struct SimulatedPool {
    pub owner: Pubkey,
    pub strategy: Pubkey,
    pub fee_collector: Pubkey,
    pub underlying_mint: Pubkey,
    pub addresses: RegistryAddresses,

    pub registry: Registry,
    pub lifecycle: Lifecycle,
    pub accounting: Accounting,
    pub staking: Staking,

    pub now: i64,

    /// Underlying held by the vault token account
    pub vault_balance: u64,
    /// Position balances held by the vault authority
    pub vault_positions: HashMap<Pubkey, u64>,
    pub escrow_assets: u64,
    pub escrow_shares: u64,
    /// Underlying the strategy currently has deployed
    pub deployed: u64,

    pub wallets: HashMap<Pubkey, u64>,
    pub shares: HashMap<Pubkey, u64>,
    pub schedules: HashMap<Pubkey, StakerSchedule>,
    pub prices: HashMap<u64, EpochSharePrice>,
}

fn pda(seed: &[u8], key: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[seed, key.as_ref()], &epoch_vault::ID)
}

pub fn epoch_params() -> EpochParams {
    EpochParams {
        epoch_length: EPOCH_LENGTH,
        staking_phase_length: STAKING_LENGTH,
        trading_phase_length: TRADING_LENGTH,
    }
}

impl SimulatedPool {
    /// Both construction steps, with the fee collector configured
    pub fn new() -> Self {
        let owner = Pubkey::new_unique();
        let strategy = Pubkey::new_unique();
        let fee_collector = Pubkey::new_unique();
        let underlying_mint = Pubkey::new_unique();

        let (registry_key, registry_bump) = pda(REGISTRY_SEED, &underlying_mint);
        let (lifecycle_key, lifecycle_bump) = pda(LIFECYCLE_SEED, &registry_key);
        let (accounting_key, accounting_bump) = pda(ACCOUNTING_SEED, &registry_key);
        let (staking_key, staking_bump) = pda(STAKING_SEED, &registry_key);
        let (share_mint, _) = pda(SHARE_MINT_SEED, &registry_key);
        let (vault_authority, vault_bump) = pda(VAULT_AUTHORITY_SEED, &registry_key);
        let (_, escrow_bump) = pda(ESCROW_AUTHORITY_SEED, &registry_key);

        let addresses = RegistryAddresses {
            accounting: accounting_key,
            lifecycle: lifecycle_key,
            staking: staking_key,
            strategy,
        };

        let mut registry = Registry {
            authority: Pubkey::default(),
            underlying_mint: Pubkey::default(),
            vault: Pubkey::default(),
            addresses: RegistryAddresses::default(),
            enabled_strategies: Vec::new(),
            initialized: false,
            bump: 0,
            vault_authority_bump: 0,
            escrow_authority_bump: 0,
            _reserved: [0; 64],
        };
        registry
            .init(
                owner,
                underlying_mint,
                vault_authority,
                [registry_bump, vault_bump, escrow_bump],
            )
            .unwrap();
        registry.set_registry_addresses(&owner, addresses).unwrap();

        let mut lifecycle = Lifecycle {
            registry: Pubkey::default(),
            epoch_id: 0,
            current_epoch_start: 0,
            params: EpochParams::default(),
            initialized: false,
            bump: 0,
            _reserved: [0; 64],
        };
        lifecycle
            .init(registry_key, START, epoch_params(), lifecycle_bump)
            .unwrap();

        let mut accounting = Accounting {
            registry: Pubkey::default(),
            underlying_mint: Pubkey::default(),
            total_liquidity: 0,
            accumulated_fees: 0,
            fee_collector: Pubkey::default(),
            immediate_profit_fee: 0,
            annual_maintenance_fee: 0,
            holding_positions: Vec::new(),
            initialized: false,
            bump: 0,
            _reserved: [0; 64],
        };
        accounting
            .init(registry_key, underlying_mint, fee_collector, accounting_bump)
            .unwrap();

        let mut staking = Staking {
            registry: Pubkey::default(),
            share_mint: Pubkey::default(),
            total_shares: 0,
            total_scheduled_deposits: 0,
            total_scheduled_withdrawals: 0,
            initialized: false,
            bump: 0,
            _reserved: [0; 64],
        };
        staking.init(registry_key, share_mint, staking_bump).unwrap();

        SimulatedPool {
            owner,
            strategy,
            fee_collector,
            underlying_mint,
            addresses,
            registry,
            lifecycle,
            accounting,
            staking,
            now: START,
            vault_balance: 0,
            vault_positions: HashMap::new(),
            escrow_assets: 0,
            escrow_shares: 0,
            deployed: 0,
            wallets: HashMap::new(),
            shares: HashMap::new(),
            schedules: HashMap::new(),
            prices: HashMap::new(),
        }
    }

    pub fn user(&mut self, underlying: u64) -> Pubkey {
        let user = Pubkey::new_unique();
        self.wallets.insert(user, underlying);
        user
    }

    pub fn wallet(&self, user: &Pubkey) -> u64 {
        self.wallets.get(user).copied().unwrap_or(0)
    }

    pub fn shares_of(&self, user: &Pubkey) -> u64 {
        self.shares.get(user).copied().unwrap_or(0)
    }

    pub fn warp(&mut self, at: At) {
        let start = self.lifecycle.current_epoch_start();
        self.now = match at {
            At::Staking => start,
            At::Trading => start + STAKING_LENGTH,
            At::Idle => start + STAKING_LENGTH + TRADING_LENGTH,
            At::EpochEnd => self.lifecycle.current_epoch_end(),
        };
    }

    // ---------------------------------------------------------------------
    // Immediate flows
    // ---------------------------------------------------------------------

    pub fn deposit(&mut self, user: Pubkey, assets: u64) -> Result<u64> {
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        let shares = self.staking.deposit(&env, &mut self.accounting, assets)?;
        *self.wallets.entry(user).or_default() -= assets;
        self.vault_balance += assets;
        *self.shares.entry(user).or_default() += shares;
        Ok(shares)
    }

    pub fn mint(&mut self, user: Pubkey, shares: u64) -> Result<u64> {
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        let assets = self.staking.mint(&env, &mut self.accounting, shares)?;
        *self.wallets.entry(user).or_default() -= assets;
        self.vault_balance += assets;
        *self.shares.entry(user).or_default() += shares;
        Ok(assets)
    }

    pub fn withdraw(&mut self, user: Pubkey, assets: u64) -> Result<u64> {
        let owner_shares = self.shares_of(&user);
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        let shares = self.staking.withdraw(
            &env,
            &mut self.accounting,
            assets,
            owner_shares,
            self.vault_balance,
        )?;
        *self.shares.entry(user).or_default() -= shares;
        self.vault_balance -= assets;
        *self.wallets.entry(user).or_default() += assets;
        Ok(shares)
    }

    pub fn redeem(&mut self, user: Pubkey, shares: u64) -> Result<u64> {
        let owner_shares = self.shares_of(&user);
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        let assets = self.staking.redeem(
            &env,
            &mut self.accounting,
            shares,
            owner_shares,
            self.vault_balance,
        )?;
        *self.shares.entry(user).or_default() -= shares;
        self.vault_balance -= assets;
        *self.wallets.entry(user).or_default() += assets;
        Ok(assets)
    }

    // ---------------------------------------------------------------------
    // Scheduled flows
    // ---------------------------------------------------------------------

    fn blank_schedule(&self, owner: Pubkey) -> StakerSchedule {
        StakerSchedule {
            staking: self.addresses.staking,
            owner,
            deposit: Default::default(),
            withdrawal: Default::default(),
            bump: 0,
        }
    }

    pub fn schedule_deposit(&mut self, user: Pubkey, assets: u64) -> Result<()> {
        let blank = self.blank_schedule(user);
        let schedule = self.schedules.entry(user).or_insert(blank);
        let price = schedule
            .pending_epoch(self.lifecycle.epoch_id)
            .and_then(|epoch| self.prices.get(&epoch));
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        if self.staking.schedule_deposit(&env, schedule, price, assets)? {
            *self.wallets.entry(user).or_default() -= assets;
            self.escrow_assets += assets;
        }
        Ok(())
    }

    pub fn unschedule_deposit(&mut self, user: Pubkey, assets: u64) -> Result<()> {
        let blank = self.blank_schedule(user);
        let schedule = self.schedules.entry(user).or_insert(blank);
        let price = schedule
            .pending_epoch(self.lifecycle.epoch_id)
            .and_then(|epoch| self.prices.get(&epoch));
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        if self.staking.unschedule_deposit(&env, schedule, price, assets)? {
            self.escrow_assets -= assets;
            *self.wallets.entry(user).or_default() += assets;
        }
        Ok(())
    }

    pub fn claim_shares(&mut self, user: Pubkey, shares: u64, claim_all: bool) -> Result<u64> {
        let blank = self.blank_schedule(user);
        let schedule = self.schedules.entry(user).or_insert(blank);
        let price = schedule
            .pending_epoch(self.lifecycle.epoch_id)
            .and_then(|epoch| self.prices.get(&epoch));
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        let claimed = self
            .staking
            .claim_scheduled_shares(&env, schedule, price, shares, claim_all)?;
        self.escrow_shares -= claimed;
        *self.shares.entry(user).or_default() += claimed;
        Ok(claimed)
    }

    pub fn schedule_withdrawal(&mut self, user: Pubkey, shares: u64) -> Result<()> {
        let owner_shares = self.shares_of(&user);
        let blank = self.blank_schedule(user);
        let schedule = self.schedules.entry(user).or_insert(blank);
        let price = schedule
            .pending_epoch(self.lifecycle.epoch_id)
            .and_then(|epoch| self.prices.get(&epoch));
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        if self
            .staking
            .schedule_withdrawal(&env, schedule, price, shares, owner_shares)?
        {
            *self.shares.entry(user).or_default() -= shares;
            self.escrow_shares += shares;
        }
        Ok(())
    }

    pub fn unschedule_withdrawal(&mut self, user: Pubkey, shares: u64) -> Result<()> {
        let blank = self.blank_schedule(user);
        let schedule = self.schedules.entry(user).or_insert(blank);
        let price = schedule
            .pending_epoch(self.lifecycle.epoch_id)
            .and_then(|epoch| self.prices.get(&epoch));
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        if self
            .staking
            .unschedule_withdrawal(&env, schedule, price, shares)?
        {
            self.escrow_shares -= shares;
            *self.shares.entry(user).or_default() += shares;
        }
        Ok(())
    }

    pub fn claim_assets(&mut self, user: Pubkey, assets: u64, claim_all: bool) -> Result<u64> {
        let blank = self.blank_schedule(user);
        let schedule = self.schedules.entry(user).or_insert(blank);
        let price = schedule
            .pending_epoch(self.lifecycle.epoch_id)
            .and_then(|epoch| self.prices.get(&epoch));
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        let claimed = self
            .staking
            .claim_scheduled_assets(&env, schedule, price, assets, claim_all)?;
        self.escrow_assets -= claimed;
        *self.wallets.entry(user).or_default() += claimed;
        Ok(claimed)
    }

    // ---------------------------------------------------------------------
    // Strategy side
    // ---------------------------------------------------------------------

    /// Underlying leaves the vault through the vault executor
    pub fn deploy(&mut self, amount: u64) {
        self.vault_balance -= amount;
        self.deployed += amount;
    }

    /// Deployed underlying comes back
    pub fn recall(&mut self, amount: u64) {
        self.deployed -= amount;
        self.vault_balance += amount;
    }

    /// Premium or profit arriving in the vault from outside
    pub fn receive(&mut self, amount: u64) {
        self.vault_balance += amount;
    }

    /// Deployed underlying lost for good
    pub fn lose(&mut self, amount: u64) {
        self.deployed -= amount;
    }

    pub fn open_position(&mut self, token: Pubkey, balance: u64) -> Result<()> {
        self.accounting
            .change_holding_position(&self.strategy, &self.registry, token, true)?;
        self.vault_positions.insert(token, balance);
        Ok(())
    }

    pub fn rebalance(&mut self) -> Result<RebalanceOutcome> {
        let caller = self.strategy;
        self.rebalance_as(caller)
    }

    pub fn rebalance_as(&mut self, caller: Pubkey) -> Result<RebalanceOutcome> {
        let request = RebalanceRequest {
            caller,
            accounting_key: self.addresses.accounting,
            vault_balance: self.vault_balance,
            now: self.now,
        };
        let outcome = self.accounting.rebalance(
            &self.registry,
            &mut self.lifecycle,
            &mut self.staking,
            &request,
        )?;

        // The snapshot account is created with `init`
        assert!(!self.prices.contains_key(&outcome.closed_epoch));
        self.prices.insert(
            outcome.closed_epoch,
            EpochSharePrice {
                staking: self.addresses.staking,
                epoch_id: outcome.closed_epoch,
                share_price: outcome.settlement.share_price,
                bump: 0,
            },
        );

        let settlement = outcome.settlement;
        self.escrow_assets -= settlement.deposited_assets;
        self.vault_balance += settlement.deposited_assets;
        self.escrow_shares += settlement.minted_shares;
        self.escrow_shares -= settlement.burned_shares;
        self.vault_balance -= settlement.reserved_assets;
        self.escrow_assets += settlement.reserved_assets;
        Ok(outcome)
    }

    pub fn collect_fees(&mut self, caller: Pubkey) -> Result<u64> {
        let amount = self.accounting.collect_fees(&caller)?;
        self.vault_balance -= amount;
        Ok(amount)
    }

    // ---------------------------------------------------------------------
    // Rage quit
    // ---------------------------------------------------------------------

    /// Underlying plus every held position, ascending
    pub fn held_tokens(&self) -> Vec<Pubkey> {
        let mut tokens = self.accounting.holding_positions.clone();
        tokens.push(self.underlying_mint);
        tokens.sort();
        tokens
    }

    pub fn rage_quit(&mut self, user: Pubkey, shares: u64) -> Result<Vec<(Pubkey, u64)>> {
        let tokens = self.held_tokens();
        self.rage_quit_with(user, shares, tokens)
    }

    pub fn rage_quit_with(
        &mut self,
        user: Pubkey,
        shares: u64,
        tokens: Vec<Pubkey>,
    ) -> Result<Vec<(Pubkey, u64)>> {
        let owner_shares = self.shares_of(&user);
        let balances: Vec<u64> = tokens
            .iter()
            .map(|token| {
                if *token == self.underlying_mint {
                    self.vault_balance
                } else {
                    self.vault_positions.get(token).copied().unwrap_or(0)
                }
            })
            .collect();
        let env = PoolEnv {
            registry: &self.registry,
            lifecycle: &self.lifecycle,
            staking_key: self.addresses.staking,
            now: self.now,
        };
        let payouts = self.staking.rage_quit(
            &env,
            &mut self.accounting,
            shares,
            owner_shares,
            &tokens,
            &balances,
        )?;

        *self.shares.entry(user).or_default() -= shares;
        for (token, amount) in tokens.iter().zip(&payouts) {
            if *token == self.underlying_mint {
                self.vault_balance -= amount;
                *self.wallets.entry(user).or_default() += amount;
            } else if let Some(balance) = self.vault_positions.get_mut(token) {
                *balance -= amount;
            }
        }
        Ok(tokens.into_iter().zip(payouts).collect())
    }

    // ---------------------------------------------------------------------
    // Invariants
    // ---------------------------------------------------------------------

    pub fn user_shares_total(&self) -> u64 {
        self.shares.values().sum::<u64>() + self.escrow_shares
    }

    /// Holds whenever nothing is deployed
    pub fn assert_vault_backs_liquidity(&self) {
        assert_eq!(
            self.vault_balance,
            self.accounting.total_liquidity + self.accounting.accumulated_fees,
            "vault balance must equal liquidity plus fees"
        );
    }

    pub fn assert_share_supply(&self) {
        assert_eq!(
            self.user_shares_total(),
            self.staking.total_shares,
            "share ledger must mirror balances"
        );
    }
}
