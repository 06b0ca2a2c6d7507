use anchor_lang::prelude::*;

use crate::{constants::MAX_STRATEGIES, errors::VaultError};

/// Module addresses wired into the registry
///
/// All four are set together; a pool with a partially wired registry
/// cannot be observed.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryAddresses {
    pub accounting: Pubkey,
    pub lifecycle: Pubkey,
    pub staking: Pubkey,
    pub strategy: Pubkey,
}

impl RegistryAddresses {
    pub fn validate(&self) -> Result<()> {
        require!(
            self.accounting != Pubkey::default(),
            VaultError::MissingAccountingModule
        );
        require!(
            self.lifecycle != Pubkey::default(),
            VaultError::MissingLifecycleModule
        );
        require!(
            self.staking != Pubkey::default(),
            VaultError::MissingStakingModule
        );
        require!(
            self.strategy != Pubkey::default(),
            VaultError::MissingStrategyModule
        );
        Ok(())
    }

    pub fn is_wired(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Pool-wide directory of modules and privileged identities
///
/// Security considerations:
/// - Owner stored in state (not instruction args)
/// - Module identities are compared by address on every gated call
/// - Bumps stored for efficient PDA signing
#[account]
pub struct Registry {
    /// Pool owner: wires modules, manages strategies and configuration
    pub authority: Pubkey,

    /// Mint of the underlying asset
    pub underlying_mint: Pubkey,

    /// Vault authority PDA that owns pool liquidity and positions
    pub vault: Pubkey,

    /// Wired module addresses
    pub addresses: RegistryAddresses,

    /// Strategies enabled in addition to `addresses.strategy`
    pub enabled_strategies: Vec<Pubkey>,

    pub initialized: bool,

    pub bump: u8,

    pub vault_authority_bump: u8,

    pub escrow_authority_bump: u8,

    pub _reserved: [u8; 64],
}

impl Registry {
    pub fn init(
        &mut self,
        authority: Pubkey,
        underlying_mint: Pubkey,
        vault: Pubkey,
        bumps: [u8; 3],
    ) -> Result<()> {
        require!(!self.initialized, VaultError::AlreadyInitialized);

        self.authority = authority;
        self.underlying_mint = underlying_mint;
        self.vault = vault;
        self.addresses = RegistryAddresses::default();
        self.enabled_strategies = Vec::new();
        self.bump = bumps[0];
        self.vault_authority_bump = bumps[1];
        self.escrow_authority_bump = bumps[2];
        self._reserved = [0; 64];
        self.initialized = true;
        Ok(())
    }

    pub fn registry_addresses(&self) -> RegistryAddresses {
        self.addresses
    }

    /// Atomically replaces all module addresses
    pub fn set_registry_addresses(
        &mut self,
        caller: &Pubkey,
        addresses: RegistryAddresses,
    ) -> Result<()> {
        self.only_owner(caller)?;
        addresses.validate()?;
        self.addresses = addresses;
        Ok(())
    }

    pub fn enable_strategy(&mut self, caller: &Pubkey, strategy: Pubkey) -> Result<()> {
        self.only_owner(caller)?;
        require!(
            strategy != Pubkey::default(),
            VaultError::MissingStrategyModule
        );
        require!(
            !self.is_strategy_enabled(&strategy),
            VaultError::StrategyAlreadyEnabled
        );
        require!(
            self.enabled_strategies.len() < MAX_STRATEGIES,
            VaultError::TooManyStrategies
        );
        self.enabled_strategies.push(strategy);
        Ok(())
    }

    pub fn disable_strategy(&mut self, caller: &Pubkey, strategy: &Pubkey) -> Result<()> {
        self.only_owner(caller)?;
        let index = self
            .enabled_strategies
            .iter()
            .position(|s| s == strategy)
            .ok_or(error!(VaultError::StrategyNotFound))?;
        self.enabled_strategies.swap_remove(index);
        Ok(())
    }

    /// The registered strategy is always enabled
    pub fn is_strategy_enabled(&self, strategy: &Pubkey) -> bool {
        *strategy != Pubkey::default()
            && (*strategy == self.addresses.strategy || self.enabled_strategies.contains(strategy))
    }

    pub fn only_owner(&self, caller: &Pubkey) -> Result<()> {
        require_keys_eq!(*caller, self.authority, VaultError::Unauthorized);
        Ok(())
    }

    pub fn only_wired(&self) -> Result<()> {
        require!(self.addresses.is_wired(), VaultError::RegistryNotWired);
        Ok(())
    }

    pub fn only_accounting(&self, caller: &Pubkey) -> Result<()> {
        self.only_wired()?;
        require_keys_eq!(
            *caller,
            self.addresses.accounting,
            VaultError::NotAccountingModule
        );
        Ok(())
    }

    pub fn only_staking(&self, caller: &Pubkey) -> Result<()> {
        self.only_wired()?;
        require_keys_eq!(
            *caller,
            self.addresses.staking,
            VaultError::NotStakingModule
        );
        Ok(())
    }

    pub fn only_strategy(&self, caller: &Pubkey) -> Result<()> {
        self.only_wired()?;
        require!(
            self.is_strategy_enabled(caller),
            VaultError::StrategyNotEnabled
        );
        Ok(())
    }

    /// Owner and enabled strategies may act through the vault executor
    pub fn only_vault_executor(&self, caller: &Pubkey) -> Result<()> {
        if *caller == self.authority {
            return Ok(());
        }
        self.only_strategy(caller)
    }
}
