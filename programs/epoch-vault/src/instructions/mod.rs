pub mod change_holding_position;
pub mod collect_fees;
pub mod configure_fees;
pub mod deposit;
pub mod execute_on_vault;
pub mod initialize_pool;
pub mod initialize_vault_accounts;
pub mod lens;
pub mod manage_strategy;
pub mod rage_quit;
pub mod rebalance;
pub mod scheduled_deposits;
pub mod scheduled_withdrawals;
pub mod set_epoch_params;
pub mod set_registry_addresses;
pub mod withdraw;

pub use change_holding_position::*;
pub use collect_fees::*;
pub use configure_fees::*;
pub use deposit::*;
pub use execute_on_vault::*;
pub use initialize_pool::*;
pub use initialize_vault_accounts::*;
pub use lens::*;
pub use manage_strategy::*;
pub use rage_quit::*;
pub use rebalance::*;
pub use scheduled_deposits::*;
pub use scheduled_withdrawals::*;
pub use set_epoch_params::*;
pub use set_registry_addresses::*;
pub use withdraw::*;
