pub mod accounting;
pub mod lens;
pub mod lifecycle;
pub mod registry;
pub mod schedule;
pub mod staking;

pub use accounting::*;
pub use lens::*;
pub use lifecycle::*;
pub use registry::*;
pub use schedule::*;
pub use staking::*;
