pub mod balance_delta;
pub mod fees;
pub mod key;
pub mod position;
pub mod state;
pub mod swap;
pub mod tick;

pub use balance_delta::BalanceDelta;
pub use fees::ProtocolFee;
pub use key::{Currency, PoolId, PoolKey};
pub use position::{Position, PositionKey};
pub use state::{ModifyLiquidityParams, PoolState, Slot0};
pub use swap::{SwapOutcome, SwapParams};
pub use tick::TickInfo;
