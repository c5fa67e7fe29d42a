mod clock;
pub mod driver;
mod engine;
mod phase;
mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{TimerDriver, TimerHandle, DEFAULT_TICK_INTERVAL};
pub use engine::{remaining_at, TimerContext, TimerEngine};
pub use phase::{next_phase, Phase};
pub use snapshot::TimerSnapshot;
