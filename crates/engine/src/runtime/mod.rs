mod engine;
mod host;
mod watchdog;

pub use engine::{MovementEngine, OpenIntent};
pub use host::{FrameHost, FrameRequestId, ManualFrameHost, TimerId, TimerKind};
pub use watchdog::LocalWalkWatchdog;
