mod emitter;
mod remote;

pub use emitter::{EmitOutcome, Emitter, MotionUpdate, Transport, Urgency};
pub use remote::{FallbackTiming, RemoteAvatar, RemoteAvatars};
