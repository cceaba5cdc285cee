// Events module - beat event records and the observer registry
//
// Events are built and delivered within the tick that produced them; nothing
// here queues or stores them.

mod emitter;
mod types;

pub use emitter::{DispatchSnapshot, EventEmitter, SubscriberHandle};
pub use types::{BeatEvent, EventType};
