//! Observer channel for store lifecycle events.
//!
//! Kept apart from each store's setter list so inspectors can watch which
//! keys are in use without becoming store listeners themselves.

mod emitter;

pub use emitter::{Emitter, HandlerId, STORE_INIT, STORE_UPDATE};
