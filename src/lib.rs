//! # Keystate
//!
//! Key-addressed shared state with subscriber fan-out.
//!
//! Independent UI components share state by naming it: every consumer that
//! binds the same key joins the same [`Store`], and every write to that key
//! is pushed synchronously to every subscribed consumer.
//!
//! ## Store (the state cell)
//!
//! - `Store<T>` - one authoritative value plus its ordered setter list
//! - `Action<T>` - a replacement value or an updater applied to the current value
//!
//! ## Storage (the registry)
//!
//! - `Storage<K>` - key to store mapping, first write wins
//! - `Binding` - a consumer's bind/subscribe/unsubscribe/unload lifecycle
//! - `mutate` / `get_state` - access from outside any consumer
//!
//! ## Observation
//!
//! - `Emitter<P>` - named-channel publish/subscribe for lifecycle events
//! - `Devtools` - passive inspector over those events
//!
//! ```
//! use keystate::{BindOptions, Storage};
//!
//! let storage: Storage = Storage::new();
//! storage.mutate("COUNTER".to_string(), 520).unwrap();
//!
//! let counter = storage.bind("COUNTER".to_string(), 0, BindOptions::default()).unwrap();
//! assert_eq!(counter.get(), 520);
//! ```

pub mod devtools;
pub mod emitter;
mod error;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use devtools::Devtools;
pub use emitter::{Emitter, HandlerId, STORE_INIT, STORE_UPDATE};
pub use error::{Error, Result};
pub use storage::{get_state, mutate, BindOptions, Binding, Dispatch, Key, Storage, Value};
pub use store::{Action, IntoAction, SetterId, Setters, Store};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        // Basic smoke test
        let storage: Storage = Storage::new();
        let binding = storage
            .bind("smoke".to_string(), 0, BindOptions::default())
            .unwrap();
        assert_eq!(binding.get(), 0);
        binding.set(42);
        assert_eq!(binding.get(), 42);
    }
}
