//! Key-addressed registry of shared stores.
//!
//! [`Storage`] maps keys to stores with first-write-wins seeding. Consumers
//! attach through a [`Binding`]; code outside any consumer writes through
//! [`Storage::mutate`] or the global helpers below.

mod binding;
mod options;
mod registry;

pub use binding::{Binding, Dispatch};
pub use options::BindOptions;
pub use registry::{Key, Storage, Value};

pub(crate) use registry::StorageInner;

use crate::error::Result;
use crate::store::IntoAction;

/// Write to `key` in the process-wide storage.
///
/// ```
/// keystate::mutate("greeting", "hello").unwrap();
/// assert_eq!(keystate::get_state::<&str>("greeting"), Some("hello"));
/// ```
pub fn mutate<A>(key: impl Into<String>, action: A) -> Result<()>
where
    A: IntoAction,
    A::State: Value,
{
    Storage::global().mutate(key.into(), action)
}

/// Read `key` from the process-wide storage.
pub fn get_state<S: Value>(key: &str) -> Option<S> {
    Storage::global().get_state::<S, str>(key)
}
