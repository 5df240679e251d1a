//! Shared state cells.
//!
//! A [`Store`] holds one value and the ordered list of [`Setters`] that are
//! notified, synchronously and in registration order, on every write.

mod action;
mod setters;
mod store;

pub use action::{Action, IntoAction};
pub use setters::{SetterId, Setters};
pub use store::Store;
