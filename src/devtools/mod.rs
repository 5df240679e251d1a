//! Passive inspection of store activity.

mod inspector;

pub use inspector::Devtools;
