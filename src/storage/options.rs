use serde::{Deserialize, Serialize};

/// Per-binding configuration.
///
/// Deserializes from host configuration with missing fields defaulted:
///
/// ```
/// use keystate::BindOptions;
///
/// let options: BindOptions = serde_json::from_str("{}").unwrap();
/// assert!(options.unload);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindOptions {
    /// Evict the key from storage when the binding is dropped.
    ///
    /// Eviction is unconditional: sibling bindings on the same key keep
    /// their store handle but the key is gone from the registry.
    pub unload: bool,
}

impl BindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unload(mut self, unload: bool) -> Self {
        self.unload = unload;
        self
    }

    /// Options that keep the key registered after teardown.
    pub fn retained() -> Self {
        Self { unload: false }
    }
}

impl Default for BindOptions {
    fn default() -> Self {
        Self { unload: true }
    }
}
