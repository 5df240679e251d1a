use super::registry::{Key, StorageInner, Value};
use super::BindOptions;
use crate::store::{Action, IntoAction, SetterId, Store};
use std::sync::Weak;

/// A consumer's attachment to one key.
///
/// A binding is what a UI layer holds for the lifetime of a mounted
/// component: it reads the authoritative value, registers the component's
/// refresh callback, and writes back. Dropping it unsubscribes and, when
/// [`BindOptions::unload`](BindOptions#structfield.unload) is set, evicts the key from storage.
///
/// # Examples
///
/// ```
/// use keystate::{BindOptions, Storage};
/// use std::sync::{Arc, Mutex};
///
/// let storage: Storage = Storage::new();
/// let mut counter = storage.bind("count".to_string(), 0, BindOptions::default()).unwrap();
///
/// let rendered = Arc::new(Mutex::new(Vec::new()));
/// let rendered_clone = rendered.clone();
/// counter.subscribe(move |value: &i32| rendered_clone.lock().unwrap().push(*value));
///
/// counter.update(|n| n + 1);
/// counter.update(|n| n + 1);
/// assert_eq!(*rendered.lock().unwrap(), vec![1, 2]);
///
/// drop(counter);
/// assert!(!storage.contains("count"));
/// ```
pub struct Binding<K: Key, S: Value> {
    key: K,
    store: Store<S>,
    setter: Option<SetterId>,
    options: BindOptions,
    storage: Weak<StorageInner<K>>,
}

impl<K: Key, S: Value> Binding<K, S> {
    pub(crate) fn new(
        key: K,
        store: Store<S>,
        options: BindOptions,
        storage: Weak<StorageInner<K>>,
    ) -> Self {
        Self {
            key,
            store,
            setter: None,
            options,
            storage,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn options(&self) -> BindOptions {
        self.options
    }

    /// The store this binding joined.
    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    /// Current authoritative value.
    pub fn get(&self) -> S {
        self.store.get_state()
    }

    /// Register `refresh` to run on every write to this key.
    ///
    /// Registration is synchronous, so a write racing with mount can't be
    /// missed. Announces the key on the init channel. Subscribing again
    /// replaces the previous callback.
    pub fn subscribe<F>(&mut self, refresh: F)
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.unsubscribe();
        self.setter = Some(self.store.setters().push(refresh));
        tracing::debug!(key = ?self.key, "binding subscribed");
        if let Some(storage) = self.storage.upgrade() {
            storage.events().emit_store_init(&self.key);
        }
    }

    /// Remove the refresh callback. Calling this again is a no-op.
    pub fn unsubscribe(&mut self) -> bool {
        match self.setter.take() {
            Some(id) => self.store.setters().remove(id),
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.setter.is_some()
    }

    pub fn set_state(&self, action: impl IntoAction<State = S>) -> S {
        self.dispatcher().dispatch(action)
    }

    pub fn set(&self, value: S) {
        self.set_state(Action::Value(value));
    }

    /// Apply `f` to the current value, not the value last seen by this binding.
    pub fn update<F>(&self, f: F) -> S
    where
        F: FnOnce(&S) -> S + Send + 'static,
    {
        self.set_state(Action::update(f))
    }

    /// A detached write handle for this key.
    pub fn dispatcher(&self) -> Dispatch<K, S> {
        Dispatch {
            key: self.key.clone(),
            store: self.store.clone(),
            storage: Weak::clone(&self.storage),
        }
    }
}

impl<K: Key, S: Value> Drop for Binding<K, S> {
    fn drop(&mut self) {
        self.unsubscribe();
        if !self.options.unload {
            return;
        }
        if let Some(storage) = self.storage.upgrade() {
            storage.remove(&self.key);
        }
    }
}

impl<K: Key, S: Value + std::fmt::Debug> std::fmt::Debug for Binding<K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("store", &self.store)
            .field("subscribed", &self.is_subscribed())
            .field("options", &self.options)
            .finish()
    }
}

/// Cloneable write handle for one key.
///
/// Writes go to the store the binding joined, even after the key has been
/// evicted from storage.
pub struct Dispatch<K: Key, S: Value> {
    key: K,
    store: Store<S>,
    storage: Weak<StorageInner<K>>,
}

impl<K: Key, S: Value> Dispatch<K, S> {
    /// Apply a write and announce it on the update channel.
    pub fn dispatch(&self, action: impl IntoAction<State = S>) -> S {
        let next = self.store.set_state(action);
        if let Some(storage) = self.storage.upgrade() {
            storage.events().emit_store_update(&self.key);
        }
        next
    }
}

impl<K: Key, S: Value> Clone for Dispatch<K, S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            store: self.store.clone(),
            storage: Weak::clone(&self.storage),
        }
    }
}
