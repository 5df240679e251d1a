use super::{BindOptions, Binding};
use crate::emitter::Emitter;
use crate::error::{Error, Result};
use crate::store::{IntoAction, Store};
use parking_lot::Mutex;
use std::any::Any;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, OnceLock, Weak};

/// Anything usable as a storage key.
pub trait Key: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<K> Key for K where K: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Anything a store can hold.
pub trait Value: Clone + Send + Sync + 'static {}

impl<S> Value for S where S: Clone + Send + Sync + 'static {}

type Entry = Box<dyn Any + Send + Sync>;

/// Shared registry state behind a [`Storage`] handle.
pub(crate) struct StorageInner<K> {
    stores: Mutex<HashMap<K, Entry>>,
    events: Emitter<K>,
}

impl<K: Key> StorageInner<K> {
    pub(crate) fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let removed = self.stores.lock().remove(key).is_some();
        if removed {
            tracing::debug!(?key, "store evicted");
        }
        removed
    }

    pub(crate) fn events(&self) -> &Emitter<K> {
        &self.events
    }
}

/// Registry mapping keys to shared [`Store`]s.
///
/// Each key holds at most one store and the first store registered for a key
/// wins: later attempts to seed the same key join the existing state. A
/// storage is a cheap handle; clones share the same registry.
///
/// # Examples
///
/// Using an isolated registry:
///
/// ```
/// use keystate::{BindOptions, Storage};
///
/// let storage: Storage = Storage::new();
/// let first = storage.bind("theme".to_string(), "dark", BindOptions::retained()).unwrap();
/// let second = storage.bind("theme".to_string(), "light", BindOptions::retained()).unwrap();
///
/// assert_eq!(first.get(), "dark");
/// assert_eq!(second.get(), "dark");
/// ```
///
/// Using the process-wide registry:
///
/// ```
/// use keystate::Storage;
///
/// Storage::global().mutate("visits".to_string(), 1u32).unwrap();
/// assert_eq!(Storage::global().get_state::<u32, _>("visits"), Some(1));
/// ```
pub struct Storage<K = String> {
    inner: Arc<StorageInner<K>>,
}

impl Storage<String> {
    /// Get or create the process-wide registry.
    ///
    /// Prefer explicit instances from [`Storage::new`] where isolation
    /// matters, for example between tests.
    pub fn global() -> Self {
        static STORAGE: OnceLock<Storage<String>> = OnceLock::new();
        STORAGE.get_or_init(Storage::new).clone()
    }
}

impl<K: Key> Storage<K> {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StorageInner {
                stores: Mutex::new(HashMap::new()),
                events: Emitter::new(),
            }),
        }
    }

    /// Look up the store for `key` without creating one.
    ///
    /// Returns `None` if the key is absent or holds another value type.
    pub fn get<S, Q>(&self, key: &Q) -> Option<Store<S>>
    where
        S: Value,
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.try_get(key).ok()
    }

    /// Look up the store for `key`, reporting why it is unavailable.
    pub fn try_get<S, Q>(&self, key: &Q) -> Result<Store<S>>
    where
        S: Value,
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let stores = self.inner.stores.lock();
        let entry = stores.get(key).ok_or_else(|| Error::not_found(&key))?;
        downcast(key, entry)
    }

    /// Register `store` under `key` unless the key already has a store.
    ///
    /// Returns whether the store was inserted.
    pub fn set<S: Value>(&self, key: K, store: Store<S>) -> bool {
        let mut stores = self.inner.stores.lock();
        if stores.contains_key(&key) {
            tracing::debug!(?key, "key already initialized, keeping existing store");
            return false;
        }
        tracing::debug!(?key, "store registered");
        stores.insert(key, Box::new(store));
        true
    }

    /// Return the store for `key`, creating it from `init` if absent.
    ///
    /// `init` runs without the registry lock held. Insertion re-checks the
    /// key under the lock, so concurrent callers racing on a fresh key all
    /// end up with the same store and only the first seed is kept.
    pub fn get_or_insert_with<S, F>(&self, key: K, init: F) -> Result<Store<S>>
    where
        S: Value,
        F: FnOnce() -> S,
    {
        if let Some(entry) = self.inner.stores.lock().get(&key) {
            return downcast(&key, entry);
        }
        let seeded = Store::new(init());
        let mut stores = self.inner.stores.lock();
        if let Some(entry) = stores.get(&key) {
            tracing::debug!(?key, "key initialized concurrently, joining existing store");
            return downcast(&key, entry);
        }
        tracing::debug!(?key, "store created");
        stores.insert(key, Box::new(seeded.clone()));
        Ok(seeded)
    }

    /// Drop the store for `key`, along with its setter list.
    ///
    /// Handles already held elsewhere keep working but are detached from the
    /// registry. Removing an absent key is a no-op.
    pub fn remove<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.inner.remove(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.stores.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.stores.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.stores.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<K> {
        self.inner.stores.lock().keys().cloned().collect()
    }

    /// Lifecycle channel for inspectors.
    pub fn events(&self) -> &Emitter<K> {
        &self.inner.events
    }

    pub(crate) fn downgrade(&self) -> Weak<StorageInner<K>> {
        Arc::downgrade(&self.inner)
    }

    /// Attach a consumer to `key`, seeding it with `initial` if it is new.
    ///
    /// The returned binding reports the authoritative value, which is
    /// `initial` only if no store existed for the key yet.
    pub fn bind<S: Value>(
        &self,
        key: K,
        initial: S,
        options: BindOptions,
    ) -> Result<Binding<K, S>> {
        let store = self.get_or_insert_with(key.clone(), || initial)?;
        Ok(Binding::new(key, store, options, self.downgrade()))
    }

    /// Like [`bind`](Self::bind), seeding new keys with `S::default()`.
    pub fn bind_default<S>(&self, key: K, options: BindOptions) -> Result<Binding<K, S>>
    where
        S: Value + Default,
    {
        let store = self.get_or_insert_with(key.clone(), S::default)?;
        Ok(Binding::new(key, store, options, self.downgrade()))
    }

    /// Write to `key` from outside any binding.
    ///
    /// A direct value seeds the key if it has no store yet, so consumers
    /// binding later observe it. An updater on an absent key has nothing to
    /// apply to and is ignored.
    pub fn mutate<A>(&self, key: K, action: A) -> Result<()>
    where
        A: IntoAction,
        A::State: Value,
    {
        let action = action.into_action();
        let store = {
            let mut stores = self.inner.stores.lock();
            match stores.get(&key) {
                Some(entry) => downcast::<A::State, K>(&key, entry)?,
                None => {
                    match action.into_value() {
                        Some(value) => {
                            tracing::debug!(?key, "store seeded by mutate");
                            stores.insert(key, Box::new(Store::new(value)));
                        }
                        None => tracing::debug!(?key, "updater on absent key ignored"),
                    }
                    return Ok(());
                }
            }
        };
        store.set_state(action);
        self.inner.events.emit_store_update(&key);
        Ok(())
    }

    /// Read the current value for `key` from outside any binding.
    pub fn get_state<S, Q>(&self, key: &Q) -> Option<S>
    where
        S: Value,
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.get::<S, Q>(key).map(|store| store.get_state())
    }
}

fn downcast<S: Value, Q: Debug + ?Sized>(key: &Q, entry: &Entry) -> Result<Store<S>> {
    match entry.downcast_ref::<Store<S>>() {
        Some(store) => Ok(store.clone()),
        None => {
            tracing::warn!(?key, expected = std::any::type_name::<S>(), "store type mismatch");
            Err(Error::type_mismatch::<S>(&key))
        }
    }
}

impl<K> Clone for Storage<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: Key> Default for Storage<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key> Debug for Storage<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("keys", &self.keys()).finish()
    }
}
