use crate::emitter::{HandlerId, STORE_INIT, STORE_UPDATE};
use crate::storage::{Key, Storage, StorageInner};
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct KeyActivity {
    mounts: usize,
    updates: usize,
}

/// Read-only inspector for a [`Storage`].
///
/// Listens on the init and update channels, counts activity per key, and
/// logs every event. It never registers as a store listener and never
/// writes. Events emitted before [`Devtools::init`] are not replayed.
///
/// ```
/// use keystate::{BindOptions, Devtools, Storage};
///
/// let storage: Storage = Storage::new();
/// let devtools = Devtools::init(&storage);
///
/// let mut binding = storage
///     .bind("todos".to_string(), Vec::<String>::new(), BindOptions::default())
///     .unwrap();
/// binding.subscribe(|_| {});
/// binding.update(|todos| {
///     let mut todos = todos.clone();
///     todos.push("ship it".into());
///     todos
/// });
///
/// assert_eq!(devtools.mount_count("todos"), 1);
/// assert_eq!(devtools.update_count("todos"), 1);
/// ```
pub struct Devtools<K: Key = String> {
    activity: Arc<Mutex<HashMap<K, KeyActivity>>>,
    storage: Weak<StorageInner<K>>,
    on_init: HandlerId,
    on_update: HandlerId,
}

impl<K: Key> Devtools<K> {
    /// Subscribe an inspector to `storage`'s lifecycle channels.
    pub fn init(storage: &Storage<K>) -> Self {
        let activity: Arc<Mutex<HashMap<K, KeyActivity>>> = Arc::default();

        let on_init = {
            let activity = Arc::clone(&activity);
            storage.events().on(STORE_INIT, move |key: &K| {
                tracing::info!(?key, "store init");
                activity.lock().entry(key.clone()).or_default().mounts += 1;
            })
        };
        let on_update = {
            let activity = Arc::clone(&activity);
            storage.events().on(STORE_UPDATE, move |key: &K| {
                tracing::debug!(?key, "store update");
                activity.lock().entry(key.clone()).or_default().updates += 1;
            })
        };

        Self {
            activity,
            storage: storage.downgrade(),
            on_init,
            on_update,
        }
    }

    /// Keys at least one consumer has subscribed to, in no particular order.
    pub fn mounted_keys(&self) -> Vec<K> {
        self.activity
            .lock()
            .iter()
            .filter(|(_, activity)| activity.mounts > 0)
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn mount_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.activity.lock().get(key).map_or(0, |a| a.mounts)
    }

    pub fn update_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.activity.lock().get(key).map_or(0, |a| a.updates)
    }
}

impl<K: Key> Drop for Devtools<K> {
    fn drop(&mut self) {
        if let Some(storage) = self.storage.upgrade() {
            storage.events().off(STORE_INIT, self.on_init);
            storage.events().off(STORE_UPDATE, self.on_update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BindOptions;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_each_mount() {
        let storage: Storage = Storage::new();
        let devtools = Devtools::init(&storage);

        let mut a = storage.bind("k".to_string(), 0, BindOptions::retained()).unwrap();
        let mut b = storage.bind("k".to_string(), 0, BindOptions::retained()).unwrap();
        a.subscribe(|_| {});
        b.subscribe(|_| {});
        storage.mutate("k".to_string(), 3).unwrap();

        assert_eq!(devtools.mount_count("k"), 2);
        assert_eq!(devtools.update_count("k"), 1);
        assert_eq!(devtools.mounted_keys(), vec!["k".to_string()]);
    }

    #[test]
    fn events_before_init_are_not_replayed() {
        let storage: Storage = Storage::new();
        let mut early = storage.bind("early".to_string(), 0, BindOptions::retained()).unwrap();
        early.subscribe(|_| {});

        let devtools = Devtools::init(&storage);
        assert_eq!(devtools.mount_count("early"), 0);
        assert!(devtools.mounted_keys().is_empty());
    }

    #[test]
    fn drop_unsubscribes() {
        let storage: Storage = Storage::new();
        let devtools = Devtools::init(&storage);
        assert_eq!(storage.events().handler_count(STORE_INIT), 1);

        drop(devtools);
        assert_eq!(storage.events().handler_count(STORE_INIT), 0);
        assert_eq!(storage.events().handler_count(STORE_UPDATE), 0);
    }
}
