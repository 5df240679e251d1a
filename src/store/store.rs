use super::{Action, IntoAction, Setters};
use parking_lot::{ReentrantMutex, RwLock};
use std::sync::Arc;

/// Shared state cell for one key.
///
/// A store owns the authoritative value and the ordered list of setters
/// that must hear about every write. Cloning a store clones the handle, not
/// the state.
pub struct Store<T> {
    state: Arc<RwLock<T>>,
    setters: Arc<Setters<T>>,
    // Held from a write through its sweep; reentrant so setters may write back.
    writer: Arc<ReentrantMutex<()>>,
}

impl<T: Clone> Store<T> {
    /// Create a new store with the given initial state.
    pub fn new(initial: T) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
            setters: Arc::new(Setters::new()),
            writer: Arc::new(ReentrantMutex::new(())),
        }
    }

    /// Get a clone of the current state.
    pub fn get_state(&self) -> T {
        self.state.read().clone()
    }

    /// Apply a write and notify every setter with the new value.
    ///
    /// Writes from different threads are serialized together with their
    /// sweeps, so the last value every setter sees is the stored value.
    /// Updaters run on a copy of the current value with no state lock held
    /// and may read the store. The setter list is snapshotted after the
    /// value is stored, so setters may subscribe, unsubscribe, or write
    /// while being notified. Equal values are not filtered out.
    pub fn set_state(&self, action: impl IntoAction<State = T>) -> T {
        let _writer = self.writer.lock();
        let next = match action.into_action() {
            Action::Value(value) => value,
            update => {
                let current = self.get_state();
                update.apply(&current)
            }
        };
        *self.state.write() = next.clone();
        self.notify(&next);
        next
    }

    /// Set a new state value.
    pub fn set(&self, new_state: T) {
        self.set_state(Action::Value(new_state));
    }

    /// Compute the next state from the current one and return it.
    pub fn update<F>(&self, f: F) -> T
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        self.set_state(Action::update(f))
    }

    /// Edit a copy of the state in place, store it, then notify.
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        let _writer = self.writer.lock();
        let mut next = self.get_state();
        f(&mut next);
        *self.state.write() = next.clone();
        self.notify(&next);
    }

    fn notify(&self, value: &T) {
        let setters = self.setters.snapshot();
        tracing::trace!(setters = setters.len(), "notifying setters");
        for setter in setters {
            setter(value);
        }
    }
}

impl<T> Store<T> {
    /// The setter list, for registering and removing refresh callbacks.
    pub fn setters(&self) -> &Setters<T> {
        &self.setters
    }

    /// Read state without cloning.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let state = self.state.read();
        f(&*state)
    }

    /// Whether two handles refer to the same store.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.state, &b.state)
    }
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            setters: Arc::clone(&self.setters),
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.state.read())
            .field("setters", &self.setters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, PartialEq)]
    struct AppState {
        count: usize,
        name: String,
    }

    #[test]
    fn store_get_set() {
        let store = Store::new(AppState {
            count: 0,
            name: "test".to_string(),
        });

        assert_eq!(store.get_state().count, 0);

        store.set(AppState {
            count: 42,
            name: "updated".to_string(),
        });

        assert_eq!(
            store.get_state(),
            AppState {
                count: 42,
                name: "updated".to_string(),
            }
        );
    }

    #[test]
    fn store_modify() {
        let store = Store::new(AppState {
            count: 0,
            name: "test".to_string(),
        });

        store.modify(|state| {
            state.count += 10;
        });

        assert_eq!(store.get_state().count, 10);
    }

    #[test]
    fn updater_sees_current_value() {
        let store = Store::new(0);
        let stale = store.get_state();

        store.set(7);
        store.update(move |n| n + 1 + stale);

        assert_eq!(store.get_state(), 8);
    }

    #[test]
    fn setters_run_in_order_once_each() {
        let store = Store::new(0);
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            store.setters().push(move |value: &i32| {
                log.lock().push((tag, *value));
            });
        }

        store.set(3);

        assert_eq!(*log.lock(), vec![("a", 3), ("b", 3), ("c", 3)]);
    }

    #[test]
    fn equal_write_still_notifies() {
        let store = Store::new(1);
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        store.setters().push(move |_| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.set(1);
        store.set(1);

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn write_without_setters() {
        let store = Store::new(String::from("a"));
        store.set("b".to_string());
        assert_eq!(store.get_state(), "b");
    }

    #[test]
    fn setter_removing_itself_mid_sweep() {
        let store = Store::new(0);
        let call_count = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None));

        let id = {
            let store = store.clone();
            let own_id = Arc::clone(&own_id);
            let call_count = Arc::clone(&call_count);
            store.clone().setters().push(move |_| {
                call_count.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = own_id.lock().take() {
                    store.setters().remove(id);
                }
            })
        };
        *own_id.lock() = Some(id);

        let later = Arc::new(AtomicUsize::new(0));
        let later_clone = later.clone();
        store.setters().push(move |_| {
            later_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.set(1);
        store.set(2);

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(later.load(Ordering::SeqCst), 2);
        assert_eq!(store.setters().len(), 1);
    }

    #[test]
    fn setter_added_mid_sweep_waits_for_next_write() {
        let store = Store::new(0);
        let added = Arc::new(AtomicUsize::new(0));

        {
            let store = store.clone();
            let added = Arc::clone(&added);
            store.clone().setters().push(move |value: &i32| {
                if *value == 1 {
                    let added = Arc::clone(&added);
                    store.setters().push(move |_| {
                        added.fetch_add(1, Ordering::SeqCst);
                    });
                }
            });
        }

        store.set(1);
        assert_eq!(added.load(Ordering::SeqCst), 0);

        store.set(2);
        assert_eq!(added.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_writers_leave_setters_on_final_value() {
        let store = Store::new(0usize);
        let last_seen = Arc::new(Mutex::new(0usize));
        {
            let last_seen = Arc::clone(&last_seen);
            store.setters().push(move |value: &usize| {
                *last_seen.lock() = *value;
            });
        }

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..2000 {
                        store.set(t * 10_000 + i);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(*last_seen.lock(), store.get_state());
    }

    #[test]
    fn concurrent_updaters_lose_nothing() {
        let store = Store::new(0usize);
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        store.update(|n| n + 1);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(store.get_state(), 2000);
    }

    #[test]
    fn updater_may_read_its_own_store() {
        let store = Store::new(2);
        let same = store.clone();

        store.update(move |n| n + same.get_state());
        assert_eq!(store.get_state(), 4);

        let same = store.clone();
        store.modify(move |n| *n += same.read(|current| *current));
        assert_eq!(store.get_state(), 8);
    }

    #[test]
    fn setter_may_write_back_to_its_store() {
        let store = Store::new(0);
        let writer = store.clone();
        store.setters().push(move |value: &i32| {
            if *value == 1 {
                writer.set(2);
            }
        });

        store.set(1);
        assert_eq!(store.get_state(), 2);
    }

    #[test]
    fn clones_share_state() {
        let store = Store::new(1);
        let other = store.clone();
        other.set(2);

        assert!(Store::ptr_eq(&store, &other));
        assert_eq!(store.read(|n| *n), 2);
    }
}
