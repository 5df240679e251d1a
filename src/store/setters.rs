use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub(crate) type Setter<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Identity handle for a registered setter.
///
/// Ids are handed out from a monotonic counter and never reused, so a stale
/// id can never remove a setter registered later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetterId(u64);

/// Ordered list of refresh callbacks attached to a [`Store`](super::Store).
///
/// Notification order is registration order. Removal is by [`SetterId`],
/// never by position, so removing during a notification sweep cannot shift
/// another entry.
pub struct Setters<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SetterId, Setter<T>)>>,
}

impl<T> Setters<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append a setter and return its identity handle.
    pub fn push<F>(&self, setter: F) -> SetterId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SetterId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push((id, Arc::new(setter)));
        tracing::trace!(setter = id.0, "setter registered");
        id
    }

    /// Remove the setter with the given id.
    ///
    /// Returns `false` if it was never added or is already gone.
    pub fn remove(&self, id: SetterId) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter().position(|(entry, _)| *entry == id) {
            Some(index) => {
                entries.remove(index);
                tracing::trace!(setter = id.0, "setter removed");
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: SetterId) -> bool {
        self.entries.lock().iter().any(|(entry, _)| *entry == id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of the current list, taken atomically with respect to push/remove.
    pub(crate) fn snapshot(&self) -> Vec<Setter<T>> {
        self.entries
            .lock()
            .iter()
            .map(|(_, setter)| Arc::clone(setter))
            .collect()
    }
}
