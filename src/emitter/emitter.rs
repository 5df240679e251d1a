use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Emitted once per consumer subscription to a key.
pub const STORE_INIT: &str = "store:init";
/// Emitted after every write through a binding or [`mutate`](crate::Storage::mutate).
pub const STORE_UPDATE: &str = "store:update";

type Handler<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Handle returned by [`Emitter::on`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Named-channel publish/subscribe.
///
/// Delivery is synchronous and best-effort: an event emitted while nobody
/// listens on its channel is dropped, never buffered.
///
/// ```
/// use keystate::Emitter;
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let emitter: Emitter<&str> = Emitter::new();
/// assert_eq!(emitter.emit("ping", &"lost"), 0);
///
/// let seen = Arc::new(AtomicUsize::new(0));
/// let seen_clone = seen.clone();
/// emitter.on("ping", move |_| {
///     seen_clone.fetch_add(1, Ordering::SeqCst);
/// });
///
/// assert_eq!(emitter.emit("ping", &"hello"), 1);
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct Emitter<P> {
    next_id: AtomicU64,
    channels: RwLock<HashMap<String, Vec<(HandlerId, Handler<P>)>>>,
}

impl<P> Emitter<P> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe `handler` to the `event` channel.
    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> HandlerId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.channels
            .write()
            .entry(event.into())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Unsubscribe a handler. Unknown ids are ignored.
    pub fn off(&self, event: &str, id: HandlerId) -> bool {
        let mut channels = self.channels.write();
        let Some(handlers) = channels.get_mut(event) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(entry, _)| *entry != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            channels.remove(event);
        }
        removed
    }

    /// Deliver `payload` to every handler on `event`, returning how many ran.
    pub fn emit(&self, event: &str, payload: &P) -> usize {
        let handlers: Vec<Handler<P>> = match self.channels.read().get(event) {
            Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => {
                tracing::trace!(event, "no handlers, event dropped");
                return 0;
            }
        };
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.channels.read().get(event).map_or(0, Vec::len)
    }

    /// Drop every handler on `event`.
    pub fn clear(&self, event: &str) {
        self.channels.write().remove(event);
    }

    pub fn emit_store_init(&self, key: &P) -> usize {
        self.emit(STORE_INIT, key)
    }

    pub fn emit_store_update(&self, key: &P) -> usize {
        self.emit(STORE_UPDATE, key)
    }
}

impl<P> Default for Emitter<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    #[test]
    fn emit_without_handlers_is_dropped() {
        let emitter: Emitter<u32> = Emitter::new();
        assert_eq!(emitter.emit_store_init(&1), 0);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        emitter.on(STORE_INIT, move |key| seen_clone.lock().push(*key));

        assert_eq!(emitter.emit_store_init(&2), 1);
        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn channels_are_independent() {
        let emitter: Emitter<u32> = Emitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        emitter.on(STORE_UPDATE, move |key| seen_clone.lock().push(*key));

        emitter.emit_store_init(&1);
        emitter.emit_store_update(&2);

        assert_eq!(*seen.lock(), vec![2]);
    }

    #[test]
    fn off_is_idempotent() {
        let emitter: Emitter<()> = Emitter::new();
        let id = emitter.on("tick", |_| {});
        let other = emitter.on("tick", |_| {});

        assert!(emitter.off("tick", id));
        assert!(!emitter.off("tick", id));
        assert!(!emitter.off("missing", other));
        assert_eq!(emitter.handler_count("tick"), 1);

        emitter.clear("tick");
        assert_eq!(emitter.emit("tick", &()), 0);
    }

    #[test]
    fn handler_can_unsubscribe_during_emit() {
        let emitter = Arc::new(Emitter::<()>::new());
        let own_id = Arc::new(Mutex::new(None));
        let id = {
            let emitter_ref = Arc::clone(&emitter);
            let own_id = Arc::clone(&own_id);
            emitter.on("once", move |_| {
                if let Some(id) = own_id.lock().take() {
                    emitter_ref.off("once", id);
                }
            })
        };
        *own_id.lock() = Some(id);

        assert_eq!(emitter.emit("once", &()), 1);
        assert_eq!(emitter.emit("once", &()), 0);
    }
}
