/// A write against a store: either a replacement value or an updater.
///
/// Updaters always receive the store's current value at the moment of the
/// write, not whatever value the caller last observed.
///
/// ```
/// use keystate::{Action, Store};
///
/// let store = Store::new(1);
/// store.set_state(5);
/// store.set_state(Action::update(|n: &i32| n * 2));
/// assert_eq!(store.get_state(), 10);
/// ```
pub enum Action<T> {
    Value(T),
    Update(Box<dyn FnOnce(&T) -> T + Send>),
}

impl<T> Action<T> {
    pub fn update<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        Action::Update(Box::new(f))
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Action::Update(_))
    }

    /// Resolve the action against the current value.
    pub(crate) fn apply(self, current: &T) -> T {
        match self {
            Action::Value(value) => value,
            Action::Update(f) => f(current),
        }
    }

    /// Value to seed a missing store with, if this action carries one.
    pub(crate) fn into_value(self) -> Option<T> {
        match self {
            Action::Value(value) => Some(value),
            Action::Update(_) => None,
        }
    }
}

/// Conversion into an [`Action`], with the state type fixed by the input.
///
/// A plain value becomes [`Action::Value`] and an [`Action`] passes through,
/// so write entry points accept either without a type annotation even when
/// no store type is known up front:
///
/// ```
/// use keystate::{Action, Storage};
///
/// let storage: Storage = Storage::new();
/// storage.mutate("n".to_string(), 1).unwrap();
/// storage.mutate("n".to_string(), Action::update(|n: &i32| n + 1)).unwrap();
/// assert_eq!(storage.get_state::<i32, _>("n"), Some(2));
/// ```
pub trait IntoAction {
    type State;

    fn into_action(self) -> Action<Self::State>;
}

impl<T: Clone> IntoAction for T {
    type State = T;

    fn into_action(self) -> Action<T> {
        Action::Value(self)
    }
}

impl<T> IntoAction for Action<T> {
    type State = T;

    fn into_action(self) -> Action<T> {
        self
    }
}

impl<T> std::fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Value(_) => f.write_str("Action::Value(..)"),
            Action::Update(_) => f.write_str("Action::Update(..)"),
        }
    }
}
