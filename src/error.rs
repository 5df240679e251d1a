use thiserror::Error;

/// Errors surfaced by typed registry access.
///
/// Absent keys and absent setters are not errors for writes and removals;
/// those stay silent no-ops.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no store registered for key {key}")]
    NotFound { key: String },

    #[error("store for key {key} does not hold a value of type {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

impl Error {
    pub(crate) fn not_found(key: &impl std::fmt::Debug) -> Self {
        Error::NotFound {
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn type_mismatch<T>(key: &impl std::fmt::Debug) -> Self {
        Error::TypeMismatch {
            key: format!("{key:?}"),
            expected: std::any::type_name::<T>(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
