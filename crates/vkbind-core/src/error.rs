use std::fmt;

use crate::loader::LoaderState;

/// Errors from driving a [`LoaderManager`](crate::loader::LoaderManager) or
/// negotiating extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// A lifecycle call was made in the wrong state.
    InvalidTransition { state: LoaderState, attempted: LoaderState },
    /// `set_context` was given a null handle.
    NullContext,
    /// Required extensions that the implementation does not offer.
    MissingExtensions(Vec<String>),
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition { state, attempted } => {
                write!(f, "cannot move loader to `{attempted}` while it is `{state}`")
            }
            Self::NullContext => f.write_str("cannot bind a null context"),
            Self::MissingExtensions(names) => {
                write!(f, "required extensions not available: {}", names.join(", "))
            }
        }
    }
}

impl std::error::Error for LoaderError {}
