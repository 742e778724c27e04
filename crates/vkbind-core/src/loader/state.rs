use std::fmt;

/// Lifecycle of a [`LoaderManager`](super::LoaderManager).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LoaderState {
    Unresolved,
    GlobalsResolved,
    /// Terminal. Binding another context requires a new manager.
    ContextBound,
}

impl fmt::Display for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoaderState::Unresolved => "unresolved",
            LoaderState::GlobalsResolved => "globals resolved",
            LoaderState::ContextBound => "context bound",
        })
    }
}
