//! Two-phase function pointer resolution.
//!
//! A [`LoaderManager`] owns the resolver callback and a fixed tuple of
//! generated wrappers (a [`LoaderSet`]). It moves through three states:
//!
//! ```text
//! Unresolved --load_globals--> GlobalsResolved --set_context--> ContextBound
//! ```
//!
//! Global functions are looked up with a null context; context functions are
//! looked up once a context handle is bound. Every distinct name is queried
//! from the resolver at most once per scope, so wrappers that share a
//! function receive the identical pointer.

mod function;
mod manager;
mod resolver;
mod set;
mod state;

pub use function::{FunctionInfo, FunctionLoader, FunctionSource, Scope, UntypedFnptr};
pub use manager::{LoaderManager, ProcTable};
pub use resolver::{GetProcAddr, ProcAddrFn, ProcResolver};
pub use set::LoaderSet;
pub use state::LoaderState;
