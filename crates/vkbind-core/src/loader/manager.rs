use std::collections::HashMap;
use std::ffi::{c_void, CStr, CString};
use std::ops::Deref;
use std::ptr::NonNull;

use crate::error::LoaderError;

use super::function::{FunctionLoader, FunctionSource, Scope, UntypedFnptr};
use super::resolver::ProcResolver;
use super::set::LoaderSet;
use super::state::LoaderState;

// ── ProcTable ─────────────────────────────────────────────────────────────

/// Per-scope cache of resolver answers, null answers included.
#[derive(Debug, Default)]
pub struct ProcTable {
    global: HashMap<CString, UntypedFnptr>,
    context: HashMap<CString, UntypedFnptr>,
}

impl ProcTable {
    fn cache(&self, scope: Scope) -> &HashMap<CString, UntypedFnptr> {
        match scope {
            Scope::Global => &self.global,
            Scope::Context => &self.context,
        }
    }

    /// Cached pointer for `symbol`, querying `resolver` on first use.
    pub fn lookup<R: ProcResolver + ?Sized>(
        &mut self,
        resolver: &mut R,
        scope: Scope,
        context: Option<NonNull<c_void>>,
        symbol: &CStr,
    ) -> UntypedFnptr {
        let cache = match scope {
            Scope::Global => &mut self.global,
            Scope::Context => &mut self.context,
        };
        if let Some(&cached) = cache.get(symbol) {
            return cached;
        }

        let resolved = resolver.resolve(context, symbol);
        match resolved {
            Some(_) => log::trace!("resolved {scope} {}", symbol.to_string_lossy()),
            None => log::debug!("{scope} function {} is not available", symbol.to_string_lossy()),
        }
        cache.insert(symbol.to_owned(), resolved);
        resolved
    }

    /// Number of distinct symbols queried in `scope`.
    pub fn queried(&self, scope: Scope) -> usize {
        self.cache(scope).len()
    }

    /// Symbols of `scope` the resolver returned a pointer for, sorted.
    pub fn resolved_symbols(&self, scope: Scope) -> Vec<&CStr> {
        let mut out: Vec<&CStr> = self
            .cache(scope)
            .iter()
            .filter(|(_, p)| p.is_some())
            .map(|(name, _)| name.as_c_str())
            .collect();
        out.sort_unstable();
        out
    }
}

/// [`FunctionSource`] over a table, a resolver and the bound context.
struct Lookup<'a, R: ?Sized> {
    table: &'a mut ProcTable,
    resolver: &'a mut R,
    context: Option<NonNull<c_void>>,
}

impl<R: ProcResolver + ?Sized> FunctionSource for Lookup<'_, R> {
    fn global_function(&mut self, symbol: &CStr) -> UntypedFnptr {
        self.table.lookup(&mut *self.resolver, Scope::Global, None, symbol)
    }

    fn context_function(&mut self, symbol: &CStr) -> UntypedFnptr {
        if self.context.is_none() {
            log::warn!("context function {} requested before a context is bound", symbol.to_string_lossy());
            return None;
        }
        self.table.lookup(&mut *self.resolver, Scope::Context, self.context, symbol)
    }
}

// ── LoaderManager ─────────────────────────────────────────────────────────

/// Owns the resolver, the wrappers and the lifecycle of one context.
///
/// ```
/// use std::ffi::{c_void, CStr};
/// use std::ptr::NonNull;
/// use vkbind_core::loader::{LoaderManager, LoaderState, UntypedFnptr};
/// # use vkbind_core::loader::{FunctionInfo, FunctionLoader, FunctionSource, Scope};
/// # struct Empty;
/// # impl FunctionLoader for Empty {
/// #     const EXTENSION: &'static str = "empty";
/// #     const FUNCTIONS: &'static [FunctionInfo] = &[];
/// #     fn load_global_functions(&mut self, _: &mut dyn FunctionSource) {}
/// #     fn load_context_functions(&mut self, _: &mut dyn FunctionSource) {}
/// #     fn function_pointer(&self, _: &str) -> UntypedFnptr { None }
/// # }
///
/// let resolver = |_: Option<NonNull<c_void>>, _: &CStr| -> UntypedFnptr { None };
/// let mut manager = LoaderManager::new(resolver, (Empty,));
/// manager.load_globals()?;
/// let mut instance = 0u8;
/// manager.set_context((&raw mut instance).cast())?;
/// assert_eq!(manager.state(), LoaderState::ContextBound);
/// # Ok::<(), vkbind_core::LoaderError>(())
/// ```
pub struct LoaderManager<R: ProcResolver, L: LoaderSet> {
    resolver: R,
    loaders: L,
    context: Option<NonNull<c_void>>,
    table: ProcTable,
    state: LoaderState,
}

impl<R: ProcResolver, L: LoaderSet> LoaderManager<R, L> {
    pub fn new(resolver: R, loaders: L) -> Self {
        log::debug!("loader manager created for {:?}", loaders.extensions());
        Self {
            resolver,
            loaders,
            context: None,
            table: ProcTable::default(),
            state: LoaderState::Unresolved,
        }
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// The bound context, once [`set_context`](Self::set_context) succeeded.
    pub fn context(&self) -> Option<NonNull<c_void>> {
        self.context
    }

    /// Resolves every global function of every wrapper.
    pub fn load_globals(&mut self) -> Result<(), LoaderError> {
        self.transition(LoaderState::Unresolved, LoaderState::GlobalsResolved)?;

        let mut lookup = Lookup { table: &mut self.table, resolver: &mut self.resolver, context: None };
        self.loaders.load_global_functions(&mut lookup);

        log::debug!(
            "resolved global functions: {} queried, {} unavailable",
            self.table.queried(Scope::Global),
            self.loaders.unresolved(Scope::Global).len()
        );
        Ok(())
    }

    /// Binds `context` and resolves every context function against it.
    pub fn set_context(&mut self, context: *mut c_void) -> Result<(), LoaderError> {
        let context = NonNull::new(context).ok_or(LoaderError::NullContext)?;
        self.transition(LoaderState::GlobalsResolved, LoaderState::ContextBound)?;
        self.context = Some(context);

        let mut lookup = Lookup { table: &mut self.table, resolver: &mut self.resolver, context: Some(context) };
        self.loaders.load_context_functions(&mut lookup);

        log::debug!(
            "bound context {context:p}: {} queried, {} unavailable",
            self.table.queried(Scope::Context),
            self.loaders.unresolved(Scope::Context).len()
        );
        Ok(())
    }

    fn transition(&mut self, from: LoaderState, to: LoaderState) -> Result<(), LoaderError> {
        if self.state != from {
            return Err(LoaderError::InvalidTransition { state: self.state, attempted: to });
        }
        self.state = to;
        Ok(())
    }

    /// Looks up a global symbol outside of any wrapper, through the same cache.
    pub fn global_function(&mut self, symbol: &CStr) -> UntypedFnptr {
        self.table.lookup(&mut self.resolver, Scope::Global, None, symbol)
    }

    /// Looks up a context symbol outside of any wrapper. `None` until a
    /// context is bound.
    pub fn context_function(&mut self, symbol: &CStr) -> UntypedFnptr {
        let context = self.context?;
        self.table.lookup(&mut self.resolver, Scope::Context, Some(context), symbol)
    }

    pub fn loaders(&self) -> &L {
        &self.loaders
    }

    /// The registered wrapper of type `T`.
    pub fn loader<T: FunctionLoader>(&self) -> Option<&T> {
        self.loaders.find::<T>()
    }

    /// Wrapper functions of `scope` that resolved to null.
    pub fn unresolved(&self, scope: Scope) -> Vec<String> {
        self.loaders
            .unresolved(scope)
            .into_iter()
            .map(|(ext, f)| format!("{ext}::{}", f.name))
            .collect()
    }

    pub fn table(&self) -> &ProcTable {
        &self.table
    }

    /// Consumes the manager, returning the resolver and the wrappers.
    pub fn into_parts(self) -> (R, L) {
        (self.resolver, self.loaders)
    }
}

impl<R: ProcResolver, L: LoaderSet> Deref for LoaderManager<R, L> {
    type Target = L;

    fn deref(&self) -> &L {
        &self.loaders
    }
}
