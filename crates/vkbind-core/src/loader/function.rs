use std::any::Any;
use std::ffi::CStr;
use std::fmt;

/// A resolved entry point with its signature erased. `None` means the
/// resolver had nothing for the name.
pub type UntypedFnptr = Option<unsafe extern "system" fn()>;

/// Which lookup a function needs.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Scope {
    /// Resolved with a null context, before any context exists.
    Global,
    /// Resolved against the bound context.
    Context,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Global => "global",
            Scope::Context => "context",
        })
    }
}

/// Static description of one function a wrapper resolves.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FunctionInfo {
    /// Name as exposed on the wrapper, e.g. `CreateInstance`.
    pub name: &'static str,
    /// Exported symbol, e.g. `vkCreateInstance`.
    pub symbol: &'static CStr,
    pub scope: Scope,
}

/// Lookup service handed to wrappers while they resolve.
pub trait FunctionSource {
    fn global_function(&mut self, symbol: &CStr) -> UntypedFnptr;

    fn context_function(&mut self, symbol: &CStr) -> UntypedFnptr;
}

/// A typed wrapper for one extension.
///
/// Implemented by generated code. Each wrapper holds one pointer per declared
/// function, all null until the matching `load_*` call fills them in.
pub trait FunctionLoader: Any {
    /// Native extension name.
    const EXTENSION: &'static str;

    const FUNCTIONS: &'static [FunctionInfo];

    fn load_global_functions(&mut self, source: &mut dyn FunctionSource);

    fn load_context_functions(&mut self, source: &mut dyn FunctionSource);

    /// Stored pointer for `name` (wrapper name, not symbol). `None` for
    /// unknown names and unresolved functions alike.
    fn function_pointer(&self, name: &str) -> UntypedFnptr;

    fn is_loaded(&self, name: &str) -> bool {
        self.function_pointer(name).is_some()
    }

    /// Functions of `scope` whose pointer is still null.
    fn unresolved(&self, scope: Scope) -> Vec<&'static FunctionInfo> {
        Self::FUNCTIONS
            .iter()
            .filter(|f| f.scope == scope && !self.is_loaded(f.name))
            .collect()
    }
}
