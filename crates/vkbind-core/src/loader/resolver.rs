use std::ffi::{c_char, c_void, CStr};
use std::fmt;
use std::ptr::{self, NonNull};

use super::function::UntypedFnptr;

/// Native `vkGetInstanceProcAddr`-shaped lookup function.
pub type GetProcAddr = unsafe extern "system" fn(*mut c_void, *const c_char) -> UntypedFnptr;

/// Resolves `name` in the scope of `context` (`None` for global lookups).
///
/// Returning `None` is legal and means the entry point is not available.
/// Any `FnMut(Option<NonNull<c_void>>, &CStr) -> UntypedFnptr` closure is a
/// resolver, which is how tests stand in for a driver.
pub trait ProcResolver {
    fn resolve(&mut self, context: Option<NonNull<c_void>>, name: &CStr) -> UntypedFnptr;
}

impl<F> ProcResolver for F
where
    F: FnMut(Option<NonNull<c_void>>, &CStr) -> UntypedFnptr,
{
    fn resolve(&mut self, context: Option<NonNull<c_void>>, name: &CStr) -> UntypedFnptr {
        self(context, name)
    }
}

/// Resolver backed by a native lookup function.
#[derive(Copy, Clone)]
pub struct ProcAddrFn(GetProcAddr);

impl ProcAddrFn {
    /// # Safety
    ///
    /// `get_proc_addr` must behave like `vkGetInstanceProcAddr`: accept a
    /// null or valid context and a NUL-terminated name, and stay callable for
    /// as long as this value is used.
    pub unsafe fn new(get_proc_addr: GetProcAddr) -> Self {
        Self(get_proc_addr)
    }

    pub fn get(&self) -> GetProcAddr {
        self.0
    }
}

impl ProcResolver for ProcAddrFn {
    fn resolve(&mut self, context: Option<NonNull<c_void>>, name: &CStr) -> UntypedFnptr {
        let context = context.map_or(ptr::null_mut(), NonNull::as_ptr);
        // SAFETY: upheld by the contract of `ProcAddrFn::new`.
        unsafe { (self.0)(context, name.as_ptr()) }
    }
}

impl fmt::Debug for ProcAddrFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProcAddrFn").field(&(self.0 as *const ())).finish()
    }
}
