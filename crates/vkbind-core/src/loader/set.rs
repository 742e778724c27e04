use std::any::Any;

use super::function::{FunctionInfo, FunctionLoader, FunctionSource, Scope};

/// The closed collection of wrappers a manager drives.
///
/// Implemented for any single [`FunctionLoader`] and for tuples of up to
/// eight of them. Wrappers load in tuple order.
pub trait LoaderSet: 'static {
    fn load_global_functions(&mut self, source: &mut dyn FunctionSource);

    fn load_context_functions(&mut self, source: &mut dyn FunctionSource);

    /// Native names of the member extensions.
    fn extensions(&self) -> Vec<&'static str>;

    /// Null functions of `scope`, paired with their extension name.
    fn unresolved(&self, scope: Scope) -> Vec<(&'static str, &'static FunctionInfo)>;

    /// First member of type `T`.
    fn find<T: FunctionLoader>(&self) -> Option<&T>;
}

impl<L: FunctionLoader> LoaderSet for L {
    fn load_global_functions(&mut self, source: &mut dyn FunctionSource) {
        FunctionLoader::load_global_functions(self, source);
    }

    fn load_context_functions(&mut self, source: &mut dyn FunctionSource) {
        FunctionLoader::load_context_functions(self, source);
    }

    fn extensions(&self) -> Vec<&'static str> {
        vec![L::EXTENSION]
    }

    fn unresolved(&self, scope: Scope) -> Vec<(&'static str, &'static FunctionInfo)> {
        FunctionLoader::unresolved(self, scope)
            .into_iter()
            .map(|f| (L::EXTENSION, f))
            .collect()
    }

    fn find<T: FunctionLoader>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}

macro_rules! impl_loader_set {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: FunctionLoader),+> LoaderSet for ($($name,)+) {
            fn load_global_functions(&mut self, source: &mut dyn FunctionSource) {
                $( FunctionLoader::load_global_functions(&mut self.$idx, source); )+
            }

            fn load_context_functions(&mut self, source: &mut dyn FunctionSource) {
                $( FunctionLoader::load_context_functions(&mut self.$idx, source); )+
            }

            fn extensions(&self) -> Vec<&'static str> {
                vec![$($name::EXTENSION),+]
            }

            fn unresolved(&self, scope: Scope) -> Vec<(&'static str, &'static FunctionInfo)> {
                let mut out = Vec::new();
                $(
                    out.extend(
                        FunctionLoader::unresolved(&self.$idx, scope)
                            .into_iter()
                            .map(|f| ($name::EXTENSION, f)),
                    );
                )+
                out
            }

            fn find<T: FunctionLoader>(&self) -> Option<&T> {
                $(
                    if let Some(found) = (&self.$idx as &dyn Any).downcast_ref::<T>() {
                        return Some(found);
                    }
                )+
                None
            }
        }
    };
}

impl_loader_set!(A: 0);
impl_loader_set!(A: 0, B: 1);
impl_loader_set!(A: 0, B: 1, C: 2);
impl_loader_set!(A: 0, B: 1, C: 2, D: 3);
impl_loader_set!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_loader_set!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_loader_set!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_loader_set!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
