//! Layout helpers used by generated bindings.
//!
//! Typed wrappers and their native counterparts are distinct Rust types with
//! identical layout. The generator proves that layout equality at compile
//! time with [`layout_matches`]; calls then move values across the boundary
//! with [`force_cast`].

use std::mem::{align_of, size_of, ManuallyDrop};

use crate::loader::UntypedFnptr;

/// `true` when `A` and `B` have the same size and alignment.
///
/// Usable in `const` assertions:
///
/// ```
/// # use vkbind_core::abi::layout_matches;
/// const _: () = assert!(!layout_matches::<u32, [u8; 4]>());
/// const _: () = assert!(layout_matches::<u64, f64>());
/// ```
pub const fn layout_matches<A, B>() -> bool {
    size_of::<A>() == size_of::<B>() && align_of::<A>() == align_of::<B>()
}

/// Reinterprets `value` as `To`.
///
/// Sizes are checked at compile time; mismatched sizes fail to build.
///
/// # Safety
///
/// Every bit pattern of `value` must be a valid `To`. Generated bindings only
/// call this between a typed value and its native equivalent, whose layouts
/// are asserted equal.
#[inline(always)]
pub unsafe fn force_cast<To, From>(value: From) -> To {
    const { assert!(size_of::<To>() == size_of::<From>()) };
    let value = ManuallyDrop::new(value);
    // SAFETY: sizes are equal and the caller guarantees validity.
    unsafe { std::mem::transmute_copy::<ManuallyDrop<From>, To>(&value) }
}

/// Reinterprets a resolved pointer as the native function type `F`.
///
/// # Safety
///
/// `ptr` must have been resolved for the symbol whose signature is `F`, and
/// must not be null. Calling through a null pointer is a contract violation;
/// debug builds assert on it.
#[inline(always)]
pub unsafe fn cast_fnptr<F: Copy>(ptr: UntypedFnptr) -> F {
    debug_assert!(ptr.is_some(), "called a function pointer that was never resolved");
    unsafe { force_cast::<F, UntypedFnptr>(ptr) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(transparent)]
    #[derive(Debug, Copy, Clone, PartialEq)]
    struct Typed(i32);

    #[test]
    fn layout_checks() {
        assert!(layout_matches::<Typed, i32>());
        assert!(!layout_matches::<Typed, i64>());
        assert!(!layout_matches::<[u8; 4], u32>());
    }

    #[test]
    fn force_cast_preserves_bits() {
        let typed: Typed = unsafe { force_cast(-7i32) };
        assert_eq!(typed, Typed(-7));
        let raw: u32 = unsafe { force_cast(Typed(-1)) };
        assert_eq!(raw, u32::MAX);
    }

    unsafe extern "system" fn add(a: u32, b: u32) -> u32 {
        a + b
    }

    #[test]
    fn fnptr_round_trip() {
        let f: unsafe extern "system" fn(u32, u32) -> u32 = add;
        let untyped: UntypedFnptr = unsafe { force_cast(f) };
        assert!(untyped.is_some());
        let back: unsafe extern "system" fn(u32, u32) -> u32 = unsafe { cast_fnptr(untyped) };
        assert_eq!(unsafe { back(2, 3) }, 5);
    }
}
