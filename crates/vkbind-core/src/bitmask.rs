//! Type-safe bit flag algebra.
//!
//! Generated flag types are `#[repr(transparent)]` newtypes over `i32` that
//! implement [`Bitmask`]. Their `| & ^ !` operators delegate to the free
//! functions here and produce a [`Masked<T>`]: the intermediate result of a
//! flag expression. A `Masked<T>` converts to `bool` (any bit set) or back to
//! `T`, and combines further only with `T` or another `Masked<T>`.
//!
//! Operands of two different flag types never type-check, because the right
//! hand side of every operator is bounded by [`IntoBitmask<T>`] for the left
//! hand side's `T`.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// A flag type backed by an `i32`.
pub trait Bitmask: Copy + Eq + fmt::Debug + 'static {
    fn bits(self) -> i32;

    fn from_bits(bits: i32) -> Self;

    fn empty() -> Self {
        Self::from_bits(0)
    }

    fn is_empty(self) -> bool {
        self.bits() == 0
    }

    /// Every bit of `other` is set in `self`.
    fn contains(self, other: Self) -> bool {
        self.bits() & other.bits() == other.bits()
    }

    fn intersects(self, other: Self) -> bool {
        self.bits() & other.bits() != 0
    }
}

/// Operand accepted on the right of a `T` flag operator.
pub trait IntoBitmask<T: Bitmask> {
    fn into_bitmask(self) -> T;
}

impl<T: Bitmask> IntoBitmask<T> for T {
    #[inline]
    fn into_bitmask(self) -> T {
        self
    }
}

impl<T: Bitmask> IntoBitmask<T> for Masked<T> {
    #[inline]
    fn into_bitmask(self) -> T {
        self.0
    }
}

// ── Masked ────────────────────────────────────────────────────────────────

/// Result of a flag expression.
///
/// ```
/// # use vkbind_core::bitmask::{Bitmask, Masked};
/// # #[derive(Debug, Copy, Clone, PartialEq, Eq)] struct Flags(i32);
/// # impl Bitmask for Flags {
/// #     fn bits(self) -> i32 { self.0 }
/// #     fn from_bits(bits: i32) -> Self { Flags(bits) }
/// # }
/// let m = Masked::new(Flags(0b110)) & Flags(0b010);
/// assert!(bool::from(m));
/// assert_eq!(m.get(), Flags(0b010));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Masked<T: Bitmask>(T);

impl<T: Bitmask> Masked<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> T {
        self.0
    }

    /// Any bit set.
    #[inline]
    pub fn any(self) -> bool {
        !self.0.is_empty()
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn bits(self) -> i32 {
        self.0.bits()
    }
}

impl<T: Bitmask> From<Masked<T>> for bool {
    #[inline]
    fn from(m: Masked<T>) -> bool {
        m.any()
    }
}

impl<T: Bitmask> PartialEq<T> for Masked<T> {
    fn eq(&self, other: &T) -> bool {
        self.0 == *other
    }
}

impl<T: Bitmask> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Masked").field(&self.0).finish()
    }
}

impl<T: Bitmask, R: IntoBitmask<T>> BitOr<R> for Masked<T> {
    type Output = Masked<T>;

    #[inline]
    fn bitor(self, rhs: R) -> Masked<T> {
        or(self, rhs)
    }
}

impl<T: Bitmask, R: IntoBitmask<T>> BitAnd<R> for Masked<T> {
    type Output = Masked<T>;

    #[inline]
    fn bitand(self, rhs: R) -> Masked<T> {
        and(self, rhs)
    }
}

impl<T: Bitmask, R: IntoBitmask<T>> BitXor<R> for Masked<T> {
    type Output = Masked<T>;

    #[inline]
    fn bitxor(self, rhs: R) -> Masked<T> {
        xor(self, rhs)
    }
}

impl<T: Bitmask> Not for Masked<T> {
    type Output = Masked<T>;

    #[inline]
    fn not(self) -> Masked<T> {
        not(self)
    }
}

// ── Operators ─────────────────────────────────────────────────────────────

#[inline]
pub fn or<T: Bitmask>(lhs: impl IntoBitmask<T>, rhs: impl IntoBitmask<T>) -> Masked<T> {
    Masked(T::from_bits(lhs.into_bitmask().bits() | rhs.into_bitmask().bits()))
}

#[inline]
pub fn and<T: Bitmask>(lhs: impl IntoBitmask<T>, rhs: impl IntoBitmask<T>) -> Masked<T> {
    Masked(T::from_bits(lhs.into_bitmask().bits() & rhs.into_bitmask().bits()))
}

#[inline]
pub fn xor<T: Bitmask>(lhs: impl IntoBitmask<T>, rhs: impl IntoBitmask<T>) -> Masked<T> {
    Masked(T::from_bits(lhs.into_bitmask().bits() ^ rhs.into_bitmask().bits()))
}

#[inline]
pub fn not<T: Bitmask>(value: impl IntoBitmask<T>) -> Masked<T> {
    Masked(T::from_bits(!value.into_bitmask().bits()))
}

// ── Debug output ──────────────────────────────────────────────────────────

/// Writes `bits` as `NAME | NAME | 0x..`, using `names` in order and
/// printing leftover bits in hex. Zero prints as `(empty)`.
pub fn fmt_bits(f: &mut fmt::Formatter<'_>, bits: i32, names: &[(&str, i32)]) -> fmt::Result {
    if bits == 0 {
        return f.write_str("(empty)");
    }
    let mut rest = bits;
    let mut first = true;
    for &(name, value) in names {
        if value != 0 && rest & value == value {
            if !first {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
            rest &= !value;
            first = false;
        }
    }
    if rest != 0 {
        if !first {
            f.write_str(" | ")?;
        }
        write!(f, "{:#x}", rest as u32)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, PartialEq, Eq)]
    #[repr(transparent)]
    struct Access(i32);

    impl Access {
        const READ: Self = Self(1 << 0);
        const WRITE: Self = Self(1 << 1);
        const EXEC: Self = Self(1 << 2);
    }

    impl Bitmask for Access {
        fn bits(self) -> i32 {
            self.0
        }
        fn from_bits(bits: i32) -> Self {
            Self(bits)
        }
    }

    impl fmt::Debug for Access {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            fmt_bits(f, self.0, &[("READ", 1), ("WRITE", 2), ("EXEC", 4)])
        }
    }

    impl<R: IntoBitmask<Access>> BitOr<R> for Access {
        type Output = Masked<Access>;
        fn bitor(self, rhs: R) -> Masked<Access> {
            or(self, rhs)
        }
    }

    impl<R: IntoBitmask<Access>> BitAnd<R> for Access {
        type Output = Masked<Access>;
        fn bitand(self, rhs: R) -> Masked<Access> {
            and(self, rhs)
        }
    }

    impl Not for Access {
        type Output = Masked<Access>;
        fn not(self) -> Masked<Access> {
            not(self)
        }
    }

    // ── algebra ───────────────────────────────────────────────────────────

    #[test]
    fn or_and_xor_not_match_integer_ops() {
        let rw = Access::READ | Access::WRITE;
        assert_eq!(rw.bits(), 0b011);
        assert_eq!((rw & Access::WRITE).bits(), 0b010);
        assert_eq!((rw ^ Access::READ).bits(), 0b010);
        assert_eq!((!Access::READ).bits(), !1);
        assert_eq!((!rw & Access::EXEC).get(), Access::EXEC);
    }

    #[test]
    fn chains_stay_masked_until_converted() {
        let all: Access = (Access::READ | Access::WRITE | Access::EXEC).get();
        assert!(all.contains(Access::WRITE));
        assert!(!Access::READ.contains(all));
        assert!(all.intersects(Access::EXEC));
    }

    #[test]
    fn bool_conversion_tests_for_any_bit() {
        assert!(bool::from(Access::READ & (Access::READ | Access::EXEC)));
        assert!(!bool::from(Access::READ & Access::WRITE));
        assert!((Access::READ & Access::WRITE).is_empty());
    }

    #[test]
    fn masked_compares_with_plain_value() {
        assert_eq!(Access::READ | Access::READ, Access::READ);
        assert!(Access::empty().is_empty());
    }

    // ── debug ─────────────────────────────────────────────────────────────

    #[test]
    fn debug_lists_names_and_leftovers() {
        assert_eq!(format!("{:?}", (Access::READ | Access::EXEC).get()), "READ | EXEC");
        assert_eq!(format!("{:?}", Access(0)), "(empty)");
        assert_eq!(format!("{:?}", Access(0b1010)), "WRITE | 0x8");
        assert_eq!(format!("{:?}", Access::READ | Access::WRITE), "Masked(READ | WRITE)");
    }
}
