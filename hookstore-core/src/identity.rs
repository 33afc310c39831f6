//! Identity comparison for change detection.
//!
//! Consumers decide whether to re-render by comparing identities, never by
//! structural equality. Shared values (`Arc`) compare by pointer, so a
//! freshly allocated value is always "different" even when its contents are
//! equal. Plain scalars and strings compare by value, since they have no
//! identity apart from their value.

use std::sync::Arc;

/// Identity equality used by consumers to detect changes.
pub trait Identity {
    /// Returns `true` if `self` and `other` are the same value by identity.
    fn is_same(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identity for Arc<T> {
    fn is_same(&self, other: &Self) -> bool {
        // Compare data addresses only; vtable pointers of the same object
        // may differ across codegen units.
        std::ptr::eq(Arc::as_ptr(self) as *const (), Arc::as_ptr(other) as *const ())
    }
}

impl<T: Identity> Identity for Option<T> {
    fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.is_same(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! value_identity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identity for $ty {
                fn is_same(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

value_identity!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize,
    String, &'static str,
);

// Floats follow `===`: NaN is never the same as itself.
impl Identity for f32 {
    fn is_same(&self, other: &Self) -> bool {
        self == other
    }
}

impl Identity for f64 {
    fn is_same(&self, other: &Self) -> bool {
        self == other
    }
}

macro_rules! tuple_identity {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Identity),+> Identity for ($($name,)+) {
            fn is_same(&self, other: &Self) -> bool {
                $(self.$idx.is_same(&other.$idx))&&+
            }
        }
    };
}

tuple_identity!(A: 0, B: 1);
tuple_identity!(A: 0, B: 1, C: 2);
tuple_identity!(A: 0, B: 1, C: 2, D: 3);
