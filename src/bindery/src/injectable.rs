//! Default-binding declarations.
//!
//! Every specifier the injector can resolve carries exactly one
//! [`Injectable`] implementation, declared next to the type it describes
//! (trait coherence makes a second declaration, or one in a foreign
//! crate, a build error). The implementation answers one question: what
//! is the default construction strategy when no explicit binding exists?
//!
//! - Constructible classes get their implementation from the
//!   [`injectable`](crate::injectable) attribute macro, which also derives
//!   [`Construct`] from the `#[inject]`-marked constructor.
//! - Interfaces are declared with [`injectable_interface!`]; they have no
//!   default and must be explicitly bound.
//! - Types that should never be auto-constructed are declared with
//!   [`require_binding!`]. All primitives ship with such declarations, so
//!   a primitive request is served from the bind table or not at all.

use crate::injector::{InjectError, Injector};
use crate::context::ResolveContext;
use crate::access::Ptr;
use crate::table::BindEntry;

/// A resolvable specifier and its default construction strategy.
///
/// `default_entry` returning `None` means the type must be explicitly
/// bound; resolving it without a binding fails with
/// [`InjectError::MissingBinding`].
pub trait Injectable: Send + Sync + 'static {
    /// True only for the framework's own types (the injector, factories),
    /// which are served internally and may not be bound.
    #[doc(hidden)]
    const INTERNAL: bool = false;

    fn default_entry() -> Option<Box<dyn BindEntry>>;
}

/// A type with a designated injection constructor. Implementations are
/// generated by the [`injectable`](crate::injectable) attribute macro;
/// `construct` resolves every constructor argument through the injector
/// and then runs the constructor.
pub trait Construct: Injectable + Sized {
    fn construct(injector: &Injector, ctx: &ResolveContext<'_>) -> Result<Self, InjectError>;
}

/// Pointer upcast from an implementation `D` to the interface `Self`,
/// the compatibility requirement behind interface-to-implementation
/// bindings. Implementations are emitted by [`injectable_interface!`]
/// for every injectable implementor of the declared trait.
pub trait UpcastFrom<D: Injectable + ?Sized>: Injectable {
    fn upcast(from: Ptr<D>) -> Ptr<Self>;
}

/// Declares that a type has no default binding and must be explicitly
/// bound in a module.
#[macro_export]
macro_rules! require_binding {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Injectable for $ty {
            fn default_entry(
            ) -> ::std::option::Option<::std::boxed::Box<dyn $crate::table::BindEntry>> {
                ::std::option::Option::None
            }
        }
    )+};
}

/// Declares a trait as an injectable interface: requests for
/// `dyn Trait` are served from the bind table only, and every injectable
/// implementor's pointer upcasts to the interface pointer.
///
/// The trait must be object safe and have `Send + Sync` supertraits.
#[macro_export]
macro_rules! injectable_interface {
    ($trait_:path) => {
        impl $crate::Injectable for dyn $trait_ {
            fn default_entry(
            ) -> ::std::option::Option<::std::boxed::Box<dyn $crate::table::BindEntry>> {
                ::std::option::Option::None
            }
        }

        impl<T> $crate::UpcastFrom<T> for dyn $trait_
        where
            T: $trait_ + $crate::Injectable,
        {
            fn upcast(from: $crate::Ptr<T>) -> $crate::Ptr<dyn $trait_> {
                $crate::Ptr::from_arc(from.into_arc())
            }
        }
    };
}

require_binding!(
    i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, usize, isize, f32, f64, bool, char, String,
    &'static str
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_have_no_default_entry() {
        assert!(<i32 as Injectable>::default_entry().is_none());
        assert!(<String as Injectable>::default_entry().is_none());
        assert!(<&'static str as Injectable>::default_entry().is_none());
    }
}
