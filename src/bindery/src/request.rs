//! Typed requests.
//!
//! A request names what to resolve and how: a *form* selects the
//! structural category of the result — [`Val`] for owned values, [`Ptr`]
//! and [`PtrConst`] for shared pointers, [`Ref`] and [`RefConst`] for
//! references to table-held instances — and annotation wrappers attach a
//! label ([`At`]) or mark the request assisted ([`Assisted`]). Wrappers
//! compose in any order without changing the computed identity:
//!
//! ```rust
//! use bindery::{At, Assisted, Ptr, Request};
//!
//! struct ForReply;
//! impl bindery::Label for ForReply {}
//!
//! # struct Stream;
//! # bindery::require_binding!(Stream);
//! type A = At<ForReply, Assisted<Ptr<Stream>>>;
//! type B = Assisted<At<ForReply, Ptr<Stream>>>;
//! assert_eq!(A::point(), B::point());
//! ```
//!
//! Attaching two labels, or marking a request assisted twice, does not
//! type-check.

use std::marker::PhantomData;

use crate::access::{Ptr, Ref, Shape};
use crate::context::ResolveContext;
use crate::injectable::Injectable;
use crate::injector::{InjectError, Injector};
use crate::key::{AssistedKind, BindPoint, KindMarker, Label, NormalKind, NotLabelled};
use crate::table::reader;
use crate::Managed;

/// A shaped request: specifier plus category plus constness. The form
/// also knows how to read the resolved payload back into its output
/// type, applying the allowed widenings.
pub trait Form: 'static {
    type Specifier: Injectable + ?Sized;

    /// What resolving this form yields.
    type Output: Managed;

    fn shape() -> Shape;

    fn resolve(
        injector: &Injector,
        point: BindPoint,
        ctx: &ResolveContext<'_>,
    ) -> Result<Self::Output, InjectError>;
}

/// Pointer-category forms; `Pointee` is the specifier.
pub trait PointerForm: Form {
    type Pointee: Injectable + ?Sized;
}

/// Reference-category forms; `Referent` is the specifier.
pub trait ReferenceForm: Form {
    type Referent: Injectable + ?Sized;
}

/// The value-category form; `Value` is the specifier.
pub trait ValueForm: Form {
    type Value: Injectable;
}

/// Requests an owned value of `T`.
pub struct Val<T>(pub T);

impl<T> Form for Val<T>
where
    T: Injectable + Managed + Clone,
{
    type Specifier = T;
    type Output = T;

    fn shape() -> Shape {
        Shape::value()
    }

    fn resolve(
        injector: &Injector,
        point: BindPoint,
        ctx: &ResolveContext<'_>,
    ) -> Result<T, InjectError> {
        let produced = injector.resolve_raw(point, <T as Injectable>::default_entry, ctx)?;
        reader::read_value::<T>(produced, &point)
    }
}

impl<T> ValueForm for Val<T>
where
    T: Injectable + Managed + Clone,
{
    type Value = T;
}

impl<T: ?Sized> Form for Ptr<T>
where
    T: Injectable,
{
    type Specifier = T;
    type Output = Ptr<T>;

    fn shape() -> Shape {
        Shape::pointer(false)
    }

    fn resolve(
        injector: &Injector,
        point: BindPoint,
        ctx: &ResolveContext<'_>,
    ) -> Result<Ptr<T>, InjectError> {
        let produced = injector.resolve_raw(point, <T as Injectable>::default_entry, ctx)?;
        reader::read_pointer::<T>(produced, false, &point)
    }
}

impl<T: ?Sized> PointerForm for Ptr<T>
where
    T: Injectable,
{
    type Pointee = T;
}

/// Requests a const pointer to `T`; accepts const and non-const pointer
/// bindings alike.
pub struct PtrConst<T: ?Sized>(PhantomData<fn() -> Box<T>>);

impl<T: ?Sized> Form for PtrConst<T>
where
    T: Injectable,
{
    type Specifier = T;
    type Output = Ptr<T>;

    fn shape() -> Shape {
        Shape::pointer(true)
    }

    fn resolve(
        injector: &Injector,
        point: BindPoint,
        ctx: &ResolveContext<'_>,
    ) -> Result<Ptr<T>, InjectError> {
        let produced = injector.resolve_raw(point, <T as Injectable>::default_entry, ctx)?;
        reader::read_pointer::<T>(produced, true, &point)
    }
}

impl<T: ?Sized> PointerForm for PtrConst<T>
where
    T: Injectable,
{
    type Pointee = T;
}

impl<T: ?Sized> Form for Ref<T>
where
    T: Injectable,
{
    type Specifier = T;
    type Output = Ref<T>;

    fn shape() -> Shape {
        Shape::reference(false)
    }

    fn resolve(
        injector: &Injector,
        point: BindPoint,
        ctx: &ResolveContext<'_>,
    ) -> Result<Ref<T>, InjectError> {
        let produced = injector.resolve_raw(point, <T as Injectable>::default_entry, ctx)?;
        reader::read_reference::<T>(produced, false, &point)
    }
}

impl<T: ?Sized> ReferenceForm for Ref<T>
where
    T: Injectable,
{
    type Referent = T;
}

/// Requests a const reference to `T`; accepts const and non-const
/// reference bindings alike.
pub struct RefConst<T: ?Sized>(PhantomData<fn() -> Box<T>>);

impl<T: ?Sized> Form for RefConst<T>
where
    T: Injectable,
{
    type Specifier = T;
    type Output = Ref<T>;

    fn shape() -> Shape {
        Shape::reference(true)
    }

    fn resolve(
        injector: &Injector,
        point: BindPoint,
        ctx: &ResolveContext<'_>,
    ) -> Result<Ref<T>, InjectError> {
        let produced = injector.resolve_raw(point, <T as Injectable>::default_entry, ctx)?;
        reader::read_reference::<T>(produced, true, &point)
    }
}

impl<T: ?Sized> ReferenceForm for RefConst<T>
where
    T: Injectable,
{
    type Referent = T;
}

/// Attaches a label to a request. The inner request must not already be
/// labelled.
pub struct At<L: Label, R>(PhantomData<(L, fn() -> R)>);

/// Marks a request assisted: it is served from the factory parameter
/// list, never from the bind table. The inner request must not already
/// be assisted.
pub struct Assisted<R>(PhantomData<fn() -> R>);

/// A fully annotated request, reducible to a [`BindPoint`].
pub trait Request: 'static {
    type Form: Form;
    type Label: Label;
    type Kind: KindMarker;

    fn point() -> BindPoint {
        BindPoint::new::<<Self::Form as Form>::Specifier, Self::Label>(
            <Self::Kind as KindMarker>::KIND,
        )
    }
}

macro_rules! base_request {
    ($form:ident) => {
        impl<T: ?Sized> Request for $form<T>
        where
            $form<T>: Form,
        {
            type Form = Self;
            type Label = NotLabelled;
            type Kind = NormalKind;
        }
    };
}

base_request!(Ptr);
base_request!(PtrConst);
base_request!(Ref);
base_request!(RefConst);

impl<T> Request for Val<T>
where
    Val<T>: Form,
{
    type Form = Self;
    type Label = NotLabelled;
    type Kind = NormalKind;
}

impl<L, R> Request for At<L, R>
where
    L: Label,
    R: Request<Label = NotLabelled>,
{
    type Form = R::Form;
    type Label = L;
    type Kind = R::Kind;
}

impl<R> Request for Assisted<R>
where
    R: Request<Kind = NormalKind>,
{
    type Form = R::Form;
    type Label = R::Label;
    type Kind = AssistedKind;
}

#[cfg(test)]
mod tests {
    use crate::key::InjectKind;

    use super::*;

    struct ForWriting;
    impl Label for ForWriting {}

    #[test]
    fn bare_forms_request_unlabelled_normal_injection() {
        let point = <Ptr<i32> as Request>::point();
        assert_eq!(point.kind(), InjectKind::Normal);
        assert_eq!(point, BindPoint::new::<i32, NotLabelled>(InjectKind::Normal));
    }

    #[test]
    fn annotation_order_does_not_change_the_identity() {
        let a = <At<ForWriting, Assisted<Ptr<i32>>> as Request>::point();
        let b = <Assisted<At<ForWriting, Ptr<i32>>> as Request>::point();
        assert_eq!(a, b);
        assert_eq!(a.kind(), InjectKind::Assisted);
    }

    #[test]
    fn const_forms_share_the_identity_of_their_base_form() {
        assert_eq!(
            <Ptr<i32> as Request>::point(),
            <PtrConst<i32> as Request>::point()
        );
        assert_ne!(
            <Ptr<i32> as Form>::shape(),
            <PtrConst<i32> as Form>::shape()
        );
    }
}
