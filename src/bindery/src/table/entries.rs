//! The entry types, one per bind kind.

use std::any::TypeId;
use std::marker::PhantomData;

use crate::access::{Ptr, Ref, Shape};
use crate::context::ResolveContext;
use crate::injectable::{Construct, Injectable, UpcastFrom};
use crate::injector::{InjectError, Injector};
use crate::key::NormalKind;
use crate::provider::Provider;
use crate::request::{Form, PointerForm, Request, ValueForm};
use crate::table::{BindEntry, BindKind, Produced};
use crate::Managed;

/// Default binding of a constructible type: every `produce` builds a
/// fresh object through [`Construct::construct`], resolving the
/// constructor's own arguments recursively. Never stored in a bind
/// table; it is returned by [`Injectable::default_entry`] on lookup miss.
pub struct CtorEntry<T: Construct> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: Construct> CtorEntry<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: Construct> Default for CtorEntry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Construct> BindEntry for CtorEntry<T> {
    fn kind(&self) -> BindKind {
        BindKind::ToCtor
    }

    fn specifier(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn shape(&self) -> Shape {
        Shape::pointer(false)
    }

    fn produce(
        &self,
        injector: &Injector,
        ctx: &ResolveContext<'_>,
    ) -> Result<Produced, InjectError> {
        let object = T::construct(injector, ctx)?;
        Ok(Produced::pointer(Ptr::new(object), false))
    }
}

type Redirect =
    Box<dyn Fn(&Injector, &ResolveContext<'_>) -> Result<Produced, InjectError> + Send + Sync>;

/// Redirects one bind point to another: a request for the source
/// specifier is resolved as a request for the destination, upcast to the
/// source on the way out.
pub struct ToTypeEntry<S: ?Sized> {
    redirect: Redirect,
    shape: Shape,
    _marker: PhantomData<fn() -> Box<S>>,
}

impl<S: Injectable + ?Sized> ToTypeEntry<S> {
    /// Pointer redirection; the destination's pointer must upcast to the
    /// source's.
    pub(crate) fn pointer<D, DR>(is_const: bool) -> Self
    where
        D: Injectable + ?Sized,
        S: UpcastFrom<D>,
        DR: Request<Kind = NormalKind>,
        DR::Form: PointerForm<Pointee = D> + Form<Output = Ptr<D>>,
    {
        Self {
            redirect: Box::new(move |injector, ctx| {
                let resolved: Ptr<D> = injector.inject::<DR>(ctx)?;
                Ok(Produced::pointer(<S as UpcastFrom<D>>::upcast(resolved), is_const))
            }),
            shape: Shape::pointer(is_const),
            _marker: PhantomData,
        }
    }

    /// Value redirection; the destination value must be assignable to the
    /// source value type.
    pub(crate) fn value<D, DR>() -> Self
    where
        S: Sized + Managed,
        D: Into<S>,
        DR: Request<Kind = NormalKind>,
        DR::Form: ValueForm<Value = D> + Form<Output = D>,
    {
        Self {
            redirect: Box::new(move |injector, ctx| {
                let resolved: D = injector.inject::<DR>(ctx)?;
                let converted: S = resolved.into();
                Ok(Produced::value(converted))
            }),
            shape: Shape::value(),
            _marker: PhantomData,
        }
    }
}

impl<S: Injectable + ?Sized> BindEntry for ToTypeEntry<S> {
    fn kind(&self) -> BindKind {
        BindKind::ToType
    }

    fn specifier(&self) -> TypeId {
        TypeId::of::<S>()
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn produce(
        &self,
        injector: &Injector,
        ctx: &ResolveContext<'_>,
    ) -> Result<Produced, InjectError> {
        (self.redirect)(injector, ctx)
    }
}

/// Binds a pointer request to one existing instance. Every `produce`
/// hands out a clone of the same handle.
pub struct InstanceEntry<T: ?Sized + Send + Sync + 'static> {
    instance: Ptr<T>,
    shape: Shape,
}

impl<T: ?Sized + Send + Sync + 'static> InstanceEntry<T> {
    pub(crate) fn new(instance: Ptr<T>, shape: Shape) -> Self {
        Self { instance, shape }
    }

    pub(crate) fn instance(&self) -> Ptr<T> {
        self.instance.clone()
    }
}

impl<T: ?Sized + Send + Sync + 'static> BindEntry for InstanceEntry<T> {
    fn kind(&self) -> BindKind {
        BindKind::ToInstance
    }

    fn specifier(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn produce(
        &self,
        _injector: &Injector,
        _ctx: &ResolveContext<'_>,
    ) -> Result<Produced, InjectError> {
        Ok(Produced {
            payload: Box::new(self.instance.clone()),
            shape: self.shape,
        })
    }
}

/// Binds a value request to a stored value, returned by copy on every
/// `produce`.
pub struct ValueEntry<T: Managed + Clone> {
    value: T,
}

impl<T: Managed + Clone> ValueEntry<T> {
    pub(crate) fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Managed + Clone> BindEntry for ValueEntry<T> {
    fn kind(&self) -> BindKind {
        BindKind::ToValue
    }

    fn specifier(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn shape(&self) -> Shape {
        Shape::value()
    }

    fn produce(
        &self,
        _injector: &Injector,
        _ctx: &ResolveContext<'_>,
    ) -> Result<Produced, InjectError> {
        Ok(Produced::value(self.value.clone()))
    }
}

/// Binds a reference request to one held instance; `produce` hands out a
/// reference handle aliasing it.
pub struct PointedEntry<T: ?Sized + Send + Sync + 'static> {
    instance: Ptr<T>,
    shape: Shape,
}

impl<T: ?Sized + Send + Sync + 'static> PointedEntry<T> {
    pub(crate) fn new(instance: Ptr<T>, shape: Shape) -> Self {
        Self { instance, shape }
    }
}

impl<T: ?Sized + Send + Sync + 'static> BindEntry for PointedEntry<T> {
    fn kind(&self) -> BindKind {
        BindKind::ToPointed
    }

    fn specifier(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn produce(
        &self,
        _injector: &Injector,
        _ctx: &ResolveContext<'_>,
    ) -> Result<Produced, InjectError> {
        let reference = Ref::from_arc(self.instance.clone().into_arc());
        Ok(Produced {
            payload: Box::new(reference),
            shape: self.shape,
        })
    }
}

/// Binds a request to a user provider. The entry owns the provider and
/// drops it exactly once at table teardown.
pub struct ProviderEntry<P: Provider> {
    provider: P,
    specifier: TypeId,
    shape: Shape,
}

impl<P: Provider> ProviderEntry<P> {
    pub(crate) fn pointer<S>(provider: P, is_const: bool) -> Self
    where
        S: Injectable + ?Sized,
        P: Provider<Provided = Ptr<S>>,
    {
        Self {
            provider,
            specifier: TypeId::of::<S>(),
            shape: Shape::pointer(is_const),
        }
    }

    pub(crate) fn value<S>(provider: P) -> Self
    where
        S: Injectable + Managed,
        P: Provider<Provided = S>,
    {
        Self {
            provider,
            specifier: TypeId::of::<S>(),
            shape: Shape::value(),
        }
    }
}

impl<P: Provider> BindEntry for ProviderEntry<P> {
    fn kind(&self) -> BindKind {
        BindKind::ToProvider
    }

    fn specifier(&self) -> TypeId {
        self.specifier
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn produce(
        &self,
        injector: &Injector,
        ctx: &ResolveContext<'_>,
    ) -> Result<Produced, InjectError> {
        let provided = self.provider.provide(injector, ctx)?;
        Ok(Produced {
            payload: Box::new(provided),
            shape: self.shape,
        })
    }
}
