//! User-implemented value producers.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::ResolveContext;
use crate::injector::{InjectError, Injector};
use crate::Managed;

/// Custom construction logic participating in resolution.
///
/// A provider is bound with `to_provider`/`to_value_provider` and invoked
/// whenever its point is resolved. Its own dependencies are pulled from
/// the injector inside `provide`, which routes them through the same
/// dispatcher as any constructor argument, including assisted ones
/// resolved from the current call's factory parameters.
///
/// Providers are stateless by convention and may be called from multiple
/// threads. The bound provider is owned by its table entry and dropped
/// exactly once when the injector is torn down.
///
/// ```rust
/// use bindery::{InjectError, Injector, Provider, Ptr, ResolveContext, Val};
///
/// # pub struct Clock { tick: u64 }
/// # bindery::require_binding!(Clock);
/// struct ClockProvider;
///
/// impl Provider for ClockProvider {
///     type Provided = Ptr<Clock>;
///
///     fn provide(
///         &self,
///         injector: &Injector,
///         ctx: &ResolveContext<'_>,
///     ) -> Result<Ptr<Clock>, InjectError> {
///         let tick = injector.inject::<Val<u64>>(ctx)?;
///         Ok(Ptr::new(Clock { tick }))
///     }
/// }
/// ```
pub trait Provider: Send + Sync + 'static {
    /// What one invocation produces: `Ptr<T>` for pointer bindings, `T`
    /// for value bindings.
    type Provided: Managed;

    /// Produces one object, resolving any dependencies through
    /// `injector`.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency can not be resolved or the
    /// construction itself fails.
    fn provide(
        &self,
        injector: &Injector,
        ctx: &ResolveContext<'_>,
    ) -> Result<Self::Provided, InjectError>;
}

impl<P: Provider> Provider for Arc<P> {
    type Provided = P::Provided;

    fn provide(
        &self,
        injector: &Injector,
        ctx: &ResolveContext<'_>,
    ) -> Result<Self::Provided, InjectError> {
        (**self).provide(injector, ctx)
    }
}

/// Adapts a closure to the [`Provider`] interface.
pub struct FnProvider<F, O> {
    provide: F,
    _marker: PhantomData<fn() -> O>,
}

impl<F, O> FnProvider<F, O>
where
    O: Managed,
    F: Fn(&Injector, &ResolveContext<'_>) -> Result<O, InjectError> + Send + Sync + 'static,
{
    pub fn new(provide: F) -> Self {
        Self {
            provide,
            _marker: PhantomData,
        }
    }
}

impl<F, O> Provider for FnProvider<F, O>
where
    O: Managed,
    F: Fn(&Injector, &ResolveContext<'_>) -> Result<O, InjectError> + Send + Sync + 'static,
{
    type Provided = O;

    fn provide(
        &self,
        injector: &Injector,
        ctx: &ResolveContext<'_>,
    ) -> Result<O, InjectError> {
        (self.provide)(injector, ctx)
    }
}
