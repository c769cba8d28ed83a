//! The lazy singleton scope.
//!
//! Types bound to [`LazySingleton`] are constructed on the first request
//! and every later request observes the same instance. The instances are
//! owned by the injector; they are released during teardown in the exact
//! reverse order of their construction, which is reverse dependency
//! order, since a dependency is always constructed before its dependent.
//!
//! Scoped modules must be created through
//! [`create_injector`](crate::create_injector); the plain low-level
//! [`Injector::create`] does not wire up the setup context this scope
//! needs, and configuration fails if the scope is used without it.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::access::Ptr;
use crate::binder::{Binder, ConfigError};
use crate::context::ResolveContext;
use crate::injectable::Injectable;
use crate::injector::{InjectError, Injector, WeakInjector};
use crate::key::{BindPoint, InjectKind, Label};
use crate::provider::Provider;
use crate::request::At;
use crate::table::ProviderEntry;

/// A cross-cutting lifecycle policy for bound types. `configure_scope`
/// is invoked by the binder's `in_scope` and performs the actual
/// binding, usually to a provider implementing the policy.
pub trait Scope: 'static {
    fn configure_scope<L, T>(binder: &mut Binder<'_>, is_const: bool)
    where
        L: Label,
        T: Injectable + ?Sized;
}

/// Internal label used by scope providers to resolve the underlying type
/// without recursing into the scope binding itself.
pub struct Unscoped;

impl Label for Unscoped {}

/// A participant in injector-wide scope bookkeeping: initialized once
/// the injector exists, cleaned up at teardown.
pub trait ScopeSetup: Send + Sync + 'static {
    fn init(&self, injector: &Injector);
    fn cleanup(&self);
}

/// Injector-scoped bookkeeping for scope participants.
///
/// The init list is append-only and populated during configuration; the
/// cleanup list is populated lazily, at first construction of each
/// scoped object, and can therefore never outgrow the init list.
/// Cleanup runs in exact reverse order of first construction.
pub struct ScopeSetupContext {
    injector: Mutex<Option<WeakInjector>>,
    init_list: Mutex<Vec<Arc<dyn ScopeSetup>>>,
    cleanup_list: Mutex<Vec<Arc<dyn ScopeSetup>>>,
}

crate::require_binding!(ScopeSetupContext);

impl ScopeSetupContext {
    pub fn new() -> Self {
        Self {
            injector: Mutex::new(None),
            init_list: Mutex::new(Vec::new()),
            cleanup_list: Mutex::new(Vec::new()),
        }
    }

    /// Called only while binding, single-threaded by the configuration
    /// contract.
    pub(crate) fn add_to_init(&self, setup: Arc<dyn ScopeSetup>) {
        let mut list = self.init_list.lock();
        assert!(
            !list.iter().any(|known| Arc::ptr_eq(known, &setup)),
            "scope setup participant registered twice"
        );
        list.push(setup);
    }

    /// Called at first construction of a scoped object, possibly from
    /// any thread.
    pub(crate) fn add_to_cleanup(&self, setup: Arc<dyn ScopeSetup>) {
        let init = self.init_list.lock();
        assert!(
            init.iter().any(|known| Arc::ptr_eq(known, &setup)),
            "cleanup participant was never registered for init"
        );
        let mut cleanup = self.cleanup_list.lock();
        assert!(
            cleanup.len() < init.len(),
            "cleanup list can not outgrow the init list"
        );
        cleanup.push(setup);
    }

    pub(crate) fn init(&self, injector: &Injector) {
        {
            let mut slot = self.injector.lock();
            if let Some(existing) = slot.as_ref() {
                assert!(
                    existing.is(injector),
                    "scope setup context re-initialized with a different injector"
                );
            }
            *slot = Some(injector.downgrade());
        }
        for setup in self.init_list.lock().iter() {
            setup.init(injector);
        }
    }

    pub(crate) fn cleanup(&self) {
        let list = std::mem::take(&mut *self.cleanup_list.lock());
        for setup in list.iter().rev() {
            setup.cleanup();
        }
    }
}

impl Default for ScopeSetupContext {
    fn default() -> Self {
        Self::new()
    }
}

/// The lazy singleton scope policy.
pub struct LazySingleton;

impl Scope for LazySingleton {
    fn configure_scope<L, T>(binder: &mut Binder<'_>, is_const: bool)
    where
        L: Label,
        T: Injectable + ?Sized,
    {
        let Some(context) = binder.bound_instance::<ScopeSetupContext>() else {
            tracing::error!(
                "lazy singleton scope used without a setup context; \
                 the injector must be created with create_injector"
            );
            binder.report(ConfigError::ScopeWithoutSetup);
            return;
        };

        let provider = LazySingletonProvider::<T>::new(context.clone());
        context.add_to_init(provider.clone());

        let point = BindPoint::new::<T, L>(InjectKind::Normal);
        let entry = ProviderEntry::pointer::<T>(provider, is_const);
        binder.add_entry(point, Box::new(entry));
    }
}

enum SingletonSlot<T: ?Sized> {
    Unset,
    Ready(Ptr<T>),
    Failed(InjectError),
}

/// Provider installed by [`LazySingleton`]: constructs the underlying
/// type exactly once and hands out the same instance afterwards. The
/// construction gate holds a mutex across the first construction, so
/// concurrent first requests block until the instance exists.
pub struct LazySingletonProvider<T: Injectable + ?Sized> {
    context: Ptr<ScopeSetupContext>,
    weak_self: Weak<Self>,
    injector: Mutex<Option<WeakInjector>>,
    slot: Mutex<SingletonSlot<T>>,
}

impl<T: Injectable + ?Sized> LazySingletonProvider<T> {
    fn new(context: Ptr<ScopeSetupContext>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            context,
            weak_self: weak_self.clone(),
            injector: Mutex::new(None),
            slot: Mutex::new(SingletonSlot::Unset),
        })
    }

    fn create(
        &self,
        injector: &Injector,
        ctx: &ResolveContext<'_>,
    ) -> Result<Ptr<T>, InjectError> {
        {
            let stored = self.injector.lock();
            let stored = stored
                .as_ref()
                .expect("scope setup context was not initialized, use create_injector");
            debug_assert!(stored.is(injector), "resolved through a foreign injector");
        }

        // The unscoped label misses this binding and falls back to the
        // type's own default construction.
        let object = injector.inject::<At<Unscoped, Ptr<T>>>(ctx)?;

        // Registering immediately after construction keeps the cleanup
        // list in construction order.
        let this = self
            .weak_self
            .upgrade()
            .expect("provider outlives its entry");
        self.context.add_to_cleanup(this);
        tracing::debug!(singleton = std::any::type_name::<T>(), "created");
        Ok(object)
    }
}

impl<T: Injectable + ?Sized> Provider for LazySingletonProvider<T> {
    type Provided = Ptr<T>;

    fn provide(
        &self,
        injector: &Injector,
        ctx: &ResolveContext<'_>,
    ) -> Result<Ptr<T>, InjectError> {
        let mut slot = self.slot.lock();
        match &*slot {
            SingletonSlot::Ready(object) => Ok(object.clone()),
            SingletonSlot::Failed(error) => Err(error.clone()),
            SingletonSlot::Unset => match self.create(injector, ctx) {
                Ok(object) => {
                    *slot = SingletonSlot::Ready(object.clone());
                    Ok(object)
                }
                Err(error) => {
                    *slot = SingletonSlot::Failed(error.clone());
                    Err(error)
                }
            },
        }
    }
}

impl<T: Injectable + ?Sized> ScopeSetup for LazySingletonProvider<T> {
    fn init(&self, injector: &Injector) {
        let mut slot = self.injector.lock();
        if let Some(existing) = slot.as_ref() {
            assert!(
                existing.is(injector),
                "singleton provider re-initialized with a different injector"
            );
        }
        *slot = Some(injector.downgrade());
    }

    fn cleanup(&self) {
        *self.slot.lock() = SingletonSlot::Unset;
    }
}
