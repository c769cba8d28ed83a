//! The injector facade and the resolution dispatcher.

use std::any::TypeId;
use std::error::Error;
use std::sync::{Arc, Weak};

use snafu::prelude::*;

use crate::access::Shape;
use crate::binder::{Binder, ConfigError};
use crate::context::{LocalContext, ResolveContext};
use crate::injectable::Injectable;
use crate::key::{BindPoint, InjectKind};
use crate::module::Module;
use crate::request::{Form, Request};
use crate::table::{BindEntry, BindKind, BindTable, Produced};

/// A resolution failure. Missing bindings, missing assisted arguments
/// and shape mismatches are programming defects in the configuration;
/// they carry enough context to name the offending request precisely.
#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum InjectError {
    #[snafu(display("{point} can not be instantiated, missing binding"))]
    #[non_exhaustive]
    MissingBinding { point: BindPoint },

    #[snafu(display(
        "expected {point} (a factory argument), but it is not present in the factory parameter list"
    ))]
    #[non_exhaustive]
    MissingAssisted { point: BindPoint },

    #[snafu(display("can not convert bound [{bound}] to requested [{requested}] for {point}"))]
    #[non_exhaustive]
    Incompatible {
        point: BindPoint,
        requested: Shape,
        bound: Shape,
    },

    #[snafu(display("{point} depends on itself, the dependency graph must be acyclic"))]
    #[non_exhaustive]
    Cycle { point: BindPoint },

    #[snafu(display("the constructor of {type_name} failed"))]
    #[non_exhaustive]
    Construction {
        type_name: &'static str,
        source: Arc<dyn Error + Send + Sync>,
    },
}

impl InjectError {
    /// Wraps an error returned by a fallible injection constructor.
    pub fn construction<T: ?Sized>(source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Construction {
            type_name: std::any::type_name::<T>(),
            source: Arc::from(source.into()),
        }
    }
}

pub(crate) struct InjectorCore {
    table: BindTable,
}

/// The resolution facade. Cloning is cheap and every clone addresses the
/// same bind table; the table is torn down when [`Injector::dispose`] is
/// called or the last clone is dropped, whichever comes first for the
/// cleanup actions and last for the entries.
#[derive(Clone)]
pub struct Injector {
    core: Arc<InjectorCore>,
}

impl Injector {
    /// Configures a bind table from `module` and wraps it in an
    /// injector. Modules using the lazy-singleton scope must be created
    /// through [`create_injector`](crate::create_injector) instead.
    ///
    /// # Errors
    ///
    /// Returns every configuration error the module produced, aggregated;
    /// a partially configured graph never serves requests.
    pub fn create<M: Module>(module: &M) -> Result<Self, ConfigError> {
        let mut table = BindTable::new();
        let mut binder = Binder::new(&mut table);
        binder.install(module);
        binder.finish()?;

        tracing::debug!("injector configured");
        Ok(Self {
            core: Arc::new(InjectorCore { table }),
        })
    }

    /// Resolves a top-level request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request, or any transitive dependency of
    /// it, has no usable binding or an incompatible one.
    pub fn get<R: Request>(&self) -> Result<<R::Form as Form>::Output, InjectError> {
        let ctx = ResolveContext::root(LocalContext::empty());
        self.inject::<R>(&ctx)
    }

    /// Resolves a request within an ongoing resolution. This is the
    /// re-entry point used by generated constructors and by entries that
    /// need further dependencies.
    ///
    /// # Errors
    ///
    /// Same as [`Injector::get`].
    pub fn inject<R: Request>(
        &self,
        ctx: &ResolveContext<'_>,
    ) -> Result<<R::Form as Form>::Output, InjectError> {
        <R::Form as Form>::resolve(self, R::point(), ctx)
    }

    /// Runs all registered cleanup actions in reverse registration order.
    /// Idempotent. Entry teardown itself happens when the last clone of
    /// this injector is dropped.
    pub fn dispose(&self) {
        tracing::debug!("injector disposed");
        self.core.table.run_cleanups();
    }

    pub(crate) fn downgrade(&self) -> WeakInjector {
        WeakInjector {
            core: Arc::downgrade(&self.core),
        }
    }

    pub(crate) fn resolve_raw(
        &self,
        point: BindPoint,
        default_entry: fn() -> Option<Box<dyn BindEntry>>,
        ctx: &ResolveContext<'_>,
    ) -> Result<Produced, InjectError> {
        if point.kind() == InjectKind::Assisted {
            // Assisted requests are served from the factory parameter
            // list alone.
            return match ctx.locals().find(&point) {
                Some(slot) => Ok(slot.produce()),
                None => {
                    tracing::error!(%point, "assisted argument not supplied");
                    Err(InjectError::MissingAssisted { point })
                }
            };
        }

        if ctx.contains(&point) {
            tracing::error!(%point, "cyclic dependency");
            return Err(InjectError::Cycle { point });
        }
        let inner = ctx.enter(point);

        if let Some(entry) = self.core.table.find(&point) {
            debug_assert_eq!(entry.specifier(), point.specifier());
            return entry.produce(self, &inner);
        }

        match default_entry() {
            Some(entry) => {
                debug_assert_eq!(entry.specifier(), point.specifier());
                entry.produce(self, &inner)
            }
            None => {
                tracing::error!(%point, "missing binding");
                Err(InjectError::MissingBinding { point })
            }
        }
    }
}

#[derive(Clone)]
pub(crate) struct WeakInjector {
    core: Weak<InjectorCore>,
}

impl WeakInjector {
    pub(crate) fn is(&self, injector: &Injector) -> bool {
        std::ptr::eq(self.core.as_ptr(), Arc::as_ptr(&injector.core))
    }
}

/// Hands the injector itself to anything that asks for it.
struct SelfEntry;

impl BindEntry for SelfEntry {
    fn kind(&self) -> BindKind {
        BindKind::Internal
    }

    fn specifier(&self) -> TypeId {
        TypeId::of::<Injector>()
    }

    fn shape(&self) -> Shape {
        Shape::value()
    }

    fn produce(
        &self,
        injector: &Injector,
        _ctx: &ResolveContext<'_>,
    ) -> Result<Produced, InjectError> {
        Ok(Produced::value(injector.clone()))
    }
}

impl Injectable for Injector {
    const INTERNAL: bool = true;

    fn default_entry() -> Option<Box<dyn BindEntry>> {
        Some(Box::new(SelfEntry))
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;

    use crate::access::Ptr;
    use crate::key::Label;
    use crate::request::{At, Val};

    use super::*;

    struct Sends;
    struct Receives;

    impl Label for Sends {}
    impl Label for Receives {}

    struct PortsModule;

    impl Module for PortsModule {
        fn configure(
            &self,
            binder: &mut Binder<'_>,
        ) -> Result<(), Box<dyn StdError + Send + Sync>> {
            binder.bind::<Val<u16>>().to_value(80);
            binder.bind::<At<Sends, Val<u16>>>().to_value(25);
            binder.bind::<At<Receives, Val<u16>>>().to_value(110);
            binder
                .bind::<Ptr<String>>()
                .to_instance(Ptr::new(String::from("shared")));
            Ok(())
        }
    }

    #[test]
    fn resolves_bound_values() {
        let injector = Injector::create(&PortsModule).unwrap();
        assert_eq!(injector.get::<Val<u16>>().unwrap(), 80);
    }

    #[test]
    fn labelled_bindings_are_independent() {
        let injector = Injector::create(&PortsModule).unwrap();

        assert_eq!(injector.get::<At<Sends, Val<u16>>>().unwrap(), 25);
        assert_eq!(injector.get::<At<Receives, Val<u16>>>().unwrap(), 110);
        // The unlabelled binding never leaks into labelled requests and
        // vice versa.
        assert_eq!(injector.get::<Val<u16>>().unwrap(), 80);
        assert!(matches!(
            injector.get::<At<Sends, Val<u32>>>(),
            Err(InjectError::MissingBinding { .. })
        ));
    }

    #[test]
    fn missing_binding_is_an_error() {
        let injector = Injector::create(&PortsModule).unwrap();
        assert!(matches!(
            injector.get::<Val<i64>>(),
            Err(InjectError::MissingBinding { .. })
        ));
    }

    #[test]
    fn instance_bindings_resolve_to_the_same_address() {
        let injector = Injector::create(&PortsModule).unwrap();
        let first = injector.get::<Ptr<String>>().unwrap();
        let second = injector.get::<Ptr<String>>().unwrap();
        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn the_injector_injects_itself() {
        let injector = Injector::create(&PortsModule).unwrap();
        let other = injector.get::<Val<Injector>>().unwrap();
        assert_eq!(other.get::<Val<u16>>().unwrap(), 80);
    }
}
