//! Module-configuration front end.
//!
//! A [`Binder`] mutates exactly one bind table during one configuration
//! pass and is never used afterwards. Configuration errors do not abort
//! the pass: they are logged, collected and reported together when the
//! injector is created, so a module surfaces all of its mistakes at
//! once.

use std::any;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::marker::PhantomData;

use snafu::prelude::*;

use crate::access::Ptr;
use crate::context::ResolveContext;
use crate::injectable::{Injectable, UpcastFrom};
use crate::injector::{InjectError, Injector};
use crate::key::{BindPoint, InjectKind, NormalKind, NotLabelled};
use crate::module::Module;
use crate::provider::{FnProvider, Provider};
use crate::request::{Form, PointerForm, ReferenceForm, Request, ValueForm};
use crate::scope::Scope;
use crate::table::{
    BindEntry, BindTable, InstanceEntry, PointedEntry, ProviderEntry, ToTypeEntry, ValueEntry,
};
use crate::Managed;

/// A configuration failure. These accumulate during the pass and are
/// aggregated when the injector is created.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ConfigError {
    #[snafu(display("duplicate binding: {point} is already bound"))]
    #[non_exhaustive]
    DuplicateBinding { point: BindPoint },

    #[snafu(display("{point} is a framework type and can not be bound"))]
    #[non_exhaustive]
    InternalType { point: BindPoint },

    #[snafu(display(
        "scoped bindings need the scope setup context; create the injector with create_injector"
    ))]
    #[non_exhaustive]
    ScopeWithoutSetup,

    #[snafu(display("module {module} failed to configure"))]
    #[non_exhaustive]
    Module {
        module: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },

    #[snafu(display(
        "injector configuration failed with {} errors:\n{}",
        errors.len(),
        AggregatedDisplay::new(errors)
    ))]
    #[non_exhaustive]
    Aggregated { errors: Vec<ConfigError> },
}

struct AggregatedDisplay<'a> {
    errors: &'a [ConfigError],
}

impl<'a> AggregatedDisplay<'a> {
    fn new(errors: &'a [ConfigError]) -> Self {
        Self { errors }
    }
}

impl Display for AggregatedDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            writeln!(f, "{:4}: {}", index + 1, error)?;
        }
        Ok(())
    }
}

type SpecOf<R> = <<R as Request>::Form as Form>::Specifier;

/// Populates one bind table during module configuration.
pub struct Binder<'t> {
    table: &'t mut BindTable,
    errors: Vec<ConfigError>,
}

impl<'t> Binder<'t> {
    pub(crate) fn new(table: &'t mut BindTable) -> Self {
        Self {
            table,
            errors: Vec::new(),
        }
    }

    /// Starts a binding for the request `R`. Assisted requests can not
    /// be bound; they are satisfied by factory parameters alone.
    pub fn bind<R>(&mut self) -> BindingBuilder<'_, 't, R>
    where
        R: Request<Kind = NormalKind>,
    {
        BindingBuilder {
            binder: self,
            _marker: PhantomData,
        }
    }

    /// Applies another module's configuration to the same table.
    /// Bindings accumulate; there is no module-level namespacing.
    pub fn install<M: Module>(&mut self, module: &M) {
        self.install_named(any::type_name::<M>(), module);
    }

    pub(crate) fn install_named(&mut self, name: &'static str, module: &dyn Module) {
        if let Err(source) = module.configure(self) {
            tracing::error!(module = name, "module configuration failed");
            self.errors.push(ConfigError::Module {
                module: name,
                source,
            });
        }
    }

    /// Registers an action to run at teardown, in reverse order of
    /// registration relative to every other binding and cleanup action.
    pub fn add_cleanup<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.table.add_cleanup(Box::new(action));
    }

    /// Reads back an instance bound with `to_instance` under the
    /// unlabelled point of `T`. Used by scope implementations to reach
    /// their setup state.
    ///
    /// # Panics
    ///
    /// Panics if `T` is bound, but not to an instance.
    pub fn bound_instance<T>(&self) -> Option<Ptr<T>>
    where
        T: Injectable + ?Sized,
    {
        let point = BindPoint::new::<T, NotLabelled>(InjectKind::Normal);
        let entry = self.table.find(&point)?;
        match entry.as_any().downcast_ref::<InstanceEntry<T>>() {
            Some(entry) => Some(entry.instance()),
            None => panic!("{point} is bound, but not to an instance"),
        }
    }

    /// Number of configuration errors collected so far.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn report(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    pub(crate) fn add_entry(&mut self, point: BindPoint, entry: Box<dyn BindEntry>) {
        // The table keeps ownership of the entry even when the
        // registration is rejected.
        if !self.table.add_entry(point, entry) {
            tracing::error!(%point, "duplicate binding");
            self.errors.push(ConfigError::DuplicateBinding { point });
        }
    }

    pub(crate) fn finish(self) -> Result<(), ConfigError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Aggregated {
                errors: self.errors,
            })
        }
    }
}

/// One in-flight binding; terminal methods register an entry under the
/// request's bind point.
pub struct BindingBuilder<'b, 't, R: Request> {
    binder: &'b mut Binder<'t>,
    _marker: PhantomData<fn() -> R>,
}

impl<'b, 't, R> BindingBuilder<'b, 't, R>
where
    R: Request<Kind = NormalKind>,
{
    fn register(self, entry: Box<dyn BindEntry>) {
        let point = R::point();
        if <SpecOf<R> as Injectable>::INTERNAL {
            tracing::error!(%point, "attempt to bind a framework type");
            self.binder.report(ConfigError::InternalType { point });
            return;
        }
        self.binder.add_entry(point, entry);
    }
}

impl<'b, 't, R> BindingBuilder<'b, 't, R>
where
    R: Request<Kind = NormalKind>,
    R::Form: PointerForm,
{
    /// Binds an interface to an implementation: requests for this
    /// pointer resolve the destination request and upcast the result.
    pub fn to_type<DR>(self)
    where
        DR: Request<Kind = NormalKind>,
        DR::Form: PointerForm,
        DR::Form: Form<Output = Ptr<<DR::Form as PointerForm>::Pointee>>,
        SpecOf<R>: UpcastFrom<<DR::Form as PointerForm>::Pointee>,
    {
        let entry = ToTypeEntry::<SpecOf<R>>::pointer::<<DR::Form as PointerForm>::Pointee, DR>(
            <R::Form as Form>::shape().is_const,
        );
        self.register(Box::new(entry));
    }

    /// Binds to one existing instance; every resolution observes the
    /// same address. Ownership is shared: the table keeps the object
    /// alive until teardown, the caller may retain its own handle.
    pub fn to_instance(self, instance: Ptr<SpecOf<R>>) {
        let entry = InstanceEntry::new(instance, <R::Form as Form>::shape());
        self.register(Box::new(entry));
    }

    /// Binds to a user provider; the entry owns the provider and drops
    /// it exactly once at teardown.
    pub fn to_provider<P>(self, provider: P)
    where
        P: Provider<Provided = Ptr<SpecOf<R>>>,
    {
        let entry =
            ProviderEntry::pointer::<SpecOf<R>>(provider, <R::Form as Form>::shape().is_const);
        self.register(Box::new(entry));
    }

    /// Binds to a closure acting as a provider.
    pub fn to_closure<F>(self, provide: F)
    where
        F: Fn(&Injector, &ResolveContext<'_>) -> Result<Ptr<SpecOf<R>>, InjectError>
            + Send
            + Sync
            + 'static,
    {
        self.to_provider(FnProvider::new(provide));
    }

    /// Hands the binding to a scope implementation, which installs its
    /// own provider for the point.
    pub fn in_scope<S: Scope>(self) {
        S::configure_scope::<R::Label, SpecOf<R>>(
            self.binder,
            <R::Form as Form>::shape().is_const,
        );
    }
}

impl<'b, 't, R> BindingBuilder<'b, 't, R>
where
    R: Request<Kind = NormalKind>,
    R::Form: ValueForm,
{
    /// Binds to a copy of `value`; every resolution returns a fresh
    /// clone.
    pub fn to_value(self, value: SpecOf<R>)
    where
        SpecOf<R>: Sized + Managed + Clone,
    {
        self.register(Box::new(ValueEntry::new(value)));
    }

    /// Binds a value type to another value type; the destination value
    /// must be assignable to the source value type.
    pub fn to_value_type<DR>(self)
    where
        SpecOf<R>: Sized + Managed,
        DR: Request<Kind = NormalKind>,
        DR::Form: ValueForm,
        DR::Form: Form<Output = <DR::Form as ValueForm>::Value>,
        <DR::Form as ValueForm>::Value: Into<SpecOf<R>>,
    {
        let entry = ToTypeEntry::<SpecOf<R>>::value::<<DR::Form as ValueForm>::Value, DR>();
        self.register(Box::new(entry));
    }

    /// Binds a value type to a user provider.
    pub fn to_value_provider<P>(self, provider: P)
    where
        SpecOf<R>: Sized + Managed,
        P: Provider<Provided = SpecOf<R>>,
    {
        let entry = ProviderEntry::value::<SpecOf<R>>(provider);
        self.register(Box::new(entry));
    }

    /// Binds a value type to a closure acting as a provider.
    pub fn to_value_closure<F>(self, provide: F)
    where
        SpecOf<R>: Sized + Managed,
        F: Fn(&Injector, &ResolveContext<'_>) -> Result<SpecOf<R>, InjectError>
            + Send
            + Sync
            + 'static,
    {
        self.to_value_provider(FnProvider::new(provide));
    }
}

impl<'b, 't, R> BindingBuilder<'b, 't, R>
where
    R: Request<Kind = NormalKind>,
    R::Form: ReferenceForm,
{
    /// Binds a reference request to the object behind `instance`.
    pub fn to_ref_of(self, instance: Ptr<SpecOf<R>>) {
        let entry = PointedEntry::new(instance, <R::Form as Form>::shape());
        self.register(Box::new(entry));
    }
}

#[cfg(test)]
mod tests {
    use crate::request::Val;

    use super::*;

    fn binder_with<'t>(table: &'t mut BindTable) -> Binder<'t> {
        Binder::new(table)
    }

    #[test]
    fn duplicate_bindings_count_one_error_each() {
        let mut table = BindTable::new();
        let mut binder = binder_with(&mut table);

        binder.bind::<Val<i32>>().to_value(1);
        binder.bind::<Val<i32>>().to_value(2);
        assert_eq!(binder.error_count(), 1);

        binder.bind::<Val<i32>>().to_value(3);
        assert_eq!(binder.error_count(), 2);

        assert!(matches!(
            binder.finish(),
            Err(ConfigError::Aggregated { errors }) if errors.len() == 2
        ));
    }

    #[test]
    fn first_binding_stays_in_effect_after_duplicates() {
        let mut table = BindTable::new();
        let mut binder = binder_with(&mut table);

        binder.bind::<Val<i32>>().to_value(1);
        binder.bind::<Val<i32>>().to_value(2);
        drop(binder);

        let point = BindPoint::new::<i32, NotLabelled>(InjectKind::Normal);
        let entry = table.find(&point).unwrap();
        assert!(entry
            .as_any()
            .downcast_ref::<ValueEntry<i32>>()
            .is_some());
    }

    #[test]
    fn binding_the_injector_is_a_configuration_error() {
        let mut table = BindTable::new();
        let mut binder = binder_with(&mut table);

        binder
            .bind::<Val<Injector>>()
            .to_value_closure(|injector, _| Ok(injector.clone()));
        assert_eq!(binder.error_count(), 1);
        assert!(matches!(
            binder.finish(),
            Err(ConfigError::Aggregated { errors })
                if matches!(errors[0], ConfigError::InternalType { .. })
        ));
    }

    #[test]
    fn bound_instance_reads_back_instance_bindings_only() {
        let mut table = BindTable::new();
        let mut binder = binder_with(&mut table);

        let shared = Ptr::new(String::from("kept"));
        binder.bind::<Ptr<String>>().to_instance(shared.clone());
        binder.bind::<Val<i32>>().to_value(1);

        let read = binder.bound_instance::<String>().unwrap();
        assert!(read.ptr_eq(&shared));
        assert!(binder.bound_instance::<u64>().is_none());
    }
}
