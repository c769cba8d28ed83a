//! Units of binding configuration.

use std::any;
use std::error::Error;

use crate::binder::Binder;

/// A unit of binding configuration. The implementation receives a binder,
/// performs its bind calls and must not retain the binder past the call.
///
/// ```rust
/// use bindery::{Binder, Module, Val};
/// # use std::error::Error;
///
/// struct PortsModule;
///
/// impl Module for PortsModule {
///     fn configure(
///         &self,
///         binder: &mut Binder<'_>,
///     ) -> Result<(), Box<dyn Error + Send + Sync>> {
///         binder.bind::<Val<u16>>().to_value(8080);
///         Ok(())
///     }
/// }
/// ```
///
/// Returning an error marks the whole configuration failed; it is
/// reported together with any binding errors when the injector is
/// created.
pub trait Module {
    fn configure(&self, binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// An ordered collection of modules applied as one.
#[derive(Default)]
pub struct Modules {
    modules: Vec<(&'static str, Box<dyn Module>)>,
}

impl Modules {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with<M: Module + 'static>(mut self, module: M) -> Self {
        self.modules.push((any::type_name::<M>(), Box::new(module)));
        self
    }
}

impl Module for Modules {
    fn configure(&self, binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>> {
        for (name, module) in &self.modules {
            binder.install_named(name, module.as_ref());
        }
        Ok(())
    }
}
