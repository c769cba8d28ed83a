//! Injector creation with scope bookkeeping.

use std::error::Error;

use crate::access::Ptr;
use crate::binder::{Binder, ConfigError};
use crate::injector::Injector;
use crate::module::Module;
use crate::scope::ScopeSetupContext;

struct SetupModule<'m, M: Module> {
    inner: &'m M,
    context: Ptr<ScopeSetupContext>,
}

impl<M: Module> Module for SetupModule<'_, M> {
    fn configure(&self, binder: &mut Binder<'_>) -> Result<(), Box<dyn Error + Send + Sync>> {
        // The setup context is bound first: scope hooks in the user
        // module read it back while configuring.
        binder
            .bind::<Ptr<ScopeSetupContext>>()
            .to_instance(self.context.clone());

        binder.install(self.inner);

        let context = self.context.clone();
        binder.add_cleanup(move || context.cleanup());
        Ok(())
    }
}

/// Creates an injector with the scope bookkeeping wired in. Required for
/// any module binding types to the lazy singleton scope; harmless
/// otherwise.
///
/// Teardown is caller-driven: call [`Injector::dispose`] when done (or
/// drop the last clone, which also runs the pending cleanups). Scoped
/// instances are released in reverse order of their construction.
///
/// # Errors
///
/// Returns the aggregated configuration errors of the module, if any.
pub fn create_injector<M: Module>(module: &M) -> Result<Injector, ConfigError> {
    let context = Ptr::new(ScopeSetupContext::new());
    let setup = SetupModule {
        inner: module,
        context: context.clone(),
    };

    let injector = Injector::create(&setup)?;
    context.init(&injector);
    Ok(injector)
}
