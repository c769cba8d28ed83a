#![allow(clippy::new_without_default)]

//! Compile-time dependency injection with Guice-style bindings.
//!
//! Modules declare how requests map to values, the injector resolves
//! whole object graphs transitively from a single request, factories
//! thread runtime arguments to assisted parameters anywhere in the
//! built subgraph, and the lazy singleton scope gives bound types
//! at-most-once construction with ordered teardown.

pub mod access;
pub mod binder;
pub mod context;
pub mod factory;
pub mod injectable;
pub mod injector;
pub mod key;
pub mod module;
pub mod provider;
pub mod request;
pub mod scope;
pub mod table;

mod setup;
mod util;

use crate::util::any::AsAny;

/// Anything the framework can carry through a resolution: any `Send +
/// Sync + 'static` type.
pub trait Managed: AsAny + Send + Sync + 'static {}

impl<T> Managed for T where T: AsAny + Send + Sync + 'static {}

pub use bindery_derive::injectable;

pub use crate::access::{Category, Ptr, Ref, Shape};
pub use crate::binder::{Binder, BindingBuilder, ConfigError};
pub use crate::context::{LocalContext, ResolveContext};
pub use crate::factory::{Factory, FactoryArg, FactorySignature, Tagged};
pub use crate::injectable::{Construct, Injectable, UpcastFrom};
pub use crate::injector::{InjectError, Injector};
pub use crate::key::{BindPoint, InjectKind, Label, NotLabelled};
pub use crate::module::{Module, Modules};
pub use crate::provider::{FnProvider, Provider};
pub use crate::request::{Assisted, At, Form, Request, Val};
pub use crate::request::{PtrConst, RefConst};
pub use crate::scope::{LazySingleton, Scope, ScopeSetupContext, Unscoped};
pub use crate::setup::create_injector;

pub mod prelude {
    pub use crate::injectable;
    pub use crate::{create_injector, injectable_interface, require_binding};
    pub use crate::{Assisted, At, Label, PtrConst, Ptr, Ref, RefConst, Val};
    pub use crate::{Binder, ConfigError, Module, Modules};
    pub use crate::{Factory, Tagged};
    pub use crate::{InjectError, Injector, LazySingleton, Provider, ResolveContext, Unscoped};
}
