//! Framework-implemented factories.
//!
//! A factory builds objects whose constructors mix bound dependencies
//! with arguments known only at runtime. Constructor parameters marked
//! assisted are satisfied from the factory call's parameter list;
//! everything else still resolves from the bind table — anywhere in the
//! transitive graph built during that one call.
//!
//! A factory is named by its signature, a `fn` type whose parameters are
//! [`FactoryArg`]s and whose return is the form to build:
//!
//! ```rust
//! use bindery::{injectable, Factory, Ptr, Val};
//!
//! pub struct HttpRequest { pub path: String }
//! bindery::require_binding!(HttpRequest);
//!
//! pub struct RequestHandler {
//!     request: Ptr<HttpRequest>,
//!     limit: u32,
//! }
//!
//! #[injectable]
//! impl RequestHandler {
//!     #[inject]
//!     fn new(#[inject(assisted)] request: Ptr<HttpRequest>, limit: u32) -> Self {
//!         Self { request, limit }
//!     }
//! }
//!
//! pub type HandlerFactory = Factory<fn(Ptr<HttpRequest>) -> Ptr<RequestHandler>>;
//! # use std::error::Error;
//! # struct M;
//! # impl bindery::Module for M {
//! #     fn configure(
//! #         &self,
//! #         binder: &mut bindery::Binder<'_>,
//! #     ) -> Result<(), Box<dyn Error + Send + Sync>> {
//! #         binder.bind::<Val<u32>>().to_value(16);
//! #         Ok(())
//! #     }
//! # }
//! # fn main() -> Result<(), Box<dyn Error>> {
//! # let injector = bindery::Injector::create(&M)?;
//!
//! let factory = injector.get::<Val<HandlerFactory>>()?;
//! let request = Ptr::new(HttpRequest { path: "/notify".into() });
//! let handler = factory.get((request,))?;
//! # Ok(())
//! # }
//! ```
//!
//! A label on the factory request itself selects the binding of the
//! return type, as if the label had been applied there.

use std::any::TypeId;
use std::marker::PhantomData;

use crate::access::{Ptr, Ref, Shape};
use crate::context::{LocalContext, LocalSlot, ResolveContext};
use crate::injectable::Injectable;
use crate::injector::{InjectError, Injector};
use crate::key::{BindPoint, InjectKind, Label, LabelInfo, NotLabelled};
use crate::request::{Form, Val};
use crate::table::{BindEntry, BindKind, Produced};
use crate::Managed;

type Payload = Box<dyn Fn() -> Box<dyn Managed> + Send + Sync>;

/// A runtime argument accepted by a factory. The implementation fixes
/// the argument's assisted identity: its specifier, its label and the
/// shape it satisfies.
pub trait FactoryArg: Send + Sync + 'static {
    type Form: Form;
    type Label: Label;

    #[doc(hidden)]
    fn into_payload(self) -> Payload;

    #[doc(hidden)]
    fn into_slot(self) -> LocalSlot
    where
        Self: Sized,
    {
        let point = BindPoint::new::<<Self::Form as Form>::Specifier, Self::Label>(
            InjectKind::Assisted,
        );
        let shape = <Self::Form as Form>::shape();
        let payload = self.into_payload();
        LocalSlot::from_parts(point, shape, payload)
    }
}

impl<T> FactoryArg for Ptr<T>
where
    T: Injectable + ?Sized,
{
    type Form = Ptr<T>;
    type Label = NotLabelled;

    fn into_payload(self) -> Payload {
        Box::new(move || Box::new(self.clone()))
    }
}

impl<T> FactoryArg for Ref<T>
where
    T: Injectable + ?Sized,
{
    type Form = Ref<T>;
    type Label = NotLabelled;

    fn into_payload(self) -> Payload {
        Box::new(move || Box::new(self.clone()))
    }
}

impl<T> FactoryArg for Val<T>
where
    T: Injectable + Managed + Clone,
{
    type Form = Val<T>;
    type Label = NotLabelled;

    fn into_payload(self) -> Payload {
        let value = self.0;
        Box::new(move || Box::new(value.clone()))
    }
}

/// Attaches a label to a factory argument, pairing it with the
/// label-annotated assisted parameter it satisfies.
pub struct Tagged<L: Label, A>(pub A, PhantomData<fn() -> L>);

impl<L: Label, A> Tagged<L, A> {
    pub fn new(arg: A) -> Self {
        Self(arg, PhantomData)
    }
}

impl<L, A> FactoryArg for Tagged<L, A>
where
    L: Label,
    A: FactoryArg<Label = NotLabelled>,
{
    type Form = A::Form;
    type Label = L;

    fn into_payload(self) -> Payload {
        self.0.into_payload()
    }
}

/// A factory's `fn(Args…) -> ReturnForm` signature.
pub trait FactorySignature: Send + Sync + 'static {
    type Args;
    type Return: Form;

    fn slots(args: Self::Args) -> Vec<LocalSlot>;
}

macro_rules! impl_factory_signature {
    ($($arg:ident),*) => {
        impl<Ret, $($arg,)*> FactorySignature for fn($($arg,)*) -> Ret
        where
            Ret: Form,
            $($arg: FactoryArg,)*
        {
            type Args = ($($arg,)*);
            type Return = Ret;

            #[allow(non_snake_case)]
            fn slots(args: Self::Args) -> Vec<LocalSlot> {
                let ($($arg,)*) = args;
                vec![$($arg.into_slot(),)*]
            }
        }
    };
}

impl_factory_signature!();
impl_factory_signature!(A1);
impl_factory_signature!(A1, A2);
impl_factory_signature!(A1, A2, A3);
impl_factory_signature!(A1, A2, A3, A4);
impl_factory_signature!(A1, A2, A3, A4, A5);
impl_factory_signature!(A1, A2, A3, A4, A5, A6);
impl_factory_signature!(A1, A2, A3, A4, A5, A6, A7);
impl_factory_signature!(A1, A2, A3, A4, A5, A6, A7, A8);

/// The framework-supplied factory implementation. Obtained by injection
/// (`Val<Factory<S>>`), never constructed or bound by user code.
pub struct Factory<S: FactorySignature> {
    injector: Injector,
    label: LabelInfo,
    _marker: PhantomData<fn() -> S>,
}

impl<S: FactorySignature> Factory<S> {
    /// Builds one object. The arguments become the assisted context for
    /// the entire object graph constructed by this call; the caller must
    /// keep pointer arguments alive for the duration of the call, which
    /// the shared handles guarantee on their own.
    ///
    /// # Errors
    ///
    /// Returns an error if the return type or any of its transitive
    /// dependencies can not be resolved.
    pub fn get(&self, args: S::Args) -> Result<<S::Return as Form>::Output, InjectError> {
        let slots = S::slots(args);
        let locals = LocalContext::new(&slots);
        let ctx = ResolveContext::root(&locals);
        let point = BindPoint::for_label_info::<<S::Return as Form>::Specifier>(
            self.label,
            InjectKind::Normal,
        );
        <S::Return as Form>::resolve(&self.injector, point, &ctx)
    }
}

impl<S: FactorySignature> Clone for Factory<S> {
    fn clone(&self) -> Self {
        Self {
            injector: self.injector.clone(),
            label: self.label,
            _marker: PhantomData,
        }
    }
}

struct FactoryEntry<S: FactorySignature> {
    _marker: PhantomData<fn() -> S>,
}

impl<S: FactorySignature> BindEntry for FactoryEntry<S> {
    fn kind(&self) -> BindKind {
        BindKind::Internal
    }

    fn specifier(&self) -> TypeId {
        TypeId::of::<Factory<S>>()
    }

    fn shape(&self) -> Shape {
        Shape::value()
    }

    fn produce(
        &self,
        injector: &Injector,
        ctx: &ResolveContext<'_>,
    ) -> Result<Produced, InjectError> {
        // A label on the factory request selects the return binding.
        let label = ctx
            .point()
            .map(|point| point.label_info())
            .unwrap_or_else(LabelInfo::not_labelled);
        Ok(Produced::value(Factory::<S> {
            injector: injector.clone(),
            label,
            _marker: PhantomData,
        }))
    }
}

impl<S: FactorySignature> Injectable for Factory<S> {
    const INTERNAL: bool = true;

    fn default_entry() -> Option<Box<dyn BindEntry>> {
        Some(Box::new(FactoryEntry::<S> {
            _marker: PhantomData,
        }))
    }
}
