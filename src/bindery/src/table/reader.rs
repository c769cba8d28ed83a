//! Read-time compatibility checking.
//!
//! A produced payload is handed to the call site only if the bound shape
//! is compatible with the requested one. Exactly four widenings are
//! allowed: non-const pointer to const pointer, non-const reference to
//! const reference, reference to value by copy and const reference to
//! value by copy. Everything else is an error naming both shapes.

use crate::access::{Category, Ptr, Ref, Shape};
use crate::injector::InjectError;
use crate::key::BindPoint;
use crate::table::Produced;
use crate::Managed;

fn incompatible(point: &BindPoint, requested: Shape, bound: Shape) -> InjectError {
    tracing::error!(%point, %requested, %bound, "incompatible binding shape");
    InjectError::Incompatible {
        point: *point,
        requested,
        bound,
    }
}

pub(crate) fn read_value<T>(produced: Produced, point: &BindPoint) -> Result<T, InjectError>
where
    T: Managed + Clone,
{
    match produced.shape.category {
        Category::Value => match produced.payload.into_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => unreachable!("value payload does not hold {point}"),
        },
        // Reference to value by copy, const or not.
        Category::Reference => match produced.payload.into_any().downcast::<Ref<T>>() {
            Ok(handle) => Ok(T::clone(&handle)),
            Err(_) => unreachable!("reference payload does not hold {point}"),
        },
        Category::Pointer => Err(incompatible(point, Shape::value(), produced.shape)),
    }
}

pub(crate) fn read_pointer<T>(
    produced: Produced,
    want_const: bool,
    point: &BindPoint,
) -> Result<Ptr<T>, InjectError>
where
    T: ?Sized + Send + Sync + 'static,
{
    let requested = Shape::pointer(want_const);
    match produced.shape.category {
        Category::Pointer => {
            // A const binding never serves a non-const request; the
            // opposite direction is the allowed widening.
            if produced.shape.is_const && !want_const {
                return Err(incompatible(point, requested, produced.shape));
            }
            match produced.payload.into_any().downcast::<Ptr<T>>() {
                Ok(pointer) => Ok(*pointer),
                Err(_) => unreachable!("pointer payload does not hold {point}"),
            }
        }
        _ => Err(incompatible(point, requested, produced.shape)),
    }
}

pub(crate) fn read_reference<T>(
    produced: Produced,
    want_const: bool,
    point: &BindPoint,
) -> Result<Ref<T>, InjectError>
where
    T: ?Sized + Send + Sync + 'static,
{
    let requested = Shape::reference(want_const);
    match produced.shape.category {
        Category::Reference => {
            if produced.shape.is_const && !want_const {
                return Err(incompatible(point, requested, produced.shape));
            }
            match produced.payload.into_any().downcast::<Ref<T>>() {
                Ok(reference) => Ok(*reference),
                Err(_) => unreachable!("reference payload does not hold {point}"),
            }
        }
        _ => Err(incompatible(point, requested, produced.shape)),
    }
}
