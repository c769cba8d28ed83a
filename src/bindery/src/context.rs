//! Per-call resolution state.
//!
//! A [`LocalContext`] carries the runtime arguments of one factory
//! invocation; it lives on the stack for exactly one top-level resolution
//! and is consulted only for assisted requests. A [`ResolveContext`]
//! chains the bind points currently being resolved on the active call
//! stack, which gives error diagnostics their position and turns cyclic
//! graphs into a reported error instead of unbounded recursion.

use crate::access::Shape;
use crate::key::BindPoint;
use crate::table::Produced;
use crate::Managed;

type PayloadFn = Box<dyn Fn() -> Box<dyn Managed> + Send + Sync>;

/// One runtime argument of a factory call: its assisted identity, its
/// shape and a payload that can be read any number of times during the
/// call (an assisted dependency may appear at several places in the built
/// subgraph).
pub struct LocalSlot {
    point: BindPoint,
    shape: Shape,
    payload: PayloadFn,
}

impl LocalSlot {
    pub(crate) fn from_parts(point: BindPoint, shape: Shape, payload: PayloadFn) -> Self {
        Self {
            point,
            shape,
            payload,
        }
    }

    pub(crate) fn point(&self) -> &BindPoint {
        &self.point
    }

    pub(crate) fn produce(&self) -> Produced {
        Produced {
            payload: (self.payload)(),
            shape: self.shape,
        }
    }
}

/// The argument list of one factory invocation.
///
/// Lookup is a linear scan, first match wins; duplicate identities in the
/// argument list are not rejected.
pub struct LocalContext<'a> {
    slots: &'a [LocalSlot],
}

static EMPTY: LocalContext<'static> = LocalContext { slots: &[] };

impl<'a> LocalContext<'a> {
    pub fn new(slots: &'a [LocalSlot]) -> Self {
        Self { slots }
    }

    pub fn empty() -> &'static LocalContext<'static> {
        &EMPTY
    }

    pub(crate) fn find(&self, point: &BindPoint) -> Option<&LocalSlot> {
        self.slots.iter().find(|slot| slot.point() == point)
    }
}

/// One node of the active resolution chain.
pub struct ResolveContext<'a> {
    locals: &'a LocalContext<'a>,
    point: Option<BindPoint>,
    parent: Option<&'a ResolveContext<'a>>,
}

impl<'a> ResolveContext<'a> {
    pub fn root(locals: &'a LocalContext<'a>) -> Self {
        Self {
            locals,
            point: None,
            parent: None,
        }
    }

    pub(crate) fn enter<'b>(&'b self, point: BindPoint) -> ResolveContext<'b> {
        ResolveContext {
            locals: self.locals,
            point: Some(point),
            parent: Some(self),
        }
    }

    /// The bind point currently being resolved, if any.
    pub fn point(&self) -> Option<&BindPoint> {
        self.point.as_ref()
    }

    pub(crate) fn locals(&self) -> &LocalContext<'_> {
        self.locals
    }

    pub(crate) fn contains(&self, point: &BindPoint) -> bool {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if ctx.point.as_ref() == Some(point) {
                return true;
            }
            current = ctx.parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::access::Category;
    use crate::key::{InjectKind, NotLabelled};

    use super::*;

    fn slot_for(point: BindPoint, value: i32) -> LocalSlot {
        LocalSlot::from_parts(point, Shape::value(), Box::new(move || Box::new(value)))
    }

    #[test]
    fn find_scans_in_order_and_first_match_wins() {
        let point = BindPoint::new::<i32, NotLabelled>(InjectKind::Assisted);
        let other = BindPoint::new::<u64, NotLabelled>(InjectKind::Assisted);
        let slots = vec![slot_for(point, 1), slot_for(point, 2)];
        let context = LocalContext::new(&slots);

        let found = context.find(&point).unwrap();
        let produced = found.produce();
        assert_eq!(produced.shape.category, Category::Value);
        assert_eq!(
            produced.payload.into_any().downcast::<i32>().ok().map(|v| *v),
            Some(1)
        );
        assert!(context.find(&other).is_none());
    }

    #[test]
    fn slots_can_be_read_more_than_once() {
        let point = BindPoint::new::<i32, NotLabelled>(InjectKind::Assisted);
        let slots = vec![slot_for(point, 9)];
        let context = LocalContext::new(&slots);

        let slot = context.find(&point).unwrap();
        for _ in 0..3 {
            let produced = slot.produce();
            assert_eq!(
                produced.payload.into_any().downcast::<i32>().ok().map(|v| *v),
                Some(9)
            );
        }
    }

    #[test]
    fn resolve_context_tracks_the_active_chain() {
        let locals = LocalContext::empty();
        let root = ResolveContext::root(locals);
        let a = BindPoint::new::<i32, NotLabelled>(InjectKind::Normal);
        let b = BindPoint::new::<u64, NotLabelled>(InjectKind::Normal);

        let in_a = root.enter(a);
        let in_b = in_a.enter(b);

        assert!(!root.contains(&a));
        assert!(in_a.contains(&a));
        assert!(in_b.contains(&a));
        assert!(in_b.contains(&b));
        assert!(!in_a.contains(&b));
    }
}
