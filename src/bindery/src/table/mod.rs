//! The bind table: the keyed store of value-producing entries that an
//! injector resolves against.

mod entries;
pub(crate) mod reader;

use std::any::TypeId;
use std::collections::HashMap;

use parking_lot::Mutex;

use crate::access::Shape;
use crate::context::ResolveContext;
use crate::injector::{InjectError, Injector};
use crate::key::BindPoint;
use crate::util::any::AsAny;
use crate::Managed;

pub use entries::{
    CtorEntry, InstanceEntry, PointedEntry, ProviderEntry, ToTypeEntry, ValueEntry,
};

/// How a table entry produces its value. The kinds are mutually
/// exclusive; `FactoryArgument` entries never live in a bind table, only
/// in a [`LocalContext`](crate::context::LocalContext); `Internal` marks
/// the framework's own self-entries, which bypass the table entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindKind {
    ToCtor,
    ToType,
    ToInstance,
    ToValue,
    ToPointed,
    ToProvider,
    FactoryArgument,
    Internal,
}

/// The type-erased output of one entry: the payload boxed by category
/// (`T` for values, `Ptr<T>` for pointers, `Ref<T>` for references) plus
/// the shape the payload was bound with.
pub struct Produced {
    pub payload: Box<dyn Managed>,
    pub shape: Shape,
}

impl Produced {
    pub fn value<T: Managed>(value: T) -> Self {
        Self {
            payload: Box::new(value),
            shape: Shape::value(),
        }
    }

    pub fn pointer<T>(pointer: crate::access::Ptr<T>, is_const: bool) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            payload: Box::new(pointer),
            shape: Shape::pointer(is_const),
        }
    }

    pub fn reference<T>(reference: crate::access::Ref<T>, is_const: bool) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            payload: Box::new(reference),
            shape: Shape::reference(is_const),
        }
    }
}

/// A polymorphic value producer registered under one [`BindPoint`].
pub trait BindEntry: AsAny + Send + Sync + 'static {
    fn kind(&self) -> BindKind;

    /// Type id of the specifier this entry produces.
    fn specifier(&self) -> TypeId;

    /// Category and constness of the produced object.
    fn shape(&self) -> Shape;

    fn produce(
        &self,
        injector: &Injector,
        ctx: &ResolveContext<'_>,
    ) -> Result<Produced, InjectError>;
}

enum Slot {
    Entry(Box<dyn BindEntry>),
    Cleanup(Mutex<Option<Box<dyn FnOnce() + Send>>>),
}

/// Maps bind points to entries and owns every entry and cleanup action
/// ever handed to it.
///
/// Ownership is one ordered slot list, separate from the lookup map: an
/// entry rejected as a duplicate stays in the slot list (and is torn down
/// with everything else) without ever becoming discoverable. Teardown
/// walks the slot list in exact reverse order of registration, since
/// later bindings may reference objects produced by earlier ones.
pub struct BindTable {
    slots: Vec<Slot>,
    lookup: HashMap<BindPoint, usize>,
}

impl BindTable {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn find(&self, point: &BindPoint) -> Option<&dyn BindEntry> {
        let index = *self.lookup.get(point)?;
        match &self.slots[index] {
            Slot::Entry(entry) => Some(entry.as_ref()),
            Slot::Cleanup(_) => unreachable!("lookup map points at a cleanup slot"),
        }
    }

    /// Registers `entry` under `point`, taking ownership unconditionally.
    /// Returns false if the point was already bound; the first
    /// registration stays in effect, and the rejected entry is still kept
    /// for teardown.
    pub(crate) fn add_entry(&mut self, point: BindPoint, entry: Box<dyn BindEntry>) -> bool {
        let index = self.slots.len();
        self.slots.push(Slot::Entry(entry));

        if self.lookup.contains_key(&point) {
            return false;
        }
        self.lookup.insert(point, index);
        true
    }

    pub(crate) fn add_cleanup(&mut self, action: Box<dyn FnOnce() + Send>) {
        self.slots.push(Slot::Cleanup(Mutex::new(Some(action))));
    }

    /// Runs every registered cleanup action in reverse registration
    /// order. Idempotent; entries themselves are dropped when the table
    /// is.
    pub(crate) fn run_cleanups(&self) {
        for slot in self.slots.iter().rev() {
            if let Slot::Cleanup(action) = slot {
                if let Some(action) = action.lock().take() {
                    action();
                }
            }
        }
    }
}

impl Drop for BindTable {
    fn drop(&mut self) {
        self.lookup.clear();
        while let Some(slot) = self.slots.pop() {
            if let Slot::Cleanup(action) = &slot {
                if let Some(action) = action.lock().take() {
                    action();
                }
            }
            drop(slot);
        }
    }
}
