//! Binding identities.
//!
//! Every resolvable request folds down to a [`BindPoint`]: the type
//! specifier (the bare nominal type with any pointer/reference form
//! stripped), a label and an injection kind. Two requests address the same
//! binding exactly when their bind points are equal. Labels are zero-sized
//! marker types implementing [`Label`], used to keep several bindings of
//! the same type apart.

use std::any::{self, TypeId};
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Marker trait for label types.
///
/// A label is an empty type used as a compile-time tag:
///
/// ```rust
/// pub struct HighPriority;
/// impl bindery::Label for HighPriority {}
/// ```
pub trait Label: 'static {}

/// The default label of every request that carries no explicit label.
pub struct NotLabelled;

impl Label for NotLabelled {}

/// Whether a request is served from the bind table or from the runtime
/// arguments of a factory invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectKind {
    Normal,
    Assisted,
}

/// Type-level counterpart of [`InjectKind`].
pub trait KindMarker: 'static {
    const KIND: InjectKind;
}

pub struct NormalKind;

impl KindMarker for NormalKind {
    const KIND: InjectKind = InjectKind::Normal;
}

pub struct AssistedKind;

impl KindMarker for AssistedKind {
    const KIND: InjectKind = InjectKind::Assisted;
}

/// A label captured as a runtime value, for the places where the label is
/// not statically known (a factory forwarding its own label to its return
/// type).
#[derive(Clone, Copy)]
pub struct LabelInfo {
    id: TypeId,
    name: &'static str,
}

impl LabelInfo {
    pub fn of<L: Label>() -> Self {
        Self {
            id: TypeId::of::<L>(),
            name: any::type_name::<L>(),
        }
    }

    pub fn not_labelled() -> Self {
        Self::of::<NotLabelled>()
    }
}

/// The identity a binding is registered and looked up under.
///
/// Equality and hashing consider the specifier id, the label id and the
/// kind; the human-readable names ride along for diagnostics only.
#[derive(Clone, Copy)]
pub struct BindPoint {
    specifier: TypeId,
    specifier_name: &'static str,
    label: TypeId,
    label_name: &'static str,
    kind: InjectKind,
}

impl BindPoint {
    pub fn new<T: ?Sized + 'static, L: Label>(kind: InjectKind) -> Self {
        Self::for_label_info::<T>(LabelInfo::of::<L>(), kind)
    }

    pub fn for_label_info<T: ?Sized + 'static>(label: LabelInfo, kind: InjectKind) -> Self {
        Self {
            specifier: TypeId::of::<T>(),
            specifier_name: any::type_name::<T>(),
            label: label.id,
            label_name: label.name,
            kind,
        }
    }

    pub fn specifier(&self) -> TypeId {
        self.specifier
    }

    pub fn specifier_name(&self) -> &'static str {
        self.specifier_name
    }

    pub fn kind(&self) -> InjectKind {
        self.kind
    }

    pub fn label_info(&self) -> LabelInfo {
        LabelInfo {
            id: self.label,
            name: self.label_name,
        }
    }

    fn is_labelled(&self) -> bool {
        self.label != TypeId::of::<NotLabelled>()
    }
}

impl PartialEq for BindPoint {
    fn eq(&self, other: &Self) -> bool {
        self.specifier == other.specifier && self.label == other.label && self.kind == other.kind
    }
}

impl Eq for BindPoint {}

impl Hash for BindPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.specifier.hash(state);
        self.label.hash(state);
        self.kind.hash(state);
    }
}

impl Display for BindPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.kind == InjectKind::Assisted {
            write!(f, "assisted ")?;
        }
        write!(f, "{}", self.specifier_name)?;
        if self.is_labelled() {
            write!(f, "@{}", self.label_name)?;
        }
        Ok(())
    }
}

impl Debug for BindPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct First;
    struct Second;

    impl Label for First {}
    impl Label for Second {}

    #[test]
    fn specifier_ids_are_unique_and_stable() {
        let a = BindPoint::new::<i32, NotLabelled>(InjectKind::Normal);
        let b = BindPoint::new::<i64, NotLabelled>(InjectKind::Normal);
        let a_again = BindPoint::new::<i32, NotLabelled>(InjectKind::Normal);

        assert_ne!(a.specifier(), b.specifier());
        assert_eq!(a.specifier(), a_again.specifier());
        assert_eq!(a, a_again);
    }

    #[test]
    fn labels_separate_points_of_the_same_specifier() {
        let plain = BindPoint::new::<i32, NotLabelled>(InjectKind::Normal);
        let first = BindPoint::new::<i32, First>(InjectKind::Normal);
        let second = BindPoint::new::<i32, Second>(InjectKind::Normal);

        assert_ne!(plain, first);
        assert_ne!(plain, second);
        assert_ne!(first, second);
    }

    #[test]
    fn kind_is_part_of_the_identity() {
        let normal = BindPoint::new::<i32, First>(InjectKind::Normal);
        let assisted = BindPoint::new::<i32, First>(InjectKind::Assisted);

        assert_ne!(normal, assisted);
    }

    #[test]
    fn display_names_the_specifier_and_label() {
        let point = BindPoint::new::<i32, First>(InjectKind::Normal);
        let shown = point.to_string();
        assert!(shown.contains("i32"));
        assert!(shown.contains("First"));

        let assisted = BindPoint::new::<i32, NotLabelled>(InjectKind::Assisted);
        assert!(assisted.to_string().starts_with("assisted "));
    }
}
