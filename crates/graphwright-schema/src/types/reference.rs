//! Type references.
//!
//! A [`TypeRef`] wraps a base type with nullability and list wrapping. The
//! base is either a builtin scalar or a [`TypeHandle`], which is a stable
//! identifier handed out by the [`TypeRegistry`](crate::TypeRegistry). A
//! reference never expands the definition behind a handle, so types may
//! refer to each other (or to themselves) freely.

use super::scalars::BuiltinScalar;

/// Stable identifier of a registered declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(pub(crate) u32);

impl TypeHandle {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The innermost named type of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Builtin(BuiltinScalar),
    Declared(TypeHandle),
}

impl From<BuiltinScalar> for BaseType {
    fn from(scalar: BuiltinScalar) -> Self {
        Self::Builtin(scalar)
    }
}

impl From<TypeHandle> for BaseType {
    fn from(handle: TypeHandle) -> Self {
        Self::Declared(handle)
    }
}

/// A (possibly list-wrapped) reference to a type, with nullability tracked
/// at every level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named { base: BaseType, required: bool },
    List { inner: Box<TypeRef>, required: bool },
}

impl TypeRef {
    /// A non-null reference to `base`.
    pub fn required(base: impl Into<BaseType>) -> Self {
        Self::Named {
            base: base.into(),
            required: true,
        }
    }

    /// A nullable reference to `base`.
    pub fn optional(base: impl Into<BaseType>) -> Self {
        Self::Named {
            base: base.into(),
            required: false,
        }
    }

    /// A list of `inner`.
    pub fn list_of(inner: TypeRef, required: bool) -> Self {
        Self::List {
            inner: Box::new(inner),
            required,
        }
    }

    pub fn is_required(&self) -> bool {
        match self {
            Self::Named { required, .. } | Self::List { required, .. } => *required,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List { .. })
    }

    /// The element type when this is a list.
    pub fn list_item(&self) -> Option<&TypeRef> {
        match self {
            Self::List { inner, .. } => Some(inner),
            Self::Named { .. } => None,
        }
    }

    /// The innermost named type.
    pub fn base(&self) -> BaseType {
        match self {
            Self::Named { base, .. } => *base,
            Self::List { inner, .. } => inner.base(),
        }
    }

    /// The same reference with the outermost level made nullable.
    #[must_use]
    pub fn nullable(&self) -> TypeRef {
        match self {
            Self::Named { base, .. } => Self::Named {
                base: *base,
                required: false,
            },
            Self::List { inner, .. } => Self::List {
                inner: inner.clone(),
                required: false,
            },
        }
    }

    /// Renders the reference in SDL notation, naming bases with `name_of`.
    pub fn display_with(&self, name_of: &dyn Fn(BaseType) -> String) -> String {
        let (rendered, required) = match self {
            Self::Named { base, required } => (name_of(*base), *required),
            Self::List { inner, required } => {
                (format!("[{}]", inner.display_with(name_of)), *required)
            }
        };
        if required {
            format!("{rendered}!")
        } else {
            rendered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(base: BaseType) -> String {
        match base {
            BaseType::Builtin(s) => s.name().to_string(),
            BaseType::Declared(h) => format!("T{}", h.0),
        }
    }

    #[test]
    fn test_structural_equality() {
        let a = TypeRef::list_of(TypeRef::required(TypeHandle(3)), true);
        let b = TypeRef::list_of(TypeRef::required(TypeHandle(3)), true);
        assert_eq!(a, b);
        assert_ne!(a, TypeRef::list_of(TypeRef::optional(TypeHandle(3)), true));
    }

    #[test]
    fn test_nested_nullability_is_tracked_per_level() {
        let ty = TypeRef::list_of(
            TypeRef::list_of(TypeRef::optional(BuiltinScalar::Int), true),
            false,
        );
        assert!(!ty.is_required());
        let inner = ty.list_item().unwrap();
        assert!(inner.is_required());
        assert!(!inner.list_item().unwrap().is_required());
        assert_eq!(ty.display_with(&names), "[[Int]!]");
    }

    #[test]
    fn test_base_of_wrapped_reference() {
        let ty = TypeRef::list_of(TypeRef::required(TypeHandle(7)), true);
        assert_eq!(ty.base(), BaseType::Declared(TypeHandle(7)));
        assert_eq!(ty.display_with(&names), "[T7!]!");
    }

    #[test]
    fn test_nullable_strips_only_outer_level() {
        let ty = TypeRef::list_of(TypeRef::required(BuiltinScalar::String), true);
        let relaxed = ty.nullable();
        assert!(!relaxed.is_required());
        assert!(relaxed.list_item().unwrap().is_required());
    }
}
