//! Keys under which component adapters are registered in a container.
//!
//! A component is registered either under its type or under a name. Type keys are built from
//! [TypeInfo], which pairs a [TypeId] with a human readable type name for diagnostics.

use std::any::{type_name, TypeId};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Runtime type identity with a readable name. Equality and hashing only consider the [TypeId].
#[derive(Clone, Copy, Debug, Eq)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// Creates type information for `T`, which can also be an unsized `dyn Trait`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Unique key of a component adapter within a single container.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKey {
    Type(TypeInfo),
    Name(String),
}

impl ComponentKey {
    /// Key for a component registered under type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeInfo::of::<T>())
    }

    /// Returns the name, if this is a named key.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Type(_) => None,
        }
    }
}

impl Display for ComponentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Type(type_info) => write!(f, "{type_info}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

impl From<&str> for ComponentKey {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for ComponentKey {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<TypeInfo> for ComponentKey {
    fn from(value: TypeInfo) -> Self {
        Self::Type(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::key::{ComponentKey, TypeInfo};
    use fxhash::FxHashSet;

    trait TestTrait {}

    #[test]
    fn should_compare_type_info_by_id() {
        assert_eq!(TypeInfo::of::<i8>(), TypeInfo::of::<i8>());
        assert_ne!(TypeInfo::of::<i8>(), TypeInfo::of::<u8>());
        assert_ne!(
            TypeInfo::of::<dyn TestTrait>(),
            TypeInfo::of::<dyn TestTrait + Send + Sync>()
        );
    }

    #[test]
    fn should_distinguish_type_and_name_keys() {
        let keys: FxHashSet<_> = [
            ComponentKey::of::<String>(),
            ComponentKey::from("string"),
            ComponentKey::of::<String>(),
        ]
        .into_iter()
        .collect();

        assert_eq!(keys.len(), 2);
        assert_eq!(ComponentKey::from("string").name(), Some("string"));
        assert_eq!(ComponentKey::of::<String>().name(), None);
    }

    #[test]
    fn should_display_keys() {
        assert_eq!(ComponentKey::from("port").to_string(), "'port'");
        assert_eq!(ComponentKey::of::<u16>().to_string(), "u16");
    }
}
