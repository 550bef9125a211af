//! Static descriptions of what a [ComponentAdapter](crate::adapter::ComponentAdapter) produces.

use crate::component::{Component, ComponentDowncast, Dependency};
use crate::instance_provider::{CastFunction, ComponentInstanceAnyPtr};
use crate::key::TypeInfo;
use crate::lifecycle::{DisposableCast, StartableCast};
use derivative::Derivative;
use std::any::Any;

/// A type which can be requested from an adapter, along with the function casting erased
/// instances to it.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ProvidedType {
    pub type_info: TypeInfo,

    #[derivative(Debug = "ignore")]
    pub cast: CastFunction,
}

/// Definition of a component produced by an adapter.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ComponentDefinition {
    /// Concrete type of produced instances.
    pub implementation: TypeInfo,

    /// Types under which instances can be requested, in registration order. Contains the
    /// implementation type, unless hidden, and all registered aliases.
    pub provided_types: Vec<ProvidedType>,

    /// Declared dependencies. Only informative - instantiation asks the provider directly.
    pub dependencies: Vec<Dependency>,

    /// With multiple components providing a given type within one container, one of them can be
    /// marked as primary and returned when requesting a single instance.
    pub is_primary: bool,

    #[derivative(Debug = "ignore")]
    pub startable: Option<StartableCast>,

    #[derivative(Debug = "ignore")]
    pub disposable: Option<DisposableCast>,
}

impl ComponentDefinition {
    /// Creates a definition for a [Component], taking dependencies and lifecycle casts from the
    /// component itself.
    pub fn of<T: Component>() -> Self {
        Self {
            implementation: TypeInfo::of::<T>(),
            provided_types: vec![ProvidedType {
                type_info: TypeInfo::of::<T>(),
                cast: cast_alias::<T, T>,
            }],
            dependencies: T::dependencies(),
            is_primary: false,
            startable: T::startable(),
            disposable: T::disposable(),
        }
    }

    /// Creates a definition for an arbitrary value, e.g. a registered instance or a factory
    /// result.
    pub fn of_value<T: Any + Send + Sync>() -> Self {
        Self {
            implementation: TypeInfo::of::<T>(),
            provided_types: vec![ProvidedType {
                type_info: TypeInfo::of::<T>(),
                cast: cast_value::<T>,
            }],
            dependencies: Vec::new(),
            is_primary: false,
            startable: None,
            disposable: None,
        }
    }

    /// Returns the provided type entry for the requested type.
    pub fn provided_type(&self, requested: TypeInfo) -> Option<&ProvidedType> {
        self.provided_types
            .iter()
            .find(|provided| provided.type_info == requested)
    }

    #[inline]
    pub fn provides(&self, requested: TypeInfo) -> bool {
        self.provided_type(requested).is_some()
    }

    /// Adds another type under which instances can be requested. Already provided types are
    /// ignored.
    pub fn add_provided_type(&mut self, type_info: TypeInfo, cast: CastFunction) {
        if !self.provides(type_info) {
            self.provided_types.push(ProvidedType { type_info, cast });
        }
    }

    /// Removes a provided type, returning if it was present.
    pub fn remove_provided_type(&mut self, type_info: TypeInfo) -> bool {
        let count = self.provided_types.len();
        self.provided_types
            .retain(|provided| provided.type_info != type_info);
        count != self.provided_types.len()
    }

    /// Checks if instances can take part in the container lifecycle.
    #[inline]
    pub fn has_lifecycle(&self) -> bool {
        self.startable.is_some() || self.disposable.is_some()
    }
}

/// [CastFunction] for plain values stored as `T`.
pub fn cast_value<T: Any + Send + Sync>(
    instance: ComponentInstanceAnyPtr,
) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr> {
    instance
        .downcast::<T>()
        .map(|instance| Box::new(instance) as Box<dyn Any>)
}

/// [CastFunction] for components of type `Target` requested as `Source`, which is usually a
/// `dyn Trait`.
pub fn cast_alias<Source: ComponentDowncast<Target> + ?Sized, Target: Component>(
    instance: ComponentInstanceAnyPtr,
) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr> {
    Source::downcast(instance).map(|instance| Box::new(instance) as Box<dyn Any>)
}

#[cfg(test)]
mod tests {
    use crate::definition::{cast_value, ComponentDefinition};
    use crate::instance_provider::{CastFunction, ComponentInstanceAnyPtr, ComponentInstancePtr};
    use crate::key::TypeInfo;

    #[test]
    fn should_provide_value_type() {
        let definition = ComponentDefinition::of_value::<u16>();
        assert!(definition.provides(TypeInfo::of::<u16>()));
        assert!(!definition.provides(TypeInfo::of::<u32>()));
        assert!(!definition.has_lifecycle());
    }

    #[test]
    fn should_not_duplicate_provided_types() {
        let mut definition = ComponentDefinition::of_value::<u16>();
        definition.add_provided_type(TypeInfo::of::<u16>(), cast_value::<u16> as CastFunction);
        definition.add_provided_type(TypeInfo::of::<i16>(), cast_value::<i16> as CastFunction);

        assert_eq!(definition.provided_types.len(), 2);
        assert!(definition.remove_provided_type(TypeInfo::of::<u16>()));
        assert!(!definition.remove_provided_type(TypeInfo::of::<u16>()));
        assert_eq!(definition.provided_types.len(), 1);
    }

    #[test]
    fn should_cast_values() {
        let instance = ComponentInstancePtr::new(3u16) as ComponentInstanceAnyPtr;
        let casted = cast_value::<u16>(instance.clone()).unwrap();
        assert_eq!(
            **casted.downcast::<ComponentInstancePtr<u16>>().unwrap(),
            3u16
        );
        assert!(cast_value::<u8>(instance).is_err());
    }
}
