//! Type-erased access to component instances. Containers hand out instances as
//! [ComponentInstanceAnyPtr] together with a [CastFunction] which knows how to turn the erased
//! pointer into a [ComponentInstancePtr] of the requested type. [TypedComponentInstanceProvider]
//! wraps this in a strongly-typed API.

pub use crate::error::ComponentInstanceProviderError;
use crate::key::TypeInfo;
use std::any::{Any, TypeId};
use std::error::Error;
use std::sync::Arc;

pub type ComponentInstancePtr<T> = Arc<T>;

pub type ComponentInstanceAnyPtr = ComponentInstancePtr<dyn Any + Send + Sync + 'static>;

/// Shared pointer to user errors, e.g. from custom constructors or lifecycle methods.
pub type ErrorPtr = Arc<dyn Error + Send + Sync>;

/// Casts a type-erased instance to `Box<ComponentInstancePtr<Target>>` erased as `Box<dyn Any>`,
/// where `Target` is the type the function was generated for. Returns the original instance on
/// failure.
pub type CastFunction =
    fn(instance: ComponentInstanceAnyPtr) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr>;

/// Generic provider for component instances. This is what component constructors see when
/// requesting their dependencies.
pub trait ComponentInstanceProvider {
    /// Tries to return the single instance providing a given type. When multiple candidates are
    /// present, the optional name hint selects the one registered under the same name; otherwise
    /// the one marked as primary is selected.
    fn primary_instance(
        &mut self,
        requested: TypeInfo,
        name_hint: Option<&str>,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>;

    /// Returns all instances providing a given type.
    fn instances(
        &mut self,
        requested: TypeInfo,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>;

    /// Returns the instance registered under a given name. If a type is requested, the instance
    /// must provide it. Without a requested type, the returned cast function passes the erased
    /// instance through unchanged.
    fn instance_by_name(
        &mut self,
        name: &str,
        requested: Option<TypeInfo>,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>;
}

/// Helper trait for [ComponentInstanceProvider] providing strongly-typed access.
pub trait TypedComponentInstanceProvider {
    /// Typesafe version of [ComponentInstanceProvider::primary_instance].
    fn primary_instance_typed<T: ?Sized + 'static>(
        &mut self,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError>;

    /// Like [TypedComponentInstanceProvider::primary_instance_typed], but uses the given name as a
    /// hint when multiple candidates are present.
    fn primary_instance_hinted<T: ?Sized + 'static>(
        &mut self,
        name_hint: &str,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError>;

    /// Tries to get an instance like [TypedComponentInstanceProvider::primary_instance_typed] does,
    /// but returns `None` on missing instance. Missing dependencies of the instance itself are
    /// still reported as errors.
    fn primary_instance_option<T: ?Sized + 'static>(
        &mut self,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentInstanceProviderError>;

    /// Typesafe version of [ComponentInstanceProvider::instances].
    fn instances_typed<T: ?Sized + 'static>(
        &mut self,
    ) -> Result<Vec<ComponentInstancePtr<T>>, ComponentInstanceProviderError>;

    /// Typesafe version of [ComponentInstanceProvider::instance_by_name].
    fn instance_by_name_typed<T: ?Sized + 'static>(
        &mut self,
        name: &str,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError>;

    /// Tries to get an instance like [TypedComponentInstanceProvider::instance_by_name_typed]
    /// does, but returns `None` on missing instance.
    fn instance_by_name_option<T: ?Sized + 'static>(
        &mut self,
        name: &str,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentInstanceProviderError>;
}

pub(crate) fn cast<T: ?Sized + 'static>(
    (instance, cast): (ComponentInstanceAnyPtr, CastFunction),
) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
    cast(instance)
        .ok()
        .and_then(|instance| instance.downcast::<ComponentInstancePtr<T>>().ok())
        .map(|instance| *instance)
        .ok_or_else(|| ComponentInstanceProviderError::IncompatibleComponent(TypeInfo::of::<T>()))
}

impl<CIP: ComponentInstanceProvider + ?Sized> TypedComponentInstanceProvider for CIP {
    fn primary_instance_typed<T: ?Sized + 'static>(
        &mut self,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
        self.primary_instance(TypeInfo::of::<T>(), None)
            .and_then(cast::<T>)
    }

    fn primary_instance_hinted<T: ?Sized + 'static>(
        &mut self,
        name_hint: &str,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
        self.primary_instance(TypeInfo::of::<T>(), Some(name_hint))
            .and_then(cast::<T>)
    }

    fn primary_instance_option<T: ?Sized + 'static>(
        &mut self,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentInstanceProviderError> {
        match self.primary_instance_typed::<T>() {
            Ok(instance) => Ok(Some(instance)),
            Err(ComponentInstanceProviderError::NoPrimaryInstance(type_info))
                if type_info.id() == TypeId::of::<T>() =>
            {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn instances_typed<T: ?Sized + 'static>(
        &mut self,
    ) -> Result<Vec<ComponentInstancePtr<T>>, ComponentInstanceProviderError> {
        self.instances(TypeInfo::of::<T>())
            .and_then(|instances| instances.into_iter().map(cast::<T>).collect())
    }

    fn instance_by_name_typed<T: ?Sized + 'static>(
        &mut self,
        name: &str,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
        self.instance_by_name(name, Some(TypeInfo::of::<T>()))
            .and_then(cast::<T>)
    }

    fn instance_by_name_option<T: ?Sized + 'static>(
        &mut self,
        name: &str,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentInstanceProviderError> {
        match self.instance_by_name_typed::<T>(name) {
            Ok(instance) => Ok(Some(instance)),
            Err(ComponentInstanceProviderError::NoNamedInstance(missing)) if missing == name => {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }
}
