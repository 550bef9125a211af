//! Component adapters produce or hold component instances for a given key. Adapters can be
//! decorated by [behaviors](crate::behavior), forming chains ending in an
//! [Injector](crate::injection::Injector) or an [InstanceAdapter].

use crate::component::DependencyKind;
use crate::container::Container;
use crate::definition::ComponentDefinition;
use crate::error::{ComponentInstanceProviderError, ContainerError};
use crate::instance_provider::{ComponentInstanceAnyPtr, ComponentInstanceProvider};
use crate::key::ComponentKey;
use crate::lifecycle::{
    ComponentLifecycle, LifecycleContext, LifecycleStrategyPtr, StoredInstance,
};
use crate::monitor::MonitorHandle;
use crate::sync::lock;
use itertools::Itertools;
use std::any::Any;
use std::sync::{Arc, Mutex};

pub type ComponentAdapterPtr = Arc<dyn ComponentAdapter>;

/// Produces component instances registered under a single key.
pub trait ComponentAdapter: Send + Sync {
    fn key(&self) -> &ComponentKey;

    fn definition(&self) -> &ComponentDefinition;

    /// Returns an instance, creating it if needed, using the given provider for dependencies.
    fn instance(
        &self,
        instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError>;

    /// Checks if an instance could be created in given container, without instantiating anything.
    fn verify(&self, container: &dyn Container) -> Result<(), ComponentInstanceProviderError> {
        match self.delegate() {
            Some(delegate) => delegate.verify(container),
            None => verify_dependencies(self.definition(), container),
        }
    }

    /// Short description of this adapter alone. See [chain_descriptor] for the whole chain.
    fn descriptor(&self) -> String;

    /// Next adapter in the decoration chain.
    fn delegate(&self) -> Option<&ComponentAdapterPtr> {
        None
    }

    /// Lifecycle of the stored instance, if any adapter in the chain stores one.
    fn lifecycle(&self) -> Option<&dyn ComponentLifecycle> {
        self.delegate().and_then(|delegate| delegate.lifecycle())
    }

    /// Currently stored instance, without creating one.
    fn stored_instance(&self) -> Option<ComponentInstanceAnyPtr> {
        self.delegate()
            .and_then(|delegate| delegate.stored_instance())
    }

    /// Automatic components are instantiated on container start.
    fn is_automatic(&self) -> bool {
        self.delegate()
            .map(|delegate| delegate.is_automatic())
            .unwrap_or_default()
    }

    fn as_any(&self) -> &dyn Any;
}

/// Finds an adapter of given type in the decoration chain, starting with the given adapter.
pub fn find_adapter_of_type<A: ComponentAdapter + 'static>(
    adapter: &dyn ComponentAdapter,
) -> Option<&A> {
    let mut current = adapter;
    loop {
        if let Some(adapter) = current.as_any().downcast_ref::<A>() {
            return Some(adapter);
        }

        current = current.delegate()?.as_ref();
    }
}

/// Describes the whole decoration chain, e.g. `Cached+Lifecycle:ConstructorInjector-app::Foo`.
pub fn chain_descriptor(adapter: &dyn ComponentAdapter) -> String {
    let mut descriptors = vec![adapter.descriptor()];
    let mut current = adapter.delegate();
    while let Some(adapter) = current {
        descriptors.push(adapter.descriptor());
        current = adapter.delegate();
    }

    descriptors.join(":")
}

/// Checks if both pointers refer to the same adapter.
#[inline]
pub fn same_adapter(first: &ComponentAdapterPtr, second: &ComponentAdapterPtr) -> bool {
    Arc::ptr_eq(first, second)
}

/// Checks declared dependencies of a component against given container: required single
/// dependencies must be resolvable and no single dependency may be ambiguous.
pub fn verify_dependencies(
    definition: &ComponentDefinition,
    container: &dyn Container,
) -> Result<(), ComponentInstanceProviderError> {
    for dependency in &definition.dependencies {
        if dependency.kind == DependencyKind::Collection {
            continue;
        }

        let required = dependency.kind == DependencyKind::Single;
        if let Some(name) = &dependency.name {
            match container.component_adapter(&ComponentKey::Name(name.clone())) {
                Some(adapter) if !adapter.definition().provides(dependency.requested) => {
                    return Err(ComponentInstanceProviderError::IncompatibleComponent(
                        dependency.requested,
                    ))
                }
                None if required => {
                    return Err(ComponentInstanceProviderError::NoNamedInstance(
                        name.clone(),
                    ))
                }
                _ => {}
            }
        } else if container
            .find_adapter_for_type(dependency.requested, dependency.hint.as_deref())?
            .is_none()
            && required
        {
            return Err(ComponentInstanceProviderError::NoPrimaryInstance(
                dependency.requested,
            ));
        }
    }

    Ok(())
}

/// Adapter holding a ready-made instance. Registered instances are not decorated by behaviors,
/// but their lifecycle is still managed by the container.
pub struct InstanceAdapter {
    key: ComponentKey,
    definition: ComponentDefinition,
    stored: Mutex<StoredInstance>,
    lifecycle_strategy: LifecycleStrategyPtr,
    monitor: MonitorHandle,
}

impl InstanceAdapter {
    pub fn new(
        key: ComponentKey,
        definition: ComponentDefinition,
        instance: ComponentInstanceAnyPtr,
        lifecycle_strategy: LifecycleStrategyPtr,
        monitor: MonitorHandle,
    ) -> Self {
        Self {
            key,
            definition,
            stored: Mutex::new(StoredInstance::new(instance)),
            lifecycle_strategy,
            monitor,
        }
    }

    fn with_context<R>(
        &self,
        operation: impl FnOnce(&mut StoredInstance, &LifecycleContext) -> R,
    ) -> R {
        let monitor = self.monitor.current();
        let context = LifecycleContext {
            key: &self.key,
            definition: &self.definition,
            strategy: self.lifecycle_strategy.as_ref(),
            monitor: monitor.as_ref(),
        };

        let mut stored = lock(&self.stored);
        operation(&mut *stored, &context)
    }
}

impl ComponentAdapter for InstanceAdapter {
    #[inline]
    fn key(&self) -> &ComponentKey {
        &self.key
    }

    #[inline]
    fn definition(&self) -> &ComponentDefinition {
        &self.definition
    }

    fn instance(
        &self,
        _instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError> {
        lock(&self.stored)
            .instance
            .clone()
            .ok_or_else(|| ComponentInstanceProviderError::NoNamedInstance(self.key.to_string()))
    }

    fn verify(&self, _container: &dyn Container) -> Result<(), ComponentInstanceProviderError> {
        Ok(())
    }

    fn descriptor(&self) -> String {
        format!(
            "Instance-{}",
            self.definition
                .provided_types
                .iter()
                .map(|provided| provided.type_info.name())
                .join("|")
        )
    }

    fn lifecycle(&self) -> Option<&dyn ComponentLifecycle> {
        Some(self)
    }

    fn stored_instance(&self) -> Option<ComponentInstanceAnyPtr> {
        lock(&self.stored).instance.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ComponentLifecycle for InstanceAdapter {
    fn start(&self) -> Result<(), ContainerError> {
        self.with_context(|stored, context| stored.start(context))
    }

    fn stop(&self) -> Result<(), ContainerError> {
        self.with_context(|stored, context| stored.stop(context))
    }

    fn dispose(&self) -> Result<(), ContainerError> {
        self.with_context(|stored, context| stored.dispose(context))
    }

    fn has_lifecycle(&self) -> bool {
        self.lifecycle_strategy.has_lifecycle(&self.definition)
    }

    fn is_started(&self) -> bool {
        lock(&self.stored).is_started()
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::{chain_descriptor, find_adapter_of_type, ComponentAdapter, InstanceAdapter};
    use crate::definition::ComponentDefinition;
    use crate::instance_provider::{ComponentInstanceAnyPtr, ComponentInstancePtr};
    use crate::key::ComponentKey;
    use crate::lifecycle::{NullLifecycleStrategy, StartableLifecycleStrategy};
    use crate::monitor::MonitorHandle;
    use std::sync::Arc;

    fn create_adapter() -> InstanceAdapter {
        InstanceAdapter::new(
            ComponentKey::from("port"),
            ComponentDefinition::of_value::<u16>(),
            ComponentInstancePtr::new(8080u16) as ComponentInstanceAnyPtr,
            Arc::new(StartableLifecycleStrategy::default()),
            MonitorHandle::default(),
        )
    }

    #[test]
    fn should_describe_instance_adapter() {
        let adapter = create_adapter();
        assert_eq!(chain_descriptor(&adapter), "Instance-u16");
        assert!(find_adapter_of_type::<InstanceAdapter>(&adapter).is_some());
        assert!(!adapter.is_automatic());
    }

    #[test]
    fn should_expose_stored_instance() {
        let adapter = create_adapter();
        let instance = adapter
            .stored_instance()
            .unwrap()
            .downcast::<u16>()
            .unwrap();
        assert_eq!(*instance, 8080);
    }

    #[test]
    fn should_report_lifecycle_from_strategy() {
        let adapter = create_adapter();
        assert!(!adapter.lifecycle().unwrap().has_lifecycle());

        let adapter = InstanceAdapter::new(
            ComponentKey::from("port"),
            ComponentDefinition::of_value::<u16>(),
            ComponentInstancePtr::new(8080u16) as ComponentInstanceAnyPtr,
            Arc::new(NullLifecycleStrategy),
            MonitorHandle::default(),
        );
        let lifecycle = adapter.lifecycle().unwrap();
        lifecycle.start().unwrap();
        assert!(lifecycle.is_started());
    }
}
