use crate::adapter::{ComponentAdapter, ComponentAdapterPtr};
use crate::behavior::{delegate_adapter, report_behavior, BehaviorFactory, BehaviorFactoryPtr};
use crate::characteristics::{Characteristic, Characteristics};
use crate::definition::ComponentDefinition;
use crate::error::{ComponentInstanceProviderError, ContainerError};
use crate::instance_provider::{ComponentInstanceAnyPtr, ComponentInstanceProvider};
use crate::key::ComponentKey;
use crate::lifecycle::LifecycleStrategyPtr;
use crate::monitor::MonitorHandle;
use std::any::Any;
use std::sync::Arc;

/// Makes the component available only through its aliases, so dependants cannot rely on the
/// concrete type.
pub struct HiddenImplementation {
    delegate: ComponentAdapterPtr,
    definition: ComponentDefinition,
}

impl HiddenImplementation {
    /// Fails when the component would not be available under any type.
    pub fn new(delegate: ComponentAdapterPtr) -> Result<Self, ContainerError> {
        let mut definition = delegate.definition().clone();
        definition.remove_provided_type(definition.implementation);

        if definition.provided_types.is_empty() {
            return Err(ContainerError::NoAliasToHideBehind(
                delegate.key().to_string(),
            ));
        }

        Ok(Self {
            delegate,
            definition,
        })
    }
}

impl ComponentAdapter for HiddenImplementation {
    #[inline]
    fn key(&self) -> &ComponentKey {
        self.delegate.key()
    }

    #[inline]
    fn definition(&self) -> &ComponentDefinition {
        &self.definition
    }

    fn instance(
        &self,
        instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError> {
        self.delegate.instance(instance_provider)
    }

    fn descriptor(&self) -> String {
        "Hidden".to_string()
    }

    #[inline]
    fn delegate(&self) -> Option<&ComponentAdapterPtr> {
        Some(&self.delegate)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Hides implementations of all components, unless registered with
/// [Characteristic::NoHideImpl].
#[derive(Clone, Default)]
pub struct ImplementationHiding {
    delegate: Option<BehaviorFactoryPtr>,
}

impl ImplementationHiding {
    pub fn wrap(mut self, delegate: BehaviorFactoryPtr) -> Self {
        self.delegate = Some(delegate);
        self
    }
}

impl BehaviorFactory for ImplementationHiding {
    fn add_component_adapter(
        &self,
        monitor: &MonitorHandle,
        lifecycle_strategy: &LifecycleStrategyPtr,
        characteristics: &mut Characteristics,
        adapter: ComponentAdapterPtr,
    ) -> Result<ComponentAdapterPtr, ContainerError> {
        let visible = characteristics.remove(&Characteristic::NoHideImpl);
        characteristics.remove(&Characteristic::HideImpl);

        let adapter = delegate_adapter(
            &self.delegate,
            monitor,
            lifecycle_strategy,
            characteristics,
            adapter,
        )?;

        if visible {
            return Ok(adapter);
        }

        let adapter: ComponentAdapterPtr = Arc::new(HiddenImplementation::new(adapter)?);
        report_behavior(monitor, &adapter);
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::ComponentAdapter;
    use crate::behavior::tests::{create_adapter, strategy};
    use crate::behavior::{BehaviorFactory, HiddenImplementation, ImplementationHiding};
    use crate::characteristics::Characteristics;
    use crate::definition::cast_value;
    use crate::error::ContainerError;
    use crate::injection::ComponentRegistration;
    use crate::instance_provider::CastFunction;
    use crate::key::TypeInfo;
    use crate::monitor::MonitorHandle;

    #[test]
    fn should_require_alias_to_hide_behind() {
        assert!(matches!(
            HiddenImplementation::new(create_adapter()),
            Err(ContainerError::NoAliasToHideBehind(..))
        ));
    }

    #[test]
    fn should_hide_implementation_type() {
        let (adapter, _) = ComponentRegistration::<u8>::factory(|_| Ok(7))
            .provides(TypeInfo::of::<i8>(), cast_value::<i8> as CastFunction)
            .into_adapter(&MonitorHandle::default());

        let mut characteristics = Characteristics::new();
        let adapter = ImplementationHiding::default()
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                adapter,
            )
            .unwrap();

        assert!(!adapter.definition().provides(TypeInfo::of::<u8>()));
        assert!(adapter.definition().provides(TypeInfo::of::<i8>()));
    }
}
