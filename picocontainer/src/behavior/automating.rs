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

/// Marks the component for instantiation on container start, even if nothing depends on it.
pub struct Automated {
    delegate: ComponentAdapterPtr,
}

impl Automated {
    pub fn new(delegate: ComponentAdapterPtr) -> Self {
        Self { delegate }
    }
}

impl ComponentAdapter for Automated {
    #[inline]
    fn key(&self) -> &ComponentKey {
        self.delegate.key()
    }

    #[inline]
    fn definition(&self) -> &ComponentDefinition {
        self.delegate.definition()
    }

    fn instance(
        &self,
        instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError> {
        self.delegate.instance(instance_provider)
    }

    fn descriptor(&self) -> String {
        "Automated".to_string()
    }

    #[inline]
    fn delegate(&self) -> Option<&ComponentAdapterPtr> {
        Some(&self.delegate)
    }

    #[inline]
    fn is_automatic(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Makes all components automatic.
#[derive(Clone, Default)]
pub struct Automating {
    delegate: Option<BehaviorFactoryPtr>,
}

impl Automating {
    pub fn wrap(mut self, delegate: BehaviorFactoryPtr) -> Self {
        self.delegate = Some(delegate);
        self
    }
}

impl BehaviorFactory for Automating {
    fn add_component_adapter(
        &self,
        monitor: &MonitorHandle,
        lifecycle_strategy: &LifecycleStrategyPtr,
        characteristics: &mut Characteristics,
        adapter: ComponentAdapterPtr,
    ) -> Result<ComponentAdapterPtr, ContainerError> {
        characteristics.remove(&Characteristic::Automatic);

        let adapter = delegate_adapter(
            &self.delegate,
            monitor,
            lifecycle_strategy,
            characteristics,
            adapter,
        )?;

        let adapter: ComponentAdapterPtr = Arc::new(Automated::new(adapter));
        report_behavior(monitor, &adapter);
        Ok(adapter)
    }
}
