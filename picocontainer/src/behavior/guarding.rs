use crate::adapter::{ComponentAdapter, ComponentAdapterPtr};
use crate::behavior::{delegate_adapter, report_behavior, BehaviorFactory, BehaviorFactoryPtr};
use crate::characteristics::Characteristics;
use crate::container::Container;
use crate::definition::ComponentDefinition;
use crate::error::{ComponentInstanceProviderError, ContainerError};
use crate::instance_provider::{ComponentInstanceAnyPtr, ComponentInstanceProvider};
use crate::key::ComponentKey;
use crate::lifecycle::LifecycleStrategyPtr;
use crate::monitor::MonitorHandle;
use std::any::Any;
use std::sync::Arc;

/// Requires a guard component to be resolvable before an instance is created. Failing to create
/// the guard fails the request.
pub struct Guarded {
    delegate: ComponentAdapterPtr,
    guard: String,
}

impl Guarded {
    pub fn new(delegate: ComponentAdapterPtr, guard: String) -> Self {
        Self { delegate, guard }
    }

    #[inline]
    pub fn guard(&self) -> &str {
        &self.guard
    }
}

impl ComponentAdapter for Guarded {
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
        instance_provider
            .instance_by_name(&self.guard, None)
            .map_err(|error| ComponentInstanceProviderError::GuardFailed {
                component: self.key().to_string(),
                guard: self.guard.clone(),
                error: Box::new(error),
            })?;

        self.delegate.instance(instance_provider)
    }

    fn verify(&self, container: &dyn Container) -> Result<(), ComponentInstanceProviderError> {
        if container
            .component_adapter(&ComponentKey::Name(self.guard.clone()))
            .is_none()
        {
            return Err(ComponentInstanceProviderError::NoNamedInstance(
                self.guard.clone(),
            ));
        }

        self.delegate.verify(container)
    }

    fn descriptor(&self) -> String {
        format!("Guarded({})", self.guard)
    }

    #[inline]
    fn delegate(&self) -> Option<&ComponentAdapterPtr> {
        Some(&self.delegate)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Guards components registered with [Characteristic::Guard](crate::characteristics::Characteristic::Guard).
#[derive(Clone, Default)]
pub struct Guarding {
    delegate: Option<BehaviorFactoryPtr>,
}

impl Guarding {
    pub fn wrap(mut self, delegate: BehaviorFactoryPtr) -> Self {
        self.delegate = Some(delegate);
        self
    }
}

impl BehaviorFactory for Guarding {
    fn add_component_adapter(
        &self,
        monitor: &MonitorHandle,
        lifecycle_strategy: &LifecycleStrategyPtr,
        characteristics: &mut Characteristics,
        adapter: ComponentAdapterPtr,
    ) -> Result<ComponentAdapterPtr, ContainerError> {
        let guard = characteristics.take_guard();
        let adapter = delegate_adapter(
            &self.delegate,
            monitor,
            lifecycle_strategy,
            characteristics,
            adapter,
        )?;

        Ok(match guard {
            Some(guard) => {
                let adapter: ComponentAdapterPtr = Arc::new(Guarded::new(adapter, guard));
                report_behavior(monitor, &adapter);
                adapter
            }
            None => adapter,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::{chain_descriptor, ComponentAdapter};
    use crate::behavior::tests::{create_adapter, strategy};
    use crate::behavior::{BehaviorFactory, Guarded, Guarding};
    use crate::characteristics::{Characteristic, Characteristics};
    use crate::instance_provider::{
        CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider,
        ComponentInstanceProviderError, ComponentInstancePtr,
    };
    use crate::key::TypeInfo;
    use crate::monitor::MonitorHandle;

    struct GuardProvider {
        allow: bool,
    }

    impl ComponentInstanceProvider for GuardProvider {
        fn primary_instance(
            &mut self,
            requested: TypeInfo,
            _name_hint: Option<&str>,
        ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>
        {
            Err(ComponentInstanceProviderError::NoPrimaryInstance(
                requested,
            ))
        }

        fn instances(
            &mut self,
            _requested: TypeInfo,
        ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>
        {
            Ok(vec![])
        }

        fn instance_by_name(
            &mut self,
            name: &str,
            _requested: Option<TypeInfo>,
        ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>
        {
            if self.allow {
                Ok((
                    ComponentInstancePtr::new(()) as ComponentInstanceAnyPtr,
                    crate::definition::cast_value::<()> as CastFunction,
                ))
            } else {
                Err(ComponentInstanceProviderError::NoNamedInstance(
                    name.to_string(),
                ))
            }
        }
    }

    #[test]
    fn should_fail_without_guard() {
        let guarded = Guarded::new(create_adapter(), "guard".to_string());

        assert!(guarded
            .instance(&mut GuardProvider { allow: true })
            .is_ok());
        assert!(matches!(
            guarded
                .instance(&mut GuardProvider { allow: false })
                .unwrap_err(),
            ComponentInstanceProviderError::GuardFailed { guard, .. } if guard == "guard"
        ));
    }

    #[test]
    fn should_guard_only_with_characteristic() {
        let mut characteristics = Characteristics::new();
        let adapter = Guarding::default()
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                create_adapter(),
            )
            .unwrap();
        assert!(adapter.delegate().is_none());

        let mut characteristics = Characteristics::from(Characteristic::Guard("lock".to_string()));
        let adapter = Guarding::default()
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                create_adapter(),
            )
            .unwrap();
        assert_eq!(
            chain_descriptor(adapter.as_ref()),
            "Guarded(lock):FactoryInjector-u8"
        );
    }
}
