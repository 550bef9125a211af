use crate::adapter::{ComponentAdapter, ComponentAdapterPtr};
use crate::behavior::{delegate_adapter, report_behavior, BehaviorFactory, BehaviorFactoryPtr};
use crate::characteristics::{Characteristic, Characteristics};
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
use std::any::Any;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Stores the first created instance and returns it on subsequent requests. Owns the lifecycle
/// of the stored instance.
pub struct Cached {
    delegate: ComponentAdapterPtr,
    stored: Mutex<StoredInstance>,
    lifecycle_strategy: LifecycleStrategyPtr,
    monitor: MonitorHandle,
}

impl Cached {
    pub fn new(
        delegate: ComponentAdapterPtr,
        lifecycle_strategy: LifecycleStrategyPtr,
        monitor: MonitorHandle,
    ) -> Self {
        Self {
            delegate,
            stored: Default::default(),
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
            key: self.delegate.key(),
            definition: self.delegate.definition(),
            strategy: self.lifecycle_strategy.as_ref(),
            monitor: monitor.as_ref(),
        };

        let mut stored = lock(&self.stored);
        operation(&mut *stored, &context)
    }

    /// Forgets the stored instance, stopping and disposing it first if needed. The next request
    /// creates a new instance.
    pub fn flush(&self) -> Result<(), ContainerError> {
        debug!(key = %self.delegate.key(), "Flushing cached instance.");

        let has_lifecycle = self.has_lifecycle();
        self.with_context(|stored, context| {
            let result = if has_lifecycle && stored.instance.is_some() {
                stored.dispose(context)
            } else {
                Ok(())
            };

            *stored = StoredInstance::default();
            result
        })
    }
}

impl ComponentAdapter for Cached {
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
        if let Some(instance) = lock(&self.stored).instance.clone() {
            return Ok(instance);
        }

        // constructed outside the lock; the first stored instance wins
        let instance = self.delegate.instance(instance_provider)?;

        let mut stored = lock(&self.stored);
        Ok(stored.instance.get_or_insert(instance).clone())
    }

    fn verify(&self, container: &dyn Container) -> Result<(), ComponentInstanceProviderError> {
        self.delegate.verify(container)
    }

    fn descriptor(&self) -> String {
        "Cached+Lifecycle".to_string()
    }

    #[inline]
    fn delegate(&self) -> Option<&ComponentAdapterPtr> {
        Some(&self.delegate)
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

impl ComponentLifecycle for Cached {
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
        self.lifecycle_strategy
            .has_lifecycle(self.delegate.definition())
    }

    fn is_started(&self) -> bool {
        lock(&self.stored).is_started()
    }
}

fn cache(
    monitor: &MonitorHandle,
    lifecycle_strategy: &LifecycleStrategyPtr,
    adapter: ComponentAdapterPtr,
) -> ComponentAdapterPtr {
    let adapter: ComponentAdapterPtr = Arc::new(Cached::new(
        adapter,
        lifecycle_strategy.clone(),
        monitor.clone(),
    ));
    report_behavior(monitor, &adapter);
    adapter
}

/// Caches all components, unless registered with [Characteristic::NoCache].
#[derive(Clone, Default)]
pub struct Caching {
    delegate: Option<BehaviorFactoryPtr>,
}

impl Caching {
    pub fn wrap(mut self, delegate: BehaviorFactoryPtr) -> Self {
        self.delegate = Some(delegate);
        self
    }
}

impl BehaviorFactory for Caching {
    fn add_component_adapter(
        &self,
        monitor: &MonitorHandle,
        lifecycle_strategy: &LifecycleStrategyPtr,
        characteristics: &mut Characteristics,
        adapter: ComponentAdapterPtr,
    ) -> Result<ComponentAdapterPtr, ContainerError> {
        let no_cache = characteristics.remove(&Characteristic::NoCache);
        characteristics.remove(&Characteristic::Cache);

        let adapter = delegate_adapter(
            &self.delegate,
            monitor,
            lifecycle_strategy,
            characteristics,
            adapter,
        )?;

        Ok(if no_cache {
            adapter
        } else {
            cache(monitor, lifecycle_strategy, adapter)
        })
    }
}

/// Caches only components registered with [Characteristic::Cache].
#[derive(Clone, Default)]
pub struct OptInCaching {
    delegate: Option<BehaviorFactoryPtr>,
}

impl OptInCaching {
    pub fn wrap(mut self, delegate: BehaviorFactoryPtr) -> Self {
        self.delegate = Some(delegate);
        self
    }
}

impl BehaviorFactory for OptInCaching {
    fn add_component_adapter(
        &self,
        monitor: &MonitorHandle,
        lifecycle_strategy: &LifecycleStrategyPtr,
        characteristics: &mut Characteristics,
        adapter: ComponentAdapterPtr,
    ) -> Result<ComponentAdapterPtr, ContainerError> {
        let cached = characteristics.remove(&Characteristic::Cache);
        characteristics.remove(&Characteristic::NoCache);

        let adapter = delegate_adapter(
            &self.delegate,
            monitor,
            lifecycle_strategy,
            characteristics,
            adapter,
        )?;

        Ok(if cached {
            cache(monitor, lifecycle_strategy, adapter)
        } else {
            adapter
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::{find_adapter_of_type, ComponentAdapter};
    use crate::behavior::tests::{create_adapter, strategy};
    use crate::behavior::{BehaviorFactory, Cached, Caching, OptInCaching};
    use crate::characteristics::{Characteristic, Characteristics};
    use crate::error::ContainerError;
    use crate::injection::ComponentRegistration;
    use crate::instance_provider::{
        CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider,
        ComponentInstanceProviderError,
    };
    use crate::key::TypeInfo;
    use crate::lifecycle::{ComponentLifecycle, StartableLifecycleStrategy};
    use crate::monitor::MonitorHandle;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NoProvider;

    impl ComponentInstanceProvider for NoProvider {
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
            Err(ComponentInstanceProviderError::NoNamedInstance(
                name.to_string(),
            ))
        }
    }

    #[test]
    fn should_cache_instance() {
        let counter = Arc::new(AtomicUsize::new(0));
        let factory_counter = counter.clone();
        let (adapter, _) = ComponentRegistration::<usize>::factory(move |_| {
            Ok(factory_counter.fetch_add(1, Ordering::SeqCst))
        })
        .into_adapter(&MonitorHandle::default());

        let cached = Cached::new(
            adapter,
            Arc::new(StartableLifecycleStrategy::default()),
            MonitorHandle::default(),
        );
        let first = cached.instance(&mut NoProvider).unwrap();
        let second = cached.instance(&mut NoProvider).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        cached.flush().unwrap();
        assert!(cached.stored_instance().is_none());
        cached.instance(&mut NoProvider).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn should_not_start_uninstantiated_instance() {
        let cached = Cached::new(
            create_adapter(),
            strategy(),
            MonitorHandle::default(),
        );
        assert!(matches!(
            cached.start().unwrap_err(),
            ContainerError::IllegalComponentState {
                message: "not instantiated",
                ..
            }
        ));
    }

    #[test]
    fn should_skip_caching_on_no_cache() {
        let mut characteristics = Characteristics::from(Characteristic::NoCache);
        let adapter = Caching::default()
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                create_adapter(),
            )
            .unwrap();

        assert!(characteristics.is_empty());
        assert!(find_adapter_of_type::<Cached>(adapter.as_ref()).is_none());
    }

    #[test]
    fn should_cache_only_opted_in() {
        let mut characteristics = Characteristics::new();
        let adapter = OptInCaching::default()
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                create_adapter(),
            )
            .unwrap();
        assert!(adapter.lifecycle().is_none());

        let mut characteristics = Characteristics::from(Characteristic::Cache);
        let adapter = OptInCaching::default()
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                create_adapter(),
            )
            .unwrap();
        assert!(find_adapter_of_type::<Cached>(adapter.as_ref()).is_some());
    }
}
