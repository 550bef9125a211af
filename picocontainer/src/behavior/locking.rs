use crate::adapter::{ComponentAdapter, ComponentAdapterPtr};
use crate::behavior::{delegate_adapter, report_behavior, BehaviorFactory, BehaviorFactoryPtr};
use crate::characteristics::{Characteristic, Characteristics};
use crate::definition::ComponentDefinition;
use crate::error::{ComponentInstanceProviderError, ContainerError};
use crate::instance_provider::{ComponentInstanceAnyPtr, ComponentInstanceProvider};
use crate::key::ComponentKey;
use crate::lifecycle::LifecycleStrategyPtr;
use crate::monitor::MonitorHandle;
use crate::sync::lock;
use std::any::Any;
use std::sync::{Arc, Mutex};

/// Serializes instance creation, so only one thread at a time can create an instance.
pub struct Locked {
    delegate: ComponentAdapterPtr,
    lock: Mutex<()>,
}

impl Locked {
    pub fn new(delegate: ComponentAdapterPtr) -> Self {
        Self {
            delegate,
            lock: Mutex::new(()),
        }
    }
}

impl ComponentAdapter for Locked {
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
        let _guard = lock(&self.lock);
        self.delegate.instance(instance_provider)
    }

    fn descriptor(&self) -> String {
        "Locked".to_string()
    }

    #[inline]
    fn delegate(&self) -> Option<&ComponentAdapterPtr> {
        Some(&self.delegate)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Locks all components, unless registered with [Characteristic::NoLock].
#[derive(Clone, Default)]
pub struct Locking {
    delegate: Option<BehaviorFactoryPtr>,
}

impl Locking {
    pub fn wrap(mut self, delegate: BehaviorFactoryPtr) -> Self {
        self.delegate = Some(delegate);
        self
    }
}

impl BehaviorFactory for Locking {
    fn add_component_adapter(
        &self,
        monitor: &MonitorHandle,
        lifecycle_strategy: &LifecycleStrategyPtr,
        characteristics: &mut Characteristics,
        adapter: ComponentAdapterPtr,
    ) -> Result<ComponentAdapterPtr, ContainerError> {
        let unlocked = characteristics.remove(&Characteristic::NoLock);
        characteristics.remove(&Characteristic::Lock);

        let adapter = delegate_adapter(
            &self.delegate,
            monitor,
            lifecycle_strategy,
            characteristics,
            adapter,
        )?;

        if unlocked {
            return Ok(adapter);
        }

        let adapter: ComponentAdapterPtr = Arc::new(Locked::new(adapter));
        report_behavior(monitor, &adapter);
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use crate::behavior::tests::{create_adapter, strategy};
    use crate::behavior::{BehaviorFactory, Locked, Locking};
    use crate::adapter::find_adapter_of_type;
    use crate::characteristics::{Characteristic, Characteristics};
    use crate::container::ContainerBuilder;
    use crate::monitor::{MockComponentMonitor, MonitorHandle};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn should_lock_unless_disabled() {
        let mut monitor = MockComponentMonitor::new();
        monitor
            .expect_new_behavior()
            .withf(|_, behavior| behavior == "Locked")
            .times(1)
            .return_const(());
        let monitor = MonitorHandle::new(Arc::new(monitor));

        let mut characteristics = Characteristics::new();
        let adapter = Locking::default()
            .add_component_adapter(&monitor, &strategy(), &mut characteristics, create_adapter())
            .unwrap();
        assert!(find_adapter_of_type::<Locked>(adapter.as_ref()).is_some());

        let mut characteristics = Characteristics::from(Characteristic::NoLock);
        let adapter = Locking::default()
            .add_component_adapter(&monitor, &strategy(), &mut characteristics, create_adapter())
            .unwrap();
        assert!(find_adapter_of_type::<Locked>(adapter.as_ref()).is_none());
        assert!(characteristics.is_empty());
    }

    #[test]
    fn should_serialize_creation_across_threads() {
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));

        let container = ContainerBuilder::new().with_locking().build();
        {
            let active = active.clone();
            let max_active = max_active.clone();
            container
                .add_factory(move |_| {
                    let current = active.fetch_add(1, Ordering::SeqCst) + 1;
                    max_active.fetch_max(current, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(current)
                })
                .unwrap();
        }

        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..3 {
                        container.component::<usize>().unwrap();
                    }
                });
            }
        });

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }
}
