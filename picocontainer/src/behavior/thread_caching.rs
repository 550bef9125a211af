use crate::adapter::{ComponentAdapter, ComponentAdapterPtr};
use crate::behavior::{delegate_adapter, report_behavior, BehaviorFactory, BehaviorFactoryPtr};
use crate::characteristics::{Characteristic, Characteristics};
use crate::container::Container;
use crate::definition::ComponentDefinition;
use crate::error::{ComponentInstanceProviderError, ContainerError};
use crate::instance_provider::{ComponentInstanceAnyPtr, ComponentInstanceProvider};
use crate::key::ComponentKey;
use crate::lifecycle::LifecycleStrategyPtr;
use crate::monitor::MonitorHandle;
use crate::sync::lock;
use fxhash::FxHashMap;
use std::any::Any;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use tracing::debug;

/// Stores one instance per thread. Thread-scoped instances do not take part in the container
/// lifecycle.
pub struct ThreadCached {
    delegate: ComponentAdapterPtr,
    stored: Mutex<FxHashMap<ThreadId, ComponentInstanceAnyPtr>>,
}

impl ThreadCached {
    pub fn new(delegate: ComponentAdapterPtr) -> Self {
        Self {
            delegate,
            stored: Default::default(),
        }
    }

    /// Forgets the instance stored for the current thread.
    pub fn flush(&self) {
        debug!(key = %self.delegate.key(), "Flushing thread cached instance.");
        lock(&self.stored).remove(&thread::current().id());
    }

    /// Number of threads currently holding an instance.
    pub fn thread_count(&self) -> usize {
        lock(&self.stored).len()
    }
}

impl ComponentAdapter for ThreadCached {
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
        let thread_id = thread::current().id();
        if let Some(instance) = lock(&self.stored).get(&thread_id) {
            return Ok(instance.clone());
        }

        let instance = self.delegate.instance(instance_provider)?;
        Ok(lock(&self.stored)
            .entry(thread_id)
            .or_insert(instance)
            .clone())
    }

    fn verify(&self, container: &dyn Container) -> Result<(), ComponentInstanceProviderError> {
        self.delegate.verify(container)
    }

    fn descriptor(&self) -> String {
        "ThreadCached".to_string()
    }

    #[inline]
    fn delegate(&self) -> Option<&ComponentAdapterPtr> {
        Some(&self.delegate)
    }

    fn stored_instance(&self) -> Option<ComponentInstanceAnyPtr> {
        lock(&self.stored).get(&thread::current().id()).cloned()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Caches all components per thread, unless registered with [Characteristic::NoCache].
#[derive(Clone, Default)]
pub struct ThreadCaching {
    delegate: Option<BehaviorFactoryPtr>,
}

impl ThreadCaching {
    pub fn wrap(mut self, delegate: BehaviorFactoryPtr) -> Self {
        self.delegate = Some(delegate);
        self
    }
}

impl BehaviorFactory for ThreadCaching {
    fn add_component_adapter(
        &self,
        monitor: &MonitorHandle,
        lifecycle_strategy: &LifecycleStrategyPtr,
        characteristics: &mut Characteristics,
        adapter: ComponentAdapterPtr,
    ) -> Result<ComponentAdapterPtr, ContainerError> {
        let no_cache = characteristics.remove(&Characteristic::NoCache);
        characteristics.remove(&Characteristic::ThreadCache);

        let adapter = delegate_adapter(
            &self.delegate,
            monitor,
            lifecycle_strategy,
            characteristics,
            adapter,
        )?;

        if no_cache {
            return Ok(adapter);
        }

        let adapter: ComponentAdapterPtr = Arc::new(ThreadCached::new(adapter));
        report_behavior(monitor, &adapter);
        Ok(adapter)
    }
}
