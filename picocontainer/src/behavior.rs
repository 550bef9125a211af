//! Behaviors decorate component adapters with additional functionality, e.g. caching (per
//! container or per thread), implementation hiding, guarding, locking and automatic
//! instantiation.
//!
//! Behaviors are applied by [BehaviorFactory]s when registering components. Factories can be
//! chained with `wrap()`, in which case the wrapped factory decorates first and its result is
//! decorated by the wrapping one, e.g. `Caching::default().wrap(Arc::new(Locking::default()))`
//! produces `Cached(Locked(injector))`. The default [AdaptingBehavior] picks behaviors based on
//! registration [Characteristics].

mod automating;
mod caching;
mod guarding;
mod hiding;
mod locking;
mod thread_caching;

pub use automating::{Automated, Automating};
pub use caching::{Cached, Caching, OptInCaching};
pub use guarding::{Guarded, Guarding};
pub use hiding::{HiddenImplementation, ImplementationHiding};
pub use locking::{Locked, Locking};
pub use thread_caching::{ThreadCached, ThreadCaching};

use crate::adapter::ComponentAdapterPtr;
use crate::characteristics::{Characteristic, Characteristics};
use crate::error::ContainerError;
use crate::lifecycle::LifecycleStrategyPtr;
use crate::monitor::MonitorHandle;
use std::sync::Arc;

pub type BehaviorFactoryPtr = Arc<dyn BehaviorFactory>;

/// Decorates adapters with behaviors, consuming the [Characteristics] it understands.
pub trait BehaviorFactory: Send + Sync {
    fn add_component_adapter(
        &self,
        monitor: &MonitorHandle,
        lifecycle_strategy: &LifecycleStrategyPtr,
        characteristics: &mut Characteristics,
        adapter: ComponentAdapterPtr,
    ) -> Result<ComponentAdapterPtr, ContainerError>;
}

// Lets the wrapped factory decorate first.
fn delegate_adapter(
    delegate: &Option<BehaviorFactoryPtr>,
    monitor: &MonitorHandle,
    lifecycle_strategy: &LifecycleStrategyPtr,
    characteristics: &mut Characteristics,
    adapter: ComponentAdapterPtr,
) -> Result<ComponentAdapterPtr, ContainerError> {
    match delegate {
        Some(delegate) => {
            delegate.add_component_adapter(monitor, lifecycle_strategy, characteristics, adapter)
        }
        None => Ok(adapter),
    }
}

fn report_behavior(monitor: &MonitorHandle, adapter: &ComponentAdapterPtr) {
    monitor
        .current()
        .new_behavior(adapter.key(), &adapter.descriptor());
}

/// Composition of two arbitrary factories: `inner` decorates first, then `outer`.
pub struct ComposedBehavior {
    outer: BehaviorFactoryPtr,
    inner: BehaviorFactoryPtr,
}

impl ComposedBehavior {
    pub fn new(outer: BehaviorFactoryPtr, inner: BehaviorFactoryPtr) -> Self {
        Self { outer, inner }
    }
}

impl BehaviorFactory for ComposedBehavior {
    fn add_component_adapter(
        &self,
        monitor: &MonitorHandle,
        lifecycle_strategy: &LifecycleStrategyPtr,
        characteristics: &mut Characteristics,
        adapter: ComponentAdapterPtr,
    ) -> Result<ComponentAdapterPtr, ContainerError> {
        let adapter = self.inner.add_component_adapter(
            monitor,
            lifecycle_strategy,
            characteristics,
            adapter,
        )?;
        self.outer
            .add_component_adapter(monitor, lifecycle_strategy, characteristics, adapter)
    }
}

/// Chooses behaviors based on characteristics. From the innermost: [Locked] for
/// [Characteristic::Lock], [Automated] for [Characteristic::Automatic], [HiddenImplementation]
/// for [Characteristic::HideImpl], [Cached] for [Characteristic::Cache] or [ThreadCached] for
/// [Characteristic::ThreadCache] and [Guarded] for [Characteristic::Guard]. Without any of them
/// the adapter is left as is.
#[derive(Clone, Copy, Debug, Default)]
pub struct AdaptingBehavior;

impl BehaviorFactory for AdaptingBehavior {
    fn add_component_adapter(
        &self,
        monitor: &MonitorHandle,
        lifecycle_strategy: &LifecycleStrategyPtr,
        characteristics: &mut Characteristics,
        adapter: ComponentAdapterPtr,
    ) -> Result<ComponentAdapterPtr, ContainerError> {
        let mut adapter = adapter;

        if characteristics.contains(&Characteristic::Lock) {
            adapter = Locking::default().add_component_adapter(
                monitor,
                lifecycle_strategy,
                characteristics,
                adapter,
            )?;
        }
        characteristics.remove(&Characteristic::NoLock);

        if characteristics.contains(&Characteristic::Automatic) {
            adapter = Automating::default().add_component_adapter(
                monitor,
                lifecycle_strategy,
                characteristics,
                adapter,
            )?;
        }

        if characteristics.contains(&Characteristic::HideImpl) {
            adapter = ImplementationHiding::default().add_component_adapter(
                monitor,
                lifecycle_strategy,
                characteristics,
                adapter,
            )?;
        }
        characteristics.remove(&Characteristic::NoHideImpl);

        if characteristics.contains(&Characteristic::ThreadCache) {
            adapter = ThreadCaching::default().add_component_adapter(
                monitor,
                lifecycle_strategy,
                characteristics,
                adapter,
            )?;
        }

        adapter = OptInCaching::default().add_component_adapter(
            monitor,
            lifecycle_strategy,
            characteristics,
            adapter,
        )?;

        Guarding::default().add_component_adapter(
            monitor,
            lifecycle_strategy,
            characteristics,
            adapter,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::{chain_descriptor, ComponentAdapter, ComponentAdapterPtr};
    use crate::behavior::{
        AdaptingBehavior, BehaviorFactory, BehaviorFactoryPtr, Caching, ComposedBehavior,
        Locking,
    };
    use crate::characteristics::{Characteristic, Characteristics};
    use crate::injection::ComponentRegistration;
    use crate::lifecycle::{LifecycleStrategyPtr, StartableLifecycleStrategy};
    use crate::monitor::MonitorHandle;
    use std::sync::Arc;

    pub(crate) fn create_adapter() -> ComponentAdapterPtr {
        ComponentRegistration::<u8>::factory(|_| Ok(7))
            .into_adapter(&MonitorHandle::default())
            .0
    }

    pub(crate) fn strategy() -> LifecycleStrategyPtr {
        Arc::new(StartableLifecycleStrategy::default())
    }

    #[test]
    fn should_leave_plain_adapter_untouched() {
        let mut characteristics = Characteristics::new();
        let adapter = AdaptingBehavior
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                create_adapter(),
            )
            .unwrap();

        assert_eq!(chain_descriptor(adapter.as_ref()), "FactoryInjector-u8");
    }

    #[test]
    fn should_adapt_to_characteristics() {
        let mut characteristics = Characteristics::from([
            Characteristic::Cache,
            Characteristic::Lock,
            Characteristic::Automatic,
            Characteristic::NoHideImpl,
        ]);
        let adapter = AdaptingBehavior
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                create_adapter(),
            )
            .unwrap();

        assert!(characteristics.is_empty());
        assert!(adapter.is_automatic());
        assert_eq!(
            chain_descriptor(adapter.as_ref()),
            "Cached+Lifecycle:Automated:Locked:FactoryInjector-u8"
        );
    }

    #[test]
    fn should_adapt_to_thread_caching() {
        let mut characteristics = Characteristics::from(Characteristic::ThreadCache);
        let adapter = AdaptingBehavior
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                create_adapter(),
            )
            .unwrap();

        assert!(characteristics.is_empty());
        assert_eq!(
            chain_descriptor(adapter.as_ref()),
            "ThreadCached:FactoryInjector-u8"
        );
    }

    #[test]
    fn should_chain_wrapped_factories() {
        let mut characteristics = Characteristics::new();
        let factory = Caching::default().wrap(Arc::new(Locking::default()));
        let adapter = factory
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                create_adapter(),
            )
            .unwrap();

        assert_eq!(
            chain_descriptor(adapter.as_ref()),
            "Cached+Lifecycle:Locked:FactoryInjector-u8"
        );
    }

    #[test]
    fn should_compose_factories() {
        let mut characteristics = Characteristics::new();
        let factory = ComposedBehavior::new(
            Arc::new(Locking::default()) as BehaviorFactoryPtr,
            Arc::new(Caching::default()) as BehaviorFactoryPtr,
        );
        let adapter = factory
            .add_component_adapter(
                &MonitorHandle::default(),
                &strategy(),
                &mut characteristics,
                create_adapter(),
            )
            .unwrap();

        assert_eq!(
            chain_descriptor(adapter.as_ref()),
            "Locked:Cached+Lifecycle:FactoryInjector-u8"
        );
    }
}
