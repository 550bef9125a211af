use crate::behavior::{
    AdaptingBehavior, Automating, BehaviorFactoryPtr, Caching, ComposedBehavior, Guarding,
    ImplementationHiding, Locking, OptInCaching, ThreadCaching,
};
use crate::characteristics::Characteristics;
use crate::container::default::ContainerParts;
use crate::container::{ContainerPtr, DefaultContainer};
use crate::lifecycle::{LifecycleStrategyPtr, NullLifecycleStrategy, StartableLifecycleStrategy};
use crate::monitor::{ComponentMonitorPtr, NullComponentMonitor, TracingComponentMonitor};
use std::sync::Arc;

enum Behavior {
    Caching,
    OptInCaching,
    ThreadCaching,
    ImplementationHiding,
    Locking,
    Automating,
    Guarding,
    Custom(BehaviorFactoryPtr),
}

impl Behavior {
    fn into_factory(self, inner: Option<BehaviorFactoryPtr>) -> BehaviorFactoryPtr {
        match self {
            Self::Caching => Arc::new(inner.into_iter().fold(Caching::default(), Caching::wrap)),
            Self::OptInCaching => Arc::new(
                inner
                    .into_iter()
                    .fold(OptInCaching::default(), OptInCaching::wrap),
            ),
            Self::ThreadCaching => Arc::new(
                inner
                    .into_iter()
                    .fold(ThreadCaching::default(), ThreadCaching::wrap),
            ),
            Self::ImplementationHiding => Arc::new(
                inner
                    .into_iter()
                    .fold(ImplementationHiding::default(), ImplementationHiding::wrap),
            ),
            Self::Locking => Arc::new(inner.into_iter().fold(Locking::default(), Locking::wrap)),
            Self::Automating => Arc::new(
                inner
                    .into_iter()
                    .fold(Automating::default(), Automating::wrap),
            ),
            Self::Guarding => Arc::new(inner.into_iter().fold(Guarding::default(), Guarding::wrap)),
            Self::Custom(factory) => match inner {
                Some(inner) => Arc::new(ComposedBehavior::new(factory, inner)),
                None => factory,
            },
        }
    }
}

/// Builder for [DefaultContainer]s.
///
/// Behaviors are applied in the order they are added, the first one being the outermost
/// decoration. Without explicit behaviors, [AdaptingBehavior] chooses them per component based on
/// characteristics.
///
/// ```
/// use picocontainer::container::ContainerBuilder;
/// use picocontainer::Component;
/// use std::sync::Arc;
///
/// #[derive(Component)]
/// struct Cache;
///
/// let container = ContainerBuilder::new()
///     .with_name("application")
///     .with_caching()
///     .with_locking()
///     .with_tracing()
///     .build();
/// container.add_component::<Cache>().unwrap();
///
/// let first = container.component::<Cache>().unwrap();
/// let second = container.component::<Cache>().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct ContainerBuilder {
    name: Option<String>,
    parent: Option<ContainerPtr>,
    behaviors: Vec<Behavior>,
    lifecycle_strategy: LifecycleStrategyPtr,
    monitor: ComponentMonitorPtr,
    characteristics: Characteristics,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            parent: None,
            behaviors: Vec::new(),
            lifecycle_strategy: Arc::new(StartableLifecycleStrategy::default()),
            monitor: Arc::new(NullComponentMonitor),
            characteristics: Characteristics::new(),
        }
    }

    pub fn with_name<N: ToString>(mut self, name: N) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_parent(mut self, parent: ContainerPtr) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Caches all components, unless registered as not cached.
    pub fn with_caching(mut self) -> Self {
        self.behaviors.push(Behavior::Caching);
        self
    }

    /// Caches only components registered as cached.
    pub fn with_opt_in_caching(mut self) -> Self {
        self.behaviors.push(Behavior::OptInCaching);
        self
    }

    /// Caches one instance of each component per thread.
    pub fn with_thread_caching(mut self) -> Self {
        self.behaviors.push(Behavior::ThreadCaching);
        self
    }

    pub fn with_hidden_implementations(mut self) -> Self {
        self.behaviors.push(Behavior::ImplementationHiding);
        self
    }

    pub fn with_locking(mut self) -> Self {
        self.behaviors.push(Behavior::Locking);
        self
    }

    /// Instantiates all components on start.
    pub fn with_automatic(mut self) -> Self {
        self.behaviors.push(Behavior::Automating);
        self
    }

    pub fn with_guarding(mut self) -> Self {
        self.behaviors.push(Behavior::Guarding);
        self
    }

    /// Adds a custom behavior factory.
    pub fn with_behavior(mut self, behavior: BehaviorFactoryPtr) -> Self {
        self.behaviors.push(Behavior::Custom(behavior));
        self
    }

    /// Uses [StartableLifecycleStrategy], which is the default.
    pub fn with_lifecycle(self) -> Self {
        self.with_lifecycle_strategy(Arc::new(StartableLifecycleStrategy::default()))
    }

    pub fn without_lifecycle(self) -> Self {
        self.with_lifecycle_strategy(Arc::new(NullLifecycleStrategy))
    }

    pub fn with_lifecycle_strategy(mut self, lifecycle_strategy: LifecycleStrategyPtr) -> Self {
        self.lifecycle_strategy = lifecycle_strategy;
        self
    }

    pub fn with_monitor(mut self, monitor: ComponentMonitorPtr) -> Self {
        self.monitor = monitor;
        self
    }

    /// Reports container events using `tracing`.
    pub fn with_tracing(self) -> Self {
        self.with_monitor(Arc::new(TracingComponentMonitor))
    }

    /// Sets characteristics applied to every registration by default.
    pub fn with_characteristics<C: Into<Characteristics>>(mut self, characteristics: C) -> Self {
        self.characteristics = characteristics.into();
        self
    }

    pub fn build(self) -> DefaultContainer {
        let behavior_factory = self
            .behaviors
            .into_iter()
            .rev()
            .fold(None, |inner, behavior| Some(behavior.into_factory(inner)))
            .unwrap_or_else(|| Arc::new(AdaptingBehavior) as BehaviorFactoryPtr);

        DefaultContainer::from_parts(ContainerParts {
            name: self.name,
            parent: self.parent,
            behavior_factory,
            lifecycle_strategy: self.lifecycle_strategy,
            monitor: self.monitor,
            characteristics: self.characteristics,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::{chain_descriptor, ComponentAdapterPtr};
    use crate::behavior::{BehaviorFactory, BehaviorFactoryPtr};
    use crate::characteristics::{Characteristic, Characteristics};
    use crate::container::{Container, ContainerBuilder, DefaultContainer};
    use crate::error::ContainerError;
    use crate::injection::ComponentRegistration;
    use crate::key::ComponentKey;
    use crate::lifecycle::LifecycleStrategyPtr;
    use crate::monitor::MonitorHandle;
    use std::sync::Arc;

    fn descriptor(container: &DefaultContainer) -> String {
        let adapter = container.local_adapter(&ComponentKey::of::<u8>()).unwrap();
        chain_descriptor(adapter.as_ref())
    }

    #[test]
    fn should_apply_behaviors_in_order() {
        let container = ContainerBuilder::new()
            .with_caching()
            .with_locking()
            .build();
        container
            .register(ComponentRegistration::<u8>::factory(|_| Ok(1)))
            .unwrap();

        assert_eq!(
            descriptor(&container),
            "Cached+Lifecycle:Locked:FactoryInjector-u8"
        );
    }

    #[test]
    fn should_adapt_by_default() {
        let container = ContainerBuilder::new()
            .with_name("adapting")
            .with_characteristics(Characteristic::Cache)
            .build();
        container
            .register(ComponentRegistration::<u8>::factory(|_| Ok(1)))
            .unwrap();

        assert_eq!(container.name(), "adapting");
        assert_eq!(descriptor(&container), "Cached+Lifecycle:FactoryInjector-u8");
    }

    #[test]
    fn should_compose_custom_behavior() {
        struct Rejecting;

        impl BehaviorFactory for Rejecting {
            fn add_component_adapter(
                &self,
                _monitor: &MonitorHandle,
                _lifecycle_strategy: &LifecycleStrategyPtr,
                _characteristics: &mut Characteristics,
                adapter: ComponentAdapterPtr,
            ) -> Result<ComponentAdapterPtr, ContainerError> {
                Err(ContainerError::DuplicateKey(adapter.key().to_string()))
            }
        }

        let container = ContainerBuilder::new()
            .with_behavior(Arc::new(Rejecting) as BehaviorFactoryPtr)
            .with_caching()
            .build();

        assert!(matches!(
            container.register(ComponentRegistration::<u8>::factory(|_| Ok(1))),
            Err(ContainerError::DuplicateKey(_))
        ));
    }
}
