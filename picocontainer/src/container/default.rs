use crate::adapter::{chain_descriptor, same_adapter, ComponentAdapterPtr, InstanceAdapter};
use crate::behavior::BehaviorFactoryPtr;
use crate::characteristics::{Characteristic, Characteristics};
use crate::component::Component;
use crate::container::{
    next_container_id, select_candidate, Container, ContainerBuilder, ContainerInstanceProvider,
    ContainerPtr, ResolutionStack,
};
use crate::definition::ComponentDefinition;
use crate::error::{ComponentInstanceProviderError, ContainerError};
use crate::injection::ComponentRegistration;
use crate::instance_provider::{
    cast, CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider, ComponentInstancePtr,
    ErrorPtr, TypedComponentInstanceProvider,
};
use crate::key::{ComponentKey, TypeInfo};
use crate::lifecycle::{LifecycleState, LifecycleStrategyPtr};
use crate::monitor::{ComponentMonitorPtr, MonitorHandle};
use crate::sync::lock;
use crate::visitor::{traverse, ContainerVisitor, VerifyingVisitor};
use fxhash::{FxHashMap, FxHashSet};
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, info, warn};

#[derive(Default)]
struct ContainerState {
    adapters: Vec<ComponentAdapterPtr>,
    keys: FxHashMap<ComponentKey, ComponentAdapterPtr>,
    // adapters in the order their instances were first created
    ordered: Vec<ComponentAdapterPtr>,
    children: Vec<Weak<DefaultContainer>>,
    started_children: FxHashSet<u64>,
    lifecycle: LifecycleState,
    characteristics: Characteristics,
}

/// Parts a [DefaultContainer] is built from.
pub(crate) struct ContainerParts {
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<ContainerPtr>,
    pub(crate) behavior_factory: BehaviorFactoryPtr,
    pub(crate) lifecycle_strategy: LifecycleStrategyPtr,
    pub(crate) monitor: ComponentMonitorPtr,
    pub(crate) characteristics: Characteristics,
}

/// Standard mutable container. Registration, lookup and lifecycle operations take `&self`, so a
/// container can be shared between threads, usually wrapped in an [Arc].
///
/// Components instantiated by the container are started in instantiation order (dependencies
/// first) and stopped and disposed in the reverse order. Child containers are started after and
/// stopped before their parent's components.
pub struct DefaultContainer {
    id: u64,
    name: String,
    parent: Option<ContainerPtr>,
    behavior_factory: BehaviorFactoryPtr,
    lifecycle_strategy: LifecycleStrategyPtr,
    monitor: MonitorHandle,
    state: Mutex<ContainerState>,
}

impl Default for DefaultContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultContainer {
    /// Creates a container with default settings. See [ContainerBuilder] for customization.
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    /// Creates a container with default settings and given parent.
    pub fn with_parent(parent: ContainerPtr) -> Self {
        ContainerBuilder::new().with_parent(parent).build()
    }

    pub(crate) fn from_parts(parts: ContainerParts) -> Self {
        let id = next_container_id();
        Self {
            id,
            name: parts.name.unwrap_or_else(|| format!("container-{id}")),
            parent: parts.parent,
            behavior_factory: parts.behavior_factory,
            lifecycle_strategy: parts.lifecycle_strategy,
            monitor: MonitorHandle::new(parts.monitor),
            state: Mutex::new(ContainerState {
                characteristics: parts.characteristics,
                ..Default::default()
            }),
        }
    }

    #[inline]
    fn state(&self) -> MutexGuard<'_, ContainerState> {
        lock(&self.state)
    }

    /// Registers a component described by given registration, decorating it with behaviors.
    pub fn register<T: Send + Sync + 'static>(
        &self,
        registration: ComponentRegistration<T>,
    ) -> Result<&Self, ContainerError> {
        let (adapter, characteristics) = registration.into_adapter(&self.monitor);
        self.add_decorated_adapter(adapter, characteristics)
    }

    /// Registers a [Component] under its own type.
    pub fn add_component<T: Component>(&self) -> Result<&Self, ContainerError> {
        self.register(ComponentRegistration::<T>::component())
    }

    /// Registers a [Component] under given name.
    pub fn add_named_component<T: Component, N: ToString>(
        &self,
        name: N,
    ) -> Result<&Self, ContainerError> {
        self.register(ComponentRegistration::<T>::component().named(name))
    }

    /// Registers a value created by given factory under its own type.
    pub fn add_factory<T, F>(&self, factory: F) -> Result<&Self, ContainerError>
    where
        T: Send + Sync + 'static,
        F: Fn(&mut dyn ComponentInstanceProvider) -> Result<T, ErrorPtr>
            + Send
            + Sync
            + 'static,
    {
        self.register(ComponentRegistration::factory(factory))
    }

    /// Registers a ready-made instance under its own type. Instances are not decorated by
    /// behaviors.
    pub fn add_instance<T: Any + Send + Sync>(&self, instance: T) -> Result<&Self, ContainerError> {
        self.add_instance_under(ComponentKey::of::<T>(), instance)
    }

    /// Registers a ready-made instance under given name.
    pub fn add_named_instance<T: Any + Send + Sync, N: ToString>(
        &self,
        name: N,
        instance: T,
    ) -> Result<&Self, ContainerError> {
        self.add_instance_under(ComponentKey::Name(name.to_string()), instance)
    }

    /// Registers a configuration value. Values can be requested by name or injected into fields
    /// named the same way, when multiple values of the same type are present.
    pub fn add_config<T: Any + Send + Sync, N: ToString>(
        &self,
        name: N,
        value: T,
    ) -> Result<&Self, ContainerError> {
        self.add_named_instance(name, value)
    }

    fn add_instance_under<T: Any + Send + Sync>(
        &self,
        key: ComponentKey,
        instance: T,
    ) -> Result<&Self, ContainerError> {
        self.insert_adapter(Arc::new(InstanceAdapter::new(
            key,
            ComponentDefinition::of_value::<T>(),
            ComponentInstancePtr::new(instance) as ComponentInstanceAnyPtr,
            self.lifecycle_strategy.clone(),
            self.monitor.clone(),
        )))
    }

    /// Registers a custom adapter, decorating it with behaviors.
    pub fn add_adapter(&self, adapter: ComponentAdapterPtr) -> Result<&Self, ContainerError> {
        self.add_decorated_adapter(adapter, None)
    }

    /// Returns a registrar applying given characteristics to the next registrations.
    pub fn with_characteristics<C: Into<Characteristics>>(
        &self,
        characteristics: C,
    ) -> ScopedRegistrar<'_> {
        ScopedRegistrar {
            container: self,
            characteristics: characteristics.into(),
        }
    }

    /// Changes default characteristics applied to all subsequent registrations.
    pub fn change<C: Into<Characteristics>>(&self, characteristics: C) -> &Self {
        self.state().characteristics = characteristics.into();
        self
    }

    fn effective_characteristics(&self, explicit: Option<Characteristics>) -> Characteristics {
        let defaults = self.state().characteristics.clone();
        match explicit {
            Some(mut explicit) => {
                if explicit.remove(&Characteristic::None) {
                    explicit
                } else {
                    defaults.merge(&explicit)
                }
            }
            None => defaults,
        }
    }

    fn add_decorated_adapter(
        &self,
        adapter: ComponentAdapterPtr,
        characteristics: Option<Characteristics>,
    ) -> Result<&Self, ContainerError> {
        let mut characteristics = self.effective_characteristics(characteristics);
        let adapter = self.behavior_factory.add_component_adapter(
            &self.monitor,
            &self.lifecycle_strategy,
            &mut characteristics,
            adapter,
        )?;

        if !characteristics.is_empty() {
            return Err(ContainerError::UnprocessedCharacteristics {
                key: adapter.key().to_string(),
                characteristics: characteristics.to_string(),
            });
        }

        self.insert_adapter(adapter)
    }

    fn insert_adapter(&self, adapter: ComponentAdapterPtr) -> Result<&Self, ContainerError> {
        let key = adapter.key().clone();

        {
            let mut state = self.state();
            if state.keys.contains_key(&key) {
                return Err(ContainerError::DuplicateKey(key.to_string()));
            }

            state.keys.insert(key.clone(), adapter.clone());
            state.adapters.push(adapter.clone());
        }

        debug!(
            container = %self.name,
            %key,
            adapter = %chain_descriptor(adapter.as_ref()),
            "Registered component."
        );

        self.start_if_running(&adapter)?;
        Ok(self)
    }

    // Components registered into a started container join its lifecycle right away.
    fn start_if_running(&self, adapter: &ComponentAdapterPtr) -> Result<(), ContainerError> {
        if !self.lifecycle_state().is_started() {
            return Ok(());
        }

        let eager_lifecycle = adapter
            .lifecycle()
            .map(|lifecycle| lifecycle.has_lifecycle())
            .unwrap_or_default()
            && !self.lifecycle_strategy.is_lazy(adapter.as_ref());
        if !eager_lifecycle && !adapter.is_automatic() {
            return Ok(());
        }

        self.instantiate(adapter, &mut ResolutionStack::default())?;
        match adapter.lifecycle() {
            Some(lifecycle) if lifecycle.has_lifecycle() && !lifecycle.is_started() => {
                lifecycle.start()
            }
            _ => Ok(()),
        }
    }

    /// Removes the component registered under given key. Components cannot be removed while the
    /// container is started.
    pub fn remove_component(
        &self,
        key: &ComponentKey,
    ) -> Result<Option<ComponentAdapterPtr>, ContainerError> {
        let mut state = self.state();
        state.lifecycle.removing_component()?;

        let adapter = state.keys.remove(key);
        if let Some(adapter) = &adapter {
            state
                .adapters
                .retain(|existing| !same_adapter(existing, adapter));
            state
                .ordered
                .retain(|existing| !same_adapter(existing, adapter));
        }

        Ok(adapter)
    }

    /// Removes the component whose stored instance is given instance.
    pub fn remove_component_by_instance<T: ?Sized>(
        &self,
        instance: &ComponentInstancePtr<T>,
    ) -> Result<Option<ComponentAdapterPtr>, ContainerError> {
        let address = Arc::as_ptr(instance).cast::<()>();
        let key = self
            .adapters()
            .into_iter()
            .find(|adapter| {
                adapter
                    .stored_instance()
                    .map(|stored| Arc::as_ptr(&stored).cast::<()>() == address)
                    .unwrap_or_default()
            })
            .map(|adapter| adapter.key().clone());

        match key {
            Some(key) => self.remove_component(&key),
            None => Ok(None),
        }
    }

    fn provide<R>(&self, request: impl FnOnce(&mut ContainerInstanceProvider) -> R) -> R {
        let mut stack = ResolutionStack::default();
        let mut provider = ContainerInstanceProvider::new(self, &mut stack);
        request(&mut provider)
    }

    /// Returns the single instance providing given type from this container or its parents.
    pub fn component<T: ?Sized + 'static>(
        &self,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
        let result = self.provide(|provider| provider.primary_instance_typed::<T>());
        if let Err(ComponentInstanceProviderError::NoPrimaryInstance(type_info)) = &result {
            if *type_info == TypeInfo::of::<T>() {
                self.monitor
                    .current()
                    .no_component_found(&ComponentKey::of::<T>());
            }
        }

        result
    }

    /// Like [DefaultContainer::component], but returns `None` when nothing provides given type.
    pub fn component_option<T: ?Sized + 'static>(
        &self,
    ) -> Result<Option<ComponentInstancePtr<T>>, ComponentInstanceProviderError> {
        self.provide(|provider| provider.primary_instance_option::<T>())
    }

    /// Returns the instance registered under given name.
    pub fn component_by_name<T: ?Sized + 'static>(
        &self,
        name: &str,
    ) -> Result<ComponentInstancePtr<T>, ComponentInstanceProviderError> {
        self.provide(|provider| provider.instance_by_name_typed::<T>(name))
    }

    /// Returns all instances providing given type registered in this container, in instantiation
    /// order. Use [TypedComponentInstanceProvider::instances_typed] through a component
    /// constructor to include parent containers.
    pub fn components<T: ?Sized + 'static>(
        &self,
    ) -> Result<Vec<ComponentInstancePtr<T>>, ComponentInstanceProviderError> {
        let requested = TypeInfo::of::<T>();
        let mut stack = ResolutionStack::default();

        let mut instances = Vec::new();
        for adapter in self.local_candidates(requested) {
            let instance = self.instantiate(&adapter, &mut stack)?;
            instances.push((adapter, instance));
        }

        let ordered = self.state().ordered.clone();
        instances.sort_by_key(|(adapter, _)| {
            ordered
                .iter()
                .position(|existing| same_adapter(existing, adapter))
                .unwrap_or(usize::MAX)
        });

        instances
            .into_iter()
            .map(|(adapter, instance)| {
                adapter
                    .definition()
                    .provided_type(requested)
                    .ok_or(ComponentInstanceProviderError::IncompatibleComponent(
                        requested,
                    ))
                    .and_then(|provided| cast::<T>((instance, provided.cast)))
            })
            .collect()
    }

    fn local_candidates(&self, requested: TypeInfo) -> Vec<ComponentAdapterPtr> {
        self.state()
            .adapters
            .iter()
            .filter(|adapter| adapter.definition().provides(requested))
            .cloned()
            .collect()
    }

    fn instantiate(
        &self,
        adapter: &ComponentAdapterPtr,
        stack: &mut ResolutionStack,
    ) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError> {
        stack.enter(self.id, adapter.key())?;
        let result = {
            let mut provider = ContainerInstanceProvider::new(self, stack);
            adapter.instance(&mut provider)
        };
        stack.leave();

        let instance = result?;
        self.instantiated(adapter)?;
        Ok(instance)
    }

    fn instantiated(
        &self,
        adapter: &ComponentAdapterPtr,
    ) -> Result<(), ComponentInstanceProviderError> {
        let start = {
            let mut state = self.state();
            if !state
                .ordered
                .iter()
                .any(|existing| same_adapter(existing, adapter))
            {
                state.ordered.push(adapter.clone());
            }

            state.lifecycle.is_started() && self.lifecycle_strategy.is_lazy(adapter.as_ref())
        };

        if !start {
            return Ok(());
        }

        match adapter.lifecycle() {
            Some(lifecycle) if lifecycle.has_lifecycle() && !lifecycle.is_started() => lifecycle
                .start()
                .map_err(|error| ComponentInstanceProviderError::LifecycleState {
                    component: adapter.key().to_string(),
                    message: error.to_string(),
                }),
            _ => Ok(()),
        }
    }

    /// Creates a child container sharing the configuration of this one.
    pub fn make_child_container(self: &Arc<Self>) -> Arc<DefaultContainer> {
        let child = Arc::new(Self::from_parts(ContainerParts {
            name: None,
            parent: Some(self.clone() as ContainerPtr),
            behavior_factory: self.behavior_factory.clone(),
            lifecycle_strategy: self.lifecycle_strategy.clone(),
            monitor: self.monitor.current(),
            characteristics: self.state().characteristics.clone(),
        }));

        self.attach_child(&child);
        child
    }

    /// Adds a child container, which will follow the lifecycle of this one. Children are held
    /// weakly, so a dropped child simply disappears from the hierarchy. A child added to a
    /// started container is not started, but will be stopped together with this one.
    pub fn add_child_container(
        &self,
        child: &Arc<DefaultContainer>,
    ) -> Result<&Self, ContainerError> {
        if child.id == self.id || self.has_ancestor(child.id) || child.has_descendant(self.id) {
            return Err(ContainerError::CircularChildContainer {
                parent: self.name.clone(),
                child: child.name.clone(),
            });
        }

        self.attach_child(child);
        Ok(self)
    }

    fn attach_child(&self, child: &Arc<DefaultContainer>) {
        let mut state = self.state();
        state.children.retain(|existing| existing.strong_count() > 0);
        if state
            .children
            .iter()
            .filter_map(Weak::upgrade)
            .any(|existing| existing.id == child.id)
        {
            return;
        }

        state.children.push(Arc::downgrade(child));
        if state.lifecycle.is_started() {
            state.started_children.insert(child.id);
        }
    }

    /// Removes given child container, returning if it was present.
    pub fn remove_child_container(&self, child: &DefaultContainer) -> bool {
        let mut state = self.state();
        let count = state.children.len();
        state.children.retain(|existing| {
            existing
                .upgrade()
                .map(|existing| existing.id != child.id)
                .unwrap_or_default()
        });
        state.started_children.remove(&child.id);
        count != state.children.len()
    }

    fn live_children(&self) -> Vec<Arc<DefaultContainer>> {
        self.state()
            .children
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    fn has_ancestor(&self, id: u64) -> bool {
        let mut current = self.parent.as_ref();
        while let Some(parent) = current {
            if parent.id() == id {
                return true;
            }

            current = parent.parent();
        }

        false
    }

    fn has_descendant(&self, id: u64) -> bool {
        self.live_children()
            .iter()
            .any(|child| child.id == id || child.has_descendant(id))
    }

    #[inline]
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state().lifecycle
    }

    /// Starts the container: instantiates automatic components and components with a non-lazy
    /// lifecycle, starts instantiated components and then child containers. Stops on the first
    /// failure.
    pub fn start(&self) -> Result<(), ContainerError> {
        self.state().lifecycle.starting()?;
        info!(container = %self.name, "Starting container.");

        for adapter in self.adapters() {
            let eager_lifecycle = adapter
                .lifecycle()
                .map(|lifecycle| lifecycle.has_lifecycle())
                .unwrap_or_default()
                && !self.lifecycle_strategy.is_lazy(adapter.as_ref());

            if adapter.is_automatic() || eager_lifecycle {
                self.instantiate(&adapter, &mut ResolutionStack::default())?;
            }
        }

        let ordered = self.state().ordered.clone();
        for adapter in ordered {
            if let Some(lifecycle) = adapter.lifecycle() {
                if lifecycle.has_lifecycle() && !lifecycle.is_started() {
                    lifecycle.start()?;
                }
            }
        }

        for child in self.live_children() {
            if matches!(
                child.lifecycle_state(),
                LifecycleState::Constructed | LifecycleState::Stopped
            ) {
                child.start()?;
                self.state().started_children.insert(child.id);
            }
        }

        Ok(())
    }

    /// Stops child containers started by this one, then started components in reverse
    /// instantiation order. Continues after failures and returns the first one.
    pub fn stop(&self) -> Result<(), ContainerError> {
        self.state().lifecycle.stopping()?;
        info!(container = %self.name, "Stopping container.");

        let mut first_error = None;
        let started_children = std::mem::take(&mut self.state().started_children);
        for child in self.live_children().into_iter().rev() {
            if started_children.contains(&child.id) && child.lifecycle_state().is_started() {
                record_failure(&mut first_error, child.stop());
            }
        }

        let ordered = self.state().ordered.clone();
        for adapter in ordered.iter().rev() {
            if let Some(lifecycle) = adapter.lifecycle() {
                if lifecycle.has_lifecycle() && lifecycle.is_started() {
                    record_failure(&mut first_error, lifecycle.stop());
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Disposes the container, stopping it first if needed. Child containers are disposed before
    /// components, which are disposed in reverse instantiation order. Continues after failures and
    /// returns the first one.
    pub fn dispose(&self) -> Result<(), ContainerError> {
        let state = self.lifecycle_state();
        if state.is_disposed() {
            return Err(ContainerError::IllegalLifecycleState {
                operation: "dispose",
                state,
            });
        }

        let mut first_error = None;
        if state.is_started() {
            record_failure(&mut first_error, self.stop());
        }

        self.state().lifecycle.disposing()?;
        info!(container = %self.name, "Disposing container.");

        for child in self.live_children().into_iter().rev() {
            if !child.lifecycle_state().is_disposed() {
                record_failure(&mut first_error, child.dispose());
            }
        }

        let ordered = self.state().ordered.clone();
        for adapter in ordered.iter().rev() {
            if let Some(lifecycle) = adapter.lifecycle() {
                if lifecycle.has_lifecycle() {
                    record_failure(&mut first_error, lifecycle.dispose());
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Checks if all components could be instantiated, without instantiating anything.
    pub fn verify(&self) -> Result<(), ContainerError> {
        VerifyingVisitor::default().verify(self)
    }

    /// Replaces the monitor of this container and its children.
    pub fn change_monitor(&self, monitor: ComponentMonitorPtr) {
        self.monitor.replace(monitor.clone());
        for child in self.live_children() {
            child.change_monitor(monitor.clone());
        }
    }

    #[inline]
    pub fn monitor(&self) -> ComponentMonitorPtr {
        self.monitor.current()
    }
}

fn record_failure(first_error: &mut Option<ContainerError>, result: Result<(), ContainerError>) {
    if let Err(error) = result {
        warn!(%error, "Lifecycle operation failed.");
        first_error.get_or_insert(error);
    }
}

impl Container for DefaultContainer {
    #[inline]
    fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn parent(&self) -> Option<&ContainerPtr> {
        self.parent.as_ref()
    }

    fn children(&self) -> Vec<ContainerPtr> {
        self.live_children()
            .into_iter()
            .map(|child| child as ContainerPtr)
            .collect()
    }

    fn adapters(&self) -> Vec<ComponentAdapterPtr> {
        self.state().adapters.clone()
    }

    fn local_adapter(&self, key: &ComponentKey) -> Option<ComponentAdapterPtr> {
        self.state().keys.get(key).cloned()
    }

    fn local_adapter_for_type(
        &self,
        requested: TypeInfo,
        name_hint: Option<&str>,
    ) -> Result<Option<ComponentAdapterPtr>, ComponentInstanceProviderError> {
        select_candidate(requested, name_hint, self.local_candidates(requested))
    }

    fn resolve_by_key(
        &self,
        key: &ComponentKey,
        stack: &mut ResolutionStack,
    ) -> Result<Option<(ComponentAdapterPtr, ComponentInstanceAnyPtr)>, ComponentInstanceProviderError>
    {
        let Some(adapter) = self.local_adapter(key) else {
            return match &self.parent {
                Some(parent) => parent.resolve_by_key(key, stack),
                None => Ok(None),
            };
        };

        // a component depending on the key it is registered under decorates the parent one
        if stack.contains(self.id, key) {
            if let Some(parent) = &self.parent {
                if let Some(resolved) = parent.resolve_by_key(key, stack)? {
                    return Ok(Some(resolved));
                }
            }
        }

        let instance = self.instantiate(&adapter, stack)?;
        Ok(Some((adapter, instance)))
    }

    fn resolve_by_type(
        &self,
        requested: TypeInfo,
        name_hint: Option<&str>,
        stack: &mut ResolutionStack,
    ) -> Result<Option<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>
    {
        let Some(adapter) = self.local_adapter_for_type(requested, name_hint)? else {
            return match &self.parent {
                Some(parent) => parent.resolve_by_type(requested, name_hint, stack),
                None => Ok(None),
            };
        };

        if stack.contains(self.id, adapter.key()) {
            if let Some(parent) = &self.parent {
                if let Some(resolved) = parent.resolve_by_type(requested, name_hint, stack)? {
                    return Ok(Some(resolved));
                }
            }
        }

        let cast = adapter
            .definition()
            .provided_type(requested)
            .map(|provided| provided.cast)
            .ok_or(ComponentInstanceProviderError::IncompatibleComponent(
                requested,
            ))?;

        let instance = self.instantiate(&adapter, stack)?;
        Ok(Some((instance, cast)))
    }

    fn resolve_all(
        &self,
        requested: TypeInfo,
        excluded: &[ComponentKey],
        stack: &mut ResolutionStack,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError> {
        let candidates = self
            .local_candidates(requested)
            .into_iter()
            .filter(|adapter| !excluded.contains(adapter.key()))
            .collect::<Vec<_>>();

        let mut instances = match &self.parent {
            Some(parent) => {
                let mut excluded = excluded.to_vec();
                excluded.extend(candidates.iter().map(|adapter| adapter.key().clone()));
                parent.resolve_all(requested, &excluded, stack)?
            }
            None => Vec::new(),
        };

        for adapter in candidates {
            if let Some(provided) = adapter.definition().provided_type(requested) {
                let cast = provided.cast;
                instances.push((self.instantiate(&adapter, stack)?, cast));
            }
        }

        Ok(instances)
    }

    fn accept(&self, visitor: &mut dyn ContainerVisitor) {
        traverse(self, visitor);
    }
}

/// Registers components with a fixed set of characteristics. Characteristics given explicitly on
/// a registration take precedence.
pub struct ScopedRegistrar<'a> {
    container: &'a DefaultContainer,
    characteristics: Characteristics,
}

impl<'a> ScopedRegistrar<'a> {
    pub fn register<T: Send + Sync + 'static>(
        &self,
        registration: ComponentRegistration<T>,
    ) -> Result<&'a DefaultContainer, ContainerError> {
        self.container
            .register(registration.with_default_characteristics(&self.characteristics))
    }

    pub fn add_component<T: Component>(&self) -> Result<&'a DefaultContainer, ContainerError> {
        self.register(ComponentRegistration::<T>::component())
    }

    pub fn add_named_component<T: Component, N: ToString>(
        &self,
        name: N,
    ) -> Result<&'a DefaultContainer, ContainerError> {
        self.register(ComponentRegistration::<T>::component().named(name))
    }

    pub fn add_adapter(
        &self,
        adapter: ComponentAdapterPtr,
    ) -> Result<&'a DefaultContainer, ContainerError> {
        self.container
            .add_decorated_adapter(adapter, Some(self.characteristics.clone()))
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::{chain_descriptor, ComponentAdapterPtr};
    use crate::characteristics::Characteristic;
    use crate::component::{Component, ComponentDowncast, Dependency, Injectable};
    use crate::container::{Container, ContainerBuilder, DefaultContainer};
    use crate::error::{ComponentInstanceProviderError, ContainerError};
    use crate::injection::ComponentRegistration;
    use crate::instance_provider::{
        ComponentInstanceAnyPtr, ComponentInstanceProvider, ComponentInstancePtr, ErrorPtr,
        TypedComponentInstanceProvider,
    };
    use crate::key::ComponentKey;
    use crate::lifecycle::{LifecycleState, Startable, StartableLifecycleStrategy};
    use crate::monitor::MockComponentMonitor;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    impl Events {
        fn push(&self, event: &str) {
            self.0.lock().unwrap().push(event.to_string());
        }

        fn all(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct Tracked {
        name: &'static str,
        events: Arc<Events>,
    }

    impl Startable for Tracked {
        fn start(&self) -> Result<(), ErrorPtr> {
            self.events.push(&format!("start {}", self.name));
            Ok(())
        }

        fn stop(&self) -> Result<(), ErrorPtr> {
            self.events.push(&format!("stop {}", self.name));
            Ok(())
        }
    }

    fn tracked(
        name: &'static str,
        events: &Arc<Events>,
        dependency: Option<&'static str>,
    ) -> ComponentRegistration<Tracked> {
        let events = events.clone();
        let registration = ComponentRegistration::factory(move |provider| {
            if let Some(dependency) = dependency {
                provider
                    .instance_by_name_typed::<Tracked>(dependency)
                    .map_err(|error| Arc::new(error) as ErrorPtr)?;
            }

            Ok(Tracked {
                name,
                events: events.clone(),
            })
        })
        .named(name)
        .startable();

        match dependency {
            Some(dependency) => registration.depends_on(Dependency::named::<Tracked, _>(dependency)),
            None => registration,
        }
    }

    struct Counter;

    impl Injectable for Counter {}

    impl ComponentDowncast<Counter> for Counter {
        fn downcast(
            source: ComponentInstanceAnyPtr,
        ) -> Result<ComponentInstancePtr<Self>, ComponentInstanceAnyPtr> {
            source.downcast::<Self>()
        }
    }

    static COUNTER_CREATED: AtomicU32 = AtomicU32::new(0);

    impl Component for Counter {
        fn create(
            _instance_provider: &mut dyn ComponentInstanceProvider,
        ) -> Result<Self, ComponentInstanceProviderError> {
            COUNTER_CREATED.fetch_add(1, Ordering::SeqCst);
            Ok(Self)
        }
    }

    #[test]
    fn should_reject_duplicate_keys() {
        let container = DefaultContainer::new();
        container.add_named_instance("value", 1u8).unwrap();
        assert!(matches!(
            container.add_named_instance("value", 2u8),
            Err(ContainerError::DuplicateKey(key)) if key == "'value'"
        ));
    }

    #[test]
    fn should_cache_with_characteristic() {
        let container = DefaultContainer::new();
        container
            .with_characteristics(Characteristic::Cache)
            .add_component::<Counter>()
            .unwrap();

        let first = container.component::<Counter>().unwrap();
        let second = container.component::<Counter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(COUNTER_CREATED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_reject_unprocessed_characteristics() {
        let container = ContainerBuilder::new().with_caching().build();
        assert!(matches!(
            container.register(
                ComponentRegistration::<u8>::factory(|_| Ok(1))
                    .with_characteristic(Characteristic::guard())
            ),
            Err(ContainerError::UnprocessedCharacteristics { .. })
        ));
    }

    #[test]
    fn should_skip_default_characteristics_with_none() {
        let container = DefaultContainer::new();
        container.change(Characteristic::Cache);
        container
            .register(
                ComponentRegistration::<u8>::factory(|_| Ok(1))
                    .with_characteristic(Characteristic::None),
            )
            .unwrap();

        let adapter = container.local_adapter(&ComponentKey::of::<u8>()).unwrap();
        assert_eq!(chain_descriptor(adapter.as_ref()), "FactoryInjector-u8");
    }

    #[test]
    fn should_start_in_dependency_order() {
        let events = Arc::new(Events::default());
        let container = ContainerBuilder::new().with_caching().build();
        container
            .register(tracked("service", &events, Some("repository")))
            .unwrap()
            .register(tracked("repository", &events, None))
            .unwrap();

        container.start().unwrap();
        assert_eq!(container.lifecycle_state(), LifecycleState::Started);
        container.dispose().unwrap();

        assert_eq!(
            events.all(),
            vec![
                "start repository",
                "start service",
                "stop service",
                "stop repository"
            ]
        );
        assert!(matches!(
            container.dispose(),
            Err(ContainerError::IllegalLifecycleState { .. })
        ));
    }

    #[test]
    fn should_start_lazily() {
        let events = Arc::new(Events::default());
        let container = ContainerBuilder::new()
            .with_caching()
            .with_lifecycle_strategy(Arc::new(StartableLifecycleStrategy::lazy()))
            .build();
        container
            .register(tracked("lazy", &events, None))
            .unwrap();

        container.start().unwrap();
        assert!(events.all().is_empty());

        container.component_by_name::<Tracked>("lazy").unwrap();
        assert_eq!(events.all(), vec!["start lazy"]);
    }

    #[test]
    fn should_not_remove_components_while_started() {
        let container = DefaultContainer::new();
        container.add_named_instance("value", 1u8).unwrap();
        container.start().unwrap();

        assert!(container
            .remove_component(&ComponentKey::from("value"))
            .is_err());

        container.stop().unwrap();
        let instance = container.component_by_name::<u8>("value").unwrap();
        assert!(container
            .remove_component_by_instance(&instance)
            .unwrap()
            .is_some());
        assert!(container.component_option::<u8>().unwrap().is_none());
    }

    #[test]
    fn should_resolve_from_parent_and_reject_cycles() {
        let parent = Arc::new(DefaultContainer::new());
        parent.add_instance(5u8).unwrap();

        let child = parent.make_child_container();
        assert_eq!(*child.component::<u8>().unwrap(), 5);
        assert_eq!(parent.children().len(), 1);

        let grandchild = child.make_child_container();
        assert!(matches!(
            grandchild.add_child_container(&parent),
            Err(ContainerError::CircularChildContainer { .. })
        ));
    }

    #[test]
    fn should_list_local_components_in_instantiation_order() {
        let container = DefaultContainer::new();
        container
            .add_named_instance("first", 1u8)
            .unwrap()
            .add_named_instance("second", 2u8)
            .unwrap();

        container.component_by_name::<u8>("second").unwrap();
        let values = container
            .components::<u8>()
            .unwrap()
            .into_iter()
            .map(|value| *value)
            .collect::<Vec<_>>();
        assert_eq!(values, vec![2, 1]);
    }

    #[test]
    fn should_decorate_parent_component() {
        struct Greeting(String);

        let parent = Arc::new(DefaultContainer::new());
        parent
            .add_instance(Greeting("hello".to_string()))
            .unwrap();

        let child = parent.make_child_container();
        child
            .add_factory(|provider| {
                let inner = provider
                    .primary_instance_typed::<Greeting>()
                    .map_err(|error| Arc::new(error) as ErrorPtr)?;
                Ok(Greeting(format!("{} world", inner.0)))
            })
            .unwrap();

        assert_eq!(child.component::<Greeting>().unwrap().0, "hello world");
    }

    #[test]
    fn should_report_cycles_on_resolution() {
        let container = DefaultContainer::new();
        container
            .add_factory(|provider| {
                provider
                    .primary_instance_typed::<u8>()
                    .map(|value| *value)
                    .map_err(|error| Arc::new(error) as ErrorPtr)
            })
            .unwrap();

        assert!(matches!(
            container.component::<u8>().unwrap_err(),
            ComponentInstanceProviderError::ConstructorError { .. }
        ));
    }

    #[test]
    fn should_register_custom_adapter() {
        let (adapter, _): (ComponentAdapterPtr, _) = ComponentRegistration::<u16>::factory(|_| Ok(16))
            .into_adapter(&Default::default());

        let container = ContainerBuilder::new().with_caching().build();
        container.add_adapter(adapter).unwrap();
        assert_eq!(*container.component::<u16>().unwrap(), 16);
    }

    #[test]
    fn should_record_children_made_while_started() {
        let events = Arc::new(Events::default());
        let parent = Arc::new(ContainerBuilder::new().with_caching().build());
        parent.start().unwrap();

        let made = parent.make_child_container();
        made.register(tracked("made", &events, None)).unwrap();
        let added = Arc::new(ContainerBuilder::new().with_caching().build());
        added.register(tracked("added", &events, None)).unwrap();
        parent.add_child_container(&added).unwrap();

        // children are recorded, but not started by their parent
        assert_eq!(made.lifecycle_state(), LifecycleState::Constructed);
        assert_eq!(added.lifecycle_state(), LifecycleState::Constructed);

        made.start().unwrap();
        added.start().unwrap();
        parent.stop().unwrap();

        assert_eq!(made.lifecycle_state(), LifecycleState::Stopped);
        assert_eq!(added.lifecycle_state(), LifecycleState::Stopped);
        assert_eq!(
            events.all(),
            vec!["start made", "start added", "stop added", "stop made"]
        );
    }

    #[test]
    fn should_change_monitor_of_children() {
        let parent = Arc::new(DefaultContainer::new());
        let child = parent.make_child_container();

        let mut monitor = MockComponentMonitor::new();
        monitor
            .expect_no_component_found()
            .withf(|key| *key == ComponentKey::of::<u8>())
            .times(1)
            .return_const(());
        parent.change_monitor(Arc::new(monitor));

        assert!(child.component::<u8>().is_err());
    }
}
