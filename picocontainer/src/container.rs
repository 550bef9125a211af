//! Containers hold component adapters and resolve dependencies between them.
//!
//! [DefaultContainer] is the mutable container used to register components, while the read-only
//! [Container] trait is what resolution, verification and parent containers work with. Containers
//! form hierarchies: a child container sees the components of its parent, but a parent never sees
//! components of its children.
//!
//! Single instances are resolved by type using the following rules, within one container:
//!
//! 1. the component registered under the requested type as its key wins,
//! 2. a single component providing the type wins,
//! 3. from multiple candidates, the one registered under the name hint (usually the name of the
//!    field being injected) wins,
//! 4. from multiple candidates, the only one marked as primary wins,
//! 5. otherwise the resolution is ambiguous.
//!
//! When no local component provides the type, the parent container is asked.
//!
//! ```
//! use picocontainer::container::ContainerBuilder;
//! use picocontainer::instance_provider::ComponentInstancePtr;
//! use picocontainer::Component;
//! use std::sync::Arc;
//!
//! #[derive(Component)]
//! struct Repository;
//!
//! #[derive(Component)]
//! struct Service {
//!     repository: ComponentInstancePtr<Repository>,
//! }
//!
//! let parent = Arc::new(ContainerBuilder::new().with_caching().build());
//! parent.add_component::<Repository>().unwrap();
//!
//! let child = parent.make_child_container();
//! child.add_component::<Service>().unwrap();
//!
//! let service = child.component::<Service>().unwrap();
//! assert!(Arc::ptr_eq(&service.repository, &parent.component::<Repository>().unwrap()));
//! assert!(parent.component::<Service>().is_err());
//! ```

mod builder;
mod composite;
mod default;
mod empty;

pub use builder::ContainerBuilder;
pub use composite::CompositeContainer;
pub use default::{DefaultContainer, ScopedRegistrar};
pub use empty::EmptyContainer;

use crate::adapter::ComponentAdapterPtr;
use crate::error::ComponentInstanceProviderError;
use crate::instance_provider::{CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider};
use crate::key::{ComponentKey, TypeInfo};
use crate::visitor::{traverse, ContainerVisitor};
use itertools::Itertools;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type ContainerPtr = Arc<dyn Container>;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

#[inline]
pub(crate) fn next_container_id() -> u64 {
    NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Read-only view of a container.
pub trait Container: Send + Sync {
    /// Unique id of this container.
    fn id(&self) -> u64;

    fn name(&self) -> &str;

    fn parent(&self) -> Option<&ContainerPtr>;

    /// Live child containers.
    fn children(&self) -> Vec<ContainerPtr>;

    /// Adapters registered in this container, in registration order.
    fn adapters(&self) -> Vec<ComponentAdapterPtr>;

    /// Returns the adapter registered in this container under given key.
    fn local_adapter(&self, key: &ComponentKey) -> Option<ComponentAdapterPtr>;

    /// Selects the adapter for requested type in this container, without instantiating anything.
    fn local_adapter_for_type(
        &self,
        requested: TypeInfo,
        name_hint: Option<&str>,
    ) -> Result<Option<ComponentAdapterPtr>, ComponentInstanceProviderError>;

    /// Returns the adapter and the instance for given key, looking in parents if needed.
    fn resolve_by_key(
        &self,
        key: &ComponentKey,
        stack: &mut ResolutionStack,
    ) -> Result<Option<(ComponentAdapterPtr, ComponentInstanceAnyPtr)>, ComponentInstanceProviderError>;

    /// Returns the instance for given type, looking in parents if needed.
    fn resolve_by_type(
        &self,
        requested: TypeInfo,
        name_hint: Option<&str>,
        stack: &mut ResolutionStack,
    ) -> Result<Option<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>;

    /// Returns all instances of given type in this container and its parents, parent instances
    /// first. Components registered under excluded keys are skipped, which makes local components
    /// override parent ones.
    fn resolve_all(
        &self,
        requested: TypeInfo,
        excluded: &[ComponentKey],
        stack: &mut ResolutionStack,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>;

    /// Visits this container and its children.
    fn accept(&self, visitor: &mut dyn ContainerVisitor);

    /// Returns the adapter registered under given key in this container or its parents.
    fn component_adapter(&self, key: &ComponentKey) -> Option<ComponentAdapterPtr> {
        self.local_adapter(key).or_else(|| {
            self.parent()
                .and_then(|parent| parent.component_adapter(key))
        })
    }

    /// Selects the adapter for requested type in this container or its parents.
    fn find_adapter_for_type(
        &self,
        requested: TypeInfo,
        name_hint: Option<&str>,
    ) -> Result<Option<ComponentAdapterPtr>, ComponentInstanceProviderError> {
        match self.local_adapter_for_type(requested, name_hint)? {
            Some(adapter) => Ok(Some(adapter)),
            None => match self.parent() {
                Some(parent) => parent.find_adapter_for_type(requested, name_hint),
                None => Ok(None),
            },
        }
    }
}

/// Selects a single adapter from local candidates providing requested type.
pub(crate) fn select_candidate(
    requested: TypeInfo,
    name_hint: Option<&str>,
    candidates: Vec<ComponentAdapterPtr>,
) -> Result<Option<ComponentAdapterPtr>, ComponentInstanceProviderError> {
    if candidates.len() < 2 {
        return Ok(candidates.into_iter().next());
    }

    let requested_key = ComponentKey::Type(requested);
    if let Some(adapter) = candidates
        .iter()
        .find(|adapter| *adapter.key() == requested_key)
    {
        return Ok(Some(adapter.clone()));
    }

    if let Some(name_hint) = name_hint {
        if let Some(adapter) = candidates
            .iter()
            .find(|adapter| adapter.key().name() == Some(name_hint))
        {
            return Ok(Some(adapter.clone()));
        }
    }

    let primary = candidates
        .iter()
        .filter(|adapter| adapter.definition().is_primary)
        .collect_vec();
    if primary.len() == 1 {
        return Ok(Some(primary[0].clone()));
    }

    Err(ComponentInstanceProviderError::AmbiguousComponentResolution {
        requested,
        candidates: candidates
            .iter()
            .map(|adapter| adapter.key().to_string())
            .collect(),
    })
}

/// Components currently under construction, used to detect dependency cycles.
#[derive(Clone, Debug, Default)]
pub struct ResolutionStack {
    entries: Vec<(u64, ComponentKey)>,
}

impl ResolutionStack {
    pub fn contains(&self, container_id: u64, key: &ComponentKey) -> bool {
        self.entries
            .iter()
            .any(|(id, entry)| *id == container_id && entry == key)
    }

    /// Marks given component as under construction, failing if it already is.
    pub fn enter(
        &mut self,
        container_id: u64,
        key: &ComponentKey,
    ) -> Result<(), ComponentInstanceProviderError> {
        if let Some(position) = self
            .entries
            .iter()
            .position(|(id, entry)| *id == container_id && entry == key)
        {
            let path = self.entries[position..]
                .iter()
                .map(|(_, entry)| entry.to_string())
                .chain([key.to_string()])
                .collect();
            return Err(ComponentInstanceProviderError::CyclicDependency(path));
        }

        self.entries.push((container_id, key.clone()));
        Ok(())
    }

    pub fn leave(&mut self) {
        self.entries.pop();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cast_erased(
    instance: ComponentInstanceAnyPtr,
) -> Result<Box<dyn Any>, ComponentInstanceAnyPtr> {
    Ok(Box::new(instance))
}

/// [ComponentInstanceProvider] resolving dependencies from a container.
pub struct ContainerInstanceProvider<'a> {
    container: &'a dyn Container,
    stack: &'a mut ResolutionStack,
}

impl<'a> ContainerInstanceProvider<'a> {
    pub fn new(container: &'a dyn Container, stack: &'a mut ResolutionStack) -> Self {
        Self { container, stack }
    }
}

impl ComponentInstanceProvider for ContainerInstanceProvider<'_> {
    fn primary_instance(
        &mut self,
        requested: TypeInfo,
        name_hint: Option<&str>,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError> {
        self.container
            .resolve_by_type(requested, name_hint, self.stack)?
            .ok_or(ComponentInstanceProviderError::NoPrimaryInstance(requested))
    }

    fn instances(
        &mut self,
        requested: TypeInfo,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError> {
        self.container.resolve_all(requested, &[], self.stack)
    }

    fn instance_by_name(
        &mut self,
        name: &str,
        requested: Option<TypeInfo>,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError> {
        let (adapter, instance) = self
            .container
            .resolve_by_key(&ComponentKey::from(name), self.stack)?
            .ok_or_else(|| ComponentInstanceProviderError::NoNamedInstance(name.to_string()))?;

        match requested {
            Some(requested) => adapter
                .definition()
                .provided_type(requested)
                .map(|provided| (instance, provided.cast))
                .ok_or(ComponentInstanceProviderError::IncompatibleComponent(
                    requested,
                )),
            None => Ok((instance, cast_erased as CastFunction)),
        }
    }
}

/// Read-only wrapper around another container. Can be used as a parent, but nothing can be
/// registered through it.
#[derive(Clone)]
pub struct ImmutableContainer {
    delegate: ContainerPtr,
}

impl ImmutableContainer {
    pub fn new(delegate: ContainerPtr) -> Self {
        Self { delegate }
    }
}

impl Container for ImmutableContainer {
    #[inline]
    fn id(&self) -> u64 {
        self.delegate.id()
    }

    #[inline]
    fn name(&self) -> &str {
        self.delegate.name()
    }

    #[inline]
    fn parent(&self) -> Option<&ContainerPtr> {
        self.delegate.parent()
    }

    fn children(&self) -> Vec<ContainerPtr> {
        self.delegate.children()
    }

    fn adapters(&self) -> Vec<ComponentAdapterPtr> {
        self.delegate.adapters()
    }

    fn local_adapter(&self, key: &ComponentKey) -> Option<ComponentAdapterPtr> {
        self.delegate.local_adapter(key)
    }

    fn local_adapter_for_type(
        &self,
        requested: TypeInfo,
        name_hint: Option<&str>,
    ) -> Result<Option<ComponentAdapterPtr>, ComponentInstanceProviderError> {
        self.delegate.local_adapter_for_type(requested, name_hint)
    }

    fn resolve_by_key(
        &self,
        key: &ComponentKey,
        stack: &mut ResolutionStack,
    ) -> Result<Option<(ComponentAdapterPtr, ComponentInstanceAnyPtr)>, ComponentInstanceProviderError>
    {
        self.delegate.resolve_by_key(key, stack)
    }

    fn resolve_by_type(
        &self,
        requested: TypeInfo,
        name_hint: Option<&str>,
        stack: &mut ResolutionStack,
    ) -> Result<Option<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>
    {
        self.delegate.resolve_by_type(requested, name_hint, stack)
    }

    fn resolve_all(
        &self,
        requested: TypeInfo,
        excluded: &[ComponentKey],
        stack: &mut ResolutionStack,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>
    {
        self.delegate.resolve_all(requested, excluded, stack)
    }

    fn accept(&self, visitor: &mut dyn ContainerVisitor) {
        traverse(self, visitor);
    }
}
