use crate::adapter::ComponentAdapterPtr;
use crate::container::{next_container_id, Container, ContainerPtr, ResolutionStack};
use crate::error::ComponentInstanceProviderError;
use crate::instance_provider::{CastFunction, ComponentInstanceAnyPtr};
use crate::key::{ComponentKey, TypeInfo};
use crate::visitor::{traverse, ContainerVisitor};

/// Read-only container combining other containers. Lookups ask the combined containers in order,
/// and the first one providing a component wins. Collections gather components from all of them.
///
/// A composite is usually the parent of a [DefaultContainer](crate::container::DefaultContainer)
/// which needs components from several unrelated hierarchies.
pub struct CompositeContainer {
    id: u64,
    name: String,
    containers: Vec<ContainerPtr>,
}

impl CompositeContainer {
    pub fn new(containers: Vec<ContainerPtr>) -> Self {
        let id = next_container_id();
        Self {
            id,
            name: format!("composite-{id}"),
            containers,
        }
    }

    pub fn with_name<N: ToString>(mut self, name: N) -> Self {
        self.name = name.to_string();
        self
    }

    /// Combined containers, in lookup order.
    #[inline]
    pub fn containers(&self) -> &[ContainerPtr] {
        &self.containers
    }
}

impl Container for CompositeContainer {
    #[inline]
    fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<&ContainerPtr> {
        None
    }

    fn children(&self) -> Vec<ContainerPtr> {
        Vec::new()
    }

    fn adapters(&self) -> Vec<ComponentAdapterPtr> {
        self.containers
            .iter()
            .flat_map(|container| container.adapters())
            .collect()
    }

    fn local_adapter(&self, key: &ComponentKey) -> Option<ComponentAdapterPtr> {
        self.containers
            .iter()
            .find_map(|container| container.local_adapter(key))
    }

    fn local_adapter_for_type(
        &self,
        requested: TypeInfo,
        name_hint: Option<&str>,
    ) -> Result<Option<ComponentAdapterPtr>, ComponentInstanceProviderError> {
        for container in &self.containers {
            if let Some(adapter) = container.local_adapter_for_type(requested, name_hint)? {
                return Ok(Some(adapter));
            }
        }

        Ok(None)
    }

    fn resolve_by_key(
        &self,
        key: &ComponentKey,
        stack: &mut ResolutionStack,
    ) -> Result<Option<(ComponentAdapterPtr, ComponentInstanceAnyPtr)>, ComponentInstanceProviderError>
    {
        for container in &self.containers {
            if let Some(resolved) = container.resolve_by_key(key, stack)? {
                return Ok(Some(resolved));
            }
        }

        Ok(None)
    }

    fn resolve_by_type(
        &self,
        requested: TypeInfo,
        name_hint: Option<&str>,
        stack: &mut ResolutionStack,
    ) -> Result<Option<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>
    {
        for container in &self.containers {
            if let Some(resolved) = container.resolve_by_type(requested, name_hint, stack)? {
                return Ok(Some(resolved));
            }
        }

        Ok(None)
    }

    fn resolve_all(
        &self,
        requested: TypeInfo,
        excluded: &[ComponentKey],
        stack: &mut ResolutionStack,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError> {
        let mut instances = Vec::new();
        for container in &self.containers {
            instances.extend(container.resolve_all(requested, excluded, stack)?);
        }

        Ok(instances)
    }

    fn accept(&self, visitor: &mut dyn ContainerVisitor) {
        traverse(self, visitor);
    }

    fn component_adapter(&self, key: &ComponentKey) -> Option<ComponentAdapterPtr> {
        self.containers
            .iter()
            .find_map(|container| container.component_adapter(key))
    }

    fn find_adapter_for_type(
        &self,
        requested: TypeInfo,
        name_hint: Option<&str>,
    ) -> Result<Option<ComponentAdapterPtr>, ComponentInstanceProviderError> {
        for container in &self.containers {
            if let Some(adapter) = container.find_adapter_for_type(requested, name_hint)? {
                return Ok(Some(adapter));
            }
        }

        Ok(None)
    }
}
