use crate::adapter::ComponentAdapterPtr;
use crate::container::{next_container_id, Container, ContainerPtr, ResolutionStack};
use crate::error::ComponentInstanceProviderError;
use crate::instance_provider::{CastFunction, ComponentInstanceAnyPtr};
use crate::key::{ComponentKey, TypeInfo};
use crate::visitor::{traverse, ContainerVisitor};

/// Container without any components. Useful as an explicit root of a hierarchy.
pub struct EmptyContainer {
    id: u64,
}

impl Default for EmptyContainer {
    fn default() -> Self {
        Self {
            id: next_container_id(),
        }
    }
}

impl EmptyContainer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Container for EmptyContainer {
    #[inline]
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        "empty"
    }

    fn parent(&self) -> Option<&ContainerPtr> {
        None
    }

    fn children(&self) -> Vec<ContainerPtr> {
        Vec::new()
    }

    fn adapters(&self) -> Vec<ComponentAdapterPtr> {
        Vec::new()
    }

    fn local_adapter(&self, _key: &ComponentKey) -> Option<ComponentAdapterPtr> {
        None
    }

    fn local_adapter_for_type(
        &self,
        _requested: TypeInfo,
        _name_hint: Option<&str>,
    ) -> Result<Option<ComponentAdapterPtr>, ComponentInstanceProviderError> {
        Ok(None)
    }

    fn resolve_by_key(
        &self,
        _key: &ComponentKey,
        _stack: &mut ResolutionStack,
    ) -> Result<Option<(ComponentAdapterPtr, ComponentInstanceAnyPtr)>, ComponentInstanceProviderError>
    {
        Ok(None)
    }

    fn resolve_by_type(
        &self,
        _requested: TypeInfo,
        _name_hint: Option<&str>,
        _stack: &mut ResolutionStack,
    ) -> Result<Option<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>
    {
        Ok(None)
    }

    fn resolve_all(
        &self,
        _requested: TypeInfo,
        _excluded: &[ComponentKey],
        _stack: &mut ResolutionStack,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError> {
        Ok(Vec::new())
    }

    fn accept(&self, visitor: &mut dyn ContainerVisitor) {
        traverse(self, visitor);
    }
}
