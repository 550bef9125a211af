//! Traversal of container hierarchies.
//!
//! [traverse] walks a container, all adapters in their decoration chains and then child
//! containers. [VerifyingVisitor] uses it to check that all registered components could be
//! instantiated, without instantiating anything. [MethodCallingVisitor] calls a method on all
//! components of a given type.

use crate::adapter::{ComponentAdapter, ComponentAdapterPtr};
use crate::component::{Dependency, DependencyKind};
use crate::container::{Container, ResolutionStack};
use crate::error::{ComponentInstanceProviderError, ContainerError};
use crate::instance_provider::{cast, ComponentInstancePtr, ErrorPtr};
use crate::key::{ComponentKey, TypeInfo};
use fxhash::FxHashSet;
use itertools::Itertools;
use std::marker::PhantomData;

/// Visitor of containers and component adapters.
pub trait ContainerVisitor {
    /// Called for each visited container. Returning `false` skips the container contents and its
    /// children.
    fn visit_container(&mut self, container: &dyn Container) -> bool;

    /// Called for each adapter of a container, including decorated delegates.
    fn visit_component_adapter(&mut self, container: &dyn Container, adapter: &dyn ComponentAdapter);
}

/// Visits given container, its adapters with their delegates and then its children.
pub fn traverse(container: &dyn Container, visitor: &mut dyn ContainerVisitor) {
    if !visitor.visit_container(container) {
        return;
    }

    for adapter in container.adapters() {
        let mut current = Some(&adapter);
        while let Some(adapter) = current {
            visitor.visit_component_adapter(container, adapter.as_ref());
            current = adapter.delegate();
        }
    }

    for child in container.children() {
        traverse(child.as_ref(), visitor);
    }
}

#[inline]
fn address(adapter: &dyn ComponentAdapter) -> usize {
    (adapter as *const _ as *const ()) as usize
}

/// Checks that dependencies of all components can be satisfied and do not form cycles.
#[derive(Default)]
pub struct VerifyingVisitor {
    errors: Vec<ComponentInstanceProviderError>,
    verified: FxHashSet<usize>,
    // (container id, adapter address) of nodes with no cycle reachable from them
    finished: FxHashSet<(u64, usize)>,
    reported_cycles: FxHashSet<Vec<String>>,
}

impl VerifyingVisitor {
    /// Verifies given container and its children, reporting all problems found.
    pub fn verify(mut self, container: &dyn Container) -> Result<(), ContainerError> {
        container.accept(&mut self);

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ContainerError::Verification(self.errors))
        }
    }

    fn report_cycle(&mut self, error: ComponentInstanceProviderError) {
        if let ComponentInstanceProviderError::CyclicDependency(path) = &error {
            let members = path.iter().cloned().sorted().dedup().collect_vec();
            if !self.reported_cycles.insert(members) {
                return;
            }
        }

        self.errors.push(error);
    }
}

impl ContainerVisitor for VerifyingVisitor {
    fn visit_container(&mut self, _container: &dyn Container) -> bool {
        true
    }

    fn visit_component_adapter(&mut self, container: &dyn Container, adapter: &dyn ComponentAdapter) {
        // delegates are verified as part of the outermost adapter
        if !self.verified.insert(address(adapter)) {
            return;
        }

        let mut current = adapter.delegate();
        while let Some(delegate) = current {
            self.verified.insert(address(delegate.as_ref()));
            current = delegate.delegate();
        }

        if let Err(error) = adapter.verify(container) {
            self.errors.push(error);
        }

        let mut path = Vec::new();
        if let Err(error) = find_cycle(container, adapter, &mut path, &mut self.finished) {
            self.report_cycle(error);
        }
    }
}

struct PathEntry {
    container: u64,
    adapter: usize,
    key: String,
}

fn find_cycle(
    container: &dyn Container,
    adapter: &dyn ComponentAdapter,
    path: &mut Vec<PathEntry>,
    finished: &mut FxHashSet<(u64, usize)>,
) -> Result<(), ComponentInstanceProviderError> {
    let container_id = container.id();
    let adapter_address = address(adapter);

    if finished.contains(&(container_id, adapter_address)) {
        return Ok(());
    }

    if let Some(position) = path
        .iter()
        .position(|entry| entry.container == container_id && entry.adapter == adapter_address)
    {
        let cycle = path[position..]
            .iter()
            .map(|entry| entry.key.clone())
            .chain([adapter.key().to_string()])
            .collect();
        return Err(ComponentInstanceProviderError::CyclicDependency(cycle));
    }

    path.push(PathEntry {
        container: container_id,
        adapter: adapter_address,
        key: adapter.key().to_string(),
    });

    for dependency in &adapter.definition().dependencies {
        if dependency.kind == DependencyKind::Collection {
            continue;
        }

        if let Some((owner, target)) = locate(container, dependency, path) {
            find_cycle(owner, target.as_ref(), path, finished)?;
        }
    }

    path.pop();
    finished.insert((container_id, adapter_address));
    Ok(())
}

/// Finds the adapter a dependency would resolve to, mirroring runtime resolution: a component
/// already on the path is skipped in favor of a parent one, if present.
fn locate<'c>(
    container: &'c dyn Container,
    dependency: &Dependency,
    path: &[PathEntry],
) -> Option<(&'c dyn Container, ComponentAdapterPtr)> {
    let mut fallback = None;
    let mut current = Some(container);

    while let Some(container) = current {
        let found = match &dependency.name {
            Some(name) => container.local_adapter(&ComponentKey::Name(name.clone())),
            // ambiguities are reported by adapter verification
            None => container
                .local_adapter_for_type(dependency.requested, dependency.hint.as_deref())
                .ok()
                .flatten(),
        };

        if let Some(adapter) = found {
            let on_path = path.iter().any(|entry| {
                entry.container == container.id() && entry.adapter == address(adapter.as_ref())
            });

            if !on_path {
                return Some((container, adapter));
            }

            fallback.get_or_insert((container, adapter));
        }

        current = container.parent().map(|parent| parent.as_ref() as &dyn Container);
    }

    fallback
}

/// Calls a method on every component providing `T` in a container and its children, creating
/// instances when needed. Components are visited parent first, in registration order, or the
/// other way around with [MethodCallingVisitor::in_reverse_order].
///
/// ```
/// use picocontainer::container::DefaultContainer;
/// use picocontainer::visitor::MethodCallingVisitor;
///
/// let container = DefaultContainer::new();
/// container.add_named_instance("a", 1u8).unwrap();
/// container.add_named_instance("b", 2u8).unwrap();
///
/// let mut sum = 0;
/// let called = MethodCallingVisitor::new(|value: &u8| {
///     sum += *value;
///     Ok(())
/// })
/// .call(&container)
/// .unwrap();
///
/// assert_eq!(called, 2);
/// assert_eq!(sum, 3);
/// ```
pub struct MethodCallingVisitor<T: ?Sized + 'static, F> {
    method: F,
    reverse: bool,
    instances: Vec<(String, ComponentInstancePtr<T>)>,
    error: Option<ContainerError>,
    _phantom: PhantomData<fn(&T)>,
}

impl<T, F> MethodCallingVisitor<T, F>
where
    T: ?Sized + 'static,
    F: FnMut(&T) -> Result<(), ErrorPtr>,
{
    pub fn new(method: F) -> Self {
        Self {
            method,
            reverse: false,
            instances: Vec::new(),
            error: None,
            _phantom: PhantomData,
        }
    }

    /// Visits children first and components in reverse registration order.
    pub fn in_reverse_order(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Calls the method on all components, stopping on the first failure. Returns the number of
    /// components called.
    pub fn call(mut self, container: &dyn Container) -> Result<usize, ContainerError> {
        container.accept(&mut self);
        if let Some(error) = self.error {
            return Err(error);
        }

        let mut instances = self.instances;
        if self.reverse {
            instances.reverse();
        }

        for (key, instance) in &instances {
            (self.method)(instance).map_err(|error| ContainerError::MethodCall {
                key: key.clone(),
                error,
            })?;
        }

        Ok(instances.len())
    }
}

impl<T, F> ContainerVisitor for MethodCallingVisitor<T, F>
where
    T: ?Sized + 'static,
    F: FnMut(&T) -> Result<(), ErrorPtr>,
{
    fn visit_container(&mut self, _container: &dyn Container) -> bool {
        self.error.is_none()
    }

    fn visit_component_adapter(&mut self, container: &dyn Container, adapter: &dyn ComponentAdapter) {
        let requested = TypeInfo::of::<T>();
        if self.error.is_some() || !adapter.definition().provides(requested) {
            return;
        }

        // delegates share the key of the registered adapter
        let registered = container
            .local_adapter(adapter.key())
            .map(|registered| address(registered.as_ref()) == address(adapter))
            .unwrap_or_default();
        if !registered {
            return;
        }

        let result = container
            .resolve_by_key(adapter.key(), &mut ResolutionStack::default())
            .and_then(|resolved| {
                resolved.ok_or_else(|| {
                    ComponentInstanceProviderError::NoNamedInstance(adapter.key().to_string())
                })
            })
            .and_then(|(resolved, instance)| {
                resolved
                    .definition()
                    .provided_type(requested)
                    .ok_or(ComponentInstanceProviderError::IncompatibleComponent(
                        requested,
                    ))
                    .and_then(|provided| cast::<T>((instance, provided.cast)))
            });

        match result {
            Ok(instance) => self.instances.push((adapter.key().to_string(), instance)),
            Err(error) => self.error = Some(error.into()),
        }
    }
}
