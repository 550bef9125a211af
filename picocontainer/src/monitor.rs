//! Monitors observe what containers do: instantiating components, invoking lifecycle methods and
//! failing to find components.

mod dot;

pub use dot::DotDependencyGraphMonitor;

use crate::definition::ComponentDefinition;
use crate::error::{ComponentInstanceProviderError, ContainerError};
use crate::instance_provider::ErrorPtr;
use crate::key::ComponentKey;
use crate::lifecycle::LifecycleOperation;
use crate::sync::{lock, read, write};
use itertools::Itertools;
#[cfg(test)]
use mockall::automock;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

pub type ComponentMonitorPtr = Arc<dyn ComponentMonitor>;

/// Observer of container activity. All methods have empty default implementations.
#[cfg_attr(test, automock)]
pub trait ComponentMonitor: Send + Sync {
    fn instantiating(&self, _key: &ComponentKey, _definition: &ComponentDefinition) {}

    /// Called after successful instantiation with keys of all requested dependencies.
    fn instantiated(
        &self,
        _key: &ComponentKey,
        _definition: &ComponentDefinition,
        _dependencies: &[String],
        _duration: Duration,
    ) {
    }

    fn instantiation_failed(
        &self,
        _key: &ComponentKey,
        _definition: &ComponentDefinition,
        _error: &ComponentInstanceProviderError,
    ) {
    }

    fn invoking(&self, _key: &ComponentKey, _operation: LifecycleOperation) {}

    fn invoked(&self, _key: &ComponentKey, _operation: LifecycleOperation, _duration: Duration) {}

    /// Called when a lifecycle method fails. Returning `false` swallows the error.
    fn lifecycle_invocation_failed(
        &self,
        _key: &ComponentKey,
        _operation: LifecycleOperation,
        _error: &ErrorPtr,
    ) -> bool {
        true
    }

    fn no_component_found(&self, _key: &ComponentKey) {}

    /// Called when a behavior decorates the adapter registered under given key.
    fn new_behavior(&self, _key: &ComponentKey, _behavior: &str) {}
}

/// Monitor which does nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullComponentMonitor;

impl ComponentMonitor for NullComponentMonitor {}

/// Monitor emitting [tracing] events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingComponentMonitor;

impl ComponentMonitor for TracingComponentMonitor {
    fn instantiating(&self, key: &ComponentKey, definition: &ComponentDefinition) {
        debug!(%key, implementation = %definition.implementation, "Instantiating component.");
    }

    fn instantiated(
        &self,
        key: &ComponentKey,
        _definition: &ComponentDefinition,
        dependencies: &[String],
        duration: Duration,
    ) {
        debug!(
            %key,
            dependencies = %dependencies.iter().join(", "),
            ?duration,
            "Instantiated component."
        );
    }

    fn instantiation_failed(
        &self,
        key: &ComponentKey,
        _definition: &ComponentDefinition,
        error: &ComponentInstanceProviderError,
    ) {
        warn!(%key, %error, "Instantiation failed.");
    }

    fn invoking(&self, key: &ComponentKey, operation: LifecycleOperation) {
        debug!(%key, %operation, "Invoking lifecycle method.");
    }

    fn invoked(&self, key: &ComponentKey, operation: LifecycleOperation, duration: Duration) {
        info!(%key, %operation, ?duration, "Invoked lifecycle method.");
    }

    fn lifecycle_invocation_failed(
        &self,
        key: &ComponentKey,
        operation: LifecycleOperation,
        error: &ErrorPtr,
    ) -> bool {
        warn!(%key, %operation, %error, "Lifecycle method failed.");
        true
    }

    fn no_component_found(&self, key: &ComponentKey) {
        debug!(%key, "No component found.");
    }

    fn new_behavior(&self, key: &ComponentKey, behavior: &str) {
        debug!(%key, behavior, "Added behavior.");
    }
}

/// Monitor collecting lifecycle failures instead of propagating them. All events are forwarded to
/// the delegate.
pub struct LifecycleComponentMonitor {
    delegate: ComponentMonitorPtr,
    failures: Mutex<Vec<String>>,
}

impl Default for LifecycleComponentMonitor {
    fn default() -> Self {
        Self::new(Arc::new(NullComponentMonitor))
    }
}

impl LifecycleComponentMonitor {
    pub fn new(delegate: ComponentMonitorPtr) -> Self {
        Self {
            delegate,
            failures: Default::default(),
        }
    }

    /// Reports all collected failures at once.
    pub fn check(&self) -> Result<(), ContainerError> {
        let failures = lock(&self.failures);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContainerError::LifecycleFailures(failures.clone()))
        }
    }
}

impl ComponentMonitor for LifecycleComponentMonitor {
    fn instantiating(&self, key: &ComponentKey, definition: &ComponentDefinition) {
        self.delegate.instantiating(key, definition);
    }

    fn instantiated(
        &self,
        key: &ComponentKey,
        definition: &ComponentDefinition,
        dependencies: &[String],
        duration: Duration,
    ) {
        self.delegate
            .instantiated(key, definition, dependencies, duration);
    }

    fn instantiation_failed(
        &self,
        key: &ComponentKey,
        definition: &ComponentDefinition,
        error: &ComponentInstanceProviderError,
    ) {
        self.delegate.instantiation_failed(key, definition, error);
    }

    fn invoking(&self, key: &ComponentKey, operation: LifecycleOperation) {
        self.delegate.invoking(key, operation);
    }

    fn invoked(&self, key: &ComponentKey, operation: LifecycleOperation, duration: Duration) {
        self.delegate.invoked(key, operation, duration);
    }

    fn lifecycle_invocation_failed(
        &self,
        key: &ComponentKey,
        operation: LifecycleOperation,
        error: &ErrorPtr,
    ) -> bool {
        lock(&self.failures).push(format!("{operation} of {key}: {error}"));
        self.delegate
            .lifecycle_invocation_failed(key, operation, error);
        false
    }

    fn no_component_found(&self, key: &ComponentKey) {
        self.delegate.no_component_found(key);
    }

    fn new_behavior(&self, key: &ComponentKey, behavior: &str) {
        self.delegate.new_behavior(key, behavior);
    }
}

/// Monitor forwarding events to many monitors. A lifecycle failure is propagated if any of the
/// monitors wants it to.
#[derive(Clone, Default)]
pub struct ComposingMonitor {
    monitors: Vec<ComponentMonitorPtr>,
}

impl ComposingMonitor {
    pub fn new(monitors: Vec<ComponentMonitorPtr>) -> Self {
        Self { monitors }
    }

    pub fn with_monitor(mut self, monitor: ComponentMonitorPtr) -> Self {
        self.monitors.push(monitor);
        self
    }
}

impl ComponentMonitor for ComposingMonitor {
    fn instantiating(&self, key: &ComponentKey, definition: &ComponentDefinition) {
        for monitor in &self.monitors {
            monitor.instantiating(key, definition);
        }
    }

    fn instantiated(
        &self,
        key: &ComponentKey,
        definition: &ComponentDefinition,
        dependencies: &[String],
        duration: Duration,
    ) {
        for monitor in &self.monitors {
            monitor.instantiated(key, definition, dependencies, duration);
        }
    }

    fn instantiation_failed(
        &self,
        key: &ComponentKey,
        definition: &ComponentDefinition,
        error: &ComponentInstanceProviderError,
    ) {
        for monitor in &self.monitors {
            monitor.instantiation_failed(key, definition, error);
        }
    }

    fn invoking(&self, key: &ComponentKey, operation: LifecycleOperation) {
        for monitor in &self.monitors {
            monitor.invoking(key, operation);
        }
    }

    fn invoked(&self, key: &ComponentKey, operation: LifecycleOperation, duration: Duration) {
        for monitor in &self.monitors {
            monitor.invoked(key, operation, duration);
        }
    }

    fn lifecycle_invocation_failed(
        &self,
        key: &ComponentKey,
        operation: LifecycleOperation,
        error: &ErrorPtr,
    ) -> bool {
        // every monitor needs to see the failure
        self.monitors.iter().fold(false, |rethrow, monitor| {
            monitor.lifecycle_invocation_failed(key, operation, error) || rethrow
        })
    }

    fn no_component_found(&self, key: &ComponentKey) {
        for monitor in &self.monitors {
            monitor.no_component_found(key);
        }
    }

    fn new_behavior(&self, key: &ComponentKey, behavior: &str) {
        for monitor in &self.monitors {
            monitor.new_behavior(key, behavior);
        }
    }
}

/// Shared, replaceable monitor. Adapters keep a handle, so changing the monitor of a container
/// affects already registered components.
#[derive(Clone)]
pub struct MonitorHandle(Arc<RwLock<ComponentMonitorPtr>>);

impl Default for MonitorHandle {
    fn default() -> Self {
        Self::new(Arc::new(NullComponentMonitor))
    }
}

impl MonitorHandle {
    pub fn new(monitor: ComponentMonitorPtr) -> Self {
        Self(Arc::new(RwLock::new(monitor)))
    }

    /// Returns the current monitor.
    pub fn current(&self) -> ComponentMonitorPtr {
        read(&self.0).clone()
    }

    pub fn replace(&self, monitor: ComponentMonitorPtr) {
        *write(&self.0) = monitor;
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ContainerError;
    use crate::instance_provider::ErrorPtr;
    use crate::key::ComponentKey;
    use crate::lifecycle::LifecycleOperation;
    use crate::monitor::{
        ComponentMonitor, ComponentMonitorPtr, ComposingMonitor, LifecycleComponentMonitor,
        MockComponentMonitor, MonitorHandle, NullComponentMonitor,
    };
    use std::fmt::{Display, Formatter};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError;

    impl Display for TestError {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str("boom")
        }
    }

    impl std::error::Error for TestError {}

    #[test]
    fn should_collect_lifecycle_failures() {
        let mut delegate = MockComponentMonitor::new();
        delegate
            .expect_lifecycle_invocation_failed()
            .times(1)
            .return_const(true);

        let monitor = LifecycleComponentMonitor::new(Arc::new(delegate));
        assert!(monitor.check().is_ok());

        assert!(!monitor.lifecycle_invocation_failed(
            &ComponentKey::from("server"),
            LifecycleOperation::Start,
            &(Arc::new(TestError) as ErrorPtr),
        ));

        let ContainerError::LifecycleFailures(failures) = monitor.check().unwrap_err() else {
            panic!("Expected lifecycle failures.");
        };
        assert_eq!(failures, vec!["start of 'server': boom".to_string()]);
    }

    #[test]
    fn should_rethrow_when_any_composed_monitor_wants_to() {
        let mut swallowing = MockComponentMonitor::new();
        swallowing
            .expect_lifecycle_invocation_failed()
            .times(1)
            .return_const(false);

        let mut rethrowing = MockComponentMonitor::new();
        rethrowing
            .expect_lifecycle_invocation_failed()
            .times(1)
            .return_const(true);

        let monitor = ComposingMonitor::new(vec![
            Arc::new(rethrowing) as ComponentMonitorPtr,
            Arc::new(swallowing) as ComponentMonitorPtr,
        ]);
        assert!(monitor.lifecycle_invocation_failed(
            &ComponentKey::from("server"),
            LifecycleOperation::Stop,
            &(Arc::new(TestError) as ErrorPtr),
        ));
    }

    #[test]
    fn should_replace_monitor_for_all_handles() {
        let handle = MonitorHandle::default();
        let cloned = handle.clone();

        let mut monitor = MockComponentMonitor::new();
        monitor
            .expect_no_component_found()
            .times(1)
            .return_const(());
        handle.replace(Arc::new(monitor));

        cloned
            .current()
            .no_component_found(&ComponentKey::from("missing"));
        handle.replace(Arc::new(NullComponentMonitor));
    }
}
