//! Component lifecycle: starting, stopping and disposing of component instances.
//!
//! Components opt into the lifecycle by implementing [Startable] and/or [Disposable] and
//! declaring it during registration (`#[component(startable)]` when deriving, or
//! [ComponentRegistration::startable](crate::injection::ComponentRegistration::startable)). The
//! container keeps instances in construction order, so dependencies are always started before
//! their dependants and stopped or disposed after them.
//!
//! ```
//! use picocontainer::component::Component;
//! use picocontainer::container::ContainerBuilder;
//! use picocontainer::instance_provider::ErrorPtr;
//! use picocontainer::lifecycle::Startable;
//! use picocontainer::Component;
//!
//! #[derive(Component)]
//! #[component(startable)]
//! struct Server;
//!
//! impl Startable for Server {
//!     fn start(&self) -> Result<(), ErrorPtr> {
//!         println!("listening");
//!         Ok(())
//!     }
//!
//!     fn stop(&self) -> Result<(), ErrorPtr> {
//!         Ok(())
//!     }
//! }
//!
//! let container = ContainerBuilder::new().with_caching().build();
//! container.add_component::<Server>().unwrap();
//! container.start().unwrap();
//! container.dispose().unwrap();
//! ```

use crate::adapter::ComponentAdapter;
use crate::definition::ComponentDefinition;
use crate::error::ContainerError;
use crate::instance_provider::{ComponentInstanceAnyPtr, ErrorPtr};
use crate::key::ComponentKey;
use crate::monitor::ComponentMonitor;
use std::any::Any;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Components which can be started and stopped, possibly many times.
pub trait Startable {
    fn start(&self) -> Result<(), ErrorPtr>;

    fn stop(&self) -> Result<(), ErrorPtr>;
}

/// Components holding resources which need to be released when the container is disposed.
pub trait Disposable {
    fn dispose(&self) -> Result<(), ErrorPtr>;
}

/// Recovers the [Startable] view of an erased instance.
pub type StartableCast = for<'a> fn(&'a ComponentInstanceAnyPtr) -> Option<&'a dyn Startable>;

/// Recovers the [Disposable] view of an erased instance.
pub type DisposableCast = for<'a> fn(&'a ComponentInstanceAnyPtr) -> Option<&'a dyn Disposable>;

/// [StartableCast] for instances of type `T`.
pub fn startable_cast<T: Startable + Any + Send + Sync>(
    instance: &ComponentInstanceAnyPtr,
) -> Option<&dyn Startable> {
    (**instance)
        .downcast_ref::<T>()
        .map(|instance| instance as &dyn Startable)
}

/// [DisposableCast] for instances of type `T`.
pub fn disposable_cast<T: Disposable + Any + Send + Sync>(
    instance: &ComponentInstanceAnyPtr,
) -> Option<&dyn Disposable> {
    (**instance)
        .downcast_ref::<T>()
        .map(|instance| instance as &dyn Disposable)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LifecycleOperation {
    Start,
    Stop,
    Dispose,
}

impl Display for LifecycleOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Dispose => "dispose",
        })
    }
}

pub type LifecycleStrategyPtr = Arc<dyn LifecycleStrategy>;

/// Decides how lifecycle operations are invoked on component instances.
pub trait LifecycleStrategy: Send + Sync {
    fn start(
        &self,
        monitor: &dyn ComponentMonitor,
        key: &ComponentKey,
        definition: &ComponentDefinition,
        instance: &ComponentInstanceAnyPtr,
    ) -> Result<(), ErrorPtr>;

    fn stop(
        &self,
        monitor: &dyn ComponentMonitor,
        key: &ComponentKey,
        definition: &ComponentDefinition,
        instance: &ComponentInstanceAnyPtr,
    ) -> Result<(), ErrorPtr>;

    fn dispose(
        &self,
        monitor: &dyn ComponentMonitor,
        key: &ComponentKey,
        definition: &ComponentDefinition,
        instance: &ComponentInstanceAnyPtr,
    ) -> Result<(), ErrorPtr>;

    /// Checks if instances of given component take part in the lifecycle.
    fn has_lifecycle(&self, definition: &ComponentDefinition) -> bool;

    /// Lazy components are not instantiated when the container starts, but started on first
    /// request instead.
    fn is_lazy(&self, _adapter: &dyn ComponentAdapter) -> bool {
        false
    }
}

/// Default strategy dispatching to [Startable] and [Disposable] implementations declared in
/// component definitions.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StartableLifecycleStrategy {
    lazy: bool,
}

impl StartableLifecycleStrategy {
    /// Creates a strategy which starts components on first request, if the container has already
    /// been started.
    pub fn lazy() -> Self {
        Self { lazy: true }
    }

    fn invoke(
        monitor: &dyn ComponentMonitor,
        key: &ComponentKey,
        operation: LifecycleOperation,
        invocation: impl FnOnce() -> Result<(), ErrorPtr>,
    ) -> Result<(), ErrorPtr> {
        monitor.invoking(key, operation);

        let started = Instant::now();
        match invocation() {
            Ok(_) => {
                monitor.invoked(key, operation, started.elapsed());
                Ok(())
            }
            Err(error) if monitor.lifecycle_invocation_failed(key, operation, &error) => {
                Err(error)
            }
            Err(_) => Ok(()),
        }
    }
}

impl LifecycleStrategy for StartableLifecycleStrategy {
    fn start(
        &self,
        monitor: &dyn ComponentMonitor,
        key: &ComponentKey,
        definition: &ComponentDefinition,
        instance: &ComponentInstanceAnyPtr,
    ) -> Result<(), ErrorPtr> {
        match definition.startable.and_then(|cast| cast(instance)) {
            Some(startable) => {
                Self::invoke(monitor, key, LifecycleOperation::Start, || startable.start())
            }
            None => Ok(()),
        }
    }

    fn stop(
        &self,
        monitor: &dyn ComponentMonitor,
        key: &ComponentKey,
        definition: &ComponentDefinition,
        instance: &ComponentInstanceAnyPtr,
    ) -> Result<(), ErrorPtr> {
        match definition.startable.and_then(|cast| cast(instance)) {
            Some(startable) => {
                Self::invoke(monitor, key, LifecycleOperation::Stop, || startable.stop())
            }
            None => Ok(()),
        }
    }

    fn dispose(
        &self,
        monitor: &dyn ComponentMonitor,
        key: &ComponentKey,
        definition: &ComponentDefinition,
        instance: &ComponentInstanceAnyPtr,
    ) -> Result<(), ErrorPtr> {
        match definition.disposable.and_then(|cast| cast(instance)) {
            Some(disposable) => Self::invoke(monitor, key, LifecycleOperation::Dispose, || {
                disposable.dispose()
            }),
            None => Ok(()),
        }
    }

    #[inline]
    fn has_lifecycle(&self, definition: &ComponentDefinition) -> bool {
        definition.has_lifecycle()
    }

    #[inline]
    fn is_lazy(&self, _adapter: &dyn ComponentAdapter) -> bool {
        self.lazy
    }
}

/// Strategy ignoring lifecycle altogether.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NullLifecycleStrategy;

impl LifecycleStrategy for NullLifecycleStrategy {
    fn start(
        &self,
        _monitor: &dyn ComponentMonitor,
        _key: &ComponentKey,
        _definition: &ComponentDefinition,
        _instance: &ComponentInstanceAnyPtr,
    ) -> Result<(), ErrorPtr> {
        Ok(())
    }

    fn stop(
        &self,
        _monitor: &dyn ComponentMonitor,
        _key: &ComponentKey,
        _definition: &ComponentDefinition,
        _instance: &ComponentInstanceAnyPtr,
    ) -> Result<(), ErrorPtr> {
        Ok(())
    }

    fn dispose(
        &self,
        _monitor: &dyn ComponentMonitor,
        _key: &ComponentKey,
        _definition: &ComponentDefinition,
        _instance: &ComponentInstanceAnyPtr,
    ) -> Result<(), ErrorPtr> {
        Ok(())
    }

    fn has_lifecycle(&self, _definition: &ComponentDefinition) -> bool {
        false
    }
}

/// Lifecycle state of a container.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum LifecycleState {
    #[default]
    Constructed,
    Started,
    Stopped,
    Disposed,
}

impl LifecycleState {
    fn illegal(self, operation: &'static str) -> ContainerError {
        ContainerError::IllegalLifecycleState {
            operation,
            state: self,
        }
    }

    /// Transitions to [LifecycleState::Started].
    pub fn starting(&mut self) -> Result<(), ContainerError> {
        match self {
            Self::Constructed | Self::Stopped => {
                *self = Self::Started;
                Ok(())
            }
            _ => Err(self.illegal("start")),
        }
    }

    /// Transitions to [LifecycleState::Stopped].
    pub fn stopping(&mut self) -> Result<(), ContainerError> {
        match self {
            Self::Started => {
                *self = Self::Stopped;
                Ok(())
            }
            _ => Err(self.illegal("stop")),
        }
    }

    /// Transitions to [LifecycleState::Disposed]. A started container needs to be stopped first.
    pub fn disposing(&mut self) -> Result<(), ContainerError> {
        match self {
            Self::Constructed | Self::Stopped => {
                *self = Self::Disposed;
                Ok(())
            }
            _ => Err(self.illegal("dispose")),
        }
    }

    /// Checks if components can be removed in the current state.
    pub fn removing_component(&self) -> Result<(), ContainerError> {
        if self.is_started() {
            Err(self.illegal("remove component"))
        } else {
            Ok(())
        }
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        *self == Self::Started
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        *self == Self::Disposed
    }
}

/// Lifecycle of a single stored component instance, exposed by adapters which own one.
pub trait ComponentLifecycle {
    fn start(&self) -> Result<(), ContainerError>;

    fn stop(&self) -> Result<(), ContainerError>;

    fn dispose(&self) -> Result<(), ContainerError>;

    fn has_lifecycle(&self) -> bool;

    fn is_started(&self) -> bool;
}

/// Everything needed to invoke lifecycle operations on a stored instance.
pub(crate) struct LifecycleContext<'a> {
    pub(crate) key: &'a ComponentKey,
    pub(crate) definition: &'a ComponentDefinition,
    pub(crate) strategy: &'a dyn LifecycleStrategy,
    pub(crate) monitor: &'a dyn ComponentMonitor,
}

impl LifecycleContext<'_> {
    fn illegal(&self, message: &'static str) -> ContainerError {
        ContainerError::IllegalComponentState {
            key: self.key.to_string(),
            message,
        }
    }

    fn failed(&self, operation: LifecycleOperation, error: ErrorPtr) -> ContainerError {
        ContainerError::Lifecycle {
            key: self.key.to_string(),
            operation,
            error,
        }
    }
}

/// A stored instance along with its lifecycle flags.
#[derive(Clone, Default)]
pub(crate) struct StoredInstance {
    pub(crate) instance: Option<ComponentInstanceAnyPtr>,
    started: bool,
    disposed: bool,
}

impl StoredInstance {
    pub(crate) fn new(instance: ComponentInstanceAnyPtr) -> Self {
        Self {
            instance: Some(instance),
            ..Default::default()
        }
    }

    #[inline]
    pub(crate) fn is_started(&self) -> bool {
        self.started
    }

    pub(crate) fn start(&mut self, context: &LifecycleContext) -> Result<(), ContainerError> {
        if self.disposed {
            return Err(context.illegal("already disposed"));
        }

        if self.started {
            return Err(context.illegal("already started"));
        }

        let instance = self
            .instance
            .as_ref()
            .ok_or_else(|| context.illegal("not instantiated"))?;

        context
            .strategy
            .start(context.monitor, context.key, context.definition, instance)
            .map_err(|error| context.failed(LifecycleOperation::Start, error))?;

        self.started = true;
        Ok(())
    }

    pub(crate) fn stop(&mut self, context: &LifecycleContext) -> Result<(), ContainerError> {
        if self.disposed {
            return Err(context.illegal("already disposed"));
        }

        if !self.started {
            return Err(context.illegal("not started"));
        }

        let instance = self
            .instance
            .as_ref()
            .ok_or_else(|| context.illegal("not instantiated"))?;

        // a failing stop still leaves the component stopped
        self.started = false;
        context
            .strategy
            .stop(context.monitor, context.key, context.definition, instance)
            .map_err(|error| context.failed(LifecycleOperation::Stop, error))
    }

    pub(crate) fn dispose(&mut self, context: &LifecycleContext) -> Result<(), ContainerError> {
        if self.disposed {
            return Err(context.illegal("already disposed"));
        }

        if self.started {
            self.stop(context)?;
        }

        self.disposed = true;
        match &self.instance {
            Some(instance) => context
                .strategy
                .dispose(context.monitor, context.key, context.definition, instance)
                .map_err(|error| context.failed(LifecycleOperation::Dispose, error)),
            None => Ok(()),
        }
    }
}
