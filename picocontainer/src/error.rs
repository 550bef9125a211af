use crate::instance_provider::ErrorPtr;
use crate::key::TypeInfo;
use crate::lifecycle::{LifecycleOperation, LifecycleState};
use itertools::Itertools;
use thiserror::Error;

/// Errors related to resolving and creating component instances.
#[derive(Error, Clone, Debug)]
pub enum ComponentInstanceProviderError {
    #[error("Cannot find an instance for component '{0}' in the container hierarchy.")]
    NoPrimaryInstance(TypeInfo),
    #[error("Tried to downcast component to incompatible type: {0}")]
    IncompatibleComponent(TypeInfo),
    #[error("Cannot find named component: {0}")]
    NoNamedInstance(String),
    #[error("Ambiguous resolution of '{requested}' - candidates: {}", .candidates.join(", "))]
    AmbiguousComponentResolution {
        requested: TypeInfo,
        candidates: Vec<String>,
    },
    #[error("Cyclic dependency detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),
    #[error("Error constructing component {component}: {error}")]
    ConstructorError { component: String, error: ErrorPtr },
    #[error("Guard '{guard}' of component {component} failed: {error}")]
    GuardFailed {
        component: String,
        guard: String,
        error: Box<ComponentInstanceProviderError>,
    },
    #[error("Lifecycle of component {component} failed: {message}")]
    LifecycleState { component: String, message: String },
}

/// Errors related to registering components and managing containers.
#[derive(Error, Clone, Debug)]
pub enum ContainerError {
    #[error("Duplicate keys not allowed. Duplicate for {0}")]
    DuplicateKey(String),
    #[error("Unprocessed characteristics for component {key}: {characteristics}")]
    UnprocessedCharacteristics {
        key: String,
        characteristics: String,
    },
    #[error("Cannot hide the implementation of {0} - it is not registered under any alias")]
    NoAliasToHideBehind(String),
    #[error("Cannot have circular dependency between parent {parent} and child: {child}")]
    CircularChildContainer { parent: String, child: String },
    #[error("Cannot {operation}. Current container state was: {state:?}")]
    IllegalLifecycleState {
        operation: &'static str,
        state: LifecycleState,
    },
    #[error("{key} {message}")]
    IllegalComponentState { key: String, message: &'static str },
    #[error("Lifecycle {operation} of {key} failed: {error}")]
    Lifecycle {
        key: String,
        operation: LifecycleOperation,
        error: ErrorPtr,
    },
    #[error("Lifecycle failures: {}", .0.iter().join("; "))]
    LifecycleFailures(Vec<String>),
    #[error("Calling method on {key} failed: {error}")]
    MethodCall { key: String, error: ErrorPtr },
    #[error("Verification failed: {}", .0.iter().join("; "))]
    Verification(Vec<ComponentInstanceProviderError>),
    #[error(transparent)]
    Instance(#[from] ComponentInstanceProviderError),
}
