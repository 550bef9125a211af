//! One of the basic blocks of dependency injection is a [Component]. Components are injectable
//! objects, which themselves can contain dependencies to other components.
//!
//! ## Defining components
//!
//! Any type which wants to be constructed by a container, needs to implement `Component`. For
//! convenience, the trait can be automatically derived if the `derive` feature is enabled:
//!
//! ```
//! use picocontainer::component::Component;
//! use picocontainer::instance_provider::ComponentInstancePtr;
//! use picocontainer::{Component, component_alias, injectable};
//!
//! #[injectable]
//! trait TestTrait {}
//!
//! #[derive(Component)]
//! struct TestDependency;
//!
//! #[component_alias]
//! impl TestTrait for TestDependency {}
//!
//! #[derive(Component)]
//! struct TestComponent {
//!     // concrete type dependency
//!     dependency_1: ComponentInstancePtr<TestDependency>,
//!     // single dyn Trait dependency - note Send + Sync
//!     dependency_2: ComponentInstancePtr<dyn TestTrait + Send + Sync>,
//!     // optional dependency - don't fail, when not present
//!     optional_dependency: Option<ComponentInstancePtr<TestDependency>>,
//!     // all registered dependencies of given type
//!     all_dependencies: Vec<ComponentInstancePtr<dyn TestTrait + Send + Sync>>,
//!     // dependency registered under a name
//!     #[component(name = "dependency")]
//!     named_dependency: ComponentInstancePtr<TestDependency>,
//!     #[component(default)]
//!     default: i8,
//!     #[component(default = "dummy_expr")]
//!     default_expr: i8,
//! }
//!
//! fn dummy_expr() -> i8 {
//!     -1
//! }
//! ```
//!
//! Deriving fills the struct fields directly (field injection). When the field names are needed to
//! tell apart multiple candidates of the same type, a component registered under the field name
//! wins.
//!
//! ### Supported `#[component]` struct configuration
//!
//! * `constructor = "expr"` - call `expr(dependencies...)` to construct the component, instead of
//! filling the fields (constructor injection); parameters must be in the same order as fields in
//! the struct while non-injected fields can be skipped with the `#[component(ignore)]` attribute;
//! the constructor returns `Result<Self, ErrorPtr>`
//! * `startable` - the component implements [Startable](crate::lifecycle::Startable) and takes
//! part in the container lifecycle
//! * `disposable` - the component implements [Disposable](crate::lifecycle::Disposable)
//!
//! ### Supported `#[component]` field configuration
//!
//! * `default` - use `Default::default()` initialization
//! * `default = "expr"` - call `expr()` for initialization
//! * `name = "name"` - inject instance registered as `name`
//! * `ignore` - ignore the field when using custom constructor
//!
//! ## Component aliases
//!
//! Component aliases are different types, which can refer to a concrete component type. Usually
//! they are simply `dyn Traits`, which makes it possible to inject an abstract `dyn Trait` type
//! instead of a concrete component type. Each injectable trait should be marked as such, which can
//! be done with the `#[injectable]` helper attribute, and each implementation with
//! `#[component_alias]`. The alias is then published during registration:
//!
//! ```
//! use picocontainer::container::DefaultContainer;
//! use picocontainer::injection::ComponentRegistration;
//! use picocontainer::{Component, component_alias, injectable};
//!
//! #[derive(Component)]
//! struct SomeComponent;
//!
//! #[injectable]
//! trait SomeTrait {
//! }
//!
//! #[component_alias]
//! impl SomeTrait for SomeComponent {
//! }
//!
//! let container = DefaultContainer::new();
//! container
//!     .register(ComponentRegistration::<SomeComponent>::component().alias::<dyn SomeTrait + Send + Sync>())
//!     .unwrap();
//! ```
//!
//! The above example shows how it's possible to request both `ComponentInstancePtr<SomeComponent>`
//! and `ComponentInstancePtr<dyn SomeTrait + Send + Sync>`.

use crate::error::ComponentInstanceProviderError;
use crate::instance_provider::{
    ComponentInstanceAnyPtr, ComponentInstanceProvider, ComponentInstancePtr,
};
use crate::key::TypeInfo;
use crate::lifecycle::{DisposableCast, StartableCast};

/// Base trait for components for dependency injection.
///
/// Components might depend on other components, which forms the basis for dependency injection. To
/// make the system work, your component instances must be wrapped in a [ComponentInstancePtr].
/// Please see the module-level documentation for more information.
pub trait Component: ComponentDowncast<Self> + Sized + Send + Sync {
    /// Creates an instance of this component using dependencies from given [ComponentInstanceProvider].
    fn create(
        instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<Self, ComponentInstanceProviderError>;

    /// Describes the dependencies [Component::create] requests. Used for verification and
    /// dependency graphs, never for instantiation.
    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    /// Returns the lifecycle cast if this component is [Startable](crate::lifecycle::Startable).
    fn startable() -> Option<StartableCast> {
        None
    }

    /// Returns the lifecycle cast if this component is [Disposable](crate::lifecycle::Disposable).
    fn disposable() -> Option<DisposableCast> {
        None
    }
}

/// Helper trait for traits implemented by components, thus allowing injection of components based
/// on `dyn Trait` types. The type `C` refers to a concrete component type. Typically automatically
/// derived when using the `#[component_alias]` attribute.
pub trait ComponentDowncast<C: Component>: Injectable {
    fn downcast(
        source: ComponentInstanceAnyPtr,
    ) -> Result<ComponentInstancePtr<Self>, ComponentInstanceAnyPtr>;
}

/// Marker trait for injectable types - components and aliases.
pub trait Injectable: 'static {}

/// How a dependency is requested.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DependencyKind {
    /// Exactly one instance is required.
    Single,
    /// At most one instance is used; missing instance is not an error.
    Optional,
    /// All instances of the type.
    Collection,
}

/// Declared dependency of a component.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dependency {
    pub requested: TypeInfo,
    pub kind: DependencyKind,
    /// Requests a component registered under this name instead of resolving by type.
    pub name: Option<String>,
    /// Name used to select between multiple candidates, usually the field name.
    pub hint: Option<String>,
}

impl Dependency {
    fn new<T: ?Sized + 'static>(kind: DependencyKind) -> Self {
        Self {
            requested: TypeInfo::of::<T>(),
            kind,
            name: None,
            hint: None,
        }
    }

    pub fn single<T: ?Sized + 'static>() -> Self {
        Self::new::<T>(DependencyKind::Single)
    }

    pub fn optional<T: ?Sized + 'static>() -> Self {
        Self::new::<T>(DependencyKind::Optional)
    }

    pub fn collection<T: ?Sized + 'static>() -> Self {
        Self::new::<T>(DependencyKind::Collection)
    }

    pub fn named<T: ?Sized + 'static, N: ToString>(name: N) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::single::<T>()
        }
    }

    /// Turns this dependency into an optional one.
    pub fn into_optional(mut self) -> Self {
        self.kind = DependencyKind::Optional;
        self
    }

    pub fn with_hint<N: ToString>(mut self, hint: N) -> Self {
        self.hint = Some(hint.to_string());
        self
    }
}
