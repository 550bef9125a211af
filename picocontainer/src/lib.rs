//! A small, embeddable dependency injection container, which manages component instances, their
//! dependencies and lifecycle.
//!
//! Components are registered in a [DefaultContainer](container::DefaultContainer) and created
//! on demand, with their dependencies resolved from the same container or its parents. How
//! components are created and shared is decided by [behaviors](behavior) (caching, locking,
//! guarding...) chosen per container or per registration via
//! [characteristics](characteristics::Characteristic). Components implementing
//! [Startable](lifecycle::Startable) or [Disposable](lifecycle::Disposable) follow the lifecycle
//! of the container.
//!
//! The [Component](component::Component) trait is usually derived:
//!
//! ```
//! use picocontainer::container::ContainerBuilder;
//! use picocontainer::injection::ComponentRegistration;
//! use picocontainer::instance_provider::ComponentInstancePtr;
//! use picocontainer::{component_alias, injectable, Component};
//!
//! #[injectable]
//! trait Greeter {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Component)]
//! struct EnglishGreeter;
//!
//! #[component_alias]
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "Hello".to_string()
//!     }
//! }
//!
//! #[derive(Component)]
//! struct Application {
//!     greeter: ComponentInstancePtr<dyn Greeter + Send + Sync>,
//! }
//!
//! let container = ContainerBuilder::new().with_caching().build();
//! container
//!     .register(
//!         ComponentRegistration::<EnglishGreeter>::component().alias::<dyn Greeter + Send + Sync>(),
//!     )
//!     .unwrap()
//!     .add_component::<Application>()
//!     .unwrap();
//!
//! let application = container.component::<Application>().unwrap();
//! assert_eq!(application.greeter.greet(), "Hello");
//! ```
//!
//! ### Features
//!
//! * `derive` - automatically derive [Component](component::Component) and related traits
//!   (enabled by default)

pub mod adapter;
pub mod behavior;
pub mod characteristics;
pub mod component;
pub mod container;
pub mod definition;
pub mod error;
pub mod injection;
pub mod instance_provider;
pub mod key;
pub mod lifecycle;
pub mod monitor;
mod sync;
pub mod visitor;

#[cfg(feature = "derive")]
pub use picocontainer_derive::{component_alias, injectable, Component};
