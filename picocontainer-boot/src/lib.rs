//! Application bootstrapping based on [picocontainer] dependency injection.
//!
//! Traditional applications start in the `main()` function and often explicitly initialize and pass
//! around various services or other components. With a container in place, components become
//! decoupled and form a dependency graph managed by the container. This, in turn, requires an
//! entrypoint for the application which starts the container, runs the actual business logic and
//! shuts everything down afterwards. This crate provides such entrypoint in the form of
//! [Application](application::Application), which also configures supporting infrastructure, e.g.
//! logging.

pub mod application;
pub mod config;
pub mod runner;
