//! Core application functionality.

use crate::config::{BootConfig, BootConfigProvider, DefaultBootConfigProvider};
use crate::runner::ApplicationRunnerPtr;
use derive_more::Constructor;
use picocontainer::container::{Container, ContainerBuilder, DefaultContainer};
use picocontainer::error::{ComponentInstanceProviderError, ContainerError};
use picocontainer::injection::ComponentRegistration;
use picocontainer::instance_provider::ErrorPtr;
use picocontainer::key::TypeInfo;
use std::cmp::Reverse;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Error, Debug)]
pub enum ApplicationError {
    #[error("Error retrieving runners: {0}")]
    RunnerInjectionError(ComponentInstanceProviderError),
    #[error("Runner error: {0}")]
    RunnerError(ErrorPtr),
    #[error("Configuration error: {0}")]
    ConfigError(ErrorPtr),
    #[error("Container error: {0}")]
    ContainerError(#[from] ContainerError),
}

/// Main entrypoint for the application. Starts the container, runs
/// [ApplicationRunners](crate::runner::ApplicationRunner) and shuts the container down.
#[derive(Constructor)]
pub struct Application {
    container: Arc<DefaultContainer>,
}

/// Creates an application with a container caching its components.
pub fn create_default() -> Application {
    Application::new(Arc::new(
        ContainerBuilder::new()
            .with_name("application")
            .with_caching()
            .with_tracing()
            .build(),
    ))
}

impl Application {
    /// The container components should be registered in before running.
    #[inline]
    pub fn container(&self) -> &Arc<DefaultContainer> {
        &self.container
    }

    /// Runs the application: verifies and starts the container, runs all runners by descending
    /// priority and disposes the container. The container is disposed even if a runner fails.
    pub fn run(&self) -> Result<(), ApplicationError> {
        self.register_default_config_provider()?;

        let config = self.config()?;
        if config.install_tracing_logger {
            install_tracing_logger(&config.log_filter)?;
        }

        if config.verify_on_start {
            debug!("Verifying container...");
            self.container.verify()?;
        }

        info!(container = self.container.name(), "Starting application...");

        let result = self
            .container
            .start()
            .map_err(ApplicationError::from)
            .and_then(|_| self.run_runners());

        info!(container = self.container.name(), "Shutting down application...");

        let shutdown = self.container.dispose();
        if let (Err(_), Err(error)) = (&result, &shutdown) {
            warn!(%error, "Error disposing container after a failed run.");
        }

        result?;
        shutdown.map_err(ApplicationError::from)
    }

    fn run_runners(&self) -> Result<(), ApplicationError> {
        info!("Searching for application runners...");

        let mut runners = self
            .container
            .components::<ApplicationRunnerPtr>()
            .map_err(ApplicationError::RunnerInjectionError)?;

        runners.sort_by_key(|runner| Reverse(runner.priority()));

        info!(count = runners.len(), "Running application runners...");

        for runner in &runners {
            runner.run().map_err(ApplicationError::RunnerError)?;
        }

        Ok(())
    }

    fn register_default_config_provider(&self) -> Result<(), ApplicationError> {
        let registered = self
            .container
            .find_adapter_for_type(TypeInfo::of::<dyn BootConfigProvider + Send + Sync>(), None)
            .map_err(ContainerError::from)?
            .is_some();

        if !registered {
            debug!("Registering default boot config provider.");
            self.container.register(
                ComponentRegistration::<DefaultBootConfigProvider>::component()
                    .alias::<dyn BootConfigProvider + Send + Sync>(),
            )?;
        }

        Ok(())
    }

    fn config(&self) -> Result<BootConfig, ApplicationError> {
        self.container
            .component::<dyn BootConfigProvider + Send + Sync>()
            .map_err(ContainerError::from)?
            .config()
            .cloned()
            .map_err(ApplicationError::ConfigError)
    }
}

fn install_tracing_logger(log_filter: &str) -> Result<(), ApplicationError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_filter)
            .map_err(|error| ApplicationError::ConfigError(Arc::new(error) as ErrorPtr))?,
    };

    // a global subscriber might have been installed by the user already
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        debug!("Global tracing subscriber already installed.");
    }

    Ok(())
}
