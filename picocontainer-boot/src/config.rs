//! Boot configuration is based on injecting a [BootConfigProvider], which can later be used to
//! retrieve [BootConfig]. [Application](crate::application::Application) uses this config to
//! configure itself, but it can also be injected into any other component.
//!
//! By default, the config is created with opinionated default values, which can then be overwritten
//! by `picocontainer.json` file and environment variables prefixed with `PICOCONTAINER_`, e.g.
//! `PICOCONTAINER_LOG_FILTER=debug`. When no provider is registered in the container, the
//! application registers [DefaultBootConfigProvider].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use picocontainer::instance_provider::ErrorPtr;
use picocontainer::{component_alias, injectable, Component};
use serde::Deserialize;
use std::sync::Arc;

const CONFIG_ENV_PREFIX: &str = "PICOCONTAINER";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "picocontainer.json";

/// Default filter directives for the installed logger.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Boot configuration which can be provided by a [BootConfigProvider].
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootConfig {
    /// Should a default tracing logger be installed when running the application.
    pub install_tracing_logger: bool,
    /// Should the container be verified before it's started.
    pub verify_on_start: bool,
    /// Filter directives for the installed logger, unless overridden by `RUST_LOG`.
    pub log_filter: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            verify_on_start: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl From<OptionalBootConfig> for BootConfig {
    fn from(value: OptionalBootConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            verify_on_start: value.verify_on_start.unwrap_or(default.verify_on_start),
            log_filter: value.log_filter.unwrap_or(default.log_filter),
        }
    }
}

impl BootConfig {
    /// Reads the config from the default file and environment.
    pub fn init_from_environment() -> Result<Self, ConfigError> {
        Self::load(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX)),
        )
    }

    fn load(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .build()
            .and_then(|config| config.try_deserialize::<OptionalBootConfig>())
            .map(|config| config.into())
    }
}

/// Provider for [BootConfig]. The primary instance of the provider will be used to retrieve boot
/// configuration.
#[injectable]
pub trait BootConfigProvider {
    fn config(&self) -> Result<&BootConfig, ErrorPtr>;
}

/// Provider reading the config with [BootConfig::init_from_environment] once, on construction.
#[derive(Component)]
#[component(constructor = "DefaultBootConfigProvider::new")]
pub struct DefaultBootConfigProvider {
    // cached init result
    #[component(ignore)]
    config: Result<BootConfig, ErrorPtr>,
}

impl DefaultBootConfigProvider {
    fn new() -> Result<Self, ErrorPtr> {
        Ok(Self {
            config: BootConfig::init_from_environment().map_err(|error| Arc::new(error) as ErrorPtr),
        })
    }
}

#[component_alias]
impl BootConfigProvider for DefaultBootConfigProvider {
    fn config(&self) -> Result<&BootConfig, ErrorPtr> {
        match &self.config {
            Ok(config) => Ok(config),
            Err(error) => Err(error.clone()),
        }
    }
}

#[derive(Deserialize)]
struct OptionalBootConfig {
    install_tracing_logger: Option<bool>,
    verify_on_start: Option<bool>,
    log_filter: Option<String>,
}
