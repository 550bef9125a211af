// note: this example assumes you've analyzed the previous one

use picocontainer::injection::ComponentRegistration;
use picocontainer::instance_provider::{ComponentInstancePtr, ErrorPtr};
use picocontainer::{component_alias, Component};
use picocontainer_boot::application;
use picocontainer_boot::config::{BootConfig, BootConfigProvider};
use picocontainer_boot::runner::{ApplicationRunner, ApplicationRunnerPtr};

// boot config is provided by a BootConfigProvider, which by default uses environment variables and
// a configuration file (see module documentation)
// to provide your own, register a component implementing this trait before running the
// application
#[derive(Component)]
#[component(constructor = "MyBootConfigProvider::new")]
struct MyBootConfigProvider {
    // this is the cached custom config
    #[component(ignore)]
    config: BootConfig,
}

impl MyBootConfigProvider {
    // using a custom constructor allows for caching the config for later use
    fn new() -> Result<Self, ErrorPtr> {
        // start with a default config and override what's needed
        let mut config = BootConfig::default();
        config.install_tracing_logger = false;

        Ok(Self { config })
    }
}

#[component_alias]
impl BootConfigProvider for MyBootConfigProvider {
    fn config(&self) -> Result<&BootConfig, ErrorPtr> {
        Ok(&self.config)
    }
}

// this simple component will print a part of the config to prove everything works
#[derive(Component)]
struct ConfigPrinterRunner {
    config_provider: ComponentInstancePtr<dyn BootConfigProvider + Send + Sync>,
}

#[component_alias]
impl ApplicationRunner for ConfigPrinterRunner {
    fn run(&self) -> Result<(), ErrorPtr> {
        let config = self.config_provider.config()?;
        println!("Using built-in logger: {}", config.install_tracing_logger);
        Ok(())
    }
}

fn main() {
    let application = application::create_default();
    application
        .container()
        .register(
            ComponentRegistration::<MyBootConfigProvider>::component()
                .alias::<dyn BootConfigProvider + Send + Sync>(),
        )
        .expect("error registering MyBootConfigProvider")
        .register(ComponentRegistration::<ConfigPrinterRunner>::component().alias::<ApplicationRunnerPtr>())
        .expect("error registering ConfigPrinterRunner");

    // prints "Using built-in logger: false"
    application.run().expect("error running application");
}
