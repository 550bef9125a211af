use picocontainer::injection::ComponentRegistration;
use picocontainer::instance_provider::ErrorPtr;
use picocontainer::{component_alias, Component};
use picocontainer_boot::application;
use picocontainer_boot::runner::{ApplicationRunner, ApplicationRunnerPtr};

// this is an application runner, which will run after the container has started
#[derive(Component)]
struct HelloWorldRunner;

#[component_alias]
impl ApplicationRunner for HelloWorldRunner {
    fn run(&self) -> Result<(), ErrorPtr> {
        println!("Hello world!");
        Ok(())
    }
}

#[derive(Component)]
struct GoodbyeRunner;

#[component_alias]
impl ApplicationRunner for GoodbyeRunner {
    fn run(&self) -> Result<(), ErrorPtr> {
        println!("Goodbye!");
        Ok(())
    }

    // runners with higher priority run first
    fn priority(&self) -> i8 {
        -1
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // create our application with a default container
    let application = application::create_default();

    // runners are discovered by their alias
    application
        .container()
        .register(ComponentRegistration::<GoodbyeRunner>::component().alias::<ApplicationRunnerPtr>())
        .expect("error registering GoodbyeRunner")
        .register(ComponentRegistration::<HelloWorldRunner>::component().alias::<ApplicationRunnerPtr>())
        .expect("error registering HelloWorldRunner");

    // prints "Hello world!" "Goodbye!"
    application.run().expect("error running application");
}
