// note: this example assumes you've analyzed the previous ones

use picocontainer::container::ContainerBuilder;
use picocontainer::instance_provider::ComponentInstancePtr;
use picocontainer::Component;
use std::sync::Arc;

#[derive(Component)]
struct Settings {
    #[component(name = "greeting")]
    greeting: ComponentInstancePtr<String>,
}

#[derive(Component)]
struct RequestHandler {
    // not registered in the child container, so it's resolved from the parent
    settings: ComponentInstancePtr<Settings>,
}

fn main() {
    let application = Arc::new(ContainerBuilder::new().with_name("application").with_caching().build());
    application
        .add_config("greeting", "Hello from the parent!".to_string())
        .expect("error registering greeting")
        .add_component::<Settings>()
        .expect("error registering Settings");

    // child containers see components of their parents, but not the other way around
    let request = application.make_child_container();
    request
        .add_component::<RequestHandler>()
        .expect("error registering RequestHandler");

    let handler = request
        .component::<RequestHandler>()
        .expect("error creating RequestHandler");

    // prints "Hello from the parent!"
    println!("{}", handler.settings.greeting);

    // prints "false"
    println!("{}", application.component_option::<RequestHandler>().expect("error resolving RequestHandler").is_some());

    // starting the parent starts its children as well
    application.start().expect("error starting containers");
    application.dispose().expect("error disposing containers");
}
