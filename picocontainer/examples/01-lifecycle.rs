// note: this example assumes you've analyzed the previous one

use picocontainer::container::ContainerBuilder;
use picocontainer::instance_provider::{ComponentInstancePtr, ErrorPtr};
use picocontainer::lifecycle::{Disposable, Startable};
use picocontainer::Component;

#[derive(Component)]
// startable components are started and stopped together with the container, disposable ones are
// disposed with it
#[component(startable, disposable)]
struct Connection;

impl Startable for Connection {
    fn start(&self) -> Result<(), ErrorPtr> {
        println!("Connection opened");
        Ok(())
    }

    fn stop(&self) -> Result<(), ErrorPtr> {
        println!("Connection closed");
        Ok(())
    }
}

impl Disposable for Connection {
    fn dispose(&self) -> Result<(), ErrorPtr> {
        println!("Connection released");
        Ok(())
    }
}

#[derive(Component)]
#[component(startable)]
struct Server {
    _connection: ComponentInstancePtr<Connection>,
}

impl Startable for Server {
    fn start(&self) -> Result<(), ErrorPtr> {
        println!("Server started");
        Ok(())
    }

    fn stop(&self) -> Result<(), ErrorPtr> {
        println!("Server stopped");
        Ok(())
    }
}

fn main() {
    // lifecycle only makes sense for cached instances, since the container needs to remember what
    // to stop later
    let container = ContainerBuilder::new().with_caching().build();
    container
        .add_component::<Server>()
        .expect("error registering Server")
        .add_component::<Connection>()
        .expect("error registering Connection");

    // components are started in dependency order, even though Server was registered first
    // prints "Connection opened" "Server started"
    container.start().expect("error starting container");

    // stopping happens in reverse order, followed by disposal
    // prints "Server stopped" "Connection closed" "Connection released"
    container.dispose().expect("error disposing container");
}
