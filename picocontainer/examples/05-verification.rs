// note: this example assumes you've analyzed the previous ones

use picocontainer::container::ContainerBuilder;
use picocontainer::instance_provider::ComponentInstancePtr;
use picocontainer::monitor::DotDependencyGraphMonitor;
use picocontainer::Component;
use std::sync::Arc;

#[derive(Component)]
struct Missing;

#[derive(Component)]
struct NeedsMissing {
    _missing: ComponentInstancePtr<Missing>,
}

#[derive(Component)]
struct Chicken {
    _egg: ComponentInstancePtr<Egg>,
}

#[derive(Component)]
struct Egg {
    _chicken: ComponentInstancePtr<Chicken>,
}

#[derive(Component)]
struct Leaf;

#[derive(Component)]
struct Branch {
    _leaf: ComponentInstancePtr<Leaf>,
}

fn main() {
    // verification checks if all components could be created, without creating anything
    let container = ContainerBuilder::new().with_caching().build();
    container
        .add_component::<NeedsMissing>()
        .expect("error registering NeedsMissing")
        .add_component::<Chicken>()
        .expect("error registering Chicken")
        .add_component::<Egg>()
        .expect("error registering Egg");

    // prints both the missing dependency and the cycle
    if let Err(error) = container.verify() {
        println!("{error}");
    }

    // monitors observe what the container does; this one records the dependency graph
    let monitor = Arc::new(DotDependencyGraphMonitor::new());
    let container = ContainerBuilder::new()
        .with_caching()
        .with_monitor(monitor.clone())
        .build();
    container
        .add_component::<Branch>()
        .expect("error registering Branch")
        .add_component::<Leaf>()
        .expect("error registering Leaf");

    container.component::<Branch>().expect("error creating Branch");

    // prints a Graphviz graph with a single Branch -> Leaf edge
    println!("{}", monitor.dot());
}
