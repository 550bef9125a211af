// note: this example assumes you've analyzed the previous ones

use picocontainer::adapter::chain_descriptor;
use picocontainer::characteristics::Characteristic;
use picocontainer::container::{Container, ContainerBuilder};
use picocontainer::injection::ComponentRegistration;
use picocontainer::instance_provider::{ComponentInstancePtr, ErrorPtr};
use picocontainer::key::TypeInfo;
use picocontainer::{component_alias, injectable, Component};
use std::sync::atomic::{AtomicUsize, Ordering};

static CREATED: AtomicUsize = AtomicUsize::new(0);

#[injectable]
trait Counter {
    fn created(&self) -> usize;
}

#[derive(Component)]
#[component(constructor = "CountingComponent::new")]
struct CountingComponent;

impl CountingComponent {
    fn new() -> Result<Self, ErrorPtr> {
        CREATED.fetch_add(1, Ordering::SeqCst);
        Ok(Self)
    }
}

#[component_alias]
impl Counter for CountingComponent {
    fn created(&self) -> usize {
        CREATED.load(Ordering::SeqCst)
    }
}

#[derive(Component)]
struct Client {
    counter: ComponentInstancePtr<dyn Counter + Send + Sync>,
}

fn main() {
    // behaviors decorate component adapters; without explicit configuration, caching is opt-in
    // via the Cache characteristic
    let container = ContainerBuilder::new().build();
    container
        .register(
            ComponentRegistration::<CountingComponent>::component()
                .alias::<dyn Counter + Send + Sync>()
                .with_characteristic(Characteristic::Cache),
        )
        .expect("error registering CountingComponent")
        .add_component::<Client>()
        .expect("error registering Client");

    for _ in 0..3 {
        container.component::<Client>().expect("error creating Client");
    }

    // prints "1", since the counter was cached and Client wasn't
    println!("{}", container.component::<Client>().expect("error creating Client").counter.created());

    // behaviors can be stacked; the first added is the outermost one
    let container = ContainerBuilder::new()
        .with_hidden_implementations()
        .with_caching()
        .with_locking()
        .build();
    container
        .register(ComponentRegistration::<CountingComponent>::component().alias::<dyn Counter + Send + Sync>())
        .expect("error registering CountingComponent");

    // hidden implementations are only available via their aliases
    // prints "true"
    println!("{}", container.component::<CountingComponent>().is_err());

    let adapter = container
        .find_adapter_for_type(TypeInfo::of::<dyn Counter + Send + Sync>(), None)
        .expect("error selecting adapter")
        .expect("missing adapter");

    // prints the decoration chain, e.g. "Hidden:Cached+Lifecycle:Locked:ConstructorInjector-..."
    println!("{}", chain_descriptor(adapter.as_ref()));
}
