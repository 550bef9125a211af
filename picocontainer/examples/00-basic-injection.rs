use picocontainer::container::ContainerBuilder;
use picocontainer::injection::ComponentRegistration;
use picocontainer::instance_provider::ComponentInstancePtr;
use picocontainer::{component_alias, injectable, Component};

// this is a trait we would like to use in our component
#[injectable]
trait TestTrait {
    fn foo(&self);
}

// this is a dependency which implements the above trait and also is an injectable component
#[derive(Component)]
struct TestDependency;

// TestDependency can be cast to dyn TestTrait
#[component_alias]
impl TestTrait for TestDependency {
    fn foo(&self) {
        println!("Hello world!");
    }
}

// this is another component, but with a dependency
#[derive(Component)]
struct TestComponent {
    // the container will inject whichever component is registered as dyn TestTrait
    dependency: ComponentInstancePtr<dyn TestTrait + Send + Sync>,
    // alternatively, you can inject the concrete type
    // dependency: ComponentInstancePtr<TestDependency>,
}

impl TestComponent {
    fn call_foo(&self) {
        self.dependency.foo();
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // caching makes the container hand out the same instance on every request
    let container = ContainerBuilder::new().with_caching().build();

    // components need to be registered before they can be resolved; aliases are published
    // explicitly
    container
        .register(ComponentRegistration::<TestDependency>::component().alias::<dyn TestTrait + Send + Sync>())
        .expect("error registering TestDependency")
        .add_component::<TestComponent>()
        .expect("error registering TestComponent");

    let component = container
        .component::<TestComponent>()
        .expect("error creating TestComponent");

    // prints "Hello world!"
    component.call_foo();
}
