// note: this example assumes you've analyzed the previous ones

use picocontainer::component::Dependency;
use picocontainer::container::ContainerBuilder;
use picocontainer::injection::ComponentRegistration;
use picocontainer::instance_provider::{
    ComponentInstancePtr, ErrorPtr, TypedComponentInstanceProvider,
};
use picocontainer::Component;
use std::sync::Arc;

#[derive(Component)]
struct Repository;

impl Repository {
    fn find(&self) -> &'static str {
        "found it"
    }
}

// a type we don't control, so it cannot derive Component
struct LegacyService {
    repository: Option<ComponentInstancePtr<Repository>>,
    label: String,
}

impl LegacyService {
    fn new(label: String) -> Self {
        Self {
            repository: None,
            label,
        }
    }

    fn set_repository(&mut self, repository: ComponentInstancePtr<Repository>) {
        self.repository = Some(repository);
    }

    fn run(&self) {
        let result = self
            .repository
            .as_ref()
            .map(|repository| repository.find())
            .unwrap_or("nothing");

        println!("{}: {}", self.label, result);
    }
}

fn main() {
    let container = ContainerBuilder::new().with_caching().build();
    container
        .add_component::<Repository>()
        .expect("error registering Repository")
        .add_config("label", "legacy".to_string())
        .expect("error registering label")
        // factories build values from other components; declared dependencies allow verification
        .register(
            ComponentRegistration::<LegacyService>::factory(|instance_provider| {
                let label = instance_provider
                    .instance_by_name_typed::<String>("label")
                    .map_err(|error| Arc::new(error) as ErrorPtr)?;
                Ok(LegacyService::new(label.to_string()))
            })
            .depends_on(Dependency::named::<String, _>("label"))
            // setters inject dependencies after construction
            .with_setter(LegacyService::set_repository),
        )
        .expect("error registering LegacyService");

    container.verify().expect("error verifying container");

    // prints "legacy: found it"
    container
        .component::<LegacyService>()
        .expect("error creating LegacyService")
        .run();
}
