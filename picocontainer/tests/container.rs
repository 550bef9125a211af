#[cfg(feature = "derive")]
mod container_test {
    use picocontainer::characteristics::Characteristic;
    use picocontainer::container::{
        ContainerBuilder, ContainerPtr, DefaultContainer, ImmutableContainer,
    };
    use picocontainer::error::{ComponentInstanceProviderError, ContainerError};
    use picocontainer::injection::ComponentRegistration;
    use picocontainer::instance_provider::{ComponentInstancePtr, ErrorPtr};
    use picocontainer::lifecycle::{Disposable, LifecycleState, Startable};
    use picocontainer::monitor::{DotDependencyGraphMonitor, LifecycleComponentMonitor};
    use picocontainer::Component;
    use std::fmt::{Display, Formatter};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    static EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    // tests recording events cannot run concurrently
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        let guard = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        EVENTS.lock().unwrap().clear();
        guard
    }

    fn record(event: &str) {
        EVENTS.lock().unwrap().push(event.to_string());
    }

    fn take_events() -> Vec<String> {
        std::mem::take(&mut *EVENTS.lock().unwrap())
    }

    #[derive(Component)]
    #[component(startable, disposable)]
    struct Database;

    impl Startable for Database {
        fn start(&self) -> Result<(), ErrorPtr> {
            record("start database");
            Ok(())
        }

        fn stop(&self) -> Result<(), ErrorPtr> {
            record("stop database");
            Ok(())
        }
    }

    impl Disposable for Database {
        fn dispose(&self) -> Result<(), ErrorPtr> {
            record("dispose database");
            Ok(())
        }
    }

    #[derive(Component)]
    #[component(startable)]
    struct Server {
        _database: ComponentInstancePtr<Database>,
    }

    impl Startable for Server {
        fn start(&self) -> Result<(), ErrorPtr> {
            record("start server");
            Ok(())
        }

        fn stop(&self) -> Result<(), ErrorPtr> {
            record("stop server");
            Ok(())
        }
    }

    #[derive(Debug)]
    struct StartError;

    impl Display for StartError {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str("cannot start")
        }
    }

    impl std::error::Error for StartError {}

    #[derive(Component)]
    #[component(startable)]
    struct Broken;

    impl Startable for Broken {
        fn start(&self) -> Result<(), ErrorPtr> {
            Err(Arc::new(StartError) as ErrorPtr)
        }

        fn stop(&self) -> Result<(), ErrorPtr> {
            Ok(())
        }
    }

    #[derive(Component)]
    struct Greeting {
        #[component(name = "greeting.text")]
        text: ComponentInstancePtr<String>,
    }

    static AUTOMATIC_CREATED: AtomicBool = AtomicBool::new(false);

    #[derive(Component)]
    #[component(constructor = "Eager::new")]
    struct Eager;

    impl Eager {
        fn new() -> Result<Self, ErrorPtr> {
            AUTOMATIC_CREATED.store(true, Ordering::SeqCst);
            Ok(Self)
        }
    }

    #[test]
    fn should_run_lifecycle_in_dependency_order() {
        let _serial = serial();
        let container = ContainerBuilder::new().with_caching().build();
        container
            .add_component::<Server>()
            .unwrap()
            .add_component::<Database>()
            .unwrap();

        container.start().unwrap();
        container.stop().unwrap();
        container.start().unwrap();
        container.dispose().unwrap();

        assert_eq!(
            take_events(),
            vec![
                "start database",
                "start server",
                "stop server",
                "stop database",
                "start database",
                "start server",
                "stop server",
                "stop database",
                "dispose database",
            ]
        );
        assert_eq!(container.lifecycle_state(), LifecycleState::Disposed);
    }

    #[test]
    fn should_start_components_registered_while_started() {
        let _serial = serial();
        let container = ContainerBuilder::new().with_caching().build();
        container.start().unwrap();

        container.add_component::<Database>().unwrap();
        assert_eq!(take_events(), vec!["start database"]);

        container.component::<Database>().unwrap();
        container.dispose().unwrap();
        assert_eq!(take_events(), vec!["stop database", "dispose database"]);
    }

    #[test]
    fn should_reject_illegal_transitions() {
        let container = DefaultContainer::new();
        assert!(matches!(
            container.stop(),
            Err(ContainerError::IllegalLifecycleState {
                operation: "stop",
                state: LifecycleState::Constructed
            })
        ));

        container.start().unwrap();
        assert!(container.start().is_err());
        container.dispose().unwrap();
        assert!(container.start().is_err());
    }

    #[test]
    fn should_fail_start_on_component_error() {
        let container = ContainerBuilder::new().with_caching().build();
        container.add_component::<Broken>().unwrap();

        assert!(matches!(
            container.start(),
            Err(ContainerError::Lifecycle { error, .. }) if error.to_string() == "cannot start"
        ));
    }

    #[test]
    fn should_collect_lifecycle_failures() {
        let monitor = Arc::new(LifecycleComponentMonitor::default());
        let container = ContainerBuilder::new()
            .with_caching()
            .with_monitor(monitor.clone())
            .build();
        container.add_component::<Broken>().unwrap();

        container.start().unwrap();
        assert!(matches!(
            monitor.check(),
            Err(ContainerError::LifecycleFailures(failures)) if failures.len() == 1
        ));
    }

    #[test]
    fn should_start_child_containers() {
        let _serial = serial();
        let parent = Arc::new(ContainerBuilder::new().with_caching().build());
        parent.add_component::<Database>().unwrap();

        let child = parent.make_child_container();
        child.add_component::<Server>().unwrap();

        parent.start().unwrap();
        assert_eq!(child.lifecycle_state(), LifecycleState::Started);
        parent.dispose().unwrap();
        assert_eq!(child.lifecycle_state(), LifecycleState::Disposed);

        let events = take_events();
        assert_eq!(events.first().map(String::as_str), Some("start database"));
        assert!(events.contains(&"start server".to_string()));

        let stop_server = events
            .iter()
            .position(|event| event == "stop server")
            .unwrap();
        let stop_database = events
            .iter()
            .position(|event| event == "stop database")
            .unwrap();
        assert!(stop_server < stop_database);
    }

    #[test]
    fn should_inject_configuration() {
        let container = DefaultContainer::new();
        container
            .add_config("greeting.text", "hello".to_string())
            .unwrap()
            .add_component::<Greeting>()
            .unwrap();

        assert_eq!(*container.component::<Greeting>().unwrap().text, "hello");
    }

    #[test]
    fn should_instantiate_automatic_components_on_start() {
        let container = ContainerBuilder::new()
            .with_caching()
            .with_automatic()
            .build();
        container
            .with_characteristics(Characteristic::Automatic)
            .add_component::<Eager>()
            .unwrap();

        assert!(!AUTOMATIC_CREATED.load(Ordering::SeqCst));
        container.start().unwrap();
        assert!(AUTOMATIC_CREATED.load(Ordering::SeqCst));
    }

    #[test]
    fn should_guard_components() {
        let container = ContainerBuilder::new().with_guarding().build();
        container
            .register(
                ComponentRegistration::<u8>::factory(|_| Ok(1))
                    .with_characteristic(Characteristic::guard()),
            )
            .unwrap();

        assert!(matches!(
            container.component::<u8>().unwrap_err(),
            ComponentInstanceProviderError::GuardFailed { .. }
        ));
        assert!(container.verify().is_err());

        container.add_named_instance("guard", true).unwrap();
        assert_eq!(*container.component::<u8>().unwrap(), 1);
    }

    #[test]
    fn should_use_immutable_parent() {
        let parent = Arc::new(DefaultContainer::new());
        parent.add_instance(42u32).unwrap();

        let child = DefaultContainer::with_parent(
            Arc::new(ImmutableContainer::new(parent as ContainerPtr)) as ContainerPtr,
        );
        assert_eq!(*child.component::<u32>().unwrap(), 42);
    }

    #[test]
    fn should_render_dependency_graph() {
        let _serial = serial();
        let monitor = Arc::new(DotDependencyGraphMonitor::new());
        let container = ContainerBuilder::new().with_caching().build();
        container.change_monitor(monitor.clone());
        container
            .add_component::<Server>()
            .unwrap()
            .add_component::<Database>()
            .unwrap();

        container.component::<Server>().unwrap();
        let dot = monitor.dot();
        assert!(dot.starts_with("digraph \"Dependencies\" {"));
        assert!(dot.contains("Server\" -> \""));
        assert!(dot.contains("Database\";"));
    }
}
