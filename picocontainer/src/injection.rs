//! Injection strategies: how component instances get their dependencies.
//!
//! Every instance is created by an [Injector]. Components implementing
//! [Component](crate::component::Component) are built with [Component::create], which fills the
//! struct fields or calls a custom constructor, depending on how the trait was derived. Other
//! values can be built by factory closures. In both cases setters can complete the instance before
//! it is published.
//!
//! Registrations are described with [ComponentRegistration]:
//!
//! ```
//! use picocontainer::container::DefaultContainer;
//! use picocontainer::injection::ComponentRegistration;
//! use picocontainer::instance_provider::{ComponentInstancePtr, ErrorPtr, TypedComponentInstanceProvider};
//! use std::sync::Arc;
//!
//! struct Connection {
//!     url: ComponentInstancePtr<String>,
//!     retries: u8,
//! }
//!
//! let container = DefaultContainer::new();
//! container.add_named_instance("url", "localhost".to_string()).unwrap();
//! container
//!     .register(
//!         ComponentRegistration::factory(|provider| {
//!             Ok(Connection {
//!                 url: provider.instance_by_name_typed::<String>("url").map_err(|error| Arc::new(error) as ErrorPtr)?,
//!                 retries: 0,
//!             })
//!         })
//!         .with_setter_fn(|connection, _| {
//!             connection.retries = 3;
//!             Ok(())
//!         }, vec![]),
//!     )
//!     .unwrap();
//!
//! let connection = container.component::<Connection>().unwrap();
//! assert_eq!(connection.retries, 3);
//! ```

use crate::adapter::{ComponentAdapter, ComponentAdapterPtr};
use crate::characteristics::{Characteristic, Characteristics};
use crate::component::{Component, ComponentDowncast, Dependency};
use crate::definition::{cast_alias, ComponentDefinition};
use crate::error::ComponentInstanceProviderError;
use crate::instance_provider::{
    CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider, ComponentInstancePtr,
    ErrorPtr, TypedComponentInstanceProvider,
};
use crate::key::{ComponentKey, TypeInfo};
use crate::lifecycle::{
    disposable_cast, startable_cast, Disposable, DisposableCast, Startable, StartableCast,
};
use crate::monitor::MonitorHandle;
use derivative::Derivative;
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

type Constructor<T> = Arc<
    dyn Fn(&mut dyn ComponentInstanceProvider) -> Result<T, ComponentInstanceProviderError>
        + Send
        + Sync,
>;

type Setter<T> = Arc<
    dyn Fn(&mut T, &mut dyn ComponentInstanceProvider) -> Result<(), ComponentInstanceProviderError>
        + Send
        + Sync,
>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InjectorKind {
    /// Instances are created by [Component::create].
    Constructor,
    /// Instances are created by a factory closure.
    Factory,
}

/// Provider recording which dependencies have been requested, for monitoring purposes.
struct RecordingProvider<'a> {
    delegate: &'a mut dyn ComponentInstanceProvider,
    requested: Vec<String>,
}

impl<'a> RecordingProvider<'a> {
    fn new(delegate: &'a mut dyn ComponentInstanceProvider) -> Self {
        Self {
            delegate,
            requested: Vec::new(),
        }
    }
}

impl ComponentInstanceProvider for RecordingProvider<'_> {
    fn primary_instance(
        &mut self,
        requested: TypeInfo,
        name_hint: Option<&str>,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError> {
        self.requested
            .push(ComponentKey::Type(requested).to_string());
        self.delegate.primary_instance(requested, name_hint)
    }

    fn instances(
        &mut self,
        requested: TypeInfo,
    ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError> {
        self.requested
            .push(ComponentKey::Type(requested).to_string());
        self.delegate.instances(requested)
    }

    fn instance_by_name(
        &mut self,
        name: &str,
        requested: Option<TypeInfo>,
    ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError> {
        self.requested
            .push(ComponentKey::from(name).to_string());
        self.delegate.instance_by_name(name, requested)
    }
}

/// Adapter creating a new instance on every request. Usually decorated by
/// [Cached](crate::behavior::Cached) to create singletons.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Injector<T> {
    key: ComponentKey,
    definition: ComponentDefinition,
    kind: InjectorKind,
    #[derivative(Debug = "ignore")]
    constructor: Constructor<T>,
    #[derivative(Debug = "ignore")]
    setters: Vec<Setter<T>>,
    #[derivative(Debug = "ignore")]
    monitor: MonitorHandle,
}

impl<T: Send + Sync + 'static> Injector<T> {
    #[inline]
    pub fn kind(&self) -> InjectorKind {
        self.kind
    }

    fn create(
        &self,
        instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<T, ComponentInstanceProviderError> {
        let mut instance = (self.constructor)(instance_provider)?;
        for setter in &self.setters {
            setter(&mut instance, instance_provider)?;
        }

        Ok(instance)
    }
}

impl<T: Send + Sync + 'static> ComponentAdapter for Injector<T> {
    #[inline]
    fn key(&self) -> &ComponentKey {
        &self.key
    }

    #[inline]
    fn definition(&self) -> &ComponentDefinition {
        &self.definition
    }

    fn instance(
        &self,
        instance_provider: &mut dyn ComponentInstanceProvider,
    ) -> Result<ComponentInstanceAnyPtr, ComponentInstanceProviderError> {
        let monitor = self.monitor.current();
        monitor.instantiating(&self.key, &self.definition);

        let started = Instant::now();
        let mut recording_provider = RecordingProvider::new(instance_provider);

        match self.create(&mut recording_provider) {
            Ok(instance) => {
                monitor.instantiated(
                    &self.key,
                    &self.definition,
                    &recording_provider.requested,
                    started.elapsed(),
                );
                Ok(ComponentInstancePtr::new(instance) as ComponentInstanceAnyPtr)
            }
            Err(error) => {
                monitor.instantiation_failed(&self.key, &self.definition, &error);
                Err(error)
            }
        }
    }

    fn descriptor(&self) -> String {
        let kind = match self.kind {
            InjectorKind::Constructor => "ConstructorInjector",
            InjectorKind::Factory => "FactoryInjector",
        };

        if self.setters.is_empty() {
            format!("{kind}-{}", self.definition.implementation)
        } else {
            format!("{kind}+SetterInjection-{}", self.definition.implementation)
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Description of a component registration: how to construct it, under which key and types it is
/// available, and how it should be decorated.
pub struct ComponentRegistration<T> {
    key: Option<ComponentKey>,
    definition: ComponentDefinition,
    kind: InjectorKind,
    constructor: Constructor<T>,
    setters: Vec<Setter<T>>,
    characteristics: Option<Characteristics>,
}

impl<T: Component> ComponentRegistration<T> {
    /// Registration of a [Component] built with [Component::create].
    pub fn component() -> Self {
        Self {
            key: None,
            definition: ComponentDefinition::of::<T>(),
            kind: InjectorKind::Constructor,
            constructor: Arc::new(|instance_provider| T::create(instance_provider)),
            setters: Vec::new(),
            characteristics: None,
        }
    }

    /// Makes the component available as `Source`, which is usually a `dyn Trait`.
    pub fn alias<Source: ComponentDowncast<T> + ?Sized>(self) -> Self {
        self.provides(TypeInfo::of::<Source>(), cast_alias::<Source, T>)
    }
}

impl<T: Send + Sync + 'static> ComponentRegistration<T> {
    /// Registration of a value built by given factory.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&mut dyn ComponentInstanceProvider) -> Result<T, ErrorPtr> + Send + Sync + 'static,
    {
        Self {
            key: None,
            definition: ComponentDefinition::of_value::<T>(),
            kind: InjectorKind::Factory,
            constructor: Arc::new(move |instance_provider| {
                factory(instance_provider).map_err(|error| {
                    ComponentInstanceProviderError::ConstructorError {
                        component: TypeInfo::of::<T>().to_string(),
                        error,
                    }
                })
            }),
            setters: Vec::new(),
            characteristics: None,
        }
    }

    /// Sets the registration key. Defaults to the implementation type.
    pub fn key<K: Into<ComponentKey>>(mut self, key: K) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Registers under given name instead of the implementation type.
    pub fn named<N: ToString>(self, name: N) -> Self {
        self.key(ComponentKey::Name(name.to_string()))
    }

    /// Marks this component as primary among other components providing the same types.
    pub fn primary(mut self) -> Self {
        self.definition.is_primary = true;
        self
    }

    /// Sets characteristics for this registration, overriding container defaults.
    pub fn characteristics<C: Into<Characteristics>>(mut self, characteristics: C) -> Self {
        let characteristics = characteristics.into();
        self.characteristics = Some(match self.characteristics {
            Some(existing) => existing.merge(&characteristics),
            None => characteristics,
        });
        self
    }

    /// Adds a single characteristic.
    pub fn with_characteristic(self, characteristic: Characteristic) -> Self {
        self.characteristics(characteristic)
    }

    /// Makes the instances available as another type with a custom cast.
    pub fn provides(mut self, type_info: TypeInfo, cast: CastFunction) -> Self {
        self.definition.add_provided_type(type_info, cast);
        self
    }

    /// Declares a dependency, e.g. one requested by a factory.
    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.definition.dependencies.push(dependency);
        self
    }

    /// Injects a required dependency after construction.
    pub fn with_setter<D: ?Sized + 'static>(
        mut self,
        setter: fn(&mut T, ComponentInstancePtr<D>),
    ) -> Self {
        self.definition.dependencies.push(Dependency::single::<D>());
        self.setters
            .push(Arc::new(move |instance, instance_provider| {
                setter(instance, instance_provider.primary_instance_typed::<D>()?);
                Ok(())
            }));
        self
    }

    /// Injects a dependency after construction, if available.
    pub fn with_optional_setter<D: ?Sized + 'static>(
        mut self,
        setter: fn(&mut T, ComponentInstancePtr<D>),
    ) -> Self {
        self.definition.dependencies.push(Dependency::optional::<D>());
        self.setters
            .push(Arc::new(move |instance, instance_provider| {
                if let Some(dependency) = instance_provider.primary_instance_option::<D>()? {
                    setter(instance, dependency);
                }

                Ok(())
            }));
        self
    }

    /// Injects a dependency registered under given name after construction.
    pub fn with_named_setter<D: ?Sized + 'static, N: ToString>(
        mut self,
        name: N,
        setter: fn(&mut T, ComponentInstancePtr<D>),
    ) -> Self {
        let name = name.to_string();
        self.definition
            .dependencies
            .push(Dependency::named::<D, _>(&name));
        self.setters
            .push(Arc::new(move |instance, instance_provider| {
                setter(
                    instance,
                    instance_provider.instance_by_name_typed::<D>(&name)?,
                );
                Ok(())
            }));
        self
    }

    /// Runs an arbitrary setter after construction. Dependencies requested by the setter should be
    /// declared for verification.
    pub fn with_setter_fn<F>(mut self, setter: F, dependencies: Vec<Dependency>) -> Self
    where
        F: Fn(&mut T, &mut dyn ComponentInstanceProvider) -> Result<(), ComponentInstanceProviderError>
            + Send
            + Sync
            + 'static,
    {
        self.definition.dependencies.extend(dependencies);
        self.setters.push(Arc::new(setter));
        self
    }

    /// Declares that instances take part in the container lifecycle as [Startable].
    pub fn startable(mut self) -> Self
    where
        T: Startable,
    {
        self.definition.startable = Some(startable_cast::<T> as StartableCast);
        self
    }

    /// Declares that instances need to be disposed with the container.
    pub fn disposable(mut self) -> Self
    where
        T: Disposable,
    {
        self.definition.disposable = Some(disposable_cast::<T> as DisposableCast);
        self
    }

    /// Applies characteristics which explicit registration characteristics override.
    pub(crate) fn with_default_characteristics(mut self, defaults: &Characteristics) -> Self {
        self.characteristics = Some(match self.characteristics {
            Some(existing) => defaults.merge(&existing),
            None => defaults.clone(),
        });
        self
    }

    #[inline]
    pub(crate) fn component_key(&self) -> ComponentKey {
        self.key
            .clone()
            .unwrap_or(ComponentKey::Type(self.definition.implementation))
    }

    /// Creates the undecorated adapter, returning it along with registration characteristics.
    pub(crate) fn into_adapter(
        self,
        monitor: &MonitorHandle,
    ) -> (ComponentAdapterPtr, Option<Characteristics>) {
        let key = self.component_key();
        (
            Arc::new(Injector {
                key,
                definition: self.definition,
                kind: self.kind,
                constructor: self.constructor,
                setters: self.setters,
                monitor: monitor.clone(),
            }),
            self.characteristics,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::ComponentAdapter;
    use crate::component::{Component, ComponentDowncast, Dependency, Injectable};
    use crate::error::ComponentInstanceProviderError;
    use crate::injection::{ComponentRegistration, RecordingProvider};
    use crate::instance_provider::{
        CastFunction, ComponentInstanceAnyPtr, ComponentInstanceProvider, ComponentInstancePtr,
        ErrorPtr,
    };
    use crate::key::{ComponentKey, TypeInfo};
    use crate::monitor::{MockComponentMonitor, MonitorHandle};
    use std::sync::Arc;

    struct Dependency8(i8);

    struct TestComponent {
        value: i8,
    }

    impl Injectable for TestComponent {}

    impl ComponentDowncast<TestComponent> for TestComponent {
        fn downcast(
            source: ComponentInstanceAnyPtr,
        ) -> Result<ComponentInstancePtr<Self>, ComponentInstanceAnyPtr> {
            source.downcast::<Self>()
        }
    }

    impl Component for TestComponent {
        fn create(
            _instance_provider: &mut dyn ComponentInstanceProvider,
        ) -> Result<Self, ComponentInstanceProviderError> {
            Ok(Self { value: 1 })
        }
    }

    struct TestProvider;

    impl ComponentInstanceProvider for TestProvider {
        fn primary_instance(
            &mut self,
            requested: TypeInfo,
            _name_hint: Option<&str>,
        ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>
        {
            if requested == TypeInfo::of::<Dependency8>() {
                Ok((
                    ComponentInstancePtr::new(Dependency8(5)) as ComponentInstanceAnyPtr,
                    crate::definition::cast_value::<Dependency8> as CastFunction,
                ))
            } else {
                Err(ComponentInstanceProviderError::NoPrimaryInstance(
                    requested,
                ))
            }
        }

        fn instances(
            &mut self,
            _requested: TypeInfo,
        ) -> Result<Vec<(ComponentInstanceAnyPtr, CastFunction)>, ComponentInstanceProviderError>
        {
            Ok(vec![])
        }

        fn instance_by_name(
            &mut self,
            name: &str,
            _requested: Option<TypeInfo>,
        ) -> Result<(ComponentInstanceAnyPtr, CastFunction), ComponentInstanceProviderError>
        {
            Err(ComponentInstanceProviderError::NoNamedInstance(
                name.to_string(),
            ))
        }
    }

    #[test]
    fn should_run_setters_after_construction() {
        let mut monitor = MockComponentMonitor::new();
        monitor.expect_instantiating().times(1).return_const(());
        monitor
            .expect_instantiation_failed()
            .times(1)
            .return_const(());

        let (adapter, _) = ComponentRegistration::<TestComponent>::component()
            .with_setter::<i8>(|component, value| component.value = *value)
            .with_named_setter::<u8, _>("missing", |component, value| {
                component.value = *value as i8
            })
            .into_adapter(&MonitorHandle::new(Arc::new(monitor)));

        assert_eq!(adapter.definition().dependencies.len(), 2);
        assert!(adapter.instance(&mut TestProvider).is_err());
    }

    #[test]
    fn should_record_requested_dependencies() {
        let mut monitor = MockComponentMonitor::new();
        monitor.expect_instantiating().return_const(());
        monitor
            .expect_instantiated()
            .withf(|key, _, dependencies, _| {
                *key == ComponentKey::of::<TestComponent>()
                    && dependencies.len() == 1
                    && dependencies[0].ends_with("Dependency8")
            })
            .times(1)
            .return_const(());

        let (adapter, _) = ComponentRegistration::<TestComponent>::component()
            .with_setter::<Dependency8>(|component, dependency| component.value = dependency.0)
            .into_adapter(&MonitorHandle::new(Arc::new(monitor)));

        let instance = adapter
            .instance(&mut TestProvider)
            .unwrap()
            .downcast::<TestComponent>()
            .unwrap();
        assert_eq!(instance.value, 5);
        assert_eq!(
            adapter.descriptor(),
            format!(
                "ConstructorInjector+SetterInjection-{}",
                TypeInfo::of::<TestComponent>()
            )
        );
    }

    #[test]
    fn should_wrap_factory_errors() {
        let (adapter, _) = ComponentRegistration::<u8>::factory(|_| {
            Err(Arc::new(std::fmt::Error) as ErrorPtr)
        })
        .named("byte")
        .depends_on(Dependency::single::<i8>())
        .into_adapter(&MonitorHandle::default());

        assert_eq!(adapter.key(), &ComponentKey::from("byte"));
        assert!(matches!(
            adapter.instance(&mut TestProvider).unwrap_err(),
            ComponentInstanceProviderError::ConstructorError { .. }
        ));
        assert_eq!(
            adapter.descriptor(),
            "FactoryInjector-u8"
        );
    }

    #[test]
    fn should_skip_missing_optional_setter() {
        let (adapter, _) = ComponentRegistration::<TestComponent>::component()
            .with_optional_setter::<u32>(|component, value| component.value = *value as i8)
            .into_adapter(&MonitorHandle::default());

        let mut provider = TestProvider;
        let mut recording = RecordingProvider::new(&mut provider);
        let instance = adapter
            .instance(&mut recording)
            .unwrap()
            .downcast::<TestComponent>()
            .unwrap();
        assert_eq!(instance.value, 1);
        assert_eq!(recording.requested, vec!["u32".to_string()]);
    }
}
