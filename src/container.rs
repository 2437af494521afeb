//! Containers: where service slots are declared.

use std::any::TypeId;
use std::sync::Arc;

use crate::config::RegistryConfig;
use crate::error::RegistryResult;
use crate::factory::{Factory, ParameterFactory};
use crate::key::Key;
use crate::registration::{ParameterProducer, Producer};
use crate::registry::{Registry, ResetOptions};
use crate::scope::Scope;

// Identity of a slot's value type, including its error type.
fn slot_type<T: ?Sized + 'static, E: 'static>() -> TypeId {
    TypeId::of::<fn() -> Result<Arc<T>, E>>()
}

/// A namespace for declaring factories over one [`Registry`].
///
/// Containers built with [`derive`](Container::derive) share their parent's
/// registry, so overrides and cached instances are visible tree-wide.
/// [`isolated`](Container::isolated) opts out with a fresh registry.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Container, Factory, Scope};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// struct AppServices {
///     database: Factory<Database>,
///     users: Factory<UserService>,
/// }
///
/// impl AppServices {
///     fn new(container: &Container) -> Self {
///         let database = container
///             .factory(|| Database { url: "postgres://localhost".into() })
///             .with_scope(Scope::SINGLETON);
///         let db = database.clone();
///         let users = container.factory(move || UserService { db: db.call() });
///         Self { database, users }
///     }
/// }
///
/// let container = Container::new();
/// let services = AppServices::new(&container);
/// let users = services.users.call();
/// assert_eq!(users.db.url, "postgres://localhost");
/// assert!(Arc::ptr_eq(&users.db, &services.database.call()));
/// ```
#[derive(Clone, Debug)]
pub struct Container {
    registry: Registry,
}

impl Container {
    /// Creates a container over a fresh registry.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            registry: Registry::with_config(config),
        }
    }

    /// A container over the process-wide root registry.
    pub fn shared() -> Self {
        Self {
            registry: Registry::global().clone(),
        }
    }

    /// A child container sharing this container's registry.
    pub fn derive(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }

    /// A container with its own registry and this container's configuration.
    pub fn isolated(&self) -> Self {
        Self::with_config(self.registry.config().clone())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn default_scope(&self) -> Scope {
        self.registry.config().default_scope.scope()
    }

    fn declare<T, E>(&self, name: Option<&'static str>) -> RegistryResult<(Key, &'static str)>
    where
        T: ?Sized + 'static,
        E: 'static,
    {
        let type_name = std::any::type_name::<T>();
        let key = self.registry.declare(name, slot_type::<T, E>(), type_name)?;
        Ok((key, name.unwrap_or(type_name)))
    }

    fn build<T, E>(&self, name: Option<&'static str>, producer: Producer<T, E>) -> RegistryResult<Factory<T, E>>
    where
        T: ?Sized + Send + Sync + 'static,
        E: 'static,
    {
        let (key, name) = self.declare::<T, E>(name)?;
        Ok(Factory::new(
            self.registry.clone(),
            key,
            name,
            producer,
            self.default_scope(),
        ))
    }

    // Anonymous slots cannot collide.
    fn build_fresh<T, E>(&self, producer: Producer<T, E>) -> Factory<T, E>
    where
        T: ?Sized + Send + Sync + 'static,
        E: 'static,
    {
        match self.build(None, producer) {
            Ok(factory) => factory,
            Err(err) => unreachable!("anonymous slot declaration failed: {}", err),
        }
    }

    // ===== Declarations =====

    /// Declares a slot whose producer returns a plain value.
    pub fn factory<T, F>(&self, producer: F) -> Factory<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let producer: Producer<T> = Arc::new(move || Ok(Arc::new(producer())));
        self.build_fresh(producer)
    }

    /// Declares a slot whose producer returns an `Arc`, typically of a trait
    /// object.
    pub fn trait_factory<T, F>(&self, producer: F) -> Factory<T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let producer: Producer<T> = Arc::new(move || Ok(producer()));
        self.build_fresh(producer)
    }

    /// Declares a slot whose construction can fail.
    ///
    /// ```
    /// use ferrous_factory::{Container, Scope};
    ///
    /// let container = Container::new();
    /// let port = container
    ///     .try_factory(|| "80".parse::<u16>())
    ///     .with_scope(Scope::CACHED);
    /// assert_eq!(*port.try_call().unwrap(), 80);
    ///
    /// port.try_register(|| "not a port".parse::<u16>().map(std::sync::Arc::new));
    /// assert!(port.try_call().is_err());
    /// ```
    pub fn try_factory<T, E, F>(&self, producer: F) -> Factory<T, E>
    where
        T: Send + Sync + 'static,
        E: 'static,
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
    {
        let producer: Producer<T, E> = Arc::new(move || producer().map(Arc::new));
        self.build_fresh(producer)
    }

    /// Declares a named slot. Every declaration with the same name yields
    /// the same key, so overrides and caches follow the name.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already declared with a different value type.
    pub fn named_factory<T, F>(&self, name: &'static str, producer: F) -> Factory<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        match self.try_named_factory(name, producer) {
            Ok(factory) => factory,
            Err(err) => panic!("{}", err),
        }
    }

    /// Like [`named_factory`](Container::named_factory), reporting a key
    /// collision as an error.
    pub fn try_named_factory<T, F>(&self, name: &'static str, producer: F) -> RegistryResult<Factory<T>>
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let producer: Producer<T> = Arc::new(move || Ok(Arc::new(producer())));
        self.build(Some(name), producer)
    }

    /// Named counterpart of [`trait_factory`](Container::trait_factory).
    ///
    /// # Panics
    ///
    /// Panics if `name` is already declared with a different value type.
    pub fn named_trait_factory<T, F>(&self, name: &'static str, producer: F) -> Factory<T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let producer: Producer<T> = Arc::new(move || Ok(producer()));
        match self.build(Some(name), producer) {
            Ok(factory) => factory,
            Err(err) => panic!("{}", err),
        }
    }

    /// Declares a slot whose producer takes one argument.
    pub fn parameter_factory<P, T, F>(&self, producer: F) -> ParameterFactory<P, T>
    where
        P: 'static,
        T: Send + Sync + 'static,
        F: Fn(P) -> T + Send + Sync + 'static,
    {
        let producer: ParameterProducer<P, T> =
            Arc::new(move |param| Ok(Arc::new(producer(param))));
        let type_name = std::any::type_name::<T>();
        let key = self
            .registry
            .declare(None, TypeId::of::<ParameterProducer<P, T>>(), type_name);
        match key {
            Ok(key) => ParameterFactory::new(self.registry.clone(), key, type_name, producer),
            Err(err) => unreachable!("anonymous slot declaration failed: {}", err),
        }
    }

    // ===== Registry shortcuts =====

    /// Drops every instance cached by `scope` in this container's registry.
    pub fn reset_scope(&self, scope: &Scope) {
        self.registry.reset_scope(scope);
    }

    pub fn reset(&self, options: ResetOptions) {
        self.registry.reset(options);
    }

    pub fn push(&self) {
        self.registry.push();
    }

    /// # Panics
    ///
    /// Panics when there is no matching [`push`](Container::push).
    pub fn pop(&self) {
        self.registry.pop();
    }

    pub fn try_pop(&self) -> RegistryResult<()> {
        self.registry.try_pop()
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}
