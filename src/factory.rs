//! Typed factory handles: the resolution entry point.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::internal::ResolutionGuard;
use crate::key::Key;
use crate::registration::{ParameterProducer, Producer};
use crate::registry::{Registry, ResetOptions};
use crate::scope::Scope;

/// Hook run on every resolved instance.
pub type Decorator<T> = Arc<dyn Fn(&Arc<T>) + Send + Sync>;

/// A typed handle to one service slot.
///
/// A `Factory` binds a [`Key`], a default [`Producer`] and a [`Scope`], plus
/// the [`Registry`] whose overrides and caches it consults. Because a factory
/// cannot be built without a producer, resolving one can never fail for
/// lack of a registration.
///
/// Resolution looks up the override registered for the key (falling back to
/// the default producer), then lets the scope return a cached instance or
/// run the producer. The effective producer is chosen on every call and never
/// stored on the factory itself.
///
/// `E` is the producer's error type. The common infallible case resolves with
/// [`call`](Factory::call); fallible factories resolve with
/// [`try_call`](Factory::try_call), which passes producer errors through
/// unchanged.
///
/// # Examples
///
/// ```
/// use ferrous_factory::{Container, Scope};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// struct Mock;
/// impl Greeter for Mock {
///     fn greet(&self) -> String { "mocked".into() }
/// }
///
/// let container = Container::new();
/// let greeter = container
///     .trait_factory::<dyn Greeter, _>(|| Arc::new(English))
///     .with_scope(Scope::SINGLETON);
///
/// assert_eq!(greeter.call().greet(), "hello");
///
/// greeter.register_trait(|| Arc::new(Mock));
/// assert_eq!(greeter.call().greet(), "mocked");
///
/// greeter.reset();
/// assert_eq!(greeter.call().greet(), "hello");
/// ```
pub struct Factory<T: ?Sized, E = Infallible> {
    key: Key,
    name: &'static str,
    producer: Producer<T, E>,
    scope: Scope,
    decorator: Option<Decorator<T>>,
    registry: Registry,
}

impl<T, E> Factory<T, E>
where
    T: ?Sized + Send + Sync + 'static,
    E: 'static,
{
    pub(crate) fn new(
        registry: Registry,
        key: Key,
        name: &'static str,
        producer: Producer<T, E>,
        scope: Scope,
    ) -> Self {
        Self {
            key,
            name,
            producer,
            scope,
            decorator: None,
            registry,
        }
    }

    /// Returns this factory with a different scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Returns this factory with `decorator` run on every resolved instance,
    /// cached or fresh.
    ///
    /// ```
    /// use ferrous_factory::Container;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// let seen = Arc::new(AtomicUsize::new(0));
    /// let counter = seen.clone();
    ///
    /// let container = Container::new();
    /// let value = container
    ///     .factory(|| 5u8)
    ///     .decorator(move |_| { counter.fetch_add(1, Ordering::SeqCst); });
    ///
    /// value.call();
    /// assert_eq!(seen.load(Ordering::SeqCst), 1);
    /// ```
    pub fn decorator<F>(mut self, decorator: F) -> Self
    where
        F: Fn(&Arc<T>) + Send + Sync + 'static,
    {
        self.decorator = Some(Arc::new(decorator));
        self
    }

    /// The slot this factory resolves.
    pub fn key(&self) -> Key {
        self.key
    }

    /// Slot name, the value type's name for anonymous slots.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// The registry holding this slot's overrides and caches.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolves an instance.
    ///
    /// Producer errors are returned as-is and leave every cache untouched.
    ///
    /// # Panics
    ///
    /// Panics with a [`CircularDependency`](crate::CircularDependency)
    /// payload if the producer ends up resolving this same slot again.
    pub fn try_call(&self) -> Result<Arc<T>, E> {
        let _guard = ResolutionGuard::enter(self.registry.id(), self.key, self.name);

        let observers = self.registry.observers();
        let started = observers.has_observers().then(|| {
            observers.resolving(self.key, self.name);
            Instant::now()
        });

        // The producer is picked on a cache miss, after the cache generation
        // is read, so a concurrent override never leaves a stale entry behind.
        let value = self.scope.resolve(self.registry.cache(), self.key, || {
            let producer = self.registry.resolve_producer(self.key, &self.producer);
            producer()
        })?;

        if let Some(decorate) = &self.decorator {
            decorate(&value);
        }
        if let Some(started) = started {
            observers.resolved(self.key, self.name, started.elapsed());
        }
        Ok(value)
    }

    /// Installs a fallible override used by subsequent resolutions.
    ///
    /// Instances this slot already cached are evicted; instances already
    /// handed out are not affected.
    pub fn try_register<F>(&self, producer: F)
    where
        F: Fn() -> Result<Arc<T>, E> + Send + Sync + 'static,
    {
        let producer: Producer<T, E> = Arc::new(producer);
        self.registry.register(self.key, self.name, producer);
    }

    /// Removes this slot's override and its cached instances.
    pub fn reset(&self) {
        self.reset_with(ResetOptions::All);
    }

    /// Resets this slot as selected by `options`.
    pub fn reset_with(&self, options: ResetOptions) {
        self.registry.reset_key(self.key, options);
    }

    /// Whether an override is currently registered for this slot.
    pub fn is_overridden(&self) -> bool {
        self.registry.is_overridden(self.key)
    }
}

impl<T> Factory<T, Infallible>
where
    T: ?Sized + Send + Sync + 'static,
{
    /// Resolves an instance.
    ///
    /// # Panics
    ///
    /// Panics on a circular dependency, like [`try_call`](Factory::try_call).
    pub fn call(&self) -> Arc<T> {
        match self.try_call() {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Installs an override producing shared (`Arc`) instances; the form
    /// trait-object slots use.
    pub fn register_trait<F>(&self, producer: F)
    where
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.try_register(move || Ok(producer()));
    }
}

impl<T> Factory<T, Infallible>
where
    T: Send + Sync + 'static,
{
    /// Installs an override used by subsequent resolutions.
    ///
    /// ```
    /// use ferrous_factory::{Container, Scope};
    ///
    /// let container = Container::new();
    /// let port = container.factory(|| 8080u16).with_scope(Scope::CACHED);
    /// assert_eq!(*port.call(), 8080);
    ///
    /// port.register(|| 9090);
    /// assert_eq!(*port.call(), 9090);
    /// ```
    pub fn register<F>(&self, producer: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.try_register(move || Ok(Arc::new(producer())));
    }
}

impl<T: ?Sized, E> Clone for Factory<T, E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            name: self.name,
            producer: self.producer.clone(),
            scope: self.scope,
            decorator: self.decorator.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<T: ?Sized, E> fmt::Debug for Factory<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish()
    }
}

/// A factory whose producer takes one argument.
///
/// Instances depend on the argument, so parameter factories never cache:
/// every call runs the producer. Overrides, resets and snapshots work as for
/// [`Factory`].
///
/// # Examples
///
/// ```
/// use ferrous_factory::Container;
///
/// struct Account { id: u32 }
///
/// let container = Container::new();
/// let account = container.parameter_factory(|id: u32| Account { id });
/// assert_eq!(account.call(7).id, 7);
///
/// account.register(|id| Account { id: id + 100 });
/// assert_eq!(account.call(7).id, 107);
/// ```
pub struct ParameterFactory<P, T: ?Sized, E = Infallible> {
    key: Key,
    name: &'static str,
    producer: ParameterProducer<P, T, E>,
    registry: Registry,
}

impl<P, T, E> ParameterFactory<P, T, E>
where
    P: 'static,
    T: ?Sized + Send + Sync + 'static,
    E: 'static,
{
    pub(crate) fn new(
        registry: Registry,
        key: Key,
        name: &'static str,
        producer: ParameterProducer<P, T, E>,
    ) -> Self {
        Self {
            key,
            name,
            producer,
            registry,
        }
    }

    /// The slot this factory resolves.
    pub fn key(&self) -> Key {
        self.key
    }

    /// Slot name, the value type's name for anonymous slots.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolves an instance for `param`.
    pub fn try_call(&self, param: P) -> Result<Arc<T>, E> {
        let _guard = ResolutionGuard::enter(self.registry.id(), self.key, self.name);

        let observers = self.registry.observers();
        let started = observers.has_observers().then(|| {
            observers.resolving(self.key, self.name);
            Instant::now()
        });

        let producer = self.registry.resolve_producer(self.key, &self.producer);
        let value = producer(param)?;

        if let Some(started) = started {
            observers.resolved(self.key, self.name, started.elapsed());
        }
        Ok(value)
    }

    /// Installs a fallible override used by subsequent calls.
    pub fn try_register<F>(&self, producer: F)
    where
        F: Fn(P) -> Result<Arc<T>, E> + Send + Sync + 'static,
    {
        let producer: ParameterProducer<P, T, E> = Arc::new(producer);
        self.registry.register(self.key, self.name, producer);
    }

    /// Removes this slot's override.
    pub fn reset(&self) {
        self.registry.reset_key(self.key, ResetOptions::Registration);
    }

    /// Whether an override is currently registered for this slot.
    pub fn is_overridden(&self) -> bool {
        self.registry.is_overridden(self.key)
    }
}

impl<P, T> ParameterFactory<P, T, Infallible>
where
    P: 'static,
    T: Send + Sync + 'static,
{
    /// Resolves an instance for `param`.
    pub fn call(&self, param: P) -> Arc<T> {
        match self.try_call(param) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Installs an override used by subsequent calls.
    pub fn register<F>(&self, producer: F)
    where
        F: Fn(P) -> T + Send + Sync + 'static,
    {
        self.try_register(move |param| Ok(Arc::new(producer(param))));
    }
}

impl<P, T: ?Sized, E> Clone for ParameterFactory<P, T, E> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            name: self.name,
            producer: self.producer.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<P, T: ?Sized, E> fmt::Debug for ParameterFactory<P, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterFactory")
            .field("key", &self.key)
            .field("name", &self.name)
            .finish()
    }
}
