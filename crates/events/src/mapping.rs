//! Raw payload → typed domain event mapping.
//!
//! A [`Mapper`] knows one event type name and how to build the domain event
//! from its JSON payload. Mappers are grouped in a [`MappersChain`], chains
//! (or any other [`MappingBehavior`]) are grouped in a [`MappingPipeline`].
//! Both are evaluated in registration order and stop at the first match.
//!
//! A miss is `Ok(None)`; an `Err` means a mapper matched the type name but
//! could not build the event from the payload.

use core::fmt;
use core::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// Maps the payload of one event type into `E`.
pub trait Mapper<E>: Send + Sync {
    /// Infrastructure event type name this mapper accepts.
    fn event_type(&self) -> &str;

    fn map(&self, data: &JsonValue) -> anyhow::Result<E>;
}

/// Something that may map a payload of any event type.
pub trait MappingBehavior<E>: Send + Sync {
    fn map(&self, data: &JsonValue, event_type: &str) -> anyhow::Result<Option<E>>;
}

/// Deserializes the payload into `T`, then converts it into `E`.
///
/// The usual shape: one payload struct per domain event variant, with
/// `impl From<UserRegistered> for UserEvent`.
pub struct JsonMapper<T, E> {
    event_type: String,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, E> JsonMapper<T, E> {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            _marker: PhantomData,
        }
    }
}

impl<T, E> fmt::Debug for JsonMapper<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonMapper")
            .field("event_type", &self.event_type)
            .finish()
    }
}

impl<T, E> Mapper<E> for JsonMapper<T, E>
where
    T: DeserializeOwned + Into<E>,
{
    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn map(&self, data: &JsonValue) -> anyhow::Result<E> {
        Ok(T::deserialize(data)?.into())
    }
}

/// Closure-backed mapper, see [`mapper`].
pub struct FnMapper<F> {
    event_type: String,
    f: F,
}

impl<F> fmt::Debug for FnMapper<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMapper")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

impl<E, F> Mapper<E> for FnMapper<F>
where
    F: Fn(&JsonValue) -> anyhow::Result<E> + Send + Sync,
{
    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn map(&self, data: &JsonValue) -> anyhow::Result<E> {
        (self.f)(data)
    }
}

/// Build a mapper from a closure.
///
/// ```ignore
/// chain.add(mapper("UserLoggedIn", |data| {
///     Ok(UserEvent::LoggedIn { email: data["email"].as_str().unwrap_or_default().into() })
/// }));
/// ```
pub fn mapper<E, F>(event_type: impl Into<String>, f: F) -> FnMapper<F>
where
    F: Fn(&JsonValue) -> anyhow::Result<E> + Send + Sync,
{
    FnMapper {
        event_type: event_type.into(),
        f,
    }
}

/// Ordered mappers; the first one whose `event_type` matches builds the event.
pub struct MappersChain<E> {
    mappers: Vec<Box<dyn Mapper<E>>>,
}

impl<E> MappersChain<E> {
    pub fn new() -> Self {
        Self { mappers: Vec::new() }
    }

    pub fn add(&mut self, mapper: impl Mapper<E> + 'static) -> &mut Self {
        self.mappers.push(Box::new(mapper));
        self
    }

    pub fn with(mut self, mapper: impl Mapper<E> + 'static) -> Self {
        self.add(mapper);
        self
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }
}

impl<E> Default for MappersChain<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for MappersChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.mappers.iter().map(|m| m.event_type()))
            .finish()
    }
}

impl<E> MappingBehavior<E> for MappersChain<E> {
    fn map(&self, data: &JsonValue, event_type: &str) -> anyhow::Result<Option<E>> {
        match self.mappers.iter().find(|m| m.event_type() == event_type) {
            Some(m) => m.map(data).map(Some),
            None => Ok(None),
        }
    }
}

/// Ordered mapping behaviors; the first `Some` wins.
pub struct MappingPipeline<E> {
    behaviors: Vec<Box<dyn MappingBehavior<E>>>,
}

impl<E: 'static> MappingPipeline<E> {
    pub fn new() -> Self {
        Self { behaviors: Vec::new() }
    }

    pub fn register(&mut self, behavior: impl MappingBehavior<E> + 'static) -> &mut Self {
        self.behaviors.push(Box::new(behavior));
        self
    }

    /// Register a lone mapper (wrapped in a one-element chain).
    pub fn register_mapper(&mut self, mapper: impl Mapper<E> + 'static) -> &mut Self {
        self.register(MappersChain::new().with(mapper))
    }

    pub fn map(&self, data: &JsonValue, event_type: &str) -> anyhow::Result<Option<E>> {
        for behavior in &self.behaviors {
            if let Some(event) = behavior.map(data, event_type)? {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}

impl<E: 'static> Default for MappingPipeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for MappingPipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingPipeline")
            .field("behaviors", &self.behaviors.len())
            .finish()
    }
}
