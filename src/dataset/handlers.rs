//! Dataset handlers and their registry.
//!
//! A handler does one of four jobs, and the [`Handler`] enum says which:
//!
//! - **Encoding**: in-memory frame -> intermediate value (e.g. a `RecordBatch`).
//! - **Persistence**: value -> stored data at a URI.
//! - **Retrieval**: stored data at a URI -> value.
//! - **Decoding**: intermediate value -> in-memory frame.
//!
//! Handlers are registered on a [`HandlerRegistryBuilder`]. Calling
//! [`build`](HandlerRegistryBuilder::build) freezes them into a
//! [`HandlerRegistry`] that can be queried but no longer changed.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::DatasetFormat;
use crate::engine::{AnyValue, TypeKey};
use crate::error::MarshalError;

pub(crate) type RetrieveFn = Arc<dyn Fn(&str) -> Result<AnyValue, MarshalError> + Send + Sync>;
pub(crate) type PersistFn = Arc<dyn Fn(&dyn Any, &str) -> Result<(), MarshalError> + Send + Sync>;
pub(crate) type EncodeFn = Arc<dyn Fn(&dyn Any) -> Result<AnyValue, MarshalError> + Send + Sync>;
pub(crate) type DecodeFn = Arc<dyn Fn(AnyValue) -> Result<AnyValue, MarshalError> + Send + Sync>;

/// One end of a handler: a storage format or an in-memory type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerKey {
    Format(DatasetFormat),
    Type(TypeKey),
}

impl HandlerKey {
    /// Key for the in-memory type `T`.
    pub fn of<T: Any>() -> Self {
        HandlerKey::Type(TypeKey::of::<T>())
    }
}

impl From<DatasetFormat> for HandlerKey {
    fn from(format: DatasetFormat) -> Self {
        HandlerKey::Format(format)
    }
}

impl From<TypeKey> for HandlerKey {
    fn from(key: TypeKey) -> Self {
        HandlerKey::Type(key)
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKey::Format(format) => write!(f, "{format}"),
            HandlerKey::Type(key) => write!(f, "{key}"),
        }
    }
}

/// The job a handler does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Retrieval,
    Persistence,
    Encoding,
    Decoding,
}

/// A single-purpose dataset handler.
#[derive(Clone)]
pub enum Handler {
    Retrieval(RetrieveFn),
    Persistence(PersistFn),
    Encoding(EncodeFn),
    Decoding(DecodeFn),
}

impl Handler {
    /// Reads the data at a URI into a `T`.
    pub fn retrieval<T, F>(retrieve: F) -> Self
    where
        T: Any + Send,
        F: Fn(&str) -> Result<T, MarshalError> + Send + Sync + 'static,
    {
        Handler::Retrieval(Arc::new(move |uri: &str| -> Result<AnyValue, MarshalError> {
            Ok(Box::new(retrieve(uri)?) as AnyValue)
        }))
    }

    /// Stores a `T` at a URI.
    pub fn persistence<T, F>(persist: F) -> Self
    where
        T: Any,
        F: Fn(&T, &str) -> Result<(), MarshalError> + Send + Sync + 'static,
    {
        Handler::Persistence(Arc::new(move |value: &dyn Any, uri: &str| {
            persist(expect_ref::<T>(value)?, uri)
        }))
    }

    /// Turns an `S` into an intermediate `I`.
    pub fn encoding<S, I, F>(encode: F) -> Self
    where
        S: Any,
        I: Any + Send,
        F: Fn(&S) -> Result<I, MarshalError> + Send + Sync + 'static,
    {
        Handler::Encoding(Arc::new(move |value: &dyn Any| -> Result<AnyValue, MarshalError> {
            Ok(Box::new(encode(expect_ref::<S>(value)?)?) as AnyValue)
        }))
    }

    /// Turns an intermediate `I` into a `T`.
    pub fn decoding<I, T, F>(decode: F) -> Self
    where
        I: Any,
        T: Any + Send,
        F: Fn(I) -> Result<T, MarshalError> + Send + Sync + 'static,
    {
        Handler::Decoding(Arc::new(move |value: AnyValue| -> Result<AnyValue, MarshalError> {
            let input = value.downcast::<I>().map_err(|_| {
                MarshalError::type_mismatch(TypeKey::of::<I>().short_name(), "another type")
            })?;
            Ok(Box::new(decode(*input)?) as AnyValue)
        }))
    }

    pub fn kind(&self) -> HandlerKind {
        match self {
            Handler::Retrieval(_) => HandlerKind::Retrieval,
            Handler::Persistence(_) => HandlerKind::Persistence,
            Handler::Encoding(_) => HandlerKind::Encoding,
            Handler::Decoding(_) => HandlerKind::Decoding,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{:?}", self.kind())
    }
}

fn expect_ref<T: Any>(value: &dyn Any) -> Result<&T, MarshalError> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| MarshalError::type_mismatch(TypeKey::of::<T>().short_name(), "another type"))
}

type Pair = (HandlerKey, HandlerKey);

/// Collects handlers before dispatch starts.
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    retrieval: HashMap<Pair, RetrieveFn>,
    persistence: HashMap<Pair, PersistFn>,
    encoding: HashMap<Pair, EncodeFn>,
    decoding: HashMap<Pair, DecodeFn>,
    registered: Vec<HandlerKey>,
}

impl HandlerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `(from, to)`, replacing any handler of the
    /// same kind already registered for that pair.
    ///
    /// Both keys become types the dataset transformer claims.
    pub fn register(
        &mut self,
        from: impl Into<HandlerKey>,
        to: impl Into<HandlerKey>,
        handler: Handler,
    ) -> &mut Self {
        let pair = (from.into(), to.into());
        self.remember(pair.0);
        self.remember(pair.1);
        tracing::debug!(from = %pair.0, to = %pair.1, kind = ?handler.kind(), "registered dataset handler");

        match handler {
            Handler::Retrieval(f) => {
                self.retrieval.insert(pair, f);
            }
            Handler::Persistence(f) => {
                self.persistence.insert(pair, f);
            }
            Handler::Encoding(f) => {
                self.encoding.insert(pair, f);
            }
            Handler::Decoding(f) => {
                self.decoding.insert(pair, f);
            }
        }
        self
    }

    fn remember(&mut self, key: HandlerKey) {
        if !self.registered.contains(&key) {
            self.registered.push(key);
        }
    }

    /// Freezes the registry.
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            retrieval: self.retrieval,
            persistence: self.persistence,
            encoding: self.encoding,
            decoding: self.decoding,
            registered: self.registered,
        }
    }
}

/// Read-only handler lookup.
#[derive(Default)]
pub struct HandlerRegistry {
    retrieval: HashMap<Pair, RetrieveFn>,
    persistence: HashMap<Pair, PersistFn>,
    encoding: HashMap<Pair, EncodeFn>,
    decoding: HashMap<Pair, DecodeFn>,
    registered: Vec<HandlerKey>,
}

impl HandlerRegistry {
    pub(crate) fn retrieval(&self, from: &HandlerKey, to: &HandlerKey) -> Option<&RetrieveFn> {
        self.retrieval.get(&(*from, *to))
    }

    pub(crate) fn persistence(&self, from: &HandlerKey, to: &HandlerKey) -> Option<&PersistFn> {
        self.persistence.get(&(*from, *to))
    }

    pub(crate) fn encoding(&self, from: &HandlerKey, to: &HandlerKey) -> Option<&EncodeFn> {
        self.encoding.get(&(*from, *to))
    }

    pub(crate) fn decoding(&self, from: &HandlerKey, to: &HandlerKey) -> Option<&DecodeFn> {
        self.decoding.get(&(*from, *to))
    }

    /// Whether a handler of `kind` exists for `(from, to)`.
    pub fn contains(&self, kind: HandlerKind, from: &HandlerKey, to: &HandlerKey) -> bool {
        match kind {
            HandlerKind::Retrieval => self.retrieval(from, to).is_some(),
            HandlerKind::Persistence => self.persistence(from, to).is_some(),
            HandlerKind::Encoding => self.encoding(from, to).is_some(),
            HandlerKind::Decoding => self.decoding(from, to).is_some(),
        }
    }

    /// Every key seen during registration, in first-seen order.
    pub fn registered_keys(&self) -> &[HandlerKey] {
        &self.registered
    }

    pub fn is_registered(&self, key: &HandlerKey) -> bool {
        self.registered.contains(key)
    }

    /// The registered type key whose runtime type is `value`'s.
    pub fn type_key_of(&self, value: &dyn Any) -> Option<TypeKey> {
        self.registered.iter().find_map(|key| match key {
            HandlerKey::Type(type_key) if type_key.matches(value) => Some(*type_key),
            _ => None,
        })
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("retrieval", &self.retrieval.len())
            .field("persistence", &self.persistence.len())
            .field("encoding", &self.encoding.len())
            .field("decoding", &self.decoding.len())
            .field("registered", &self.registered)
            .finish()
    }
}
