//! Ordered, awaitable listener registry.

use super::event::{Event, EventKind};
use crate::error::{Error, Result};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Failure reported by a listener. Aborts the emission it belongs to.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Future returned by a listener invocation.
pub type ListenerFuture = BoxFuture<'static, std::result::Result<(), ListenerError>>;

/// Type-erased listener callback.
pub type Listener = Arc<dyn Fn(Event) -> ListenerFuture + Send + Sync>;

/// Wrap an async closure as a [`Listener`], for use with
/// [`Emitter::on_many`] and [`Emitter::once_many`].
pub fn listener<F, Fut>(f: F) -> Listener
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<(), ListenerError>> + Send + 'static,
{
    Arc::new(move |event| f(event).boxed())
}

struct Registration {
    listener: Listener,
    once: bool,
}

/// Event emitter whose `emit` resolves once every listener has resolved.
///
/// Listeners are invoked in registration order with a clone of the same
/// event. Their futures are then joined, so a slow listener does not delay
/// the start of the next one, but `emit` itself only completes once all of
/// them have. The first listener failure rejects the whole emission.
///
/// Registration uses interior mutability so that a state or session can be
/// listened on through a shared reference.
pub struct Emitter {
    owner: String,
    listeners: Mutex<HashMap<EventKind, Vec<Registration>>>,
}

impl Emitter {
    /// Create an emitter. `owner` labels the instance in `setup` and
    /// `teardown` events.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Register a listener that stays registered across emissions.
    pub fn on<F, Fut>(&self, kind: EventKind, f: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), ListenerError>> + Send + 'static,
    {
        self.register(kind, listener(f), false);
    }

    /// Register a listener that is dropped after its first invocation.
    pub fn once<F, Fut>(&self, kind: EventKind, f: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<(), ListenerError>> + Send + 'static,
    {
        self.register(kind, listener(f), true);
    }

    /// Register a synchronous listener.
    pub fn on_sync<F>(&self, kind: EventKind, f: F)
    where
        F: Fn(&Event) -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        let callback: Listener = Arc::new(move |event| futures::future::ready(f(&event)).boxed());
        self.register(kind, callback, false);
    }

    /// Register many persistent listeners at once.
    pub fn on_many<I>(&self, pairs: I)
    where
        I: IntoIterator<Item = (EventKind, Listener)>,
    {
        for (kind, callback) in pairs {
            self.register(kind, callback, false);
        }
    }

    /// Register many one-shot listeners at once.
    pub fn once_many<I>(&self, pairs: I)
    where
        I: IntoIterator<Item = (EventKind, Listener)>,
    {
        for (kind, callback) in pairs {
            self.register(kind, callback, true);
        }
    }

    /// Number of listeners currently registered for `kind`.
    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.registrations().get(kind).map_or(0, Vec::len)
    }

    /// Drop every listener except those bound to `teardown`, which are kept
    /// as one-shot listeners whether they were registered with `on` or
    /// `once`.
    pub fn remove_all_listeners(&self) {
        let mut map = self.registrations();
        let teardown = map.remove(&EventKind::Teardown).unwrap_or_default();
        map.clear();

        if !teardown.is_empty() {
            let kept = teardown
                .into_iter()
                .map(|r| Registration {
                    listener: r.listener,
                    once: true,
                })
                .collect();
            map.insert(EventKind::Teardown, kept);
        }
    }

    /// Invoke every listener for the event's kind and wait for all of them.
    pub async fn emit(&self, event: Event) -> Result<()> {
        let kind = event.kind();
        let listeners = self.take_listeners(&kind);
        if listeners.is_empty() {
            return Ok(());
        }

        let pending: Vec<ListenerFuture> = listeners
            .iter()
            .map(|callback| callback(event.clone()))
            .collect();

        try_join_all(pending)
            .await
            .map(|_| ())
            .map_err(|e| Error::Listener {
                kind: kind.to_string(),
                message: e.to_string(),
            })
    }

    /// Emit `setup` carrying this emitter's owner.
    pub async fn emit_setup(&self) -> Result<()> {
        self.emit(Event::Setup {
            owner: self.owner.clone(),
        })
        .await
    }

    /// Emit `teardown` carrying this emitter's owner.
    pub async fn emit_teardown(&self) -> Result<()> {
        self.emit(Event::Teardown {
            owner: self.owner.clone(),
        })
        .await
    }

    fn register(&self, kind: EventKind, callback: Listener, once: bool) {
        self.registrations()
            .entry(kind)
            .or_default()
            .push(Registration {
                listener: callback,
                once,
            });
    }

    // Snapshot the listeners for one emission, dropping one-shot entries.
    fn take_listeners(&self, kind: &EventKind) -> Vec<Listener> {
        let mut map = self.registrations();
        let Some(registrations) = map.get_mut(kind) else {
            return Vec::new();
        };

        let listeners = registrations
            .iter()
            .map(|r| Arc::clone(&r.listener))
            .collect();
        registrations.retain(|r| !r.once);
        listeners
    }

    fn registrations(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<Registration>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<String, usize> = self
            .registrations()
            .iter()
            .map(|(kind, regs)| (kind.to_string(), regs.len()))
            .collect();
        f.debug_struct("Emitter")
            .field("owner", &self.owner)
            .field("listeners", &counts)
            .finish()
    }
}
