//! The event emitter core.
//!
//! An [`EventEmitterCore`] is bound once to an external [`Handle`], keeps an
//! ordered listener list per event name and dispatches synchronously.
//!
//! # Dispatch
//!
//! `emit` copies the listener list before calling anything and releases the
//! internal lock while listeners run. Listeners may therefore call back into
//! the same emitter: additions and removals made during a dispatch only affect
//! later emits, and every listener in the snapshot runs exactly once unless a
//! listener fails or the emitter is torn down mid-dispatch.
//!
//! # Disposal
//!
//! `dispose` marks the emitter disposed, fires [`DISPOSE_EVENT`] with no
//! arguments while the registry and handle are still intact, then clears the
//! handle and drops the registry. It runs at most once, whether called
//! explicitly, by the host's finalizer, or from `Drop`.
//!
//! # Example
//!
//! ```
//! use nevent::{EventEmitterCore, Handle, Listener, Value};
//!
//! let emitter = EventEmitterCore::bound(Handle::from_raw(1));
//! emitter.on("open", Listener::new(|_, args| {
//!     assert_eq!(args[0], Value::from("hello"));
//!     Ok(())
//! }));
//! emitter.emit("open", &[Value::from("hello")]).unwrap();
//! emitter.dispose();
//! assert_eq!(emitter.listener_count("open"), 0);
//! ```

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::config::EmitterConfig;
use crate::error::{EmitError, EmitResult};
use crate::handle::Handle;
use crate::listener::{EmitContext, Listener};
use crate::value::Value;

/// Reserved event fired once, with no arguments, right before teardown.
pub const DISPOSE_EVENT: &str = "_dispose";

/// Where an emitter is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed, no handle yet.
    Unbound,
    /// Bound and accepting operations.
    Live,
    /// `dispose` is running; only the `_dispose` dispatch proceeds.
    Disposing,
    /// Handle cleared and registry released.
    Disposed,
}

impl Lifecycle {
    /// Whether disposal has started.
    pub fn is_disposed(self) -> bool {
        matches!(self, Lifecycle::Disposing | Lifecycle::Disposed)
    }
}

type Registry = HashMap<String, Vec<Listener>>;

struct EmitterState {
    lifecycle: Lifecycle,
    handle: Option<Handle>,
    /// Exists from bind until teardown.
    listeners: Option<Registry>,
}

impl EmitterState {
    /// Registry open for edits, or `None` when unbound or disposed.
    fn registry_mut(&mut self) -> Option<&mut Registry> {
        if self.lifecycle == Lifecycle::Live {
            self.listeners.as_mut()
        } else {
            None
        }
    }
}

/// Native event emitter bound to a single external handle.
pub struct EventEmitterCore {
    state: Mutex<EmitterState>,
    config: EmitterConfig,
}

impl EventEmitterCore {
    /// Create an unbound emitter with default settings.
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    /// Create an unbound emitter.
    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            state: Mutex::new(EmitterState {
                lifecycle: Lifecycle::Unbound,
                handle: None,
                listeners: None,
            }),
            config,
        }
    }

    /// Create an emitter already bound to `handle`.
    pub fn bound(handle: Handle) -> Self {
        let emitter = Self::new();
        emitter.bind(handle);
        emitter
    }

    /// Associate the emitter with its external handle.
    ///
    /// Only the first call has an effect; the binding cannot be replaced, and
    /// a disposed emitter cannot be bound again.
    pub fn bind(&self, handle: Handle) {
        let mut state = self.state.lock();
        if state.lifecycle != Lifecycle::Unbound {
            trace!(%handle, "ignoring redundant bind");
            return;
        }
        state.lifecycle = Lifecycle::Live;
        state.handle = Some(handle);
        state.listeners = Some(Registry::new());
        trace!(%handle, "emitter bound");
    }

    /// Subscribe `listener` to `event`.
    ///
    /// A listener already subscribed to `event` is not added twice.
    pub fn on(&self, event: &str, listener: Listener) {
        let mut state = self.state.lock();
        let Some(registry) = state.registry_mut() else {
            return;
        };

        let listeners = registry.entry(event.to_string()).or_default();
        if listeners.contains(&listener) {
            return;
        }
        listeners.push(listener);
        let count = listeners.len();
        debug!(event, count, "listener added");

        let max = self.config.max_listeners;
        if max > 0 && count == max + 1 {
            warn!(
                event,
                count,
                "MaxListenersExceededWarning: possible emitter leak detected, \
                 {count} '{event}' listeners added"
            );
        }
    }

    /// Unsubscribe `listener` from `event`. Only the first identical entry is
    /// removed; the order of the others is kept.
    pub fn off(&self, event: &str, listener: &Listener) {
        let mut state = self.state.lock();
        let Some(listeners) = state.registry_mut().and_then(|r| r.get_mut(event)) else {
            return;
        };

        if let Some(pos) = listeners.iter().position(|l| l == listener) {
            listeners.remove(pos);
            debug!(event, remaining = listeners.len(), "listener removed");
        }
    }

    /// Drop the whole listener list for `event`.
    ///
    /// Returns `true` if a list existed. A later `on` starts from scratch.
    pub fn remove_all_listeners(&self, event: &str) -> bool {
        let removed = self
            .state
            .lock()
            .registry_mut()
            .and_then(|r| r.remove(event));
        let Some(removed) = removed else {
            return false;
        };
        debug!(event, count = removed.len(), "all listeners removed");
        // Dropped after the lock is released, as in `dispose`.
        drop(removed);
        true
    }

    /// Call every listener of `event` in subscription order.
    ///
    /// The first listener error stops the dispatch and is returned; listeners
    /// after it are not called.
    pub fn emit(&self, event: &str, args: &[Value]) -> EmitResult<()> {
        self.dispatch(event, args, Lifecycle::Live)
    }

    /// Tear the emitter down. Safe to call any number of times.
    pub fn dispose(&self) {
        let handle = {
            let mut state = self.state.lock();
            if state.lifecycle != Lifecycle::Live {
                return;
            }
            state.lifecycle = Lifecycle::Disposing;
            state.handle
        };
        debug!(handle = ?handle, "disposing emitter");

        if let Err(err) = self.dispatch(DISPOSE_EVENT, &[], Lifecycle::Disposing) {
            warn!(error = %err, "_dispose listener failed, continuing teardown");
        }

        let registry = {
            let mut state = self.state.lock();
            state.handle = None;
            state.lifecycle = Lifecycle::Disposed;
            state.listeners.take()
        };
        // Listener captures may run arbitrary drop code; keep it outside the lock.
        drop(registry);
        debug!(handle = ?handle, "emitter disposed");
    }

    /// Listeners of `event`, in dispatch order.
    pub fn listeners(&self, event: &str) -> Vec<Listener> {
        let state = self.state.lock();
        state
            .listeners
            .as_ref()
            .and_then(|r| r.get(event))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of listeners of `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        let state = self.state.lock();
        state
            .listeners
            .as_ref()
            .and_then(|r| r.get(event))
            .map_or(0, Vec::len)
    }

    /// Names of events that currently have listeners.
    pub fn event_names(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut names: Vec<String> = state
            .listeners
            .iter()
            .flat_map(|r| r.iter())
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, _)| k.clone())
            .collect();
        names.sort();
        names
    }

    /// The bound handle, if bound and not yet torn down.
    pub fn handle(&self) -> Option<Handle> {
        self.state.lock().handle
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lock().lifecycle
    }

    /// Whether disposal has started.
    pub fn is_disposed(&self) -> bool {
        self.lifecycle().is_disposed()
    }

    /// Snapshot the listeners of `event` if the emitter is in `phase`.
    fn snapshot(&self, event: &str, phase: Lifecycle) -> Option<(Handle, Vec<Listener>)> {
        let state = self.state.lock();
        if state.lifecycle != phase {
            return None;
        }
        let handle = state.handle?;
        let listeners = state.listeners.as_ref()?.get(event)?;
        if listeners.is_empty() {
            return None;
        }
        Some((handle, listeners.clone()))
    }

    fn dispatch(&self, event: &str, args: &[Value], phase: Lifecycle) -> EmitResult<()> {
        let Some((this, snapshot)) = self.snapshot(event, phase) else {
            return Ok(());
        };
        trace!(event, listeners = snapshot.len(), "dispatching");

        let cx = EmitContext::new(self, this, event);
        for (index, listener) in snapshot.iter().enumerate() {
            // A listener may have disposed the emitter; `this` is gone then.
            if self.lifecycle() == Lifecycle::Disposed {
                trace!(event, skipped = snapshot.len() - index, "emitter torn down mid-dispatch");
                break;
            }
            listener
                .call(&cx, args)
                .map_err(|source| EmitError::Listener {
                    event: event.to_string(),
                    index,
                    source,
                })?;
        }
        Ok(())
    }
}

impl Default for EventEmitterCore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventEmitterCore {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for EventEmitterCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("EventEmitterCore")
            .field("lifecycle", &state.lifecycle)
            .field("handle", &state.handle)
            .field("events", &state.listeners.as_ref().map_or(0, HashMap::len))
            .finish()
    }
}
