//! Listener callables and their execution context.

use std::fmt;
use std::sync::Arc;

use crate::emitter::EventEmitterCore;
use crate::error::ListenerError;
use crate::handle::Handle;
use crate::value::Value;

/// Signature of a listener body.
pub type ListenerFn =
    dyn Fn(&EmitContext<'_>, &[Value]) -> Result<(), ListenerError> + Send + Sync + 'static;

/// A callable registered on an emitter.
///
/// Cloning a `Listener` yields the same callable; two listeners compare equal
/// only if they are clones of one another. Wrapping the same closure twice
/// produces two distinct listeners.
#[derive(Clone)]
pub struct Listener {
    func: Arc<ListenerFn>,
}

impl Listener {
    /// Wrap a closure as a listener.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&EmitContext<'_>, &[Value]) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Invoke the listener.
    pub fn call(&self, cx: &EmitContext<'_>, args: &[Value]) -> Result<(), ListenerError> {
        (self.func)(cx, args)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.func), Arc::as_ptr(&other.func))
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.func) as *const () as usize
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:#x})", self.addr())
    }
}

/// Execution context handed to a listener.
///
/// `this` is the emitter's external handle. The emitter itself is reachable
/// too, so a listener may subscribe, unsubscribe, emit or dispose re-entrantly.
pub struct EmitContext<'a> {
    emitter: &'a EventEmitterCore,
    this: Handle,
    event: &'a str,
}

impl<'a> EmitContext<'a> {
    pub(crate) fn new(emitter: &'a EventEmitterCore, this: Handle, event: &'a str) -> Self {
        Self {
            emitter,
            this,
            event,
        }
    }

    /// The emitter's external handle.
    pub fn this(&self) -> Handle {
        self.this
    }

    /// The emitter dispatching this call.
    pub fn emitter(&self) -> &'a EventEmitterCore {
        self.emitter
    }

    /// Name of the event being dispatched.
    pub fn event(&self) -> &'a str {
        self.event
    }
}

impl fmt::Debug for EmitContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitContext")
            .field("this", &self.this)
            .field("event", &self.event)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_same_listener() {
        let a = Listener::new(|_, _| Ok(()));
        let b = a.clone();
        assert_eq!(a, b);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn test_distinct_closures_are_distinct_listeners() {
        let a = Listener::new(|_, _| Ok(()));
        let b = Listener::new(|_, _| Ok(()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_call_passes_context_and_args() {
        let emitter = EventEmitterCore::bound(Handle::from_raw(9));
        let listener = Listener::new(|cx, args| {
            assert_eq!(cx.this(), Handle::from_raw(9));
            assert_eq!(cx.event(), "ping");
            assert_eq!(args, [Value::from("pong")]);
            Err(ListenerError::new("checked"))
        });
        let cx = EmitContext::new(&emitter, Handle::from_raw(9), "ping");
        let err = listener.call(&cx, &[Value::from("pong")]).unwrap_err();
        assert_eq!(err.message(), "checked");
    }
}
