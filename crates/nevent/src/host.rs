//! Host boundary: the handle table and the method surface.
//!
//! The host owns every emitter it creates and hands out [`Handle`]s instead.
//! Calls arrive by external method name with marshalled [`Value`] arguments;
//! malformed calls are rejected here, before they reach the core, and leave
//! no trace beyond an optional log line.
//!
//! Method surface of an emitter object:
//!
//! | name | arguments | result |
//! |------|-----------|--------|
//! | `on`, `addListener` | `(name, fn)` | `undefined` |
//! | `off`, `removeListener` | `(name, fn)` | `undefined` |
//! | `emit` | `(name, ...args)` | `undefined` |
//! | `removeAllListeners` | `(name)` | `undefined` |
//! | `listeners` | `(name)` | array of functions |
//! | `listenerCount` | `(name)` | number |
//! | `dispose` | `()` | `undefined` |
//!
//! Methods installed with [`Host::extend`] shadow these by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::HostConfig;
use crate::emitter::{EventEmitterCore, Lifecycle};
use crate::error::{HostError, HostResult};
use crate::handle::{Handle, HandleAllocator};
use crate::value::Value;

/// Name under which [`init_module`] exports the plain emitter constructor.
pub const EVENT_EMITTER_CLASS: &str = "eventEmitter";

/// Signature of a native method installed on an object.
pub type NativeFn =
    dyn Fn(&CallContext<'_>, &[Value]) -> HostResult<Value> + Send + Sync + 'static;

/// Signature of an exported constructor.
pub type ConstructorFn = dyn Fn(&Host) -> HostResult<Handle> + Send + Sync + 'static;

/// A native method that can be attached to an object with [`Host::extend`].
#[derive(Clone)]
pub struct NativeMethod {
    func: Arc<NativeFn>,
}

impl NativeMethod {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&CallContext<'_>, &[Value]) -> HostResult<Value> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    pub fn call(&self, cx: &CallContext<'_>, args: &[Value]) -> HostResult<Value> {
        (self.func)(cx, args)
    }
}

impl fmt::Debug for NativeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeMethod")
    }
}

/// Receiver and host of a native method call.
pub struct CallContext<'a> {
    host: &'a Host,
    this: Handle,
}

impl<'a> CallContext<'a> {
    pub fn host(&self) -> &'a Host {
        self.host
    }

    pub fn this(&self) -> Handle {
        self.this
    }

    /// The native emitter behind `this`, if still bound.
    pub fn emitter(&self) -> Option<Arc<EventEmitterCore>> {
        self.host.lookup(self.this)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    On,
    Off,
    Emit,
    RemoveAllListeners,
    Listeners,
    ListenerCount,
    Dispose,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "on" | "addListener" => Builtin::On,
            "off" | "removeListener" => Builtin::Off,
            "emit" => Builtin::Emit,
            "removeAllListeners" => Builtin::RemoveAllListeners,
            "listeners" => Builtin::Listeners,
            "listenerCount" => Builtin::ListenerCount,
            "dispose" => Builtin::Dispose,
            _ => return None,
        })
    }

    /// Result of a call that did not reach the core.
    fn fallback(self) -> Value {
        match self {
            Builtin::ListenerCount => Value::Number(0.0),
            _ => Value::Undefined,
        }
    }
}

/// One object in the handle table.
struct HostObject {
    /// Severed (set to `None`) once the emitter is disposed.
    core: Option<Arc<EventEmitterCore>>,
    methods: HashMap<String, NativeMethod>,
}

/// The hosting side: handle table, constructor exports and call dispatch.
pub struct Host {
    config: HostConfig,
    handles: HandleAllocator,
    objects: RwLock<HashMap<Handle, HostObject>>,
    constructors: RwLock<HashMap<String, Arc<ConstructorFn>>>,
}

impl Host {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            handles: HandleAllocator::new(),
            objects: RwLock::new(HashMap::new()),
            constructors: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Create an emitter and bind it to a fresh handle.
    pub fn create_emitter(&self) -> Handle {
        let core = Arc::new(EventEmitterCore::with_config(self.config.emitter.clone()));
        let handle = self.handles.next();
        core.bind(handle);
        self.objects.write().insert(
            handle,
            HostObject {
                core: Some(core),
                methods: HashMap::new(),
            },
        );
        debug!(%handle, "emitter created");
        handle
    }

    /// The emitter bound to `handle`.
    ///
    /// `None` if the handle is unknown, finalized, or its emitter has been
    /// torn down. During the `_dispose` dispatch the binding is still intact.
    pub fn lookup(&self, handle: Handle) -> Option<Arc<EventEmitterCore>> {
        let objects = self.objects.read();
        objects
            .get(&handle)?
            .core
            .as_ref()
            .filter(|core| core.handle().is_some())
            .cloned()
    }

    /// Whether the host still holds an object for `handle`.
    pub fn contains(&self, handle: Handle) -> bool {
        self.objects.read().contains_key(&handle)
    }

    /// Number of live objects in the table.
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }

    /// Call `method` on the object behind `this`.
    pub fn call(&self, this: Handle, method: &str, args: &[Value]) -> HostResult<Value> {
        let (core, native) = {
            let objects = self.objects.read();
            let object = objects.get(&this).ok_or(HostError::InvalidHandle(this))?;
            (object.core.clone(), object.methods.get(method).cloned())
        };

        if let Some(native) = native {
            return native.call(&CallContext { host: self, this }, args);
        }

        let builtin = Builtin::from_name(method).ok_or_else(|| HostError::NotAFunction {
            name: method.to_string(),
        })?;

        match core.filter(|core| core.handle().is_some()) {
            Some(core) => self.call_builtin(this, &core, builtin, method, args),
            None => Ok(builtin.fallback()),
        }
    }

    fn call_builtin(
        &self,
        this: Handle,
        core: &EventEmitterCore,
        builtin: Builtin,
        method: &str,
        args: &[Value],
    ) -> HostResult<Value> {
        match builtin {
            Builtin::On | Builtin::Off => {
                let [name, func] = args else {
                    return Ok(self.misuse(this, builtin, method, "expected (name, listener)"));
                };
                let (Some(event), Some(listener)) = (name.as_str(), func.as_function()) else {
                    return Ok(self.misuse(this, builtin, method, "expected (string, function)"));
                };
                if builtin == Builtin::On {
                    core.on(event, listener.clone());
                } else {
                    core.off(event, listener);
                }
                Ok(Value::Undefined)
            }
            Builtin::Emit => {
                let Some((event, rest)) = args
                    .split_first()
                    .and_then(|(name, rest)| Some((name.as_str()?, rest)))
                else {
                    return Ok(self.misuse(this, builtin, method, "expected (name, ...args)"));
                };
                core.emit(event, rest)?;
                Ok(Value::Undefined)
            }
            Builtin::RemoveAllListeners | Builtin::Listeners | Builtin::ListenerCount => {
                let Some(event) = args.first().and_then(Value::as_str) else {
                    return Ok(self.misuse(this, builtin, method, "expected (name)"));
                };
                Ok(match builtin {
                    Builtin::RemoveAllListeners => {
                        core.remove_all_listeners(event);
                        Value::Undefined
                    }
                    Builtin::Listeners => Value::Array(
                        core.listeners(event)
                            .into_iter()
                            .map(Value::Function)
                            .collect(),
                    ),
                    _ => Value::from(core.listener_count(event)),
                })
            }
            Builtin::Dispose => {
                self.dispose(this)?;
                Ok(Value::Undefined)
            }
        }
    }

    fn misuse(&self, this: Handle, builtin: Builtin, method: &str, expected: &str) -> Value {
        if self.config.log_misuse {
            warn!(%this, method, expected, "ignoring malformed call");
        }
        builtin.fallback()
    }

    /// Dispose the emitter behind `handle` and sever the object from it.
    ///
    /// The object itself stays in the table until [`Host::finalize`]; its
    /// methods keep answering with `undefined`.
    pub fn dispose(&self, handle: Handle) -> HostResult<()> {
        let core = {
            let objects = self.objects.read();
            let object = objects.get(&handle).ok_or(HostError::InvalidHandle(handle))?;
            object.core.clone()
        };
        let Some(core) = core else {
            return Ok(());
        };

        core.dispose();

        // A nested call from a `_dispose` listener must leave the binding to
        // the outer teardown.
        if core.lifecycle() != Lifecycle::Disposed {
            return Ok(());
        }
        let severed = self
            .objects
            .write()
            .get_mut(&handle)
            .and_then(|object| object.core.take());
        drop(severed);
        Ok(())
    }

    /// Reclaim the object behind `handle`, as a garbage collector would once
    /// the handle is unreachable. Runs the emitter's disposal if it has not
    /// run yet. Returns `false` if there was no such object.
    ///
    /// The object stays reachable through the table while `_dispose` runs.
    pub fn finalize(&self, handle: Handle) -> bool {
        let core = {
            let objects = self.objects.read();
            let Some(object) = objects.get(&handle) else {
                return false;
            };
            object.core.clone()
        };
        debug!(%handle, "finalizing object");
        if let Some(core) = core {
            core.dispose();
        }

        let removed = self.objects.write().remove(&handle);
        drop(removed);
        true
    }

    /// Attach a named method to the object behind `handle`.
    ///
    /// Last write wins, and a method may shadow a built-in one.
    pub fn extend(&self, handle: Handle, name: &str, method: NativeMethod) -> HostResult<()> {
        let mut objects = self.objects.write();
        let object = objects
            .get_mut(&handle)
            .ok_or(HostError::InvalidHandle(handle))?;
        object.methods.insert(name.to_string(), method);
        Ok(())
    }

    /// Export a constructor under `name`. Re-registering replaces it.
    pub fn register_constructor<F>(&self, name: &str, ctor: F)
    where
        F: Fn(&Host) -> HostResult<Handle> + Send + Sync + 'static,
    {
        self.constructors
            .write()
            .insert(name.to_string(), Arc::new(ctor));
    }

    /// Run the constructor exported under `name`.
    pub fn construct(&self, name: &str) -> HostResult<Handle> {
        let ctor = self
            .constructors
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::UnknownConstructor(name.to_string()))?;
        ctor(self)
    }

    /// Names of exported constructors, sorted.
    pub fn exports(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        let mut handles: Vec<Handle> = self.objects.get_mut().keys().copied().collect();
        handles.sort();
        for handle in handles {
            self.finalize(handle);
        }
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("objects", &self.objects.read().len())
            .field("exports", &self.exports())
            .finish()
    }
}

/// Register the module's exports on `host`.
pub fn init_module(host: &Host) {
    host.register_constructor(EVENT_EMITTER_CLASS, |host| Ok(host.create_emitter()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::Listener;

    #[test]
    fn test_create_and_lookup() {
        let host = Host::default();
        let handle = host.create_emitter();
        let core = host.lookup(handle).unwrap();
        assert_eq!(core.handle(), Some(handle));
        assert!(host.lookup(Handle::from_raw(999)).is_none());
    }

    #[test]
    fn test_unknown_method() {
        let host = Host::default();
        let handle = host.create_emitter();
        let err = host.call(handle, "fly", &[]).unwrap_err();
        assert!(matches!(err, HostError::NotAFunction { name } if name == "fly"));
    }

    #[test]
    fn test_misuse_is_noop() {
        let host = Host::new(HostConfig::new().log_misuse(false));
        let handle = host.create_emitter();
        let f = Value::from(Listener::new(|_, _| Ok(())));

        // wrong arity, wrong types
        host.call(handle, "on", &[Value::from("e")]).unwrap();
        host.call(handle, "on", &[Value::from(1.0), f.clone()]).unwrap();
        host.call(handle, "on", &[Value::from("e"), Value::from("x")]).unwrap();
        host.call(handle, "on", &[Value::from("e"), f.clone(), f]).unwrap();
        host.call(handle, "emit", &[]).unwrap();

        let count = host.call(handle, "listenerCount", &[]).unwrap();
        assert_eq!(count, Value::Number(0.0));
        assert_eq!(host.lookup(handle).unwrap().listener_count("e"), 0);
    }

    #[test]
    fn test_exports() {
        let host = Host::default();
        init_module(&host);
        assert_eq!(host.exports(), vec![EVENT_EMITTER_CLASS.to_string()]);
        let handle = host.construct(EVENT_EMITTER_CLASS).unwrap();
        assert!(host.lookup(handle).is_some());
        assert!(matches!(
            host.construct("nope"),
            Err(HostError::UnknownConstructor(_))
        ));
    }

    #[test]
    fn test_drop_disposes_remaining_emitters() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let disposed = Arc::new(AtomicUsize::new(0));
        {
            let host = Host::default();
            for _ in 0..3 {
                let handle = host.create_emitter();
                let d = disposed.clone();
                host.lookup(handle).unwrap().on(
                    crate::DISPOSE_EVENT,
                    Listener::new(move |_, _| {
                        d.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                );
            }
        }
        assert_eq!(disposed.load(Ordering::SeqCst), 3);
    }
}
