//! nevent - native event emitter core for embedding hosts
//!
//! An emitter is a native object bound to exactly one external [`Handle`].
//! It keeps an ordered listener list per event name, dispatches emitted
//! events synchronously, and tears itself down exactly once, announcing it
//! with the reserved [`DISPOSE_EVENT`].
//!
//! # Modules
//!
//! - `emitter` - [`EventEmitterCore`], the registry, dispatch and disposal
//! - `listener` - identity-compared callables and their execution context
//! - `host` - handle table, method surface by name, `extend`, exports
//! - `value` - values crossing the host boundary
//! - `config` - emitter and host settings
//! - `error` - listener, emit and host errors
//!
//! # Example
//!
//! ```
//! use nevent::{Host, HostConfig, Listener, Value};
//!
//! let host = Host::new(HostConfig::default());
//! nevent::init_module(&host);
//!
//! let foo = host.construct("eventEmitter").unwrap();
//! let on_open = Listener::new(|cx, args| {
//!     println!("Open: {}", args[0]);
//!     cx.emitter().emit("close", args)?;
//!     Ok(())
//! });
//! host.call(foo, "addListener", &[Value::from("open"), Value::from(on_open)]).unwrap();
//! host.call(foo, "emit", &[Value::from("open"), Value::from("Hello Emitter!")]).unwrap();
//! host.call(foo, "dispose", &[]).unwrap();
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod handle;
pub mod host;
pub mod listener;
pub mod value;

pub use config::{DEFAULT_MAX_LISTENERS, EmitterConfig, HostConfig};
pub use emitter::{DISPOSE_EVENT, EventEmitterCore, Lifecycle};
pub use error::{EmitError, EmitResult, HostError, HostResult, ListenerError};
pub use handle::Handle;
pub use host::{CallContext, EVENT_EMITTER_CLASS, Host, NativeMethod, init_module};
pub use listener::{EmitContext, Listener};
pub use value::Value;
