//! Example program: a plain emitter and a native subclass driven through the
//! host's method surface.

use std::sync::Arc;

use anyhow::Result;
use nevent::{
    DISPOSE_EVENT, EVENT_EMITTER_CLASS, Host, HostError, Listener, NativeMethod, Value,
};
use parking_lot::Mutex;
use tracing::info;

/// Constructor name of the native subclass.
pub const NATIVE_CLASS: &str = "native";

const NATIVE_GREETING: &str = "Hello From Native Module!";

/// Line sink standing in for the script's console.
#[derive(Clone, Default)]
pub struct Console {
    lines: Arc<Mutex<Vec<String>>>,
    echo: bool,
}

impl Console {
    /// Console that prints every line to stdout.
    pub fn stdout() -> Self {
        Self {
            lines: Arc::default(),
            echo: true,
        }
    }

    /// Console that only records.
    #[cfg(test)]
    pub fn capture() -> Self {
        Self::default()
    }

    pub fn log(&self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{line}");
        }
        self.lines.lock().push(line);
    }

    #[cfg(test)]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

/// Export the native subclass.
///
/// Each instance subscribes its own `open` and `_dispose` listeners and gains
/// a `newMsg` method. Its greeting is held until disposal.
pub fn register_native(host: &Host) {
    host.register_constructor(NATIVE_CLASS, |host| {
        let handle = host.create_emitter();
        let emitter = host
            .lookup(handle)
            .ok_or(HostError::InvalidHandle(handle))?;

        let greeting = Arc::new(Mutex::new(Some(NATIVE_GREETING.to_string())));

        let msg = greeting.clone();
        emitter.on(
            "open",
            Listener::new(move |cx, _| {
                let current = msg.lock().clone();
                if let Some(msg) = current {
                    cx.emitter().emit("close", &[Value::from(msg)])?;
                }
                Ok(())
            }),
        );

        emitter.on(
            DISPOSE_EVENT,
            Listener::new(move |cx, _| {
                info!(this = %cx.this(), "NativeTest: Dispose()");
                greeting.lock().take();
                Ok(())
            }),
        );

        host.extend(
            handle,
            "newMsg",
            NativeMethod::new(|_, _| Ok(Value::from("Message from native"))),
        )?;
        Ok(handle)
    });
}

fn args_line(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run the example program against `host`.
pub fn run(host: &Host, console: &Console) -> Result<()> {
    let foo = host.construct(EVENT_EMITTER_CLASS)?;

    let out = console.clone();
    let on_dispose = Listener::new(move |_, _| {
        out.log("Foo() is cleaned!");
        Ok(())
    });
    host.call(foo, "on", &[Value::from(DISPOSE_EVENT), Value::from(on_dispose)])?;

    let out = console.clone();
    let on_close = Listener::new(move |cx, args| {
        out.log(format!("Close: {}", args_line(args)));
        cx.emitter().dispose();
        Ok(())
    });
    host.call(foo, "on", &[Value::from("close"), Value::from(on_close)])?;

    let out = console.clone();
    let on_open = Listener::new(move |cx, args| {
        out.log(format!("Open: {}", args_line(args)));
        cx.emitter().emit("close", args)?;
        Ok(())
    });
    host.call(foo, "addListener", &[Value::from("open"), Value::from(on_open)])?;

    let out = console.clone();
    host.extend(
        foo,
        "Hello",
        NativeMethod::new(move |_, _| {
            out.log("Hello From Function()");
            Ok(Value::Undefined)
        }),
    )?;

    let count = host.call(foo, "listenerCount", &[Value::from("open")])?;
    console.log(format!("Open Listener Count: {count}"));
    let listeners = host.call(foo, "listeners", &[Value::from("open")])?;
    console.log(format!("Listeners: {listeners}"));

    host.call(foo, "emit", &[Value::from("open"), Value::from("Hello Emitter!")])?;
    host.call(foo, "Hello", &[])?;

    let test = host.construct(NATIVE_CLASS)?;
    let out = console.clone();
    let on_native_close = Listener::new(move |cx, args| {
        out.log(format!("Message from Native: {}", args_line(args)));
        cx.emitter().dispose();
        Ok(())
    });
    host.call(test, "on", &[Value::from("close"), Value::from(on_native_close)])?;
    host.call(test, "emit", &[Value::from("open")])?;

    let msg = host.call(test, "newMsg", &[])?;
    console.log(format!("Test: {msg}"));

    host.finalize(foo);
    host.finalize(test);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nevent::HostConfig;

    fn host() -> Host {
        let host = Host::new(HostConfig::default());
        nevent::init_module(&host);
        register_native(&host);
        host
    }

    #[test]
    fn test_demo_transcript() {
        let host = host();
        let console = Console::capture();

        run(&host, &console).unwrap();

        assert_eq!(
            console.lines(),
            vec![
                "Open Listener Count: 1",
                "Listeners: [ [Function] ]",
                "Open: Hello Emitter!",
                "Close: Hello Emitter!",
                "Foo() is cleaned!",
                "Hello From Function()",
                "Message from Native: Hello From Native Module!",
                "Test: Message from native",
            ]
        );
        assert_eq!(host.object_count(), 0);
    }

    #[test]
    fn test_native_emitter_is_silent_after_dispose() {
        let host = host();
        let console = Console::capture();
        let test = host.construct(NATIVE_CLASS).unwrap();
        let out = console.clone();
        host.call(
            test,
            "on",
            &[
                Value::from("close"),
                Value::from(Listener::new(move |_, args| {
                    out.log(args_line(args));
                    Ok(())
                })),
            ],
        )
        .unwrap();

        host.call(test, "emit", &[Value::from("open")]).unwrap();
        host.call(test, "dispose", &[]).unwrap();
        host.call(test, "emit", &[Value::from("open")]).unwrap();

        assert_eq!(console.lines(), vec![NATIVE_GREETING]);
    }
}
