use anyhow::Result;
use clap::{Parser, Subcommand};
use nevent::{DISPOSE_EVENT, Host, Listener, Value};
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

mod config;
mod demo;

#[derive(Parser)]
#[command(name = "nevent", version, about = "Native event emitter host")]
struct Cli {
    /// Path to nevent.toml (searched for upwards from the current directory otherwise)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bundled example program
    Demo,
    /// Emit one event to a printing listener
    Emit {
        event: String,
        /// Arguments as JSON; anything that is not valid JSON is passed as a string
        #[arg(value_name = "ARG")]
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log.level.parse()?))
        .init();

    let host = Host::new(config.host);
    nevent::init_module(&host);
    demo::register_native(&host);

    match cli.command {
        Commands::Demo => demo::run(&host, &demo::Console::stdout())?,
        Commands::Emit { event, args } => emit_once(&host, &event, &args)?,
    }

    Ok(())
}

fn parse_arg(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw))
}

fn emit_once(host: &Host, event: &str, raw_args: &[String]) -> Result<()> {
    let handle = host.construct(nevent::EVENT_EMITTER_CLASS)?;

    let printer = Listener::new(|cx, args| {
        let json: Vec<String> = args.iter().map(|a| a.to_json().to_string()).collect();
        println!("{} {}: [{}]", cx.this(), cx.event(), json.join(", "));
        Ok(())
    });
    host.call(handle, "on", &[Value::from(event), Value::from(printer.clone())])?;
    host.call(handle, "on", &[Value::from(DISPOSE_EVENT), Value::from(printer)])?;

    let mut call_args = vec![Value::from(event)];
    call_args.extend(raw_args.iter().map(|raw| parse_arg(raw)));
    host.call(handle, "emit", &call_args)?;

    host.finalize(handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arg() {
        assert_eq!(parse_arg("42"), Value::Number(42.0));
        assert_eq!(parse_arg("\"quoted\""), Value::from("quoted"));
        assert_eq!(parse_arg("bare words"), Value::from("bare words"));
        assert_eq!(
            parse_arg("[1, true]"),
            Value::Array(vec![Value::Number(1.0), Value::Bool(true)])
        );
    }

    #[test]
    fn test_cli_parses_emit() {
        let cli = Cli::try_parse_from(["nevent", "emit", "open", "\"hello\"", "2"]).unwrap();
        match cli.command {
            Commands::Emit { event, args } => {
                assert_eq!(event, "open");
                assert_eq!(args, vec!["\"hello\"", "2"]);
            }
            Commands::Demo => panic!("expected emit"),
        }
    }
}
