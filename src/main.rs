//! depviz CLI - build and render task dependency graphs.

use std::io;
use std::process;

use clap::{CommandFactory, Parser};
use depviz::cli::{Cli, Commands, ConfigCommands};
use depviz::commands::{self, Output};
use depviz::config::{self, ConfigOverrides, OutputFormat};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter (`EnvFilter` syntax).
const LOG_ENV: &str = "DEPVIZ_LOG";

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let human = cli.human_readable || prefers_human_output();

    if let Err(e) = run_command(cli.command, human) {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Install a stderr subscriber filtered by `DEPVIZ_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_target(false);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

/// `output-format "human"` in config.kdl acts like `-H`.
///
/// Config errors are ignored here; the command itself reports them.
fn prefers_human_output() -> bool {
    config::resolve_config(&ConfigOverrides::new())
        .map(|c| c.output_format() == OutputFormat::Human)
        .unwrap_or(false)
}

fn run_command(command: Option<Commands>, human: bool) -> Result<(), depviz::Error> {
    match command {
        Some(Commands::Graph(args)) => {
            let result = commands::graph(&args)?;
            output(&result, human);
        }
        Some(Commands::Layouts) => {
            output(&commands::layouts(), human);
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => {
                let result = commands::config_show()?;
                output(&result, human);
            }
            ConfigCommands::Path => {
                output(&commands::config_path(), human);
            }
            ConfigCommands::Set { key, value } => {
                let result = commands::config_set(&key, &value)?;
                output(&result, human);
            }
        },
        None => {
            let _ = Cli::command().print_help();
            println!();
        }
    }

    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
