//! # linecall CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, and
//! dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use linecall_cli::call::{run_call, CallArgs};
use linecall_cli::compile::{run_compile, run_convert, CompileArgs, ConvertArgs};
use linecall_cli::routes::{run_routes, RoutesArgs};

/// Schema-driven client calls from the command line.
#[derive(Parser, Debug)]
#[command(name = "linecall", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    /// Ignored when RUST_LOG is set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a line schema and print the JSON Schema, format path and defaults.
    Compile(CompileArgs),

    /// Apply a format path expression to a JSON document.
    Convert(ConvertArgs),

    /// Register the routes of a manifest and list them.
    Routes(RoutesArgs),

    /// Execute one manifest route.
    Call(CallArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let result = match &cli.command {
        Commands::Compile(args) => run_compile(args),
        Commands::Convert(args) => run_convert(args),
        Commands::Routes(args) => run_routes(args),
        Commands::Call(args) => run_call(args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
