//! # apx CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use apx_cli::hostname::{run_hostname, HostnameArgs};
use apx_cli::lookup::{run_lookup, LookupArgs};
use apx_cli::send::{run_send, SendArgs};
use apx_cli::sign::{run_sign, SignArgs};

/// Access point transport CLI.
///
/// Derives SML hostnames, queries SMP metadata, signs documents as S/MIME
/// and sends them to a receiving access point over AS2.
#[derive(Parser, Debug)]
#[command(name = "apx", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
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
    /// Print the SML hostname of a participant's SMP.
    Hostname(HostnameArgs),

    /// Fetch and print SMP service metadata.
    Lookup(LookupArgs),

    /// Sign a document into an S/MIME envelope.
    Sign(SignArgs),

    /// Resolve, sign and deliver a document over AS2.
    Send(SendArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "apx CLI starting");

    let result = match &cli.command {
        Commands::Hostname(args) => run_hostname(args),
        Commands::Lookup(args) => run_lookup(args),
        Commands::Sign(args) => run_sign(args),
        Commands::Send(args) => run_send(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
