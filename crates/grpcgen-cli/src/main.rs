//! grpcgen CLI - Generates Python protobuf and gRPC bindings for a project.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod project;

use commands::{Cli, Commands};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.global.verbose {
        "grpcgen=debug"
    } else {
        "grpcgen=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Protoc(args) => commands::protoc::run(&cli.global, args),
        Commands::Hook(args) => commands::hook::run(&cli.global, &args),
        Commands::Version => {
            println!("grpcgen {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}
