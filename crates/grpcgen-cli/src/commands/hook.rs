//! Hook command implementation.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, ValueEnum};
use tracing::info;

use grpcgen::{EventKind, HostEvent};

use super::GlobalArgs;

/// Lifecycle events that can be fired from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HookEvent {
    /// Dependencies have just been updated
    PostUpdate,
}

impl From<HookEvent> for EventKind {
    fn from(event: HookEvent) -> Self {
        match event {
            HookEvent::PostUpdate => Self::PostUpdate,
        }
    }
}

/// Arguments for the hook command.
#[derive(Args)]
pub struct HookArgs {
    /// Event to fire
    #[arg(value_enum)]
    pub event: HookEvent,
}

/// Runs the hook command.
///
/// Succeeds without doing anything when the project does not configure the
/// plugin. A failed generation is returned as an error so the calling
/// workflow stops.
pub fn run(global: &GlobalArgs, args: &HookArgs) -> Result<ExitCode> {
    let (host, env) = global.host()?;
    let kind = EventKind::from(args.event);
    info!(event = %kind, "Firing lifecycle hook");

    host.dispatch(&HostEvent { kind, env })?;
    Ok(ExitCode::SUCCESS)
}
