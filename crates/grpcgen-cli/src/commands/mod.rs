//! CLI commands and argument parsing.

pub mod hook;
pub mod protoc;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use grpcgen::planner::absolutize;
use grpcgen::{Driver, EnvPaths, GrpcPlugin, HostApp, Launcher};

use crate::project::PyProject;

/// grpcgen - Python protobuf/gRPC bindings for your project
#[derive(Parser)]
#[command(name = "grpcgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate bindings now
    Protoc(protoc::ProtocArgs),

    /// Run a lifecycle hook
    Hook(hook::HookArgs),

    /// Print version information
    Version,
}

/// Options shared by every command.
#[derive(Args)]
pub struct GlobalArgs {
    /// Project directory containing pyproject.toml
    #[arg(long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Virtual environment of the project [default: <project>/.venv]
    #[arg(long, global = true, env = "VIRTUAL_ENV")]
    pub env: Option<PathBuf>,

    /// Library install directory of the environment
    #[arg(long, global = true)]
    pub site_packages: Option<PathBuf>,

    /// Directory of the well-known protos bundled with the generator
    #[arg(long, global = true)]
    pub well_known_includes: Option<PathBuf>,

    /// Run this protoc executable instead of `python -m grpc_tools.protoc`.
    /// A bare name is looked up on `PATH`.
    #[arg(long, global = true)]
    pub protoc: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Loads the project, activates the plugin on a fresh host and returns it
    /// with the project's environment.
    pub fn host(&self) -> Result<(HostApp, EnvPaths)> {
        let root = self
            .project
            .canonicalize()
            .with_context(|| format!("Project directory not found: {}", self.project.display()))?;
        let project = PyProject::load(&root)?;
        debug!(name = project.name(), root = %root.display(), "Loaded project");

        let cwd = env::current_dir().context("Failed to read the working directory")?;

        let mut env = EnvPaths::new(self.env.clone().unwrap_or_else(|| root.join(".venv")));
        if let Some(site_packages) = &self.site_packages {
            env = env.with_site_packages(absolutize(site_packages, &cwd));
        }

        let mut driver = Driver::new(&root);
        if let Some(path) = &self.well_known_includes {
            driver = driver.with_well_known_includes(absolutize(path, &cwd));
        }
        if let Some(program) = &self.protoc {
            driver = driver.with_launcher(Launcher::executable(program_path(program, &cwd)));
        }

        let plugin = Arc::new(GrpcPlugin::new(Arc::new(project), driver));
        let mut host = HostApp::new();
        plugin.activate(&mut host);

        Ok((host, env))
    }
}

/// Anchors a relative executable path at `cwd`. Bare names are left for the
/// `PATH` lookup.
fn program_path(program: &Path, cwd: &Path) -> PathBuf {
    if program.components().count() > 1 {
        absolutize(program, cwd)
    } else {
        program.to_path_buf()
    }
}
