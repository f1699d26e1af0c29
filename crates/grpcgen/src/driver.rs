//! The discover → plan → build → invoke pipeline.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{CommandBuilder, Invocation, PROTOC_MODULE};
use crate::config::ResolvedConfig;
use crate::env::EnvPaths;
use crate::error::Result;
use crate::invoker::{InvocationResult, Launcher, ProcessInvoker};
use crate::planner;
use crate::resolver;

/// Runs the generator for one project.
///
/// Relative paths in the configuration are taken from the project root, which
/// is also the generator's working directory.
#[derive(Debug, Clone)]
pub struct Driver {
    project_root: PathBuf,
    launcher: Option<Launcher>,
    well_known_includes: Option<PathBuf>,
}

impl Driver {
    /// Creates a driver for the project at `project_root`.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            launcher: None,
            well_known_includes: None,
        }
    }

    /// Uses `launcher` instead of the environment's Python interpreter.
    #[must_use]
    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Uses `path` instead of the protos bundled with `grpcio-tools`.
    #[must_use]
    pub fn with_well_known_includes(mut self, path: impl Into<PathBuf>) -> Self {
        self.well_known_includes = Some(path.into());
        self
    }

    /// Builds the generator command without running anything but discovery.
    ///
    /// # Errors
    ///
    /// Returns a discovery error if the search root is missing.
    pub fn plan(&self, config: &ResolvedConfig, env: &EnvPaths) -> Result<Invocation> {
        let root = resolver::resolve(Path::new(&config.proto_path), &self.project_root)?;
        let sources = resolver::discover(&root, &env.root)?;

        let well_known = self
            .well_known_includes
            .clone()
            .unwrap_or_else(|| env.well_known_protos());

        let builder = config.venv_proto_paths.iter().fold(
            CommandBuilder::new(PROTOC_MODULE, well_known)
                .proto_path(root)
                .outputs(config.outputs.clone()),
            |builder, extra| builder.extra_include(env.site_packages.join(extra)),
        );

        Ok(builder.plugin_overrides_for(env).sources(sources).build())
    }

    /// Discovers sources, creates output directories and runs the generator
    /// once.
    ///
    /// A non-zero exit is returned as an [`InvocationResult`], not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery or directory creation fails, or if the
    /// generator cannot be started. Nothing is executed after the first error.
    pub fn run_once(&self, config: &ResolvedConfig, env: &EnvPaths) -> Result<InvocationResult> {
        let invocation = self.plan(config, env)?;
        planner::ensure(&config.outputs, &self.project_root)?;

        let launcher = self
            .launcher
            .clone()
            .unwrap_or_else(|| Launcher::python_for(env));
        let result = ProcessInvoker::new(launcher, &self.project_root)
            .invoke(&invocation, &env.bin_dir)?;

        if result.success() {
            info!(
                python_out = config.outputs.python_out(),
                grpc_python_out = config.outputs.grpc_python_out(),
                "Successfully generated python and gRPC files"
            );
        }

        Ok(result)
    }
}
