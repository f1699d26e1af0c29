//! Generator command construction.
//!
//! The argument vector is assembled in full before anything runs so it can be
//! logged and inspected. Order matters to `protoc`: the first `--proto_path`
//! wins when two include roots provide the same relative file, so the bundled
//! well-known protos always come first.
//!
//! ```text
//! grpc_tools.protoc
//!   --proto_path=<well-known includes>
//!   --proto_path=<search root>
//!   --python_out=<dir> --grpc_python_out=<dir>
//!   --mypy_out=quiet:<dir> --mypy_grpc_out=quiet:<dir>
//!   --proto_path=<extra include>...
//!   --plugin=protoc-gen-mypy=<path>...          (Windows only)
//!   <source.proto>...
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use crate::env::EnvPaths;
use crate::planner::OutputPlan;

/// Module entry point of the generator.
pub const PROTOC_MODULE: &str = "grpc_tools.protoc";

/// Generator plugins installed as separate executables.
pub const MYPY_PLUGINS: [&str; 2] = ["protoc-gen-mypy", "protoc-gen-mypy_grpc"];

/// A fully built generator command line.
///
/// The first argument is the program token; the rest are passed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
}

impl Invocation {
    /// Returns every argument, program token first.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the program token.
    #[must_use]
    pub fn program(&self) -> &str {
        self.args.first().map_or("", String::as_str)
    }

    /// Returns the arguments following the program token.
    #[must_use]
    pub fn flags(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }

    /// Returns the values of every `--proto_path` flag, in order.
    pub fn proto_paths(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .filter_map(|arg| arg.strip_prefix("--proto_path="))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

/// Builder for [`Invocation`].
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    executable: String,
    well_known_includes: PathBuf,
    proto_path: Option<PathBuf>,
    outputs: Option<OutputPlan>,
    extra_includes: Vec<PathBuf>,
    plugins: Vec<(String, PathBuf)>,
    sources: Vec<PathBuf>,
}

impl CommandBuilder {
    /// Starts a command for `executable` whose first include root is
    /// `well_known_includes`.
    #[must_use]
    pub fn new(executable: impl Into<String>, well_known_includes: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            well_known_includes: well_known_includes.into(),
            proto_path: None,
            outputs: None,
            extra_includes: Vec::new(),
            plugins: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Sets the resolved search root.
    #[must_use]
    pub fn proto_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.proto_path = Some(path.into());
        self
    }

    /// Sets the output directories.
    #[must_use]
    pub fn outputs(mut self, outputs: OutputPlan) -> Self {
        self.outputs = Some(outputs);
        self
    }

    /// Adds an include root searched after the primary ones.
    #[must_use]
    pub fn extra_include(mut self, path: impl Into<PathBuf>) -> Self {
        self.extra_includes.push(path.into());
        self
    }

    /// Adds an explicit plugin location.
    #[must_use]
    pub fn plugin(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.plugins.push((name.into(), path.into()));
        self
    }

    /// Adds explicit locations for the type-stub plugins when `env`'s platform
    /// cannot find them through the search path.
    #[must_use]
    pub fn plugin_overrides_for(mut self, env: &EnvPaths) -> Self {
        if env.platform.needs_plugin_overrides() {
            for name in MYPY_PLUGINS {
                self = self.plugin(name, env.executable(name));
            }
        }
        self
    }

    /// Sets the source files, which are emitted sorted.
    #[must_use]
    pub fn sources(mut self, sources: impl IntoIterator<Item = PathBuf>) -> Self {
        self.sources = sources.into_iter().collect();
        self
    }

    /// Assembles the argument vector.
    #[must_use]
    pub fn build(self) -> Invocation {
        let mut args = vec![
            self.executable,
            flag("proto_path", &display(&self.well_known_includes)),
        ];

        if let Some(proto_path) = &self.proto_path {
            args.push(flag("proto_path", &display(proto_path)));
        }

        if let Some(outputs) = &self.outputs {
            for (kind, dir) in outputs.iter() {
                let value = if kind.is_quiet() {
                    format!("quiet:{dir}")
                } else {
                    dir.to_string()
                };
                args.push(flag(kind.flag(), &value));
            }
        }

        args.extend(
            self.extra_includes
                .iter()
                .map(|path| flag("proto_path", &display(path))),
        );

        args.extend(
            self.plugins
                .iter()
                .map(|(name, path)| format!("--plugin={name}={}", display(path))),
        );

        let mut sources = self.sources;
        sources.sort();
        args.extend(sources.iter().map(|path| display(path)));

        Invocation { args }
    }
}

fn flag(name: &str, value: &str) -> String {
    format!("--{name}={value}")
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
