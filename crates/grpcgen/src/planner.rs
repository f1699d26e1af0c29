//! Output planning.
//!
//! Every generator output falls back to another one when it is not configured:
//!
//! | output            | default            |
//! |-------------------|--------------------|
//! | `grpc_python_out` | `python_out`       |
//! | `mypy_out`        | `python_out`       |
//! | `mypy_grpc_out`   | `grpc_python_out`  |
//!
//! The planner applies that cascade and then creates the distinct set of
//! directories before the generator runs.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{GenerateError, Result};

/// Kind of generator output, in the order the flags are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutputKind {
    /// Protobuf message modules (`*_pb2.py`).
    Python,
    /// gRPC service modules (`*_pb2_grpc.py`).
    Grpc,
    /// Type stubs for message modules (`*_pb2.pyi`).
    Mypy,
    /// Type stubs for service modules (`*_pb2_grpc.pyi`).
    MypyGrpc,
}

impl OutputKind {
    /// All kinds in cascade order.
    pub const ALL: [Self; 4] = [Self::Python, Self::Grpc, Self::Mypy, Self::MypyGrpc];

    /// Returns the option and flag name for this output.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Python => "python_out",
            Self::Grpc => "grpc_python_out",
            Self::Mypy => "mypy_out",
            Self::MypyGrpc => "mypy_grpc_out",
        }
    }

    /// Whether the flag value is prefixed with `quiet:` to silence the
    /// type-stub plugin.
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Mypy | Self::MypyGrpc)
    }
}

/// Explicitly configured secondary outputs.
///
/// Empty or blank strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputOverrides {
    /// `grpc_python_out`.
    pub grpc_python_out: Option<String>,
    /// `mypy_out`.
    pub mypy_out: Option<String>,
    /// `mypy_grpc_out`.
    pub mypy_grpc_out: Option<String>,
}

/// Fully resolved output directories, one per [`OutputKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    python_out: String,
    grpc_python_out: String,
    mypy_out: String,
    mypy_grpc_out: String,
}

impl OutputPlan {
    /// Returns the directory configured for `kind`.
    #[must_use]
    pub fn get(&self, kind: OutputKind) -> &str {
        match kind {
            OutputKind::Python => &self.python_out,
            OutputKind::Grpc => &self.grpc_python_out,
            OutputKind::Mypy => &self.mypy_out,
            OutputKind::MypyGrpc => &self.mypy_grpc_out,
        }
    }

    /// Iterates over `(kind, directory)` pairs in flag order.
    pub fn iter(&self) -> impl Iterator<Item = (OutputKind, &str)> + '_ {
        OutputKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Returns the directory for protobuf modules.
    #[must_use]
    pub fn python_out(&self) -> &str {
        &self.python_out
    }

    /// Returns the directory for gRPC modules.
    #[must_use]
    pub fn grpc_python_out(&self) -> &str {
        &self.grpc_python_out
    }
}

/// Applies the output cascade to a primary output and its overrides.
///
/// # Errors
///
/// Returns [`GenerateError::EmptyOutput`] if the primary output is empty.
pub fn plan(primary: &str, overrides: &OutputOverrides) -> Result<OutputPlan> {
    if primary.trim().is_empty() {
        return Err(GenerateError::EmptyOutput {
            kind: OutputKind::Python.flag(),
        });
    }

    let pick = |value: &Option<String>, fallback: &str| -> String {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    let python_out = primary.to_string();
    let grpc_python_out = pick(&overrides.grpc_python_out, &python_out);
    let mypy_out = pick(&overrides.mypy_out, &python_out);
    let mypy_grpc_out = pick(&overrides.mypy_grpc_out, &grpc_python_out);

    Ok(OutputPlan {
        python_out,
        grpc_python_out,
        mypy_out,
        mypy_grpc_out,
    })
}

/// Creates every distinct output directory of `plan`, relative paths being
/// taken from `base`.
///
/// Directories are de-duplicated by absolute path, so outputs that share a
/// directory are created once. Existing directories are left alone.
///
/// Returns the absolute directories in sorted order.
///
/// # Errors
///
/// Returns [`GenerateError::Planning`] if a directory cannot be created.
pub fn ensure(plan: &OutputPlan, base: &Path) -> Result<Vec<PathBuf>> {
    let dirs: BTreeSet<PathBuf> = plan
        .iter()
        .map(|(_, dir)| absolutize(Path::new(dir), base))
        .collect();

    for dir in &dirs {
        debug!(dir = %dir.display(), "Ensuring output directory");
        fs::create_dir_all(dir).map_err(|e| GenerateError::Planning {
            path: dir.clone(),
            source: e,
        })?;
    }

    Ok(dirs.into_iter().collect())
}

/// Joins `path` onto `base` and removes `.` and `..` components lexically.
#[must_use]
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = base.join(path);
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
