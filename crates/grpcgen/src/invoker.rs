//! Generator process execution.
//!
//! The generator runs once, synchronously, with the caller's standard streams.
//! Its search path is extended for the duration of that one child process so
//! that plugins installed next to it (`protoc-gen-mypy`) are found; the
//! driver's own environment is never modified.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::command::Invocation;
use crate::env::EnvPaths;
use crate::error::{GenerateError, Result};

/// How an [`Invocation`] is turned into a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launcher {
    /// Runs `<interpreter> -m <program token> <flags>`.
    PythonModule {
        /// Python interpreter.
        interpreter: PathBuf,
    },
    /// Runs `<program> <flags>`, ignoring the program token.
    Executable {
        /// Generator executable, e.g. a native `protoc`.
        program: PathBuf,
    },
}

impl Launcher {
    /// Picks the interpreter of `env`, falling back to `python3` or `python`
    /// on the search path.
    #[must_use]
    pub fn python_for(env: &EnvPaths) -> Self {
        let in_env = env.executable("python");
        let interpreter = if in_env.is_file() {
            in_env
        } else {
            which::which("python3")
                .or_else(|_| which::which("python"))
                .unwrap_or_else(|_| PathBuf::from("python3"))
        };
        Self::PythonModule { interpreter }
    }

    /// Uses a generator executable directly.
    #[must_use]
    pub fn executable(program: impl Into<PathBuf>) -> Self {
        Self::Executable {
            program: program.into(),
        }
    }

    /// Returns the program that will be spawned.
    #[must_use]
    pub fn program(&self) -> &Path {
        match self {
            Self::PythonModule { interpreter } => interpreter,
            Self::Executable { program } => program,
        }
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(self.program());
        if matches!(self, Self::PythonModule { .. }) {
            cmd.arg("-m").arg(invocation.program());
        }
        cmd.args(invocation.flags());
        cmd
    }
}

/// Exit status of a generator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationResult {
    code: i32,
}

impl InvocationResult {
    /// Wraps an exit code.
    #[must_use]
    pub const fn new(code: i32) -> Self {
        Self { code }
    }

    /// Exit code; `-1` when the process was terminated by a signal.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.code
    }

    /// Whether the generator exited with code zero.
    #[must_use]
    pub const fn success(self) -> bool {
        self.code == 0
    }
}

/// Runs invocations through a [`Launcher`].
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    launcher: Launcher,
    working_dir: PathBuf,
}

impl ProcessInvoker {
    /// Creates an invoker that starts processes in `working_dir`.
    #[must_use]
    pub fn new(launcher: Launcher, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            launcher,
            working_dir: working_dir.into(),
        }
    }

    /// Runs `invocation` with `path_augmentation` at the front of `PATH` and
    /// waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Spawn`] if the process cannot be started and
    /// [`GenerateError::InvalidConfig`] if `path_augmentation` cannot be placed
    /// in `PATH`.
    pub fn invoke(
        &self,
        invocation: &Invocation,
        path_augmentation: &Path,
    ) -> Result<InvocationResult> {
        let path = augmented_path(env::var_os("PATH"), path_augmentation)?;
        debug!(path = %path.to_string_lossy(), "Generator search path");
        debug!(command = %invocation, "Invoking generator");

        let status = self
            .launcher
            .command(invocation)
            .env("PATH", &path)
            .current_dir(&self.working_dir)
            .status()
            .map_err(|e| GenerateError::Spawn {
                program: self.launcher.program().to_path_buf(),
                source: e,
            })?;

        let result = InvocationResult::new(status.code().unwrap_or(-1));
        if !result.success() {
            warn!(code = result.code(), "Generator exited with failure");
        }
        Ok(result)
    }
}

/// Returns `current` with `dir` prepended, unless `dir` is already one of its
/// entries.
///
/// # Errors
///
/// Returns [`GenerateError::InvalidConfig`] if `dir` contains the platform's
/// path separator.
pub fn augmented_path(current: Option<OsString>, dir: &Path) -> Result<OsString> {
    let entries: Vec<PathBuf> = current
        .as_deref()
        .map(|p| env::split_paths(p).collect())
        .unwrap_or_default();

    if entries.iter().any(|entry| entry == dir) {
        debug!(dir = %dir.display(), "Environment directory already on PATH");
        return Ok(current.unwrap_or_default());
    }

    env::join_paths(std::iter::once(dir.to_path_buf()).chain(entries)).map_err(|e| {
        GenerateError::InvalidConfig {
            message: format!("cannot add {} to PATH: {e}", dir.display()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandBuilder;

    #[test]
    fn test_augmented_path_prepends() {
        let current = env::join_paths(["/usr/bin", "/bin"]).unwrap();
        let path = augmented_path(Some(current), Path::new("/venv/bin")).unwrap();
        let entries: Vec<PathBuf> = env::split_paths(&path).collect();
        assert_eq!(
            entries,
            [
                PathBuf::from("/venv/bin"),
                PathBuf::from("/usr/bin"),
                PathBuf::from("/bin")
            ]
        );
    }

    #[test]
    fn test_augmented_path_is_idempotent() {
        let current = env::join_paths(["/usr/bin", "/venv/bin"]).unwrap();
        let once = augmented_path(Some(current.clone()), Path::new("/venv/bin")).unwrap();
        let twice = augmented_path(Some(once.clone()), Path::new("/venv/bin")).unwrap();
        assert_eq!(once, current);
        assert_eq!(twice, current);
    }

    #[test]
    fn test_augmented_path_without_path() {
        let path = augmented_path(None, Path::new("/venv/bin")).unwrap();
        assert_eq!(path, OsString::from("/venv/bin"));
    }

    #[test]
    fn test_invocation_result() {
        assert!(InvocationResult::new(0).success());
        assert!(!InvocationResult::new(2).success());
        assert_eq!(InvocationResult::new(2).code(), 2);
    }

    #[test]
    fn test_python_module_command_line() {
        let launcher = Launcher::PythonModule {
            interpreter: PathBuf::from("/venv/bin/python"),
        };
        let invocation = CommandBuilder::new("grpc_tools.protoc", "/wk").build();

        let cmd = launcher.command(&invocation);

        assert_eq!(cmd.get_program(), "/venv/bin/python");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["-m", "grpc_tools.protoc", "--proto_path=/wk"]);
    }

    #[test]
    fn test_executable_command_line() {
        let launcher = Launcher::executable("/usr/bin/protoc");
        let invocation = CommandBuilder::new("grpc_tools.protoc", "/wk").build();

        let cmd = launcher.command(&invocation);

        assert_eq!(cmd.get_program(), "/usr/bin/protoc");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["--proto_path=/wk"]);
    }

    #[test]
    fn test_spawn_failure() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let invoker = ProcessInvoker::new(
            Launcher::executable(temp_dir.path().join("missing-protoc")),
            temp_dir.path(),
        );
        let invocation = CommandBuilder::new("protoc", "/wk").build();

        let result = invoker.invoke(&invocation, temp_dir.path());

        assert!(matches!(result, Err(GenerateError::Spawn { .. })));
    }
}
