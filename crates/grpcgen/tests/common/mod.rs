//! Shared fixtures: a temporary project with a fake generator.
//!
//! The fake generator is a POSIX shell script that understands the output
//! flags, writes the four expected files per source and records its
//! arguments and `PATH` under `logs/`.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use grpcgen::{EnvPaths, Platform};
use tempfile::TempDir;

const GENERATOR_BODY: &str = r#"
mkdir -p "$LOG_DIR"
printf '%s\n' "$@" > "$LOG_DIR/args.txt"
printf '%s\n' "$PATH" > "$LOG_DIR/path.txt"
[ "$EXIT_CODE" -eq 0 ] || exit "$EXIT_CODE"
py_out=; grpc_out=; mypy_out=; mypy_grpc_out=
for arg in "$@"; do
  case "$arg" in
    --python_out=*) py_out="${arg#--python_out=}" ;;
    --grpc_python_out=*) grpc_out="${arg#--grpc_python_out=}" ;;
    --mypy_out=*) mypy_out="${arg#--mypy_out=quiet:}" ;;
    --mypy_grpc_out=*) mypy_grpc_out="${arg#--mypy_grpc_out=quiet:}" ;;
    --*) ;;
    *.proto)
      name=$(basename "$arg" .proto)
      touch "$py_out/${name}_pb2.py" "$grpc_out/${name}_pb2_grpc.py" \
        "$mypy_out/${name}_pb2.pyi" "$mypy_grpc_out/${name}_pb2_grpc.pyi"
      ;;
  esac
done
exit $EXIT_CODE
"#;

/// A temporary project directory.
pub struct Project {
    _dir: TempDir,
    root: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path().canonicalize().expect("Failed to canonicalize");
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn add_proto(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "syntax = \"proto3\";\n\nmessage Demo {\n  string name = 1;\n}\n",
        )
        .unwrap();
        path
    }

    /// Creates `.venv` with a Unix layout.
    pub fn env(&self) -> EnvPaths {
        fs::create_dir_all(self.path(".venv/bin")).unwrap();
        fs::create_dir_all(self.path(".venv/lib/python3.11/site-packages")).unwrap();
        EnvPaths::for_platform(self.path(".venv"), Platform::Unix)
    }

    /// Writes a generator executable outside the environment.
    pub fn install_generator(&self, exit_code: i32) -> PathBuf {
        let path = self.path("tools/fake-protoc");
        self.write_script(&path, "", exit_code);
        path
    }

    /// Writes a fake interpreter into the environment that only accepts
    /// `-m grpc_tools.protoc`.
    pub fn install_python(&self, exit_code: i32) -> PathBuf {
        let path = self.path(".venv/bin/python");
        let prefix = "[ \"$1\" = \"-m\" ] || exit 97\n\
                      [ \"$2\" = \"grpc_tools.protoc\" ] || exit 98\n\
                      shift 2\n";
        self.write_script(&path, prefix, exit_code);
        path
    }

    fn write_script(&self, path: &Path, prefix: &str, exit_code: i32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let script = format!(
            "#!/bin/sh\nLOG_DIR='{}'\nEXIT_CODE={exit_code}\n{prefix}{GENERATOR_BODY}",
            self.path("logs").display()
        );
        fs::write(path, script).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Arguments the generator received, if it ran.
    pub fn recorded_args(&self) -> Option<Vec<String>> {
        fs::read_to_string(self.path("logs/args.txt"))
            .ok()
            .map(|s| s.lines().map(str::to_string).collect())
    }

    /// `PATH` the generator saw, if it ran.
    pub fn recorded_path(&self) -> Option<String> {
        fs::read_to_string(self.path("logs/path.txt"))
            .ok()
            .map(|s| s.trim_end().to_string())
    }

    /// Sorted file names directly inside `relative`.
    pub fn files_in(&self, relative: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path(relative))
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}
