//! Protoc command implementation.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use tracing::info;

use grpcgen::lifecycle::PROTOC_COMMAND;
use grpcgen::ToolConfig;

use super::GlobalArgs;

/// Arguments for the protoc command.
///
/// Unset options fall back to `[tool.poetry-grpc-plugin]` in pyproject.toml.
#[derive(Args)]
pub struct ProtocArgs {
    /// Base path for protobuf resources
    #[arg(long = "proto_path")]
    pub proto_path: Option<String>,

    /// Output path for generated protobuf wrappers
    #[arg(long = "python_out")]
    pub python_out: Option<String>,

    /// Output path for generated gRPC wrappers. Defaults to python_out
    #[arg(long = "grpc_python_out")]
    pub grpc_python_out: Option<String>,

    /// Output path for mypy stubs of protobuf wrappers. Defaults to python_out
    #[arg(long = "mypy_out")]
    pub mypy_out: Option<String>,

    /// Output path for mypy stubs of gRPC wrappers. Defaults to grpc_python_out
    #[arg(long = "mypy_grpc_out")]
    pub mypy_grpc_out: Option<String>,

    /// Additional include root inside the environment's site-packages (repeatable)
    #[arg(long = "venv_proto_paths")]
    pub venv_proto_paths: Vec<String>,
}

impl ProtocArgs {
    /// Converts the arguments into plugin options.
    pub fn into_options(self) -> ToolConfig {
        ToolConfig {
            proto_path: self.proto_path,
            python_out: self.python_out,
            grpc_python_out: self.grpc_python_out,
            mypy_out: self.mypy_out,
            mypy_grpc_out: self.mypy_grpc_out,
            venv_proto_paths: self.venv_proto_paths,
        }
    }
}

/// Runs the protoc command. The exit code is the generator's.
pub fn run(global: &GlobalArgs, args: ProtocArgs) -> Result<ExitCode> {
    let (host, env) = global.host()?;
    info!(project = ?global.project, env = ?env.root, "Running protoc");

    let code = host.run_command(PROTOC_COMMAND, args.into_options(), &env)?;
    Ok(ExitCode::from(exit_status(code)))
}

/// Maps a generator exit code onto a process exit status; codes outside
/// `0..=255` become 1.
fn exit_status(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(0), 0);
        assert_eq!(exit_status(2), 2);
        assert_eq!(exit_status(-1), 1);
        assert_eq!(exit_status(300), 1);
    }
}
