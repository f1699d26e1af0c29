//! # grpcgen
//!
//! Protobuf and gRPC binding generation for Python projects.
//!
//! The crate drives `grpc_tools.protoc` for a project:
//!
//! - [`resolver`] - locate `.proto` sources under a search root
//! - [`planner`] - resolve output directories and create them
//! - [`command`] - build the generator command line
//! - [`invoker`] - run the generator with the environment's executables on `PATH`
//! - [`driver`] - the whole pipeline as one call
//! - [`lifecycle`] - plug the pipeline into a host's command registry and
//!   post-update event
//!
//! ## Example
//!
//! ```rust,no_run
//! use grpcgen::{Driver, EnvPaths, ToolConfig};
//!
//! let config = ToolConfig::new()
//!     .with_proto_path("protos")
//!     .with_python_out("src")
//!     .resolve()?;
//! let env = EnvPaths::new(".venv");
//!
//! let result = Driver::new(".").run_once(&config, &env)?;
//! std::process::exit(result.code());
//! # Ok::<(), grpcgen::GenerateError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod driver;
pub mod env;
pub mod error;
pub mod invoker;
pub mod lifecycle;
pub mod planner;
pub mod resolver;


pub use command::{CommandBuilder, Invocation};
pub use config::{ResolvedConfig, ToolConfig};
pub use driver::Driver;
pub use env::{EnvPaths, Platform};
pub use error::{GenerateError, Result};
pub use invoker::{InvocationResult, Launcher, ProcessInvoker};
pub use lifecycle::{
    EventBus, EventKind, GrpcPlugin, Host, HostApp, HostCommand, HostEvent, ProjectMetadata,
    ProtocCommand,
};
pub use planner::{OutputKind, OutputOverrides, OutputPlan};
