//! Plugin configuration.
//!
//! The configuration is a closed set of named options. It is read from an
//! already-parsed mapping (the project's `[tool.poetry-grpc-plugin]` table),
//! merged with command-line values, completed with project defaults, and
//! finally resolved into a [`ResolvedConfig`] with every output filled in.

use serde::Deserialize;

use crate::error::{GenerateError, Result};
use crate::planner::{self, OutputOverrides, OutputPlan};

/// Name of the tool section holding the plugin configuration.
pub const TOOL_NAME: &str = "poetry-grpc-plugin";

/// Default search root when none is configured.
pub const DEFAULT_PROTO_PATH: &str = ".";

/// Raw plugin options, any of which may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Base path searched for `.proto` files.
    pub proto_path: Option<String>,
    /// Output directory for protobuf modules.
    pub python_out: Option<String>,
    /// Output directory for gRPC modules.
    pub grpc_python_out: Option<String>,
    /// Output directory for protobuf type stubs.
    pub mypy_out: Option<String>,
    /// Output directory for gRPC type stubs.
    pub mypy_grpc_out: Option<String>,
    /// Extra include roots, relative to the environment's library directory.
    #[serde(default)]
    pub venv_proto_paths: Vec<String>,
}

impl ToolConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration mapping.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::InvalidConfig`] for unknown keys or values of
    /// the wrong type.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| GenerateError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Sets the search root.
    #[must_use]
    pub fn with_proto_path(mut self, path: impl Into<String>) -> Self {
        self.proto_path = Some(path.into());
        self
    }

    /// Sets the primary output directory.
    #[must_use]
    pub fn with_python_out(mut self, path: impl Into<String>) -> Self {
        self.python_out = Some(path.into());
        self
    }

    /// Sets the gRPC output directory.
    #[must_use]
    pub fn with_grpc_python_out(mut self, path: impl Into<String>) -> Self {
        self.grpc_python_out = Some(path.into());
        self
    }

    /// Adds an extra include root.
    #[must_use]
    pub fn add_venv_proto_path(mut self, path: impl Into<String>) -> Self {
        self.venv_proto_paths.push(path.into());
        self
    }

    /// Overlays `overrides` on top of this configuration.
    ///
    /// Each option set in `overrides` wins. The include root list is replaced
    /// only when `overrides` carries at least one entry.
    #[must_use]
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            proto_path: overrides.proto_path.or(self.proto_path),
            python_out: overrides.python_out.or(self.python_out),
            grpc_python_out: overrides.grpc_python_out.or(self.grpc_python_out),
            mypy_out: overrides.mypy_out.or(self.mypy_out),
            mypy_grpc_out: overrides.mypy_grpc_out.or(self.mypy_grpc_out),
            venv_proto_paths: if overrides.venv_proto_paths.is_empty() {
                self.venv_proto_paths
            } else {
                overrides.venv_proto_paths
            },
        }
    }

    /// Fills `python_out` from the project module name and `proto_path`
    /// with `.` when they are unset.
    #[must_use]
    pub fn with_project_defaults(mut self, module_name: &str) -> Self {
        if self.python_out.is_none() {
            self.python_out = Some(module_name.to_string());
        }
        if self.proto_path.is_none() {
            self.proto_path = Some(DEFAULT_PROTO_PATH.to_string());
        }
        self
    }

    /// Resolves the output cascade.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::EmptyOutput`] if `python_out` is missing or
    /// empty.
    pub fn resolve(self) -> Result<ResolvedConfig> {
        let primary = self.python_out.unwrap_or_default();
        let outputs = planner::plan(
            &primary,
            &OutputOverrides {
                grpc_python_out: self.grpc_python_out,
                mypy_out: self.mypy_out,
                mypy_grpc_out: self.mypy_grpc_out,
            },
        )?;

        Ok(ResolvedConfig {
            proto_path: self
                .proto_path
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PROTO_PATH.to_string()),
            outputs,
            venv_proto_paths: self.venv_proto_paths,
        })
    }
}

/// Configuration with every output directory known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Search root for `.proto` files.
    pub proto_path: String,
    /// Output directories.
    pub outputs: OutputPlan,
    /// Extra include roots, relative to the environment's library directory.
    pub venv_proto_paths: Vec<String>,
}

/// Converts a project name into its importable module name.
///
/// The name is lower-cased and every run of `-`, `_` or `.` becomes a single
/// underscore.
///
/// # Examples
///
/// ```
/// use grpcgen::config::module_name;
///
/// assert_eq!(module_name("My.Cool-Project"), "my_cool_project");
/// assert_eq!(module_name("demo__api"), "demo_api");
/// ```
#[must_use]
pub fn module_name(project_name: &str) -> String {
    let mut out = String::with_capacity(project_name.len());
    let mut in_separator = false;
    for c in project_name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('_');
            }
            in_separator = true;
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::OutputKind;
    use serde_json::json;

    #[test]
    fn test_from_value() {
        let config = ToolConfig::from_value(json!({
            "proto_path": "protos",
            "python_out": "src",
            "venv_proto_paths": ["googleapis"],
        }))
        .unwrap();

        assert_eq!(config.proto_path.as_deref(), Some("protos"));
        assert_eq!(config.python_out.as_deref(), Some("src"));
        assert_eq!(config.grpc_python_out, None);
        assert_eq!(config.venv_proto_paths, vec!["googleapis".to_string()]);
    }

    #[test]
    fn test_from_value_rejects_unknown_keys() {
        let result = ToolConfig::from_value(json!({
            "python_out": "src",
            "experimental_allow_proto3_optional": true,
        }));
        assert!(matches!(result, Err(GenerateError::InvalidConfig { .. })));
    }

    #[test]
    fn test_from_value_rejects_wrong_type() {
        let result = ToolConfig::from_value(json!({ "python_out": 3 }));
        assert!(matches!(result, Err(GenerateError::InvalidConfig { .. })));
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let configured = ToolConfig::new()
            .with_proto_path("protos")
            .with_python_out("src")
            .add_venv_proto_path("a");
        let cli = ToolConfig::new().with_python_out("gen");

        let merged = configured.merge(cli);

        assert_eq!(merged.proto_path.as_deref(), Some("protos"));
        assert_eq!(merged.python_out.as_deref(), Some("gen"));
        assert_eq!(merged.venv_proto_paths, vec!["a".to_string()]);
    }

    #[test]
    fn test_merge_replaces_include_roots() {
        let configured = ToolConfig::new().add_venv_proto_path("a");
        let cli = ToolConfig::new().add_venv_proto_path("b");

        let merged = configured.merge(cli);

        assert_eq!(merged.venv_proto_paths, vec!["b".to_string()]);
    }

    #[test]
    fn test_project_defaults() {
        let config = ToolConfig::new().with_project_defaults("demo_project");
        assert_eq!(config.python_out.as_deref(), Some("demo_project"));
        assert_eq!(config.proto_path.as_deref(), Some("."));

        let config = ToolConfig::new()
            .with_python_out("src")
            .with_project_defaults("demo_project");
        assert_eq!(config.python_out.as_deref(), Some("src"));
    }

    #[test]
    fn test_resolve_cascade() {
        let resolved = ToolConfig::new()
            .with_proto_path("protos")
            .with_python_out("src")
            .with_grpc_python_out("grpc")
            .resolve()
            .unwrap();

        assert_eq!(resolved.proto_path, "protos");
        assert_eq!(resolved.outputs.get(OutputKind::Mypy), "src");
        assert_eq!(resolved.outputs.get(OutputKind::MypyGrpc), "grpc");
    }

    #[test]
    fn test_resolve_without_python_out() {
        let result = ToolConfig::new().resolve();
        assert!(matches!(result, Err(GenerateError::EmptyOutput { .. })));
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name("project"), "project");
        assert_eq!(module_name("my-project"), "my_project");
        assert_eq!(module_name("My.Cool--Project"), "my_cool_project");
    }
}
