//! Project metadata read from `pyproject.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use grpcgen::config::{module_name, TOOL_NAME};
use grpcgen::ProjectMetadata;

/// File holding the project metadata.
pub const PYPROJECT_FILE: &str = "pyproject.toml";

/// Metadata of a Python project.
#[derive(Debug, Clone, Default)]
pub struct PyProject {
    name: String,
    tool: Option<serde_json::Value>,
}

impl PyProject {
    /// Reads `pyproject.toml` from `root`.
    ///
    /// A project without the file has no tool section and is named after its
    /// directory.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(PYPROJECT_FILE);
        let fallback_name = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("project")
            .to_string();

        if !path.is_file() {
            debug!(path = %path.display(), "No pyproject.toml found");
            return Ok(Self {
                name: fallback_name,
                tool: None,
            });
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut project = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if project.name.is_empty() {
            project.name = fallback_name;
        }
        Ok(project)
    }

    /// Parses the contents of a `pyproject.toml`.
    pub fn parse(content: &str) -> Result<Self> {
        let doc: toml::Table = content.parse()?;

        let tool_table = doc.get("tool").and_then(toml::Value::as_table);
        let name = tool_table
            .and_then(|tool| tool.get("poetry"))
            .and_then(|poetry| poetry.get("name"))
            .or_else(|| doc.get("project").and_then(|project| project.get("name")))
            .and_then(toml::Value::as_str)
            .unwrap_or_default()
            .to_string();

        let tool = tool_table
            .and_then(|tool| tool.get(TOOL_NAME))
            .map(serde_json::to_value)
            .transpose()?;

        Ok(Self { name, tool })
    }

    /// Returns the declared project name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ProjectMetadata for PyProject {
    fn tool_config(&self, tool: &str) -> grpcgen::Result<Option<serde_json::Value>> {
        if tool == TOOL_NAME {
            Ok(self.tool.clone())
        } else {
            Ok(None)
        }
    }

    fn module_name(&self) -> String {
        module_name(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PYPROJECT: &str = r#"
[tool.poetry]
name = "demo-project"
version = "0.1.0"
description = ""
authors = ["noone"]

[tool.poetry.dependencies]
python = "^3.8"

[tool.poetry-grpc-plugin]
proto_path = "protos"
python_out = "src"

[build-system]
requires = ["poetry-core"]
build-backend = "poetry.core.masonry.api"
"#;

    #[test]
    fn test_parse_poetry_project() {
        let project = PyProject::parse(PYPROJECT).unwrap();

        assert_eq!(project.name(), "demo-project");
        assert_eq!(project.module_name(), "demo_project");
        let tool = project.tool_config(TOOL_NAME).unwrap().unwrap();
        assert_eq!(tool["proto_path"], "protos");
        assert_eq!(tool["python_out"], "src");
    }

    #[test]
    fn test_parse_pep621_name() {
        let project = PyProject::parse("[project]\nname = \"Other.Project\"\n").unwrap();

        assert_eq!(project.module_name(), "other_project");
        assert!(project.tool_config(TOOL_NAME).unwrap().is_none());
    }

    #[test]
    fn test_parse_invalid_toml() {
        assert!(PyProject::parse("[tool.poetry\nname = ").is_err());
    }

    #[test]
    fn test_other_tool_sections_are_ignored() {
        let project = PyProject::parse(PYPROJECT).unwrap();
        assert!(project.tool_config("black").unwrap().is_none());
    }

    #[test]
    fn test_load_without_pyproject() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("my-service");
        fs::create_dir(&root).unwrap();

        let project = PyProject::load(&root).unwrap();

        assert_eq!(project.module_name(), "my_service");
        assert!(project.tool_config(TOOL_NAME).unwrap().is_none());
    }

    #[test]
    fn test_load_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(PYPROJECT_FILE), PYPROJECT).unwrap();

        let project = PyProject::load(temp_dir.path()).unwrap();

        assert_eq!(project.name(), "demo-project");
        assert!(project.tool_config(TOOL_NAME).unwrap().is_some());
    }
}
