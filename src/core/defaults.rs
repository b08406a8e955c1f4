use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::paths;

/// Root configuration structure for classgraph.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassgraphConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// All configurable defaults that can be overridden via classgraph.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Source file handed to the analyzer
    #[serde(default = "default_source")]
    pub source: String,

    /// Image format requested from the renderer
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default = "default_analyzer", deserialize_with = "analyzer_over_default")]
    pub analyzer: ToolConfig,

    #[serde(default = "default_renderer", deserialize_with = "renderer_over_default")]
    pub renderer: ToolConfig,

    /// File name the analyzer writes inside the scratch directory
    #[serde(default = "default_descriptor_name")]
    pub descriptor_name: String,

    /// Delete the descriptor when the render step fails
    #[serde(default)]
    pub cleanup_on_failure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            source: default_source(),
            format: default_format(),
            analyzer: default_analyzer(),
            renderer: default_renderer(),
            descriptor_name: default_descriptor_name(),
            cleanup_on_failure: false,
        }
    }
}

/// An external program plus its argument templates.
///
/// Arguments may reference `{{source}}`, `{{descriptor}}`, `{{output}}`,
/// `{{format}}` and `{{workdir}}`. In classgraph.json either field may be
/// omitted; the missing one keeps its built-in value.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ToolConfig {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Deserialize)]
struct PartialToolConfig {
    program: Option<String>,
    args: Option<Vec<String>>,
}

impl PartialToolConfig {
    fn over(self, base: ToolConfig) -> ToolConfig {
        ToolConfig {
            program: self.program.unwrap_or(base.program),
            args: self.args.unwrap_or(base.args),
        }
    }
}

fn analyzer_over_default<'de, D>(deserializer: D) -> std::result::Result<ToolConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(PartialToolConfig::deserialize(deserializer)?.over(default_analyzer()))
}

fn renderer_over_default<'de, D>(deserializer: D) -> std::result::Result<ToolConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(PartialToolConfig::deserialize(deserializer)?.over(default_renderer()))
}

impl ToolConfig {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn validate(&self, key: &str) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(Error::config_invalid_value(
                format!("{}.program", key),
                Some(self.program.clone()),
                "Program must not be empty",
            ));
        }
        if self.args.is_empty() {
            return Err(Error::config_invalid_value(
                format!("{}.args", key),
                None,
                "Argument list must not be empty",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_source() -> String {
    "src/document.py".to_string()
}

fn default_format() -> String {
    "png".to_string()
}

fn default_analyzer() -> ToolConfig {
    ToolConfig::new("pyreverse", &["-o", "dot", "{{source}}"])
}

fn default_renderer() -> ToolConfig {
    ToolConfig::new("dot", &["-T{{format}}", "{{descriptor}}", "-o", "{{output}}"])
}

fn default_descriptor_name() -> String {
    "classes.dot".to_string()
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load defaults, merging file config with built-in defaults.
/// If classgraph.json is missing or invalid, silently returns built-in defaults.
pub fn load_defaults() -> Defaults {
    load_config().defaults
}

/// Load the full classgraph.json config, falling back to defaults on any error.
pub fn load_config() -> ClassgraphConfig {
    paths::classgraph_json()
        .map(|path| load_config_at(&path))
        .unwrap_or_default()
}

fn load_config_at(path: &Path) -> ClassgraphConfig {
    load_config_from_file(path).unwrap_or_default()
}

fn load_config_from_file(path: &Path) -> Result<ClassgraphConfig> {
    if !path.exists() {
        return Err(Error::other("classgraph.json not found"));
    }

    let content = fs::read_to_string(path).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    parse_config(&content)
}

fn parse_config(content: &str) -> Result<ClassgraphConfig> {
    serde_json::from_str(content).map_err(|e| {
        Error::internal_json(e.to_string(), Some("parse classgraph.json".to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defaults_use_pyreverse_and_dot() {
        let defaults = Defaults::default();
        assert_eq!(defaults.source, "src/document.py");
        assert_eq!(defaults.format, "png");
        assert_eq!(defaults.analyzer.program, "pyreverse");
        assert_eq!(defaults.renderer.program, "dot");
        assert_eq!(defaults.descriptor_name, "classes.dot");
        assert!(!defaults.cleanup_on_failure);
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let config = parse_config(
            r#"{"defaults": {"format": "svg", "renderer": {"program": "/opt/graphviz/bin/dot"}}}"#,
        )
        .unwrap();

        assert_eq!(config.defaults.format, "svg");
        assert_eq!(config.defaults.renderer.program, "/opt/graphviz/bin/dot");
        assert_eq!(
            config.defaults.renderer.args,
            vec!["-T{{format}}", "{{descriptor}}", "-o", "{{output}}"]
        );
        assert_eq!(config.defaults.analyzer.program, "pyreverse");
        assert_eq!(config.defaults.source, "src/document.py");
    }

    #[test]
    fn args_only_override_keeps_builtin_program() {
        let config =
            parse_config(r#"{"defaults": {"analyzer": {"args": ["-o", "dot", "-A", "{{source}}"]}}}"#)
                .unwrap();

        assert_eq!(config.defaults.analyzer.program, "pyreverse");
        assert_eq!(config.defaults.analyzer.args[2], "-A");
        assert_eq!(config.defaults.renderer, default_renderer());
    }

    #[test]
    fn missing_config_file_falls_back_to_builtin_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classgraph.json");

        assert!(load_config_from_file(&path).is_err());
        let config = load_config_at(&path);
        assert_eq!(config.defaults.analyzer, default_analyzer());
        assert_eq!(config.defaults.format, "png");
    }

    #[test]
    fn broken_config_file_falls_back_to_builtin_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classgraph.json");
        fs::write(&path, r#"{"defaults": {"format": "svg""#).unwrap();

        let err = load_config_from_file(&path).unwrap_err();
        assert_eq!(err.code.as_str(), "internal.json_error");
        let config = load_config_at(&path);
        assert_eq!(config.defaults.format, "png");
        assert_eq!(config.defaults.renderer, default_renderer());
    }

    #[test]
    fn config_file_on_disk_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classgraph.json");
        fs::write(&path, r#"{"defaults": {"cleanup_on_failure": true}}"#).unwrap();

        assert!(load_config_at(&path).defaults.cleanup_on_failure);
    }

    #[test]
    fn empty_object_yields_builtin_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.defaults.descriptor_name, "classes.dot");
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = parse_config("{ not json").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.json_error");
    }

    #[test]
    fn empty_program_fails_validation() {
        let tool = ToolConfig::new("  ", &[]);
        let err = tool.validate("renderer").unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
        assert_eq!(err.details["key"], "renderer.program");
    }

    #[test]
    fn empty_args_fail_validation() {
        let tool = ToolConfig::new("dot", &[]);
        let err = tool.validate("renderer").unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
        assert_eq!(err.details["key"], "renderer.args");
    }
}
