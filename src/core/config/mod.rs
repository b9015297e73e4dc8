use crate::core::error::AppError;
use crate::core::types::{ErrorCategory, TaskType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of the project configuration, resolved against the project root.
pub const CONFIG_FILE: &str = "taskpilot.toml";

/// Main taskpilot configuration loaded from taskpilot.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TaskpilotConfig {
    /// Project configuration
    #[serde(default)]
    pub project: ProjectConfig,

    /// Defaults applied to every tool invocation
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Per-tool overrides and custom tool definitions, keyed by tool name.
    /// A `BTreeMap` keeps custom-tool registration order deterministic.
    #[serde(default)]
    pub tools: BTreeMap<String, ToolOverride>,
}

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Free-form vision statement fed to the proposal pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vision: Option<String>,
}

/// Defaults applied to every tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Execution timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of memory snippets loaded for grounding
    #[serde(default = "default_memory_limit")]
    pub memory_limit: usize,
}

/// Override block for one tool.
///
/// For the built-in adapters only the override fields apply; a block whose
/// name is not a built-in and that carries a `command` defines a custom
/// passthrough tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOverride {
    /// Replacement binary path for a built-in adapter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,

    /// Extra arguments appended to the invocation
    #[serde(default)]
    pub args: Vec<String>,

    /// Model identifier forwarded to tools that accept one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Selection priority override; lower is preferred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    /// Per-tool timeout override in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Disable the tool without removing its block
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Full argv for a custom passthrough tool
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,

    /// Capabilities of a custom passthrough tool
    #[serde(default)]
    pub capabilities: Vec<TaskType>,
}

fn default_timeout_ms() -> u64 {
    300_000
}

fn default_memory_limit() -> usize {
    5
}

fn default_enabled() -> bool {
    true
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            name: "taskpilot-project".to_string(),
            vision: None,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            timeout_ms: default_timeout_ms(),
            memory_limit: default_memory_limit(),
        }
    }
}

impl Default for ToolOverride {
    fn default() -> Self {
        ToolOverride {
            binary: None,
            args: Vec::new(),
            model: None,
            priority: None,
            timeout_ms: None,
            enabled: default_enabled(),
            command: None,
            capabilities: Vec::new(),
        }
    }
}

impl TaskpilotConfig {
    /// Load `taskpilot.toml` from the project root, falling back to defaults
    /// when the file does not exist. Parse and validation failures are
    /// Configuration errors.
    pub fn load(project_root: &Path) -> Result<Self, AppError> {
        let path = project_root.join(CONFIG_FILE);
        let config = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|err| {
                AppError::new(
                    ErrorCategory::Configuration,
                    format!("failed to read {}: {err}", path.display()),
                )
                .with_code("CFG-001")
            })?;
            toml::from_str(&content).map_err(|err| {
                AppError::new(
                    ErrorCategory::Configuration,
                    format!("failed to parse {}: {err}", path.display()),
                )
                .with_code("CFG-001")
            })?
        } else {
            TaskpilotConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Returns the override block for a tool, if configured.
    pub fn tool(&self, name: &str) -> Option<&ToolOverride> {
        self.tools.get(name)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.defaults.timeout_ms == 0 {
            return Err(AppError::new(
                ErrorCategory::Configuration,
                "defaults.timeout_ms must be greater than zero",
            )
            .with_code("CFG-001"));
        }
        for (name, tool) in &self.tools {
            if tool.timeout_ms == Some(0) {
                return Err(AppError::new(
                    ErrorCategory::Configuration,
                    format!("tools.{name}.timeout_ms must be greater than zero"),
                )
                .with_code("CFG-001"));
            }
            if tool.binary.as_deref() == Some("") {
                return Err(AppError::new(
                    ErrorCategory::Configuration,
                    format!("tools.{name}.binary must not be empty"),
                )
                .with_code("CFG-001"));
            }
            if let Some(command) = &tool.command {
                if command.is_empty() {
                    return Err(AppError::new(
                        ErrorCategory::Configuration,
                        format!("tools.{name}.command must not be empty"),
                    )
                    .with_code("CFG-001"));
                }
            }
        }
        Ok(())
    }
}
