use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

pub use crate::core::types::{ErrorCategory, ErrorSeverity, TaskType};

/// Directory under the project root holding persisted taskpilot state.
pub const STATE_DIR: &str = ".taskpilot/state";

/// Immutable identity of one registered tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique adapter name, e.g. `claude-code`.
    pub name: String,
    /// Task types the tool can take on.
    pub capabilities: BTreeSet<TaskType>,
    /// Tie-break rank among tools sharing a capability; lower is preferred.
    pub priority: u8,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        capabilities: impl IntoIterator<Item = TaskType>,
        priority: u8,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities: capabilities.into_iter().collect(),
            priority,
        }
    }

    pub fn supports(&self, task_type: TaskType) -> bool {
        self.capabilities.contains(&task_type)
    }
}

/// One opaque grounding text blob loaded from the state directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnippet {
    pub label: String,
    pub content: String,
}

/// Normalized request describing one unit of work to hand to a tool.
///
/// Constructed fresh per invocation; the engine never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Free-text instruction for the tool.
    pub task: String,
    pub task_type: TaskType,
    pub project_root: PathBuf,
    pub state_dir: PathBuf,
    /// Ordered file path hints; may be empty.
    pub files: Vec<PathBuf>,
    /// Open key/value bag for adapter-specific hints (e.g. `skill`,
    /// `timeout_ms`).
    pub metadata: HashMap<String, String>,
    /// Read-only grounding context (recent decisions, patterns, learnings).
    pub memory: Vec<MemorySnippet>,
}

impl ExecutionContext {
    pub fn new(task: impl Into<String>, task_type: TaskType, project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let state_dir = project_root.join(STATE_DIR);
        Self {
            task: task.into(),
            task_type,
            project_root,
            state_dir,
            files: Vec::new(),
            metadata: HashMap::new(),
            memory: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_memory(mut self, memory: Vec<MemorySnippet>) -> Self {
        self.memory = memory;
        self
    }

    #[must_use]
    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }
}

/// Paths a tool reported touching during an execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionArtifacts {
    pub files: Vec<PathBuf>,
}

/// Normalized response describing the outcome of one tool invocation.
///
/// Returned exactly once per invocation; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Accumulated tool output, stdout and stderr interleaved in arrival
    /// order.
    pub output: String,
    /// Failure message, always prefixed with the originating tool name.
    pub error: Option<String>,
    pub duration_ms: u64,
    pub artifacts: Option<ExecutionArtifacts>,
    pub tokens_used: Option<u64>,
}

impl ExecutionResult {
    pub fn success(output: String, duration_ms: u64) -> Self {
        Self {
            success: true,
            output,
            error: None,
            duration_ms,
            artifacts: None,
            tokens_used: None,
        }
    }

    pub fn failure(
        tool: &str,
        message: impl std::fmt::Display,
        output: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            success: false,
            output,
            error: Some(format!("{tool}: {message}")),
            duration_ms,
            artifacts: None,
            tokens_used: None,
        }
    }

    #[must_use]
    pub fn with_artifacts(mut self, artifacts: Option<ExecutionArtifacts>) -> Self {
        self.artifacts = artifacts;
        self
    }

    #[must_use]
    pub fn with_tokens(mut self, tokens_used: Option<u64>) -> Self {
        self.tokens_used = tokens_used;
        self
    }
}

/// Structured task suggestion extracted from a tool's free-text output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProposal {
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub priority: u8,
    pub points: Option<u8>,
}
