use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Closed set of work categories used to match tasks to capable tools.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Code,
    Analyze,
    Test,
    Review,
    Refactor,
    Debug,
    Document,
    Explain,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Code => "code",
            TaskType::Analyze => "analyze",
            TaskType::Test => "test",
            TaskType::Review => "review",
            TaskType::Refactor => "refactor",
            TaskType::Debug => "debug",
            TaskType::Document => "document",
            TaskType::Explain => "explain",
        }
    }

    /// Every task type, in declaration order.
    pub fn all() -> [TaskType; 8] {
        [
            TaskType::Code,
            TaskType::Analyze,
            TaskType::Test,
            TaskType::Review,
            TaskType::Refactor,
            TaskType::Debug,
            TaskType::Document,
            TaskType::Explain,
        ]
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code" => Ok(TaskType::Code),
            "analyze" => Ok(TaskType::Analyze),
            "test" => Ok(TaskType::Test),
            "review" => Ok(TaskType::Review),
            "refactor" => Ok(TaskType::Refactor),
            "debug" => Ok(TaskType::Debug),
            "document" => Ok(TaskType::Document),
            "explain" => Ok(TaskType::Explain),
            other => Err(format!("unknown task type '{other}'")),
        }
    }
}

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    Configuration,
    Unavailable,
    Spawn,
    Timeout,
    Cancelled,
    ToolExecution,
    Parse,
    Io,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Error,
    Warning,
    Info,
    Debug,
}
