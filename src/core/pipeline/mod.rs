//! Proposal pipeline: compose tool executions into parsed task proposals.
//!
//! The pipeline asks the best available analysis tool for task suggestions
//! and folds the free-text output into structured [`TaskProposal`] records.
//! A record that fails to parse is dropped and counted, never fatal; a tool
//! that is missing or that fails is surfaced as an error so callers can
//! tell "no tool" and "tool failed" apart from "tool ran and found
//! nothing".

use crate::core::engine::ExecutionObserver;
use crate::core::entities::{ExecutionContext, MemorySnippet, TaskProposal};
use crate::core::error::AppError;
use crate::core::registry::ToolRegistry;
use crate::core::types::{ErrorCategory, TaskType};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Line prefix a well-formed proposal record carries.
const RECORD_PREFIX: &str = "PROPOSAL:";

/// What the caller wants out of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ProposalIntent {
    /// Upper bound on returned proposals.
    pub count: usize,
    /// Project vision statement woven into the prompt.
    pub vision: Option<String>,
    /// Recent task titles for grounding.
    pub recent: Vec<String>,
    /// Read-only memory snippets for grounding.
    pub memory: Vec<MemorySnippet>,
}

/// Why one candidate line was dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProposalParseError {
    #[error("expected at least a title and a description")]
    MissingFields,
    #[error("missing required type field")]
    MissingType,
    #[error("unknown task type '{0}'")]
    UnknownTaskType(String),
    #[error("invalid {field} value '{value}'")]
    InvalidField { field: &'static str, value: String },
}

pub struct ProposalPipeline<'a> {
    registry: &'a ToolRegistry,
}

impl<'a> ProposalPipeline<'a> {
    pub fn new(registry: &'a ToolRegistry) -> Self {
        Self { registry }
    }

    /// Produce up to `intent.count` distinct proposals.
    pub async fn generate(
        &self,
        intent: &ProposalIntent,
        project_root: &Path,
        observer: &mut dyn ExecutionObserver,
    ) -> Result<Vec<TaskProposal>, AppError> {
        let adapter = self
            .registry
            .find_best_tool(TaskType::Analyze)
            .await
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::Unavailable,
                    "no available tool supports analysis tasks",
                )
                .with_code("PIPE-001")
            })?;

        let context = ExecutionContext::new(
            build_proposal_prompt(intent),
            TaskType::Analyze,
            project_root,
        )
        .with_memory(intent.memory.clone());

        let result = adapter.execute(&context, observer).await;
        if !result.success {
            let message = result
                .error
                .unwrap_or_else(|| format!("{}: failed without detail", adapter.descriptor().name));
            return Err(AppError::new(ErrorCategory::ToolExecution, message)
                .with_code("PIPE-002")
                .with_context("tool", adapter.descriptor().name.clone()));
        }

        let (parsed, dropped) = parse_proposals(&result.output);
        if dropped > 0 {
            debug!(dropped, "discarded malformed proposal lines");
        }

        let mut seen = HashSet::new();
        let mut proposals = Vec::new();
        for proposal in parsed {
            if proposals.len() >= intent.count {
                break;
            }
            if seen.insert(normalize_title(&proposal.title)) {
                proposals.push(proposal);
            }
        }
        Ok(proposals)
    }
}

fn build_proposal_prompt(intent: &ProposalIntent) -> String {
    let mut prompt = String::from("Analyze this project and propose new development tasks.\n\n");
    if let Some(vision) = &intent.vision {
        prompt.push_str(&format!("Project vision:\n{vision}\n\n"));
    }
    if !intent.recent.is_empty() {
        prompt.push_str("Recent tasks, for context and to avoid duplicates:\n");
        for title in &intent.recent {
            prompt.push_str(&format!("- {title}\n"));
        }
        prompt.push('\n');
    }
    prompt.push_str(&format!(
        "Propose up to {} distinct tasks. Respond with one line per task, \
         formatted exactly as:\n\
         PROPOSAL: <title> | <description> | type=<code|analyze|test|review|\
         refactor|debug|document|explain> | priority=<0-9> | points=<1-13>\n\
         The points field is optional. No other commentary.\n",
        intent.count
    ));
    prompt
}

/// Extract proposals from raw tool output. Returns the parsed records in
/// output order plus the count of candidate lines that failed to parse.
fn parse_proposals(output: &str) -> (Vec<TaskProposal>, usize) {
    let mut proposals = Vec::new();
    let mut dropped = 0;
    for raw_line in output.lines() {
        let text = extract_text_from_stream_json(raw_line).unwrap_or_else(|| raw_line.to_string());
        for line in text.lines() {
            let Some(record) = line.trim().strip_prefix(RECORD_PREFIX) else {
                continue;
            };
            match parse_proposal_record(record) {
                Ok(proposal) => proposals.push(proposal),
                Err(err) => {
                    dropped += 1;
                    debug!(line = line.trim(), %err, "dropped proposal line");
                }
            }
        }
    }
    (proposals, dropped)
}

fn parse_proposal_record(record: &str) -> Result<TaskProposal, ProposalParseError> {
    let mut fields = record.split('|').map(str::trim);

    let title = fields.next().filter(|s| !s.is_empty());
    let description = fields.next().filter(|s| !s.is_empty());
    let (Some(title), Some(description)) = (title, description) else {
        return Err(ProposalParseError::MissingFields);
    };

    let mut task_type = None;
    let mut priority = None;
    let mut points = None;
    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            return Err(ProposalParseError::InvalidField {
                field: "record",
                value: field.to_string(),
            });
        };
        let value = value.trim();
        match key.trim() {
            "type" => {
                task_type = Some(value.parse::<TaskType>().map_err(|_| {
                    ProposalParseError::UnknownTaskType(value.to_string())
                })?);
            }
            "priority" => {
                priority =
                    Some(
                        value
                            .parse::<u8>()
                            .map_err(|_| ProposalParseError::InvalidField {
                                field: "priority",
                                value: value.to_string(),
                            })?,
                    );
            }
            "points" => {
                points = Some(value.parse::<u8>().map_err(|_| {
                    ProposalParseError::InvalidField {
                        field: "points",
                        value: value.to_string(),
                    }
                })?);
            }
            // Unknown keys are tolerated; tools love inventing fields.
            _ => {}
        }
    }

    Ok(TaskProposal {
        title: title.to_string(),
        description: description.to_string(),
        task_type: task_type.ok_or(ProposalParseError::MissingType)?,
        priority: priority.unwrap_or(2),
        points,
    })
}

fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the text content from a stream-json line. Returns `None` when
/// the line is not JSON or carries no content field.
fn extract_text_from_stream_json(line: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
    if let Some(content) = value.get("content").and_then(|c| c.as_str()) {
        return Some(content.to_string());
    }
    if let Some(result) = value.get("result") {
        if let Some(text) = result.get("result").and_then(|r| r.as_str()) {
            return Some(text.to_string());
        }
        if let Some(text) = result.as_str() {
            return Some(text.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_record() {
        let (proposals, dropped) = parse_proposals(
            "PROPOSAL: Add retry logic | Wrap transient failures | type=code | priority=1 | points=3",
        );
        assert_eq!(dropped, 0);
        assert_eq!(proposals.len(), 1);
        let p = &proposals[0];
        assert_eq!(p.title, "Add retry logic");
        assert_eq!(p.task_type, TaskType::Code);
        assert_eq!(p.priority, 1);
        assert_eq!(p.points, Some(3));
    }

    #[test]
    fn priority_defaults_and_points_stay_optional() {
        let (proposals, _) =
            parse_proposals("PROPOSAL: Tighten CI | Cache builds | type=analyze");
        assert_eq!(proposals[0].priority, 2);
        assert_eq!(proposals[0].points, None);
    }

    #[test]
    fn malformed_records_are_dropped_and_counted() {
        let output = "\
chatter before the list\n\
PROPOSAL: Good one | Solid description | type=test | priority=0\n\
PROPOSAL: missing everything\n\
PROPOSAL: Bad type | Description | type=deploy\n\
PROPOSAL: Another good | Also solid | type=review\n";
        let (proposals, dropped) = parse_proposals(output);
        assert_eq!(proposals.len(), 2);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn record_parse_errors_name_the_problem() {
        assert_eq!(
            parse_proposal_record(" only a title "),
            Err(ProposalParseError::MissingFields)
        );
        assert_eq!(
            parse_proposal_record(" T | D "),
            Err(ProposalParseError::MissingType)
        );
        assert_eq!(
            parse_proposal_record(" T | D | type=ship "),
            Err(ProposalParseError::UnknownTaskType("ship".to_string()))
        );
        assert_eq!(
            parse_proposal_record(" T | D | type=code | priority=high "),
            Err(ProposalParseError::InvalidField {
                field: "priority",
                value: "high".to_string()
            })
        );
    }

    #[test]
    fn records_inside_stream_json_content_are_found() {
        let output = concat!(
            "{\"content\":\"PROPOSAL: From json | Extracted | type=debug\"}\n",
            "{\"type\":\"noise\"}\n",
        );
        let (proposals, dropped) = parse_proposals(output);
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].title, "From json");
        assert_eq!(dropped, 0);
    }

    #[test]
    fn titles_dedupe_case_and_whitespace_insensitively() {
        assert_eq!(normalize_title("  Fix   The Bug "), "fix the bug");
        assert_eq!(normalize_title("fix the bug"), "fix the bug");
    }

    #[test]
    fn prompt_embeds_vision_recent_and_count() {
        let intent = ProposalIntent {
            count: 4,
            vision: Some("Local-first tooling".to_string()),
            recent: vec!["Add config loader".to_string()],
            memory: Vec::new(),
        };
        let prompt = build_proposal_prompt(&intent);
        assert!(prompt.contains("Local-first tooling"));
        assert!(prompt.contains("- Add config loader"));
        assert!(prompt.contains("up to 4 distinct tasks"));
        assert!(prompt.contains("PROPOSAL: <title>"));
    }
}
