//! Pipeline behavior over scripted analysis tools.

use std::sync::Arc;
use std::time::Duration;
use taskpilot::adapters::passthrough::PassthroughAdapter;
use taskpilot::core::engine::{ExecutionObserver, NullObserver};
use taskpilot::core::pipeline::{ProposalIntent, ProposalPipeline};
use taskpilot::core::registry::ToolRegistry;
use taskpilot::core::types::{ErrorCategory, TaskType};
use tempfile::TempDir;

fn analysis_tool(name: &str, script: &str) -> Arc<PassthroughAdapter> {
    Arc::new(PassthroughAdapter::new(
        name,
        vec!["bash".to_string(), "-c".to_string(), script.to_string()],
        vec![TaskType::Analyze],
        0,
        Duration::from_secs(5),
        None,
    ))
}

struct ChunkCounter(usize);

impl ExecutionObserver for ChunkCounter {
    fn on_start(&mut self, _tool: &str) {}
    fn on_output(&mut self, _chunk: &str) {
        self.0 += 1;
    }
    fn on_error(&mut self, _message: &str) {}
}

#[tokio::test]
async fn three_good_records_among_five_lines_yield_three_proposals() {
    let tmp = TempDir::new().unwrap();
    let script = "cat <<'EOF'\n\
PROPOSAL: Add request tracing | Correlate logs per request | type=code | priority=1 | points=3\n\
PROPOSAL: broken record without fields\n\
PROPOSAL: Audit error paths | Check every bail site | type=review | priority=2\n\
PROPOSAL: Wrong type | Should be dropped | type=deploy\n\
PROPOSAL: Document config | Describe taskpilot.toml keys | type=document | priority=3 | points=1\n\
EOF";
    let mut registry = ToolRegistry::new();
    registry.register(analysis_tool("analyzer", script)).unwrap();

    let pipeline = ProposalPipeline::new(&registry);
    let intent = ProposalIntent {
        count: 5,
        ..Default::default()
    };
    let mut observer = ChunkCounter(0);
    let proposals = pipeline
        .generate(&intent, tmp.path(), &mut observer)
        .await
        .unwrap();

    assert_eq!(proposals.len(), 3);
    assert_eq!(proposals[0].title, "Add request tracing");
    assert_eq!(proposals[1].task_type, TaskType::Review);
    assert_eq!(proposals[2].points, Some(1));
    assert!(observer.0 > 0, "pipeline execution should stream output");
}

#[tokio::test]
async fn duplicate_titles_collapse_and_count_truncates() {
    let tmp = TempDir::new().unwrap();
    let script = "cat <<'EOF'\n\
PROPOSAL: Speed up CI | Cache dependencies | type=code\n\
PROPOSAL: speed   up ci | Same idea again | type=code\n\
PROPOSAL: Split the parser | Smaller modules | type=refactor\n\
PROPOSAL: Add benchmarks | Measure hot paths | type=test\n\
EOF";
    let mut registry = ToolRegistry::new();
    registry.register(analysis_tool("analyzer", script)).unwrap();

    let pipeline = ProposalPipeline::new(&registry);
    let intent = ProposalIntent {
        count: 2,
        ..Default::default()
    };
    let proposals = pipeline
        .generate(&intent, tmp.path(), &mut NullObserver)
        .await
        .unwrap();

    assert_eq!(proposals.len(), 2);
    assert_eq!(proposals[0].title, "Speed up CI");
    assert_eq!(proposals[1].title, "Split the parser");
}

#[tokio::test]
async fn no_analysis_capable_tool_is_surfaced_not_swallowed() {
    let tmp = TempDir::new().unwrap();
    let mut registry = ToolRegistry::new();
    registry
        .register(Arc::new(PassthroughAdapter::new(
            "coder-only",
            vec!["bash".to_string(), "-c".to_string(), "true".to_string()],
            vec![TaskType::Code],
            0,
            Duration::from_secs(5),
            None,
        )))
        .unwrap();

    let pipeline = ProposalPipeline::new(&registry);
    let intent = ProposalIntent {
        count: 3,
        ..Default::default()
    };
    let err = pipeline
        .generate(&intent, tmp.path(), &mut NullObserver)
        .await
        .unwrap_err();

    assert_eq!(err.code, "PIPE-001");
    assert_eq!(err.category, ErrorCategory::Unavailable);
}

#[tokio::test]
async fn failing_tool_is_surfaced_with_attribution() {
    let tmp = TempDir::new().unwrap();
    let mut registry = ToolRegistry::new();
    registry
        .register(analysis_tool(
            "flaky-analyzer",
            "echo 'quota exhausted' >&2; exit 3",
        ))
        .unwrap();

    let pipeline = ProposalPipeline::new(&registry);
    let intent = ProposalIntent {
        count: 3,
        ..Default::default()
    };
    let err = pipeline
        .generate(&intent, tmp.path(), &mut NullObserver)
        .await
        .unwrap_err();

    assert_eq!(err.code, "PIPE-002");
    assert_eq!(err.category, ErrorCategory::ToolExecution);
    assert!(err.message.starts_with("flaky-analyzer:"));
    assert!(err.message.contains("quota exhausted"));
}

#[tokio::test]
async fn tool_that_finds_nothing_returns_an_empty_list_without_error() {
    let tmp = TempDir::new().unwrap();
    let mut registry = ToolRegistry::new();
    registry
        .register(analysis_tool("quiet", "echo 'nothing worth proposing'"))
        .unwrap();

    let pipeline = ProposalPipeline::new(&registry);
    let intent = ProposalIntent {
        count: 3,
        ..Default::default()
    };
    let proposals = pipeline
        .generate(&intent, tmp.path(), &mut NullObserver)
        .await
        .unwrap();
    assert!(proposals.is_empty());
}
