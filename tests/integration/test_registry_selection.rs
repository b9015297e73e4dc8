//! Registry selection against real passthrough tools.

use std::sync::Arc;
use std::time::Duration;
use taskpilot::adapters::passthrough::PassthroughAdapter;
use taskpilot::core::registry::ToolRegistry;
use taskpilot::core::types::TaskType;

fn scripted_tool(
    name: &str,
    capabilities: Vec<TaskType>,
    priority: u8,
    available: bool,
) -> Arc<PassthroughAdapter> {
    let command = if available {
        vec!["bash".to_string(), "-c".to_string(), "true".to_string()]
    } else {
        vec!["/nonexistent/bin/missing-tool".to_string()]
    };
    Arc::new(PassthroughAdapter::new(
        name,
        command,
        capabilities,
        priority,
        Duration::from_secs(5),
        None,
    ))
}

#[tokio::test]
async fn available_returns_a_subset_of_registered_tools() {
    let mut registry = ToolRegistry::new();
    registry
        .register(scripted_tool("present", vec![TaskType::Code], 1, true))
        .unwrap();
    registry
        .register(scripted_tool("absent", vec![TaskType::Code], 0, false))
        .unwrap();

    let available = registry.available().await;
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].name, "present");
    assert_eq!(registry.len(), 2);
}

#[tokio::test]
async fn scenario_alpha_beta_selection() {
    // alpha {code, analyze} priority 1, beta {analyze} priority 0.
    let mut registry = ToolRegistry::new();
    registry
        .register(scripted_tool(
            "alpha",
            vec![TaskType::Code, TaskType::Analyze],
            1,
            true,
        ))
        .unwrap();
    registry
        .register(scripted_tool("beta", vec![TaskType::Analyze], 0, true))
        .unwrap();

    let best = registry.find_best_tool(TaskType::Analyze).await.unwrap();
    assert_eq!(best.descriptor().name, "beta");

    let best = registry.find_best_tool(TaskType::Code).await.unwrap();
    assert_eq!(best.descriptor().name, "alpha");

    assert!(registry.find_best_tool(TaskType::Test).await.is_none());
}

#[tokio::test]
async fn best_tool_never_lacks_the_capability() {
    let mut registry = ToolRegistry::new();
    registry
        .register(scripted_tool("coder", vec![TaskType::Code], 0, true))
        .unwrap();
    registry
        .register(scripted_tool("reviewer", vec![TaskType::Review], 9, true))
        .unwrap();

    for task_type in TaskType::all() {
        if let Some(adapter) = registry.find_best_tool(task_type).await {
            assert!(adapter.descriptor().supports(task_type));
        }
    }
}

#[tokio::test]
async fn equal_priority_resolves_by_registration_order_repeatedly() {
    let mut registry = ToolRegistry::new();
    registry
        .register(scripted_tool("first", vec![TaskType::Debug], 3, true))
        .unwrap();
    registry
        .register(scripted_tool("second", vec![TaskType::Debug], 3, true))
        .unwrap();

    for _ in 0..5 {
        let best = registry.find_best_tool(TaskType::Debug).await.unwrap();
        assert_eq!(best.descriptor().name, "first");
    }
}

#[tokio::test]
async fn probing_does_not_change_later_selection() {
    let mut registry = ToolRegistry::new();
    registry
        .register(scripted_tool("steady", vec![TaskType::Code], 1, true))
        .unwrap();

    // Repeated probes reflect install state only; selection is unaffected.
    for _ in 0..3 {
        assert_eq!(registry.available().await.len(), 1);
    }
    let best = registry.find_best_tool(TaskType::Code).await.unwrap();
    assert_eq!(best.descriptor().name, "steady");
}
