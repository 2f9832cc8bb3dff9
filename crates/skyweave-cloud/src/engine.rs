//! Apply engine collaborator

use crate::action::{ActionType, ApplyResult, Plan};
use crate::error::Result;
use crate::graph::ResourceGraph;
use async_trait::async_trait;

/// Engine that turns a declared graph into real resources.
///
/// Builders only declare; scheduling, diffing, retries and state persistence
/// all belong to the implementation behind this trait.
#[async_trait]
pub trait ApplyEngine: Send + Sync {
    /// Returns the engine name (e.g., "dry-run")
    fn name(&self) -> &str;

    /// Calculate the actions needed to reach the declared graph
    async fn plan(&self, graph: &ResourceGraph) -> Result<Plan>;

    /// Apply the planned actions
    async fn apply(&self, plan: &Plan) -> Result<ApplyResult>;
}

/// Engine that plans every resource as a create and applies nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunEngine;

impl DryRunEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ApplyEngine for DryRunEngine {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn plan(&self, graph: &ResourceGraph) -> Result<Plan> {
        let plan = Plan::from_graph(graph);
        tracing::debug!(actions = plan.actions.len(), "planned dry run");
        Ok(plan)
    }

    async fn apply(&self, plan: &Plan) -> Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for action in &plan.actions {
            if action.action_type == ActionType::NoOp {
                continue;
            }
            tracing::info!(
                action = %action.action_type,
                resource = %action.resource_id,
                "dry run"
            );
            result.add_success(action.id.clone(), format!("would {}", action.description));
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }
}
