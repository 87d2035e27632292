//! Cost-aware model routing (component F): cheapest-sufficient-model
//! selection with a cost-ceiling downgrade.

use std::collections::HashMap;
use std::sync::Arc;

use crate::services::complexity::{classify, Complexity};
use crate::services::event_bus::{EventBus, KernelEvent};

/// Declarative agent-type -> complexity -> model table (§6 example rows).
/// Configuration-driven in principle; the defaults here are the rows the
/// spec gives as examples and are overridable via `RoutingTable::insert`.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    rows: HashMap<(String, Complexity), String>,
}

impl RoutingTable {
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self { rows: HashMap::new() };

        table.insert("test-generator", Complexity::Simple, "gpt-3.5-turbo");
        table.insert("test-generator", Complexity::Moderate, "claude-haiku");
        table.insert("test-generator", Complexity::Complex, "gpt-4");
        table.insert("test-generator", Complexity::Critical, "claude-sonnet-4.5");

        table.insert("test-executor", Complexity::Simple, "gpt-3.5-turbo");
        table.insert("test-executor", Complexity::Moderate, "gpt-3.5-turbo");
        table.insert("test-executor", Complexity::Complex, "claude-haiku");
        table.insert("test-executor", Complexity::Critical, "gpt-4");

        table.insert("coverage-analyzer", Complexity::Simple, "claude-haiku");
        table.insert("coverage-analyzer", Complexity::Moderate, "claude-haiku");
        table.insert("coverage-analyzer", Complexity::Complex, "gpt-4");
        table.insert("coverage-analyzer", Complexity::Critical, "claude-sonnet-4.5");

        table
    }

    pub fn insert(&mut self, agent_type: &str, complexity: Complexity, model: &str) {
        self.rows.insert((agent_type.to_string(), complexity), model.to_string());
    }

    fn lookup(&self, agent_type: &str, complexity: Complexity) -> Option<&str> {
        self.rows.get(&(agent_type.to_string(), complexity)).map(String::as_str)
    }
}

/// Rough per-1K-token cost used only to decide whether a selection exceeds
/// `cost_threshold`; not a billing-accurate price list.
fn cost_per_1k_tokens(model: &str) -> f64 {
    match model {
        "gpt-3.5-turbo" => 0.002,
        "claude-haiku" => 0.0025,
        "gpt-4" => 0.06,
        "claude-sonnet-4.5" => 0.045,
        _ => 0.01,
    }
}

#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub model: String,
    pub complexity: Complexity,
    pub estimated_cost: f64,
}

pub struct ModelRouter {
    table: RoutingTable,
    events: Arc<EventBus>,
    cost_threshold: f64,
}

impl ModelRouter {
    #[must_use]
    pub const fn new(table: RoutingTable, events: Arc<EventBus>, cost_threshold: f64) -> Self {
        Self { table, events, cost_threshold }
    }

    /// Classifies `description`, selects a model, and downgrades complexity
    /// one step at a time while the estimated cost for `estimated_tokens`
    /// exceeds `cost_threshold`, stopping once the floor (`Simple`) is hit.
    pub fn select(&self, agent_type: &str, description: &str, estimated_tokens: u64) -> RoutingDecision {
        let original = classify(description);
        let mut complexity = original;

        loop {
            let model = self.table.lookup(agent_type, complexity).unwrap_or("gpt-3.5-turbo").to_string();
            let estimated_cost = cost_per_1k_tokens(&model) * (estimated_tokens as f64 / 1000.0);

            if estimated_cost <= self.cost_threshold || complexity == Complexity::Simple {
                if complexity != original {
                    self.events.publish(KernelEvent::CostOptimized {
                        task_type: agent_type.to_string(),
                        original_complexity: format!("{original:?}").to_lowercase(),
                        new_complexity: format!("{complexity:?}").to_lowercase(),
                    });
                }
                self.events.publish(KernelEvent::RouterModelSelected {
                    task_type: agent_type.to_string(),
                    complexity: format!("{complexity:?}").to_lowercase(),
                    model: model.clone(),
                });
                return RoutingDecision { model, complexity, estimated_cost };
            }

            complexity = complexity.downgrade();
        }
    }

    /// Selects a substitute model when the primary provider call fails
    /// transiently, preferring the next cheaper model for the same
    /// complexity tier rather than re-running the full classifier.
    pub fn fallback(&self, agent_type: &str, failed_model: &str, complexity: Complexity) -> RoutingDecision {
        let downgraded = complexity.downgrade();
        let model = self.table.lookup(agent_type, downgraded).unwrap_or("gpt-3.5-turbo").to_string();

        self.events.publish(KernelEvent::RouterFallbackSelected {
            task_type: agent_type.to_string(),
            from_model: failed_model.to_string(),
            to_model: model.clone(),
        });

        let estimated_cost = cost_per_1k_tokens(&model);
        RoutingDecision { model, complexity: downgraded, estimated_cost }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(cost_threshold: f64) -> ModelRouter {
        ModelRouter::new(RoutingTable::with_defaults(), Arc::new(EventBus::new()), cost_threshold)
    }

    #[test]
    fn simple_description_routes_to_cheap_model() {
        let router = router(10.0);
        let decision = router.select("test-generator", "add a unit test", 1000);
        assert_eq!(decision.model, "gpt-3.5-turbo");
        assert_eq!(decision.complexity, Complexity::Simple);
    }

    #[test]
    fn critical_description_routes_to_top_tier_model() {
        let router = router(10.0);
        let decision = router.select("test-generator", "fix the production payment auth bug", 1000);
        assert_eq!(decision.model, "claude-sonnet-4.5");
        assert_eq!(decision.complexity, Complexity::Critical);
    }

    #[test]
    fn cost_ceiling_downgrades_until_within_threshold() {
        let router = router(0.01);
        let decision = router.select("test-generator", "fix the production payment auth bug", 1000);
        assert_eq!(decision.complexity, Complexity::Simple);
        assert!(decision.estimated_cost <= 0.01);
    }
}
