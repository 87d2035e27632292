//! GOAP planning (component D): A* search over `WorldState`, plan
//! persistence, and stepwise plan execution.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use uuid::Uuid;

use crate::adapters::sqlite::SqliteGoapRepository;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::goap::{canonical_key, unsatisfied_count, GoapAction, GoapGoal, GoapPlan, WorldState};
use crate::services::event_bus::{EventBus, KernelEvent};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Frontier {
    f_score: u64,
    insertion_order: u64,
    state_key: String,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.insertion_order == other.insertion_order
    }
}
impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse f_score so the lowest-cost
        // frontier node pops first. Ties break by insertion order so the
        // search is deterministic for identical-cost alternatives.
        other.f_score.cmp(&self.f_score).then_with(|| other.insertion_order.cmp(&self.insertion_order))
    }
}
impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A planned, unexecuted sequence of live actions, bound by reference.
/// This is distinct from `GoapPlan`, which stores only action ids and is
/// what gets persisted and restored across restarts (§4.3).
pub struct LivePlan {
    pub goal_id: String,
    pub steps: Vec<GoapAction>,
    pub total_cost: u64,
}

pub struct GoapPlanner {
    repo: SqliteGoapRepository,
    events: Arc<EventBus>,
}

impl GoapPlanner {
    #[must_use]
    pub const fn new(repo: SqliteGoapRepository, events: Arc<EventBus>) -> Self {
        Self { repo, events }
    }

    pub async fn register_action(&self, action: &GoapAction) -> DomainResult<()> {
        self.repo.register_action(action).await
    }

    pub async fn register_goal(&self, goal: &GoapGoal) -> DomainResult<()> {
        self.repo.register_goal(goal).await
    }

    /// A* search from `start` to any state satisfying `goal.conditions`.
    /// The heuristic is the count of unsatisfied goal conditions, which is
    /// admissible since every action changes at least nothing toward the
    /// goal for free — it never overestimates true remaining cost in a
    /// unit/positive-cost action space.
    pub async fn plan(&self, goal: &GoapGoal, start: &WorldState) -> DomainResult<LivePlan> {
        let actions = self.repo.all_actions().await?;

        let start_key = canonical_key(start);
        let mut g_score: HashMap<String, u64> = HashMap::new();
        g_score.insert(start_key.clone(), 0);

        let mut came_from: HashMap<String, (String, String)> = HashMap::new();
        let mut states: HashMap<String, WorldState> = HashMap::new();
        states.insert(start_key.clone(), start.clone());

        let mut frontier = BinaryHeap::new();
        let mut insertion_order = 0u64;
        frontier.push(Frontier {
            f_score: unsatisfied_count(start, &goal.conditions) as u64,
            insertion_order,
            state_key: start_key.clone(),
        });

        let mut visited = std::collections::HashSet::new();

        while let Some(Frontier { state_key, .. }) = frontier.pop() {
            if !visited.insert(state_key.clone()) {
                continue;
            }
            let current = states[&state_key].clone();

            if unsatisfied_count(&current, &goal.conditions) == 0 {
                let sequence = reconstruct(&came_from, &state_key);
                let steps: Vec<GoapAction> = sequence
                    .iter()
                    .map(|id| actions.iter().find(|a| &a.id == id).cloned().ok_or_else(|| DomainError::NotFound(id.clone())))
                    .collect::<DomainResult<_>>()?;
                let total_cost = steps.iter().map(|a| a.cost).sum();

                self.events.publish(KernelEvent::GoapPlanCreated {
                    plan_id: goal.id.clone(),
                    goal_id: goal.id.clone(),
                    step_count: steps.len(),
                });
                return Ok(LivePlan { goal_id: goal.id.clone(), steps, total_cost });
            }

            let current_g = g_score[&state_key];

            for action in actions.iter().filter(|a| a.is_applicable(&current)) {
                let mut next = current.clone();
                action.apply(&mut next);
                let next_key = canonical_key(&next);
                let tentative_g = current_g + action.cost;

                if tentative_g < *g_score.get(&next_key).unwrap_or(&u64::MAX) {
                    g_score.insert(next_key.clone(), tentative_g);
                    came_from.insert(next_key.clone(), (state_key.clone(), action.id.clone()));
                    states.insert(next_key.clone(), next.clone());

                    insertion_order += 1;
                    frontier.push(Frontier {
                        f_score: tentative_g + unsatisfied_count(&next, &goal.conditions) as u64,
                        insertion_order,
                        state_key: next_key,
                    });
                }
            }
        }

        Err(DomainError::PlanFailure(format!("no plan found for goal {}", goal.id)))
    }

    pub async fn persist(&self, plan: &LivePlan) -> DomainResult<GoapPlan> {
        let serialisable = GoapPlan {
            id: format!("ooda:{}", Uuid::new_v4()),
            goal_id: plan.goal_id.clone(),
            sequence: plan.steps.iter().map(|a| a.id.clone()).collect(),
            total_cost: plan.total_cost,
        };
        self.repo.save_plan(&serialisable).await?;
        Ok(serialisable)
    }

    /// Re-binds a persisted plan's action ids back to live `GoapAction`
    /// values. Fails with `NotFound` if an action has since been
    /// deregistered — a restored plan is only as good as the actions it
    /// references still existing.
    pub async fn restore(&self, plan: &GoapPlan) -> DomainResult<LivePlan> {
        let mut steps = Vec::with_capacity(plan.sequence.len());
        for id in &plan.sequence {
            let action = self.repo.find_action(id).await?.ok_or_else(|| DomainError::NotFound(id.clone()))?;
            steps.push(action);
        }
        Ok(LivePlan { goal_id: plan.goal_id.clone(), steps, total_cost: plan.total_cost })
    }

    /// Executes `plan` against `state`, mutating it in place, verifying
    /// each step's preconditions hold immediately before it runs. A
    /// violated precondition means the world drifted since planning and
    /// the whole plan is aborted rather than silently skipped.
    pub async fn execute(&self, plan_id: &str, plan: &LivePlan, state: &mut WorldState) -> DomainResult<()> {
        self.events.publish(KernelEvent::GoapPlanExecuting { plan_id: plan_id.to_string() });

        for action in &plan.steps {
            if !action.is_applicable(state) {
                self.events.publish(KernelEvent::GoapPlanFailed {
                    plan_id: plan_id.to_string(),
                    failed_action_id: action.id.clone(),
                });
                return Err(DomainError::PlanFailure(format!(
                    "precondition violated for action {} in plan {plan_id}",
                    action.id
                )));
            }
            action.apply(state);
            self.events.publish(KernelEvent::GoapActionCompleted {
                plan_id: plan_id.to_string(),
                action_id: action.id.clone(),
            });
        }

        self.events.publish(KernelEvent::GoapPlanCompleted { plan_id: plan_id.to_string() });
        Ok(())
    }
}

fn reconstruct(came_from: &HashMap<String, (String, String)>, goal_key: &str) -> Vec<String> {
    let mut sequence = Vec::new();
    let mut current = goal_key.to_string();
    while let Some((prev, action_id)) = came_from.get(&current) {
        sequence.push(action_id.clone());
        current = prev.clone();
    }
    sequence.reverse();
    sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action(id: &str, pre: &[(&str, bool)], eff: &[(&str, bool)], cost: u64) -> GoapAction {
        GoapAction {
            id: id.to_string(),
            preconditions: pre.iter().map(|(k, v)| (k.to_string(), json!(v))).collect(),
            effects: eff.iter().map(|(k, v)| (k.to_string(), json!(v))).collect(),
            cost,
            agent_type: None,
        }
    }

    #[test]
    fn reconstruct_walks_came_from_chain_to_sequence() {
        let mut came_from = HashMap::new();
        came_from.insert("b".to_string(), ("a".to_string(), "step1".to_string()));
        came_from.insert("c".to_string(), ("b".to_string(), "step2".to_string()));

        let sequence = reconstruct(&came_from, "c");
        assert_eq!(sequence, vec!["step1".to_string(), "step2".to_string()]);
    }

    #[test]
    fn frontier_orders_by_lowest_f_score_first() {
        let mut heap = BinaryHeap::new();
        heap.push(Frontier { f_score: 5, insertion_order: 0, state_key: "a".into() });
        heap.push(Frontier { f_score: 2, insertion_order: 1, state_key: "b".into() });
        heap.push(Frontier { f_score: 2, insertion_order: 2, state_key: "c".into() });

        assert_eq!(heap.pop().unwrap().state_key, "b");
        assert_eq!(heap.pop().unwrap().state_key, "c");
        assert_eq!(heap.pop().unwrap().state_key, "a");
    }

    #[test]
    fn single_action_plan_applies_expected_effects() {
        let write_tests = action("write-tests", &[("has_tests", false)], &[("has_tests", true)], 1);
        let mut state: WorldState = [("has_tests".to_string(), json!(false))].into_iter().collect();
        assert!(write_tests.is_applicable(&state));
        write_tests.apply(&mut state);
        assert_eq!(state.get("has_tests"), Some(&json!(true)));
    }
}
