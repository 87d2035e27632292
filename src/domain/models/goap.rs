//! GOAP (Goal-Oriented Action Planning) world-state and plan models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A world state: a map of keys to typed (JSON) values. `BTreeMap` gives a
/// canonical iteration order, which `canonical_key` relies on to produce a
/// stable A* node key.
pub type WorldState = BTreeMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoapGoal {
    pub id: String,
    /// Required key/value equalities for the goal to be satisfied.
    pub conditions: WorldState,
    pub cost: u64,
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoapAction {
    pub id: String,
    pub preconditions: WorldState,
    pub effects: WorldState,
    pub cost: u64,
    pub agent_type: Option<String>,
}

impl GoapAction {
    /// True if every precondition holds in `state`.
    #[must_use]
    pub fn is_applicable(&self, state: &WorldState) -> bool {
        self.preconditions
            .iter()
            .all(|(k, v)| state.get(k) == Some(v))
    }

    /// Fold this action's effects into `state`, in place.
    pub fn apply(&self, state: &mut WorldState) {
        for (k, v) in &self.effects {
            state.insert(k.clone(), v.clone());
        }
    }
}

/// Serialisable plan form: action ids only, so it survives a restart (§4.3,
/// design note "Plan with callable bindings").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoapPlan {
    pub id: String,
    pub goal_id: String,
    pub sequence: Vec<String>,
    pub total_cost: u64,
}

/// Canonical serialisation of a world state, used as the A* node key.
#[must_use]
pub fn canonical_key(state: &WorldState) -> String {
    serde_json::to_string(state).unwrap_or_default()
}

/// Count of goal conditions not yet satisfied in `state` — the A* heuristic (§4.3).
#[must_use]
pub fn unsatisfied_count(state: &WorldState, goal: &WorldState) -> usize {
    goal.iter().filter(|(k, v)| state.get(*k) != Some(*v)).count()
}
