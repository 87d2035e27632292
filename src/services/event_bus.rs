//! In-process event bus (component F) backed by `tokio::sync::broadcast`,
//! durably mirrored into `event_repository` by callers that care.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

/// Topics published across the kernel (§6). Variants map 1:1 onto the
/// `type` column persisted by `SqliteEventRepository::record`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum KernelEvent {
    #[serde(rename = "router:model-selected")]
    RouterModelSelected { task_type: String, complexity: String, model: String },
    #[serde(rename = "router:cost-tracked")]
    RouterCostTracked { model: String, tokens_used: u64, estimated_cost: f64 },
    #[serde(rename = "router:fallback-selected")]
    RouterFallbackSelected { task_type: String, from_model: String, to_model: String },
    #[serde(rename = "router:cost-optimized")]
    CostOptimized { task_type: String, original_complexity: String, new_complexity: String },
    #[serde(rename = "consensus:proposed")]
    ConsensusProposed { proposal_id: String, topic: String },
    #[serde(rename = "consensus:vote-cast")]
    ConsensusVoteCast { proposal_id: String, voter: String },
    #[serde(rename = "consensus:reached")]
    ConsensusQuorumReached { proposal_id: String },
    #[serde(rename = "consensus:rejected")]
    ConsensusRejected { proposal_id: String, by: String },
    #[serde(rename = "goap:plan-created")]
    GoapPlanCreated { plan_id: String, goal_id: String, step_count: usize },
    #[serde(rename = "goap:plan-executing")]
    GoapPlanExecuting { plan_id: String },
    #[serde(rename = "goap:action-completed")]
    GoapActionCompleted { plan_id: String, action_id: String },
    #[serde(rename = "goap:plan-completed")]
    GoapPlanCompleted { plan_id: String },
    #[serde(rename = "goap:plan-failed")]
    GoapPlanFailed { plan_id: String, failed_action_id: String },
    #[serde(rename = "recovery-success")]
    RecoverySuccess { component: String, strategy: String },
    #[serde(rename = "recovery-failed")]
    RecoveryFailed { component: String, strategies_tried: Vec<String> },
    #[serde(rename = "fallback-used")]
    FallbackUsed { component: String, operation_id: String, reason: String },
    #[serde(rename = "degradation-mode")]
    DegradationMode { component: String, entering: bool },
    #[serde(rename = "rollback-requested")]
    RollbackRequested { component: String, operation_id: String },
    #[serde(rename = "escalation")]
    Escalation { component: String, error: String },
}

impl KernelEvent {
    #[must_use]
    pub fn topic(&self) -> &'static str {
        match self {
            Self::RouterModelSelected { .. } => "router:model-selected",
            Self::RouterCostTracked { .. } => "router:cost-tracked",
            Self::RouterFallbackSelected { .. } => "router:fallback-selected",
            Self::CostOptimized { .. } => "router:cost-optimized",
            Self::ConsensusProposed { .. } => "consensus:proposed",
            Self::ConsensusVoteCast { .. } => "consensus:vote-cast",
            Self::ConsensusQuorumReached { .. } => "consensus:reached",
            Self::ConsensusRejected { .. } => "consensus:rejected",
            Self::GoapPlanCreated { .. } => "goap:plan-created",
            Self::GoapPlanExecuting { .. } => "goap:plan-executing",
            Self::GoapActionCompleted { .. } => "goap:action-completed",
            Self::GoapPlanCompleted { .. } => "goap:plan-completed",
            Self::GoapPlanFailed { .. } => "goap:plan-failed",
            Self::RecoverySuccess { .. } => "recovery-success",
            Self::RecoveryFailed { .. } => "recovery-failed",
            Self::FallbackUsed { .. } => "fallback-used",
            Self::DegradationMode { .. } => "degradation-mode",
            Self::RollbackRequested { .. } => "rollback-requested",
            Self::Escalation { .. } => "escalation",
        }
    }
}

/// Thin wrapper over a `broadcast::Sender`. Publishing with no subscribers
/// is a normal, silent no-op — the bus has no durability guarantee of its
/// own; callers that need replay persist through `SqliteEventRepository`.
pub struct EventBus {
    sender: broadcast::Sender<KernelEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KernelEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Returns the number of active subscribers notified;
    /// never errors on zero subscribers.
    pub fn publish(&self, event: KernelEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(KernelEvent::Escalation { component: "memory".into(), error: "boom".into() });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic(), "escalation");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        let notified = bus.publish(KernelEvent::RollbackRequested {
            component: "workflow".into(),
            operation_id: "op-1".into(),
        });
        assert_eq!(notified, 0);
    }
}
