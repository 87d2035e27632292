//! OODA (Observe / Orient / Decide / Act) cycle records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OodaPhase {
    Observe,
    Orient,
    Decide,
    Act,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OodaCycle {
    pub id: String,
    pub phase: OodaPhase,
    pub observations: Option<Value>,
    pub orientation: Option<Value>,
    pub decision: Option<Value>,
    pub action: Option<Value>,
    pub timestamp: DateTime<Utc>,
    pub completed: bool,
    pub result: Option<Value>,
}
