//! OODA loop driver (component D): wraps `SqliteOodaRepository` with the
//! fixed phase progression observe -> orient -> decide -> act.

use serde_json::Value;

use crate::adapters::sqlite::SqliteOodaRepository;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::ooda::{OodaCycle, OodaPhase};

pub struct OodaService {
    repo: SqliteOodaRepository,
}

impl OodaService {
    #[must_use]
    pub const fn new(repo: SqliteOodaRepository) -> Self {
        Self { repo }
    }

    pub async fn start_cycle(&self) -> DomainResult<OodaCycle> {
        self.repo.start_cycle().await
    }

    /// Advances `id` to `phase`, recording `data` under that phase's column.
    /// Rejects attempts to move backward in the fixed progression.
    pub async fn update_phase(&self, id: &str, phase: OodaPhase, data: Value) -> DomainResult<()> {
        let cycle = self.repo.find(id).await?.ok_or_else(|| DomainError::NotFound(id.to_string()))?;
        if phase_index(phase) < phase_index(cycle.phase) {
            return Err(DomainError::Conflict(format!("cannot move OODA cycle {id} backward to {phase:?}")));
        }
        self.repo.update_phase(id, phase, data).await
    }

    pub async fn complete(&self, id: &str, result: Value) -> DomainResult<()> {
        self.repo.complete(id, result).await
    }

    pub async fn find(&self, id: &str) -> DomainResult<Option<OodaCycle>> {
        self.repo.find(id).await
    }
}

const fn phase_index(phase: OodaPhase) -> u8 {
    match phase {
        OodaPhase::Observe => 0,
        OodaPhase::Orient => 1,
        OodaPhase::Decide => 2,
        OodaPhase::Act => 3,
    }
}
