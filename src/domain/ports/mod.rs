//! Port traits for the two subsystems with a pluggable storage backend.
//! The coordination, orchestration, routing and learning subsystems are
//! concrete services over the memory store rather than separate ports —
//! they have exactly one reasonable backing (SQLite-backed tables) and no
//! test double needs to stand in for a filesystem or process boundary.

pub mod artifact_store;
pub mod memory_store;

pub use artifact_store::{ArtifactStore, CreateArtifactOptions};
pub use memory_store::{MemoryStore, ReadOptions};
