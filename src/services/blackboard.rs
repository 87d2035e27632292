//! Blackboard hints (component A): a thin pattern-match surface over the
//! memory store's `post_hint`/`read_hints`.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::error::DomainResult;
use crate::domain::models::Hint;
use crate::domain::ports::memory_store::MemoryStore;

pub struct Blackboard {
    store: Arc<dyn MemoryStore>,
}

impl Blackboard {
    #[must_use]
    pub const fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    pub async fn post_hint(&self, key: &str, value: Value, ttl_secs: Option<i64>) -> DomainResult<Hint> {
        self.store.post_hint(key, value, ttl_secs).await
    }

    pub async fn read_hints(&self, pattern: &str) -> DomainResult<Vec<Hint>> {
        self.store.read_hints(pattern).await
    }
}
