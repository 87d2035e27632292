//! Task complexity classification (component F): a keyword-and-context
//! classifier over a task description.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
    Critical,
}

impl Complexity {
    #[must_use]
    pub const fn downgrade(self) -> Self {
        match self {
            Self::Critical => Self::Complex,
            Self::Complex => Self::Moderate,
            Self::Moderate | Self::Simple => Self::Simple,
        }
    }
}

const CRITICAL_KEYWORDS: &[&str] = &["security", "production", "critical", "payment", "auth", "compliance"];
const COMPLEX_KEYWORDS: &[&str] = &["integration", "concurrency", "distributed", "migration", "performance", "async"];
const MODERATE_KEYWORDS: &[&str] = &["refactor", "edge case", "regression", "multi-step", "workflow"];

/// Classifies `description` by keyword presence, checked from the most
/// severe bucket down, so a description mentioning both a critical and a
/// moderate keyword classifies as critical.
#[must_use]
pub fn classify(description: &str) -> Complexity {
    let lower = description.to_lowercase();

    if CRITICAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Complexity::Critical
    } else if COMPLEX_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Complexity::Complex
    } else if MODERATE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        Complexity::Moderate
    } else {
        Complexity::Simple
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_keyword_classifies_as_critical() {
        assert_eq!(classify("audit the payment authorization flow"), Complexity::Critical);
    }

    #[test]
    fn integration_keyword_classifies_as_complex() {
        assert_eq!(classify("write an integration test for the queue consumer"), Complexity::Complex);
    }

    #[test]
    fn plain_description_classifies_as_simple() {
        assert_eq!(classify("add a unit test for the add function"), Complexity::Simple);
    }

    #[test]
    fn downgrade_steps_down_one_level() {
        assert_eq!(Complexity::Critical.downgrade(), Complexity::Complex);
        assert_eq!(Complexity::Simple.downgrade(), Complexity::Simple);
    }
}
