//! Telemetry spans (component H): thin wrappers producing tracing spans
//! around memory operations, matching the attribute set every memory
//! operation is required to record (§6).

use tracing::Span;

/// Opens a span for a single memory operation with the fixed attribute set.
/// `value_size` is unknown until the operation actually reads or writes a
/// value, so it starts empty and is filled in via `record_value_size`.
#[must_use]
pub fn memory_operation_span(operation: &str, agent_id: &str, namespace: &str, key: &str) -> Span {
    tracing::info_span!(
        "memory_operation",
        operation = %operation,
        agent_id = %agent_id,
        namespace = %namespace,
        key = %key,
        value_size = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
        success = tracing::field::Empty,
    )
}

pub fn record_value_size(span: &Span, size: usize) {
    span.record("value_size", size);
}

pub fn record_outcome(span: &Span, duration_ms: u64, success: bool) {
    span.record("duration_ms", duration_ms);
    span.record("success", success);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_records_outcome_without_panicking() {
        let span = memory_operation_span("store", "agent-1", "coordination", "routing/costs");
        let _entered = span.enter();
        record_value_size(&span, 128);
        record_outcome(&span, 4, true);
    }
}
