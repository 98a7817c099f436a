//! Structured tracing helpers shared by the resolver and the cache

use std::time::Instant;

/// Logs how long a resolution took when dropped
pub struct Timer {
    start: Instant,
    operation: &'static str,
    kind: &'static str,
}

impl Timer {
    pub fn new(operation: &'static str, kind: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
            kind,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis() as u64;
        tracing::debug!(
            operation = self.operation,
            kind = self.kind,
            duration_ms = duration_ms,
            "Operation completed"
        );
    }
}

/// Log an error that is intentionally not propagated to the caller
pub fn log_discarded(operation: &str, error: &impl std::error::Error) {
    tracing::warn!(
        operation = %operation,
        error = %error,
        error_kind = std::any::type_name_of_val(error),
        "Best-effort operation failed, error discarded"
    );
}
