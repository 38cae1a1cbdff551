//! Execution reports.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use memgauge_core::{MemoryKind, MemoryTotals, MeteringError};

use crate::metrics::MetricsSnapshot;

/// Unique identifier for an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    /// Create a new random execution ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Execution completed successfully.
    Success,
    /// Execution was aborted by memory metering.
    ResourceExhausted {
        /// Kind of the usage that was rejected, if known.
        kind: Option<MemoryKind>,
        /// Total recorded when the run was aborted.
        used: u64,
        /// The limit.
        limit: u64,
        /// Description of the violation.
        reason: String,
    },
    /// Execution failed for a reason unrelated to metering.
    Error {
        /// Error message.
        message: String,
    },
}

impl ExecutionOutcome {
    /// Build the outcome for a metering violation.
    pub fn exhausted(error: &MeteringError, totals: &MemoryTotals) -> Self {
        ExecutionOutcome::ResourceExhausted {
            kind: error.kind(),
            used: totals.total,
            limit: totals.limit,
            reason: error.to_string(),
        }
    }

    /// Check if the outcome is successful.
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success)
    }

    /// Check if the outcome is a failure.
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

/// A diagnostic message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level.
    pub level: DiagnosticLevel,
    /// Message.
    pub message: String,
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    /// Informational.
    Info,
    /// Warning.
    Warning,
    /// Error.
    Error,
}

/// Complete report of one metered execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Unique execution ID.
    pub execution_id: ExecutionId,
    /// Name of the script or transaction.
    pub name: String,
    /// Execution outcome.
    pub outcome: ExecutionOutcome,
    /// Memory totals at the end of the run.
    pub totals: MemoryTotals,
    /// Collected metrics.
    pub metrics: MetricsSnapshot,
    /// Diagnostic messages.
    pub diagnostics: Vec<Diagnostic>,
}

impl ExecutionReport {
    /// Create a new execution report.
    pub fn new(
        name: impl Into<String>,
        outcome: ExecutionOutcome,
        totals: MemoryTotals,
        metrics: MetricsSnapshot,
    ) -> Self {
        Self {
            execution_id: ExecutionId::new(),
            name: name.into(),
            outcome,
            totals,
            metrics,
            diagnostics: Vec::new(),
        }
    }

    /// Add a diagnostic message.
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add an info diagnostic.
    pub fn add_info(&mut self, message: impl Into<String>) {
        self.push(DiagnosticLevel::Info, message.into());
    }

    /// Add a warning diagnostic.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.push(DiagnosticLevel::Warning, message.into());
    }

    /// Add an error diagnostic.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.push(DiagnosticLevel::Error, message.into());
    }

    fn push(&mut self, level: DiagnosticLevel, message: String) {
        self.diagnostics.push(Diagnostic { level, message });
    }

    /// Check if execution was successful.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Execution Report: {}\n", self.execution_id));
        output.push_str(&format!("Name: {}\n\n", self.name));

        output.push_str("Outcome: ");
        match &self.outcome {
            ExecutionOutcome::Success => output.push_str("Success\n"),
            ExecutionOutcome::ResourceExhausted {
                kind,
                used,
                limit,
                reason,
            } => {
                let kind = kind.map(|k| k.as_str()).unwrap_or("-");
                output.push_str(&format!(
                    "Resource Exhausted: {} ({} / {}, kind {})\n",
                    reason, used, limit, kind
                ));
            }
            ExecutionOutcome::Error { message } => {
                output.push_str(&format!("Error: {}\n", message));
            }
        }

        output.push_str("\nMemory:\n");
        output.push_str(&format!(
            "  Total: {} / {} units ({:.1}%)\n",
            self.totals.total,
            self.totals.limit,
            self.totals.utilization_percent()
        ));
        output.push_str(&format!("  Records: {}\n", self.totals.records));
        for (kind, amount) in &self.totals.per_kind {
            output.push_str(&format!("  {:<18} {}\n", kind.as_str(), amount));
        }
        output.push_str(&format!(
            "  Execution Time: {:?}\n",
            self.metrics.timing.execution_time
        ));

        if !self.diagnostics.is_empty() {
            output.push_str("\nDiagnostics:\n");
            for diag in &self.diagnostics {
                let level = match diag.level {
                    DiagnosticLevel::Info => "INFO",
                    DiagnosticLevel::Warning => "WARN",
                    DiagnosticLevel::Error => "ERROR",
                };
                output.push_str(&format!("  [{}] {}\n", level, diag.message));
            }
        }

        output
    }

    /// Format as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Format as pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsCollector;

    fn totals(total: u64, limit: u64) -> MemoryTotals {
        let mut totals = MemoryTotals {
            total,
            limit,
            records: 1,
            ..Default::default()
        };
        totals.per_kind.insert(MemoryKind::String, total);
        totals
    }

    #[test]
    fn test_execution_id() {
        assert_ne!(ExecutionId::new(), ExecutionId::new());
    }

    #[test]
    fn test_exhausted_outcome() {
        let error = MeteringError::LimitExceeded {
            kind: MemoryKind::String,
            used: 90,
            requested: 20,
            limit: 100,
        };
        let outcome = ExecutionOutcome::exhausted(&error, &totals(90, 100));
        assert!(outcome.is_failure());
        match outcome {
            ExecutionOutcome::ResourceExhausted { kind, used, limit, .. } => {
                assert_eq!(kind, Some(MemoryKind::String));
                assert_eq!(used, 90);
                assert_eq!(limit, 100);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_execution_report_diagnostics() {
        let mut report = ExecutionReport::new(
            "script",
            ExecutionOutcome::Success,
            totals(5, 10),
            MetricsCollector::new().snapshot(),
        );

        report.add_info("Test info");
        report.add_warning("Test warning");

        assert_eq!(report.diagnostics.len(), 2);
        assert!(report.is_success());
        assert_eq!(
            report.to_json()["outcome"],
            serde_json::json!({ "status": "success" })
        );
    }

    #[test]
    fn test_execution_report_to_text() {
        let report = ExecutionReport::new(
            "transfer",
            ExecutionOutcome::Success,
            totals(5, 10),
            MetricsCollector::new().snapshot(),
        );

        let text = report.to_text();
        assert!(text.contains("transfer"));
        assert!(text.contains("Success"));
        assert!(text.contains("string"));
        assert!(text.contains("50.0%"));
    }

    #[test]
    fn test_execution_report_to_json() {
        let report = ExecutionReport::new(
            "script",
            ExecutionOutcome::Error {
                message: "division by zero".to_string(),
            },
            totals(3, 10),
            MetricsCollector::new().snapshot(),
        );

        let json = report.to_json();
        assert_eq!(json["outcome"]["status"], "error");
        assert_eq!(json["diagnostics"], serde_json::json!([]));
        assert_eq!(json["totals"]["per_kind"]["string"], 3);
        assert!(report.to_json_pretty().contains("division by zero"));
    }
}
