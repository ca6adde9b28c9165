use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::{BootstrapError, FailureKind};
use crate::foundation::BootstrapPhase;

/// Structured report of a failed bootstrap, printed by the host launcher before exiting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    pub run_id: Uuid,
    pub phase: BootstrapPhase,
    pub kind: FailureKind,
    pub component: Option<String>,
    pub message: String,
    /// Error messages from outermost to innermost cause
    pub cause_chain: Vec<String>,
    /// Components released while unwinding, in teardown order
    pub torn_down: Vec<String>,
}

impl FailureReport {
    /// Build a report from the error that stopped the given phase
    pub fn from_error(run_id: Uuid, phase: BootstrapPhase, error: &BootstrapError) -> Self {
        Self {
            run_id,
            phase,
            kind: error.kind(),
            component: error.component().map(|c| c.to_string()),
            message: error.to_string(),
            cause_chain: cause_chain(error),
            torn_down: Vec::new(),
        }
    }

    pub fn with_torn_down(mut self, torn_down: Vec<String>) -> Self {
        self.torn_down = torn_down;
        self
    }

    /// Innermost cause message, which is usually the most useful line for operators
    pub fn root_cause(&self) -> &str {
        self.cause_chain
            .last()
            .map(String::as_str)
            .unwrap_or(&self.message)
    }

    /// Render the report as pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bootstrap failed (run {})", self.run_id)?;
        writeln!(f, "  phase:     {}", self.phase)?;
        writeln!(f, "  kind:      {}", self.kind)?;
        if let Some(component) = &self.component {
            writeln!(f, "  component: {}", component)?;
        }
        writeln!(f, "  error:     {}", self.message)?;
        if self.cause_chain.len() > 1 {
            writeln!(f, "  root cause: {}", self.root_cause())?;
        }
        if !self.torn_down.is_empty() {
            writeln!(f, "  torn down: {}", self.torn_down.join(", "))?;
        }
        Ok(())
    }
}

/// Error returned by a failed bootstrap: the typed error together with its report
#[derive(Debug)]
pub struct BootstrapFailure {
    pub report: FailureReport,
    pub error: BootstrapError,
}

impl BootstrapFailure {
    pub fn new(report: FailureReport, error: BootstrapError) -> Self {
        Self { report, error }
    }

    pub fn kind(&self) -> FailureKind {
        self.report.kind
    }

    pub fn phase(&self) -> BootstrapPhase {
        self.report.phase
    }

    pub fn into_error(self) -> BootstrapError {
        self.error
    }
}

impl fmt::Display for BootstrapFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (during {})", self.error, self.report.phase)
    }
}

impl std::error::Error for BootstrapFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

/// Walk `Error::source` from the outermost error to the innermost cause
pub fn cause_chain(error: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut chain = vec![error.to_string()];
    let mut current = error.source();
    while let Some(cause) = current {
        chain.push(cause.to_string());
        current = cause.source();
    }
    chain
}
