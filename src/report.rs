//! Reporting of skipped records and other non-fatal conditions.
//!
//! Adapters and the pipeline driver never log through a global; they are
//! handed a [`Reporter`]. [`TracingReporter`] forwards to `tracing` and is the
//! default everywhere. [`MemoryReporter`] keeps the messages, which is what
//! tests use to check that a dropped record was reported.

use std::sync::{Arc, Mutex};

/// How serious a reported condition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Sink for progress and skip-record messages.
pub trait Reporter: Send + Sync {
    /// Records one message about `source` (an adapter or file name).
    fn report(&self, severity: Severity, source: &str, message: &str);

    fn debug(&self, source: &str, message: &str) {
        self.report(Severity::Debug, source, message);
    }

    fn info(&self, source: &str, message: &str) {
        self.report(Severity::Info, source, message);
    }

    fn warn(&self, source: &str, message: &str) {
        self.report(Severity::Warning, source, message);
    }

    fn error(&self, source: &str, message: &str) {
        self.report(Severity::Error, source, message);
    }
}

/// Forwards every message to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, severity: Severity, source: &str, message: &str) {
        match severity {
            Severity::Debug => tracing::debug!(source = %source, "{message}"),
            Severity::Info => tracing::info!(source = %source, "{message}"),
            Severity::Warning => tracing::warn!(source = %source, "{message}"),
            Severity::Error => tracing::error!(source = %source, "{message}"),
        }
    }
}

/// A reported message, as kept by [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub source: String,
    pub message: String,
}

/// Keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    reports: Mutex<Vec<Report>>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Everything reported so far.
    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }

    /// Messages reported at exactly `severity`.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.reports()
            .into_iter()
            .filter(|r| r.severity == severity)
            .map(|r| r.message)
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, severity: Severity, source: &str, message: &str) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(Report {
                severity,
                source: source.to_string(),
                message: message.to_string(),
            });
        }
    }
}

/// The reporter adapters fall back to when none is injected.
pub(crate) fn default_reporter() -> Arc<dyn Reporter> {
    Arc::new(TracingReporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_reporter_filters_by_severity() {
        let reporter = MemoryReporter::new();
        reporter.info("phaidra", "Reading file");
        reporter.error("phaidra", "No creator for 'Untitled'");
        reporter.warn("pipeline", "No adapter");

        assert_eq!(reporter.reports().len(), 3);
        assert_eq!(
            reporter.messages(Severity::Error),
            vec!["No creator for 'Untitled'".to_string()]
        );
        assert_eq!(reporter.reports()[2].source, "pipeline");
    }
}
