//! Metrics collection for `scopecfg`.
//!
//! Prometheus-compatible counters for documents loaded and validation
//! issues found. Nothing is exported over the network: `validate
//! --metrics-out` renders the registry to a text file for a node exporter's
//! textfile collector.

use std::path::Path;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{ScopeError, ValidationIssue};

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Handle used to render the installed recorder.
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initializes the global metrics recorder.
///
/// Calling this more than once is a no-op.
///
/// # Errors
///
/// Returns `ScopeError::Metrics` if the recorder cannot be installed, for
/// example because another global recorder is already set.
pub fn init_metrics() -> Result<(), ScopeError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ScopeError::Metrics(e.to_string()))?;
    let _ = HANDLE.set(handle);

    describe_metrics();
    Ok(())
}

/// Registers metric descriptions with the global recorder.
fn describe_metrics() {
    describe_counter!(
        "scopecfg_documents_loaded_total",
        "Total number of configuration documents loaded"
    );
    describe_counter!(
        "scopecfg_validation_issues_total",
        "Total number of validation issues by kind and severity"
    );
}

/// Records documents merged by one load.
pub fn record_documents_loaded(count: usize) {
    counter!("scopecfg_documents_loaded_total").increment(u64::try_from(count).unwrap_or(u64::MAX));
}

/// Records one validation issue.
///
/// Labels come from closed enums, so cardinality is bounded.
pub fn record_validation_issue(issue: &ValidationIssue) {
    counter!(
        "scopecfg_validation_issues_total",
        "kind" => issue.kind.as_str(),
        "severity" => issue.severity.as_str()
    )
    .increment(1);
}

/// Renders the installed recorder in Prometheus text format.
///
/// Returns `None` if [`init_metrics`] has not run.
#[must_use]
pub fn render() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

/// Writes the Prometheus text rendering to `path`.
///
/// # Errors
///
/// Returns `ScopeError::Metrics` if metrics were never initialized and
/// `ScopeError::Io` if the file cannot be written.
pub fn write_metrics(path: &Path) -> Result<(), ScopeError> {
    let text = render().ok_or_else(|| ScopeError::Metrics("recorder not installed".to_string()))?;
    std::fs::write(path, text)?;
    tracing::debug!(path = %path.display(), "metrics written");
    Ok(())
}
