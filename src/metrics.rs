//! Prometheus metrics

use crate::models::ModelSource;
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Setup Prometheus metrics exporter
/// Returns a handle that can be used to retrieve metrics
pub fn setup_metrics() -> Result<metrics_exporter_prometheus::PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    tracing::info!("Prometheus metrics exporter installed");

    Ok(handle)
}

fn outcome(success: bool) -> &'static str {
    if success { "success" } else { "failure" }
}

/// Record an install attempt
pub fn record_install(source: ModelSource, success: bool) {
    metrics::counter!("llm_manager_installs_total",
        "source" => source.as_str(),
        "outcome" => outcome(success)
    )
    .increment(1);
}

/// Record an uninstall attempt
pub fn record_uninstall(source: ModelSource, success: bool) {
    metrics::counter!("llm_manager_uninstalls_total",
        "source" => source.as_str(),
        "outcome" => outcome(success)
    )
    .increment(1);
}

/// Record a provider call that failed and was degraded
pub fn record_provider_failure(source: ModelSource, operation: &'static str) {
    metrics::counter!("llm_manager_provider_failures_total",
        "source" => source.as_str(),
        "operation" => operation
    )
    .increment(1);
}

/// Update cached catalog size gauge
pub fn update_catalog_count(count: usize) {
    metrics::gauge!("llm_manager_catalog_models").set(count as f64);
}
