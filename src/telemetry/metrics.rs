//! Prometheus metrics setup and metric definitions

use anyhow::Context;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const RESOLUTIONS_TOTAL: &str = "casedb_abac_resolutions_total";
pub const RESOLUTION_DURATION_SECONDS: &str = "casedb_abac_resolution_duration_seconds";
pub const CACHE_REQUESTS_TOTAL: &str = "casedb_abac_cache_requests_total";
pub const CACHE_INVALIDATIONS_TOTAL: &str = "casedb_abac_cache_invalidations_total";
pub const POLICY_OPERATIONS_TOTAL: &str = "casedb_abac_policy_operations_total";

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    // Resolutions are in-process and mostly served from cache, so the
    // buckets start well below a millisecond.
    let buckets = vec![
        0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus output
/// includes HELP/TYPE lines for all metrics from startup (not just after first use).
pub fn describe_metrics() {
    describe_counter!(
        RESOLUTIONS_TOTAL,
        "Case ABAC resolutions by outcome (full_access/resolved/cached/error)"
    );
    describe_histogram!(
        RESOLUTION_DURATION_SECONDS,
        "Case ABAC resolution duration in seconds, cache lookups included"
    );
    describe_counter!(
        CACHE_REQUESTS_TOTAL,
        "Snapshot cache lookups by cache and result (hit/miss)"
    );
    describe_counter!(
        CACHE_INVALIDATIONS_TOTAL,
        "Snapshot cache invalidations by triggering mutation"
    );
    describe_counter!(
        POLICY_OPERATIONS_TOTAL,
        "Case policy CRUD and transfer operations"
    );

    counter!(RESOLUTIONS_TOTAL, "outcome" => "resolved").absolute(0);
    histogram!(RESOLUTION_DURATION_SECONDS).record(0.0);
    counter!(CACHE_REQUESTS_TOTAL, "cache" => "case_abac", "result" => "hit").absolute(0);
    counter!(CACHE_INVALIDATIONS_TOTAL, "reason" => "user_organization_transfer").absolute(0);
    counter!(POLICY_OPERATIONS_TOTAL, "operation" => "create", "result" => "success").absolute(0);
}
