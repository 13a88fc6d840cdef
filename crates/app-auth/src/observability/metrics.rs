//! Metrics definitions for app authentication.
//!
//! All metrics follow Prometheus naming conventions:
//! - `app_auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `outcome`: valid, absent, expired, error
//! - `status`: hit, miss, coalesced (cache); success, error (loads and remote calls)
//! - `result`: match, mismatch, unknown (pair confirmations);
//!   match, mismatch, skipped, error (pod identity checks)
//! - `operation`: get_certificate, authenticate, get_app_token, get_pod_info
//!
//! Config ids and application ids are deliberately NOT labels.

use metrics::{counter, histogram};
use std::time::Duration;

// ============================================================================
// Token Metrics
// ============================================================================

/// Record a user JWT validation outcome
///
/// Metric: `app_auth_token_validations_total`
/// Labels: `outcome`
pub fn record_token_validation(outcome: &str) {
    counter!("app_auth_token_validations_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a token pair confirmation result
///
/// Metric: `app_auth_token_pair_confirmations_total`
/// Labels: `result`
pub fn record_token_pair_confirmation(result: &str) {
    counter!("app_auth_token_pair_confirmations_total", "result" => result.to_string())
        .increment(1);
}

// ============================================================================
// Certificate Cache Metrics
// ============================================================================

/// Record a certificate cache lookup
///
/// Metric: `app_auth_certificate_cache_total`
/// Labels: `status` (hit, miss, coalesced)
pub fn record_certificate_cache(status: &str) {
    counter!("app_auth_certificate_cache_total", "status" => status.to_string()).increment(1);
}

/// Record a certificate load (fetch + decode) performed by a cache leader
///
/// Metric: `app_auth_certificate_load_duration_seconds`, `app_auth_certificate_loads_total`
/// Labels: `status`
pub fn record_certificate_load(status: &str, duration: Duration) {
    histogram!("app_auth_certificate_load_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("app_auth_certificate_loads_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Pod Identity Metrics
// ============================================================================

/// Record a pod identity check result
///
/// Metric: `app_auth_pod_identity_checks_total`
/// Labels: `result`
pub fn record_pod_identity_check(result: &str) {
    counter!("app_auth_pod_identity_checks_total", "result" => result.to_string()).increment(1);
}

// ============================================================================
// Remote Call Metrics
// ============================================================================

/// Record a pod API call
///
/// Metric: `app_auth_remote_call_duration_seconds`, `app_auth_remote_calls_total`
/// Labels: `operation`, `status`
pub fn record_remote_call(operation: &str, status: &str, duration: Duration) {
    histogram!("app_auth_remote_call_duration_seconds",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("app_auth_remote_calls_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use metrics_util::MetricKind;

    fn counter_value(
        snapshot: &[(
            metrics_util::CompositeKey,
            Option<metrics::Unit>,
            Option<metrics::SharedString>,
            DebugValue,
        )],
        name: &str,
        label: (&str, &str),
    ) -> Option<u64> {
        snapshot.iter().find_map(|(key, _, _, value)| {
            let matches = key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label.0 && l.value() == label.1);
            match (matches, value) {
                (true, DebugValue::Counter(v)) => Some(*v),
                _ => None,
            }
        })
    }

    #[test]
    fn test_token_validation_counter() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_token_validation("valid");
            record_token_validation("valid");
            record_token_validation("absent");
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(
            counter_value(
                &snapshot,
                "app_auth_token_validations_total",
                ("outcome", "valid")
            ),
            Some(2)
        );
        assert_eq!(
            counter_value(
                &snapshot,
                "app_auth_token_validations_total",
                ("outcome", "absent")
            ),
            Some(1)
        );
    }

    #[test]
    fn test_certificate_load_records_histogram_and_counter() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_certificate_load("success", Duration::from_millis(12));
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert!(snapshot.iter().any(|(key, _, _, _)| {
            key.kind() == MetricKind::Histogram
                && key.key().name() == "app_auth_certificate_load_duration_seconds"
        }));
        assert_eq!(
            counter_value(
                &snapshot,
                "app_auth_certificate_loads_total",
                ("status", "success")
            ),
            Some(1)
        );
    }

    #[test]
    fn test_all_metric_functions_callable() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_token_pair_confirmation("match");
            record_certificate_cache("hit");
            record_pod_identity_check("skipped");
            record_remote_call("get_pod_info", "success", Duration::from_millis(5));
        });

        let snapshot = snapshotter.snapshot().into_vec();
        assert!(
            snapshot.len() >= 5,
            "expected at least 5 series, got {}",
            snapshot.len()
        );
    }
}
