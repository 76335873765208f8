//! Result reporting.
//!
//! Drains a service's result sink and logs every result. Tokens the
//! provider reported as invalid are logged individually so operators can
//! purge them.

use push_core::{AggregatedResult, DirectResult};
use push_engine::channel::Receiver;
use push_fcm::FcmReport;

/// Log aggregated results until the sink closes.
pub async fn aggregated(provider: &'static str, results: Receiver<AggregatedResult>) {
    while let Some(result) = results.recv().await {
        log_aggregated(provider, &result);
    }
}

fn log_aggregated(provider: &'static str, result: &AggregatedResult) {
    if result.partial {
        tracing::warn!(
            provider,
            request_id = %result.request_id,
            total = result.total,
            received = result.received,
            missing = result.missing(),
            "push finished with missing devices"
        );
    }

    tracing::info!(
        provider,
        request_id = %result.request_id,
        total = result.total,
        success = result.success,
        failure = result.failure,
        partial = result.partial,
        reasons = ?result.reasons,
        extra = %result.extra,
        "push completed"
    );

    for token in &result.invalid_tokens {
        tracing::info!(provider, request_id = %result.request_id, token, "device token expired");
    }
}

/// Log FCM responses until the sink closes.
pub async fn fcm(results: Receiver<DirectResult<FcmReport>>) {
    while let Some(result) = results.recv().await {
        log_fcm(&result);
    }
}

fn log_fcm(result: &DirectResult<FcmReport>) {
    let DirectResult {
        request_id,
        response: report,
        extra,
    } = result;
    let response = &report.response;

    tracing::info!(
        provider = "fcm",
        %request_id,
        multicast_id = response.multicast_id,
        success = response.success,
        failure = response.failure,
        canonical_ids = response.canonical_ids,
        extra = %extra,
        "push completed"
    );

    for (token, error) in report.invalid_tokens() {
        tracing::info!(provider = "fcm", %request_id, token, error, "device token expired");
    }
    for (token, canonical) in report.canonical_updates() {
        tracing::info!(provider = "fcm", %request_id, token, canonical, "device token replaced");
    }
}
