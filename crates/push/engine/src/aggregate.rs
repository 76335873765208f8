//! Per-request response aggregation.

use std::sync::Arc;
use std::time::Duration;

use push_core::{AggregatedResult, DeviceOutcome, ReasonKind, RequestId};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::channel::Sender;

/// Maps a provider's per-device error to a histogram key.
pub type Classifier<E> = Arc<dyn Fn(&E) -> ReasonKind + Send + Sync>;

/// Aggregation progress after counting an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Accumulating,
    /// Every expected outcome has been counted.
    Complete,
}

/// Accumulates the outcomes of one request and publishes a single result.
///
/// The aggregator is the only reader of its request's response channel, so
/// counting needs no locking. Publishing consumes it.
pub struct Aggregator<E> {
    result: AggregatedResult,
    classify: Classifier<E>,
}

impl<E> Aggregator<E> {
    /// Create an aggregator expecting `total` outcomes.
    pub fn new(
        request_id: RequestId,
        total: usize,
        extra: serde_json::Value,
        classify: Classifier<E>,
    ) -> Self {
        Self {
            result: AggregatedResult::new(request_id, total, extra),
            classify,
        }
    }

    /// Count one outcome.
    pub fn record(&mut self, outcome: DeviceOutcome<E>) -> Progress {
        if self.result.is_complete() {
            tracing::warn!(
                request_id = %self.result.request_id,
                token = %outcome.token,
                "outcome after completion ignored"
            );
            return Progress::Complete;
        }

        let result = &mut self.result;
        result.received += 1;

        match outcome.result {
            Ok(()) => result.success += 1,
            Err(error) => {
                result.failure += 1;
                let reason = (self.classify)(&error);
                if reason == ReasonKind::PermanentlyInvalidToken {
                    result.invalid_tokens.push(outcome.token);
                }
                *result.reasons.entry(reason).or_insert(0) += 1;
            }
        }

        if result.is_complete() {
            Progress::Complete
        } else {
            Progress::Accumulating
        }
    }

    /// Current counts.
    pub fn result(&self) -> &AggregatedResult {
        &self.result
    }

    /// Finish aggregation, marking the result partial if outcomes are missing.
    pub fn finish(self) -> AggregatedResult {
        let mut result = self.result;
        result.partial = !result.is_complete();
        result
    }

    /// Consume outcomes until the request is complete, then publish.
    ///
    /// The `deadline` starts once `admitted` fires (or its sender is
    /// dropped), so time spent waiting for admission queue slots does not
    /// count against it. With a deadline, a partial result is published
    /// when it expires or when every batch has finished without reporting
    /// all devices. Without one, an incomplete request publishes nothing.
    pub async fn run(
        mut self,
        mut outcomes: mpsc::Receiver<DeviceOutcome<E>>,
        sink: Sender<AggregatedResult>,
        deadline: Option<Duration>,
        mut admitted: oneshot::Receiver<()>,
    ) {
        let request_id = self.result.request_id;
        let mut admitting = true;
        let mut expires = None;

        loop {
            let next = tokio::select! {
                _ = &mut admitted, if admitting => {
                    admitting = false;
                    expires = deadline.map(|d| Instant::now() + d);
                    continue;
                }
                _ = expiry(expires) => {
                    tracing::warn!(
                        %request_id,
                        received = self.result.received,
                        total = self.result.total,
                        "aggregation deadline expired"
                    );
                    break;
                }
                next = outcomes.recv() => next,
            };

            match next {
                Some(outcome) => {
                    if self.record(outcome) == Progress::Complete {
                        break;
                    }
                }
                None if deadline.is_some() => {
                    tracing::warn!(
                        %request_id,
                        missing = self.result.missing(),
                        "batches finished without reporting every device"
                    );
                    break;
                }
                None => {
                    tracing::error!(
                        %request_id,
                        missing = self.result.missing(),
                        "batches finished without reporting every device, no result published"
                    );
                    return;
                }
            }
        }

        let result = self.finish();
        tracing::debug!(
            %request_id,
            success = result.success,
            failure = result.failure,
            partial = result.partial,
            "publishing result"
        );
        if sink.send(result).await.is_err() {
            tracing::debug!(%request_id, "result sink closed, result discarded");
        }
    }
}

/// Resolves at `at`, or never.
async fn expiry(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
