//! Dispatch strategies.
//!
//! [`DirectSend`] hands each request to the provider in one call.
//! [`FanOutFanIn`] splits it into batches across the sender pool and
//! aggregates per-device outcomes into one result.

use std::sync::Arc;
use std::time::Duration;

use push_core::{
    AdmissionError, AggregatedResult, DeviceOutcome, DirectResult, ReasonKind, Request, RequestId,
};
use tokio::sync::{Semaphore, mpsc, oneshot};

use crate::channel::Sender;
use crate::{Aggregator, BatchProvider, Classifier, DirectProvider, EngineConfig, split_devices};

/// Queues a request is submitted into.
pub struct Admission<'a, U, O> {
    pub request_id: RequestId,
    /// Admission queue feeding the sender pool.
    pub units: &'a Sender<U>,
    /// Result sink read by the caller.
    pub sink: &'a Sender<O>,
    /// Sender pool size.
    pub senders: usize,
}

/// How requests become work units and work units become results.
#[trait_variant::make(Send)]
pub trait Dispatch: Send + Sync + 'static {
    type Unit: Send + 'static;
    type Output: Send + 'static;

    /// Encode a validated request and queue its work units.
    async fn submit(
        &self,
        request: Request,
        admission: Admission<'_, Self::Unit, Self::Output>,
    ) -> Result<(), AdmissionError>;

    /// Run one unit on a pool worker.
    async fn process(&self, unit: Self::Unit, sink: &Sender<Self::Output>);
}

/// A whole request sent in one provider call.
pub struct DirectJob<M> {
    pub request_id: RequestId,
    pub message: M,
    pub extra: serde_json::Value,
}

/// One provider call per request; raw responses go straight to the sink.
pub struct DirectSend<P> {
    provider: P,
}

impl<P: DirectProvider> DirectSend<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: DirectProvider> Dispatch for DirectSend<P> {
    type Unit = DirectJob<P::Message>;
    type Output = DirectResult<P::Response>;

    async fn submit(
        &self,
        request: Request,
        admission: Admission<'_, Self::Unit, Self::Output>,
    ) -> Result<(), AdmissionError> {
        let message = self.provider.encode(&request)?;
        let job = DirectJob {
            request_id: admission.request_id,
            message,
            extra: request.extra,
        };

        admission
            .units
            .send(job)
            .await
            .map_err(|_| AdmissionError::Closed)
    }

    async fn process(&self, unit: Self::Unit, sink: &Sender<Self::Output>) {
        let DirectJob {
            request_id,
            message,
            extra,
        } = unit;

        match self.provider.send(&message).await {
            Ok(response) => {
                let result = DirectResult {
                    request_id,
                    response,
                    extra,
                };
                if sink.send(result).await.is_err() {
                    tracing::debug!(%request_id, "result sink closed, response discarded");
                }
            }
            Err(e) => {
                tracing::error!(%request_id, error = %e, "send failed, dropping request");
            }
        }
    }
}

/// One provider batch of a request.
pub struct WorkUnit<M, E> {
    pub request_id: RequestId,
    pub tokens: Vec<String>,
    pub message: Arc<M>,
    /// The request's private response channel.
    pub responses: mpsc::Sender<DeviceOutcome<E>>,
}

/// Batched fan-out over the sender pool with per-request aggregation.
pub struct FanOutFanIn<P: BatchProvider> {
    provider: P,
    classify: Classifier<P::Error>,
    in_flight: Arc<Semaphore>,
    deadline: Option<Duration>,
    response_buffer: usize,
}

impl<P: BatchProvider> FanOutFanIn<P> {
    /// Create a strategy using the provider's own error classification.
    pub fn new(provider: P, config: &EngineConfig) -> Self {
        Self {
            provider,
            classify: Arc::new(|e: &P::Error| P::classify(e)),
            in_flight: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            deadline: config.aggregation_timeout(),
            response_buffer: config.response_buffer.max(1),
        }
    }

    /// Replace the error classifier.
    pub fn with_classifier<F>(mut self, classify: F) -> Self
    where
        F: Fn(&P::Error) -> ReasonKind + Send + Sync + 'static,
    {
        self.classify = Arc::new(classify);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Requests that can still be admitted before `queue` waits.
    pub fn available_slots(&self) -> usize {
        self.in_flight.available_permits()
    }
}

impl<P: BatchProvider> Dispatch for FanOutFanIn<P> {
    type Unit = WorkUnit<P::Message, P::Error>;
    type Output = AggregatedResult;

    async fn submit(
        &self,
        request: Request,
        admission: Admission<'_, Self::Unit, Self::Output>,
    ) -> Result<(), AdmissionError> {
        let request_id = admission.request_id;
        let message = Arc::new(self.provider.encode(&request)?);

        // Released when the aggregator exits.
        let permit = Arc::clone(&self.in_flight)
            .acquire_owned()
            .await
            .map_err(|_| AdmissionError::Closed)?;

        let groups = split_devices(&request.devices, admission.senders);
        let (responses, outcomes) = mpsc::channel(self.response_buffer);
        let aggregator = Aggregator::new(
            request_id,
            request.devices.len(),
            request.extra,
            Arc::clone(&self.classify),
        );

        let sink = admission.sink.clone();
        let deadline = self.deadline;
        let (admit, admitted) = oneshot::channel();
        tokio::spawn(async move {
            let _permit = permit;
            aggregator.run(outcomes, sink, deadline, admitted).await;
        });

        tracing::debug!(
            %request_id,
            devices = request.devices.len(),
            batches = groups.len(),
            "fanning out request"
        );

        for tokens in groups {
            let unit = WorkUnit {
                request_id,
                tokens,
                message: Arc::clone(&message),
                responses: responses.clone(),
            };
            admission
                .units
                .send(unit)
                .await
                .map_err(|_| AdmissionError::Closed)?;
        }

        // Start the aggregation deadline.
        let _ = admit.send(());
        Ok(())
    }

    async fn process(&self, unit: Self::Unit, _sink: &Sender<Self::Output>) {
        let WorkUnit {
            request_id,
            tokens,
            message,
            responses,
        } = unit;

        match self.provider.send_batch(&tokens, &message).await {
            Ok(outcomes) => {
                for outcome in outcomes {
                    if responses.send(outcome).await.is_err() {
                        tracing::debug!(%request_id, "aggregator finished, dropping outcomes");
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::error!(
                    %request_id,
                    devices = tokens.len(),
                    error = %e,
                    "batch send failed, dropping unit"
                );
            }
        }
    }
}
