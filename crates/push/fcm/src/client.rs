//! FCM HTTP client.

use std::time::Duration;

use push_core::{AdmissionError, DeliveryMode, Request, TransportError};
use push_engine::{DirectProvider, Provider};

use crate::{FcmMessage, FcmReport, FcmResponse, FcmResult};

/// Legacy HTTP send endpoint.
pub const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(1024);

/// FCM client authenticated with a server key.
pub struct FcmClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    mode: DeliveryMode,
    retry_count: u32,
    initial_backoff: Duration,
}

impl FcmClient {
    /// Create a client. `retry_count` bounds resends of unavailable devices
    /// and failed calls.
    pub fn new(api_key: impl Into<String>, retry_count: u32, mode: DeliveryMode) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: FCM_SEND_URL.to_string(),
            mode,
            retry_count,
            initial_backoff: INITIAL_BACKOFF,
        }
    }

    /// Send to a different URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Delay before the first retry; doubles on each further retry.
    pub fn with_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    /// One HTTP call, no retries.
    async fn post(&self, message: &FcmMessage) -> Result<FcmResponse, TransportError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("key={}", self.api_key))
            .json(message)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                code: status.as_u16(),
                body,
            });
        }

        response
            .json::<FcmResponse>()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

/// Connection failures and server errors are worth another attempt.
fn is_retryable(error: &TransportError) -> bool {
    match error {
        TransportError::Http(_) => true,
        TransportError::Status { code, .. } => *code >= 500,
        _ => false,
    }
}

impl Provider for FcmClient {
    type Message = FcmMessage;

    fn encode(&self, request: &Request) -> Result<FcmMessage, AdmissionError> {
        FcmMessage::encode(request, self.mode)
    }
}

impl DirectProvider for FcmClient {
    type Response = FcmReport;

    /// Send, then resend devices reported `Unavailable` with exponential
    /// backoff until they succeed or the retry budget is spent.
    async fn send(&self, message: &FcmMessage) -> Result<FcmReport, TransportError> {
        let total = message.registration_ids.len();
        let mut results: Vec<Option<FcmResult>> = vec![None; total];
        let mut pending: Vec<usize> = (0..total).collect();
        let mut multicast_id = 0;
        let mut backoff = self.initial_backoff;
        let mut last_error = None;

        for attempt in 0..=self.retry_count {
            if attempt > 0 {
                tracing::debug!(
                    attempt,
                    pending = pending.len(),
                    backoff_ms = backoff.as_millis() as u64,
                    "retrying fcm send"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }

            let batch = message.with_devices(
                pending
                    .iter()
                    .map(|&i| message.registration_ids[i].clone())
                    .collect(),
            );

            let response = match self.post(&batch).await {
                Ok(response) => response,
                Err(e) if is_retryable(&e) => {
                    tracing::warn!(attempt, error = %e, "fcm send failed");
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if response.results.len() != pending.len() {
                return Err(TransportError::InvalidResponse(format!(
                    "expected {} results, got {}",
                    pending.len(),
                    response.results.len()
                )));
            }

            multicast_id = response.multicast_id;
            last_error = None;

            let mut unavailable = Vec::new();
            for (&index, result) in pending.iter().zip(response.results) {
                if result.is_unavailable() {
                    unavailable.push(index);
                }
                results[index] = Some(result);
            }

            pending = unavailable;
            if pending.is_empty() {
                break;
            }
        }

        // Every attempt failed before any device got a result.
        if results.iter().any(Option::is_none) {
            let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
            return Err(TransportError::Unavailable {
                attempts: self.retry_count + 1,
                reason,
            });
        }

        let results = results.into_iter().flatten().collect();
        Ok(FcmReport {
            registration_ids: message.registration_ids.clone(),
            response: FcmResponse::from_results(multicast_id, results),
        })
    }
}
