//! Request handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use push_core::{AdmissionError, Request, RequestId};
use push_engine::{Dispatch, Service};

/// Queue response.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct QueueResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Admit a push request. Results are delivered through the service's sink,
/// not in this response.
pub async fn queue_handler<D>(
    State(service): State<Arc<Service<D>>>,
    Json(request): Json<Request>,
) -> impl IntoResponse
where
    D: Dispatch,
{
    match service.queue(request).await {
        Ok(request_id) => (
            StatusCode::ACCEPTED,
            Json(QueueResponse {
                request_id: Some(request_id),
                error: None,
            }),
        ),
        Err(e) => {
            let status = match e {
                AdmissionError::Closed => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (
                status,
                Json(QueueResponse {
                    request_id: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;
    use push_core::TransportError;
    use push_engine::{DirectProvider, DirectSend, EngineConfig, Provider};
    use tower::ServiceExt as _;

    use super::*;

    struct Echo;

    impl Provider for Echo {
        type Message = usize;

        fn encode(&self, request: &Request) -> Result<usize, AdmissionError> {
            Ok(request.devices.len())
        }
    }

    impl DirectProvider for Echo {
        type Response = usize;

        async fn send(&self, message: &usize) -> Result<usize, TransportError> {
            Ok(*message)
        }
    }

    fn app() -> (axum::Router, Arc<Service<DirectSend<Echo>>>) {
        let config = EngineConfig::default().with_senders(1);
        let service = Arc::new(Service::start(DirectSend::new(Echo), &config));
        let router = crate::push_router("/v1/push/test", Arc::clone(&service))
            .merge(crate::health_router());
        (router, service)
    }

    fn post(body: &str) -> axum::http::Request<Body> {
        axum::http::Request::post("/v1/push/test")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> QueueResponse {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_accepts_request() {
        let (app, service) = app();
        let results = service.listen();

        let response = app
            .oneshot(post(r#"{"devices":["a","b"],"extra":"x"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let body = json(response).await;
        let result = results.recv().await.unwrap();
        assert_eq!(body.request_id, Some(result.request_id));
        assert_eq!(result.response, 2);
        assert_eq!(result.extra, "x");
    }

    #[tokio::test]
    async fn test_rejects_empty_devices() {
        let (app, _service) = app();

        let response = app.oneshot(post(r#"{"devices":[]}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json(response).await;
        assert!(body.request_id.is_none());
        assert_eq!(body.error.as_deref(), Some("request has no device tokens"));
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _service) = app();
        let request = axum::http::Request::get("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
