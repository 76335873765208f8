//! Push Gateway - accepts push requests over HTTP and dispatches them to
//! APNs and FCM.

use std::sync::Arc;

use axum::Router;
use color_eyre::eyre::WrapErr as _;
use gateway_server::config::GatewayConfig;
use gateway_server::report;
use push_apns::ApnsClient;
use push_engine::{DirectSend, Dispatch, FanOutFanIn, Service};
use push_fcm::FcmClient;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("push-gateway starting");

    let path = GatewayConfig::config_path();
    let config = GatewayConfig::load(&path)
        .wrap_err_with(|| format!("failed to load config from {}", path.display()))?;

    let mut app = Router::new();

    // APNs: batched fan-out with per-request aggregation
    let apns = match &config.apns {
        Some(apns) => {
            let client = ApnsClient::from_file(
                &apns.certificate,
                &apns.password,
                apns.topic.clone(),
                apns.mode,
            )
            .wrap_err("failed to initialize APNs")?
            .with_streams(apns.streams);

            let service = Arc::new(Service::start(
                FanOutFanIn::new(client, &config.engine),
                &config.engine,
            ));
            tokio::spawn(report::aggregated("apns", service.listen()));
            app = app.merge(push_http::push_router("/v1/push/apns", Arc::clone(&service)));

            tracing::info!(topic = %apns.topic, mode = ?apns.mode, "apns enabled");
            Some(service)
        }
        None => None,
    };

    // FCM: one call per request, raw response published
    let fcm = match &config.fcm {
        Some(fcm) => {
            let mut client = FcmClient::new(fcm.api_key.clone(), fcm.retry_count, fcm.mode);
            if let Some(endpoint) = &fcm.endpoint {
                client = client.with_endpoint(endpoint.clone());
            }

            let service = Arc::new(Service::start(DirectSend::new(client), &config.engine));
            tokio::spawn(report::fcm(service.listen()));
            app = app.merge(push_http::push_router("/v1/push/fcm", Arc::clone(&service)));

            tracing::info!(mode = ?fcm.mode, "fcm enabled");
            Some(service)
        }
        None => None,
    };

    let app = app
        .merge(push_http::health_router())
        .layer(TraceLayer::new_for_http());

    tracing::info!(addr = %config.listen, "listening");

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .wrap_err("failed to bind")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("server error")?;

    // The router is gone, so these are the last handles.
    if let Some(service) = apns {
        stop("apns", service).await;
    }
    if let Some(service) = fcm {
        stop("fcm", service).await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn stop<D: Dispatch>(provider: &'static str, service: Arc<Service<D>>) {
    match Arc::try_unwrap(service) {
        Ok(service) => service.shutdown().await,
        Err(_) => tracing::warn!(provider, "service still referenced, skipping drain"),
    }
}
