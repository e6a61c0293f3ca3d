use crate::cli::ServeArgs;
use crate::demo::seed_demo;
use crate::infra::{AppState, Platform};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use buyer_journey::clock::SystemClock;
use buyer_journey::config::AppConfig;
use buyer_journey::error::AppError;
use buyer_journey::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let platform = Platform::new(config.auth, config.timeline, Arc::new(SystemClock));
    if args.seed_demo {
        let seed = seed_demo(&platform).await?;
        for (user_id, token) in &seed.sessions {
            info!(%user_id, %token, "demo session issued");
        }
    }

    let app = with_service_routes(platform.router())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        mock_auth = config.auth.allow_mock_auth,
        "buyer journey service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
