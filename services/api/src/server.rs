use crate::cli::ServeArgs;
use crate::infra::{build_review_service, load_roster, AppState};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use perf_review::config::AppConfig;
use perf_review::error::AppError;
use perf_review::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let settings = config.review.load_settings()?;
    let roster = match args.roster.take() {
        Some(path) => load_roster(&path)?,
        None => {
            warn!("no roster supplied, every submission will be rejected as unknown");
            Vec::new()
        }
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let (review_service, review_settings) =
        build_review_service(&config.review, settings, roster);
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        settings: review_settings,
    };

    let app = with_review_routes(review_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "performance review service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
