use crate::cli::ServeArgs;
use crate::infra::{AppState, ServedCatalog};
use crate::routes::with_advisory_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use crop_advisor::advisory::AdvisoryService;
use crop_advisor::config::AppConfig;
use crop_advisor::error::AppError;
use crop_advisor::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = ServedCatalog::resolve(config.catalog.path.as_deref())?;
    let source = catalog.label();
    let advisory_service = Arc::new(AdvisoryService::new(
        Arc::new(catalog),
        config.advisory.clone(),
    ));

    match advisory_service.summary() {
        Ok(summary) => info!(
            source,
            factors = summary.factors,
            outcomes = summary.outcomes,
            conditions = summary.conditions,
            dangling = summary.dangling_conditions,
            altitude_factor = %advisory_service.config().planner.altitude_factor,
            ranked_limit = advisory_service.config().ranked_limit,
            "rule catalog loaded"
        ),
        Err(err) => warn!(source, error = %err, "rule catalog not readable yet"),
    }

    let app = with_advisory_routes(advisory_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "crop advisory service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
