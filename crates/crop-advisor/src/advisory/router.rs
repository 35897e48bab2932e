use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::answers::Answers;
use super::catalog::{CatalogError, CatalogSource};
use super::service::{AdvisoryError, AdvisoryService};

/// Router exposing the questionnaire and recommendation endpoints.
pub fn advisory_router<C>(service: Arc<AdvisoryService<C>>) -> Router
where
    C: CatalogSource + 'static,
{
    Router::new()
        .route(
            "/api/v1/questions",
            get(plan_query_handler::<C>).post(plan_handler::<C>),
        )
        .route("/api/v1/questions/next", post(next_handler::<C>))
        .route("/api/v1/recommendations", post(strict_handler::<C>))
        .route("/api/v1/recommendations/ranked", post(ranked_handler::<C>))
        .route("/api/v1/factors/values", get(factor_values_handler::<C>))
        .route("/api/v1/catalog/summary", get(summary_handler::<C>))
        .with_state(service)
}

/// Query parameters are read as answers, e.g. `?altitud=>=2000`.
pub(crate) async fn plan_query_handler<C>(
    State(service): State<Arc<AdvisoryService<C>>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Response
where
    C: CatalogSource + 'static,
{
    let answers = Answers::from_pairs(params);
    off_runtime(service, move |service| service.plan_all(&answers)).await
}

pub(crate) async fn plan_handler<C>(
    State(service): State<Arc<AdvisoryService<C>>>,
    Json(answers): Json<Answers>,
) -> Response
where
    C: CatalogSource + 'static,
{
    off_runtime(service, move |service| service.plan_all(&answers)).await
}

pub(crate) async fn next_handler<C>(
    State(service): State<Arc<AdvisoryService<C>>>,
    Json(answers): Json<Answers>,
) -> Response
where
    C: CatalogSource + 'static,
{
    off_runtime(service, move |service| service.plan_next(&answers)).await
}

pub(crate) async fn strict_handler<C>(
    State(service): State<Arc<AdvisoryService<C>>>,
    Json(answers): Json<Answers>,
) -> Response
where
    C: CatalogSource + 'static,
{
    off_runtime(service, move |service| service.recommend_strict(&answers)).await
}

pub(crate) async fn ranked_handler<C>(
    State(service): State<Arc<AdvisoryService<C>>>,
    Json(answers): Json<Answers>,
) -> Response
where
    C: CatalogSource + 'static,
{
    off_runtime(service, move |service| service.recommend_ranked(&answers)).await
}

pub(crate) async fn factor_values_handler<C>(
    State(service): State<Arc<AdvisoryService<C>>>,
) -> Response
where
    C: CatalogSource + 'static,
{
    off_runtime(service, |service| service.factor_values()).await
}

pub(crate) async fn summary_handler<C>(State(service): State<Arc<AdvisoryService<C>>>) -> Response
where
    C: CatalogSource + 'static,
{
    off_runtime(service, |service| service.summary()).await
}

/// Snapshot suppliers may read files, so every service call runs on the
/// blocking pool.
async fn off_runtime<C, T, F>(service: Arc<AdvisoryService<C>>, call: F) -> Response
where
    C: CatalogSource + 'static,
    T: Serialize + Send + 'static,
    F: FnOnce(&AdvisoryService<C>) -> Result<T, AdvisoryError> + Send + 'static,
{
    match tokio::task::spawn_blocking(move || call(&service)).await {
        Ok(result) => respond(result),
        Err(err) => {
            warn!(error = %err, "advisory task did not complete");
            let payload = json!({ "error": "advisory task did not complete" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

fn respond<T: Serialize>(result: Result<T, AdvisoryError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(AdvisoryError::Catalog(CatalogError::Unavailable(reason))) => {
            let payload = json!({
                "error": format!("catalog unavailable: {reason}"),
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
