use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::advisory::router;
use crate::advisory::{AdvisoryConfig, AdvisoryService, Answers};

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn next_handler_returns_service_unavailable_when_catalog_is_down() {
    let response = router::next_handler::<UnavailableCatalog>(
        State(unavailable_service()),
        axum::Json(Answers::new()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "catalog unavailable: database offline");
}

#[tokio::test]
async fn ranked_handler_returns_internal_error_for_unreadable_catalog() {
    let service = Arc::new(AdvisoryService::new(
        Arc::new(CorruptCatalog),
        AdvisoryConfig::default(),
    ));

    let response =
        router::ranked_handler::<CorruptCatalog>(State(service), axum::Json(Answers::new())).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn catalog_reads_run_off_the_request_thread() {
    let catalog = Arc::new(ThreadRecordingCatalog::default());
    let service = Arc::new(AdvisoryService::new(
        catalog.clone(),
        AdvisoryConfig::default(),
    ));

    let response = router::plan_handler::<ThreadRecordingCatalog>(
        State(service),
        axum::Json(Answers::new()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let reader = catalog.reader().expect("catalog was read");
    assert_ne!(reader, std::thread::current().id());
}

#[tokio::test]
async fn next_route_starts_with_altitude() {
    let router = advisory_router_with_service(build_service());

    let response = router
        .oneshot(post_json("/api/v1/questions/next", json!({})))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["question"]["id"], "altitud");
    assert_eq!(body["pendingCount"], 4);
}

#[tokio::test]
async fn questions_route_reads_answers_from_the_query_string() {
    let router = advisory_router_with_service(build_service());

    let response = router
        .oneshot(get("/api/v1/questions?Altitud=1500"))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let ids: Vec<&str> = body["questions"]
        .as_array()
        .expect("questions array")
        .iter()
        .filter_map(|question| question["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["clima", "suelo", "riego"]);
}

#[tokio::test]
async fn questions_route_accepts_json_answers_with_nulls() {
    let router = advisory_router_with_service(build_service());

    let response = router
        .oneshot(post_json(
            "/api/v1/questions",
            json!({"altitud": "1500", "clima": "frio", "riego": null}),
        ))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["questions"], json!([]));
    assert_eq!(body["message"], crate::advisory::NO_COMPATIBLE_OUTCOMES);
}

#[tokio::test]
async fn recommendation_routes_return_both_modes() {
    let service = build_service();
    let answers = json!({
        "altitud": "1500",
        "clima": "templado",
        "suelo": "franco",
        "riego": "si"
    });

    let strict = advisory_router_with_service(service.clone())
        .oneshot(post_json("/api/v1/recommendations", answers.clone()))
        .await
        .expect("route responds");
    assert_eq!(strict.status(), StatusCode::OK);
    assert_eq!(
        read_json_body(strict).await,
        json!({"count": 1, "recommendations": ["Maiz"]})
    );

    let ranked = advisory_router_with_service(service)
        .oneshot(post_json("/api/v1/recommendations/ranked", answers))
        .await
        .expect("route responds");
    assert_eq!(ranked.status(), StatusCode::OK);
    let body = read_json_body(ranked).await;
    assert_eq!(body["count"], 4);
    assert_eq!(
        body["recommendations"][1],
        json!({"description": "Cafe", "percentage": 66})
    );
}

#[tokio::test]
async fn catalog_routes_list_values_and_counts() {
    let service = build_service();

    let values = advisory_router_with_service(service.clone())
        .oneshot(get("/api/v1/factors/values"))
        .await
        .expect("route responds");
    assert_eq!(values.status(), StatusCode::OK);
    let body = read_json_body(values).await;
    assert_eq!(
        body[1],
        json!({"name": "clima", "values": ["Frio", "templado", "calido", "frio"]})
    );

    let summary = advisory_router_with_service(service)
        .oneshot(get("/api/v1/catalog/summary"))
        .await
        .expect("route responds");
    let body = read_json_body(summary).await;
    assert_eq!(body["conditions"], 17);
    assert_eq!(body["dangling_conditions"], 0);
}
