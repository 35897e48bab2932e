use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use axum::response::Response;
use axum::Router;
use serde_json::Value;

use crate::advisory::catalog::{CatalogError, CatalogSnapshot, CatalogSource, InMemoryCatalog};
use crate::advisory::domain::{Condition, ConditionId, Factor, FactorId, Outcome, OutcomeId};
use crate::advisory::{advisory_router, AdvisoryConfig, AdvisoryService, Answers, FactBase};

pub(super) const ALTITUD: i64 = 1;
pub(super) const CLIMA: i64 = 2;
pub(super) const SUELO: i64 = 3;
pub(super) const RIEGO: i64 = 4;

/// Five crops over altitude, climate, soil and irrigation. Altitude rules
/// cover every encoding: operator thresholds, prefixed thresholds and ranges.
pub(super) fn crop_snapshot() -> CatalogSnapshot {
    let rules: [(i64, &str, &[(i64, &str, &str)]); 5] = [
        (
            10,
            "Papa",
            &[(ALTITUD, ">=", "2500"), (CLIMA, "=", "Frio"), (SUELO, "=", "franco")],
        ),
        (
            11,
            "Maiz",
            &[
                (ALTITUD, "=", "1000-2500"),
                (CLIMA, "=", "templado"),
                (SUELO, "=", "franco"),
                (RIEGO, "=", "si"),
            ],
        ),
        (
            12,
            "Cafe",
            &[
                (ALTITUD, "=", "1200-2000"),
                (CLIMA, "=", "templado"),
                (SUELO, "=", "arcilloso"),
            ],
        ),
        (
            13,
            "Cacao",
            &[
                (ALTITUD, "<=", "1000"),
                (CLIMA, "=", "calido"),
                (SUELO, "=", "arcilloso"),
                (RIEGO, "=", "si"),
            ],
        ),
        (
            14,
            "Quinua",
            &[(ALTITUD, "=", ">=3000"), (CLIMA, "=", "frio"), (RIEGO, "=", "no")],
        ),
    ];

    let mut outcomes = Vec::new();
    let mut conditions = Vec::new();
    for (outcome_id, description, outcome_rules) in rules {
        outcomes.push(outcome(outcome_id, description));
        for (factor_id, operator, value) in outcome_rules {
            let id = conditions.len() as i64 + 1;
            conditions.push(condition(id, *factor_id, outcome_id, operator, value));
        }
    }

    CatalogSnapshot {
        factors: vec![
            factor(ALTITUD, "Altitud"),
            factor(CLIMA, "Clima"),
            factor(SUELO, "Suelo"),
            factor(RIEGO, "Riego"),
        ],
        outcomes,
        conditions,
    }
}

pub(super) fn crop_base() -> FactBase {
    FactBase::build(crop_snapshot())
}

pub(super) fn factor(id: i64, name: &str) -> Factor {
    Factor {
        id: FactorId(id),
        name: name.to_string(),
    }
}

pub(super) fn outcome(id: i64, description: &str) -> Outcome {
    Outcome {
        id: OutcomeId(id),
        description: description.to_string(),
    }
}

pub(super) fn condition(
    id: i64,
    factor: i64,
    outcome: i64,
    operator: &str,
    value: &str,
) -> Condition {
    Condition {
        id: ConditionId(id),
        factor_id: FactorId(factor),
        outcome_id: OutcomeId(outcome),
        operator: operator.to_string(),
        value: value.to_string(),
    }
}

pub(super) fn answers(pairs: &[(&str, &str)]) -> Answers {
    Answers::from_pairs(pairs.iter().copied())
}

pub(super) fn build_service() -> Arc<AdvisoryService<InMemoryCatalog>> {
    Arc::new(AdvisoryService::new(
        Arc::new(InMemoryCatalog::new(crop_snapshot())),
        AdvisoryConfig::default(),
    ))
}

pub(super) fn advisory_router_with_service(
    service: Arc<AdvisoryService<InMemoryCatalog>>,
) -> Router {
    advisory_router(service)
}

pub(super) struct UnavailableCatalog;

impl CatalogSource for UnavailableCatalog {
    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        Err(CatalogError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct CorruptCatalog;

impl CatalogSource for CorruptCatalog {
    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let err = serde_json::from_str::<CatalogSnapshot>("{").expect_err("truncated json");
        Err(CatalogError::Json(err))
    }
}

/// Crop catalog that remembers which thread read it last.
#[derive(Default)]
pub(super) struct ThreadRecordingCatalog {
    reader: Mutex<Option<ThreadId>>,
}

impl ThreadRecordingCatalog {
    pub(super) fn reader(&self) -> Option<ThreadId> {
        *self.reader.lock().expect("reader mutex poisoned")
    }
}

impl CatalogSource for ThreadRecordingCatalog {
    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        *self.reader.lock().expect("reader mutex poisoned") = Some(thread::current().id());
        Ok(crop_snapshot())
    }
}

pub(super) fn unavailable_service() -> Arc<AdvisoryService<UnavailableCatalog>> {
    Arc::new(AdvisoryService::new(
        Arc::new(UnavailableCatalog),
        AdvisoryConfig::default(),
    ))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
