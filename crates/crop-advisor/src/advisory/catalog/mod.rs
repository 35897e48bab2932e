mod csv_rules;

use super::domain::{Condition, Factor, Outcome};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only view of the rule catalog taken at the start of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub factors: Vec<Factor>,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Supplier of catalog snapshots (database, file export, fixture).
pub trait CatalogSource: Send + Sync {
    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError>;
}

/// Failure to deliver a snapshot. Aborts the whole evaluation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid catalog csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

const DEMO_RULES: &str = include_str!("../../../data/crop_rules.csv");

/// Fixed snapshot held in memory; every call hands out a fresh copy.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    snapshot: Arc<CatalogSnapshot>,
}

impl InMemoryCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    /// Bundled crop rules (altitude, climate, soil, irrigation).
    pub fn demo() -> Result<Self, CatalogError> {
        CsvRuleCatalog::from_reader(DEMO_RULES.as_bytes()).map(Self::new)
    }
}

impl CatalogSource for InMemoryCatalog {
    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        Ok(self.snapshot.as_ref().clone())
    }
}

/// JSON document shaped like [`CatalogSnapshot`], re-read on every call.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<CatalogSnapshot, CatalogError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

impl CatalogSource for JsonFileCatalog {
    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let file = File::open(&self.path)?;
        Self::from_reader(BufReader::new(file))
    }
}

/// CSV rule export with `factor,outcome,operator,value` columns, re-read on
/// every call.
#[derive(Debug, Clone)]
pub struct CsvRuleCatalog {
    path: PathBuf,
}

impl CsvRuleCatalog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<CatalogSnapshot, CatalogError> {
        Ok(csv_rules::parse_rules(reader)?)
    }
}

impl CatalogSource for CsvRuleCatalog {
    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let file = File::open(&self.path)?;
        Self::from_reader(file)
    }
}

/// File-backed catalog whose format is chosen by extension (`.csv` or JSON).
#[derive(Debug, Clone)]
pub enum FileCatalog {
    Json(JsonFileCatalog),
    Csv(CsvRuleCatalog),
}

impl FileCatalog {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv {
            Self::Csv(CsvRuleCatalog::new(path))
        } else {
            Self::Json(JsonFileCatalog::new(path))
        }
    }
}

impl CatalogSource for FileCatalog {
    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        match self {
            Self::Json(catalog) => catalog.snapshot(),
            Self::Csv(catalog) => catalog.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::domain::{FactorId, OutcomeId};
    use std::io::Cursor;

    #[test]
    fn csv_rules_assign_ids_by_first_appearance() {
        let csv = "factor,outcome,operator,value\n\
Altitud,Papa,>=,2000\n\
clima,Papa,,Frio\n\
Altitud,Cacao,<=,1000\n\
CLIMA,Cacao,=,Humedo\n";

        let snapshot = CsvRuleCatalog::from_reader(Cursor::new(csv)).expect("csv parses");

        assert_eq!(snapshot.factors.len(), 2);
        assert_eq!(snapshot.factors[1].name, "clima");
        assert_eq!(snapshot.outcomes.len(), 2);
        assert_eq!(snapshot.conditions.len(), 4);
        assert_eq!(snapshot.conditions[1].operator, "=");
        assert_eq!(snapshot.conditions[3].factor_id, FactorId(2));
        assert_eq!(snapshot.conditions[3].outcome_id, OutcomeId(2));
    }

    #[test]
    fn csv_rows_without_factor_or_outcome_are_skipped() {
        let csv = "factor,outcome,operator,value\n,Papa,=,frio\nclima,,=,seco\n";
        let snapshot = CsvRuleCatalog::from_reader(Cursor::new(csv)).expect("csv parses");
        assert!(snapshot.conditions.is_empty());
    }

    #[test]
    fn json_snapshot_uses_snake_case_keys() {
        let json = r#"{
            "factors": [{"id": 1, "name": "clima"}],
            "outcomes": [{"id": 7, "description": "Arroz"}],
            "conditions": [
                {"id": 3, "factor_id": 1, "outcome_id": 7, "operator": "=", "value": "humedo"}
            ]
        }"#;

        let snapshot = JsonFileCatalog::from_reader(Cursor::new(json)).expect("json parses");
        assert_eq!(snapshot.conditions[0].outcome_id, OutcomeId(7));
    }

    #[test]
    fn missing_files_surface_io_errors() {
        let catalog = FileCatalog::open("./does-not-exist.json");
        match catalog.snapshot() {
            Err(CatalogError::Io(_)) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn demo_catalog_bundles_six_crops() {
        let snapshot = InMemoryCatalog::demo()
            .and_then(|catalog| catalog.snapshot())
            .expect("bundled rules parse");
        let crops: Vec<&str> = snapshot
            .outcomes
            .iter()
            .map(|outcome| outcome.description.as_str())
            .collect();
        assert_eq!(crops, vec!["Papa", "Maiz", "Cafe", "Cacao", "Quinua", "Arroz"]);
        assert_eq!(snapshot.factors.len(), 4);
    }

    #[test]
    fn file_catalog_picks_format_from_extension() {
        assert!(matches!(FileCatalog::open("rules.CSV"), FileCatalog::Csv(_)));
        assert!(matches!(
            FileCatalog::open("snapshot.json"),
            FileCatalog::Json(_)
        ));
    }
}
