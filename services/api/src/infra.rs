use crop_advisor::advisory::{
    AdvisoryError, CatalogError, CatalogSnapshot, CatalogSource, FileCatalog, InMemoryCatalog,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Catalog backing the service: a rule export on disk, or the bundled demo
/// rules when no path is configured.
#[derive(Debug, Clone)]
pub(crate) enum ServedCatalog {
    File(FileCatalog),
    Demo(InMemoryCatalog),
}

impl ServedCatalog {
    pub(crate) fn resolve(path: Option<&Path>) -> Result<Self, AdvisoryError> {
        match path {
            Some(path) => Ok(Self::File(FileCatalog::open(path))),
            None => Ok(Self::Demo(InMemoryCatalog::demo()?)),
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::File(FileCatalog::Json(_)) => "json file",
            Self::File(FileCatalog::Csv(_)) => "csv file",
            Self::Demo(_) => "bundled demo",
        }
    }
}

impl CatalogSource for ServedCatalog {
    fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        match self {
            Self::File(catalog) => catalog.snapshot(),
            Self::Demo(catalog) => catalog.snapshot(),
        }
    }
}

/// Parses a `factor=value` pair given on the command line.
pub(crate) fn parse_answer(raw: &str) -> Result<(String, String), String> {
    let (factor, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected factor=value, got '{raw}'"))?;
    let factor = factor.trim();
    if factor.is_empty() {
        return Err(format!("missing factor name in '{raw}'"));
    }
    Ok((factor.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_split_on_the_first_equals_sign() {
        assert_eq!(
            parse_answer("altitud=>=2500"),
            Ok(("altitud".to_string(), ">=2500".to_string()))
        );
        assert_eq!(
            parse_answer(" clima = templado "),
            Ok(("clima".to_string(), "templado".to_string()))
        );
    }

    #[test]
    fn answers_require_a_factor_and_separator() {
        assert!(parse_answer("templado").is_err());
        assert!(parse_answer("=templado").is_err());
    }

    #[test]
    fn missing_path_serves_the_demo_rules() {
        let catalog = ServedCatalog::resolve(None).expect("demo rules parse");
        assert_eq!(catalog.label(), "bundled demo");
        assert_eq!(catalog.snapshot().expect("snapshot").outcomes.len(), 6);

        let file = ServedCatalog::resolve(Some(Path::new("rules.csv"))).expect("file catalog");
        assert_eq!(file.label(), "csv file");
    }
}
