use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use loan_risk::config::AppConfig;
use loan_risk::error::AppError;
use loan_risk::risk::{DashboardService, FileFallbackStore, RiskEngineClient};
use tracing::debug;

pub(crate) type ConsoleService = DashboardService<RiskEngineClient, FileFallbackStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn build_service(config: &AppConfig) -> Result<Arc<ConsoleService>, AppError> {
    let engine = Arc::new(RiskEngineClient::new(&config.engine)?);
    let cache = Arc::new(FileFallbackStore::new(config.cache.directory.clone()));
    debug!(
        engine = %engine.base_url(),
        cache = %cache.root().display(),
        "dashboard service wired"
    );
    Ok(Arc::new(DashboardService::new(engine, cache)))
}

/// Parse a CLI value using the engine's wire spelling, e.g. `credit_card` or `MORTGAGE`.
pub(crate) fn parse_wire<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string()))
        .map_err(|err| format!("unrecognised value '{raw}' ({err})"))
}
