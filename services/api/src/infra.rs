use civicfix::config::AppConfig;
use civicfix::contractors::ContractorDirectory;
use civicfix::error::AppError;
use civicfix::scan::{GeminiClassifier, ImageScanner};
use civicfix::service_requests::ServiceRequestLedger;
use civicfix::store::SqliteStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Services shared by the HTTP routes and the admin commands.
pub(crate) struct Components {
    pub(crate) directory: Arc<ContractorDirectory<SqliteStore>>,
    pub(crate) ledger: Arc<ServiceRequestLedger<SqliteStore>>,
    pub(crate) scanner: Arc<ImageScanner<GeminiClassifier>>,
}

pub(crate) async fn open_store(config: &AppConfig) -> Result<Arc<SqliteStore>, AppError> {
    let store = SqliteStore::open(&config.database).await?;
    Ok(Arc::new(store))
}

pub(crate) fn build_scanner(
    config: &AppConfig,
) -> Result<Arc<ImageScanner<GeminiClassifier>>, AppError> {
    if config.classifier.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; image classification requests will fail");
    }
    let classifier = GeminiClassifier::new(&config.classifier)?;
    Ok(Arc::new(ImageScanner::new(Arc::new(classifier))))
}

pub(crate) async fn build_components(config: &AppConfig) -> Result<Components, AppError> {
    let store = open_store(config).await?;
    Ok(Components {
        directory: Arc::new(ContractorDirectory::new(store.clone())),
        ledger: Arc::new(ServiceRequestLedger::new(store)),
        scanner: build_scanner(config)?,
    })
}
