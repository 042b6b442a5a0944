use esg_engine::error::AppError;
use esg_engine::EngineContext;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) engine: Arc<EngineContext>,
}

/// Runs CPU-bound scoring off the async workers. A panicked or cancelled job
/// surfaces as [`AppError::Task`].
pub(crate) async fn blocking<T, F>(job: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| AppError::Task(err.to_string()))?
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::AppState;
    use esg_engine::config::EngineConfig;
    use esg_engine::{BandRepository, Dataset, EngineContext, ScoringSettings};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    const BANDS: &[u8] = include_bytes!("../../../data/bands_v1.json");
    const SUPPLIERS: &[u8] = include_bytes!("../../../data/suppliers.json");

    pub(crate) fn context() -> EngineContext {
        let bands = BandRepository::from_reader(BANDS).expect("fixture bands load");
        let dataset = Dataset::from_reader(SUPPLIERS).expect("fixture dataset loads");
        EngineContext::new(
            Arc::new(bands),
            ScoringSettings::default(),
            dataset,
            &EngineConfig::default(),
        )
        .expect("context builds")
    }

    pub(crate) fn state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
            engine: Arc::new(context()),
        }
    }
}
