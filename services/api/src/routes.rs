use crate::infra::{blocking, AppState};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use esg_engine::dataset::DatasetMetadata;
use esg_engine::error::AppError;
use esg_engine::scenarios::RankedEntry;
use esg_engine::scoring::QualityReport;
use esg_engine::{Dataset, ScenarioParams, ScoringSettings, SupplierRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ScoreRequest {
    /// Replaces the configured scoring settings for this request only.
    pub(crate) settings: Option<ScoringSettings>,
    /// Scores these records instead of the loaded dataset.
    pub(crate) suppliers: Option<Vec<SupplierRecord>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) dataset_version: String,
    pub(crate) scored_at: DateTime<Utc>,
    pub(crate) settings: ScoringSettings,
    pub(crate) entries: Vec<RankedEntry>,
    pub(crate) quality: QualityReport,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ScenarioRequest {
    #[serde(flatten)]
    pub(crate) params: ScenarioParams,
    pub(crate) settings: Option<ScoringSettings>,
    pub(crate) output_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DatasetSummary {
    pub(crate) metadata: DatasetMetadata,
    pub(crate) suppliers: usize,
    pub(crate) industries: BTreeSet<String>,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/dataset", get(dataset_endpoint))
        .route("/api/v1/score", post(score_endpoint))
        .route("/api/v1/scenarios/:kind", post(scenario_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn dataset_endpoint(Extension(state): Extension<AppState>) -> Json<DatasetSummary> {
    let dataset = state.engine.dataset();
    Json(DatasetSummary {
        metadata: dataset.metadata.clone(),
        suppliers: dataset.suppliers.len(),
        industries: dataset
            .suppliers
            .iter()
            .map(|supplier| supplier.industry.clone())
            .collect(),
    })
}

pub(crate) async fn score_endpoint(
    Extension(state): Extension<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let response = blocking(move || {
        let context = match request.settings {
            Some(settings) => state.engine.with_settings(settings)?,
            None => state.engine.as_ref().clone(),
        };
        let dataset = context.dataset();
        let ranking = match request.suppliers {
            Some(suppliers) => {
                // reuse the duplicate-id check of a loaded dataset
                let custom = Dataset::new(dataset.metadata.clone(), suppliers)?;
                esg_engine::rank_suppliers(context.engine(), &custom.suppliers)
            }
            None => context.rank(),
        };

        Ok(ScoreResponse {
            dataset_version: dataset.metadata.version.clone(),
            scored_at: Utc::now(),
            settings: context.engine().settings().clone(),
            entries: ranking.entries,
            quality: ranking.quality,
        })
    })
    .await?;

    tracing::info!(
        suppliers = response.entries.len(),
        warnings = response.quality.warnings.len(),
        "scored suppliers"
    );
    Ok(Json(response))
}

pub(crate) async fn scenario_endpoint(
    Extension(state): Extension<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<ScenarioRequest>,
) -> Result<impl IntoResponse, AppError> {
    let artifact = blocking(move || {
        let context = match request.settings {
            Some(settings) => state.engine.with_settings(settings)?,
            None => state.engine.as_ref().clone(),
        };
        let output_name = request.output_name.unwrap_or_default();
        Ok(context.run_scenario(&kind, &request.params, &output_name)?)
    })
    .await?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    ))
}
