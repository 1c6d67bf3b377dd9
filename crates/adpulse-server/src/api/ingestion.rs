use axum::{extract::State, Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use adpulse_ingest::{BatchOutcome, IngestError};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct IngestionRequest {
    pub raw_data: Value,
    pub source: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct BatchIngestionRequest {
    pub raw_data_list: Vec<Value>,
    pub source: String,
}

#[derive(Debug, Serialize)]
pub(super) struct IngestionData {
    success: bool,
    campaign_id: Uuid,
    campaign_name: String,
    metric_id: i64,
    date: NaiveDate,
}

fn map_ingest_error(request_id: String, error: &IngestError) -> ApiError {
    if error.is_validation() {
        ApiError::new(request_id, "validation_error", error.to_string())
    } else {
        tracing::error!(error = %error, "ingestion failed");
        ApiError::new(request_id, "internal_error", "ingestion failed")
    }
}

/// Upserts a single metric record pushed by an external workflow.
pub(super) async fn upsert_metric(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<IngestionRequest>,
) -> Result<Json<ApiResponse<IngestionData>>, ApiError> {
    let receipt = adpulse_ingest::ingest_metric(&state.pool, &request.raw_data, &request.source)
        .await
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: IngestionData {
            success: true,
            campaign_id: receipt.campaign_public_id,
            campaign_name: receipt.campaign_name,
            metric_id: receipt.metric_id,
            date: receipt.date,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Upserts a batch of metric records. Always returns 200: per-record
/// failures are reported in the outcome's error list.
pub(super) async fn upsert_batch(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<BatchIngestionRequest>,
) -> Json<ApiResponse<BatchOutcome>> {
    let outcome =
        adpulse_ingest::ingest_batch(&state.pool, &request.raw_data_list, &request.source).await;

    Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    })
}
