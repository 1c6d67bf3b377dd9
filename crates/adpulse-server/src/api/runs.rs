use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use adpulse_pipeline::RunParams;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub(super) struct RunWeeklyRequest {
    pub days_back: i64,
    pub comparison_days: i64,
}

impl Default for RunWeeklyRequest {
    fn default() -> Self {
        let params = RunParams::default();
        Self {
            days_back: params.days_back,
            comparison_days: params.comparison_days,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RunWeeklyData {
    run_id: Uuid,
    status: String,
    started_at: DateTime<Utc>,
    message: &'static str,
}

#[derive(Debug, Deserialize)]
pub(super) struct RunsQuery {
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub run_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RunListItem {
    id: Uuid,
    run_type: String,
    status: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct RunDetail {
    id: Uuid,
    run_type: String,
    status: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    input_params: Value,
    output: Option<Value>,
    error_message: Option<String>,
}

/// Triggers a weekly analysis run and waits for it to finish.
///
/// The run executes synchronously; the response carries the run's terminal
/// identity. A stage failure still maps to a 500 here; the failed run row
/// remains queryable through the read endpoints.
pub(super) async fn run_weekly(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    request: Option<Json<RunWeeklyRequest>>,
) -> Result<Json<ApiResponse<RunWeeklyData>>, ApiError> {
    let Json(request) = request.unwrap_or_default();
    let params = RunParams {
        days_back: request.days_back,
        comparison_days: request.comparison_days,
    };

    let run = adpulse_pipeline::run_weekly_analysis(
        &state.pool,
        &state.config.thresholds,
        state.generator.as_ref(),
        params,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "weekly analysis run failed");
        ApiError::new(req_id.0.clone(), "internal_error", e.to_string())
    })?;

    Ok(Json(ApiResponse {
        data: RunWeeklyData {
            run_id: run.public_id,
            status: run.status,
            started_at: run.started_at,
            message: "Weekly agent run executed successfully",
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Returns one run's full persisted record by public id.
pub(super) async fn get_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<ApiResponse<RunDetail>>, ApiError> {
    let row = adpulse_db::get_agent_run_by_public_id(&state.pool, run_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "agent run not found"))?;

    Ok(Json(ApiResponse {
        data: RunDetail {
            id: row.public_id,
            run_type: row.run_type,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            input_params: row.input_params,
            output: row.output,
            error_message: row.error_message,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Lists recent runs, newest first, with optional status/run-type filters.
pub(super) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<RunListItem>>>, ApiError> {
    let rows = adpulse_db::list_agent_runs(
        &state.pool,
        query.status.as_deref(),
        query.run_type.as_deref(),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| RunListItem {
            id: row.public_id,
            run_type: row.run_type,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_weekly_request_defaults_match_run_params() {
        let request = RunWeeklyRequest::default();
        assert_eq!(request.days_back, 30);
        assert_eq!(request.comparison_days, 7);
    }

    #[test]
    fn run_list_item_is_serializable() {
        let item = RunListItem {
            id: Uuid::new_v4(),
            run_type: "weekly".to_string(),
            status: "completed".to_string(),
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
        };
        let json = serde_json::to_string(&item).expect("serialize run item");
        assert!(json.contains("\"run_type\":\"weekly\""));
        assert!(json.contains("\"status\":\"completed\""));
    }
}
