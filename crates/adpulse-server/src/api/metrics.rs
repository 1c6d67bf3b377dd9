use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct DailyMetricsQuery {
    pub campaign_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub source: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct DailyMetricItem {
    id: i64,
    date: NaiveDate,
    campaign_id: Uuid,
    campaign_name: String,
    source: String,
    impressions: i64,
    clicks: i64,
    spend: Decimal,
    conversions: i64,
    revenue: Decimal,
}

/// Lists daily metric rows, newest first, with optional filters. The date
/// range is half-open: `start_date` inclusive, `end_date` exclusive.
pub(super) async fn list_daily_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DailyMetricsQuery>,
) -> Result<Json<ApiResponse<Vec<DailyMetricItem>>>, ApiError> {
    let rows = adpulse_db::list_daily_metrics(
        &state.pool,
        query.campaign_id,
        query.start_date,
        query.end_date,
        query.source.as_deref(),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| DailyMetricItem {
            id: row.id,
            date: row.date,
            campaign_id: row.campaign_id,
            campaign_name: row.campaign_name,
            source: row.source,
            impressions: row.impressions,
            clicks: row.clicks,
            spend: row.spend,
            conversions: row.conversions,
            revenue: row.revenue,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
