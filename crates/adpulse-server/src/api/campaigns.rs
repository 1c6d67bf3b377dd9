use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CampaignsQuery {
    pub source: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CampaignItem {
    id: Uuid,
    external_id: String,
    name: String,
    source: String,
    status: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<adpulse_db::CampaignRow> for CampaignItem {
    fn from(row: adpulse_db::CampaignRow) -> Self {
        Self {
            id: row.public_id,
            external_id: row.external_id,
            name: row.name,
            source: row.source,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Lists campaigns, optionally filtered by source and status.
pub(super) async fn list_campaigns(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CampaignsQuery>,
) -> Result<Json<ApiResponse<Vec<CampaignItem>>>, ApiError> {
    let rows = adpulse_db::list_campaigns(
        &state.pool,
        query.source.as_deref(),
        query.status.as_deref(),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CampaignItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Returns one campaign by public id.
pub(super) async fn get_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CampaignItem>>, ApiError> {
    let row = adpulse_db::get_campaign_by_public_id(&state.pool, campaign_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "campaign not found"))?;

    Ok(Json(ApiResponse {
        data: CampaignItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
