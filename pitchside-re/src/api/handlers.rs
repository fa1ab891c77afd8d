//! HTTP request handlers
//!
//! Thin adapters between JSON/query parameters and [`RatingEditor`] calls.

use crate::api::server::AppContext;
use crate::editor::{
    BulkOutcome, BulkRequest, EditOutcome, EditorSummary, MemberView, PositionFilter, SortKey,
    ViewFilter,
};
use crate::error::Error;
use crate::model::AuditEntry;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use pitchside_common::uuid_utils::parse_member_id;
use pitchside_common::{MemberId, RatingField};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

/// Filter and sort parameters shared by listing and select-all
#[derive(Debug, Default, Deserialize)]
pub struct MembersQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    monthly_payers_only: Option<bool>,
    #[serde(default)]
    missing_rating_only: Option<bool>,
    #[serde(default)]
    sort: Option<String>,
}

impl MembersQuery {
    fn filter(&self) -> Result<ViewFilter, Error> {
        let position = match &self.position {
            Some(p) => p.parse::<PositionFilter>()?,
            None => PositionFilter::Any,
        };
        Ok(ViewFilter {
            query: self.q.clone().unwrap_or_default(),
            position,
            monthly_payers_only: self.monthly_payers_only.unwrap_or(false),
            missing_rating_only: self.missing_rating_only.unwrap_or(false),
        })
    }

    fn sort(&self) -> Result<SortKey, Error> {
        match &self.sort {
            Some(s) => s.parse::<SortKey>(),
            None => Ok(SortKey::default()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MembersResponse {
    members: Vec<MemberView>,
}

#[derive(Debug, Deserialize)]
pub struct SetRatingRequest {
    field: RatingField,
    value: u8,
}

#[derive(Debug, Deserialize)]
pub struct ToggleSelectionRequest {
    member_id: MemberId,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    selected: Vec<MemberId>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    records: usize,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn error_response(e: Error) -> ApiError {
    let code = match &e {
        Error::Validation(_) | Error::Common(pitchside_common::Error::InvalidInput(_)) => {
            StatusCode::BAD_REQUEST
        }
        Error::NotPermitted => StatusCode::FORBIDDEN,
        Error::BulkInProgress => StatusCode::CONFLICT,
        Error::UnknownMember(_) => StatusCode::NOT_FOUND,
        Error::Closed => StatusCode::SERVICE_UNAVAILABLE,
        Error::Backend(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if code.is_server_error() {
        error!("Request failed: {}", e);
    }
    (
        code,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

/// Member id from a path segment (400 on a malformed id)
fn member_path(raw: &str) -> Result<MemberId, ApiError> {
    parse_member_id(raw).map_err(|e| error_response(Error::from(e)))
}

fn selection_response(ctx: &AppContext) -> Json<SelectionResponse> {
    Json(SelectionResponse {
        selected: ctx.editor.selected(),
    })
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "rating_editor".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Read Models
// ============================================================================

/// GET /members - Filtered, ordered merged view
pub async fn list_members(
    State(ctx): State<AppContext>,
    Query(query): Query<MembersQuery>,
) -> Result<Json<MembersResponse>, ApiError> {
    let filter = query.filter().map_err(error_response)?;
    let sort = query.sort().map_err(error_response)?;
    Ok(Json(MembersResponse {
        members: ctx.editor.views(&filter, sort),
    }))
}

/// GET /members/:member_id - Merged view of one member
pub async fn get_member(
    State(ctx): State<AppContext>,
    Path(member_id): Path<String>,
) -> Result<Json<MemberView>, ApiError> {
    let member_id = member_path(&member_id)?;
    ctx.editor
        .view(&member_id)
        .map(Json)
        .ok_or_else(|| error_response(Error::UnknownMember(member_id)))
}

/// GET /members/:member_id/history - Rating change history, newest first
pub async fn get_history(
    State(ctx): State<AppContext>,
    Path(member_id): Path<String>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let member_id = member_path(&member_id)?;
    ctx.editor
        .history(member_id)
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /summary - Overlay-aware counters
pub async fn get_summary(State(ctx): State<AppContext>) -> Json<EditorSummary> {
    Json(ctx.editor.summary())
}

// ============================================================================
// Editing
// ============================================================================

/// PUT /members/:member_id/rating - Edit one rating (saved after the debounce window)
pub async fn set_rating(
    State(ctx): State<AppContext>,
    Path(member_id): Path<String>,
    Json(req): Json<SetRatingRequest>,
) -> Result<Json<EditOutcome>, ApiError> {
    let member_id = member_path(&member_id)?;
    ctx.editor
        .set_rating(member_id, req.field, req.value)
        .map(Json)
        .map_err(error_response)
}

/// POST /members/:member_id/retry - Re-arm the save of unsaved edits
pub async fn retry(
    State(ctx): State<AppContext>,
    Path(member_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let member_id = member_path(&member_id)?;
    let status = if ctx.editor.retry(member_id) {
        "scheduled"
    } else {
        "nothing to retry"
    };
    Ok(Json(StatusResponse {
        status: status.to_string(),
    }))
}

/// POST /members/:member_id/discard - Drop unsaved edits
pub async fn discard(
    State(ctx): State<AppContext>,
    Path(member_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let member_id = member_path(&member_id)?;
    let status = match ctx.editor.discard(member_id) {
        Some(_) => "discarded",
        None => "nothing to discard",
    };
    Ok(Json(StatusResponse {
        status: status.to_string(),
    }))
}

/// POST /refresh - Re-fetch the canonical rating snapshot
pub async fn refresh(State(ctx): State<AppContext>) -> Result<Json<RefreshResponse>, ApiError> {
    let records = ctx.editor.refresh().await.map_err(error_response)?;
    info!("Snapshot refreshed on request: {} records", records);
    Ok(Json(RefreshResponse { records }))
}

// ============================================================================
// Selection and Bulk Apply
// ============================================================================

/// GET /selection - Selected member ids in roster order
pub async fn get_selection(State(ctx): State<AppContext>) -> Json<SelectionResponse> {
    selection_response(&ctx)
}

/// POST /selection/toggle - Toggle one member
pub async fn toggle_selection(
    State(ctx): State<AppContext>,
    Json(req): Json<ToggleSelectionRequest>,
) -> Json<SelectionResponse> {
    ctx.editor.toggle_selection(req.member_id);
    selection_response(&ctx)
}

/// POST /selection/select_all - Select every member visible under the given filters
pub async fn select_all(
    State(ctx): State<AppContext>,
    Query(query): Query<MembersQuery>,
) -> Result<Json<SelectionResponse>, ApiError> {
    let filter = query.filter().map_err(error_response)?;
    ctx.editor.select_visible(&filter);
    Ok(selection_response(&ctx))
}

/// POST /selection/clear - Clear the selection
pub async fn clear_selection(State(ctx): State<AppContext>) -> Json<SelectionResponse> {
    ctx.editor.clear_selection();
    selection_response(&ctx)
}

/// POST /bulk - Apply overrides to every selected member
pub async fn bulk_apply(
    State(ctx): State<AppContext>,
    Json(req): Json<BulkRequest>,
) -> Result<Json<BulkOutcome>, ApiError> {
    ctx.editor
        .bulk_apply(req)
        .await
        .map(Json)
        .map_err(error_response)
}
