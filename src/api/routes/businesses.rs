use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::state::AppState;
use super::{api_error, ApiError, ErrorResponse};
use crate::businesses::{Business, BusinessSummary};
use crate::generations::ScheduleGeneration;

/// GET /api/businesses
pub async fn list_businesses(
    State(state): State<AppState>,
) -> Result<Json<Vec<BusinessSummary>>, ApiError> {
    let conn = state.db.get_connection().map_err(api_error)?;
    let businesses = Business::list(&conn).map_err(api_error)?;
    Ok(Json(businesses))
}

/// GET /api/businesses/{name}/history
/// All schedule generations for a business, newest first
pub async fn get_history(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<ScheduleGeneration>>, ApiError> {
    let conn = state.db.get_connection().map_err(api_error)?;

    match ScheduleGeneration::history(&conn, &name).map_err(api_error)? {
        Some(history) => Ok(Json(history)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Business '{}' not found", name),
            }),
        )),
    }
}
