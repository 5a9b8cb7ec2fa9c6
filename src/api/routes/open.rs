use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use super::{api_error, ApiError};
use crate::day::Day;
use crate::open_query::{self, ScheduleWarning};
use crate::query_input::parse_query;
use crate::time_of_day::TimeOfDay;

#[derive(Debug, Deserialize)]
pub struct OpenParams {
    /// Free text such as "Mon 10am" or "Friday 9:15 PM"
    pub at: String,
}

#[derive(Debug, Serialize)]
pub struct OpenResponse {
    pub day: Day,
    pub time: TimeOfDay,
    pub open: Vec<String>,
    pub warnings: Vec<ScheduleWarning>,
}

/// GET /api/open?at=Mon%2010am
/// Lists the businesses open at the given day and time
pub async fn get_open(
    State(state): State<AppState>,
    Query(params): Query<OpenParams>,
) -> Result<Json<OpenResponse>, ApiError> {
    let (day, time) = parse_query(&params.at).map_err(|e| api_error(e.into()))?;

    let result = open_query::is_open(&state.db, day, time).map_err(api_error)?;

    Ok(Json(OpenResponse {
        day,
        time,
        open: result.open.into_iter().collect(),
        warnings: result.warnings,
    }))
}
