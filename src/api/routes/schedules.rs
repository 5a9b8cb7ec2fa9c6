use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use super::state::AppState;
use super::{api_error, ApiError};
use crate::generations::{self, ActiveSchedule, ScheduleRecord};

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ingested: usize,
    pub generation_ids: Vec<i64>,
}

/// POST /api/schedules
/// Ingest a batch of `{name, schedule}` records. One bad record rejects the batch.
pub async fn ingest_schedules(
    State(state): State<AppState>,
    Json(records): Json<Vec<ScheduleRecord>>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let generations = generations::ingest_batch(&state.db, &records).map_err(api_error)?;

    log::info!("Ingested {} schedule(s) via API", generations.len());

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            ingested: generations.len(),
            generation_ids: generations.iter().map(|g| g.generation_id).collect(),
        }),
    ))
}

/// GET /api/schedules/active
pub async fn list_active(
    State(state): State<AppState>,
) -> Result<Json<Vec<ActiveSchedule>>, ApiError> {
    let active = generations::active_schedules(&state.db).map_err(api_error)?;
    Ok(Json(active))
}
