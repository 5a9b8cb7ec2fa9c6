use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::error::OpenHoursError;

pub mod businesses;
pub mod open;
pub mod schedules;
pub mod state;

/// Error response structure with user-friendly message
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map an error to a status code: bad input is the caller's problem, anything
/// else is ours and is logged.
pub fn api_error(e: OpenHoursError) -> ApiError {
    let status = match &e {
        OpenHoursError::Parse(_)
        | OpenHoursError::InvalidSpec { .. }
        | OpenHoursError::InvalidRecord(_)
        | OpenHoursError::CsvError(_) => StatusCode::BAD_REQUEST,
        _ => {
            log::error!("Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
