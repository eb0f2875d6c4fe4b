//! Confirmation workflow handler
//!
//! PATCH /confirm: a human accepts or corrects a model-extracted value,
//! permanently locking the record.

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;

use crate::{
    db,
    error::{ApiError, ApiResult},
    validators, AppState,
};

/// PATCH /confirm response
#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub description: String,
}

/// PATCH /confirm
pub async fn confirm_measure(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ConfirmResponse>> {
    let request = validators::parse_confirm(&body)?;

    let measure = db::measures::get_by_id(&state.db, request.measure_uuid)
        .await?
        .ok_or(ApiError::MeasureNotFound)?;

    if measure.has_confirmed {
        return Err(ApiError::ConfirmationDuplicate);
    }

    db::measures::mark_confirmed(&state.db, request.measure_uuid, request.confirmed_value)
        .await?;

    tracing::info!(
        measure_uuid = %request.measure_uuid,
        confirmed_value = request.confirmed_value,
        "Reading confirmed"
    );

    Ok(Json(ConfirmResponse {
        success: true,
        description: "Opera\u{e7}\u{e3}o realizada com sucesso".to_string(),
    }))
}
