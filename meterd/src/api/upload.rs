//! Upload workflow handler
//!
//! POST /upload: validate, duplicate pre-check, stage the image, extract the
//! reading, persist. Nothing is written and no extraction is attempted when
//! validation or the duplicate check fails.

use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db,
    error::{ApiError, ApiResult},
    models::{measure::month_key, Measure},
    services::StagedImage,
    validators, AppState,
};

/// POST /upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub response: UploadResult,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub image_url: String,
    /// Raw extracted value as returned by the model, not the parsed integer
    pub measure_value: String,
    pub measure_uuid: Uuid,
}

/// POST /upload
pub async fn upload_measure(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<UploadResponse>> {
    let request = validators::parse_upload(&body)?;
    let month = month_key(&request.parsed_datetime);

    // Friendly 409 before paying for an extraction round-trip; the unique
    // index below still catches racing writers.
    if let Some(existing) = db::measures::find_in_month(
        &state.db,
        &request.customer_code,
        request.measure_type,
        &month,
    )
    .await?
    {
        tracing::info!(
            customer_code = %request.customer_code,
            measure_type = %request.measure_type,
            month = %month,
            existing_uuid = %existing.id,
            "Duplicate reading rejected"
        );
        return Err(ApiError::DoubleReport);
    }

    let staged = StagedImage::write(
        &state.staging_dir,
        &request.customer_code,
        &request.image_format,
        &request.image_bytes,
    )?;
    let mime_type = format!("image/{}", request.image_format);

    let extraction = state
        .extractor
        .extract(staged.path(), &mime_type, &request.customer_code)
        .await?;
    drop(staged);

    let raw_reading = extraction.reading.ok_or_else(|| {
        ApiError::InvalidData(
            "N\u{e3}o foi poss\u{ed}vel extrair o valor da medi\u{e7}\u{e3}o da imagem"
                .to_string(),
        )
    })?;

    let measure_value: i64 = raw_reading.trim().parse().map_err(|_| {
        tracing::warn!(
            customer_code = %request.customer_code,
            raw = %raw_reading,
            "Model returned a non-numeric reading"
        );
        ApiError::InvalidData(
            "O valor extra\u{ed}do da imagem n\u{e3}o \u{e9} num\u{e9}rico".to_string(),
        )
    })?;

    let measure = Measure::new(
        request.customer_code,
        request.measure_datetime,
        request.parsed_datetime,
        request.measure_type,
        measure_value,
        extraction.image_url,
    );

    if let Err(e) = db::measures::insert_measure(&state.db, &measure).await {
        if db::measures::is_unique_violation(&e) {
            // A racing upload committed between the pre-check and here
            return Err(ApiError::DoubleReport);
        }
        return Err(e.into());
    }

    tracing::info!(
        measure_uuid = %measure.id,
        customer_code = %measure.customer_code,
        measure_value = measure.measure_value,
        "Reading recorded"
    );

    Ok(Json(UploadResponse {
        response: UploadResult {
            image_url: measure.image_url,
            measure_value: raw_reading,
            measure_uuid: measure.id,
        },
        description: "Opera\u{e7}\u{e3}o realizada com sucesso".to_string(),
    }))
}
