//! Listing workflow handler

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db,
    error::{ApiError, ApiResult},
    models::{Measure, MeasureType},
    validators, AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub measure_type: Option<String>,
}

/// GET /:customer_code/list response
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub customer_code: String,
    pub measures: Vec<ListedMeasure>,
}

#[derive(Debug, Serialize)]
pub struct ListedMeasure {
    pub measure_uuid: Uuid,
    pub measure_datetime: String,
    pub measure_type: Option<MeasureType>,
    pub measure_value: i64,
    pub has_confirmed: bool,
    pub image_url: String,
}

impl From<Measure> for ListedMeasure {
    fn from(measure: Measure) -> Self {
        Self {
            measure_uuid: measure.id,
            measure_datetime: measure.measure_datetime,
            measure_type: measure.measure_type,
            measure_value: measure.measure_value,
            has_confirmed: measure.has_confirmed,
            image_url: measure.image_url,
        }
    }
}

/// GET /:customer_code/list
pub async fn list_measures(
    State(state): State<AppState>,
    Path(customer_code): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let filter = validators::parse_type_filter(query.measure_type.as_deref())?;

    let measures = db::measures::list_by_customer(&state.db, &customer_code, filter).await?;

    if measures.is_empty() {
        return Err(ApiError::MeasuresNotFound);
    }

    tracing::debug!(
        customer_code = %customer_code,
        count = measures.len(),
        "Listing readings"
    );

    Ok(Json(ListResponse {
        customer_code,
        measures: measures.into_iter().map(ListedMeasure::from).collect(),
    }))
}
