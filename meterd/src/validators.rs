//! Request payload validation
//!
//! Runs before any side effect. Wrong JSON primitive types map to
//! `INVALID_TYPE`, present-but-invalid values to `INVALID_DATA`; both are
//! hard 400s.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::MeasureType;

/// Validated upload payload
#[derive(Debug)]
pub struct UploadRequest {
    pub customer_code: String,
    pub measure_datetime: String,
    pub parsed_datetime: DateTime<FixedOffset>,
    pub measure_type: MeasureType,
    pub image_format: String,
    pub image_bytes: Vec<u8>,
}

/// Validated confirmation payload
#[derive(Debug)]
pub struct ConfirmRequest {
    pub measure_uuid: Uuid,
    pub confirmed_value: i64,
}

/// Validate the `POST /upload` body
pub fn parse_upload(body: &[u8]) -> Result<UploadRequest, ApiError> {
    let value = parse_json_object(body)?;

    let image = require_string(&value, "image")?;
    let customer_code = require_string(&value, "customer_code")?;
    let measure_datetime = require_string(&value, "measure_datetime")?;
    let measure_type = require_string(&value, "measure_type")?;

    if customer_code.trim().is_empty() {
        return Err(ApiError::InvalidData(
            "O campo customer_code n\u{e3}o pode ser vazio".to_string(),
        ));
    }

    let parsed_datetime = parse_measure_datetime(measure_datetime).ok_or_else(|| {
        ApiError::InvalidData(
            "O campo measure_datetime n\u{e3}o \u{e9} uma data v\u{e1}lida".to_string(),
        )
    })?;

    let measure_type = MeasureType::parse(measure_type).ok_or_else(|| {
        ApiError::InvalidData("Tipo de medi\u{e7}\u{e3}o n\u{e3}o permitida".to_string())
    })?;

    let (image_format, payload) = parse_data_uri(image).ok_or_else(|| {
        ApiError::InvalidData(
            "O campo image n\u{e3}o \u{e9} um data-URI base64 de imagem v\u{e1}lido".to_string(),
        )
    })?;

    let image_bytes = general_purpose::STANDARD.decode(payload).map_err(|_| {
        ApiError::InvalidData(
            "O campo image n\u{e3}o cont\u{e9}m base64 v\u{e1}lido".to_string(),
        )
    })?;

    Ok(UploadRequest {
        customer_code: customer_code.to_string(),
        measure_datetime: measure_datetime.to_string(),
        parsed_datetime,
        measure_type,
        image_format,
        image_bytes,
    })
}

/// Validate the `PATCH /confirm` body
pub fn parse_confirm(body: &[u8]) -> Result<ConfirmRequest, ApiError> {
    let value = parse_json_object(body)?;

    let uuid_field = require_field(&value, "measure_uuid")?;
    let uuid_str = uuid_field.as_str().ok_or_else(|| {
        ApiError::InvalidType("O campo measure_uuid deve ser uma string".to_string())
    })?;
    let measure_uuid = Uuid::parse_str(uuid_str).map_err(|_| {
        ApiError::InvalidData(
            "O campo measure_uuid n\u{e3}o \u{e9} um UUID v\u{e1}lido".to_string(),
        )
    })?;

    let value_field = require_field(&value, "confirmed_value")?;
    if !value_field.is_number() {
        return Err(ApiError::InvalidType(
            "O campo confirmed_value deve ser um n\u{fa}mero".to_string(),
        ));
    }
    let confirmed_value = value_field.as_i64().ok_or_else(|| {
        ApiError::InvalidData(
            "O campo confirmed_value deve ser um n\u{fa}mero inteiro".to_string(),
        )
    })?;

    Ok(ConfirmRequest {
        measure_uuid,
        confirmed_value,
    })
}

/// Validate an optional `measure_type` filter value
pub fn parse_type_filter(raw: Option<&str>) -> Result<Option<MeasureType>, ApiError> {
    match raw {
        None => Ok(None),
        Some(s) => MeasureType::parse(s).map(Some).ok_or_else(|| {
            ApiError::InvalidData("Tipo de medi\u{e7}\u{e3}o n\u{e3}o permitida".to_string())
        }),
    }
}

/// Accepts RFC3339 or a bare `YYYY-MM-DDTHH:MM:SS` local timestamp
pub fn parse_measure_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc().fixed_offset());
    }
    None
}

/// Split a `data:image/<format>;base64,<payload>` URI
fn parse_data_uri(s: &str) -> Option<(String, &str)> {
    let rest = s.strip_prefix("data:image/")?;
    let (format, payload) = rest.split_once(";base64,")?;
    if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some((format.to_ascii_lowercase(), payload))
}

fn parse_json_object(body: &[u8]) -> Result<Value, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| {
        ApiError::InvalidData(
            "O corpo da requisi\u{e7}\u{e3}o n\u{e3}o \u{e9} um JSON v\u{e1}lido".to_string(),
        )
    })?;

    if !value.is_object() {
        return Err(ApiError::InvalidData(
            "O corpo da requisi\u{e7}\u{e3}o deve ser um objeto JSON".to_string(),
        ));
    }

    Ok(value)
}

fn require_field<'a>(value: &'a Value, field: &str) -> Result<&'a Value, ApiError> {
    value.get(field).ok_or_else(|| {
        ApiError::InvalidData(format!("O campo {} \u{e9} obrigat\u{f3}rio", field))
    })
}

fn require_string<'a>(value: &'a Value, field: &str) -> Result<&'a str, ApiError> {
    let field_value = require_field(value, field)?;
    field_value.as_str().ok_or_else(|| {
        ApiError::InvalidType(format!("O campo {} deve ser uma string", field))
    })
}
