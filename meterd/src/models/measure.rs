//! Meter reading entity and type enumeration

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Utility categories accepted for new readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeasureType {
    Water,
    Gas,
}

impl MeasureType {
    /// Parse a client-supplied type string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("WATER") {
            Some(MeasureType::Water)
        } else if s.eq_ignore_ascii_case("GAS") {
            Some(MeasureType::Gas)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureType::Water => "WATER",
            MeasureType::Gas => "GAS",
        }
    }
}

impl std::fmt::Display for MeasureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single meter reading event
///
/// Created only by the upload workflow; the confirmation workflow is the
/// sole mutation path (`has_confirmed` flag plus the corrected value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measure {
    /// Unique reading identifier
    pub id: Uuid,

    /// Customer/site identifier (free text)
    pub customer_code: String,

    /// Timestamp string as submitted by the client
    pub measure_datetime: String,

    /// Derived `YYYY-MM` duplicate window, computed at creation
    pub measure_month: String,

    /// Utility category; nullable in the stored schema for legacy rows,
    /// always set by the upload workflow
    pub measure_type: Option<MeasureType>,

    /// Integer reading extracted from the image (untrusted until confirmed)
    pub measure_value: i64,

    /// Set irreversibly by the confirmation workflow
    pub has_confirmed: bool,

    /// URI of the externally hosted meter image
    pub image_url: String,
}

impl Measure {
    /// Create a new unconfirmed reading
    pub fn new(
        customer_code: String,
        measure_datetime: String,
        parsed_datetime: DateTime<FixedOffset>,
        measure_type: MeasureType,
        measure_value: i64,
        image_url: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_code,
            measure_datetime,
            measure_month: month_key(&parsed_datetime),
            measure_type: Some(measure_type),
            measure_value,
            has_confirmed: false,
            image_url,
        }
    }
}

/// Derive the `YYYY-MM` duplicate window from a reading timestamp
pub fn month_key(dt: &DateTime<FixedOffset>) -> String {
    format!("{:04}-{:02}", dt.year(), dt.month())
}
