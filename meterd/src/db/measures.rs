//! Measure persistence operations

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Measure, MeasureType};

/// Insert a new reading
///
/// A unique-index violation on (customer_code, measure_type, measure_month)
/// surfaces as `sqlx::Error`; callers distinguish it with
/// [`is_unique_violation`] and map it to the duplicate-report failure.
pub async fn insert_measure(pool: &SqlitePool, measure: &Measure) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO measures (
            id, customer_code, measure_datetime, measure_month,
            measure_type, measure_value, has_confirmed, image_url
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(measure.id.to_string())
    .bind(&measure.customer_code)
    .bind(&measure.measure_datetime)
    .bind(&measure.measure_month)
    .bind(measure.measure_type.map(|t| t.as_str()))
    .bind(measure.measure_value)
    .bind(measure.has_confirmed)
    .bind(&measure.image_url)
    .execute(pool)
    .await?;

    Ok(())
}

/// True when the error is a uniqueness-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Find the reading recorded for a customer/type in a given `YYYY-MM` window
pub async fn find_in_month(
    pool: &SqlitePool,
    customer_code: &str,
    measure_type: MeasureType,
    month_key: &str,
) -> Result<Option<Measure>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, customer_code, measure_datetime, measure_month,
               measure_type, measure_value, has_confirmed, image_url
        FROM measures
        WHERE customer_code = ? AND measure_type = ? AND measure_month = ?
        "#,
    )
    .bind(customer_code)
    .bind(measure_type.as_str())
    .bind(month_key)
    .fetch_optional(pool)
    .await?;

    row.map(measure_from_row).transpose()
}

/// List readings for a customer, optionally filtered by type
///
/// Returned in insertion order; no ordering is promised to clients.
pub async fn list_by_customer(
    pool: &SqlitePool,
    customer_code: &str,
    measure_type: Option<MeasureType>,
) -> Result<Vec<Measure>, sqlx::Error> {
    let rows = match measure_type {
        Some(t) => {
            sqlx::query(
                r#"
                SELECT id, customer_code, measure_datetime, measure_month,
                       measure_type, measure_value, has_confirmed, image_url
                FROM measures
                WHERE customer_code = ? AND measure_type = ?
                ORDER BY created_at
                "#,
            )
            .bind(customer_code)
            .bind(t.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                r#"
                SELECT id, customer_code, measure_datetime, measure_month,
                       measure_type, measure_value, has_confirmed, image_url
                FROM measures
                WHERE customer_code = ?
                ORDER BY created_at
                "#,
            )
            .bind(customer_code)
            .fetch_all(pool)
            .await?
        }
    };

    rows.into_iter().map(measure_from_row).collect()
}

/// Load a reading by identifier
pub async fn get_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Measure>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, customer_code, measure_datetime, measure_month,
               measure_type, measure_value, has_confirmed, image_url
        FROM measures
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(measure_from_row).transpose()
}

/// Mark a reading as confirmed, overwriting its value
///
/// Affects zero rows when the id does not exist; callers pre-check
/// existence through [`get_by_id`].
pub async fn mark_confirmed(
    pool: &SqlitePool,
    id: Uuid,
    confirmed_value: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE measures
        SET has_confirmed = 1, measure_value = ?
        WHERE id = ?
        "#,
    )
    .bind(confirmed_value)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

fn measure_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Measure, sqlx::Error> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id).map_err(|e| sqlx::Error::ColumnDecode {
        index: "id".to_string(),
        source: Box::new(e),
    })?;

    // Legacy rows may carry no type or an unknown one; both decode as None
    let measure_type: Option<String> = row.get("measure_type");
    let measure_type = measure_type.as_deref().and_then(MeasureType::parse);

    Ok(Measure {
        id,
        customer_code: row.get("customer_code"),
        measure_datetime: row.get("measure_datetime"),
        measure_month: row.get("measure_month"),
        measure_type,
        measure_value: row.get("measure_value"),
        has_confirmed: row.get("has_confirmed"),
        image_url: row.get("image_url"),
    })
}
