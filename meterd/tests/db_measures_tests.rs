//! Store-level tests for measure persistence

use chrono::DateTime;
use uuid::Uuid;

use meterd::db::{self, measures};
use meterd::models::{Measure, MeasureType};

async fn test_pool() -> sqlx::SqlitePool {
    // Single connection so every pooled handle sees the same in-memory db
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    db::init_tables(&pool)
        .await
        .expect("Failed to initialize database schema");
    pool
}

fn sample_measure(customer_code: &str, measure_type: MeasureType, datetime: &str) -> Measure {
    let parsed = DateTime::parse_from_rfc3339(datetime).unwrap();
    Measure::new(
        customer_code.to_string(),
        datetime.to_string(),
        parsed,
        measure_type,
        1234,
        "https://files.example/meters/1".to_string(),
    )
}

#[tokio::test]
async fn insert_and_find_in_month() {
    let pool = test_pool().await;

    let measure = sample_measure("C1", MeasureType::Water, "2024-03-15T00:00:00Z");
    measures::insert_measure(&pool, &measure).await.unwrap();

    let found = measures::find_in_month(&pool, "C1", MeasureType::Water, "2024-03")
        .await
        .unwrap()
        .expect("reading should be found in its month window");
    assert_eq!(found.id, measure.id);
    assert_eq!(found.measure_month, "2024-03");

    // Different month, type, or customer: no hit
    assert!(measures::find_in_month(&pool, "C1", MeasureType::Water, "2024-04")
        .await
        .unwrap()
        .is_none());
    assert!(measures::find_in_month(&pool, "C1", MeasureType::Gas, "2024-03")
        .await
        .unwrap()
        .is_none());
    assert!(measures::find_in_month(&pool, "C2", MeasureType::Water, "2024-03")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn racing_insert_hits_unique_index() {
    let pool = test_pool().await;

    let first = sample_measure("C1", MeasureType::Water, "2024-03-15T00:00:00Z");
    measures::insert_measure(&pool, &first).await.unwrap();

    // Same customer/type/month committed behind the workflow's pre-check
    let second = sample_measure("C1", MeasureType::Water, "2024-03-28T09:00:00Z");
    let err = measures::insert_measure(&pool, &second)
        .await
        .expect_err("second insert in the window must fail");
    assert!(measures::is_unique_violation(&err));
}

#[tokio::test]
async fn mark_confirmed_overwrites_value_once() {
    let pool = test_pool().await;

    let measure = sample_measure("C1", MeasureType::Gas, "2024-03-15T00:00:00Z");
    measures::insert_measure(&pool, &measure).await.unwrap();

    measures::mark_confirmed(&pool, measure.id, 1300).await.unwrap();

    let stored = measures::get_by_id(&pool, measure.id)
        .await
        .unwrap()
        .expect("reading should exist");
    assert!(stored.has_confirmed);
    assert_eq!(stored.measure_value, 1300);
}

#[tokio::test]
async fn mark_confirmed_is_noop_for_missing_id() {
    let pool = test_pool().await;

    // Affects zero rows, reports no error
    measures::mark_confirmed(&pool, Uuid::new_v4(), 1300)
        .await
        .unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM measures")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn list_by_customer_filters_by_type() {
    let pool = test_pool().await;

    measures::insert_measure(&pool, &sample_measure("C1", MeasureType::Water, "2024-03-15T00:00:00Z"))
        .await
        .unwrap();
    measures::insert_measure(&pool, &sample_measure("C1", MeasureType::Gas, "2024-03-15T00:00:00Z"))
        .await
        .unwrap();
    measures::insert_measure(&pool, &sample_measure("C2", MeasureType::Water, "2024-03-15T00:00:00Z"))
        .await
        .unwrap();

    let all = measures::list_by_customer(&pool, "C1", None).await.unwrap();
    assert_eq!(all.len(), 2);

    let water = measures::list_by_customer(&pool, "C1", Some(MeasureType::Water))
        .await
        .unwrap();
    assert_eq!(water.len(), 1);
    assert_eq!(water[0].measure_type, Some(MeasureType::Water));

    let none = measures::list_by_customer(&pool, "C3", None).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn legacy_rows_without_type_still_decode() {
    let pool = test_pool().await;

    // Relaxed legacy shape: no measure_type
    sqlx::query(
        r#"
        INSERT INTO measures (id, customer_code, measure_datetime, measure_month,
                              measure_type, measure_value, has_confirmed, image_url)
        VALUES (?, 'C1', '2023-11-01T00:00:00Z', '2023-11', NULL, 42, 1, 'https://files.example/old')
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .execute(&pool)
    .await
    .unwrap();

    let all = measures::list_by_customer(&pool, "C1", None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].measure_type, None);
    assert!(all[0].has_confirmed);
}
